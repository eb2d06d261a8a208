// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Finds the namespace that holds a target object.
//!
//! Every group/version serving the target kind is listed across all
//! namespaces. The listings run concurrently and are merged in group/version
//! order, so the outcome does not depend on which response arrives first.

use futures::future::try_join_all;
use indexmap::IndexSet;
use tracing::{debug, info};

use crate::error::{AutonsError, Result};
use crate::kubernetes::ObjectLister;
use crate::target::TargetReference;

/// Distinct namespaces in the order they were first seen
pub type NamespaceSet = IndexSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The object lives in exactly this namespace
    Namespace(String),
    /// The kind is cluster-scoped; no namespace applies
    ClusterScoped,
}

/// Collect the namespaces of every object named like the target
pub async fn find_namespaces(
    lister: &dyn ObjectLister,
    target: &TargetReference,
) -> Result<NamespaceSet> {
    let listings = target
        .resource
        .group_versions
        .iter()
        .map(|gv| lister.list_objects(&target.resource, gv));
    let results = try_join_all(listings).await?;

    let mut namespaces = NamespaceSet::new();
    for (gv, objects) in target.resource.group_versions.iter().zip(results) {
        let before = namespaces.len();
        namespaces.extend(
            objects
                .into_iter()
                .filter(|object| object.name == target.name)
                .filter_map(|object| object.namespace),
        );
        debug!(
            group_version = %gv,
            new_namespaces = namespaces.len() - before,
            "Searched group version"
        );
    }
    Ok(namespaces)
}

/// Resolve the single namespace of the target
///
/// Fails when nothing matches or when the name exists in several namespaces;
/// it never picks one of several candidates.
pub async fn resolve_namespace(
    lister: &dyn ObjectLister,
    target: &TargetReference,
) -> Result<Resolution> {
    if !target.resource.namespaced {
        info!(resource = %target.resource.name, "Resource is cluster-scoped, no namespace needed");
        return Ok(Resolution::ClusterScoped);
    }

    let namespaces = find_namespaces(lister, target).await?;
    match namespaces.len() {
        0 => Err(AutonsError::NotFound {
            kind: target.resource.name.clone(),
            name: target.name.clone(),
        }),
        1 => {
            let namespace = namespaces.into_iter().next().unwrap_or_default();
            info!(
                resource = %target.resource.name,
                name = %target.name,
                namespace = %namespace,
                "Resolved namespace"
            );
            Ok(Resolution::Namespace(namespace))
        }
        _ => Err(AutonsError::Ambiguous {
            kind: target.resource.name.clone(),
            name: target.name.clone(),
            namespaces: namespaces.into_iter().collect(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::kubernetes::ObjectRef;
    use crate::kubernetes::discovery::tests::sample_catalog;
    use crate::kubernetes::discovery::{GroupVersion, ResourceDescriptor};
    use crate::target::resolve_target;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory cluster snapshot keyed by (resource, group/version)
    #[derive(Default)]
    pub(crate) struct FakeLister {
        objects: HashMap<(String, GroupVersion), Vec<ObjectRef>>,
        failing: Option<GroupVersion>,
        pub(crate) calls: Mutex<Vec<(String, GroupVersion)>>,
    }

    impl FakeLister {
        pub(crate) fn with(mut self, resource: &str, gv: GroupVersion, objects: &[(&str, &str)]) -> Self {
            self.objects.entry((resource.to_string(), gv)).or_default().extend(
                objects
                    .iter()
                    .map(|(name, namespace)| ObjectRef::new(*name, Some(*namespace))),
            );
            self
        }

        pub(crate) fn failing_on(mut self, gv: GroupVersion) -> Self {
            self.failing = Some(gv);
            self
        }
    }

    #[async_trait]
    impl ObjectLister for FakeLister {
        async fn list_objects(
            &self,
            resource: &ResourceDescriptor,
            gv: &GroupVersion,
        ) -> Result<Vec<ObjectRef>> {
            self.calls
                .lock()
                .unwrap()
                .push((resource.name.clone(), gv.clone()));
            if self.failing.as_ref() == Some(gv) {
                return Err(AutonsError::Listing {
                    resource: resource.name.clone(),
                    source: anyhow::anyhow!("forbidden"),
                });
            }
            Ok(self
                .objects
                .get(&(resource.name.clone(), gv.clone()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn core() -> GroupVersion {
        GroupVersion::new("", "v1")
    }

    fn apps() -> GroupVersion {
        GroupVersion::new("apps", "v1")
    }

    fn target(verb: &str, token: &str, instance: Option<&str>) -> TargetReference {
        resolve_target(verb, token, instance, &sample_catalog()).unwrap()
    }

    #[tokio::test]
    async fn test_single_match() {
        let lister = FakeLister::default().with(
            "pods",
            core(),
            &[("web-7f9", "prod"), ("web-000", "staging"), ("db-0", "prod")],
        );

        let resolution = resolve_namespace(&lister, &target("logs", "pod/web-7f9", None))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Namespace("prod".to_string()));
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let lister = FakeLister::default().with("pods", core(), &[("db-0", "prod")]);

        let err = resolve_namespace(&lister, &target("logs", "web", None))
            .await
            .unwrap_err();
        match err {
            AutonsError::NotFound { kind, name } => {
                assert_eq!(kind, "pods");
                assert_eq!(name, "web");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_name_match_is_exact() {
        let lister = FakeLister::default().with("pods", core(), &[("web-1", "prod"), ("we", "dev")]);

        let err = resolve_namespace(&lister, &target("logs", "web", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AutonsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_multiple_namespaces_is_ambiguous() {
        let lister =
            FakeLister::default().with("deployments", apps(), &[("api", "team-a"), ("api", "team-b")]);

        let err = resolve_namespace(&lister, &target("get", "deploy", Some("api")))
            .await
            .unwrap_err();
        match err {
            AutonsError::Ambiguous { kind, name, namespaces } => {
                assert_eq!(kind, "deployments");
                assert_eq!(name, "api");
                assert_eq!(namespaces, vec!["team-a", "team-b"]);
            }
            other => panic!("Expected Ambiguous, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_namespace_across_group_versions_is_deduplicated() {
        let events_gv = GroupVersion::new("events.k8s.io", "v1");
        let lister = FakeLister::default()
            .with("events", core(), &[("boot", "kube-system")])
            .with("events", events_gv.clone(), &[("boot", "kube-system")]);

        let target = target("get", "ev/boot", None);
        let resolution = resolve_namespace(&lister, &target).await.unwrap();
        assert_eq!(resolution, Resolution::Namespace("kube-system".to_string()));

        let calls = lister.calls.lock().unwrap().clone();
        assert_eq!(
            calls.into_iter().map(|(_, gv)| gv).collect::<Vec<_>>(),
            vec![core(), events_gv]
        );
    }

    #[tokio::test]
    async fn test_namespaces_keep_group_version_order() {
        let events_gv = GroupVersion::new("events.k8s.io", "v1");
        let lister = FakeLister::default()
            .with("events", core(), &[("boot", "b")])
            .with("events", events_gv, &[("boot", "a"), ("boot", "b")]);

        let namespaces = find_namespaces(&lister, &target("get", "events", Some("boot")))
            .await
            .unwrap();
        assert_eq!(namespaces.into_iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let lister = FakeLister::default().with("services", core(), &[("db", "data")]);
        let target = target("port-forward", "svc/db", None);

        let first = resolve_namespace(&lister, &target).await.unwrap();
        let second = resolve_namespace(&lister, &target).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cluster_scoped_skips_listing() {
        let lister = FakeLister::default();

        let resolution = resolve_namespace(&lister, &target("get", "nodes/node-1", None))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::ClusterScoped);
        assert!(lister.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let events_gv = GroupVersion::new("events.k8s.io", "v1");
        let lister = FakeLister::default()
            .with("events", core(), &[("boot", "kube-system")])
            .failing_on(events_gv);

        let err = resolve_namespace(&lister, &target("get", "ev/boot", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AutonsError::Listing { .. }));
    }
}
