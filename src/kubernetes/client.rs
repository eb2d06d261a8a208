// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! `kube`-backed implementation of the discovery and listing collaborators.
//!
//! The underlying client is created lazily on first use, so invocations that
//! bypass resolution never touch cluster credentials.

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::api::{DynamicObject, GroupVersionKind, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Api, Client, Config, ResourceExt};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::discovery::{ApiResourceEntry, ClusterDiscovery, GroupVersion, ResourceDescriptor};
use super::{ObjectLister, ObjectRef};
use crate::error::{AutonsError, Result};

/// Upper bound for establishing a connection to the API server
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size for list requests
const PAGE_SIZE: u32 = 500;

/// Which kubeconfig file and context to connect with
///
/// Both default to whatever the ambient configuration selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterAccess {
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

impl From<APIResource> for ApiResourceEntry {
    fn from(resource: APIResource) -> Self {
        Self {
            name: resource.name,
            singular_name: resource.singular_name,
            short_names: resource.short_names.unwrap_or_default(),
            kind: resource.kind,
            namespaced: resource.namespaced,
        }
    }
}

pub struct KubeClient {
    access: ClusterAccess,
    /// Bound applied to every remote call
    request_timeout: Duration,
    client: OnceCell<Client>,
}

impl KubeClient {
    /// Create a client handle without connecting (no I/O)
    pub fn new(access: ClusterAccess, request_timeout: Duration) -> Self {
        Self {
            access,
            request_timeout,
            client: OnceCell::new(),
        }
    }

    async fn get_or_create_client(&self) -> Result<Client> {
        self.client
            .get_or_try_init(|| async {
                self.connect().await.map_err(AutonsError::Config)
            })
            .await
            .cloned()
    }

    async fn connect(&self) -> anyhow::Result<Client> {
        let start = Instant::now();
        let options = KubeConfigOptions {
            context: self.access.context.clone(),
            ..Default::default()
        };

        let mut config = match (&self.access.kubeconfig, &self.access.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .with_context(|| format!("Failed to load kubeconfig {}", path.display()))?
            }
            (None, Some(context)) => Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("Failed to load kubeconfig for context '{}'", context))?,
            (None, None) => Config::infer()
                .await
                .context("Failed to infer cluster configuration")?,
        };

        config.connect_timeout = Some(CONNECT_TIMEOUT.min(self.request_timeout));
        config.read_timeout = Some(self.request_timeout);

        let cluster_url = config.cluster_url.to_string();
        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;

        info!(
            cluster = %cluster_url,
            context = ?self.access.context,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Connected"
        );
        Ok(client)
    }

    /// Run one remote call under the request timeout
    async fn with_timeout<T>(
        &self,
        operation: &str,
        call: impl Future<Output = kube::Result<T>>,
    ) -> Result<kube::Result<T>> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| AutonsError::Timeout {
                operation: operation.to_string(),
                after: self.request_timeout,
            })
    }
}

fn discovery_error(operation: &str, err: kube::Error) -> AutonsError {
    AutonsError::Discovery(anyhow::Error::new(err).context(operation.to_string()))
}

#[async_trait]
impl ClusterDiscovery for KubeClient {
    async fn core_versions(&self) -> Result<Vec<String>> {
        let client = self.get_or_create_client().await?;
        let operation = "listing core API versions";
        let versions = self
            .with_timeout(operation, client.list_core_api_versions())
            .await?
            .map_err(|e| discovery_error(operation, e))?;
        Ok(versions.versions)
    }

    async fn api_group_versions(&self) -> Result<Vec<GroupVersion>> {
        let client = self.get_or_create_client().await?;
        let operation = "listing API groups";
        let groups = self
            .with_timeout(operation, client.list_api_groups())
            .await?
            .map_err(|e| discovery_error(operation, e))?;

        Ok(groups
            .groups
            .into_iter()
            .flat_map(|group| group.versions)
            .map(|version| GroupVersion::parse(&version.group_version))
            .collect())
    }

    async fn resources_for(&self, gv: &GroupVersion) -> Result<Vec<ApiResourceEntry>> {
        let client = self.get_or_create_client().await?;
        let operation = format!("listing resources of {}", gv);

        let response = if gv.is_core() {
            self.with_timeout(&operation, client.list_core_api_resources(&gv.version))
                .await?
        } else {
            self.with_timeout(&operation, client.list_api_group_resources(&gv.to_string()))
                .await?
        };
        let list: APIResourceList = response.map_err(|e| discovery_error(&operation, e))?;

        Ok(list
            .resources
            .into_iter()
            .map(ApiResourceEntry::from)
            .collect())
    }
}

#[async_trait]
impl ObjectLister for KubeClient {
    async fn list_objects(
        &self,
        resource: &ResourceDescriptor,
        gv: &GroupVersion,
    ) -> Result<Vec<ObjectRef>> {
        let client = self.get_or_create_client().await?;
        let gvk = GroupVersionKind::gvk(&gv.group, &gv.version, &resource.kind);
        let ar = ApiResource::from_gvk_with_plural(&gvk, &resource.name);
        let api: Api<DynamicObject> = Api::all_with(client, &ar);

        let label = format!("{} ({})", resource.name, gv);
        let operation = format!("listing {}", label);
        let mut objects = Vec::new();
        let mut continue_token: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            let mut params = ListParams::default().limit(PAGE_SIZE);
            if let Some(ref token) = continue_token {
                params = params.continue_token(token);
            }

            let list = self
                .with_timeout(&operation, api.list(&params))
                .await?
                .map_err(|e| AutonsError::Listing {
                    resource: label.clone(),
                    source: e.into(),
                })?;
            page_count += 1;

            objects.extend(
                list.items
                    .iter()
                    .map(|item| ObjectRef::new(item.name_any(), item.namespace().as_deref())),
            );

            match list.metadata.continue_ {
                Some(token) if !token.is_empty() => continue_token = Some(token),
                _ => break,
            }
        }

        debug!(
            resource = %resource.name,
            group_version = %gv,
            pages = page_count,
            objects = objects.len(),
            "Listed objects"
        );
        Ok(objects)
    }
}
