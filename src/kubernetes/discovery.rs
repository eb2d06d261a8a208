// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource discovery for Kubernetes clusters.
//!
//! Walks the discovery API once per invocation and builds an immutable
//! [`ResourceCatalog`] mapping every resource alias (plural, singular, short
//! names) to the descriptor of the kind it names.

use async_trait::async_trait;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

use crate::error::{AutonsError, Result};

/// An API group/version pair. The legacy core group is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Parse a discovery `groupVersion` string ("v1", "apps/v1")
    pub fn parse(group_version: &str) -> Self {
        match group_version.split_once('/') {
            Some((group, version)) => Self::new(group, version),
            None => Self::new("", group_version),
        }
    }

    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_core() {
            f.write_str(&self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

/// One resource entry as reported by discovery for a single group/version
#[derive(Debug, Clone, Default)]
pub struct ApiResourceEntry {
    /// Plural resource name (e.g. "pods", "pods/log" for subresources)
    pub name: String,
    pub singular_name: String,
    pub short_names: Vec<String>,
    pub kind: String,
    pub namespaced: bool,
}

impl ApiResourceEntry {
    fn is_subresource(&self) -> bool {
        self.name.contains('/')
    }
}

/// Discovery side of the cluster API
#[async_trait]
pub trait ClusterDiscovery: Sync {
    /// Versions of the legacy core group (`/api`), normally just "v1"
    async fn core_versions(&self) -> Result<Vec<String>>;

    /// Every group/version served under `/apis`, all versions not only the preferred one
    async fn api_group_versions(&self) -> Result<Vec<GroupVersion>>;

    /// Resources served under one group/version
    async fn resources_for(&self, gv: &GroupVersion) -> Result<Vec<ApiResourceEntry>>;
}

/// Canonical identity of a resource kind with every alias and serving group/version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Canonical name: the plural resource name
    pub name: String,
    /// Object kind (e.g. "Pod")
    pub kind: String,
    pub aliases: IndexSet<String>,
    pub group_versions: IndexSet<GroupVersion>,
    pub namespaced: bool,
}

impl ResourceDescriptor {
    fn new(entry: &ApiResourceEntry) -> Self {
        let mut aliases = IndexSet::new();
        aliases.insert(entry.name.clone());
        Self {
            name: entry.name.clone(),
            kind: entry.kind.clone(),
            aliases,
            group_versions: IndexSet::new(),
            namespaced: entry.namespaced,
        }
    }

    /// Copy of this descriptor restricted to the versions served by `group`
    pub fn restricted_to_group(&self, group: &str) -> Option<Self> {
        let group_versions: IndexSet<GroupVersion> = self
            .group_versions
            .iter()
            .filter(|gv| gv.group == group)
            .cloned()
            .collect();
        if group_versions.is_empty() {
            return None;
        }
        Some(Self {
            group_versions,
            ..self.clone()
        })
    }
}

/// Accumulates discovery results; consumed by [`CatalogBuilder::build`]
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    descriptors: Vec<ResourceDescriptor>,
    by_name: HashMap<String, usize>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one discovery entry served under `gv`
    ///
    /// Entries sharing a plural name are merged into one descriptor. Plurals
    /// that differ stay separate.
    pub fn add(&mut self, gv: &GroupVersion, entry: &ApiResourceEntry) {
        if entry.is_subresource() || entry.name.is_empty() {
            return;
        }

        let idx = match self.by_name.get(&entry.name) {
            Some(&idx) => idx,
            None => {
                self.descriptors.push(ResourceDescriptor::new(entry));
                let idx = self.descriptors.len() - 1;
                self.by_name.insert(entry.name.clone(), idx);
                idx
            }
        };

        let descriptor = &mut self.descriptors[idx];
        if !entry.singular_name.is_empty() {
            descriptor.aliases.insert(entry.singular_name.clone());
        }
        for short in &entry.short_names {
            descriptor.aliases.insert(short.clone());
        }
        descriptor.group_versions.insert(gv.clone());
        descriptor.namespaced |= entry.namespaced;

        trace!(resource = %entry.name, group_version = %gv, "Registered resource");
    }

    pub fn add_all(&mut self, gv: &GroupVersion, entries: &[ApiResourceEntry]) {
        for entry in entries {
            self.add(gv, entry);
        }
    }

    /// Freeze into a catalog
    ///
    /// Canonical plural names always map to their own descriptor. Any other
    /// alias claimed by more than one descriptor goes to the first one
    /// registered.
    pub fn build(self) -> ResourceCatalog {
        let mut alias_map = HashMap::new();
        for (idx, descriptor) in self.descriptors.iter().enumerate() {
            alias_map.insert(descriptor.name.clone(), idx);
        }
        for (idx, descriptor) in self.descriptors.iter().enumerate() {
            for alias in &descriptor.aliases {
                if let Some(&owner) = alias_map.get(alias) {
                    if owner != idx {
                        debug!(
                            alias = %alias,
                            kept = %self.descriptors[owner].name,
                            dropped = %descriptor.name,
                            "Alias claimed by multiple resources"
                        );
                    }
                    continue;
                }
                alias_map.insert(alias.clone(), idx);
            }
        }

        ResourceCatalog {
            descriptors: self.descriptors,
            alias_map,
        }
    }
}

/// Read-only map from every known alias to its resource descriptor
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    descriptors: Vec<ResourceDescriptor>,
    alias_map: HashMap<String, usize>,
}

impl ResourceCatalog {
    /// Exact alias lookup
    pub fn get(&self, alias: &str) -> Option<&ResourceDescriptor> {
        self.alias_map.get(alias).map(|&idx| &self.descriptors[idx])
    }

    /// Alias lookup that also accepts group-qualified names (`deploy.apps`)
    ///
    /// A qualified name narrows the descriptor to the versions of that group.
    pub fn lookup(&self, alias: &str) -> Option<ResourceDescriptor> {
        if let Some(descriptor) = self.get(alias) {
            return Some(descriptor.clone());
        }
        let (short, group) = alias.split_once('.')?;
        self.get(short)?.restricted_to_group(group)
    }

    /// All descriptors sorted by canonical name
    #[cfg(test)]
    pub fn descriptors(&self) -> Vec<&ResourceDescriptor> {
        let mut all: Vec<_> = self.descriptors.iter().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Build the resource catalog for the cluster
///
/// Every group/version is queried exactly once; the first failure aborts
/// discovery.
pub async fn discover(cluster: &dyn ClusterDiscovery) -> Result<ResourceCatalog> {
    let mut builder = CatalogBuilder::new();

    let mut group_versions: Vec<GroupVersion> = cluster
        .core_versions()
        .await?
        .into_iter()
        .map(|version| GroupVersion::new("", version))
        .collect();
    group_versions.extend(cluster.api_group_versions().await?);

    for gv in &group_versions {
        let entries = cluster.resources_for(gv).await?;
        debug!(group_version = %gv, resources = entries.len(), "Discovered group version");
        builder.add_all(gv, &entries);
    }

    let catalog = builder.build();
    if catalog.is_empty() {
        return Err(AutonsError::Discovery(anyhow::anyhow!(
            "cluster reported no API resources"
        )));
    }

    debug!(
        group_versions = group_versions.len(),
        resources = catalog.len(),
        "Resource catalog built"
    );
    Ok(catalog)
}
