mod client;
pub mod discovery;

use async_trait::async_trait;

use crate::error::Result;
use discovery::{GroupVersion, ResourceDescriptor};

pub use client::{ClusterAccess, KubeClient};

/// Name and namespace of a listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub name: String,
    /// None for cluster-scoped objects
    pub namespace: Option<String>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(String::from),
        }
    }
}

/// Object listing side of the cluster API
#[async_trait]
pub trait ObjectLister: Sync {
    /// List every object of `resource` served under `gv`, across all namespaces
    async fn list_objects(
        &self,
        resource: &ResourceDescriptor,
        gv: &GroupVersion,
    ) -> Result<Vec<ObjectRef>>;
}
