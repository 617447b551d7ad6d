//! Compute service (node directory) abstraction

use crate::error::Result;
use crate::node::NodeMetadata;
use crate::predicates::NodeFilter;
use crate::provider::CloudProvider;
use async_trait::async_trait;

/// A provider that can enumerate its compute nodes
#[async_trait]
pub trait ComputeService: CloudProvider {
    /// List every node the provider knows about, unfiltered
    async fn list_nodes(&self) -> Result<Vec<NodeMetadata>>;

    /// List nodes accepted by `filter`
    async fn list_nodes_matching(&self, filter: &NodeFilter) -> Result<Vec<NodeMetadata>> {
        Ok(self
            .list_nodes()
            .await?
            .into_iter()
            .filter(|node| filter(node))
            .collect())
    }

    /// Look up a node by its directory id
    async fn node(&self, id: &str) -> Result<Option<NodeMetadata>> {
        Ok(self.list_nodes().await?.into_iter().find(|node| node.id == id))
    }
}
