//! Compute node model shared by every provider

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

/// Provider node ids grouped by the location they run in
pub type LocationMap = HashMap<Location, HashSet<String>>;

/// Granularity of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationScope {
    Provider,
    Region,
    Zone,
}

impl std::fmt::Display for LocationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationScope::Provider => write!(f, "provider"),
            LocationScope::Region => write!(f, "region"),
            LocationScope::Zone => write!(f, "zone"),
        }
    }
}

/// Where a node runs (e.g. a Sakura Cloud zone such as `tk1a`)
///
/// Compared by value; the orchestrator only uses it as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub scope: LocationScope,
    pub id: String,
    pub description: String,
}

impl Location {
    pub fn new(scope: LocationScope, id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scope,
            id: id.into(),
            description: description.into(),
        }
    }

    pub fn zone(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            scope: LocationScope::Zone,
            description: id.clone(),
            id,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope, self.id)
    }
}

/// Lifecycle state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Node is being provisioned or booting
    Pending,
    /// Node is up
    Running,
    /// Node exists but is powered off
    Suspended,
    /// Node is gone or being torn down
    Terminated,
    /// Provider reports a failure
    Error,
    /// Provider reported a state we don't know
    Unrecognized,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Pending => write!(f, "pending"),
            NodeState::Running => write!(f, "running"),
            NodeState::Suspended => write!(f, "suspended"),
            NodeState::Terminated => write!(f, "terminated"),
            NodeState::Error => write!(f, "error"),
            NodeState::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Metadata describing a single compute node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Directory-unique id (e.g. `tk1a/113500000001`)
    pub id: String,

    /// Id assigned by the provider
    pub provider_id: String,

    /// Human readable name
    pub name: String,

    /// Logical group the node belongs to
    pub group: Option<String>,

    /// Free-form tags
    pub tags: Vec<String>,

    pub location: Location,

    pub state: NodeState,

    pub public_addresses: Vec<IpAddr>,

    pub private_addresses: Vec<IpAddr>,
}

impl NodeMetadata {
    pub fn new(
        id: impl Into<String>,
        provider_id: impl Into<String>,
        location: Location,
        state: NodeState,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider_id: provider_id.into(),
            group: None,
            tags: Vec::new(),
            location,
            state,
            public_addresses: Vec::new(),
            private_addresses: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_public_address(mut self, address: IpAddr) -> Self {
        self.public_addresses.push(address);
        self
    }

    pub fn with_private_address(mut self, address: IpAddr) -> Self {
        self.private_addresses.push(address);
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.state == NodeState::Terminated
    }

    /// First public address, falling back to a private one
    pub fn primary_address(&self) -> Option<IpAddr> {
        self.public_addresses
            .first()
            .or_else(|| self.private_addresses.first())
            .copied()
    }
}
