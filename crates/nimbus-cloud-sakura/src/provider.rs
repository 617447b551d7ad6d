//! Sakura Cloud provider implementation

use crate::error::SakuraError;
use crate::usacloud::{ServerInfo, Usacloud};
use async_trait::async_trait;
use nimbus_cloud::{AuthStatus, CloudProvider, ComputeService, Location, NodeMetadata, NodeState};

/// Tag prefix used to put servers into a node group (`group=web`)
pub const GROUP_TAG_PREFIX: &str = "group=";

/// Sakura Cloud provider
///
/// Lists servers across every configured zone; each zone becomes a
/// [`Location`].
pub struct SakuraCloudProvider {
    zones: Vec<String>,
}

impl SakuraCloudProvider {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zones: zones.into_iter().map(Into::into).collect(),
        }
    }

    pub fn zones(&self) -> &[String] {
        &self.zones
    }
}

/// Map usacloud's `InstanceStatus` to a node state
fn node_state(instance_status: Option<&str>) -> NodeState {
    match instance_status {
        Some("up") => NodeState::Running,
        Some("down") => NodeState::Suspended,
        Some("cleaning") => NodeState::Terminated,
        None => NodeState::Pending,
        Some(_) => NodeState::Unrecognized,
    }
}

/// Convert a usacloud server into node metadata
pub fn node_from_server(zone: &str, server: &ServerInfo) -> NodeMetadata {
    let mut node = NodeMetadata::new(
        format!("{}/{}", zone, server.id),
        server.id.clone(),
        Location::zone(zone),
        node_state(server.instance_status.as_deref()),
    )
    .with_name(server.name.clone());

    for tag in &server.tags {
        match tag.strip_prefix(GROUP_TAG_PREFIX) {
            Some(group) if node.group.is_none() => node.group = Some(group.to_string()),
            _ => node.tags.push(tag.clone()),
        }
    }

    if let Some(ip) = server.ip_address().and_then(|ip| ip.parse().ok()) {
        node.public_addresses.push(ip);
    }
    node.private_addresses = server.user_ip_addresses();

    node
}

#[async_trait]
impl CloudProvider for SakuraCloudProvider {
    fn name(&self) -> &str {
        "sakura-cloud"
    }

    fn display_name(&self) -> &str {
        "さくらのクラウド"
    }

    async fn check_auth(&self) -> nimbus_cloud::Result<AuthStatus> {
        let usacloud = match self.zones.first() {
            Some(zone) => Usacloud::new(zone),
            None => Usacloud::global(),
        };

        match usacloud.check_auth().await {
            Ok(auth) => {
                let account_info = auth
                    .account
                    .map(|a| format!("{} ({})", a.name, a.id))
                    .unwrap_or_else(|| "Unknown".to_string());
                Ok(AuthStatus::ok(account_info))
            }
            Err(SakuraError::UsacloudNotFound) => {
                Ok(AuthStatus::failed("usacloud がインストールされていません"))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl ComputeService for SakuraCloudProvider {
    async fn list_nodes(&self) -> nimbus_cloud::Result<Vec<NodeMetadata>> {
        let mut nodes = Vec::new();

        for zone in &self.zones {
            let servers = Usacloud::new(zone).list_servers().await?;
            tracing::debug!("Found {} server(s) in {}", servers.len(), zone);
            nodes.extend(servers.iter().map(|server| node_from_server(zone, server)));
        }

        Ok(nodes)
    }
}
