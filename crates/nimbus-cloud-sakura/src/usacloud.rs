//! usacloud CLI wrapper
//!
//! Wraps the usacloud CLI commands for Sakura Cloud operations.

use crate::error::{Result, SakuraError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;
use std::process::Stdio;
use tokio::process::Command;

/// usacloud CLI wrapper
///
/// Zoned resources (servers) need a zone; global resources such as
/// Enhanced Load Balancers are managed through [`Usacloud::global`].
pub struct Usacloud {
    zone: Option<String>,
}

impl Usacloud {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
        }
    }

    pub fn global() -> Self {
        Self { zone: None }
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Check if usacloud is installed and authenticated
    pub async fn check_auth(&self) -> Result<UsacloudAuth> {
        let which = Command::new("which").arg("usacloud").output().await?;

        if !which.status.success() {
            return Err(SakuraError::UsacloudNotFound);
        }

        let output = self
            .run_command(&["auth-status", "--output-type", "json"])
            .await
            .map_err(|e| match e {
                SakuraError::CommandFailed(msg) => SakuraError::AuthenticationFailed(msg),
                other => other,
            })?;

        parse_one(&output)
    }

    /// Run a usacloud command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("usacloud");
        if let Some(zone) = &self.zone {
            cmd.arg("--zone").arg(zone);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: usacloud {}{}",
            self.zone
                .as_deref()
                .map(|z| format!("--zone {} ", z))
                .unwrap_or_default(),
            args.join(" ")
        );

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SakuraError::UsacloudNotFound
            } else {
                SakuraError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SakuraError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// List all servers in the zone
    pub async fn list_servers(&self) -> Result<Vec<ServerInfo>> {
        let output = self
            .run_command(&["server", "list", "--output-type", "json"])
            .await?;
        parse_list(&output)
    }

    /// Get server by ID
    pub async fn get_server_by_id(&self, id: &str) -> Result<ServerInfo> {
        let output = self
            .run_command(&["server", "read", id, "--output-type", "json"])
            .await
            .map_err(|e| match e {
                SakuraError::CommandFailed(_) => SakuraError::ServerNotFound(id.to_string()),
                other => other,
            })?;
        parse_one(&output)
    }

    /// List Enhanced Load Balancers
    pub async fn list_proxy_lbs(&self) -> Result<Vec<ProxyLbInfo>> {
        let output = self
            .run_command(&["proxy-lb", "list", "--output-type", "json"])
            .await?;
        parse_list(&output)
    }

    /// Create an Enhanced Load Balancer
    pub async fn create_proxy_lb(&self, params: &ProxyLbParameters) -> Result<ProxyLbInfo> {
        let parameters = serde_json::to_string(params)?;
        let output = self
            .run_command(&[
                "proxy-lb",
                "create",
                "--parameters",
                parameters.as_str(),
                "--output-type",
                "json",
                "--yes",
            ])
            .await
            .map_err(|e| match e {
                SakuraError::CommandFailed(msg) => SakuraError::CreationFailed(msg),
                other => other,
            })?;
        parse_one(&output)
    }

    /// Delete an Enhanced Load Balancer
    pub async fn delete_proxy_lb(&self, id: &str) -> Result<()> {
        self.run_command(&["proxy-lb", "delete", id, "--yes"])
            .await
            .map_err(|e| match e {
                SakuraError::CommandFailed(msg) => SakuraError::DeletionFailed(msg),
                other => other,
            })?;
        Ok(())
    }
}

/// Parse a JSON array, treating empty output as no items
fn parse_list<T: DeserializeOwned>(output: &str) -> Result<Vec<T>> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Parse a single object; usacloud wraps some results in a one-element array
fn parse_one<T: DeserializeOwned>(output: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(output.trim())?;
    let value = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        serde_json::Value::Array(_) => {
            return Err(SakuraError::CommandFailed(
                "usacloud returned an empty result".to_string(),
            ));
        }
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

/// IDs come back as numbers or strings depending on the usacloud version
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Authentication status from usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsacloudAuth {
    #[serde(rename = "Account")]
    pub account: Option<AccountInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "ID", deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Server information from usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "ID", deserialize_with = "id_string")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,

    #[serde(rename = "CPU")]
    pub cpu: Option<i32>,

    #[serde(rename = "MemoryMB")]
    pub memory_mb: Option<i32>,

    #[serde(rename = "InstanceStatus")]
    pub instance_status: Option<String>,

    #[serde(rename = "Interfaces")]
    pub interfaces: Option<Vec<InterfaceInfo>>,
}

impl ServerInfo {
    pub fn id_str(&self) -> String {
        self.id.clone()
    }

    /// Get the first shared-segment IP address
    pub fn ip_address(&self) -> Option<String> {
        self.interfaces
            .as_ref()?
            .iter()
            .find_map(|i| i.ip_address.clone())
    }

    /// Addresses assigned on switch-connected interfaces
    pub fn user_ip_addresses(&self) -> Vec<IpAddr> {
        self.interfaces
            .iter()
            .flatten()
            .filter_map(|i| i.user_ip_address.as_deref())
            .filter_map(|ip| ip.parse().ok())
            .collect()
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.instance_status.as_deref() == Some("up")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInfo {
    #[serde(rename = "IPAddress")]
    pub ip_address: Option<String>,

    #[serde(rename = "UserIPAddress", default)]
    pub user_ip_address: Option<String>,
}

/// Enhanced Load Balancer as listed by usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyLbInfo {
    #[serde(rename = "ID", deserialize_with = "id_string")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "FQDN", default)]
    pub fqdn: Option<String>,

    #[serde(rename = "VirtualIPAddress", default)]
    pub virtual_ip_address: Option<String>,

    #[serde(rename = "Region", default)]
    pub region: Option<String>,

    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
}

impl ProxyLbInfo {
    pub fn virtual_ip(&self) -> Option<IpAddr> {
        self.virtual_ip_address.as_deref()?.parse().ok()
    }
}

/// Parameters for `usacloud proxy-lb create --parameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProxyLbParameters {
    pub name: String,
    pub plan: u32,
    pub region: String,
    pub health_check: ProxyLbHealthCheck,
    pub bind_ports: Vec<ProxyLbBindPort>,
    pub servers: Vec<ProxyLbServer>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProxyLbHealthCheck {
    pub protocol: String,
    pub delay_loop: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProxyLbBindPort {
    pub proxy_mode: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyLbServer {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "Enabled")]
    pub enabled: bool,
}
