//! Enhanced Load Balancer (proxy-lb) strategies

use crate::error::{Result, SakuraError};
use crate::usacloud::{
    ProxyLbBindPort, ProxyLbHealthCheck, ProxyLbInfo, ProxyLbParameters, ProxyLbServer, Usacloud,
};
use async_trait::async_trait;
use nimbus_cloud::{
    CloudError, DestroyLoadBalancerStrategy, HostResolver, LoadBalanceNodesStrategy,
    LoadBalancerSpec, Location, Protocol, SystemResolver,
};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

/// Tag attached to every proxy-lb created by nimbus
pub const MANAGED_TAG: &str = "nimbus";

/// Default proxy-lb plan (connections per second)
pub const DEFAULT_PLAN: u32 = 100;

/// Creates and destroys Sakura Cloud Enhanced Load Balancers
///
/// One proxy-lb named `<name>-<zone>` is created per location, placed in the
/// region the zone belongs to.
pub struct ProxyLbStrategy {
    plan: u32,
    resolver: Arc<dyn HostResolver>,
}

impl ProxyLbStrategy {
    pub fn new(plan: u32) -> Self {
        Self {
            plan,
            resolver: Arc::new(SystemResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Look up the address of every server in the zone
    async fn server_addresses(
        &self,
        zone: &str,
        provider_ids: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let usacloud = Usacloud::new(zone);
        let mut ids: Vec<&String> = provider_ids.iter().collect();
        ids.sort();

        let mut addresses = Vec::with_capacity(ids.len());
        for id in ids {
            let server = usacloud.get_server_by_id(id).await?;
            let ip = server
                .ip_address()
                .ok_or_else(|| SakuraError::ServerWithoutAddress(id.clone()))?;
            addresses.push(ip);
        }
        Ok(addresses)
    }

    /// Whether `lb` answers on `address`, by VIP or by its FQDN
    async fn answers_on(&self, lb: &ProxyLbInfo, address: IpAddr) -> bool {
        if lb.virtual_ip() == Some(address) {
            return true;
        }
        match lb.fqdn.as_deref() {
            Some(fqdn) => match self.resolver.resolve(fqdn).await {
                Ok(ips) => ips.contains(&address),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", lb.name, e);
                    false
                }
            },
            None => false,
        }
    }
}

impl ProxyLbStrategy {
    /// The nimbus-managed proxy-lb answering on `address`, if exactly one does
    ///
    /// Untagged proxy-lbs are never candidates. Two or more candidates is an
    /// error so that nothing is deleted on a guess.
    async fn deletion_target<'a>(
        &self,
        lbs: &'a [ProxyLbInfo],
        address: IpAddr,
    ) -> nimbus_cloud::Result<Option<&'a ProxyLbInfo>> {
        let mut matches = Vec::new();
        for lb in lbs.iter().filter(|lb| lb.tags.iter().any(|t| t == MANAGED_TAG)) {
            if self.answers_on(lb, address).await {
                matches.push(lb);
            }
        }

        match matches.as_slice() {
            [] => Ok(None),
            [lb] => Ok(Some(*lb)),
            many => {
                let names: Vec<&str> = many.iter().map(|lb| lb.name.as_str()).collect();
                Err(CloudError::InvalidArgument(format!(
                    "{} answers on more than one enhanced load balancer: {}",
                    address,
                    names.join(", ")
                )))
            }
        }
    }
}

impl Default for ProxyLbStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN)
    }
}

/// Region a zone belongs to (`tk1a` → `tk1`)
pub fn region_for_zone(zone: &str) -> String {
    match zone {
        z if z.starts_with("tk1") => "tk1".to_string(),
        z if z.starts_with("is1") => "is1".to_string(),
        _ => "anycast".to_string(),
    }
}

/// Build the proxy-lb parameters for one location
pub fn proxy_lb_parameters(
    location: &Location,
    spec: &LoadBalancerSpec,
    plan: u32,
    server_addresses: Vec<String>,
) -> ProxyLbParameters {
    let mode = match spec.protocol {
        Protocol::Http => "http",
        Protocol::Tcp => "tcp",
    };

    ProxyLbParameters {
        name: format!("{}-{}", spec.name, location.id),
        plan,
        region: region_for_zone(&location.id),
        health_check: ProxyLbHealthCheck {
            protocol: mode.to_string(),
            delay_loop: 10,
            path: (spec.protocol == Protocol::Http).then(|| "/".to_string()),
        },
        bind_ports: vec![ProxyLbBindPort {
            proxy_mode: mode.to_string(),
            port: spec.load_balancer_port,
        }],
        servers: server_addresses
            .into_iter()
            .map(|ip_address| ProxyLbServer {
                ip_address,
                port: spec.instance_port,
                enabled: true,
            })
            .collect(),
        tags: vec![MANAGED_TAG.to_string()],
    }
}

#[async_trait]
impl LoadBalanceNodesStrategy for ProxyLbStrategy {
    async fn create(
        &self,
        location: &Location,
        spec: &LoadBalancerSpec,
        provider_ids: &HashSet<String>,
    ) -> nimbus_cloud::Result<String> {
        let addresses = self.server_addresses(&location.id, provider_ids).await?;
        let params = proxy_lb_parameters(location, spec, self.plan, addresses);

        tracing::info!(
            "Creating enhanced load balancer {} ({} server(s))",
            params.name,
            params.servers.len()
        );
        let lb = Usacloud::global().create_proxy_lb(&params).await?;

        let fqdn = lb
            .fqdn
            .filter(|f| !f.is_empty())
            .ok_or_else(|| SakuraError::MissingFqdn(lb.name.clone()))?;
        Ok(fqdn)
    }
}

#[async_trait]
impl DestroyLoadBalancerStrategy for ProxyLbStrategy {
    async fn destroy(&self, address: IpAddr) -> nimbus_cloud::Result<bool> {
        let usacloud = Usacloud::global();
        let lbs = usacloud.list_proxy_lbs().await?;

        match self.deletion_target(&lbs, address).await? {
            Some(lb) => {
                tracing::info!("Deleting enhanced load balancer {} ({})", lb.name, lb.id);
                usacloud.delete_proxy_lb(&lb.id).await?;
                Ok(true)
            }
            None => {
                tracing::debug!("No managed enhanced load balancer answers on {}", address);
                Ok(false)
            }
        }
    }
}
