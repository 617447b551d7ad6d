//! Load balancer orchestration
//!
//! [`BaseLoadBalancerService`] puts one load balancer in front of the nodes
//! matching a filter, per location those nodes live in. Creating and
//! destroying the balancers themselves is delegated to provider strategies:
//!
//! ```text
//!   ComputeService ──list──▶ filter && !terminated ──▶ group by location
//!                                                          │
//!                          ┌───────────────────────────────┘
//!                          ▼  (one location at a time)
//!   LoadBalanceNodesStrategy::create ──▶ DNS name ──▶ resolve (3 × 1s)
//!                                                          │
//!                                                          ▼
//!                                                 set of addresses
//! ```

use crate::compute::ComputeService;
use crate::error::{CloudError, Result};
use crate::node::{Location, LocationMap, NodeMetadata};
use crate::predicates::NodeFilter;
use crate::provider::RetryConfig;
use crate::resolver::{HostResolver, SystemResolver, dns_retry, resolve_with_retry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Protocol a load balancer forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Tcp,
}

impl FromStr for Protocol {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(Protocol::Http),
            "TCP" => Ok(Protocol::Tcp),
            _ => Err(CloudError::InvalidArgument(format!(
                "Acceptable values for protocol are HTTP or TCP (got {:?})",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// What to build at each location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub name: String,
    pub protocol: Protocol,
    /// Port the balancer listens on
    pub load_balancer_port: u16,
    /// Port the backend nodes listen on
    pub instance_port: u16,
}

/// Creates a load balancer in a location and returns its DNS name
#[async_trait]
pub trait LoadBalanceNodesStrategy: Send + Sync {
    async fn create(
        &self,
        location: &Location,
        spec: &LoadBalancerSpec,
        provider_ids: &HashSet<String>,
    ) -> Result<String>;
}

/// Tears down the load balancer reachable at `address`
///
/// Returns `false` when the provider reports nothing was destroyed.
#[async_trait]
pub trait DestroyLoadBalancerStrategy: Send + Sync {
    async fn destroy(&self, address: IpAddr) -> Result<bool>;
}

/// Outcome of balancer creation at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationOutcome {
    /// Created and the DNS name resolved
    Resolved {
        dns_name: String,
        addresses: Vec<IpAddr>,
    },
    /// Created but the DNS name never resolved
    Unresolved { dns_name: String },
}

impl LocationOutcome {
    pub fn dns_name(&self) -> &str {
        match self {
            LocationOutcome::Resolved { dns_name, .. } => dns_name,
            LocationOutcome::Unresolved { dns_name } => dns_name,
        }
    }

    pub fn addresses(&self) -> &[IpAddr] {
        match self {
            LocationOutcome::Resolved { addresses, .. } => addresses,
            LocationOutcome::Unresolved { .. } => &[],
        }
    }
}

/// Per-location results of a create call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerReport {
    pub locations: HashMap<Location, LocationOutcome>,
}

impl LoadBalancerReport {
    /// Every resolved address across all locations
    pub fn addresses(&self) -> HashSet<IpAddr> {
        self.locations
            .values()
            .flat_map(|outcome| outcome.addresses().iter().copied())
            .collect()
    }

    /// Locations whose balancer was created but never resolved
    pub fn unresolved(&self) -> Vec<(&Location, &str)> {
        self.locations
            .iter()
            .filter_map(|(location, outcome)| match outcome {
                LocationOutcome::Unresolved { dns_name } => Some((location, dns_name.as_str())),
                LocationOutcome::Resolved { .. } => None,
            })
            .collect()
    }
}

/// Load balancer service
#[async_trait]
pub trait LoadBalancerService: Send + Sync {
    /// Put a load balancer in front of the live nodes accepted by `filter`,
    /// one per location, and return the addresses the balancers resolve to
    ///
    /// Locations whose balancer name never resolves are left out of the
    /// result without an error.
    async fn load_balance_nodes_matching(
        &self,
        filter: &NodeFilter,
        load_balancer_name: &str,
        protocol: &str,
        load_balancer_port: u16,
        instance_port: u16,
    ) -> Result<HashSet<IpAddr>>;

    /// Destroy the load balancer reachable at `address`
    async fn destroy_load_balancer(&self, address: IpAddr) -> Result<()>;
}

/// Strategy-driven [`LoadBalancerService`]
pub struct BaseLoadBalancerService {
    compute: Arc<dyn ComputeService>,
    load_balance_strategy: Arc<dyn LoadBalanceNodesStrategy>,
    destroy_strategy: Arc<dyn DestroyLoadBalancerStrategy>,
    resolver: Arc<dyn HostResolver>,
    retry: RetryConfig,
}

impl BaseLoadBalancerService {
    pub fn new(
        compute: Arc<dyn ComputeService>,
        load_balance_strategy: Arc<dyn LoadBalanceNodesStrategy>,
        destroy_strategy: Arc<dyn DestroyLoadBalancerStrategy>,
    ) -> Self {
        Self {
            compute,
            load_balance_strategy,
            destroy_strategy,
            resolver: Arc::new(SystemResolver),
            retry: dns_retry(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn compute(&self) -> &Arc<dyn ComputeService> {
        &self.compute
    }

    /// Group the live nodes accepted by `filter` by location
    pub fn group_by_location(
        nodes: impl IntoIterator<Item = NodeMetadata>,
        filter: &NodeFilter,
    ) -> LocationMap {
        let mut locations = LocationMap::new();
        for node in nodes {
            if !filter(&node) || node.is_terminated() {
                continue;
            }
            locations
                .entry(node.location)
                .or_default()
                .insert(node.provider_id);
        }
        locations
    }

    /// Same as [`LoadBalancerService::load_balance_nodes_matching`], but
    /// reports what happened at every location
    ///
    /// Locations are processed in id order. When a strategy fails, the error
    /// is [`CloudError::CreateAborted`] carrying the locations already created.
    pub async fn load_balance_nodes_matching_report(
        &self,
        filter: &NodeFilter,
        load_balancer_name: &str,
        protocol: &str,
        load_balancer_port: u16,
        instance_port: u16,
    ) -> Result<LoadBalancerReport> {
        let spec = LoadBalancerSpec {
            name: load_balancer_name.to_string(),
            protocol: protocol.parse()?,
            load_balancer_port,
            instance_port,
        };

        let nodes = self.compute.list_nodes().await?;
        let mut locations: Vec<_> = Self::group_by_location(nodes, filter).into_iter().collect();
        locations.sort_by(|a, b| a.0.id.cmp(&b.0.id));

        let mut report = LoadBalancerReport::default();
        for (location, provider_ids) in locations {
            tracing::debug!(
                ">> creating load balancer ({}) at {} for {} node(s)",
                spec.name,
                location,
                provider_ids.len()
            );
            let dns_name = match self
                .load_balance_strategy
                .create(&location, &spec, &provider_ids)
                .await
            {
                Ok(dns_name) => dns_name,
                Err(source) => {
                    tracing::warn!(
                        "Creating load balancer {} failed at {} after {} location(s)",
                        spec.name,
                        location,
                        report.locations.len()
                    );
                    return Err(CloudError::CreateAborted {
                        location: location.id,
                        created: Box::new(report),
                        source: Box::new(source),
                    });
                }
            };

            let outcome =
                match resolve_with_retry(self.resolver.as_ref(), &dns_name, &self.retry).await {
                    Some(addresses) => LocationOutcome::Resolved {
                        dns_name: dns_name.clone(),
                        addresses,
                    },
                    None => {
                        tracing::warn!(
                            "Load balancer {} at {} was created but {} did not resolve",
                            spec.name,
                            location,
                            dns_name
                        );
                        LocationOutcome::Unresolved {
                            dns_name: dns_name.clone(),
                        }
                    }
                };
            tracing::debug!(
                "<< created load balancer ({}) DNS ({})",
                spec.name,
                dns_name
            );
            report.locations.insert(location, outcome);
        }

        Ok(report)
    }
}

#[async_trait]
impl LoadBalancerService for BaseLoadBalancerService {
    async fn load_balance_nodes_matching(
        &self,
        filter: &NodeFilter,
        load_balancer_name: &str,
        protocol: &str,
        load_balancer_port: u16,
        instance_port: u16,
    ) -> Result<HashSet<IpAddr>> {
        let report = self
            .load_balance_nodes_matching_report(
                filter,
                load_balancer_name,
                protocol,
                load_balancer_port,
                instance_port,
            )
            .await
            .map_err(|e| match e {
                CloudError::CreateAborted { source, .. } => *source,
                other => other,
            })?;
        Ok(report.addresses())
    }

    async fn destroy_load_balancer(&self, address: IpAddr) -> Result<()> {
        tracing::debug!(">> destroying load balancer ({})", address);
        let successful = self.destroy_strategy.destroy(address).await?;
        tracing::debug!(
            "<< destroyed load balancer ({}) success ({})",
            address,
            successful
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeState;
    use crate::predicates;
    use crate::provider::{AuthStatus, CloudProvider};
    use crate::resolver::ResolveError;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticCompute {
        nodes: Vec<NodeMetadata>,
        list_calls: Mutex<u32>,
    }

    impl StaticCompute {
        fn new(nodes: Vec<NodeMetadata>) -> Self {
            Self {
                nodes,
                list_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CloudProvider for StaticCompute {
        fn name(&self) -> &str {
            "static"
        }

        fn display_name(&self) -> &str {
            "Static"
        }

        async fn check_auth(&self) -> Result<AuthStatus> {
            Ok(AuthStatus::ok("test"))
        }
    }

    #[async_trait]
    impl ComputeService for StaticCompute {
        async fn list_nodes(&self) -> Result<Vec<NodeMetadata>> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.nodes.clone())
        }
    }

    /// Records every call and answers `<name>.<location>.lb.test`
    #[derive(Default)]
    struct SpyStrategy {
        created: Mutex<Vec<(Location, LoadBalancerSpec, HashSet<String>)>>,
        destroyed: Mutex<Vec<IpAddr>>,
        fail_at: Option<String>,
    }

    #[async_trait]
    impl LoadBalanceNodesStrategy for SpyStrategy {
        async fn create(
            &self,
            location: &Location,
            spec: &LoadBalancerSpec,
            provider_ids: &HashSet<String>,
        ) -> Result<String> {
            if self.fail_at.as_deref() == Some(location.id.as_str()) {
                return Err(CloudError::ApiError("quota exceeded".to_string()));
            }
            self.created
                .lock()
                .unwrap()
                .push((location.clone(), spec.clone(), provider_ids.clone()));
            Ok(format!("{}.{}.lb.test", spec.name, location.id))
        }
    }

    #[async_trait]
    impl DestroyLoadBalancerStrategy for SpyStrategy {
        async fn destroy(&self, address: IpAddr) -> Result<bool> {
            self.destroyed.lock().unwrap().push(address);
            Ok(true)
        }
    }

    /// Answers from a fixed table after `failures` misses per host
    struct TableResolver {
        table: HashMap<String, IpAddr>,
        failures: u32,
        calls: Mutex<HashMap<String, u32>>,
    }

    impl TableResolver {
        fn new(entries: &[(&str, &str)], failures: u32) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(host, ip)| (host.to_string(), ip.parse().unwrap()))
                    .collect(),
                failures,
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls(&self, host: &str) -> u32 {
            self.calls.lock().unwrap().get(host).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl HostResolver for TableResolver {
        async fn resolve(&self, host: &str) -> std::result::Result<Vec<IpAddr>, ResolveError> {
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(host.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            if attempt <= self.failures {
                return Err(ResolveError::UnknownHost(host.to_string()));
            }
            self.table
                .get(host)
                .map(|ip| vec![*ip])
                .ok_or_else(|| ResolveError::UnknownHost(host.to_string()))
        }
    }

    fn node(id: &str, zone: &str, state: NodeState) -> NodeMetadata {
        NodeMetadata::new(format!("{}/{}", zone, id), id, Location::zone(zone), state)
    }

    fn scenario_nodes() -> Vec<NodeMetadata> {
        vec![
            node("A", "loc1", NodeState::Running),
            node("B", "loc1", NodeState::Running),
            node("C", "loc2", NodeState::Terminated),
        ]
    }

    fn service(
        nodes: Vec<NodeMetadata>,
        strategy: Arc<SpyStrategy>,
        resolver: Arc<TableResolver>,
    ) -> (BaseLoadBalancerService, Arc<StaticCompute>) {
        let compute = Arc::new(StaticCompute::new(nodes));
        let service = BaseLoadBalancerService::new(compute.clone(), strategy.clone(), strategy)
            .with_resolver(resolver)
            .with_retry(RetryConfig::fixed(3, Duration::from_millis(1)));
        (service, compute)
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_protocol_parsing_is_case_insensitive() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("Tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        for bad in ["UDP", "https", "", " tcp"] {
            assert!(matches!(
                bad.parse::<Protocol>(),
                Err(CloudError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_protocol_error_names_rejected_value() {
        let err = "udp".parse::<Protocol>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: Acceptable values for protocol are HTTP or TCP (got \"udp\")"
        );
    }

    #[test]
    fn test_group_by_location_skips_terminated_and_filtered() {
        let nodes = vec![
            node("A", "loc1", NodeState::Running).with_group("web"),
            node("B", "loc1", NodeState::Suspended).with_group("web"),
            node("C", "loc2", NodeState::Terminated).with_group("web"),
            node("D", "loc2", NodeState::Running).with_group("db"),
            node("E", "loc3", NodeState::Pending).with_group("web"),
        ];

        let groups = BaseLoadBalancerService::group_by_location(nodes, &predicates::in_group("web"));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Location::zone("loc1")], ids(&["A", "B"]));
        assert_eq!(groups[&Location::zone("loc3")], ids(&["E"]));
        assert!(!groups.contains_key(&Location::zone("loc2")));
    }

    #[tokio::test]
    async fn test_one_balancer_per_live_location() {
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[("web.loc1.lb.test", "198.51.100.1")], 0));
        let (service, _) = service(scenario_nodes(), strategy.clone(), resolver);

        let addresses = service
            .load_balance_nodes_matching(&predicates::all(), "web", "tcp", 80, 8080)
            .await
            .unwrap();

        assert_eq!(addresses, HashSet::from(["198.51.100.1".parse().unwrap()]));

        let created = strategy.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let (location, spec, provider_ids) = &created[0];
        assert_eq!(location, &Location::zone("loc1"));
        assert_eq!(provider_ids, &ids(&["A", "B"]));
        assert_eq!(
            spec,
            &LoadBalancerSpec {
                name: "web".to_string(),
                protocol: Protocol::Tcp,
                load_balancer_port: 80,
                instance_port: 8080,
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_protocol_has_no_side_effects() {
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[], 0));
        let (service, compute) = service(scenario_nodes(), strategy.clone(), resolver);

        let result = service
            .load_balance_nodes_matching(&predicates::all(), "web", "UDP", 80, 8080)
            .await;

        assert!(matches!(result, Err(CloudError::InvalidArgument(_))));
        assert!(strategy.created.lock().unwrap().is_empty());
        assert_eq!(*compute.list_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_every_matching_location_gets_exactly_one_call() {
        let nodes = vec![
            node("A", "tk1a", NodeState::Running).with_tag("lb"),
            node("B", "tk1a", NodeState::Running),
            node("C", "is1a", NodeState::Running).with_tag("lb"),
            node("D", "is1b", NodeState::Running).with_tag("lb"),
            node("E", "is1b", NodeState::Error).with_tag("lb"),
        ];
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(
            &[
                ("api.tk1a.lb.test", "198.51.100.1"),
                ("api.is1a.lb.test", "198.51.100.2"),
                ("api.is1b.lb.test", "198.51.100.3"),
            ],
            0,
        ));
        let (service, _) = service(nodes, strategy.clone(), resolver);

        let addresses = service
            .load_balance_nodes_matching(&predicates::with_tag("lb"), "api", "HTTP", 443, 8443)
            .await
            .unwrap();
        assert_eq!(addresses.len(), 3);

        let created = strategy.created.lock().unwrap();
        let by_location: HashMap<String, HashSet<String>> = created
            .iter()
            .map(|(location, _, provider_ids)| (location.id.clone(), provider_ids.clone()))
            .collect();
        assert_eq!(created.len(), 3);
        assert_eq!(by_location["tk1a"], ids(&["A"]));
        assert_eq!(by_location["is1a"], ids(&["C"]));
        assert_eq!(by_location["is1b"], ids(&["D", "E"]));
    }

    #[tokio::test]
    async fn test_resolution_succeeding_on_last_attempt_is_kept() {
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[("web.loc1.lb.test", "198.51.100.9")], 2));
        let (service, _) = service(scenario_nodes(), strategy, resolver.clone());

        let addresses = service
            .load_balance_nodes_matching(&predicates::all(), "web", "http", 80, 80)
            .await
            .unwrap();

        assert_eq!(addresses, HashSet::from(["198.51.100.9".parse().unwrap()]));
        assert_eq!(resolver.calls("web.loc1.lb.test"), 3);
    }

    #[tokio::test]
    async fn test_unresolved_location_is_silently_absent() {
        let nodes = vec![
            node("A", "loc1", NodeState::Running),
            node("B", "loc2", NodeState::Running),
        ];
        let strategy = Arc::new(SpyStrategy::default());
        // Only loc1 ever resolves
        let resolver = Arc::new(TableResolver::new(&[("web.loc1.lb.test", "198.51.100.1")], 0));
        let (service, _) = service(nodes, strategy.clone(), resolver.clone());

        let addresses = service
            .load_balance_nodes_matching(&predicates::all(), "web", "tcp", 80, 80)
            .await
            .unwrap();

        assert_eq!(addresses, HashSet::from(["198.51.100.1".parse().unwrap()]));
        assert_eq!(strategy.created.lock().unwrap().len(), 2);
        assert_eq!(resolver.calls("web.loc2.lb.test"), 3);
    }

    #[tokio::test]
    async fn test_report_distinguishes_unresolved_locations() {
        let nodes = vec![
            node("A", "loc1", NodeState::Running),
            node("B", "loc2", NodeState::Running),
        ];
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[("web.loc1.lb.test", "198.51.100.1")], 0));
        let (service, _) = service(nodes, strategy, resolver);

        let report = service
            .load_balance_nodes_matching_report(&predicates::all(), "web", "tcp", 80, 80)
            .await
            .unwrap();

        assert_eq!(report.locations.len(), 2);
        assert_eq!(
            report.unresolved(),
            vec![(&Location::zone("loc2"), "web.loc2.lb.test")]
        );
        assert_eq!(
            report.locations[&Location::zone("loc1")],
            LocationOutcome::Resolved {
                dns_name: "web.loc1.lb.test".to_string(),
                addresses: vec!["198.51.100.1".parse().unwrap()],
            }
        );
    }

    #[tokio::test]
    async fn test_strategy_failure_propagates() {
        let nodes = vec![node("A", "loc1", NodeState::Running)];
        let strategy = Arc::new(SpyStrategy {
            fail_at: Some("loc1".to_string()),
            ..Default::default()
        });
        let resolver = Arc::new(TableResolver::new(&[], 0));
        let (service, _) = service(nodes, strategy, resolver);

        let result = service
            .load_balance_nodes_matching(&predicates::all(), "web", "tcp", 80, 80)
            .await;
        assert!(matches!(result, Err(CloudError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_failure_part_way_reports_created_locations() {
        let nodes = vec![
            node("A", "loc1", NodeState::Running),
            node("B", "loc2", NodeState::Running),
            node("C", "loc3", NodeState::Running),
        ];
        let strategy = Arc::new(SpyStrategy {
            fail_at: Some("loc2".to_string()),
            ..Default::default()
        });
        let resolver = Arc::new(TableResolver::new(&[("web.loc1.lb.test", "198.51.100.1")], 0));
        let (service, _) = service(nodes, strategy.clone(), resolver);

        let result = service
            .load_balance_nodes_matching_report(&predicates::all(), "web", "tcp", 80, 80)
            .await;

        let Err(CloudError::CreateAborted {
            location,
            created,
            source,
        }) = result
        else {
            panic!("expected an aborted create");
        };
        assert_eq!(location, "loc2");
        assert!(matches!(*source, CloudError::ApiError(_)));
        assert_eq!(created.locations.len(), 1);
        assert_eq!(
            created.addresses(),
            HashSet::from(["198.51.100.1".parse().unwrap()])
        );

        // loc3 is never attempted once loc2 fails
        let created_calls = strategy.created.lock().unwrap();
        assert_eq!(created_calls.len(), 1);
        assert_eq!(created_calls[0].0, Location::zone("loc1"));
    }

    #[tokio::test]
    async fn test_no_matching_nodes_creates_nothing() {
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[], 0));
        let (service, _) = service(scenario_nodes(), strategy.clone(), resolver);

        let addresses = service
            .load_balance_nodes_matching(&predicates::in_group("nobody"), "web", "tcp", 80, 80)
            .await
            .unwrap();

        assert!(addresses.is_empty());
        assert!(strategy.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_calls_strategy_once() {
        let strategy = Arc::new(SpyStrategy::default());
        let resolver = Arc::new(TableResolver::new(&[], 0));
        let (service, compute) = service(scenario_nodes(), strategy.clone(), resolver);
        let address: IpAddr = "198.51.100.1".parse().unwrap();

        service.destroy_load_balancer(address).await.unwrap();

        assert_eq!(*strategy.destroyed.lock().unwrap(), vec![address]);
        assert!(strategy.created.lock().unwrap().is_empty());
        assert_eq!(*compute.list_calls.lock().unwrap(), 0);
    }
}
