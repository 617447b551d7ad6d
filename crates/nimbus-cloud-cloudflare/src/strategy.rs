//! Cloudflare load balancer strategies

use crate::api::{
    CloudflareConfig, CloudflareLoadBalancing, CreateLoadBalancerRequest, CreatePoolRequest,
    LoadBalancer, Origin,
};
use crate::error::CloudflareError;
use async_trait::async_trait;
use nimbus_cloud::{
    AuthStatus, CloudError, CloudProvider, ComputeService, DestroyLoadBalancerStrategy,
    HostResolver, LoadBalanceNodesStrategy, LoadBalancerSpec, Location, NodeMetadata, Protocol,
    SystemResolver,
};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

/// Puts Cloudflare load balancers in front of nodes from any compute service
///
/// For each location an origin pool `<name>-<location>` and a load balancer
/// `<name>-<location>.<domain>` are created. HTTP balancers are proxied by
/// Cloudflare; TCP balancers are DNS-only.
pub struct CloudflareLbStrategy {
    api: CloudflareLoadBalancing,
    compute: Arc<dyn ComputeService>,
    resolver: Arc<dyn HostResolver>,
}

impl CloudflareLbStrategy {
    pub fn new(config: CloudflareConfig, compute: Arc<dyn ComputeService>) -> Self {
        Self {
            api: CloudflareLoadBalancing::new(config),
            compute,
            resolver: Arc::new(SystemResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn api(&self) -> &CloudflareLoadBalancing {
        &self.api
    }

    /// Hostname of the balancer for `spec` at `location`
    pub fn hostname(&self, location: &Location, spec: &LoadBalancerSpec) -> String {
        format!("{}.{}", pool_name(location, spec), self.api.domain()).to_lowercase()
    }

    /// Whether `lb` resolves to `address`
    async fn answers_on(&self, lb: &LoadBalancer, address: IpAddr) -> bool {
        match self.resolver.resolve(&lb.name).await {
            Ok(ips) => ips.contains(&address),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", lb.name, e);
                false
            }
        }
    }
}

/// Prefix of the description on everything nimbus creates
pub const MANAGED_PREFIX: &str = "nimbus ";

/// Whether `lb` was created by nimbus
pub fn is_managed(lb: &LoadBalancer) -> bool {
    lb.description
        .as_deref()
        .is_some_and(|d| d.starts_with(MANAGED_PREFIX))
}

fn pool_name(location: &Location, spec: &LoadBalancerSpec) -> String {
    format!("{}-{}", spec.name, location.id)
}

/// One origin per matching node, addressed by its primary address
pub fn origins_for(
    nodes: &[NodeMetadata],
    location: &Location,
    provider_ids: &HashSet<String>,
    instance_port: u16,
) -> Vec<Origin> {
    let mut origins: Vec<Origin> = nodes
        .iter()
        .filter(|node| node.location == *location && provider_ids.contains(&node.provider_id))
        .filter_map(|node| {
            node.primary_address().map(|address| Origin {
                name: node.name.clone(),
                address: address.to_string(),
                enabled: true,
                port: Some(instance_port),
            })
        })
        .collect();
    origins.sort_by(|a, b| a.name.cmp(&b.name));
    origins
}

#[async_trait]
impl CloudProvider for CloudflareLbStrategy {
    fn name(&self) -> &str {
        "cloudflare"
    }

    fn display_name(&self) -> &str {
        "Cloudflare"
    }

    async fn check_auth(&self) -> nimbus_cloud::Result<AuthStatus> {
        match self.api.verify_token().await {
            Ok(token) if token.status == "active" => Ok(AuthStatus::ok(format!(
                "token {} ({})",
                token.id,
                self.api.domain()
            ))),
            Ok(token) => Ok(AuthStatus::failed(format!(
                "API token is {}",
                token.status
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl LoadBalanceNodesStrategy for CloudflareLbStrategy {
    async fn create(
        &self,
        location: &Location,
        spec: &LoadBalancerSpec,
        provider_ids: &HashSet<String>,
    ) -> nimbus_cloud::Result<String> {
        let nodes = self.compute.list_nodes().await?;
        let origins = origins_for(&nodes, location, provider_ids, spec.instance_port);
        if origins.is_empty() {
            let mut ids: Vec<String> = provider_ids.iter().cloned().collect();
            ids.sort();
            return Err(CloudflareError::NoOrigins(ids).into());
        }

        let description = format!(
            "{}{} {}->{}",
            MANAGED_PREFIX, spec.protocol, spec.load_balancer_port, spec.instance_port
        );

        tracing::info!(
            "Creating Cloudflare pool {} ({} origin(s))",
            pool_name(location, spec),
            origins.len()
        );
        let pool = self
            .api
            .create_pool(&CreatePoolRequest {
                name: pool_name(location, spec),
                description: description.clone(),
                origins,
            })
            .await?;

        let hostname = self.hostname(location, spec);
        tracing::info!("Creating Cloudflare load balancer {}", hostname);
        let lb = self
            .api
            .create_load_balancer(&CreateLoadBalancerRequest {
                name: hostname,
                description,
                default_pools: vec![pool.id.clone()],
                fallback_pool: pool.id,
                proxied: spec.protocol == Protocol::Http,
            })
            .await?;

        Ok(lb.name)
    }
}

#[async_trait]
impl DestroyLoadBalancerStrategy for CloudflareLbStrategy {
    async fn destroy(&self, address: IpAddr) -> nimbus_cloud::Result<bool> {
        let lbs = self.api.list_load_balancers().await?;

        let mut matches = Vec::new();
        for lb in lbs.iter().filter(|lb| is_managed(lb)) {
            if self.answers_on(lb, address).await {
                matches.push(lb);
            }
        }

        let lb = match matches.as_slice() {
            [] => {
                tracing::debug!("No managed Cloudflare load balancer resolves to {}", address);
                return Ok(false);
            }
            [lb] => *lb,
            many => {
                let names: Vec<&str> = many.iter().map(|lb| lb.name.as_str()).collect();
                return Err(CloudError::InvalidArgument(format!(
                    "{} resolves to more than one Cloudflare load balancer: {}",
                    address,
                    names.join(", ")
                )));
            }
        };

        tracing::info!("Deleting Cloudflare load balancer {}", lb.name);
        self.api.delete_load_balancer(&lb.id).await?;
        for pool_id in lb.pool_ids() {
            tracing::info!("Deleting Cloudflare pool {}", pool_id);
            self.api.delete_pool(&pool_id).await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_cloud::{NodeState, ResolveError};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticCompute(Vec<NodeMetadata>);

    #[async_trait]
    impl CloudProvider for StaticCompute {
        fn name(&self) -> &str {
            "static"
        }

        fn display_name(&self) -> &str {
            "Static"
        }

        async fn check_auth(&self) -> nimbus_cloud::Result<AuthStatus> {
            Ok(AuthStatus::ok("test"))
        }
    }

    #[async_trait]
    impl ComputeService for StaticCompute {
        async fn list_nodes(&self) -> nimbus_cloud::Result<Vec<NodeMetadata>> {
            Ok(self.0.clone())
        }
    }

    /// Resolves each of the listed hosts to the same address
    struct FixedResolver(Vec<&'static str>, IpAddr);

    #[async_trait]
    impl HostResolver for FixedResolver {
        async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            if self.0.contains(&host) {
                Ok(vec![self.1])
            } else {
                Err(ResolveError::UnknownHost(host.to_string()))
            }
        }
    }

    fn nodes() -> Vec<NodeMetadata> {
        vec![
            NodeMetadata::new("tk1a/1", "1", Location::zone("tk1a"), NodeState::Running)
                .with_name("web-01")
                .with_public_address("203.0.113.10".parse().unwrap()),
            NodeMetadata::new("tk1a/2", "2", Location::zone("tk1a"), NodeState::Running)
                .with_name("web-02")
                .with_public_address("203.0.113.11".parse().unwrap()),
            NodeMetadata::new("is1a/1", "1", Location::zone("is1a"), NodeState::Running)
                .with_name("web-03")
                .with_public_address("203.0.113.12".parse().unwrap()),
        ]
    }

    fn spec() -> LoadBalancerSpec {
        LoadBalancerSpec {
            name: "Web".to_string(),
            protocol: Protocol::Http,
            load_balancer_port: 80,
            instance_port: 8080,
        }
    }

    fn strategy(server: &MockServer) -> CloudflareLbStrategy {
        let config = CloudflareConfig::new("token", "acc", "zone", "example.com")
            .with_api_base(server.uri());
        CloudflareLbStrategy::new(config, Arc::new(StaticCompute(nodes())))
    }

    #[test]
    fn test_origins_only_from_location() {
        let ids: HashSet<String> = ["1".to_string()].into_iter().collect();
        let origins = origins_for(&nodes(), &Location::zone("tk1a"), &ids, 8080);

        assert_eq!(
            origins,
            vec![Origin {
                name: "web-01".to_string(),
                address: "203.0.113.10".to_string(),
                enabled: true,
                port: Some(8080),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_builds_pool_then_balancer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/load_balancers/pools"))
            .and(body_partial_json(json!({"name": "Web-tk1a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": {"id": "pool-1", "name": "Web-tk1a", "origins": []}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/zone/load_balancers"))
            .and(body_partial_json(json!({
                "name": "web-tk1a.example.com",
                "default_pools": ["pool-1"],
                "fallback_pool": "pool-1",
                "proxied": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": {"id": "lb-1", "name": "web-tk1a.example.com",
                           "default_pools": ["pool-1"], "fallback_pool": "pool-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids: HashSet<String> = ["1".to_string(), "2".to_string()].into_iter().collect();
        let dns_name = strategy(&server)
            .create(&Location::zone("tk1a"), &spec(), &ids)
            .await
            .unwrap();

        assert_eq!(dns_name, "web-tk1a.example.com");
    }

    #[tokio::test]
    async fn test_create_without_origins_fails_before_api_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let ids: HashSet<String> = ["99".to_string()].into_iter().collect();
        let result = strategy(&server)
            .create(&Location::zone("tk1a"), &spec(), &ids)
            .await;

        assert!(matches!(result, Err(nimbus_cloud::CloudError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_destroy_deletes_matching_balancer_and_pools() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone/load_balancers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [
                    {"id": "lb-0", "name": "api-tk1a.example.com",
                     "description": "nimbus TCP 5432->5432", "default_pools": ["pool-0"]},
                    {"id": "lb-1", "name": "web-tk1a.example.com",
                     "description": "nimbus HTTP 80->8080",
                     "default_pools": ["pool-1"], "fallback_pool": "pool-1"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/zones/zone/load_balancers/lb-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "errors": [], "result": {"id": "lb-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/accounts/acc/load_balancers/pools/pool-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "errors": [], "result": {"id": "pool-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let address: IpAddr = "198.51.100.30".parse().unwrap();
        let strategy = strategy(&server).with_resolver(Arc::new(FixedResolver(
            vec!["web-tk1a.example.com"],
            address,
        )));

        assert!(strategy.destroy(address).await.unwrap());
        assert!(
            !strategy
                .destroy("198.51.100.31".parse().unwrap())
                .await
                .unwrap()
        );
    }

    async fn mount_balancers(server: &MockServer, balancers: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/zones/zone/load_balancers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": balancers
            })))
            .mount(server)
            .await;
    }

    async fn expect_delete(server: &MockServer, route: &str, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "errors": [], "result": {"id": "deleted"}
            })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_destroy_leaves_unmanaged_balancer_alone() {
        let server = MockServer::start().await;
        mount_balancers(
            &server,
            json!([
                {"id": "prod-lb", "name": "shop.example.com",
                 "description": "storefront", "default_pools": ["prod-pool"]},
                {"id": "lb-1", "name": "web-tk1a.example.com",
                 "description": "nimbus HTTP 80->8080", "default_pools": ["pool-1"]}
            ]),
        )
        .await;
        expect_delete(&server, "/zones/zone/load_balancers/prod-lb", 0).await;
        expect_delete(&server, "/accounts/acc/load_balancers/pools/prod-pool", 0).await;
        expect_delete(&server, "/zones/zone/load_balancers/lb-1", 1).await;
        expect_delete(&server, "/accounts/acc/load_balancers/pools/pool-1", 1).await;

        // Cloudflare-proxied hostnames share anycast addresses
        let address: IpAddr = "104.21.0.1".parse().unwrap();
        let strategy = strategy(&server).with_resolver(Arc::new(FixedResolver(
            vec!["shop.example.com", "web-tk1a.example.com"],
            address,
        )));

        assert!(strategy.destroy(address).await.unwrap());
    }

    #[tokio::test]
    async fn test_destroy_without_managed_match_deletes_nothing() {
        let server = MockServer::start().await;
        mount_balancers(
            &server,
            json!([
                {"id": "prod-lb", "name": "shop.example.com", "default_pools": ["prod-pool"]}
            ]),
        )
        .await;
        expect_delete(&server, "/zones/zone/load_balancers/prod-lb", 0).await;

        let address: IpAddr = "104.21.0.1".parse().unwrap();
        let strategy = strategy(&server)
            .with_resolver(Arc::new(FixedResolver(vec!["shop.example.com"], address)));

        assert!(!strategy.destroy(address).await.unwrap());
    }

    #[tokio::test]
    async fn test_destroy_refuses_ambiguous_address() {
        let server = MockServer::start().await;
        mount_balancers(
            &server,
            json!([
                {"id": "lb-1", "name": "web-tk1a.example.com",
                 "description": "nimbus HTTP 80->8080", "default_pools": ["pool-1"]},
                {"id": "lb-2", "name": "api-tk1a.example.com",
                 "description": "nimbus HTTP 80->3000", "default_pools": ["pool-2"]}
            ]),
        )
        .await;
        expect_delete(&server, "/zones/zone/load_balancers/lb-1", 0).await;
        expect_delete(&server, "/zones/zone/load_balancers/lb-2", 0).await;

        let address: IpAddr = "104.21.0.1".parse().unwrap();
        let strategy = strategy(&server).with_resolver(Arc::new(FixedResolver(
            vec!["web-tk1a.example.com", "api-tk1a.example.com"],
            address,
        )));

        let result = strategy.destroy(address).await;
        assert!(matches!(
            result,
            Err(CloudError::InvalidArgument(msg)) if msg.contains("api-tk1a.example.com")
        ));
    }
}
