//! 設定からプロバイダーとロードバランサーサービスを組み立てる

use anyhow::Context;
use nimbus_cloud::{
    BaseLoadBalancerService, CloudProvider, ComputeService, DestroyLoadBalancerStrategy,
    LoadBalanceNodesStrategy, RetryConfig,
};
use nimbus_cloud_cloudflare::{CloudflareConfig, CloudflareLbStrategy};
use nimbus_cloud_sakura::{ProxyLbStrategy, SakuraCloudProvider};
use nimbus_config::{ComputeConfig, LoadBalancerConfig, NimbusConfig, ResolverConfig};
use std::sync::Arc;
use std::time::Duration;

pub struct Providers {
    pub compute: Arc<dyn ComputeService>,

    /// compute と別に認証が必要なロードバランサープロバイダー
    pub load_balancer_auth: Option<Arc<dyn CloudProvider>>,

    /// state に記録するプロバイダー名
    pub load_balancer_provider: &'static str,

    pub service: BaseLoadBalancerService,
}

pub fn retry_config(resolver: &ResolverConfig) -> RetryConfig {
    RetryConfig::fixed(resolver.attempts, Duration::from_millis(resolver.delay_ms))
}

pub fn build(config: &NimbusConfig) -> anyhow::Result<Providers> {
    let compute: Arc<dyn ComputeService> = match &config.compute {
        ComputeConfig::Sakura { zones } => Arc::new(SakuraCloudProvider::new(zones.iter())),
    };

    let (create, destroy, load_balancer_auth): (
        Arc<dyn LoadBalanceNodesStrategy>,
        Arc<dyn DestroyLoadBalancerStrategy>,
        Option<Arc<dyn CloudProvider>>,
    ) = match &config.load_balancer {
        LoadBalancerConfig::Sakura { plan } => {
            let strategy = Arc::new(ProxyLbStrategy::new(*plan));
            (strategy.clone(), strategy, None)
        }
        LoadBalancerConfig::Cloudflare {
            account_id,
            zone_id,
            domain,
            api_token_env,
            api_base,
        } => {
            let api_token = std::env::var(api_token_env).with_context(|| {
                format!("環境変数 {} に Cloudflare API トークンを設定してください", api_token_env)
            })?;
            let mut cf_config = CloudflareConfig::new(api_token, account_id, zone_id, domain);
            if let Some(api_base) = api_base {
                cf_config = cf_config.with_api_base(api_base);
            }
            let strategy = Arc::new(CloudflareLbStrategy::new(cf_config, compute.clone()));
            (strategy.clone(), strategy.clone(), Some(strategy))
        }
    };

    tracing::debug!(
        "compute={} load-balancer={}",
        compute.name(),
        config.load_balancer.provider_name()
    );

    let service = BaseLoadBalancerService::new(compute.clone(), create, destroy)
        .with_retry(retry_config(&config.resolver));

    Ok(Providers {
        compute,
        load_balancer_auth,
        load_balancer_provider: config.load_balancer.provider_name(),
        service,
    })
}
