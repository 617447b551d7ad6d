//! nimbus.kdl パーサー
//!
//! ```kdl
//! compute "sakura" {
//!     zone "tk1a"
//!     zone "is1b"
//! }
//!
//! load-balancer "cloudflare" {
//!     account-id "0123456789abcdef"
//!     zone-id "fedcba9876543210"
//!     domain "example.com"
//! }
//!
//! resolver {
//!     attempts 3
//!     delay-ms 1000
//! }
//! ```

use crate::error::{ConfigError, Result};
use crate::model::{ComputeConfig, LoadBalancerConfig, NimbusConfig, ResolverConfig};
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// Sakura Cloud エンハンスドロードバランサーの既定プラン
pub const DEFAULT_PROXY_LB_PLAN: u32 = 100;

/// Cloudflare API トークンの既定の環境変数名
pub const DEFAULT_API_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// KDLファイルを NimbusConfig にパース
pub fn parse_config_file(path: &Path) -> Result<NimbusConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loading config from {}", path.display());
    parse_config(&content)
}

/// KDL文字列を NimbusConfig にパース
pub fn parse_config(content: &str) -> Result<NimbusConfig> {
    let doc: KdlDocument = content.parse()?;

    let mut compute = None;
    let mut load_balancer = None;
    let mut resolver = ResolverConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "compute" => compute = Some(parse_compute(node)?),
            "load-balancer" => load_balancer = Some(parse_load_balancer(node)?),
            "resolver" => resolver = parse_resolver(node)?,
            _ => {
                // 不明なノードはスキップ
            }
        }
    }

    let compute = compute
        .ok_or_else(|| ConfigError::InvalidConfig("compute ノードが必要です".to_string()))?;

    // load-balancer 省略時は compute と同じプロバイダーを使う
    let load_balancer = match load_balancer {
        Some(lb) => lb,
        None => match &compute {
            ComputeConfig::Sakura { .. } => LoadBalancerConfig::Sakura {
                plan: DEFAULT_PROXY_LB_PLAN,
            },
        },
    };

    Ok(NimbusConfig {
        compute,
        load_balancer,
        resolver,
    })
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

fn first_integer(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}

fn provider_name(node: &KdlNode, kind: &str) -> Result<String> {
    first_string(node)
        .map(|s| s.to_string())
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{} にはプロバイダー名が必要です", kind)))
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn required_string(node: &KdlNode, key: &str) -> Result<String> {
    optional_string(node, key)
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{} が必要です", key)))
}

fn optional_string(node: &KdlNode, key: &str) -> Option<String> {
    children(node)
        .find(|child| child.name().value() == key)
        .and_then(first_string)
        .map(|s| s.to_string())
}

fn integer_in_range<T: TryFrom<i128>>(child: &KdlNode) -> Result<T> {
    let name = child.name().value();
    let value = first_integer(child)
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{} には整数が必要です", name)))?;
    T::try_from(value)
        .map_err(|_| ConfigError::InvalidConfig(format!("{} の値が範囲外です: {}", name, value)))
}

/// compute ノードをパース
fn parse_compute(node: &KdlNode) -> Result<ComputeConfig> {
    let provider = provider_name(node, "compute")?;
    match provider.as_str() {
        "sakura" => {
            let zones: Vec<String> = children(node)
                .filter(|child| child.name().value() == "zone")
                .filter_map(first_string)
                .map(|s| s.to_string())
                .collect();
            if zones.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "compute \"sakura\" には zone が1つ以上必要です".to_string(),
                ));
            }
            Ok(ComputeConfig::Sakura { zones })
        }
        _ => Err(ConfigError::UnknownProvider {
            kind: "compute",
            name: provider,
        }),
    }
}

/// load-balancer ノードをパース
fn parse_load_balancer(node: &KdlNode) -> Result<LoadBalancerConfig> {
    let provider = provider_name(node, "load-balancer")?;
    match provider.as_str() {
        "sakura" => {
            let plan = match children(node).find(|child| child.name().value() == "plan") {
                Some(child) => integer_in_range(child)?,
                None => DEFAULT_PROXY_LB_PLAN,
            };
            Ok(LoadBalancerConfig::Sakura { plan })
        }
        "cloudflare" => Ok(LoadBalancerConfig::Cloudflare {
            account_id: required_string(node, "account-id")?,
            zone_id: required_string(node, "zone-id")?,
            domain: required_string(node, "domain")?,
            api_token_env: optional_string(node, "api-token-env")
                .unwrap_or_else(|| DEFAULT_API_TOKEN_ENV.to_string()),
            api_base: optional_string(node, "api-base"),
        }),
        _ => Err(ConfigError::UnknownProvider {
            kind: "load-balancer",
            name: provider,
        }),
    }
}

/// resolver ノードをパース
fn parse_resolver(node: &KdlNode) -> Result<ResolverConfig> {
    let mut resolver = ResolverConfig::default();

    for child in children(node) {
        match child.name().value() {
            "attempts" => resolver.attempts = integer_in_range(child)?,
            "delay-ms" => resolver.delay_ms = integer_in_range(child)?,
            _ => {}
        }
    }

    if resolver.attempts == 0 {
        return Err(ConfigError::InvalidConfig(
            "resolver の attempts は1以上にしてください".to_string(),
        ));
    }

    Ok(resolver)
}
