//! nimbus 設定モデル

use serde::{Deserialize, Serialize};

/// nimbus.kdl 全体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NimbusConfig {
    /// ノード一覧の取得元
    pub compute: ComputeConfig,

    /// ロードバランサーの作成・削除を担当するプロバイダー
    pub load_balancer: LoadBalancerConfig,

    /// DNS 解決のリトライ設定
    pub resolver: ResolverConfig,
}

/// compute プロバイダー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum ComputeConfig {
    Sakura { zones: Vec<String> },
}

/// load-balancer プロバイダー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum LoadBalancerConfig {
    Sakura {
        plan: u32,
    },
    Cloudflare {
        account_id: String,
        zone_id: String,
        domain: String,
        /// API トークンを読む環境変数名
        api_token_env: String,
        api_base: Option<String>,
    },
}

impl LoadBalancerConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            LoadBalancerConfig::Sakura { .. } => "sakura-cloud",
            LoadBalancerConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 1000,
        }
    }
}
