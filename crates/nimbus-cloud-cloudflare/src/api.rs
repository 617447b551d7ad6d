//! Cloudflare Load Balancing API client
//!
//! Direct Cloudflare v4 API implementation for pools and load balancers.
//! Uses Bearer token authentication.

use crate::error::{CloudflareError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Configuration for the Cloudflare client
#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub api_token: String,
    pub account_id: String,
    pub zone_id: String,
    /// Domain load balancer hostnames are created under
    pub domain: String,
    pub api_base: String,
}

impl CloudflareConfig {
    pub fn new(
        api_token: impl Into<String>,
        account_id: impl Into<String>,
        zone_id: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            account_id: account_id.into(),
            zone_id: zone_id.into(),
            domain: domain.into(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Create CloudflareConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| CloudflareError::MissingEnvVar(name.to_string()))
        };

        Ok(Self::new(
            var("CLOUDFLARE_API_TOKEN")?,
            var("CLOUDFLARE_ACCOUNT_ID")?,
            var("CLOUDFLARE_ZONE_ID")?,
            var("CLOUDFLARE_DOMAIN")?,
        ))
    }
}

/// Cloudflare Load Balancing client
pub struct CloudflareLoadBalancing {
    client: reqwest::Client,
    config: CloudflareConfig,
}

impl CloudflareLoadBalancing {
    pub fn new(config: CloudflareConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Get the domain
    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    fn pools_url(&self) -> String {
        format!(
            "{}/accounts/{}/load_balancers/pools",
            self.config.api_base, self.config.account_id
        )
    }

    fn load_balancers_url(&self) -> String {
        format!(
            "{}/zones/{}/load_balancers",
            self.config.api_base, self.config.zone_id
        )
    }

    /// Unwrap the v4 response envelope
    async fn unwrap_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let api_response: ApiResponse<T> = response.json().await?;

        if !api_response.success {
            let error_msg = api_response
                .errors
                .first()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(CloudflareError::ApiError(error_msg));
        }

        api_response
            .result
            .ok_or_else(|| CloudflareError::ApiError("Response has no result".to_string()))
    }

    /// Verify the API token
    pub async fn verify_token(&self) -> Result<TokenStatus> {
        let url = format!("{}/user/tokens/verify", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    /// Create an origin pool
    pub async fn create_pool(&self, request: &CreatePoolRequest) -> Result<Pool> {
        let response = self
            .client
            .post(self.pools_url())
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    /// Delete an origin pool
    pub async fn delete_pool(&self, pool_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.pools_url(), pool_id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        let _: DeleteResult = Self::unwrap_response(response).await?;
        Ok(())
    }

    /// Create a load balancer in the zone
    pub async fn create_load_balancer(
        &self,
        request: &CreateLoadBalancerRequest,
    ) -> Result<LoadBalancer> {
        let response = self
            .client
            .post(self.load_balancers_url())
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    /// List load balancers in the zone
    pub async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        let response = self
            .client
            .get(self.load_balancers_url())
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    /// Delete a load balancer
    pub async fn delete_load_balancer(&self, load_balancer_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.load_balancers_url(), load_balancer_id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        let _: DeleteResult = Self::unwrap_response(response).await?;
        Ok(())
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResult {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenStatus {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
    pub address: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePoolRequest {
    pub name: String,
    pub description: String,
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateLoadBalancerRequest {
    /// DNS name of the load balancer
    pub name: String,
    pub description: String,
    pub default_pools: Vec<String>,
    pub fallback_pool: String,
    pub proxied: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_pools: Vec<String>,
    #[serde(default)]
    pub fallback_pool: Option<String>,
    #[serde(default)]
    pub proxied: bool,
}

impl LoadBalancer {
    /// Every pool the balancer references
    pub fn pool_ids(&self) -> Vec<String> {
        let mut ids = self.default_pools.clone();
        if let Some(fallback) = &self.fallback_pool {
            if !ids.contains(fallback) {
                ids.push(fallback.clone());
            }
        }
        ids
    }
}
