//! DNS resolution for load balancer names
//!
//! Providers hand back a DNS name for every load balancer they create. The
//! name is often not resolvable for a few seconds, so resolution goes through
//! [`resolve_with_retry`].

use crate::provider::RetryConfig;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a [`HostResolver`]
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    #[error("Lookup of {host} failed: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a host name into network addresses
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|source| ResolveError::Lookup {
                host: host.to_string(),
                source,
            })?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }

        if ips.is_empty() {
            return Err(ResolveError::UnknownHost(host.to_string()));
        }
        Ok(ips)
    }
}

/// Default retry policy for freshly created load balancer names:
/// three attempts, one second apart
pub fn dns_retry() -> RetryConfig {
    RetryConfig::fixed(3, Duration::from_secs(1))
}

/// Resolve `host`, retrying failed lookups according to `retry`
///
/// Returns `None` once every attempt has failed; the failure itself is only
/// logged.
pub async fn resolve_with_retry(
    resolver: &dyn HostResolver,
    host: &str,
    retry: &RetryConfig,
) -> Option<Vec<IpAddr>> {
    let attempts = retry.max_attempts.max(1);
    for attempt in 1..=attempts {
        match resolver.resolve(host).await {
            Ok(ips) if !ips.is_empty() => {
                tracing::debug!("Resolved {} to {:?} (attempt {})", host, ips, attempt);
                return Some(ips);
            }
            Ok(_) => {
                tracing::debug!("{} resolved to no addresses (attempt {})", host, attempt);
            }
            Err(e) => {
                tracing::debug!("Resolving {} failed (attempt {}): {}", host, attempt, e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(retry.delay_after(attempt)).await;
        }
    }
    None
}
