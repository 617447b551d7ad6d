//! Cloudflare provider for nimbus
//!
//! This crate implements both load balancer strategies on top of Cloudflare
//! Load Balancing, for nodes coming from any
//! [`ComputeService`](nimbus_cloud::ComputeService).
//!
//! # Requirements
//!
//! - An API token with Load Balancing edit permission
//! - `CLOUDFLARE_API_TOKEN`, `CLOUDFLARE_ACCOUNT_ID`, `CLOUDFLARE_ZONE_ID`,
//!   `CLOUDFLARE_DOMAIN` env vars (or the equivalent config file entries)
//!
//! # Example
//!
//! ```ignore
//! use nimbus_cloud::{BaseLoadBalancerService, predicates};
//! use nimbus_cloud_cloudflare::{CloudflareConfig, CloudflareLbStrategy};
//! use nimbus_cloud_sakura::SakuraCloudProvider;
//! use std::sync::Arc;
//!
//! let compute = Arc::new(SakuraCloudProvider::new(["tk1a"]));
//! let strategy = Arc::new(CloudflareLbStrategy::new(CloudflareConfig::from_env()?, compute.clone()));
//! let service = BaseLoadBalancerService::new(compute, strategy.clone(), strategy);
//! ```

pub mod api;
pub mod error;
pub mod strategy;

pub use api::{CloudflareConfig, CloudflareLoadBalancing};
pub use error::{CloudflareError, Result};
pub use strategy::CloudflareLbStrategy;
