//! Sakura Cloud provider for nimbus
//!
//! This crate implements [`ComputeService`](nimbus_cloud::ComputeService) and
//! both load balancer strategies for Sakura Cloud.
//!
//! # Features
//!
//! - Node listing across zones (servers tagged `group=<name>` form groups)
//! - Enhanced Load Balancer creation per zone
//! - Enhanced Load Balancer teardown by address
//!
//! # Requirements
//!
//! - `usacloud` CLI must be installed and configured
//! - Authentication is managed through usacloud configuration
//!
//! # Example
//!
//! ```ignore
//! use nimbus_cloud::{BaseLoadBalancerService, LoadBalancerService, predicates};
//! use nimbus_cloud_sakura::{ProxyLbStrategy, SakuraCloudProvider};
//! use std::sync::Arc;
//!
//! let compute = Arc::new(SakuraCloudProvider::new(["tk1a", "is1b"]));
//! let strategy = Arc::new(ProxyLbStrategy::default());
//! let service = BaseLoadBalancerService::new(compute, strategy.clone(), strategy);
//!
//! let addresses = service
//!     .load_balance_nodes_matching(&predicates::in_group("web"), "web", "http", 80, 8080)
//!     .await?;
//! ```

pub mod error;
pub mod provider;
pub mod proxylb;
pub mod usacloud;

pub use error::{Result, SakuraError};
pub use provider::{SakuraCloudProvider, node_from_server};
pub use proxylb::{ProxyLbStrategy, region_for_zone};
pub use usacloud::{ProxyLbInfo, ProxyLbParameters, ServerInfo, Usacloud};
