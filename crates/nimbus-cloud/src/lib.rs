//! nimbus cloud abstractions
//!
//! This crate holds the provider-neutral half of nimbus: the compute node
//! model, the [`ComputeService`] directory trait, and the load balancer
//! orchestration that sits on top of per-provider strategies.
//!
//! # Supported Providers
//!
//! - **Sakura Cloud**: nodes and Enhanced Load Balancers (via usacloud CLI)
//! - **Cloudflare**: Load Balancing pools and balancers (via the v4 API)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   nimbus CLI                     │
//! │             (nimbus lb create/destroy)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 nimbus-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        BaseLoadBalancerService            │   │
//! │  │  trait LoadBalanceNodesStrategy { ... }   │   │
//! │  │  trait DestroyLoadBalancerStrategy { .. } │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ DNS resolver │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ sakura-cloud  │ │  cloudflare   │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod compute;
pub mod error;
pub mod load_balancer;
pub mod node;
pub mod predicates;
pub mod provider;
pub mod resolver;
pub mod state;

// Re-exports
pub use compute::ComputeService;
pub use error::{CloudError, Result};
pub use load_balancer::{
    BaseLoadBalancerService, DestroyLoadBalancerStrategy, LoadBalanceNodesStrategy,
    LoadBalancerReport, LoadBalancerService, LoadBalancerSpec, LocationOutcome, Protocol,
};
pub use node::{Location, LocationMap, LocationScope, NodeMetadata, NodeState};
pub use predicates::NodeFilter;
pub use provider::{AuthStatus, CloudProvider, RetryConfig};
pub use resolver::{HostResolver, ResolveError, SystemResolver, resolve_with_retry};
pub use state::{GlobalState, LoadBalancerRecord, StateLock, StateManager};
