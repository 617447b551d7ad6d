//! Cloud provider error types

use crate::load_balancer::LoadBalancerReport;
use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A strategy failed part way; `created` holds the locations done before it
    #[error("Load balancer creation stopped at {location}: {source}")]
    CreateAborted {
        location: String,
        created: Box<LoadBalancerReport>,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
