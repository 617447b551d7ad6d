//! Cloudflare provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudflareError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error("Cloudflare API error: {0}")]
    ApiError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No origin address for nodes {0:?}")]
    NoOrigins(Vec<String>),
}

impl From<CloudflareError> for nimbus_cloud::CloudError {
    fn from(e: CloudflareError) -> Self {
        match e {
            other @ CloudflareError::MissingEnvVar(_) => {
                nimbus_cloud::CloudError::InvalidConfig(other.to_string())
            }
            other => nimbus_cloud::CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudflareError>;
