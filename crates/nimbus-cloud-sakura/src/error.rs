//! Sakura Cloud provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SakuraError {
    #[error("usacloud not found. Please install: brew install usacloud")]
    UsacloudNotFound,

    #[error("usacloud authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("usacloud command failed: {0}")]
    CommandFailed(String),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Server {0} has no IP address")]
    ServerWithoutAddress(String),

    #[error("Enhanced load balancer {0} returned no FQDN")]
    MissingFqdn(String),

    #[error("Resource creation failed: {0}")]
    CreationFailed(String),

    #[error("Resource deletion failed: {0}")]
    DeletionFailed(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<SakuraError> for nimbus_cloud::CloudError {
    fn from(e: SakuraError) -> Self {
        match e {
            SakuraError::AuthenticationFailed(msg) => {
                nimbus_cloud::CloudError::AuthenticationFailed(msg)
            }
            SakuraError::ServerNotFound(id) => nimbus_cloud::CloudError::ResourceNotFound(id),
            other @ (SakuraError::UsacloudNotFound | SakuraError::CommandFailed(_)) => {
                nimbus_cloud::CloudError::CommandFailed(other.to_string())
            }
            other => nimbus_cloud::CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SakuraError>;
