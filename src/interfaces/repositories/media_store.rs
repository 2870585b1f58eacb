use async_trait::async_trait;
use derive_more::Display;

use crate::entities::image::{RemoteImageRef, UploadedFile};

#[derive(Debug, Display)]
pub enum MediaError {
    #[display("Transport error: {_0}")]
    Transport(String),

    #[display("Remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[display("Remote object not found: {_0}")]
    NotFound(String),

    #[display("Unexpected response from remote store: {_0}")]
    InvalidResponse(String),
}

/// Remote object storage for entity images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `file` as `target` and returns its public HTTPS URL.
    async fn upload(&self, target: &RemoteImageRef, file: UploadedFile) -> Result<String, MediaError>;

    /// Removes the object addressed by `target`.
    async fn destroy(&self, target: &RemoteImageRef) -> Result<(), MediaError>;
}
