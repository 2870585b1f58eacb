use std::sync::Arc;

use serde::Serialize;

use crate::{
    entities::image::{ImageFolder, RemoteImageRef, UploadedFile},
    errors::AppError,
    repositories::media_store::MediaStore,
    settings::ReplaceOrder,
};

/// Result of a best-effort remote delete. Never an error: the record
/// operation that triggered it has already been decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No stored URL, nothing to delete.
    Skipped,
    Deleted(RemoteImageRef),
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupStatus {
    Skipped,
    Deleted,
    Failed,
}

impl DeleteOutcome {
    pub fn status(&self) -> CleanupStatus {
        match self {
            DeleteOutcome::Skipped => CleanupStatus::Skipped,
            DeleteOutcome::Deleted(_) => CleanupStatus::Deleted,
            DeleteOutcome::Failed { .. } => CleanupStatus::Failed,
        }
    }
}

/// Body returned after a record is deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub message: String,
    pub image_cleanup: CleanupStatus,
}

impl DeletedResponse {
    pub fn new(message: impl Into<String>, outcome: &DeleteOutcome) -> Self {
        DeletedResponse {
            message: message.into(),
            image_cleanup: outcome.status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// URL to persist on the record.
    pub url: Option<String>,
    /// What happened to the image the record pointed at before.
    pub previous: DeleteOutcome,
}

/// Owns every conversation with the remote media store.
#[derive(Clone)]
pub struct ImageLifecycle {
    store: Arc<dyn MediaStore>,
    replace_order: ReplaceOrder,
}

impl ImageLifecycle {
    pub fn new(store: Arc<dyn MediaStore>, replace_order: ReplaceOrder) -> Self {
        ImageLifecycle { store, replace_order }
    }

    /// Uploads under a freshly generated public id and returns the secure URL.
    pub async fn create_image(&self, file: UploadedFile, folder: &ImageFolder) -> Result<String, AppError> {
        let target = RemoteImageRef::generate(folder);
        let size = file.size();

        match self.store.upload(&target, file).await {
            Ok(url) => {
                tracing::info!(public_id = %target.full_id(), size, "Image uploaded");
                Ok(url)
            }
            Err(e) => {
                tracing::error!(public_id = %target.full_id(), error = %e, "Image upload failed");
                Err(AppError::UploadFailed(e.to_string()))
            }
        }
    }

    /// With no new file the old URL is kept and the store is not contacted.
    pub async fn replace_image(
        &self,
        old_url: Option<&str>,
        new_file: Option<UploadedFile>,
        folder: &ImageFolder,
    ) -> Result<ReplaceOutcome, AppError> {
        let Some(file) = new_file else {
            return Ok(ReplaceOutcome {
                url: old_url.map(str::to_string),
                previous: DeleteOutcome::Skipped,
            });
        };

        match self.replace_order {
            ReplaceOrder::DeleteFirst => {
                let previous = self.delete_image(old_url, folder).await;
                let url = self.create_image(file, folder).await?;
                Ok(ReplaceOutcome { url: Some(url), previous })
            }
            ReplaceOrder::UploadFirst => {
                let url = self.create_image(file, folder).await?;
                let previous = self.delete_image(old_url, folder).await;
                Ok(ReplaceOutcome { url: Some(url), previous })
            }
        }
    }

    /// Failures are logged and reported, never propagated.
    pub async fn delete_image(&self, url: Option<&str>, folder: &ImageFolder) -> DeleteOutcome {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            return DeleteOutcome::Skipped;
        };

        let Some(target) = RemoteImageRef::from_url(url, folder) else {
            tracing::warn!(url, "Could not derive a public id from the stored image URL");
            return DeleteOutcome::Failed {
                reason: format!("no public id in {url}"),
            };
        };

        match self.store.destroy(&target).await {
            Ok(()) => {
                tracing::info!(public_id = %target.full_id(), "Remote image deleted");
                DeleteOutcome::Deleted(target)
            }
            Err(e) => {
                tracing::warn!(public_id = %target.full_id(), error = %e, "Remote image delete failed");
                DeleteOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}
