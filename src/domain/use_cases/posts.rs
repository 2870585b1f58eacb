use std::sync::Arc;

use crate::{
    entities::{
        form_fields::FormFields,
        image::{ImageFolder, IncomingFile},
        pagination::{Page, PageRequest},
        post::{NewPost, Post, PostChanges},
    },
    errors::AppError,
    repositories::post::PostRepository,
    use_cases::{
        image_lifecycle::{DeletedResponse, ImageLifecycle},
        upload_intake::UploadIntake,
    },
    utils::valid_uuid::valid_uuid,
};

const RESOURCE: &str = "Post";

pub struct PostHandler {
    pub post_repo: Arc<dyn PostRepository>,
    pub images: ImageLifecycle,
    pub intake: UploadIntake,
    pub folder: ImageFolder,
}

impl PostHandler {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        images: ImageLifecycle,
        intake: UploadIntake,
        folder: ImageFolder,
    ) -> Self {
        PostHandler { post_repo, images, intake, folder }
    }

    /// Creates a post, uploading its image first when one was supplied
    pub async fn create_post(&self, fields: FormFields, file: Option<IncomingFile>) -> Result<Post, AppError> {
        let new_post = NewPost::from_fields(fields)?;
        let upload = self.intake.accept(file)?;

        let image_url = match upload {
            Some(file) => Some(self.images.create_image(file, &self.folder).await?),
            None => None,
        };

        let post = self.post_repo.create_post(&new_post.into_insert(image_url)).await?;
        tracing::info!(post_id = %post.id, has_image = post.image_url.is_some(), "Post created");
        Ok(post)
    }

    /// Newest first
    pub async fn list_posts(&self, request: PageRequest) -> Result<Page<Post>, AppError> {
        let items = self.post_repo.list_posts(request.limit as i64, request.offset()).await?;
        let total = self.post_repo.count_posts().await?;

        Ok(Page::new(items, total, request))
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, AppError> {
        let id = valid_uuid(id, RESOURCE)?;

        self.post_repo
            .get_post_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{RESOURCE} not found")))
    }

    /// Merges the supplied fields over the stored post. A new image replaces
    /// the stored one; without one the stored URL is kept.
    pub async fn update_post(
        &self,
        id: &str,
        fields: FormFields,
        file: Option<IncomingFile>,
    ) -> Result<Post, AppError> {
        let existing = self.get_post(id).await?;
        let changes = PostChanges::from_fields(fields)?;
        let upload = self.intake.accept(file)?;

        let replaced = self
            .images
            .replace_image(existing.image_url.as_deref(), upload, &self.folder)
            .await?;

        let update = changes.merge_over(&existing, replaced.url);
        let post = self
            .post_repo
            .update_post(&existing.id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{RESOURCE} not found")))?;

        tracing::info!(
            post_id = %post.id,
            previous_image = ?replaced.previous.status(),
            "Post updated"
        );
        Ok(post)
    }

    /// Deletes the record; the remote image is removed on a best-effort basis.
    pub async fn delete_post(&self, id: &str) -> Result<DeletedResponse, AppError> {
        let existing = self.get_post(id).await?;

        let cleanup = self.images.delete_image(existing.image_url.as_deref(), &self.folder).await;

        if !self.post_repo.delete_post(&existing.id).await? {
            return Err(AppError::NotFound(format!("{RESOURCE} not found")));
        }

        tracing::info!(post_id = %existing.id, image_cleanup = ?cleanup.status(), "Post deleted");
        Ok(DeletedResponse::new("Post deleted successfully", &cleanup))
    }
}
