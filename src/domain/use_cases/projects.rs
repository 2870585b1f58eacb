use std::sync::Arc;

use crate::{
    entities::{
        form_fields::FormFields,
        image::{ImageFolder, IncomingFile},
        pagination::{Page, PageRequest},
        project::{NewProject, Project, ProjectChanges},
    },
    errors::AppError,
    repositories::project::ProjectRepository,
    use_cases::{
        image_lifecycle::{DeletedResponse, ImageLifecycle},
        upload_intake::UploadIntake,
    },
    utils::valid_uuid::valid_uuid,
};

const RESOURCE: &str = "Project";

pub struct ProjectHandler {
    pub project_repo: Arc<dyn ProjectRepository>,
    pub images: ImageLifecycle,
    pub intake: UploadIntake,
    pub folder: ImageFolder,
}

impl ProjectHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        images: ImageLifecycle,
        intake: UploadIntake,
        folder: ImageFolder,
    ) -> Self {
        ProjectHandler { project_repo, images, intake, folder }
    }

    /// Creates a project; absent technologies and links default to empty
    pub async fn create_project(&self, fields: FormFields, file: Option<IncomingFile>) -> Result<Project, AppError> {
        let new_project = NewProject::from_fields(fields)?;
        let upload = self.intake.accept(file)?;

        let image_url = match upload {
            Some(file) => Some(self.images.create_image(file, &self.folder).await?),
            None => None,
        };

        let project = self.project_repo.create_project(&new_project.into_record(image_url)).await?;
        tracing::info!(project_id = %project.id, has_image = project.image_url.is_some(), "Project created");
        Ok(project)
    }

    pub async fn list_projects(&self, request: PageRequest) -> Result<Page<Project>, AppError> {
        let items = self.project_repo.list_projects(request.limit as i64, request.offset()).await?;
        let total = self.project_repo.count_projects().await?;

        Ok(Page::new(items, total, request))
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, AppError> {
        let id = valid_uuid(id, RESOURCE)?;

        self.project_repo
            .get_project_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{RESOURCE} not found")))
    }

    pub async fn update_project(
        &self,
        id: &str,
        fields: FormFields,
        file: Option<IncomingFile>,
    ) -> Result<Project, AppError> {
        let existing = self.get_project(id).await?;
        let changes = ProjectChanges::from_fields(fields)?;
        let upload = self.intake.accept(file)?;

        let replaced = self
            .images
            .replace_image(existing.image_url.as_deref(), upload, &self.folder)
            .await?;

        let record = changes.merge_over(&existing, replaced.url);
        let project = self
            .project_repo
            .update_project(&existing.id, &record)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{RESOURCE} not found")))?;

        tracing::info!(
            project_id = %project.id,
            previous_image = ?replaced.previous.status(),
            "Project updated"
        );
        Ok(project)
    }

    pub async fn delete_project(&self, id: &str) -> Result<DeletedResponse, AppError> {
        let existing = self.get_project(id).await?;

        let cleanup = self.images.delete_image(existing.image_url.as_deref(), &self.folder).await;

        if !self.project_repo.delete_project(&existing.id).await? {
            return Err(AppError::NotFound(format!("{RESOURCE} not found")));
        }

        tracing::info!(project_id = %existing.id, image_cleanup = ?cleanup.status(), "Project deleted");
        Ok(DeletedResponse::new("Project deleted successfully", &cleanup))
    }
}
