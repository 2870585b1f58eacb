use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, media, utils};

use auth::jwt::JwtService;
use media::cloudinary::CloudinaryClient;
use repositories::{
    media_store::{MediaError, MediaStore},
    post::PostRepository,
    project::ProjectRepository,
    sqlx_repo::{SqlxPostRepo, SqlxProjectRepo, SqlxUserRepo},
    user::UserRepository,
};
use settings::{AppConfig, CloudinaryCredentials, MediaSettings};
use use_cases::{
    auth::AuthHandler,
    image_lifecycle::ImageLifecycle,
    posts::PostHandler,
    projects::ProjectHandler,
    upload_intake::UploadIntake,
};

pub struct AppState {
    pub auth_handler: AuthHandler,
    pub post_handler: PostHandler,
    pub project_handler: ProjectHandler,
    pub upload_intake: UploadIntake,
}

/// External systems the handlers talk to.
pub struct Collaborators {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: sqlx::PgPool) -> Result<Self, MediaError> {
        let media = CloudinaryClient::new(CloudinaryCredentials::from(config))?;

        Ok(AppState::with_collaborators(config, Collaborators {
            users: Arc::new(SqlxUserRepo::new(pool.clone())),
            posts: Arc::new(SqlxPostRepo::new(pool.clone())),
            projects: Arc::new(SqlxProjectRepo::new(pool)),
            media: Arc::new(media),
        }))
    }

    pub fn with_collaborators(config: &AppConfig, collaborators: Collaborators) -> Self {
        let media_settings = MediaSettings::from(config);
        let intake = UploadIntake::from(&media_settings);
        let images = ImageLifecycle::new(collaborators.media, media_settings.replace_order);

        AppState {
            auth_handler: AuthHandler::new(collaborators.users, Arc::new(JwtService::new(config))),
            post_handler: PostHandler::new(
                collaborators.posts,
                images.clone(),
                intake,
                media_settings.post_folder,
            ),
            project_handler: ProjectHandler::new(
                collaborators.projects,
                images,
                intake,
                media_settings.project_folder,
            ),
            upload_intake: intake,
        }
    }
}
