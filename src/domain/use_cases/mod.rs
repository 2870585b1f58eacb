pub mod auth;
pub mod extractors;
pub mod image_lifecycle;
pub mod posts;
pub mod projects;
pub mod upload_intake;
