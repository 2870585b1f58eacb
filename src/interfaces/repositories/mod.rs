pub mod media_store;
pub mod post;
pub mod project;
pub mod sqlx_repo;
pub mod token;
pub mod user;
