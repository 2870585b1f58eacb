pub mod auth;
pub mod home;
pub mod multipart;
pub mod posts;
pub mod projects;
