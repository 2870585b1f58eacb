pub mod auth;
pub mod db;
pub mod media;
pub mod utils;
