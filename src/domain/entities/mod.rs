pub mod form_fields;
pub mod image;
pub mod pagination;
pub mod post;
pub mod project;
pub mod token;
pub mod user;
