use actix_web::web;

use crate::handlers::home::home;

mod auth;
mod json_error;
mod posts;
mod projects;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api")
            .configure(auth::config_routes)
            .configure(posts::config_routes)
            .configure(projects::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
