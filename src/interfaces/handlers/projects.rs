use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::pagination::PageRequest,
    errors::AppError,
    handlers::multipart::read_entity_form,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(admin, state, payload), fields(admin = %admin.username()))]
pub async fn create_project(
    admin: AdminClaims,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let (fields, image) = read_entity_form(payload, &state.upload_intake).await?;
    let project = state.project_handler.create_project(fields, image).await?;

    Ok(HttpResponse::Created().json(project))
}

#[instrument(skip(state, query))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let page = state
        .project_handler
        .list_projects(PageRequest::from_query(&query))
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(state))]
pub async fn get_project(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.get_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(admin, state, payload), fields(admin = %admin.username()))]
pub async fn update_project(
    admin: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let (fields, image) = read_entity_form(payload, &state.upload_intake).await?;
    let project = state.project_handler.update_project(&project_id, fields, image).await?;

    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(admin, state), fields(admin = %admin.username()))]
pub async fn delete_project(
    admin: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let response = state.project_handler.delete_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
