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
pub async fn create_post(
    admin: AdminClaims,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let (fields, image) = read_entity_form(payload, &state.upload_intake).await?;
    let post = state.post_handler.create_post(fields, image).await?;

    Ok(HttpResponse::Created().json(post))
}

#[instrument(skip(state, query))]
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let page = state
        .post_handler
        .list_posts(PageRequest::from_query(&query))
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(state))]
pub async fn get_post(
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let post = state.post_handler.get_post(&post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[instrument(skip(admin, state, payload), fields(admin = %admin.username()))]
pub async fn update_post(
    admin: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let (fields, image) = read_entity_form(payload, &state.upload_intake).await?;
    let post = state.post_handler.update_post(&post_id, fields, image).await?;

    Ok(HttpResponse::Ok().json(post))
}

#[instrument(skip(admin, state), fields(admin = %admin.username()))]
pub async fn delete_post(
    admin: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let response = state.post_handler.delete_post(&post_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
