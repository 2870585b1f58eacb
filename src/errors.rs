use std::borrow::Cow;

use actix_multipart::MultipartError;
use actix_web::{
    error::{PayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use jsonwebtoken::errors::{ErrorKind, Error as JwtError};
use derive_more::Display;
use serde::Serialize;
use serde_json::{json, Value};
use validator::ValidationErrors;

#[derive(Debug, Display)]
pub enum AppError {
    #[display("validation error: {}", join_field_errors(_0))]
    ValidationError(Vec<FieldError>),

    #[display("Missing fields: {}", _0.join(", "))]
    MissingFields(Vec<String>),

    #[display("Invalid field format: {_0}")]
    InvalidFieldFormat(String),

    #[display("Unsupported media type: {_0}")]
    UnsupportedMediaType(String),

    #[display("Payload too large: {_0}")]
    PayloadTooLarge(String),

    #[display("Image upload failed: {_0}")]
    UploadFailed(String),

    #[display("Not found: {_0}")]
    NotFound(String),

    #[display("Conflict: {_0}")]
    Conflict(String),

    #[display("Forbidden access")]
    ForbiddenAccess,

    #[display("Internal server error: {_0}")]
    InternalError(String),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}:{}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Client-facing body. Upload and internal details stay in the logs.
    fn body(&self) -> Value {
        match self {
            AppError::ValidationError(errors) => json!({"error": "Validation failed", "details": errors}),
            AppError::MissingFields(fields) => json!({"error": "Missing fields", "details": fields}),
            AppError::UploadFailed(detail) => {
                tracing::error!(error = %detail, "Image upload failed");
                json!({"error": "Image upload failed"})
            }
            AppError::InternalError(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                json!({"error": "Internal server error"})
            }
            _ => json!({"error": self.to_string()}),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.body())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingFields(_)
            | AppError::InvalidFieldFormat(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ForbiddenAccess => StatusCode::FORBIDDEN,
            AppError::UploadFailed(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Database conflict occurred".into())
            }
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::ContentTypeIncompatible | MultipartError::ContentTypeMissing => {
                AppError::UnsupportedMediaType("Request body must be multipart/form-data".to_string())
            }
            MultipartError::Payload(PayloadError::Overflow) => {
                AppError::PayloadTooLarge("Request body too large".to_string())
            }
            _ => AppError::InvalidFieldFormat(format!("Malformed multipart body: {}", err)),
        }
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("Invalid token")]
    InvalidToken,

    #[display("Wrong credentials")]
    WrongCredentials,

    #[display("Token creation error")]
    TokenCreation,

    #[display("Token expired")]
    TokenExpired,

    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Missing JWT service")]
    MissingJwtService,

    #[display("Invalid user ID")]
    InvalidUserId,

    #[display("Forbidden: {_0}")]
    Forbidden(String),
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_message = match self {
            AuthError::TokenExpired => "Token has expired".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .json(json!({"error": error_message}))
    }
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken
            | AuthError::WrongCredentials
            | AuthError::TokenExpired
            | AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation | AuthError::MissingJwtService => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidUserId => StatusCode::BAD_REQUEST,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(_: ValidationErrors) -> Self {
        AuthError::MissingCredentials
    }
}

#[derive(Debug, Display)]
pub enum PasswordError {
    #[display("Invalid password parameters: {_0}")]
    InvalidParameters(String),

    #[display("Password hashing failed: {_0}")]
    HashingError(String),

    #[display("Invalid password hash format: {_0}")]
    InvalidHashFormat(String),

    #[display("Password verification failed: {_0}")]
    VerificationError(String),
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn internal_error_body_does_not_leak_detail() {
        let err = AppError::InternalError("relation \"posts\" does not exist".into());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Internal server error"));
        assert!(!text.contains("relation"));
    }

    #[test]
    fn intake_errors_map_to_4xx_statuses() {
        assert_eq!(
            AppError::UnsupportedMediaType("image/gif".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::PayloadTooLarge("6 MiB".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::MissingFields(vec!["title".into()]).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_fields_display_lists_names() {
        let err = AppError::MissingFields(vec!["title".into(), "content".into()]);
        assert_eq!(err.to_string(), "Missing fields: title, content");
    }

    #[test]
    fn multipart_content_type_errors_are_415() {
        let err = AppError::from(MultipartError::ContentTypeMissing);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn expired_jwt_maps_to_token_expired() {
        let err = AuthError::from(JwtError::from(ErrorKind::ExpiredSignature));
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
    }
}
