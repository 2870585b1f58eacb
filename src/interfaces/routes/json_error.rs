use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    web,
};

use crate::errors::AppError;

/// Extractor failures answer with the same `{"error": ...}` body as handler errors.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        json_payload_error(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        AppError::InvalidFieldFormat(format!("Invalid query string: {}", err)).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err: PathError, _req| {
        AppError::NotFound(format!("Invalid path: {}", err)).into()
    }));
}

fn json_payload_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            AppError::PayloadTooLarge("JSON body too large".to_string())
        }
        JsonPayloadError::ContentType => {
            AppError::UnsupportedMediaType("Request body must be application/json".to_string())
        }
        other => AppError::InvalidFieldFormat(format!("JSON payload error: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, ResponseError};

    #[test]
    fn wrong_content_type_maps_to_415() {
        assert_eq!(
            json_payload_error(JsonPayloadError::ContentType).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn oversized_json_maps_to_413() {
        let err = JsonPayloadError::OverflowKnownLength { length: 10, limit: 5 };
        assert_eq!(json_payload_error(err).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
