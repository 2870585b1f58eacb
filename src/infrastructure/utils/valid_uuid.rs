use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path id. A malformed id cannot name a stored record, so it is
/// reported as `NotFound` for `resource` rather than as bad input.
pub fn valid_uuid(id: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::NotFound(format!("{resource} not found")))
}
