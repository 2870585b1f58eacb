use actix_multipart::{Field, Multipart};
use futures_util::TryStreamExt;

use crate::{
    entities::{form_fields::FormFields, image::IncomingFile},
    errors::AppError,
    use_cases::upload_intake::UploadIntake,
};

pub const IMAGE_FIELD: &str = "image";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
pub const MAX_TEXT_FIELDS: usize = 32;

/// Streams an entity form into its text fields and the optional `image` part.
///
/// The image's declared type is checked on its first chunk and its running
/// size on every chunk, so a disallowed or oversized upload is refused before
/// it is fully buffered. Text parts are capped in both size and count.
pub async fn read_entity_form(
    mut payload: Multipart,
    intake: &UploadIntake,
) -> Result<(FormFields, Option<IncomingFile>), AppError> {
    let mut fields = FormFields::new();
    let mut image: Option<IncomingFile> = None;
    let mut text_parts = 0usize;

    while let Some(field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            if image.is_some() {
                return Err(AppError::InvalidFieldFormat("Only one image may be uploaded".to_string()));
            }
            image = Some(read_image(field, intake).await?);
        } else if !name.is_empty() {
            text_parts += 1;
            if text_parts > MAX_TEXT_FIELDS {
                return Err(AppError::PayloadTooLarge(format!(
                    "Forms may carry at most {MAX_TEXT_FIELDS} text fields"
                )));
            }
            let value = read_text(field, &name).await?;
            fields.insert(name, value);
        }
    }

    Ok((fields, image))
}

async fn read_image(mut field: Field, intake: &UploadIntake) -> Result<IncomingFile, AppError> {
    let declared_type = field.content_type().map(|mime| mime.essence_str().to_string());
    let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if data.is_empty() && !chunk.is_empty() {
            intake.check_declared_type(declared_type.as_deref())?;
        }
        intake.check_size(data.len() + chunk.len())?;
        data.extend_from_slice(&chunk);
    }

    tracing::debug!(size = data.len(), declared_type = ?declared_type, "Image part received");
    Ok(IncomingFile {
        declared_type,
        file_name,
        data,
    })
}

async fn read_text(mut field: Field, name: &str) -> Result<String, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::PayloadTooLarge(format!("Field '{name}' is too large")));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes)
        .map_err(|_| AppError::InvalidFieldFormat(format!("Field '{name}' is not valid UTF-8")))
}
