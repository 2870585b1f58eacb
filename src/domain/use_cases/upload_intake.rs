use crate::{
    entities::image::{ImageMime, IncomingFile, UploadedFile},
    errors::AppError,
    settings::MediaSettings,
};

/// Gatekeeper for the optional image part of an entity form.
///
/// Every check runs before the media store is contacted. The multipart reader
/// calls [`check_declared_type`](Self::check_declared_type) and
/// [`check_size`](Self::check_size) while the part is still streaming, and
/// [`accept`](Self::accept) once the bytes are buffered.
#[derive(Debug, Clone, Copy)]
pub struct UploadIntake {
    max_bytes: usize,
}

impl UploadIntake {
    pub fn new(max_bytes: usize) -> Self {
        UploadIntake { max_bytes }
    }

    pub fn check_declared_type(&self, declared: Option<&str>) -> Result<ImageMime, AppError> {
        let declared = declared
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::UnsupportedMediaType("Image part has no content type".to_string()))?;

        ImageMime::from_declared(declared).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "{declared} is not allowed, only image/jpeg and image/png"
            ))
        })
    }

    pub fn check_size(&self, size: usize) -> Result<(), AppError> {
        if size > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(())
    }

    /// `Ok(None)` when nothing usable was supplied.
    pub fn accept(&self, file: Option<IncomingFile>) -> Result<Option<UploadedFile>, AppError> {
        let Some(file) = file else {
            return Ok(None);
        };

        let unnamed = file.file_name.as_deref().is_none_or(|name| name.trim().is_empty());
        if file.data.is_empty() && unnamed {
            return Ok(None);
        }

        let declared = self.check_declared_type(file.declared_type.as_deref())?;
        self.check_size(file.data.len())?;
        let mime = sniff(&file.data)?.unwrap_or(declared);

        Ok(Some(UploadedFile {
            data: file.data,
            mime,
            file_name: file.file_name,
        }))
    }
}

impl From<&MediaSettings> for UploadIntake {
    fn from(settings: &MediaSettings) -> Self {
        UploadIntake::new(settings.max_image_bytes)
    }
}

/// Recognised content must itself be an allowed image type.
fn sniff(data: &[u8]) -> Result<Option<ImageMime>, AppError> {
    match infer::get(data) {
        None => Ok(None),
        Some(kind) => ImageMime::from_declared(kind.mime_type())
            .map(Some)
            .ok_or_else(|| {
                tracing::warn!(detected = kind.mime_type(), "Image content does not match an allowed type");
                AppError::UnsupportedMediaType(format!("File content is {}", kind.mime_type()))
            }),
    }
}
