use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Image types accepted for entity uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    /// Parses a declared content type. `image/jpg` is accepted as an alias of `image/jpeg`;
    /// parameters such as `; charset=binary` are ignored.
    pub fn from_declared(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or_default()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            "image/png" => Some(ImageMime::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
        }
    }
}

/// A file part exactly as it arrived, before intake validation.
#[derive(Debug, Clone, Default)]
pub struct IncomingFile {
    pub declared_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// A validated image held in memory for the duration of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub mime: ImageMime,
    pub file_name: Option<String>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File name sent to the remote store; falls back to `upload.<ext>`.
    pub fn upload_name(&self) -> String {
        self.file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("upload.{}", self.mime.extension()))
    }
}

/// Remote folder plus the public-id prefix used for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFolder {
    pub name: String,
    pub prefix: String,
}

impl ImageFolder {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        ImageFolder {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

/// Identifies one object in the remote media store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteImageRef {
    pub folder: String,
    pub public_id: String,
}

impl RemoteImageRef {
    pub fn new(folder: impl Into<String>, public_id: impl Into<String>) -> Self {
        RemoteImageRef {
            folder: folder.into(),
            public_id: public_id.into(),
        }
    }

    /// Fresh reference for a new upload into `folder`.
    pub fn generate(folder: &ImageFolder) -> Self {
        RemoteImageRef::new(folder.name.clone(), generate_public_id(&folder.prefix, Utc::now()))
    }

    /// Recovers the reference of an object from the URL the store returned for it.
    pub fn from_url(url: &str, folder: &ImageFolder) -> Option<Self> {
        public_id_from_url(url).map(|public_id| RemoteImageRef::new(folder.name.clone(), public_id))
    }

    /// `<folder>/<public_id>`, the form the remote store addresses objects by.
    pub fn full_id(&self) -> String {
        format!("{}/{}", self.folder, self.public_id)
    }
}

/// `<prefix>_<unix millis>_<6 hex chars>`. Must never contain `.` or `/`,
/// otherwise [`public_id_from_url`] no longer inverts it.
pub fn generate_public_id(prefix: &str, now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, now.timestamp_millis(), &nonce[..6])
}

/// Final path segment of `url` up to (not including) its first `.`.
///
/// This is the inverse of how uploads are named: the store serves an object
/// `<folder>/<public_id>` at `.../<folder>/<public_id>.<ext>`. Any change to
/// [`generate_public_id`] must keep the two in lockstep.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let last_segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    }?;

    let public_id = last_segment.split('.').next().unwrap_or_default();
    if public_id.is_empty() {
        None
    } else {
        Some(public_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> ImageFolder {
        ImageFolder::new("blog_images", "post")
    }

    #[test]
    fn derivation_inverts_generated_public_id() {
        let folder = posts();
        let created = RemoteImageRef::generate(&folder);
        let url = format!(
            "https://res.cloudinary.com/demo/image/upload/v1718000000/{}/{}.png",
            created.folder, created.public_id
        );

        let derived = RemoteImageRef::from_url(&url, &folder).unwrap();

        assert_eq!(derived, created);
        assert_eq!(derived.full_id(), format!("blog_images/{}", created.public_id));
    }

    #[test]
    fn strips_everything_from_the_first_dot() {
        assert_eq!(
            public_id_from_url("https://cdn.example.com/a/b/post_1.tar.gz").as_deref(),
            Some("post_1")
        );
    }

    #[test]
    fn ignores_query_and_fragment() {
        assert_eq!(
            public_id_from_url("https://cdn.example.com/x/post_9.jpg?w=200#top").as_deref(),
            Some("post_9")
        );
    }

    #[test]
    fn handles_urls_that_do_not_parse() {
        assert_eq!(public_id_from_url("blog_images/post_7.jpg").as_deref(), Some("post_7"));
    }

    #[test]
    fn empty_final_segment_yields_none() {
        assert_eq!(public_id_from_url("https://cdn.example.com/images/"), None);
        assert_eq!(public_id_from_url("https://cdn.example.com/images/.jpg"), None);
    }

    #[test]
    fn generated_ids_are_prefixed_and_dot_free() {
        let id = generate_public_id("project", Utc::now());
        assert!(id.starts_with("project_"));
        assert!(!id.contains('.'));
        assert!(!id.contains('/'));
    }

    #[test]
    fn declared_types_are_normalised() {
        assert_eq!(ImageMime::from_declared("image/jpg"), Some(ImageMime::Jpeg));
        assert_eq!(ImageMime::from_declared("IMAGE/PNG; charset=binary"), Some(ImageMime::Png));
        assert_eq!(ImageMime::from_declared("image/gif"), None);
        assert_eq!(ImageMime::from_declared("text/plain"), None);
    }
}
