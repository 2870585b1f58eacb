use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{entities::form_fields::FormFields, errors::AppError};

const MAX_TITLE_LENGTH: u64 = 200;
const MAX_TECHNOLOGIES: usize = 30;

pub const PROJECT_REQUIRED_FIELDS: [&str; 3] = ["title", "description", "date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "in progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            _ => Err(AppError::InvalidFieldFormat(format!(
                "status must be \"In Progress\" or \"Completed\", got \"{}\"",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectLinks {
    #[serde(default, alias = "github", skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub status: String,
    pub date_label: String,
    pub links: Json<ProjectLinks>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub status: ProjectStatus,
    pub date: String,
    pub links: ProjectLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ProjectStatus>().map_err(|_| {
            AppError::InternalError(format!("Stored project {} has unknown status {}", row.id, row.status))
        })?;

        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            technologies: row.technologies,
            status,
            date: row.date_label,
            links: row.links.0,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column values shared by inserts and full-row updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub status: ProjectStatus,
    pub date: String,
    pub links: ProjectLinks,
    pub image_url: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,

    #[validate(custom(function = "validate_technologies"))]
    pub technologies: Vec<String>,

    pub status: ProjectStatus,

    #[validate(length(min = 1, max = 50))]
    pub date: String,

    #[validate(custom(function = "validate_links"))]
    pub links: ProjectLinks,
}

impl NewProject {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        fields.require(&PROJECT_REQUIRED_FIELDS)?;

        let project = NewProject {
            title: fields.take_non_blank("title").unwrap_or_default(),
            description: fields.take_non_blank("description").unwrap_or_default(),
            technologies: fields
                .take_non_blank("technologies")
                .map(|raw| parse_technologies(&raw))
                .transpose()?
                .unwrap_or_default(),
            status: fields
                .take_non_blank("status")
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
            date: fields.take_non_blank("date").unwrap_or_default(),
            links: fields
                .take_non_blank("links")
                .map(|raw| parse_links(&raw))
                .transpose()?
                .unwrap_or_default(),
        };
        project.validate()?;
        Ok(project)
    }

    pub fn into_record(self, image_url: Option<String>) -> ProjectRecord {
        ProjectRecord {
            title: self.title,
            description: self.description,
            technologies: self.technologies,
            status: self.status,
            date: self.date,
            links: self.links,
            image_url,
        }
    }
}

/// Fields supplied to an update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_technologies"))]
    pub technologies: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    #[validate(length(min = 1, max = 50))]
    pub date: Option<String>,
    #[validate(custom(function = "validate_links"))]
    pub links: Option<ProjectLinks>,
}

impl ProjectChanges {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        fields.reject_blank(&PROJECT_REQUIRED_FIELDS)?;

        let changes = ProjectChanges {
            title: fields.take_non_blank("title"),
            description: fields.take_non_blank("description"),
            technologies: fields
                .take_non_blank("technologies")
                .map(|raw| parse_technologies(&raw))
                .transpose()?,
            status: fields
                .take_non_blank("status")
                .map(|raw| raw.parse())
                .transpose()?,
            date: fields.take_non_blank("date"),
            links: fields
                .take_non_blank("links")
                .map(|raw| parse_links(&raw))
                .transpose()?,
        };
        changes.validate()?;
        Ok(changes)
    }

    pub fn merge_over(self, existing: &Project, image_url: Option<String>) -> ProjectRecord {
        ProjectRecord {
            title: self.title.unwrap_or_else(|| existing.title.clone()),
            description: self.description.unwrap_or_else(|| existing.description.clone()),
            technologies: self.technologies.unwrap_or_else(|| existing.technologies.clone()),
            status: self.status.unwrap_or(existing.status),
            date: self.date.unwrap_or_else(|| existing.date.clone()),
            links: self.links.unwrap_or_else(|| existing.links.clone()),
            image_url,
        }
    }
}

// ───── Structured field parsing ─────────────────────────────────────

/// `technologies` arrives as a JSON array of strings, e.g. `["Rust","Postgres"]`.
pub fn parse_technologies(raw: &str) -> Result<Vec<String>, AppError> {
    let parsed: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        AppError::InvalidFieldFormat(format!("technologies must be a JSON array of strings: {}", e))
    })?;

    Ok(parsed
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// `links` arrives as a JSON object with optional `repository` (or `github`), `demo` and `paper`.
pub fn parse_links(raw: &str) -> Result<ProjectLinks, AppError> {
    let links: ProjectLinks = serde_json::from_str(raw).map_err(|e| {
        AppError::InvalidFieldFormat(format!("links must be a JSON object: {}", e))
    })?;

    let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    Ok(ProjectLinks {
        repository: blank_to_none(links.repository),
        demo: blank_to_none(links.demo),
        paper: blank_to_none(links.paper),
    })
}

fn validate_technologies(technologies: &[String]) -> Result<(), ValidationError> {
    if technologies.len() > MAX_TECHNOLOGIES {
        let mut err = ValidationError::new("too_many_technologies");
        err.message = Some("Too many technologies provided".into());
        return Err(err);
    }
    Ok(())
}

fn validate_links(links: &ProjectLinks) -> Result<(), ValidationError> {
    for link in [&links.repository, &links.demo, &links.paper].into_iter().flatten() {
        match url::Url::parse(link) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => {
                let mut err = ValidationError::new("invalid_url");
                err.message = Some("Links must be http:// or https:// URLs".into());
                return Err(err);
            }
        }
    }
    Ok(())
}
