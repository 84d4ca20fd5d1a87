//! Records stored in the `projects` and `project_images` tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

use crate::errors::FolioError;

pub const PROJECTS: &str = "projects";
pub const PROJECT_IMAGES: &str = "project_images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Portfolio,
    Archive,
    Useful,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Portfolio, Category::Archive, Category::Useful];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Portfolio => "portfolio",
            Category::Archive => "archive",
            Category::Useful => "useful",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| FolioError::bad_request(format!("Unknown category: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub category: Category,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be empty".into()));
    }
    Ok(())
}

/// Blank clears the cover; anything else must parse as a URL.
fn cover_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.trim().validate_url() {
        return Ok(());
    }
    Err(ValidationError::new("url").with_message("must be a URL".into()))
}

/// Input of the project form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewProject {
    #[validate(custom(function = "non_blank"))]
    pub title: String,
    #[validate(custom(function = "non_blank"))]
    pub description: String,
    #[validate(custom(function = "non_blank"))]
    pub slug: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "cover_url"))]
    pub image_url: Option<String>,
}

impl NewProject {
    /// Trim text fields and drop an empty cover URL.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.slug = self.slug.trim().to_string();
        self.image_url = blank_to_none(self.image_url);
        self
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "non_blank"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "non_blank"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "non_blank"))]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// `""` removes the cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "cover_url"))]
    pub image_url: Option<String>,
}

impl ProjectPatch {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Trim text fields; a blank cover stays `Some("")` so it can clear the column.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.slug = self.slug.map(|s| s.trim().to_string());
        self.image_url = self.image_url.map(|u| u.trim().to_string());
        self
    }

    pub fn clears_cover(&self) -> bool {
        self.image_url.as_deref().is_some_and(str::is_empty)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.slug.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectImage {
    pub id: i64,
    pub project_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub order: i64,
}

/// Row inserted after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProjectImage {
    pub project_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub order: i64,
}

/// Body of a detail page: the project and its gallery in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub images: Vec<ProjectImage>,
}

pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
