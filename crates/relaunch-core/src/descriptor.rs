//! Version descriptor: the small JSON document published next to each release.
//!
//! ```json
//! { "AppVersion": "1.0", "UpdateLink": "https://example.com/app.exe" }
//! ```
//!
//! Both keys are required and must be non-empty strings. Other keys are ignored.
//! Values are kept verbatim; no trimming or normalization.

use serde_json::{Map, Value};
use std::io::Read;
use url::Url;

pub const APP_VERSION_KEY: &str = "AppVersion";
pub const UPDATE_LINK_KEY: &str = "UpdateLink";

/// Link schemes the downloader accepts.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("missing required key `{0}`")]
    MissingField(&'static str),

    #[error("key `{0}` must be a non-empty string")]
    InvalidField(&'static str),

    #[error("`UpdateLink` is not a valid URL ({link}): {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("`UpdateLink` uses unsupported scheme `{0}`")]
    UnsupportedScheme(String),
}

/// Latest published version and where to download it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub app_version: String,
    pub update_link: String,
}

impl VersionDescriptor {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DescriptorError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self, DescriptorError> {
        let obj = value.as_object().ok_or(DescriptorError::NotAnObject)?;
        let app_version = string_field(obj, APP_VERSION_KEY)?;
        let update_link = string_field(obj, UPDATE_LINK_KEY)?;

        let parsed = Url::parse(&update_link).map_err(|source| DescriptorError::InvalidLink {
            link: update_link.clone(),
            source,
        })?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(DescriptorError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        Ok(VersionDescriptor {
            app_version,
            update_link,
        })
    }
}

fn string_field(obj: &Map<String, Value>, key: &'static str) -> Result<String, DescriptorError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(DescriptorError::MissingField(key)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(DescriptorError::InvalidField(key)),
    }
}
