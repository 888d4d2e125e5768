//! Multipart form reading for the registration and image upload endpoints.

use axum::extract::Multipart;
use std::collections::HashMap;
use std::str::FromStr;

use crate::web::error::ApiError;

/// An uploaded file part.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied filename; only its extension is used.
    pub filename: String,
    pub content: Vec<u8>,
}

/// A fully read multipart form: text fields plus at most one file.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl FormData {
    /// Read every part of `multipart`. The part named `file_field` is taken
    /// as the upload; all other parts are read as text.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::warn!("Failed to read multipart field: {}", e);
            ApiError::bad_request("Invalid multipart data")
        })? {
            let name = field.name().unwrap_or("").to_string();

            if name == file_field {
                let filename = field.file_name().unwrap_or("").to_string();
                let content = field.bytes().await.map_err(|e| {
                    tracing::warn!("Failed to read file content: {}", e);
                    ApiError::bad_request("Failed to read file")
                })?;
                // Browsers send an empty part when no file is chosen.
                if !content.is_empty() {
                    form.file = Some(UploadedFile {
                        filename,
                        content: content.to_vec(),
                    });
                }
            } else if !name.is_empty() {
                let value = field.text().await.map_err(|e| {
                    tracing::warn!("Failed to read field {}: {}", name, e);
                    ApiError::bad_request(format!("Invalid value for {name}"))
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Optional text field; blank counts as absent.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Required text field.
    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.optional(name)
            .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
    }

    /// Required field parsed as `T`.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        self.required(name)?
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid value for {name}")))
    }

    /// Optional boolean field. Accepts true/false, 1/0, on/off.
    pub fn flag(&self, name: &str) -> Result<bool, ApiError> {
        match self.optional(name).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("false") | Some("0") | Some("off") => Ok(false),
            Some("true") | Some("1") | Some("on") => Ok(true),
            Some(_) => Err(ApiError::bad_request(format!("Invalid value for {name}"))),
        }
    }

    /// Raw password field. Not trimmed.
    pub fn password(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
    }

    /// Take the uploaded file, if any.
    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }
}
