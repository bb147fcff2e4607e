//! `multipart/form-data` bodies.
//!
//! A multipart body is decoded into an object a body schema can check:
//! text fields become strings, file fields become
//! `{"fileName", "contentType", "size"}` descriptors, and a field name that
//! repeats (or that the schema declares as an array) collects its values in
//! an array. File contents are kept aside as [`UploadedFile`]s and handed to
//! handlers through [`UploadedFiles`] in the request context.
//!
//! # Example
//!
//! ```rust,ignore
//! let files = ctx.extension::<UploadedFiles>().unwrap_or_default();
//! if let Some(avatar) = files.get("avatar") {
//!     storage.save(avatar.file_name().unwrap_or("unnamed"), avatar.data()).await?;
//! }
//! ```

use std::io;
use std::sync::Arc;

use accord_core::{codes, Issue, Issues};
use bytes::Bytes;
use serde_json::{json, Map, Value};

/// Default maximum size per field (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while decoding multipart bodies.
///
/// The overall body size is limited before decoding starts, by the request
/// pipeline's `max_body_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Sets the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// A file that has been uploaded via multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The form field name.
    pub field: String,
    /// The original file name from the client.
    pub file_name: Option<String>,
    /// The MIME type of the file.
    pub content_type: Option<String>,
    /// The file content.
    pub data: Bytes,
}

impl UploadedFile {
    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn descriptor(&self) -> Value {
        json!({
            "fileName": self.file_name,
            "contentType": self.content_type,
            "size": self.data.len(),
        })
    }
}

/// The files of a multipart request, stored in the request context.
#[derive(Debug, Clone, Default)]
pub struct UploadedFiles(Arc<[UploadedFile]>);

impl UploadedFiles {
    /// Returns the first file uploaded under `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&UploadedFile> {
        self.0.iter().find(|file| file.field == field)
    }

    /// Returns every file uploaded under `field`.
    pub fn get_all<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.0.iter().filter(move |file| file.field == field)
    }

    /// Iterates over all files in upload order.
    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.0.iter()
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no files were uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<UploadedFile>> for UploadedFiles {
    fn from(files: Vec<UploadedFile>) -> Self {
        Self(files.into())
    }
}

/// Decodes a multipart body.
///
/// # Errors
///
/// Returns body issues for a missing boundary, malformed data, too many
/// fields or an oversized field.
pub async fn decode_multipart<F>(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
    is_array: F,
) -> Result<(Value, Vec<UploadedFile>), Issues>
where
    F: Fn(&str) -> bool + Send,
{
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        Issues::single(Issue::new(
            codes::CUSTOM,
            "Missing or invalid multipart boundary",
        ))
    })?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = Map::new();
    let mut files = Vec::new();
    let mut count = 0;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => return Err(malformed(&error)),
        };

        count += 1;
        if count > config.max_fields {
            return Err(Issues::single(Issue::new(
                codes::TOO_BIG,
                format!("Multipart body must contain at most {} field(s)", config.max_fields),
            )));
        }

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(ToString::to_string);
        let data = field.bytes().await.map_err(|error| malformed(&error))?;

        if data.len() > config.max_field_size {
            return Err(Issues::single(
                Issue::new(
                    codes::TOO_BIG,
                    format!("Field must be at most {} byte(s)", config.max_field_size),
                )
                .at([name.as_str()]),
            ));
        }

        let value = if file_name.is_some() {
            let file = UploadedFile {
                field: name.clone(),
                file_name,
                content_type,
                data,
            };
            let descriptor = file.descriptor();
            files.push(file);
            descriptor
        } else {
            match String::from_utf8(data.to_vec()) {
                Ok(text) => Value::String(text),
                Err(_) => {
                    return Err(Issues::single(
                        Issue::new(codes::INVALID_ENCODING, "Field is not valid UTF-8")
                            .at([name.as_str()]),
                    ))
                }
            }
        };

        let array = is_array(&name);
        insert_field(&mut fields, name, value, array);
    }

    Ok((Value::Object(fields), files))
}

fn insert_field(fields: &mut Map<String, Value>, name: String, value: Value, array: bool) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None if array => {
            fields.insert(name, Value::Array(vec![value]));
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn malformed(error: &multer::Error) -> Issues {
    Issues::single(Issue::new(
        codes::CUSTOM,
        format!("Malformed multipart body: {error}"),
    ))
}
