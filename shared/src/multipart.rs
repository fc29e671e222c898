//! Minimal `multipart/form-data` writer (RFC 7578) for the image upload.

use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, ErrorKind};

const MAX_BOUNDARY_LEN: usize = 70;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("invalid boundary: {reason}")]
    InvalidBoundary { reason: &'static str },

    #[error("invalid {what} '{value}': quotes and line breaks are not allowed")]
    InvalidHeaderValue { what: &'static str, value: String },
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::new(ErrorKind::Internal, "Could not encode upload body").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("----labelwise-{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Result<Self, MultipartError> {
        let boundary = boundary.into();
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(MultipartError::InvalidBoundary {
                reason: "length must be between 1 and 70",
            });
        }
        if !boundary
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"'()+_,-./:=?".contains(&b))
        {
            return Err(MultipartError::InvalidBoundary {
                reason: "contains characters outside the RFC 2046 set",
            });
        }
        Ok(Self {
            boundary,
            body: Vec::new(),
        })
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn add_file(
        &mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<&mut Self, MultipartError> {
        check_header_value("field name", name)?;
        check_header_value("filename", filename)?;
        check_header_value("content type", content_type)?;

        self.open_part();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        Ok(self)
    }

    /// Closes the body with the terminating delimiter.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }

    fn open_part(&mut self) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

fn check_header_value(what: &'static str, value: &str) -> Result<(), MultipartError> {
    if value.is_empty() || value.contains(['"', '\r', '\n']) {
        return Err(MultipartError::InvalidHeaderValue {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_part_layout() {
        let mut form = MultipartForm::with_boundary("XyZ").unwrap();
        form.add_file("file", "photo.webp", "image/webp", b"RIFF")
            .unwrap();
        let body = form.finish();

        let expected = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"photo.webp\"\r\n\
            Content-Type: image/webp\r\n\r\n\
            RIFF\r\n\
            --XyZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_binary_data_is_copied_verbatim() {
        let data = [0u8, 0x0d, 0x0a, 0xff, b'-', b'-'];
        let mut form = MultipartForm::with_boundary("b").unwrap();
        form.add_file("file", "a.webp", "image/webp", &data).unwrap();
        let body = form.finish();

        let start = body.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert_eq!(&body[start..start + data.len()], &data);
        assert!(body.ends_with(b"\r\n--b--\r\n"));
    }

    #[test]
    fn test_random_boundaries_differ() {
        let a = MultipartForm::new();
        let b = MultipartForm::new();
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.boundary().len() <= MAX_BOUNDARY_LEN);
        assert!(a.content_type().starts_with("multipart/form-data; boundary=----labelwise-"));
    }

    #[test]
    fn test_rejects_bad_boundary() {
        assert!(MultipartForm::with_boundary("").is_err());
        assert!(MultipartForm::with_boundary("a b").is_err());
        assert!(MultipartForm::with_boundary("x".repeat(71)).is_err());
    }

    #[test]
    fn test_rejects_header_injection() {
        let mut form = MultipartForm::new();
        assert!(form
            .add_file("file", "evil\"\r\nX-Injected: 1", "image/webp", b"")
            .is_err());
        assert!(form.add_file("", "a.webp", "image/webp", b"").is_err());
        assert!(form
            .add_file("file", "a.webp", "image/webp\r\nX: 1", b"")
            .is_err());
    }
}
