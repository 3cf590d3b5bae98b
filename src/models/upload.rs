//! Upload sources handed to the model store.

use async_trait::async_trait;

/// A readable binary handed over by the upload surface.
///
/// The store takes ownership for the duration of a persist call and reads
/// the whole content into memory.
#[async_trait]
pub trait ModelSource: Send {
    /// Original file name.
    fn name(&self) -> &str;

    /// MIME type as reported by the upload surface. May be empty.
    fn mime_type(&self) -> &str;

    /// Size declared by the upload surface.
    fn declared_size(&self) -> u64;

    /// Read the entire content.
    async fn into_bytes(self) -> std::io::Result<Vec<u8>>
    where
        Self: Sized;
}

/// An upload whose bytes are already buffered, e.g. a multipart field.
#[derive(Debug, Clone)]
pub struct ModelUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ModelUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

#[async_trait]
impl ModelSource for ModelUpload {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn declared_size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        Ok(self.data)
    }
}
