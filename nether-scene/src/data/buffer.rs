//! Owned binary payloads

use crate::error::{ContentResult, check_range};

/// A contiguous byte payload addressed by offset and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    name: String,
    uri: String,
    data: Vec<u8>,
}

impl Buffer {
    pub fn new(name: impl Into<String>, uri: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI the payload was fetched from
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// Entire payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read-only view of `count` bytes starting at `offset`.
    ///
    /// Fails if the range extends past the payload; never clamps.
    pub fn get_data(&self, offset: usize, count: usize) -> ContentResult<&[u8]> {
        check_range("buffer", offset, count, self.data.len())?;
        Ok(&self.data[offset..offset + count])
    }
}
