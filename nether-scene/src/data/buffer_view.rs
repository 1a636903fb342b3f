//! Windows into buffers

use serde::Deserialize;
use std::rc::Rc;

use super::Buffer;
use crate::error::{ContentResult, check_range};

/// Intended GPU binding of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
#[repr(u32)]
pub enum BufferTarget {
    /// Vertex attribute data
    ArrayBuffer = 34962,
    /// Index data
    ElementArrayBuffer = 34963,
}

impl TryFrom<u32> for BufferTarget {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            34962 => Ok(Self::ArrayBuffer),
            34963 => Ok(Self::ElementArrayBuffer),
            other => Err(format!("unknown buffer view target {}", other)),
        }
    }
}

/// A typed window (offset, length, target) into a [`Buffer`].
///
/// The view never owns bytes; it shares the buffer it was built from.
#[derive(Debug, Clone)]
pub struct BufferView {
    name: String,
    buffer: Rc<Buffer>,
    byte_offset: usize,
    byte_length: usize,
    target: Option<BufferTarget>,
}

impl BufferView {
    /// Create a view, failing if the range does not fit in `buffer`.
    pub fn new(
        name: impl Into<String>,
        buffer: Rc<Buffer>,
        byte_offset: usize,
        byte_length: usize,
        target: Option<BufferTarget>,
    ) -> ContentResult<Self> {
        check_range(
            "buffer view",
            byte_offset,
            byte_length,
            buffer.byte_length(),
        )?;
        Ok(Self {
            name: name.into(),
            buffer,
            byte_offset,
            byte_length,
            target,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &Rc<Buffer> {
        &self.buffer
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn target(&self) -> Option<BufferTarget> {
        self.target
    }

    /// `count` bytes starting `offset` bytes into the view.
    pub fn get_data(&self, offset: usize, count: usize) -> ContentResult<&[u8]> {
        check_range("buffer view", offset, count, self.byte_length)?;
        self.buffer.get_data(self.byte_offset + offset, count)
    }
}
