//! Binary data access layer
//!
//! - [`Buffer`] owns a payload fetched from an external URI.
//! - [`BufferView`] is a window into one buffer.
//! - [`Accessor`] interprets a view as a strided sequence of typed elements.
//!
//! All three are immutable once constructed and validate their byte ranges
//! at construction, not at first use.

mod accessor;
mod buffer;
mod buffer_view;

pub use accessor::{Accessor, AccessorDesc, AttributeType, ComponentType};
pub use buffer::Buffer;
pub use buffer_view::{BufferTarget, BufferView};
