//! Recoverable configuration errors.
//!
//! Only invalid *configuration* is reported as an error. Running out of
//! internal queue or cache space is handled by flushing early, and contract
//! violations during a draw call, such as drawing without a vertex layout,
//! are panics.

use thiserror::Error;

use crate::render::{clip::MAX_USER_PLANES, vertex::MAX_ATTRIBS};

/// Error type of the configuration API.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("too many user clip planes: {0}, at most {max} supported", max = MAX_USER_PLANES)]
    TooManyClipPlanes(usize),
    #[error("too many vertex attributes: {0}, at most {max} supported", max = MAX_ATTRIBS)]
    TooManyAttributes(usize),
    #[error("invalid element width: {0} bytes, expected 0, 1, 2, or 4")]
    ElementWidth(usize),
    #[error("element buffer length {len} is not a multiple of element width {width}")]
    ElementLength { len: usize, width: usize },
    #[error("element buffer is not aligned to element width {0}")]
    ElementAlignment(usize),
    #[error("unknown topology id: {0}")]
    UnknownTopology(u32),
}

pub type Result<T> = core::result::Result<T, Error>;
