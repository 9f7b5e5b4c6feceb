//! Three-dimensional points with additional attributes.

mod attribute;
mod classification;
mod format;
#[allow(clippy::module_inception)]
mod point;
mod scan_direction;

pub use attribute::{Attribute, Value, ValueKind};
pub use classification::Classification;
pub use format::Format;
pub use point::Point;
pub use scan_direction::ScanDirection;

use crate::Version;
use thiserror::Error;

/// Point-specific errors.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The attributes of the point format and point do not match.
    #[error("the attributes of the point format ({format}) do not match the point: {reason}")]
    AttributesDoNotMatch {
        /// The expected format.
        format: Format,
        /// What was missing or surplus on the point.
        reason: &'static str,
    },

    /// An invalid classification number.
    #[error("invalid classification: {0}")]
    Classification(u8),

    /// This is an invalid format.
    ///
    /// It has a combination of options that can't exist.
    #[error("invalid format: {0}")]
    Format(Format),

    /// This is an invalid format number.
    #[error("invalid format number: {0}")]
    FormatNumber(u8),

    /// The point data record length is too short for the format.
    #[error("record length {len} is below the {format} base size of {}", .format.len())]
    RecordLength {
        /// The format.
        format: Format,
        /// The invalid record length.
        len: u16,
    },

    /// This is not a valid return number.
    #[error("invalid return number {n} for version {version:?}")]
    ReturnNumber {
        /// The invalid return number.
        n: u8,
        /// The version that doesn't support this return number.
        version: Option<Version>,
    },

    /// This is not a valid scanner channel.
    #[error("invalid scanner channel: {0}")]
    ScannerChannel(u8),

    /// Classification 12 is reserved for overlap points.
    ///
    /// Use the `is_overlap` member instead.
    #[error("the overlap classification (12) is handled via `is_overlap`")]
    OverlapClassification,
}
