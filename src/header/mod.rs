//! Metadata describing the layout, source, and interpretation of the points.
//!
//! A [Header] is the validated, high-level view of the Public Header Block.
//! Converting a [raw::Header](crate::raw::Header) into a [Header] goes
//! through a [Builder], which is deliberately permissive: oddities in real
//! world files are downgraded to warnings wherever the data can still be
//! used.

mod builder;
#[allow(clippy::module_inception)]
mod header;

pub use builder::Builder;
pub use header::Header;

use crate::{point::Format, Version};
use thiserror::Error;

/// Header-specific errors.
#[derive(Clone, Copy, Debug, Error)]
pub enum Error {
    /// The file signature is not "LASF".
    #[error("invalid file signature: {0:?}")]
    FileSignature([u8; 4]),

    /// The point format is not allowed for this version.
    ///
    /// Formats 2 and above need las 1.2, the waveform formats need las 1.3,
    /// and the extended formats need las 1.4.
    #[error("{format} is not supported by las {version}")]
    Format {
        /// The format.
        format: Format,
        /// The version that doesn't support it.
        version: Version,
    },

    /// The header size is too small to hold the header.
    #[error("the header size {0} is too small")]
    TooSmall(u16),

    /// Too many points for a legacy 32-bit count.
    #[error("too many points ({n}) for las {version}")]
    TooManyPoints {
        /// The number of points.
        n: u64,
        /// The version whose count field can't hold them.
        version: Version,
    },

    /// Too many variable length records.
    #[error("too many variable length records: {0}")]
    TooManyVlrs(usize),

    /// A per-return count exceeds the total point count.
    #[error("the return counts are inconsistent with the {len} points: {counts:?}")]
    ReturnCounts {
        /// The per-return counts.
        counts: [u64; 15],
        /// The total number of points.
        len: u64,
    },
}

/// Returns an error if the point format can't be stored in the version.
pub(crate) fn verify_format_is_allowed(format: Format, version: Version) -> crate::Result<()> {
    let n = format.to_u8()?;
    let minimum_minor = match n {
        0 | 1 => 0,
        2 | 3 => 2,
        4 | 5 => 3,
        _ => 4,
    };
    if version.major != 1 || version.minor < minimum_minor {
        Err(Error::Format { format, version }.into())
    } else {
        Ok(())
    }
}
