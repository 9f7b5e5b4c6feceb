//! Raw structures that map directly onto the las format specifications.
//!
//! In general, these structures are "dumb", meaning that they do the least
//! amount of validity checking. For example:
//!
//! ```
//! let raw_header = pointclouds::raw::Header::default();
//! assert_eq!((0, 0), (raw_header.version.major, raw_header.version.minor));
//!
//! let header = pointclouds::Header::default();
//! assert_eq!(pointclouds::Version::new(1, 2), header.version());
//! ```
//!
//! Users should prefer the non-raw versions, e.g. [Header](crate::Header)
//! over [raw::Header](Header), in order to ensure that they are following The
//! Rules.

mod header;
mod point;
mod vlr;

pub use header::{Evlr, Header, LargeFile};
pub use point::{Flags, Point, ScanAngle, Waveform};
pub use vlr::Vlr;

/// The file magic number used for all las files.
pub const LASF: [u8; 4] = *b"LASF";

/// The point data start signature required by las 1.0.
pub const POINT_DATA_START_SIGNATURE: [u8; 2] = [0xDD, 0xCC];
