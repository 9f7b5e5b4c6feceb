use crate::{
    cloud, geokey, header,
    point::{self, Attribute, Format, ValueKind},
    vlr, Transform, Version,
};
use thiserror::Error;

/// Crate-specific error enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A parallel batch was cancelled through its cancellation token.
    #[error("the operation was cancelled")]
    Cancelled,

    /// A wrapper around [cloud::Error].
    #[error(transparent)]
    Cloud(#[from] cloud::Error),

    /// A wrapper around [geokey::Error].
    #[error(transparent)]
    GeoKey(#[from] geokey::Error),

    /// A wrapper around [header::Error].
    #[error(transparent)]
    Header(#[from] header::Error),

    /// The value can't have the inverse transform applied.
    #[error("the transform {transform} cannot be inversely applied to {n}")]
    InverseTransform {
        /// The float that can't be transformed back to an i32.
        n: f64,
        /// The transform that can't be applied.
        transform: Transform,
    },

    /// A wrapper around [std::io::Error].
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The las data is laszip compressed, but laszip compression is not
    /// supported by this build.
    #[error("laszip compression is not enabled; rebuild with the `laz` feature")]
    LaszipNotEnabled,

    /// A wrapper around [laz::LasZipError].
    #[cfg(feature = "laz")]
    #[error("laszip error: {0}")]
    Laszip(#[from] laz::LasZipError),

    /// The data is laszip compressed but the laszip vlr is missing.
    #[error("the laszip vlr was not found")]
    LaszipVlrNotFound,

    /// An accessor or overlay targeted an attribute the format doesn't carry.
    #[error("{format} does not carry {attribute}")]
    MissingAttribute {
        /// The absent attribute.
        attribute: Attribute,
        /// The format.
        format: Format,
    },

    /// An overlay column's element kind doesn't match its attribute.
    #[error("overlay for {attribute} has kind {actual:?}, expected {expected:?}")]
    OverlayKind {
        /// The overlaid attribute.
        attribute: Attribute,
        /// The kind the attribute decodes to.
        expected: ValueKind,
        /// The kind that was provided.
        actual: ValueKind,
    },

    /// An overlay column's length doesn't match its view.
    #[error("overlay for {attribute} has length {actual}, expected {expected}")]
    OverlayLength {
        /// The overlaid attribute.
        attribute: Attribute,
        /// The length of the view.
        expected: u64,
        /// The length of the overlay.
        actual: u64,
    },

    /// A sub-range filter was given a negative step.
    #[error("negative steps are not allowed in sub-range filters: {0}")]
    NegativeStep(i64),

    /// This string is not ASCII.
    #[error("this string is not ascii: {0}")]
    NotAscii(String),

    /// A wrapper around [point::Error].
    #[error(transparent)]
    Point(#[from] point::Error),

    /// Point access was requested on a container that skipped its points.
    #[error("the points were skipped on read and are unavailable")]
    PointsUnavailable,

    /// This string is too long for the target slice.
    #[error("string is too long for a slice of length {len}: {string}")]
    StringTooLong {
        /// The string that is too long.
        string: String,
        /// The length of the target slice.
        len: usize,
    },

    /// A feature is not supported by a version.
    #[error("feature {feature} is not supported by las {version}")]
    UnsupportedFeature {
        /// The (too-old) version.
        version: Version,
        /// The name of the feature.
        feature: &'static str,
    },

    /// A wrapper around [vlr::Error].
    #[error(transparent)]
    Vlr(#[from] vlr::Error),
}
