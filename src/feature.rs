//! Programmatically determine whether a las version supports a feature.
//!
//! Features are structures that implement the [Feature] trait. The most common
//! way to use features is via [Version::supports](crate::Version::supports) or
//! [Version::verify_support_for](crate::Version::verify_support_for):
//!
//! ```
//! use pointclouds::feature::Waveforms;
//! use pointclouds::Version;
//!
//! let las_1_2 = Version::new(1, 2);
//! assert!(!las_1_2.supports::<Waveforms>());
//! assert!(las_1_2.verify_support_for::<Waveforms>().is_err());
//!
//! let las_1_4 = Version::new(1, 4);
//! assert!(las_1_4.supports::<Waveforms>());
//! assert!(las_1_4.verify_support_for::<Waveforms>().is_ok());
//! ```

use crate::Version;

const MAJOR: u8 = 1;

/// A trait implemented by each feature.
pub trait Feature {
    /// Is this feature supported by this version?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::feature::{Feature, Waveforms};
    /// use pointclouds::Version;
    /// assert!(!Waveforms::is_supported_by(Version::new(1, 2)));
    /// assert!(Waveforms::is_supported_by(Version::new(1, 4)));
    /// ```
    fn is_supported_by(version: Version) -> bool;

    /// Returns the name of this feature.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::feature::{Feature, Waveforms};
    /// assert_eq!("Waveforms", Waveforms::name());
    /// ```
    fn name() -> &'static str;
}

macro_rules! features {
    (   $(
            $(#[$meta:meta])*
            $name:ident ($($minors:expr),+);
        )+
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug)]
            pub struct $name {}

            impl Feature for $name {
                fn is_supported_by(version: Version) -> bool {
                    version.major == MAJOR && [$($minors),+].contains(&version.minor)
                }

                fn name() -> &'static str {
                    stringify!($name)
                }
            }
        )+
    }
}

features! {
    /// Does this version allow a file source id on the header?
    FileSourceId(1, 2, 3, 4);
    /// Does this version support synthetic return numbers?
    SyntheticReturnNumbers(3, 4);
    /// Does this version support adjusted standard GPS time?
    GpsStandardTime(2, 3, 4);
    /// Does this version support waveform packets?
    Waveforms(3, 4);
    /// Does this version support 64-bit point counts?
    LargeFiles(4);
    /// Does this version support extended variable length records?
    Evlrs(4);
    /// Does this version support coordinate reference systems in well-known text?
    Wkt(4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_id() {
        assert!(!FileSourceId::is_supported_by(Version::new(1, 0)));
        assert!(FileSourceId::is_supported_by(Version::new(1, 1)));
    }

    #[test]
    fn large_files() {
        assert!(!LargeFiles::is_supported_by(Version::new(1, 3)));
        assert!(LargeFiles::is_supported_by(Version::new(1, 4)));
    }

    #[test]
    fn wrong_major() {
        assert!(!Evlrs::is_supported_by(Version::new(2, 4)));
    }
}
