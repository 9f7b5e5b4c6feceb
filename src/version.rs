use crate::feature::Feature;
use crate::{Error, Result};
use std::fmt;

/// A LAS version.
///
/// Defaults to 1.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// The major version.
    ///
    /// Should always be 1.
    pub major: u8,

    /// The minor version.
    ///
    /// Should be between 0 and 4.
    pub minor: u8,
}

impl Version {
    /// Creates a new version.
    ///
    /// Doesn't do any checking that its an actual las version.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Version;
    /// let version = Version::new(1, 2);
    /// ```
    pub fn new(major: u8, minor: u8) -> Version {
        Version { major, minor }
    }

    /// Does this version support the feature?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::feature::Waveforms;
    /// use pointclouds::Version;
    /// assert!(!Version::new(1, 2).supports::<Waveforms>());
    /// assert!(Version::new(1, 3).supports::<Waveforms>());
    /// ```
    pub fn supports<F: Feature>(&self) -> bool {
        F::is_supported_by(*self)
    }

    /// Checks whether this version supports the feature, returning an error if not.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::feature::Waveforms;
    /// use pointclouds::Version;
    /// assert!(Version::new(1, 2).verify_support_for::<Waveforms>().is_err());
    /// assert!(Version::new(1, 3).verify_support_for::<Waveforms>().is_ok());
    /// ```
    pub fn verify_support_for<F: Feature>(&self) -> Result<()> {
        if self.supports::<F>() {
            Ok(())
        } else {
            Err(Error::UnsupportedFeature {
                version: *self,
                feature: F::name(),
            })
        }
    }

    /// Returns this version's header size.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Version;
    /// assert_eq!(227, Version::new(1, 2).header_size());
    /// assert_eq!(235, Version::new(1, 3).header_size());
    /// assert_eq!(375, Version::new(1, 4).header_size());
    /// ```
    pub fn header_size(&self) -> u16 {
        match self.minor {
            3 => 235,
            4 => 375,
            _ => 227,
        }
    }

    /// Does this version require the point data start signature?
    ///
    /// Only 1.0 does.
    ///
    /// ```
    /// use pointclouds::Version;
    /// assert!(Version::new(1, 0).requires_point_data_start_signature());
    /// assert!(!Version::new(1, 1).requires_point_data_start_signature());
    /// ```
    pub fn requires_point_data_start_signature(&self) -> bool {
        *self == Version::new(1, 0)
    }
}

impl Default for Version {
    fn default() -> Version {
        Version { major: 1, minor: 2 }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl From<(u8, u8)> for Version {
    fn from((major, minor): (u8, u8)) -> Version {
        Version { major, minor }
    }
}

impl From<Version> for (u8, u8) {
    fn from(version: Version) -> (u8, u8) {
        (version.major, version.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Version::new(1, 4) > Version::new(1, 2));
        assert!(Version::new(1, 0) < Version::new(1, 1));
        assert!(Version::new(2, 0) > Version::new(1, 4));
    }

    #[test]
    fn header_sizes() {
        for minor in 0..3 {
            assert_eq!(227, Version::new(1, minor).header_size());
        }
        assert_eq!(235, Version::new(1, 3).header_size());
        assert_eq!(375, Version::new(1, 4).header_size());
    }
}
