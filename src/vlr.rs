//! Variable length records.
//!
//! A VLR is a keyed, opaque payload stored between the las header and the
//! point records. Extended variable length records (EVLRs) are stored after
//! the point records and can carry much more data; both are modelled by the
//! same [Vlr] structure, and tagged by where they are stored.

use crate::{raw, utils::AsLasStr, utils::FromLasStr, Result, Version};
use thiserror::Error;

/// The user id of the laszip VLR.
pub const LASZIP_USER_ID: &str = "laszip encoded";

/// The record id of the laszip VLR.
pub const LASZIP_RECORD_ID: u16 = 22204;

const PROJECTION_USER_ID: &str = "LASF_Projection";

/// Vlr-specific errors.
#[derive(Clone, Copy, Debug, Error)]
pub enum Error {
    /// The vlr data is too long to fit into a regular vlr.
    #[error("the vlr data is too long for a regular vlr: {0} bytes")]
    TooLong(usize),
}

/// A variable length record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vlr {
    /// The user that created this record.
    ///
    /// This value is often an official, "registered" user id, such as
    /// "LASF_Spec" or "LASF_Projection".
    pub user_id: String,

    /// This value specifies the type of record, and depends on the user id.
    pub record_id: u16,

    /// Textual description of these data.
    pub description: String,

    /// The data themselves.
    pub data: Vec<u8>,
}

impl Vlr {
    /// Creates a vlr from a raw vlr.
    ///
    /// The reserved field is checked against what the version prescribes
    /// (0xAABB for las 1.0, zero afterwards); mismatches only warn.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{raw, Version, Vlr};
    /// let vlr = Vlr::new(raw::Vlr::default(), Version::new(1, 2)).unwrap();
    /// ```
    pub fn new(raw_vlr: raw::Vlr, version: Version) -> Result<Vlr> {
        let expected = if version.minor == 0 { 0xAABB } else { 0 };
        if raw_vlr.reserved != expected {
            log::warn!(
                "vlr reserved field is {:#x}, expected {:#x} for las {}",
                raw_vlr.reserved,
                expected,
                version
            );
        }
        Ok(Vlr {
            user_id: raw_vlr.user_id.as_ref().as_las_str()?.to_string(),
            record_id: raw_vlr.record_id,
            description: raw_vlr.description.as_ref().as_las_str()?.to_string(),
            data: raw_vlr.data,
        })
    }

    /// Converts this vlr to a raw vlr.
    ///
    /// Returns an error if the data is too long for a regular vlr and
    /// `extended` is false.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Version, Vlr};
    /// let raw_vlr = Vlr::default().to_raw(false, Version::new(1, 2)).unwrap();
    /// assert_eq!(0, raw_vlr.reserved);
    /// let raw_vlr = Vlr::default().to_raw(false, Version::new(1, 0)).unwrap();
    /// assert_eq!(0xAABB, raw_vlr.reserved);
    /// ```
    pub fn to_raw(&self, extended: bool, version: Version) -> Result<raw::Vlr> {
        if !extended && self.data.len() > usize::from(u16::MAX) {
            return Err(Error::TooLong(self.data.len()).into());
        }
        let mut user_id = [0; 16];
        user_id.as_mut().from_las_str(&self.user_id)?;
        let mut description = [0; 32];
        description.as_mut().from_las_str(&self.description)?;
        Ok(raw::Vlr {
            reserved: if version.minor == 0 { 0xAABB } else { 0 },
            user_id,
            record_id: self.record_id,
            record_length_after_header: self.data.len() as u64,
            description,
            data: self.data.clone(),
        })
    }

    /// Returns the total on-disk size of this vlr, header included.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Vlr;
    /// let mut vlr = Vlr::default();
    /// assert_eq!(54, vlr.len(false));
    /// vlr.data = vec![0, 1, 2];
    /// assert_eq!(57, vlr.len(false));
    /// assert_eq!(63, vlr.len(true));
    /// ```
    pub fn len(&self, extended: bool) -> usize {
        let header = if extended {
            raw::Vlr::EXTENDED_HEADER_SIZE
        } else {
            raw::Vlr::HEADER_SIZE
        };
        self.data.len() + header as usize
    }

    /// Must this vlr be stored as an extended vlr?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Vlr;
    /// let mut vlr = Vlr::default();
    /// assert!(!vlr.has_large_data());
    /// vlr.data = vec![0; u16::MAX as usize + 1];
    /// assert!(vlr.has_large_data());
    /// ```
    pub fn has_large_data(&self) -> bool {
        self.data.len() > usize::from(u16::MAX)
    }

    /// Returns this vlr's lookup identity, `(user_id, record_id)`.
    pub fn key(&self) -> (&str, u16) {
        (&self.user_id, self.record_id)
    }

    /// Is this vlr a coordinate reference system record?
    pub fn is_projection(&self) -> bool {
        self.user_id == PROJECTION_USER_ID
    }

    /// Is this vlr the laszip compression record?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Vlr;
    /// let mut vlr = Vlr::default();
    /// assert!(!vlr.is_laszip());
    /// vlr.user_id = "laszip encoded".to_string();
    /// vlr.record_id = 22204;
    /// assert!(vlr.is_laszip());
    /// ```
    pub fn is_laszip(&self) -> bool {
        self.user_id == LASZIP_USER_ID && self.record_id == LASZIP_RECORD_ID
    }
}
