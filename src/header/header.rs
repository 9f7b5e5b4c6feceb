use crate::{
    feature::{Evlrs, GpsStandardTime, LargeFiles, SyntheticReturnNumbers, Waveforms, Wkt},
    global_encoding::GpsTime,
    header::{verify_format_is_allowed, Builder, Error},
    point::Format,
    raw,
    utils::FromLasStr,
    Bounds, GlobalEncoding, Point, Result, Transform, Vector, Version, Vlr,
};
use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

/// Metadata describing the layout, source, and interpretation of the points.
///
/// Headers are created from [Builder]s or from default settings:
///
/// ```
/// use pointclouds::{Builder, Header};
/// let header = Header::default();
/// let header = Builder::from((1, 4)).into_header().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Header {
    pub(crate) bounds: Bounds,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) evlrs: Vec<Vlr>,
    pub(crate) file_source_id: u16,
    pub(crate) generating_software: String,
    pub(crate) global_encoding: GlobalEncoding,
    pub(crate) guid: Uuid,
    pub(crate) number_of_points: u64,
    pub(crate) number_of_points_by_return: [u64; 15],
    pub(crate) padding: Vec<u8>,
    pub(crate) point_format: Format,
    pub(crate) point_padding: Vec<u8>,
    pub(crate) start_of_waveform_data_packet_record: Option<u64>,
    pub(crate) system_identifier: String,
    pub(crate) transforms: Vector<Transform>,
    pub(crate) version: Version,
    pub(crate) vlr_padding: Vec<u8>,
    pub(crate) vlrs: Vec<Vlr>,
}

impl Header {
    /// Returns this header's las version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this header's point format.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// let header = Header::default();
    /// assert_eq!(0, header.point_format().to_u8().unwrap());
    /// ```
    pub fn point_format(&self) -> &Format {
        &self.point_format
    }

    /// Returns this header's coordinate transforms.
    pub fn transforms(&self) -> &Vector<Transform> {
        &self.transforms
    }

    /// Returns this header's bounds, in scaled coordinates.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the total number of points.
    pub fn number_of_points(&self) -> u64 {
        self.number_of_points
    }

    /// Returns the number of points for a given return number (1-based).
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// let header = Header::default();
    /// assert_eq!(Some(0), header.number_of_points_by_return(1));
    /// assert_eq!(None, header.number_of_points_by_return(0));
    /// assert_eq!(None, header.number_of_points_by_return(16));
    /// ```
    pub fn number_of_points_by_return(&self, return_number: u8) -> Option<u64> {
        if (1..=15).contains(&return_number) {
            Some(self.number_of_points_by_return[usize::from(return_number) - 1])
        } else {
            None
        }
    }

    /// Returns this header's file source id.
    pub fn file_source_id(&self) -> u16 {
        self.file_source_id
    }

    /// Returns this header's global encoding flags.
    pub fn global_encoding(&self) -> GlobalEncoding {
        self.global_encoding
    }

    /// Returns this header's project guid.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// Returns this header's system identifier.
    pub fn system_identifier(&self) -> &str {
        &self.system_identifier
    }

    /// Returns the software which generated these data.
    pub fn generating_software(&self) -> &str {
        &self.generating_software
    }

    /// Returns this header's file creation date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Returns this header's variable length records.
    pub fn vlrs(&self) -> &[Vlr] {
        &self.vlrs
    }

    /// Returns a mutable reference to the variable length records.
    pub fn vlrs_mut(&mut self) -> &mut Vec<Vlr> {
        &mut self.vlrs
    }

    /// Returns this header's extended variable length records.
    pub fn evlrs(&self) -> &[Vlr] {
        &self.evlrs
    }

    /// Returns an iterator over all this header's vlrs, extended or not.
    pub fn all_vlrs(&self) -> impl Iterator<Item = &Vlr> {
        self.vlrs.iter().chain(self.evlrs.iter())
    }

    /// Looks a vlr up by its `(user_id, record_id)` identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// let header = Header::default();
    /// assert!(header.find_vlr("LASF_Projection", 34735).is_none());
    /// ```
    pub fn find_vlr(&self, user_id: &str, record_id: u16) -> Option<&Vlr> {
        self.all_vlrs()
            .find(|vlr| vlr.user_id == user_id && vlr.record_id == record_id)
    }

    /// Returns this header's padding, the opaque bytes between the header's
    /// defined fields and its declared size.
    pub fn padding(&self) -> &[u8] {
        &self.padding
    }

    /// Returns the bytes between the vlrs and the first point.
    pub fn vlr_padding(&self) -> &[u8] {
        &self.vlr_padding
    }

    /// Returns the bytes between the last point and the evlrs.
    pub fn point_padding(&self) -> &[u8] {
        &self.point_padding
    }

    /// Returns this header's size, padding included.
    pub fn header_size(&self) -> u16 {
        self.version.header_size() + self.padding.len() as u16
    }

    /// Returns the offset from the beginning of the file to the first point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// let header = Header::default();
    /// assert_eq!(227, header.offset_to_point_data());
    /// ```
    pub fn offset_to_point_data(&self) -> u32 {
        let vlrs: usize = self.vlrs.iter().map(|vlr| vlr.len(false)).sum();
        u32::from(self.header_size())
            + vlrs as u32
            + self.vlr_padding.len() as u32
            + if self.version.requires_point_data_start_signature() {
                raw::POINT_DATA_START_SIGNATURE.len() as u32
            } else {
                0
            }
    }

    /// Clears this header's point counts and bounds.
    ///
    /// The writer does this before re-deriving both from the points it
    /// writes.
    pub fn clear(&mut self) {
        self.number_of_points = 0;
        self.number_of_points_by_return = [0; 15];
        self.bounds = Bounds::default();
    }

    /// Folds a point into the counts and bounds.
    pub fn add_point(&mut self, point: &Point) {
        self.number_of_points += 1;
        if (1..=15).contains(&point.return_number) {
            self.number_of_points_by_return[usize::from(point.return_number) - 1] += 1;
        }
        self.bounds.grow(point);
    }

    /// Checks the point counts against the version's limits.
    ///
    /// Las 1.3 and below can only count to `u32::MAX`, and per-return counts
    /// can never exceed the total.
    pub fn validate_counts(&self) -> Result<()> {
        if !self.version.supports::<LargeFiles>() && self.number_of_points > u64::from(u32::MAX) {
            return Err(Error::TooManyPoints {
                n: self.number_of_points,
                version: self.version,
            }
            .into());
        }
        let k = if self.point_format.is_extended { 15 } else { 5 };
        let sum: u64 = self.number_of_points_by_return[..k].iter().sum();
        if self
            .number_of_points_by_return
            .iter()
            .any(|&n| n > self.number_of_points)
            || sum > self.number_of_points
        {
            return Err(Error::ReturnCounts {
                counts: self.number_of_points_by_return,
                len: self.number_of_points,
            }
            .into());
        }
        Ok(())
    }

    /// Converts this header into a raw header.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// let raw_header = Header::default().to_raw().unwrap();
    /// assert_eq!(b"LASF", &raw_header.file_signature);
    /// ```
    pub fn to_raw(&self) -> Result<raw::Header> {
        verify_format_is_allowed(self.point_format, self.version)?;
        let mut system_identifier = [0; 32];
        system_identifier
            .as_mut()
            .from_las_str(&self.system_identifier)?;
        let mut generating_software = [0; 32];
        generating_software
            .as_mut()
            .from_las_str(&self.generating_software)?;
        if self.vlrs.len() > u32::MAX as usize {
            return Err(Error::TooManyVlrs(self.vlrs.len()).into());
        }
        self.validate_counts()?;
        let use_legacy_counts = !self.point_format.is_extended
            && self.number_of_points <= u64::from(u32::MAX)
            && self.number_of_points_by_return[5..].iter().all(|&n| n == 0);
        let number_of_point_records = if use_legacy_counts {
            self.number_of_points as u32
        } else {
            0
        };
        let mut number_of_points_by_return = [0; 5];
        if use_legacy_counts {
            for (legacy, &n) in number_of_points_by_return
                .iter_mut()
                .zip(&self.number_of_points_by_return[..5])
            {
                *legacy = n as u32;
            }
        }
        let evlr = if self.version.supports::<Evlrs>() && !self.evlrs.is_empty() {
            Some(raw::Evlr {
                start_of_first_evlr: u64::from(self.offset_to_point_data())
                    + self.number_of_points * u64::from(self.point_format.len())
                    + self.point_padding.len() as u64,
                number_of_evlrs: self.evlrs.len() as u32,
            })
        } else {
            if !self.evlrs.is_empty() {
                self.version.verify_support_for::<Evlrs>()?;
            }
            None
        };
        let mut large_file = None;
        if self.version.supports::<LargeFiles>() {
            large_file = Some(raw::LargeFile {
                number_of_point_records: self.number_of_points,
                number_of_points_by_return: self.number_of_points_by_return,
            });
        }
        Ok(raw::Header {
            file_signature: raw::LASF,
            file_source_id: self.file_source_id,
            global_encoding: self.global_encoding.into(),
            guid: self.guid.to_bytes_le(),
            version: self.version,
            system_identifier,
            generating_software,
            file_creation_day_of_year: self.date.map_or(0, |d| d.ordinal() as u16),
            file_creation_year: self.date.map_or(0, |d| d.year() as u16),
            header_size: self.header_size(),
            offset_to_point_data: self.offset_to_point_data(),
            number_of_variable_length_records: self.vlrs.len() as u32,
            point_data_record_format: self.point_format.to_writable_u8()?,
            point_data_record_length: self.point_format.len(),
            number_of_point_records,
            number_of_points_by_return,
            x_scale_factor: self.transforms.x.scale,
            y_scale_factor: self.transforms.y.scale,
            z_scale_factor: self.transforms.z.scale,
            x_offset: self.transforms.x.offset,
            y_offset: self.transforms.y.offset,
            z_offset: self.transforms.z.offset,
            max_x: self.bounds.max.x,
            min_x: self.bounds.min.x,
            max_y: self.bounds.max.y,
            min_y: self.bounds.min.y,
            max_z: self.bounds.max.z,
            min_z: self.bounds.min.z,
            start_of_waveform_data_packet_record: if self.version.supports::<Waveforms>() {
                Some(self.start_of_waveform_data_packet_record.unwrap_or(0))
            } else {
                None
            },
            evlr,
            large_file,
            padding: self.padding.clone(),
        })
    }

    /// Warns about global encoding flags that predate their standardization.
    pub(crate) fn warn_on_premature_features(&self) {
        if self.global_encoding.gps_time == GpsTime::Standard
            && !self.version.supports::<GpsStandardTime>()
        {
            log::warn!(
                "adjusted standard gps time was standardized after las {}",
                self.version
            );
        }
        if (self.global_encoding.has_internal_waveforms
            || self.global_encoding.has_external_waveforms)
            && !self.version.supports::<Waveforms>()
        {
            log::warn!("waveform flags were standardized after las {}", self.version);
        }
        if self.global_encoding.has_synthetic_return_numbers
            && !self.version.supports::<SyntheticReturnNumbers>()
        {
            log::warn!(
                "the synthetic return numbers flag was standardized after las {}",
                self.version
            );
        }
        if self.global_encoding.has_wkt_crs && !self.version.supports::<Wkt>() {
            log::warn!("the wkt flag was standardized after las {}", self.version);
        }
    }
}

impl Default for Header {
    fn default() -> Header {
        Builder::default()
            .into_header()
            .expect("the default builder corresponds to a valid header")
    }
}

impl From<Version> for Header {
    /// Creates a header for the given version, with default settings
    /// otherwise.
    fn from(version: Version) -> Header {
        Builder::from(version)
            .into_header()
            .expect("a default builder for a known version is valid")
    }
}

impl From<(u8, u8)> for Header {
    fn from(version: (u8, u8)) -> Header {
        Header::from(Version::from(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_point_data_with_vlrs() {
        let mut builder = Builder::default();
        builder.vlrs.push(Vlr {
            data: vec![0; 10],
            ..Default::default()
        });
        let header = builder.into_header().unwrap();
        assert_eq!(227 + 54 + 10, header.offset_to_point_data());
    }

    #[test]
    fn add_point_tracks_returns() {
        let mut header = Header::default();
        header.clear();
        header.add_point(&Point {
            return_number: 2,
            ..Default::default()
        });
        assert_eq!(1, header.number_of_points());
        assert_eq!(Some(1), header.number_of_points_by_return(2));
    }

    #[test]
    fn too_many_points_for_legacy() {
        let mut header = Header::default();
        header.number_of_points = u64::from(u32::MAX) + 1;
        assert!(header.validate_counts().is_err());
        let mut header = Header::from((1, 4));
        header.number_of_points = u64::from(u32::MAX) + 1;
        assert!(header.validate_counts().is_ok());
    }

    #[test]
    fn return_counts_exceed_total() {
        let mut header = Header::default();
        header.number_of_points = 1;
        header.number_of_points_by_return[0] = 2;
        assert!(header.validate_counts().is_err());
    }

    #[test]
    fn legacy_counts_zeroed_for_extended_formats() {
        let mut builder = Builder::from((1, 4));
        builder.point_format = Format::new(6).unwrap();
        let mut header = builder.into_header().unwrap();
        header.number_of_points = 42;
        header.number_of_points_by_return[0] = 42;
        let raw_header = header.to_raw().unwrap();
        assert_eq!(0, raw_header.number_of_point_records);
        assert_eq!([0; 5], raw_header.number_of_points_by_return);
        assert_eq!(
            42,
            raw_header.large_file.unwrap().number_of_point_records
        );
    }

    #[test]
    fn guid_round_trip() {
        let mut builder = Builder::default();
        builder.guid = Uuid::new_v4();
        let header = builder.clone().into_header().unwrap();
        let raw_header = header.to_raw().unwrap();
        let other = Builder::new(raw_header).unwrap();
        assert_eq!(builder.guid, other.guid);
    }
}
