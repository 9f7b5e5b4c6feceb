use crate::{
    header::Error,
    point::Format,
    raw,
    utils::AsLasStr,
    Bounds, GlobalEncoding, Header, Result, Transform, Vector, Version, Vlr,
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Builds headers.
///
/// The builder is the permissive half of the header pipeline: it accepts any
/// [raw::Header] it can make sense of, downgrading the quirks of real-world
/// files to warnings, and only [Builder::into_header] enforces the
/// cross-field rules.
#[derive(Clone, Debug)]
pub struct Builder {
    /// The date of file creation.
    pub date: Option<NaiveDate>,

    /// The extended variable length records.
    pub evlrs: Vec<Vlr>,

    /// The file source id, sometimes the flight line.
    pub file_source_id: u16,

    /// The software that created this file.
    pub generating_software: String,

    /// The global encoding flag bits.
    pub global_encoding: GlobalEncoding,

    /// A globally unique identifier.
    pub guid: Uuid,

    /// Bytes after the header but before the vlrs.
    pub padding: Vec<u8>,

    /// The format that the points will be written in.
    pub point_format: Format,

    /// The bytes after the points but before any evlrs.
    ///
    /// Discouraged.
    pub point_padding: Vec<u8>,

    /// The offset to the first byte of the waveform data package record.
    pub start_of_waveform_data_packet_record: Option<u64>,

    /// The system that generated the points.
    pub system_identifier: String,

    /// The scales and offsets used to convert coordinates to and from i32s.
    pub transforms: Vector<Transform>,

    /// The las version.
    pub version: Version,

    /// The bytes after the vlrs but before the points.
    pub vlr_padding: Vec<u8>,

    /// The variable length records.
    pub vlrs: Vec<Vlr>,

    number_of_points: u64,
    number_of_points_by_return: [u64; 15],
    bounds: Bounds,
}

impl Builder {
    /// Creates a new builder from a raw header.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Builder;
    /// let builder = Builder::new(Default::default()).unwrap();
    /// ```
    pub fn new(raw_header: raw::Header) -> Result<Builder> {
        let version = raw_header.version;
        if version.major != 1 || version.minor > 4 {
            log::warn!("unknown las version {}, continuing anyway", version);
        } else if raw_header.header_size < version.header_size() {
            log::warn!(
                "header size {} is below the las {} header size of {}",
                raw_header.header_size,
                version,
                version.header_size()
            );
        }
        let number_of_points = if raw_header.number_of_point_records > 0 {
            u64::from(raw_header.number_of_point_records)
        } else {
            raw_header
                .large_file
                .map(|l| l.number_of_point_records)
                .unwrap_or(0)
        };
        let number_of_points_by_return =
            if raw_header.number_of_points_by_return.iter().any(|&n| n > 0) {
                let mut counts = [0u64; 15];
                for (count, &legacy) in counts.iter_mut().zip(&raw_header.number_of_points_by_return)
                {
                    *count = u64::from(legacy);
                }
                counts
            } else {
                raw_header
                    .large_file
                    .map(|l| l.number_of_points_by_return)
                    .unwrap_or([0; 15])
            };
        let point_format = Format::from_record_length(
            raw_header.point_data_record_format,
            raw_header.point_data_record_length,
        )?;
        Ok(Builder {
            date: NaiveDate::from_yo_opt(
                i32::from(raw_header.file_creation_year),
                u32::from(raw_header.file_creation_day_of_year),
            ),
            evlrs: Vec::new(),
            file_source_id: raw_header.file_source_id,
            generating_software: raw_header
                .generating_software
                .as_ref()
                .as_las_str()?
                .to_string(),
            global_encoding: raw_header.global_encoding.into(),
            guid: Uuid::from_bytes_le(raw_header.guid),
            padding: raw_header.padding,
            point_format,
            point_padding: Vec::new(),
            start_of_waveform_data_packet_record: raw_header
                .start_of_waveform_data_packet_record,
            system_identifier: raw_header
                .system_identifier
                .as_ref()
                .as_las_str()?
                .to_string(),
            transforms: Vector {
                x: Transform {
                    scale: raw_header.x_scale_factor,
                    offset: raw_header.x_offset,
                },
                y: Transform {
                    scale: raw_header.y_scale_factor,
                    offset: raw_header.y_offset,
                },
                z: Transform {
                    scale: raw_header.z_scale_factor,
                    offset: raw_header.z_offset,
                },
            },
            version,
            vlr_padding: Vec::new(),
            vlrs: Vec::new(),
            number_of_points,
            number_of_points_by_return,
            bounds: Bounds {
                min: Vector {
                    x: raw_header.min_x,
                    y: raw_header.min_y,
                    z: raw_header.min_z,
                },
                max: Vector {
                    x: raw_header.max_x,
                    y: raw_header.max_y,
                    z: raw_header.max_z,
                },
            },
        })
    }

    /// Returns the point count carried over from the raw header.
    pub fn number_of_points(&self) -> u64 {
        self.number_of_points
    }

    /// Converts this builder into a [Header].
    ///
    /// The laszip vlr, if present, is absorbed into the point format's
    /// `is_compressed` flag and removed from the logical record list; it is
    /// reconstructed when writing compressed data.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Builder;
    /// let header = Builder::default().into_header().unwrap();
    /// ```
    pub fn into_header(mut self) -> Result<Header> {
        use crate::feature::FileSourceId;

        let mut point_format = self.point_format;
        if let Some(position) = self.vlrs.iter().position(|vlr| vlr.is_laszip()) {
            let _ = self.vlrs.remove(position);
            point_format.is_compressed = true;
        }
        if self.file_source_id != 0 {
            if let Err(err) = self.version.verify_support_for::<FileSourceId>() {
                log::warn!("{}", err);
            }
        }
        if !self.evlrs.is_empty() {
            self.version.verify_support_for::<crate::feature::Evlrs>()?;
        }
        if self.padding.len() > usize::from(u16::MAX - self.version.header_size()) {
            return Err(Error::TooSmall(u16::MAX).into());
        }
        let header = Header {
            bounds: self.bounds,
            date: self.date,
            evlrs: self.evlrs,
            file_source_id: self.file_source_id,
            generating_software: self.generating_software,
            global_encoding: self.global_encoding,
            guid: self.guid,
            number_of_points: self.number_of_points,
            number_of_points_by_return: self.number_of_points_by_return,
            padding: self.padding,
            point_format,
            point_padding: self.point_padding,
            start_of_waveform_data_packet_record: self.start_of_waveform_data_packet_record,
            system_identifier: self.system_identifier,
            transforms: self.transforms,
            version: self.version,
            vlr_padding: self.vlr_padding,
            vlrs: self.vlrs,
        };
        header.warn_on_premature_features();
        Ok(header)
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder {
            date: None,
            evlrs: Vec::new(),
            file_source_id: 0,
            generating_software: format!("pointclouds {}", env!("CARGO_PKG_VERSION")),
            global_encoding: GlobalEncoding::default(),
            guid: Uuid::nil(),
            padding: Vec::new(),
            point_format: Format::default(),
            point_padding: Vec::new(),
            start_of_waveform_data_packet_record: None,
            system_identifier: "pointclouds".to_string(),
            transforms: Vector::default(),
            version: Version::default(),
            vlr_padding: Vec::new(),
            vlrs: Vec::new(),
            number_of_points: 0,
            number_of_points_by_return: [0; 15],
            bounds: Bounds::default(),
        }
    }
}

impl From<Version> for Builder {
    fn from(version: Version) -> Builder {
        Builder {
            version,
            ..Default::default()
        }
    }
}

impl From<(u8, u8)> for Builder {
    fn from(version: (u8, u8)) -> Builder {
        Builder::from(Version::from(version))
    }
}
