use crate::{
    point::{Attribute, Classification, Error, Format, ScanDirection, Value},
    raw, Color, Result, Transform, Vector,
};

/// A point is the basic unit of information in las data.
///
/// A point's coordinates have already had their scale and offset applied, and
/// its packed flag bytes are unpacked into their logical members. Use
/// [Point::new] to ingest a [raw::Point] and [Point::into_raw] to turn it back
/// into one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    /// The x coordinate, as a float.
    pub x: f64,

    /// The y coordinate, as a float.
    pub y: f64,

    /// The z coordinate, as a float.
    pub z: f64,

    /// The integer representation of the pulse return magnitude.
    ///
    /// This value is optional and system specific, but should be included
    /// when available. Because zero is valid intensity, it is not wrapped in
    /// an `Option`.
    pub intensity: u16,

    /// The pulse return number for a given output pulse.
    pub return_number: u8,

    /// The total number of returns for a given pulse.
    pub number_of_returns: u8,

    /// The direction at which the scanner mirror was traveling at the time of
    /// the output pulse.
    pub scan_direction: ScanDirection,

    /// True if the point is at the end of a scan.
    pub is_edge_of_flight_line: bool,

    /// The ASPRS classification for this point.
    pub classification: Classification,

    /// This point was created by a technique other than lidar collection.
    pub is_synthetic: bool,

    /// The point should be considered a model key-point.
    pub is_key_point: bool,

    /// The point should be considered withheld (i.e. it's deleted).
    pub is_withheld: bool,

    /// Is this an overlap point?
    ///
    /// Legacy point formats encode this as classification 12; extended
    /// formats carry a dedicated bit.
    pub is_overlap: bool,

    /// The channel of the scanner, used only in multi-channel systems.
    pub scanner_channel: u8,

    /// The angle of the output of the laser pulse, in degrees.
    ///
    /// Zero degrees is nadir, -90° is to the left.
    pub scan_angle: f32,

    /// Used at the user's discretion.
    pub user_data: u8,

    /// The file from which this point originated.
    pub point_source_id: u16,

    /// The time at which the point was acquired.
    pub gps_time: Option<f64>,

    /// This point's color.
    pub color: Option<Color>,

    /// This point's waveform information.
    pub waveform: Option<raw::Waveform>,

    /// This point's near infrared value.
    pub nir: Option<u16>,

    /// This point's extra bytes.
    pub extra_bytes: Vec<u8>,
}

impl Point {
    /// Creates a point from a raw point and the coordinate transforms.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{raw, Point};
    /// let point = Point::new(raw::Point::default(), &Default::default());
    /// ```
    pub fn new(mut raw_point: raw::Point, transforms: &Vector<Transform>) -> Point {
        let classification_code = raw_point.flags.classification();
        let is_overlap = raw_point.flags.is_overlap() || classification_code == 12;
        let classification = if classification_code == 12 {
            Classification::Unclassified
        } else {
            // The overlap code is filtered out above, so this can't error.
            Classification::new(classification_code).unwrap_or(Classification::Unclassified)
        };
        Point {
            x: transforms.x.direct(raw_point.x),
            y: transforms.y.direct(raw_point.y),
            z: transforms.z.direct(raw_point.z),
            intensity: raw_point.intensity,
            return_number: raw_point.flags.return_number(),
            number_of_returns: raw_point.flags.number_of_returns(),
            scan_direction: if raw_point.flags.is_scan_direction_left_to_right() {
                ScanDirection::LeftToRight
            } else {
                ScanDirection::RightToLeft
            },
            is_edge_of_flight_line: raw_point.flags.is_edge_of_flight_line(),
            classification,
            is_synthetic: raw_point.flags.is_synthetic(),
            is_key_point: raw_point.flags.is_key_point(),
            is_withheld: raw_point.flags.is_withheld(),
            is_overlap,
            scanner_channel: raw_point.flags.scanner_channel(),
            scan_angle: raw_point.scan_angle.degrees(),
            user_data: raw_point.user_data,
            point_source_id: raw_point.point_source_id,
            gps_time: raw_point.gps_time,
            color: raw_point.color,
            waveform: raw_point.waveform,
            nir: raw_point.nir,
            extra_bytes: std::mem::take(&mut raw_point.extra_bytes),
        }
    }

    /// Converts this point into a raw point for the given format.
    ///
    /// Returns an error if the point's attributes don't fit the format, e.g.
    /// a return number past the legacy three-bit field, or a missing gps
    /// time.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::Point;
    /// let point = Point { x: 1., ..Default::default() };
    /// let raw_point = point
    ///     .into_raw(&Default::default(), &Format::new(0).unwrap())
    ///     .unwrap();
    /// ```
    pub fn into_raw(
        self,
        transforms: &Vector<Transform>,
        format: &Format,
    ) -> Result<raw::Point> {
        self.matches(format)?;
        let flags = self.flags(format)?;
        Ok(raw::Point {
            x: transforms.x.inverse(self.x)?,
            y: transforms.y.inverse(self.y)?,
            z: transforms.z.inverse(self.z)?,
            intensity: self.intensity,
            flags,
            scan_angle: raw::ScanAngle::from_degrees(self.scan_angle, format.is_extended),
            user_data: self.user_data,
            point_source_id: self.point_source_id,
            gps_time: self.gps_time,
            color: self.color,
            waveform: self.waveform,
            nir: self.nir,
            extra_bytes: self.extra_bytes,
        })
    }

    /// Do this point's attributes match the format's?
    ///
    /// E.g. a point with a color matches formats with colors, and one without
    /// does not.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::{Color, Point};
    /// let format = Format::new(2).unwrap();
    /// let mut point = Point::default();
    /// assert!(point.matches(&format).is_err());
    /// point.color = Some(Color::default());
    /// assert!(point.matches(&format).is_ok());
    /// ```
    pub fn matches(&self, format: &Format) -> Result<()> {
        let mismatch = |reason| {
            Err(Error::AttributesDoNotMatch {
                format: *format,
                reason,
            }
            .into())
        };
        if format.has_gps_time != self.gps_time.is_some() {
            return mismatch("gps time");
        }
        if format.has_color != self.color.is_some() {
            return mismatch("color");
        }
        if format.has_nir != self.nir.is_some() {
            return mismatch("nir");
        }
        if format.has_waveform != self.waveform.is_some() {
            return mismatch("waveform");
        }
        if usize::from(format.extra_bytes) != self.extra_bytes.len() {
            return mismatch("extra bytes");
        }
        Ok(())
    }

    /// Returns the value of a named attribute on this point.
    ///
    /// Unlike [Attribute::read], which decodes raw bytes, this operates in
    /// the cooked space: coordinates are scaled floats and the scan angle is
    /// in degrees. Attributes the point doesn't carry yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Value};
    /// use pointclouds::Point;
    /// let point = Point { x: 1., ..Default::default() };
    /// assert_eq!(Some(Value::F64(1.)), point.value_of(Attribute::X));
    /// assert_eq!(None, point.value_of(Attribute::GpsTime));
    /// ```
    pub fn value_of(&self, attribute: Attribute) -> Option<Value> {
        Some(match attribute {
            Attribute::X => Value::F64(self.x),
            Attribute::Y => Value::F64(self.y),
            Attribute::Z => Value::F64(self.z),
            Attribute::Intensity => Value::U16(self.intensity),
            Attribute::ReturnNumber => Value::U8(self.return_number),
            Attribute::NumberOfReturns => Value::U8(self.number_of_returns),
            Attribute::ScanDirection => Value::U8(u8::from(self.scan_direction)),
            Attribute::IsEdgeOfFlightLine => Value::Bool(self.is_edge_of_flight_line),
            Attribute::Classification => Value::U8(u8::from(self.classification)),
            Attribute::IsSynthetic => Value::Bool(self.is_synthetic),
            Attribute::IsKeyPoint => Value::Bool(self.is_key_point),
            Attribute::IsWithheld => Value::Bool(self.is_withheld),
            Attribute::IsOverlap => Value::Bool(self.is_overlap),
            Attribute::ScannerChannel => Value::U8(self.scanner_channel),
            Attribute::ScanAngle => Value::F32(self.scan_angle),
            Attribute::UserData => Value::U8(self.user_data),
            Attribute::PointSourceId => Value::U16(self.point_source_id),
            Attribute::GpsTime => Value::F64(self.gps_time?),
            Attribute::Red => Value::U16(self.color?.red),
            Attribute::Green => Value::U16(self.color?.green),
            Attribute::Blue => Value::U16(self.color?.blue),
            Attribute::Nir => Value::U16(self.nir?),
        })
    }

    fn flags(&self, format: &Format) -> Result<raw::Flags> {
        let overflow = |n| Error::ReturnNumber { n, version: None };
        if format.is_extended {
            if self.return_number > 15 {
                return Err(overflow(self.return_number).into());
            }
            if self.number_of_returns > 15 {
                return Err(overflow(self.number_of_returns).into());
            }
            if self.scanner_channel > 3 {
                return Err(Error::ScannerChannel(self.scanner_channel).into());
            }
            let a = self.return_number | (self.number_of_returns << 4);
            let mut b = 0;
            if self.is_synthetic {
                b |= 1;
            }
            if self.is_key_point {
                b |= 2;
            }
            if self.is_withheld {
                b |= 4;
            }
            if self.is_overlap {
                b |= 8;
            }
            b |= self.scanner_channel << 4;
            if self.scan_direction == ScanDirection::LeftToRight {
                b |= 0x40;
            }
            if self.is_edge_of_flight_line {
                b |= 0x80;
            }
            Ok(raw::Flags::ThreeByte(a, b, self.classification.into()))
        } else {
            if self.return_number > 7 {
                return Err(overflow(self.return_number).into());
            }
            if self.number_of_returns > 7 {
                return Err(overflow(self.number_of_returns).into());
            }
            if self.scanner_channel != 0 {
                return Err(Error::ScannerChannel(self.scanner_channel).into());
            }
            let classification = u8::from(self.classification);
            if classification > 31 {
                return Err(Error::Classification(classification).into());
            }
            let mut a = self.return_number | (self.number_of_returns << 3);
            if self.scan_direction == ScanDirection::LeftToRight {
                a |= 0x40;
            }
            if self.is_edge_of_flight_line {
                a |= 0x80;
            }
            let mut b = if self.is_overlap { 12 } else { classification };
            if self.is_synthetic {
                b |= 0x20;
            }
            if self.is_key_point {
                b |= 0x40;
            }
            if self.is_withheld {
                b |= 0x80;
            }
            Ok(raw::Flags::TwoByte(a, b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_round_trip() {
        let transforms = Vector {
            x: Transform {
                scale: 0.01,
                offset: 100.,
            },
            y: Transform {
                scale: 0.01,
                offset: -100.,
            },
            z: Transform {
                scale: 0.01,
                offset: 0.,
            },
        };
        let point = Point {
            x: 101.23,
            y: -98.77,
            z: 1.23,
            ..Default::default()
        };
        let raw_point = point
            .clone()
            .into_raw(&transforms, &Format::new(0).unwrap())
            .unwrap();
        assert_eq!(123, raw_point.x);
        assert_eq!(123, raw_point.y);
        assert_eq!(123, raw_point.z);
        let other = Point::new(raw_point, &transforms);
        assert!((point.x - other.x).abs() < 1e-9);
        assert!((point.y - other.y).abs() < 1e-9);
        assert!((point.z - other.z).abs() < 1e-9);
    }

    #[test]
    fn overlap_legacy() {
        let point = Point {
            is_overlap: true,
            ..Default::default()
        };
        let raw_point = point
            .into_raw(&Default::default(), &Format::new(0).unwrap())
            .unwrap();
        assert_eq!(12, raw_point.flags.classification());
        let other = Point::new(raw_point, &Default::default());
        assert!(other.is_overlap);
        assert_eq!(Classification::Unclassified, other.classification);
    }

    #[test]
    fn overlap_extended() {
        let point = Point {
            is_overlap: true,
            classification: Classification::Ground,
            gps_time: Some(0.),
            ..Default::default()
        };
        let raw_point = point
            .into_raw(&Default::default(), &Format::new(6).unwrap())
            .unwrap();
        assert!(raw_point.flags.is_overlap());
        assert_eq!(2, raw_point.flags.classification());
        let other = Point::new(raw_point, &Default::default());
        assert!(other.is_overlap);
        assert_eq!(Classification::Ground, other.classification);
    }

    #[test]
    fn return_number_overflow() {
        let point = Point {
            return_number: 8,
            ..Default::default()
        };
        assert!(point
            .into_raw(&Default::default(), &Format::new(0).unwrap())
            .is_err());
        let point = Point {
            return_number: 8,
            gps_time: Some(0.),
            ..Default::default()
        };
        assert!(point
            .into_raw(&Default::default(), &Format::new(6).unwrap())
            .is_ok());
    }

    #[test]
    fn mismatched_attributes() {
        let point = Point::default();
        assert!(point
            .clone()
            .into_raw(&Default::default(), &Format::new(1).unwrap())
            .is_err());
        let point = Point {
            gps_time: Some(1.),
            ..Default::default()
        };
        assert!(point
            .into_raw(&Default::default(), &Format::new(1).unwrap())
            .is_ok());
    }
}
