use crate::{point::Error, point::Format, Color, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

/// A raw point record, as defined by the las specifications.
///
/// The two generations of point layouts share a common front (coordinates and
/// intensity) and differ in how they pack their flag bits and scan angle; the
/// [Flags] and [ScanAngle] enums carry that distinction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    /// The unscaled x coordinate.
    pub x: i32,

    /// The unscaled y coordinate.
    pub y: i32,

    /// The unscaled z coordinate.
    pub z: i32,

    /// The pulse return magnitude.
    pub intensity: u16,

    /// The packed flag bytes, including the return number, classification,
    /// and assorted bit flags.
    pub flags: Flags,

    /// The angle of the laser pulse output.
    pub scan_angle: ScanAngle,

    /// Used at the user's discretion.
    pub user_data: u8,

    /// The file from which this point originated.
    pub point_source_id: u16,

    /// The time at which the point was acquired.
    pub gps_time: Option<f64>,

    /// This point's color.
    pub color: Option<Color>,

    /// This point's waveform packet.
    pub waveform: Option<Waveform>,

    /// This point's near infrared value.
    pub nir: Option<u16>,

    /// Any extra bytes trailing the defined fields.
    pub extra_bytes: Vec<u8>,
}

impl Point {
    /// Reads a raw point.
    ///
    /// If there are exactly zero bytes left in the `Read`, then this function
    /// returns `Ok(None)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::point::Format;
    /// use pointclouds::raw::Point;
    /// let mut cursor = Cursor::new(vec![0u8; 20]);
    /// let point = Point::read_from(&mut cursor, &Format::new(0).unwrap())
    ///     .unwrap()
    ///     .unwrap();
    /// assert!(Point::read_from(&mut cursor, &Format::new(0).unwrap())
    ///     .unwrap()
    ///     .is_none());
    /// ```
    pub fn read_from<R: Read>(mut read: R, format: &Format) -> Result<Option<Point>> {
        // A clean EOF before the first byte means "no more points"; running
        // out mid-record is an error.
        let first = match read.read_u8() {
            Ok(byte) => byte,
            Err(err) => match err.kind() {
                ErrorKind::UnexpectedEof => return Ok(None),
                _ => return Err(err.into()),
            },
        };
        let mut rest = [0; 3];
        read.read_exact(&mut rest)?;
        let x = i32::from_le_bytes([first, rest[0], rest[1], rest[2]]);
        let y = read.read_i32::<LittleEndian>()?;
        let z = read.read_i32::<LittleEndian>()?;
        let intensity = read.read_u16::<LittleEndian>()?;
        let (flags, scan_angle, user_data, point_source_id) = if format.is_extended {
            let a = read.read_u8()?;
            let b = read.read_u8()?;
            let c = read.read_u8()?;
            let user_data = read.read_u8()?;
            let scan_angle = read.read_i16::<LittleEndian>()?;
            let point_source_id = read.read_u16::<LittleEndian>()?;
            (
                Flags::ThreeByte(a, b, c),
                ScanAngle::Scaled(scan_angle),
                user_data,
                point_source_id,
            )
        } else {
            let a = read.read_u8()?;
            let b = read.read_u8()?;
            let scan_angle = read.read_i8()?;
            let user_data = read.read_u8()?;
            let point_source_id = read.read_u16::<LittleEndian>()?;
            (
                Flags::TwoByte(a, b),
                ScanAngle::Rank(scan_angle),
                user_data,
                point_source_id,
            )
        };
        let gps_time = if format.has_gps_time {
            Some(read.read_f64::<LittleEndian>()?)
        } else {
            None
        };
        let color = if format.has_color {
            let red = read.read_u16::<LittleEndian>()?;
            let green = read.read_u16::<LittleEndian>()?;
            let blue = read.read_u16::<LittleEndian>()?;
            Some(Color { red, green, blue })
        } else {
            None
        };
        let nir = if format.has_nir {
            Some(read.read_u16::<LittleEndian>()?)
        } else {
            None
        };
        let waveform = if format.has_waveform {
            Some(Waveform::read_from(&mut read)?)
        } else {
            None
        };
        let mut extra_bytes = vec![0; usize::from(format.extra_bytes)];
        read.read_exact(&mut extra_bytes)?;
        Ok(Some(Point {
            x,
            y,
            z,
            intensity,
            flags,
            scan_angle,
            user_data,
            point_source_id,
            gps_time,
            color,
            waveform,
            nir,
            extra_bytes,
        }))
    }

    /// Writes a raw point in canonical field order, little-endian.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::point::Format;
    /// use pointclouds::raw::Point;
    /// let mut cursor = Cursor::new(Vec::new());
    /// let point = Point::default();
    /// point.write_to(&mut cursor, &Format::new(0).unwrap()).unwrap();
    /// assert_eq!(20, cursor.into_inner().len());
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W, format: &Format) -> Result<()> {
        write.write_i32::<LittleEndian>(self.x)?;
        write.write_i32::<LittleEndian>(self.y)?;
        write.write_i32::<LittleEndian>(self.z)?;
        write.write_u16::<LittleEndian>(self.intensity)?;
        if format.is_extended {
            let (a, b, c) = self.flags.to_three_byte();
            write.write_u8(a)?;
            write.write_u8(b)?;
            write.write_u8(c)?;
            write.write_u8(self.user_data)?;
            write.write_i16::<LittleEndian>(self.scan_angle.to_scaled())?;
            write.write_u16::<LittleEndian>(self.point_source_id)?;
        } else {
            let (a, b) = self.flags.to_two_byte()?;
            write.write_u8(a)?;
            write.write_u8(b)?;
            write.write_i8(self.scan_angle.to_rank()?)?;
            write.write_u8(self.user_data)?;
            write.write_u16::<LittleEndian>(self.point_source_id)?;
        }
        if format.has_gps_time {
            let gps_time = self.gps_time.ok_or(Error::AttributesDoNotMatch {
                format: *format,
                reason: "missing gps time",
            })?;
            write.write_f64::<LittleEndian>(gps_time)?;
        }
        if format.has_color {
            let color = self.color.ok_or(Error::AttributesDoNotMatch {
                format: *format,
                reason: "missing color",
            })?;
            write.write_u16::<LittleEndian>(color.red)?;
            write.write_u16::<LittleEndian>(color.green)?;
            write.write_u16::<LittleEndian>(color.blue)?;
        }
        if format.has_nir {
            let nir = self.nir.ok_or(Error::AttributesDoNotMatch {
                format: *format,
                reason: "missing nir",
            })?;
            write.write_u16::<LittleEndian>(nir)?;
        }
        if format.has_waveform {
            let waveform = self.waveform.as_ref().ok_or(Error::AttributesDoNotMatch {
                format: *format,
                reason: "missing waveform",
            })?;
            waveform.write_to(&mut write)?;
        }
        if self.extra_bytes.len() != usize::from(format.extra_bytes) {
            return Err(Error::AttributesDoNotMatch {
                format: *format,
                reason: "extra byte count mismatch",
            }
            .into());
        }
        write.write_all(&self.extra_bytes)?;
        Ok(())
    }
}

/// The packed flag bytes of a point record.
///
/// Legacy formats (0 to 5) use two bytes, extended formats (6 to 10) use
/// three. The accessors hide the layout difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flags {
    /// Two byte flags, used by point formats 0 to 5.
    TwoByte(u8, u8),
    /// Three byte flags, used by point formats 6 to 10.
    ThreeByte(u8, u8, u8),
}

impl Flags {
    /// Returns the return number (1-based).
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::raw::Flags;
    /// assert_eq!(2, Flags::TwoByte(2, 0).return_number());
    /// assert_eq!(15, Flags::ThreeByte(0xf, 0, 0).return_number());
    /// ```
    pub fn return_number(&self) -> u8 {
        match *self {
            Flags::TwoByte(a, _) => a & 0x7,
            Flags::ThreeByte(a, _, _) => a & 0xf,
        }
    }

    /// Returns the number of returns for this pulse.
    pub fn number_of_returns(&self) -> u8 {
        match *self {
            Flags::TwoByte(a, _) => (a >> 3) & 0x7,
            Flags::ThreeByte(a, _, _) => a >> 4,
        }
    }

    /// Is the scan direction left-to-right?
    pub fn is_scan_direction_left_to_right(&self) -> bool {
        match *self {
            Flags::TwoByte(a, _) => a & 0x40 != 0,
            Flags::ThreeByte(_, b, _) => b & 0x40 != 0,
        }
    }

    /// Is this point at the edge of a flight line?
    pub fn is_edge_of_flight_line(&self) -> bool {
        match *self {
            Flags::TwoByte(a, _) => a & 0x80 != 0,
            Flags::ThreeByte(_, b, _) => b & 0x80 != 0,
        }
    }

    /// Returns the raw classification value.
    ///
    /// Legacy formats reserve only the low five bits for the classification.
    pub fn classification(&self) -> u8 {
        match *self {
            Flags::TwoByte(_, b) => b & 0x1f,
            Flags::ThreeByte(_, _, c) => c,
        }
    }

    /// Was this point created by a technique other than lidar collection?
    pub fn is_synthetic(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0x20 != 0,
            Flags::ThreeByte(_, b, _) => b & 1 != 0,
        }
    }

    /// Should this point be considered a model key-point?
    pub fn is_key_point(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0x40 != 0,
            Flags::ThreeByte(_, b, _) => b & 2 != 0,
        }
    }

    /// Should this point be considered withheld (i.e. it's deleted)?
    pub fn is_withheld(&self) -> bool {
        match *self {
            Flags::TwoByte(_, b) => b & 0x80 != 0,
            Flags::ThreeByte(_, b, _) => b & 4 != 0,
        }
    }

    /// Is this an overlap point?
    ///
    /// Legacy formats don't have a dedicated bit; classification 12 means
    /// overlap there.
    pub fn is_overlap(&self) -> bool {
        match *self {
            Flags::TwoByte(..) => self.classification() == 12,
            Flags::ThreeByte(_, b, _) => b & 8 != 0,
        }
    }

    /// Returns the scanner channel, used only in multi-channel systems.
    ///
    /// Always zero for legacy flags.
    pub fn scanner_channel(&self) -> u8 {
        match *self {
            Flags::TwoByte(..) => 0,
            Flags::ThreeByte(_, b, _) => (b >> 4) & 3,
        }
    }

    /// Converts these flags into two bytes.
    ///
    /// Returns an error if the return information doesn't fit into the legacy
    /// three-bit fields, or if the scanner channel is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::raw::Flags;
    /// assert_eq!((2, 1), Flags::ThreeByte(2, 0, 1).to_two_byte().unwrap());
    /// assert!(Flags::ThreeByte(0xf, 0, 0).to_two_byte().is_err());
    /// ```
    pub fn to_two_byte(&self) -> Result<(u8, u8)> {
        match *self {
            Flags::TwoByte(a, b) => Ok((a, b)),
            Flags::ThreeByte(..) => {
                let return_number = self.return_number();
                if return_number > 7 {
                    return Err(Error::ReturnNumber {
                        n: return_number,
                        version: None,
                    }
                    .into());
                }
                let number_of_returns = self.number_of_returns();
                if number_of_returns > 7 {
                    return Err(Error::ReturnNumber {
                        n: number_of_returns,
                        version: None,
                    }
                    .into());
                }
                if self.scanner_channel() != 0 {
                    return Err(Error::ScannerChannel(self.scanner_channel()).into());
                }
                let mut a = return_number | (number_of_returns << 3);
                if self.is_scan_direction_left_to_right() {
                    a |= 0x40;
                }
                if self.is_edge_of_flight_line() {
                    a |= 0x80;
                }
                let mut b = if self.is_overlap() {
                    12
                } else {
                    self.classification() & 0x1f
                };
                if self.is_synthetic() {
                    b |= 0x20;
                }
                if self.is_key_point() {
                    b |= 0x40;
                }
                if self.is_withheld() {
                    b |= 0x80;
                }
                Ok((a, b))
            }
        }
    }

    /// Converts these flags into three bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::raw::Flags;
    /// assert_eq!((2, 0, 1), Flags::TwoByte(2, 1).to_three_byte());
    /// ```
    pub fn to_three_byte(&self) -> (u8, u8, u8) {
        match *self {
            Flags::TwoByte(..) => {
                let a = self.return_number() | (self.number_of_returns() << 4);
                let mut b = 0;
                if self.is_synthetic() {
                    b |= 1;
                }
                if self.is_key_point() {
                    b |= 2;
                }
                if self.is_withheld() {
                    b |= 4;
                }
                if self.is_overlap() {
                    b |= 8;
                }
                if self.is_scan_direction_left_to_right() {
                    b |= 0x40;
                }
                if self.is_edge_of_flight_line() {
                    b |= 0x80;
                }
                let c = if self.is_overlap() {
                    // The classification moves to the dedicated bit.
                    1
                } else {
                    self.classification()
                };
                (a, b, c)
            }
            Flags::ThreeByte(a, b, c) => (a, b, c),
        }
    }
}

impl Default for Flags {
    fn default() -> Flags {
        Flags::TwoByte(0, 0)
    }
}

/// A point's scan angle, either the legacy rank or the extended scaled value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanAngle {
    /// A one-byte rank in degrees, used by point formats 0 to 5.
    ///
    /// Valid from -90 to 90.
    Rank(i8),
    /// A two-byte value with 0.006° increments, used by point formats 6 to 10.
    ///
    /// Valid from -30,000 to 30,000.
    Scaled(i16),
}

impl ScanAngle {
    /// Returns this scan angle in degrees.
    ///
    /// Out-of-domain raw values are surfaced with a warning but returned as
    /// computed.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::raw::ScanAngle;
    /// assert_eq!(-5., ScanAngle::Rank(-5).degrees());
    /// assert_eq!(30., ScanAngle::Scaled(5000).degrees());
    /// ```
    pub fn degrees(&self) -> f32 {
        match *self {
            ScanAngle::Rank(n) => {
                if !(-90..=90).contains(&n) {
                    log::warn!("scan angle rank {} is outside of [-90, 90]", n);
                }
                f32::from(n)
            }
            ScanAngle::Scaled(n) => {
                if !(-30_000..=30_000).contains(&n) {
                    log::warn!("scaled scan angle {} is outside of [-30000, 30000]", n);
                }
                f32::from(n) * 0.006
            }
        }
    }

    /// Creates a scan angle from degrees, scaled or not per the format.
    pub fn from_degrees(degrees: f32, is_extended: bool) -> ScanAngle {
        if is_extended {
            ScanAngle::Scaled((degrees / 0.006).round() as i16)
        } else {
            ScanAngle::Rank(degrees.round() as i8)
        }
    }

    fn to_rank(self) -> Result<i8> {
        match self {
            ScanAngle::Rank(n) => Ok(n),
            ScanAngle::Scaled(n) => Ok((f32::from(n) * 0.006).round() as i8),
        }
    }

    fn to_scaled(self) -> i16 {
        match self {
            ScanAngle::Rank(n) => (f32::from(n) / 0.006).round() as i16,
            ScanAngle::Scaled(n) => n,
        }
    }
}

impl Default for ScanAngle {
    fn default() -> ScanAngle {
        ScanAngle::Rank(0)
    }
}

/// A raw waveform packet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Waveform {
    /// The index into the waveform packet descriptor user defined records.
    pub wave_packet_descriptor_index: u8,

    /// The offset to this point's waveform data.
    pub byte_offset_to_waveform_data: u64,

    /// The size of this point's waveform packet.
    pub waveform_packet_size_in_bytes: u32,

    /// The offset in picoseconds to the location within the waveform packet
    /// that the associated return pulse was detected.
    pub return_point_waveform_location: f32,

    /// The x parametric of this waveform.
    pub x_t: f32,

    /// The y parametric of this waveform.
    pub y_t: f32,

    /// The z parametric of this waveform.
    pub z_t: f32,
}

impl Waveform {
    fn read_from<R: Read>(mut read: R) -> Result<Waveform> {
        Ok(Waveform {
            wave_packet_descriptor_index: read.read_u8()?,
            byte_offset_to_waveform_data: read.read_u64::<LittleEndian>()?,
            waveform_packet_size_in_bytes: read.read_u32::<LittleEndian>()?,
            return_point_waveform_location: read.read_f32::<LittleEndian>()?,
            x_t: read.read_f32::<LittleEndian>()?,
            y_t: read.read_f32::<LittleEndian>()?,
            z_t: read.read_f32::<LittleEndian>()?,
        })
    }

    fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_u8(self.wave_packet_descriptor_index)?;
        write.write_u64::<LittleEndian>(self.byte_offset_to_waveform_data)?;
        write.write_u32::<LittleEndian>(self.waveform_packet_size_in_bytes)?;
        write.write_f32::<LittleEndian>(self.return_point_waveform_location)?;
        write.write_f32::<LittleEndian>(self.x_t)?;
        write.write_f32::<LittleEndian>(self.y_t)?;
        write.write_f32::<LittleEndian>(self.z_t)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_eof() {
        let cursor = Cursor::new(Vec::new());
        assert!(Point::read_from(cursor, &Format::new(0).unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn read_one_byte() {
        let cursor = Cursor::new(vec![1]);
        assert!(Point::read_from(cursor, &Format::new(0).unwrap()).is_err());
    }

    #[test]
    fn write_without_gps_time() {
        let point = Point::default();
        let write = Cursor::new(Vec::new());
        assert!(point.write_to(write, &Format::new(1).unwrap()).is_err());
    }

    #[test]
    fn record_lengths() {
        for n in 0..11 {
            let format = Format::new(n).unwrap();
            let point = Point {
                flags: if format.is_extended {
                    Flags::ThreeByte(0, 0, 0)
                } else {
                    Flags::TwoByte(0, 0)
                },
                scan_angle: if format.is_extended {
                    ScanAngle::Scaled(0)
                } else {
                    ScanAngle::Rank(0)
                },
                gps_time: format.has_gps_time.then_some(1.),
                color: format.has_color.then_some(Color::default()),
                nir: format.has_nir.then_some(0),
                waveform: format.has_waveform.then_some(Waveform::default()),
                ..Default::default()
            };
            let mut cursor = Cursor::new(Vec::new());
            point.write_to(&mut cursor, &format).unwrap();
            assert_eq!(usize::from(format.len()), cursor.get_ref().len());
            cursor.set_position(0);
            let other = Point::read_from(&mut cursor, &format).unwrap().unwrap();
            assert_eq!(point, other);
        }
    }

    #[test]
    fn flags_round_trip() {
        for a in [0u8, 0x49, 0xff] {
            for b in [0u8, 0x2a, 0x9f] {
                let flags = Flags::TwoByte(a, b);
                let three = flags.to_three_byte();
                let back = Flags::ThreeByte(three.0, three.1, three.2)
                    .to_two_byte()
                    .unwrap();
                assert_eq!(flags.return_number(), back.0 & 0x7);
                assert_eq!(flags.classification(), back.1 & 0x1f);
            }
        }
    }

    #[test]
    fn overlap_moves_to_bit() {
        let flags = Flags::TwoByte(0, 12);
        assert!(flags.is_overlap());
        let (_, b, c) = flags.to_three_byte();
        assert_eq!(8, b & 8);
        assert_eq!(1, c);
        assert!(Flags::ThreeByte(0, b, c).is_overlap());
    }

    #[test]
    fn scan_angle_degrees() {
        assert_eq!(30., ScanAngle::Scaled(5000).degrees());
        assert_eq!(-90., ScanAngle::Rank(-90).degrees());
        assert_eq!(
            ScanAngle::Scaled(5000),
            ScanAngle::from_degrees(30., true)
        );
        assert_eq!(ScanAngle::Rank(30), ScanAngle::from_degrees(30., false));
    }
}
