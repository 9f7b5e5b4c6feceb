//! A runtime vocabulary for point attributes.
//!
//! [Attribute] names every field a point record can carry, across all eleven
//! point formats. [Attribute::read] decodes one field straight out of a raw
//! record byte slice without materialising the record, which is what the
//! memory-mapped view uses for column extraction.

use crate::point::Format;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// A named point attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Attribute {
    /// The raw (unscaled) x coordinate.
    X,
    /// The raw (unscaled) y coordinate.
    Y,
    /// The raw (unscaled) z coordinate.
    Z,
    Intensity,
    ReturnNumber,
    NumberOfReturns,
    ScanDirection,
    IsEdgeOfFlightLine,
    Classification,
    IsSynthetic,
    IsKeyPoint,
    IsWithheld,
    IsOverlap,
    ScannerChannel,
    /// The scan angle in degrees.
    ScanAngle,
    UserData,
    PointSourceId,
    GpsTime,
    Red,
    Green,
    Blue,
    Nir,
}

/// A dynamically typed attribute or column value.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A fixed-length tuple of point indices, used for neighbor tables.
    Indices(Vec<u64>),
}

/// The type tag of a [Value].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ValueKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Indices,
}

impl Value {
    /// Returns this value's type tag.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Indices(_) => ValueKind::Indices,
        }
    }

    /// Converts this value to an f64, if it is numeric.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Value;
    /// assert_eq!(Some(2.), Value::U16(2).to_f64());
    /// assert_eq!(None, Value::Bool(true).to_f64());
    /// ```
    pub fn to_f64(&self) -> Option<f64> {
        match *self {
            Value::U8(n) => Some(f64::from(n)),
            Value::U16(n) => Some(f64::from(n)),
            Value::U32(n) => Some(f64::from(n)),
            Value::U64(n) => Some(n as f64),
            Value::I8(n) => Some(f64::from(n)),
            Value::I16(n) => Some(f64::from(n)),
            Value::I32(n) => Some(f64::from(n)),
            Value::I64(n) => Some(n as f64),
            Value::F32(n) => Some(f64::from(n)),
            Value::F64(n) => Some(n),
            Value::Bool(_) | Value::Indices(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Attribute {
    /// Returns this attribute's canonical lowercase name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Attribute;
    /// assert_eq!("gps_time", Attribute::GpsTime.name());
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::X => "x",
            Attribute::Y => "y",
            Attribute::Z => "z",
            Attribute::Intensity => "intensity",
            Attribute::ReturnNumber => "return_number",
            Attribute::NumberOfReturns => "number_of_returns",
            Attribute::ScanDirection => "scan_direction",
            Attribute::IsEdgeOfFlightLine => "is_edge_of_flight_line",
            Attribute::Classification => "classification",
            Attribute::IsSynthetic => "is_synthetic",
            Attribute::IsKeyPoint => "is_key_point",
            Attribute::IsWithheld => "is_withheld",
            Attribute::IsOverlap => "is_overlap",
            Attribute::ScannerChannel => "scanner_channel",
            Attribute::ScanAngle => "scan_angle",
            Attribute::UserData => "user_data",
            Attribute::PointSourceId => "point_source_id",
            Attribute::GpsTime => "gps_time",
            Attribute::Red => "red",
            Attribute::Green => "green",
            Attribute::Blue => "blue",
            Attribute::Nir => "nir",
        }
    }

    /// Looks an attribute up by its canonical name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Attribute;
    /// assert_eq!(Some(Attribute::Intensity), Attribute::from_name("intensity"));
    /// assert_eq!(None, Attribute::from_name("no_such_attribute"));
    /// ```
    pub fn from_name(name: &str) -> Option<Attribute> {
        ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Does a record of the given format carry this attribute?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Format};
    /// let format = Format::new(0).unwrap();
    /// assert!(Attribute::Intensity.exists_in(&format));
    /// assert!(!Attribute::GpsTime.exists_in(&format));
    /// ```
    pub fn exists_in(&self, format: &Format) -> bool {
        match self {
            Attribute::GpsTime => format.has_gps_time,
            Attribute::Red | Attribute::Green | Attribute::Blue => format.has_color,
            Attribute::Nir => format.has_nir,
            Attribute::ScannerChannel => format.is_extended,
            _ => true,
        }
    }

    /// Returns the type tag this attribute decodes to, or `None` if the format
    /// doesn't carry it.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Format, ValueKind};
    /// let format = Format::new(1).unwrap();
    /// assert_eq!(Some(ValueKind::F64), Attribute::GpsTime.kind(&format));
    /// assert_eq!(None, Attribute::Red.kind(&format));
    /// ```
    pub fn kind(&self, format: &Format) -> Option<ValueKind> {
        if !self.exists_in(format) {
            return None;
        }
        Some(match self {
            Attribute::X | Attribute::Y | Attribute::Z => ValueKind::I32,
            Attribute::Intensity
            | Attribute::PointSourceId
            | Attribute::Red
            | Attribute::Green
            | Attribute::Blue
            | Attribute::Nir => ValueKind::U16,
            Attribute::ReturnNumber
            | Attribute::NumberOfReturns
            | Attribute::ScanDirection
            | Attribute::Classification
            | Attribute::ScannerChannel
            | Attribute::UserData => ValueKind::U8,
            Attribute::IsEdgeOfFlightLine
            | Attribute::IsSynthetic
            | Attribute::IsKeyPoint
            | Attribute::IsWithheld
            | Attribute::IsOverlap => ValueKind::Bool,
            Attribute::ScanAngle => ValueKind::F32,
            Attribute::GpsTime => ValueKind::F64,
        })
    }

    /// Decodes this attribute from a raw record byte slice.
    ///
    /// The slice must be exactly one record long. Returns `None` when the
    /// format doesn't carry the attribute; scalar reads never allocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Format, Value};
    /// let format = Format::new(0).unwrap();
    /// let mut record = vec![0u8; 20];
    /// record[12] = 42; // intensity, little-endian
    /// assert_eq!(
    ///     Some(Value::U16(42)),
    ///     Attribute::Intensity.read(&format, &record)
    /// );
    /// assert_eq!(None, Attribute::GpsTime.read(&format, &record));
    /// ```
    pub fn read(&self, format: &Format, bytes: &[u8]) -> Option<Value> {
        if !self.exists_in(format) {
            return None;
        }
        let extended = format.is_extended;
        Some(match self {
            Attribute::X => Value::I32(LittleEndian::read_i32(&bytes[0..4])),
            Attribute::Y => Value::I32(LittleEndian::read_i32(&bytes[4..8])),
            Attribute::Z => Value::I32(LittleEndian::read_i32(&bytes[8..12])),
            Attribute::Intensity => Value::U16(LittleEndian::read_u16(&bytes[12..14])),
            Attribute::ReturnNumber => Value::U8(if extended {
                bytes[14] & 0xf
            } else {
                bytes[14] & 0x7
            }),
            Attribute::NumberOfReturns => Value::U8(if extended {
                bytes[14] >> 4
            } else {
                (bytes[14] >> 3) & 0x7
            }),
            Attribute::ScanDirection => Value::U8(if extended {
                (bytes[15] >> 6) & 1
            } else {
                (bytes[14] >> 6) & 1
            }),
            Attribute::IsEdgeOfFlightLine => Value::Bool(if extended {
                bytes[15] & 0x80 != 0
            } else {
                bytes[14] & 0x80 != 0
            }),
            Attribute::Classification => Value::U8(if extended {
                bytes[16]
            } else {
                bytes[15] & 0x1f
            }),
            Attribute::IsSynthetic => Value::Bool(if extended {
                bytes[15] & 1 != 0
            } else {
                bytes[15] & 0x20 != 0
            }),
            Attribute::IsKeyPoint => Value::Bool(if extended {
                bytes[15] & 2 != 0
            } else {
                bytes[15] & 0x40 != 0
            }),
            Attribute::IsWithheld => Value::Bool(if extended {
                bytes[15] & 4 != 0
            } else {
                bytes[15] & 0x80 != 0
            }),
            Attribute::IsOverlap => Value::Bool(if extended {
                bytes[15] & 8 != 0
            } else {
                // Legacy formats store overlap as classification 12.
                bytes[15] & 0x1f == 12
            }),
            Attribute::ScannerChannel => Value::U8((bytes[15] >> 4) & 3),
            Attribute::ScanAngle => Value::F32(if extended {
                f32::from(LittleEndian::read_i16(&bytes[18..20])) * 0.006
            } else {
                f32::from(bytes[16] as i8)
            }),
            Attribute::UserData => Value::U8(bytes[17]),
            Attribute::PointSourceId => Value::U16(if extended {
                LittleEndian::read_u16(&bytes[20..22])
            } else {
                LittleEndian::read_u16(&bytes[18..20])
            }),
            Attribute::GpsTime => {
                let offset = format.gps_time_offset()?;
                Value::F64(LittleEndian::read_f64(&bytes[offset..offset + 8]))
            }
            Attribute::Red => {
                let offset = format.color_offset()?;
                Value::U16(LittleEndian::read_u16(&bytes[offset..offset + 2]))
            }
            Attribute::Green => {
                let offset = format.color_offset()?;
                Value::U16(LittleEndian::read_u16(&bytes[offset + 2..offset + 4]))
            }
            Attribute::Blue => {
                let offset = format.color_offset()?;
                Value::U16(LittleEndian::read_u16(&bytes[offset + 4..offset + 6]))
            }
            Attribute::Nir => {
                let offset = format.nir_offset()?;
                Value::U16(LittleEndian::read_u16(&bytes[offset..offset + 2]))
            }
        })
    }

    /// Returns the normalized intensity, `raw / u16::MAX`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Format};
    /// let mut record = vec![0u8; 20];
    /// record[12] = 0xff;
    /// record[13] = 0xff;
    /// let normalized = Attribute::normalized_intensity(&Format::default(), &record);
    /// assert_eq!(1., normalized);
    /// ```
    pub fn normalized_intensity(format: &Format, bytes: &[u8]) -> f64 {
        match Attribute::Intensity.read(format, bytes) {
            Some(Value::U16(n)) => f64::from(n) / f64::from(u16::MAX),
            _ => unreachable!("every format has intensity"),
        }
    }
}

const ALL: [Attribute; 22] = [
    Attribute::X,
    Attribute::Y,
    Attribute::Z,
    Attribute::Intensity,
    Attribute::ReturnNumber,
    Attribute::NumberOfReturns,
    Attribute::ScanDirection,
    Attribute::IsEdgeOfFlightLine,
    Attribute::Classification,
    Attribute::IsSynthetic,
    Attribute::IsKeyPoint,
    Attribute::IsWithheld,
    Attribute::IsOverlap,
    Attribute::ScannerChannel,
    Attribute::ScanAngle,
    Attribute::UserData,
    Attribute::PointSourceId,
    Attribute::GpsTime,
    Attribute::Red,
    Attribute::Green,
    Attribute::Blue,
    Attribute::Nir,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_record() -> Vec<u8> {
        let mut bytes = vec![0u8; 28];
        LittleEndian::write_i32(&mut bytes[0..4], 100);
        LittleEndian::write_i32(&mut bytes[4..8], -200);
        LittleEndian::write_i32(&mut bytes[8..12], 300);
        LittleEndian::write_u16(&mut bytes[12..14], 7);
        bytes[14] = 0b1101_1010; // edge, left-to-right, 3 returns, return number 2
        bytes[15] = 0b0010_1100; // synthetic, classification 12 (overlap)
        bytes[16] = (-5i8) as u8;
        bytes[17] = 42;
        LittleEndian::write_u16(&mut bytes[18..20], 17);
        LittleEndian::write_f64(&mut bytes[20..28], 1.5);
        bytes
    }

    #[test]
    fn legacy_fields() {
        let format = Format::new(1).unwrap();
        let bytes = legacy_record();
        assert_eq!(
            Some(Value::I32(100)),
            Attribute::X.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::I32(-200)),
            Attribute::Y.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U16(7)),
            Attribute::Intensity.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(2)),
            Attribute::ReturnNumber.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(3)),
            Attribute::NumberOfReturns.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(1)),
            Attribute::ScanDirection.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::Bool(true)),
            Attribute::IsEdgeOfFlightLine.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(12)),
            Attribute::Classification.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::Bool(true)),
            Attribute::IsSynthetic.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::Bool(true)),
            Attribute::IsOverlap.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::F32(-5.)),
            Attribute::ScanAngle.read(&format, &bytes)
        );
        assert_eq!(Some(Value::U8(42)), Attribute::UserData.read(&format, &bytes));
        assert_eq!(
            Some(Value::U16(17)),
            Attribute::PointSourceId.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::F64(1.5)),
            Attribute::GpsTime.read(&format, &bytes)
        );
        assert_eq!(None, Attribute::Red.read(&format, &bytes));
        assert_eq!(None, Attribute::ScannerChannel.read(&format, &bytes));
    }

    #[test]
    fn extended_fields() {
        let format = Format::new(6).unwrap();
        let mut bytes = vec![0u8; 30];
        bytes[14] = 0b0011_0010; // 3 returns, return number 2
        bytes[15] = 0b1110_1000; // edge, left-to-right, channel 2, overlap
        bytes[16] = 200;
        LittleEndian::write_i16(&mut bytes[18..20], 5000);
        assert_eq!(
            Some(Value::U8(2)),
            Attribute::ReturnNumber.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(3)),
            Attribute::NumberOfReturns.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(200)),
            Attribute::Classification.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::Bool(true)),
            Attribute::IsOverlap.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::U8(2)),
            Attribute::ScannerChannel.read(&format, &bytes)
        );
        assert_eq!(
            Some(Value::Bool(true)),
            Attribute::IsEdgeOfFlightLine.read(&format, &bytes)
        );
        let scan_angle = Attribute::ScanAngle.read(&format, &bytes).unwrap();
        match scan_angle {
            Value::F32(degrees) => assert!((degrees - 30.).abs() < 1e-6),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn name_round_trip() {
        for attribute in ALL {
            assert_eq!(Some(attribute), Attribute::from_name(attribute.name()));
        }
    }
}
