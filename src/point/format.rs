use crate::{point::Error, Result};
use std::fmt;

const TIME_FORMATS: &[u8] = &[1, 3, 4, 5, 6, 7, 8, 9, 10];
const COLOR_FORMATS: &[u8] = &[2, 3, 5, 7, 8, 10];
const WAVEFORM_FORMATS: &[u8] = &[4, 5, 9, 10];
const NIR_FORMATS: &[u8] = &[8, 10];
const IS_COMPRESSED_MASK: u8 = 0x80;

/// Point formats are defined by the las spec.
///
/// As of las 1.4, there are eleven point formats (0-10). A new [Format] can be
/// created from its code and converted back into it:
///
/// ```
/// use pointclouds::point::Format;
///
/// let format_1 = Format::new(1).unwrap();
/// assert!(format_1.has_gps_time);
/// assert_eq!(1, format_1.to_u8().unwrap());
///
/// assert!(Format::new(11).is_err());
/// ```
///
/// Point formats can have extra bytes, which are user-defined attributes on
/// every record:
///
/// ```
/// use pointclouds::point::Format;
/// let mut format = Format::new(0).unwrap();
/// format.extra_bytes = 1;
/// assert_eq!(21, format.len());
/// ```
///
/// Certain combinations of attributes in a point format are illegal, e.g. gps
/// time is required for all formats >= 6:
///
/// ```
/// use pointclouds::point::Format;
/// let mut format = Format::new(6).unwrap();
/// format.has_gps_time = false;
/// assert!(format.to_u8().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Format {
    /// Does this point format include gps time?
    pub has_gps_time: bool,
    /// Does this point format include red, green, and blue colors?
    pub has_color: bool,
    /// Does this point format use three bytes for its flags and a scaled scan
    /// angle?
    pub is_extended: bool,
    /// Does this point format have waveforms?
    pub has_waveform: bool,
    /// Does this point format have near infrared data?
    pub has_nir: bool,
    /// The number of extra bytes on each point.
    pub extra_bytes: u16,
    /// Is this point format compressed?
    pub is_compressed: bool,
}

#[allow(clippy::len_without_is_empty)]
impl Format {
    /// Creates a new point format from a u8.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// let format = Format::new(0).unwrap();
    /// assert!(!format.has_gps_time);
    /// assert!(!format.has_color);
    ///
    /// let format = Format::new(3).unwrap();
    /// assert!(format.has_gps_time);
    /// assert!(format.has_color);
    ///
    /// assert!(Format::new(11).is_err());
    /// ```
    pub fn new(n: u8) -> Result<Format> {
        let is_compressed = n & IS_COMPRESSED_MASK == IS_COMPRESSED_MASK;
        let n = n & !IS_COMPRESSED_MASK;
        if n > 10 {
            Err(Error::FormatNumber(n).into())
        } else {
            Ok(Format {
                has_gps_time: TIME_FORMATS.contains(&n),
                has_color: COLOR_FORMATS.contains(&n),
                has_waveform: WAVEFORM_FORMATS.contains(&n),
                has_nir: NIR_FORMATS.contains(&n),
                is_extended: n >= 6,
                extra_bytes: 0,
                is_compressed,
            })
        }
    }

    /// Creates a point format from its code and the on-disk record length.
    ///
    /// The surplus over the format's base size becomes extra bytes. Returns an
    /// error if the record length is below the base size.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// let format = Format::from_record_length(0, 23).unwrap();
    /// assert_eq!(3, format.extra_bytes);
    /// assert!(Format::from_record_length(0, 19).is_err());
    /// ```
    pub fn from_record_length(n: u8, len: u16) -> Result<Format> {
        let mut format = Format::new(n)?;
        let base = format.len();
        if len < base {
            Err(Error::RecordLength { format, len }.into())
        } else {
            format.extra_bytes = len - base;
            Ok(format)
        }
    }

    /// Converts this point format into an extended format.
    ///
    /// "Extended" formats can contain more information per point, and must
    /// have gps time.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// let mut format = Format::default();
    /// format.extend();
    /// assert!(format.has_gps_time);
    /// assert!(format.is_extended);
    /// ```
    pub fn extend(&mut self) {
        self.has_gps_time = true;
        self.is_extended = true;
    }

    /// Returns this point format's length, extra bytes included.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// let mut format = Format::new(0).unwrap();
    /// assert_eq!(20, format.len());
    /// format.has_gps_time = true;
    /// assert_eq!(28, format.len());
    /// ```
    pub fn len(&self) -> u16 {
        let mut len = if self.is_extended { 30 } else { 20 } + self.extra_bytes;
        if self.has_gps_time && !self.is_extended {
            len += 8;
        }
        if self.has_color {
            len += 6;
        }
        if self.has_nir {
            len += 2;
        }
        if self.has_waveform {
            len += 29;
        }
        len
    }

    /// Returns the byte offset of the gps time, if this format has one.
    pub(crate) fn gps_time_offset(&self) -> Option<usize> {
        if !self.has_gps_time {
            None
        } else if self.is_extended {
            Some(22)
        } else {
            Some(20)
        }
    }

    /// Returns the byte offset of the red color channel, if this format has
    /// color.
    pub(crate) fn color_offset(&self) -> Option<usize> {
        if !self.has_color {
            None
        } else if self.is_extended {
            Some(30)
        } else if self.has_gps_time {
            Some(28)
        } else {
            Some(20)
        }
    }

    /// Returns the byte offset of the near infrared channel.
    pub(crate) fn nir_offset(&self) -> Option<usize> {
        if self.has_nir {
            Some(36)
        } else {
            None
        }
    }

    /// Returns the byte offset of the waveform packet.
    pub(crate) fn waveform_offset(&self) -> Option<usize> {
        if !self.has_waveform {
            None
        } else if self.is_extended {
            if self.has_nir {
                Some(38)
            } else {
                Some(30)
            }
        } else if self.has_color {
            Some(34)
        } else {
            Some(28)
        }
    }

    /// Returns the byte offset of the extra bytes.
    pub(crate) fn extra_bytes_offset(&self) -> usize {
        usize::from(self.len() - self.extra_bytes)
    }

    /// Converts this point format to a u8.
    ///
    /// Can return an error if there is an invalid combination of attributes.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// let mut format = Format::default();
    /// assert_eq!(0, format.to_u8().unwrap());
    /// format.is_extended = true;
    /// assert!(format.to_u8().is_err());
    /// format.has_gps_time = true;
    /// assert_eq!(6, format.to_u8().unwrap());
    /// ```
    pub fn to_u8(&self) -> Result<u8> {
        if self.is_extended {
            if !self.has_gps_time {
                Err(Error::Format(*self).into())
            } else if self.has_nir && !self.has_color {
                Err(Error::Format(*self).into())
            } else if self.has_waveform {
                match (self.has_color, self.has_nir) {
                    (false, false) => Ok(9),
                    (true, true) => Ok(10),
                    _ => Err(Error::Format(*self).into()),
                }
            } else {
                match (self.has_color, self.has_nir) {
                    (false, false) => Ok(6),
                    (true, false) => Ok(7),
                    (true, true) => Ok(8),
                    _ => unreachable!(),
                }
            }
        } else if self.has_nir {
            Err(Error::Format(*self).into())
        } else if self.has_waveform {
            if !self.has_gps_time {
                Err(Error::Format(*self).into())
            } else if self.has_color {
                Ok(5)
            } else {
                Ok(4)
            }
        } else {
            let mut n = u8::from(self.has_gps_time);
            if self.has_color {
                n += 2;
            }
            Ok(n)
        }
    }

    /// When the data is compressed (LAZ) the point format id written in the
    /// header has its high bit set to let readers know the data is compressed.
    pub(crate) fn to_writable_u8(self) -> Result<u8> {
        self.to_u8().map(|n| {
            if self.is_compressed {
                n | IS_COMPRESSED_MASK
            } else {
                n
            }
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(n) = self.to_u8() {
            write!(f, "point format {}", n)
        } else {
            write!(f, "point format that does not map onto a code: {:?}", self)
        }
    }
}
