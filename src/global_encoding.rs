//! Global properties about LAS data.

use std::fmt;

const GPS_TIME_MASK: u16 = 1;
const WAVEFORM_INTERNAL_MASK: u16 = 2;
const WAVEFORM_EXTERNAL_MASK: u16 = 4;
const SYNTHETIC_RETURN_NUMBERS_MASK: u16 = 8;
const WKT_MASK: u16 = 16;

/// Global properties about the file.
///
/// Introduced as a bit field in LAS 1.2 with just the GPS time type, and grown
/// since: waveform storage flags in 1.3, the WKT flag in 1.4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalEncoding {
    /// The gps time definition.
    pub gps_time: GpsTime,

    /// Are the waveform data packets stored inside this file?
    ///
    /// Deprecated in LAS 1.4, and mutually exclusive with
    /// `has_external_waveforms`.
    pub has_internal_waveforms: bool,

    /// Are the waveform data packets stored in an auxiliary `.wdp` file?
    pub has_external_waveforms: bool,

    /// Have the return numbers been synthetically generated?
    ///
    /// This could be the case, for example, when a composite file is created
    /// by combining a first return file and a last return file.
    pub has_synthetic_return_numbers: bool,

    /// Is the coordinate reference system stored as well-known text?
    ///
    /// If not set, the CRS is GeoTIFF.
    pub has_wkt_crs: bool,
}

impl From<u16> for GlobalEncoding {
    fn from(n: u16) -> GlobalEncoding {
        GlobalEncoding {
            gps_time: if n & GPS_TIME_MASK == GPS_TIME_MASK {
                GpsTime::Standard
            } else {
                GpsTime::Week
            },
            has_internal_waveforms: n & WAVEFORM_INTERNAL_MASK == WAVEFORM_INTERNAL_MASK,
            has_external_waveforms: n & WAVEFORM_EXTERNAL_MASK == WAVEFORM_EXTERNAL_MASK,
            has_synthetic_return_numbers: n & SYNTHETIC_RETURN_NUMBERS_MASK
                == SYNTHETIC_RETURN_NUMBERS_MASK,
            has_wkt_crs: n & WKT_MASK == WKT_MASK,
        }
    }
}

impl From<GlobalEncoding> for u16 {
    fn from(global_encoding: GlobalEncoding) -> u16 {
        let mut n = match global_encoding.gps_time {
            GpsTime::Week => 0,
            GpsTime::Standard => GPS_TIME_MASK,
        };
        if global_encoding.has_internal_waveforms {
            n |= WAVEFORM_INTERNAL_MASK;
        }
        if global_encoding.has_external_waveforms {
            n |= WAVEFORM_EXTERNAL_MASK;
        }
        if global_encoding.has_synthetic_return_numbers {
            n |= SYNTHETIC_RETURN_NUMBERS_MASK;
        }
        if global_encoding.has_wkt_crs {
            n |= WKT_MASK;
        }
        n
    }
}

/// The GPS time type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpsTime {
    /// GPS time in the point records is GPS week time.
    ///
    /// This is the same as all time records in LAS 1.0 and 1.1.
    #[default]
    Week,
    /// GPS time is standard GPS time (satellite GPS time) minus 1e9.
    Standard,
}

impl fmt::Display for GpsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GpsTime::Week => write!(f, "GPS week time"),
            GpsTime::Standard => write!(f, "GPS standard time"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_time_type() {
        assert_eq!(GpsTime::Week, GlobalEncoding::from(0).gps_time);
        assert_eq!(GpsTime::Standard, GlobalEncoding::from(1).gps_time);
        assert_eq!(0u16, u16::from(GlobalEncoding::from(0)));
        assert_eq!(1u16, u16::from(GlobalEncoding::from(1)));
    }

    #[test]
    fn all_bits_round_trip() {
        for n in 0..32u16 {
            assert_eq!(n, u16::from(GlobalEncoding::from(n)));
        }
    }

    #[test]
    fn wkt() {
        assert!(GlobalEncoding::from(16).has_wkt_crs);
        assert!(!GlobalEncoding::from(15).has_wkt_crs);
    }
}
