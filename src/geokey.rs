//! The GeoTIFF-style coordinate reference system descriptor.
//!
//! Las files that don't use well-known text store their CRS as a GeoKey
//! directory spread over as many as three vlrs: the directory itself
//! (record id 34735), an optional pool of doubles (34736), and an optional
//! pool of ASCII data (34737). [GeoKeyDirectory::parse] stitches the three
//! back together into a typed key → value map.

use crate::{Result, Vlr};
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

const DIRECTORY_RECORD_ID: u16 = 34735;
const DOUBLE_PARAMS_RECORD_ID: u16 = 34736;
const ASCII_PARAMS_RECORD_ID: u16 = 34737;

const GT_MODEL_TYPE: u16 = 1024;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_CITATION: u16 = 2049;
const PROJECTED_CS_TYPE: u16 = 3072;
const PCS_CITATION: u16 = 3073;
const PROJ_LINEAR_UNITS: u16 = 3076;

/// GeoKey-specific errors.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The key directory data is not a whole number of eight-byte entries.
    #[error("the geokey directory is corrupt: {0} bytes")]
    CorruptDirectory(usize),

    /// A key references a parameter vlr that is not present.
    #[error("geokey {key_id} references missing parameter record {record_id}")]
    MissingParameter {
        /// The referencing key.
        key_id: u16,
        /// The record id of the absent vlr.
        record_id: u16,
    },

    /// A key references data outside its parameter pool.
    #[error("geokey {key_id} is out of bounds of parameter record {record_id}")]
    OutOfBounds {
        /// The referencing key.
        key_id: u16,
        /// The record id of the too-short vlr.
        record_id: u16,
    },

    /// The model type can't be translated to well-known text.
    #[error("cannot build wkt for this coordinate reference system")]
    UnsupportedCrs,
}

/// A single geokey and its decoded value.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    /// The key id, e.g. 3072 for the projected CRS type.
    pub id: u16,

    /// The decoded value.
    pub value: GeoKeyValue,
}

/// The value of a geokey.
///
/// Every key falls in one of three value categories: unsigned short, double,
/// or ASCII string. Shorts in the EPSG code range are tagged.
#[derive(Clone, Debug, PartialEq)]
pub enum GeoKeyValue {
    /// A plain unsigned short.
    Short(u16),
    /// An unsigned short in the EPSG code range (1024..32766).
    Epsg(u16),
    /// One or more doubles from the double parameter pool.
    Doubles(Vec<f64>),
    /// An ASCII value from the ASCII parameter pool.
    Ascii(String),
}

impl GeoKeyValue {
    /// Returns the EPSG code, if this value is one.
    pub fn epsg(&self) -> Option<u16> {
        match *self {
            GeoKeyValue::Epsg(code) => Some(code),
            _ => None,
        }
    }

    /// Returns the short value, EPSG-tagged or not.
    pub fn short(&self) -> Option<u16> {
        match *self {
            GeoKeyValue::Short(n) | GeoKeyValue::Epsg(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the string value, if this is an ASCII key.
    pub fn ascii(&self) -> Option<&str> {
        match self {
            GeoKeyValue::Ascii(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// The decoded geokey directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoKeyDirectory {
    /// The directory version triple, usually (1, 1, 0).
    pub version: (u16, u16, u16),

    /// The decoded keys, in directory order.
    pub keys: Vec<GeoKey>,
}

impl GeoKeyDirectory {
    /// Parses the geokey directory from a set of vlrs.
    ///
    /// Returns `Ok(None)` if there is no directory vlr. Returns an error if a
    /// key references a parameter vlr that isn't there.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::geokey::GeoKeyDirectory;
    /// assert!(GeoKeyDirectory::parse(&[]).unwrap().is_none());
    /// ```
    pub fn parse(vlrs: &[Vlr]) -> Result<Option<GeoKeyDirectory>> {
        let directory = match vlrs
            .iter()
            .find(|vlr| vlr.is_projection() && vlr.record_id == DIRECTORY_RECORD_ID)
        {
            Some(vlr) => vlr,
            None => return Ok(None),
        };
        let doubles = vlrs
            .iter()
            .find(|vlr| vlr.is_projection() && vlr.record_id == DOUBLE_PARAMS_RECORD_ID)
            .map(|vlr| {
                let mut doubles = vec![0.; vlr.data.len() / 8];
                LittleEndian::read_f64_into(&vlr.data[..doubles.len() * 8], &mut doubles);
                doubles
            });
        let ascii = vlrs
            .iter()
            .find(|vlr| vlr.is_projection() && vlr.record_id == ASCII_PARAMS_RECORD_ID)
            .map(|vlr| vlr.data.as_slice());

        if directory.data.len() % 8 != 0 || directory.data.len() < 8 {
            return Err(Error::CorruptDirectory(directory.data.len()).into());
        }
        let mut shorts = vec![0u16; directory.data.len() / 2];
        LittleEndian::read_u16_into(&directory.data, &mut shorts);
        let version = (shorts[0], shorts[1], shorts[2]);
        let number_of_keys = usize::from(shorts[3]);
        let available = (shorts.len() - 4) / 4;
        if number_of_keys > available {
            log::warn!(
                "geokey directory declares {} keys but only holds {}",
                number_of_keys,
                available
            );
        }
        let mut keys = Vec::with_capacity(number_of_keys.min(available));
        for entry in shorts[4..].chunks_exact(4).take(number_of_keys) {
            let [id, location, count, offset] = [entry[0], entry[1], entry[2], entry[3]];
            let value = match location {
                0 => {
                    if (1024..32766).contains(&offset) {
                        GeoKeyValue::Epsg(offset)
                    } else {
                        GeoKeyValue::Short(offset)
                    }
                }
                DOUBLE_PARAMS_RECORD_ID => {
                    let doubles = doubles.as_ref().ok_or(Error::MissingParameter {
                        key_id: id,
                        record_id: DOUBLE_PARAMS_RECORD_ID,
                    })?;
                    let start = usize::from(offset);
                    let end = start + usize::from(count);
                    if end > doubles.len() {
                        return Err(Error::OutOfBounds {
                            key_id: id,
                            record_id: DOUBLE_PARAMS_RECORD_ID,
                        }
                        .into());
                    }
                    GeoKeyValue::Doubles(doubles[start..end].to_vec())
                }
                ASCII_PARAMS_RECORD_ID => {
                    let ascii = ascii.ok_or(Error::MissingParameter {
                        key_id: id,
                        record_id: ASCII_PARAMS_RECORD_ID,
                    })?;
                    let start = usize::from(offset);
                    let end = start + usize::from(count);
                    if end > ascii.len() {
                        return Err(Error::OutOfBounds {
                            key_id: id,
                            record_id: ASCII_PARAMS_RECORD_ID,
                        }
                        .into());
                    }
                    // Ascii values are pipe-terminated.
                    let s = String::from_utf8_lossy(&ascii[start..end]);
                    GeoKeyValue::Ascii(s.trim_end_matches('|').to_string())
                }
                DIRECTORY_RECORD_ID => {
                    let start = usize::from(offset);
                    let end = start + usize::from(count);
                    if end > shorts.len() {
                        return Err(Error::OutOfBounds {
                            key_id: id,
                            record_id: DIRECTORY_RECORD_ID,
                        }
                        .into());
                    }
                    match &shorts[start..end] {
                        &[n] if (1024..32766).contains(&n) => GeoKeyValue::Epsg(n),
                        &[n] => GeoKeyValue::Short(n),
                        ns => {
                            log::warn!("geokey {} holds {} shorts, keeping the first", id, ns.len());
                            GeoKeyValue::Short(ns.first().copied().unwrap_or(0))
                        }
                    }
                }
                _ => {
                    log::warn!("geokey {} has unknown tag location {}", id, location);
                    GeoKeyValue::Short(offset)
                }
            };
            keys.push(GeoKey { id, value });
        }
        Ok(Some(GeoKeyDirectory { version, keys }))
    }

    /// Looks a key up by id.
    pub fn get(&self, id: u16) -> Option<&GeoKeyValue> {
        self.keys.iter().find(|key| key.id == id).map(|key| &key.value)
    }

    /// Returns the horizontal EPSG code, if one is defined.
    ///
    /// Projected systems take precedence over geographic ones.
    pub fn epsg(&self) -> Option<u16> {
        self.get(PROJECTED_CS_TYPE)
            .and_then(GeoKeyValue::epsg)
            .or_else(|| self.get(GEOGRAPHIC_TYPE).and_then(GeoKeyValue::epsg))
    }

    /// Builds a best-effort well-known text representation.
    ///
    /// Only the common model types (projected 2D and geographic 2D) are
    /// supported; everything else yields an error and the caller should fall
    /// back to the raw key set.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::geokey::{GeoKey, GeoKeyDirectory, GeoKeyValue};
    /// let directory = GeoKeyDirectory {
    ///     version: (1, 1, 0),
    ///     keys: vec![
    ///         GeoKey { id: 1024, value: GeoKeyValue::Short(1) },
    ///         GeoKey { id: 3072, value: GeoKeyValue::Epsg(32755) },
    ///     ],
    /// };
    /// let wkt = directory.to_wkt().unwrap();
    /// assert!(wkt.starts_with("PROJCS["));
    /// assert!(wkt.contains("32755"));
    /// ```
    pub fn to_wkt(&self) -> Result<String> {
        let model_type = self
            .get(GT_MODEL_TYPE)
            .and_then(GeoKeyValue::short)
            .ok_or(Error::UnsupportedCrs)?;
        match model_type {
            1 => {
                let code = self
                    .get(PROJECTED_CS_TYPE)
                    .and_then(GeoKeyValue::short)
                    .ok_or(Error::UnsupportedCrs)?;
                let name = self
                    .get(PCS_CITATION)
                    .or_else(|| self.get(GT_CITATION))
                    .and_then(GeoKeyValue::ascii)
                    .unwrap_or("unnamed");
                let unit = match self.get(PROJ_LINEAR_UNITS).and_then(GeoKeyValue::short) {
                    Some(9002) => "UNIT[\"foot\",0.3048]",
                    Some(9003) => "UNIT[\"US survey foot\",0.3048006096012192]",
                    _ => "UNIT[\"metre\",1]",
                };
                Ok(format!(
                    "PROJCS[\"{}\",{},AUTHORITY[\"EPSG\",\"{}\"]]",
                    name, unit, code
                ))
            }
            2 => {
                let code = self
                    .get(GEOGRAPHIC_TYPE)
                    .and_then(GeoKeyValue::short)
                    .ok_or(Error::UnsupportedCrs)?;
                let name = self
                    .get(GEOG_CITATION)
                    .or_else(|| self.get(GT_CITATION))
                    .and_then(GeoKeyValue::ascii)
                    .unwrap_or("unnamed");
                Ok(format!(
                    "GEOGCS[\"{}\",UNIT[\"degree\",0.0174532925199433],AUTHORITY[\"EPSG\",\"{}\"]]",
                    name, code
                ))
            }
            _ => Err(Error::UnsupportedCrs.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn directory_vlr(entries: &[[u16; 4]]) -> Vlr {
        let mut data = Vec::new();
        for n in [1u16, 1, 0, entries.len() as u16] {
            data.write_u16::<LittleEndian>(n).unwrap();
        }
        for entry in entries {
            for &n in entry {
                data.write_u16::<LittleEndian>(n).unwrap();
            }
        }
        Vlr {
            user_id: "LASF_Projection".to_string(),
            record_id: DIRECTORY_RECORD_ID,
            description: String::new(),
            data,
        }
    }

    #[test]
    fn no_directory() {
        assert!(GeoKeyDirectory::parse(&[]).unwrap().is_none());
    }

    #[test]
    fn inline_shorts_and_epsg_tagging() {
        let vlr = directory_vlr(&[[GT_MODEL_TYPE, 0, 1, 1], [PROJECTED_CS_TYPE, 0, 1, 32755]]);
        let directory = GeoKeyDirectory::parse(&[vlr]).unwrap().unwrap();
        assert_eq!((1, 1, 0), directory.version);
        assert_eq!(
            Some(&GeoKeyValue::Short(1)),
            directory.get(GT_MODEL_TYPE)
        );
        assert_eq!(
            Some(&GeoKeyValue::Epsg(32755)),
            directory.get(PROJECTED_CS_TYPE)
        );
        assert_eq!(Some(32755), directory.epsg());
    }

    #[test]
    fn doubles_pool() {
        let directory = directory_vlr(&[[2059, DOUBLE_PARAMS_RECORD_ID, 2, 1]]);
        let mut data = Vec::new();
        for n in [1., 2., 3.] {
            data.write_f64::<LittleEndian>(n).unwrap();
        }
        let doubles = Vlr {
            user_id: "LASF_Projection".to_string(),
            record_id: DOUBLE_PARAMS_RECORD_ID,
            description: String::new(),
            data,
        };
        let parsed = GeoKeyDirectory::parse(&[directory, doubles])
            .unwrap()
            .unwrap();
        assert_eq!(
            Some(&GeoKeyValue::Doubles(vec![2., 3.])),
            parsed.get(2059)
        );
    }

    #[test]
    fn missing_double_pool() {
        let directory = directory_vlr(&[[2059, DOUBLE_PARAMS_RECORD_ID, 1, 0]]);
        assert!(GeoKeyDirectory::parse(&[directory]).is_err());
    }

    #[test]
    fn ascii_pool_strips_pipes() {
        let directory = directory_vlr(&[[GT_CITATION, ASCII_PARAMS_RECORD_ID, 8, 0]]);
        let ascii = Vlr {
            user_id: "LASF_Projection".to_string(),
            record_id: ASCII_PARAMS_RECORD_ID,
            description: String::new(),
            data: b"WGS 84 |".to_vec(),
        };
        let parsed = GeoKeyDirectory::parse(&[directory, ascii]).unwrap().unwrap();
        assert_eq!(
            Some("WGS 84 "),
            parsed.get(GT_CITATION).and_then(GeoKeyValue::ascii)
        );
    }

    #[test]
    fn geographic_wkt() {
        let vlr = directory_vlr(&[[GT_MODEL_TYPE, 0, 1, 2], [GEOGRAPHIC_TYPE, 0, 1, 4326]]);
        let directory = GeoKeyDirectory::parse(&[vlr]).unwrap().unwrap();
        let wkt = directory.to_wkt().unwrap();
        assert!(wkt.starts_with("GEOGCS["));
        assert!(wkt.contains("4326"));
    }

    #[test]
    fn unsupported_model_type() {
        let vlr = directory_vlr(&[[GT_MODEL_TYPE, 0, 1, 3]]);
        let directory = GeoKeyDirectory::parse(&[vlr]).unwrap().unwrap();
        assert!(directory.to_wkt().is_err());
    }
}
