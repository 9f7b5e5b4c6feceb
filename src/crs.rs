//! Coordinate reference systems and the transform capability.
//!
//! This crate parses the CRS descriptors embedded in las files but does not
//! implement reprojection itself; callers hand in a [CoordinateTransform]
//! from whatever projection engine they use.

use crate::{geokey::GeoKeyDirectory, Header, Result};

const WKT_VLR_RECORD_ID: u16 = 2112;
const WKT_EVLR_RECORD_ID: u16 = 2111;

/// A coordinate reference system description, as stored in a las file.
#[derive(Clone, Debug, PartialEq)]
pub enum Crs {
    /// A GeoTIFF-style geokey directory.
    GeoKeys(GeoKeyDirectory),

    /// A well-known text description.
    Wkt(String),
}

impl Crs {
    /// Returns this CRS as well-known text.
    ///
    /// WKT descriptions are returned as-is; geokey directories go through the
    /// best-effort [GeoKeyDirectory::to_wkt] translation.
    pub fn to_wkt(&self) -> Result<String> {
        match self {
            Crs::Wkt(wkt) => Ok(wkt.clone()),
            Crs::GeoKeys(directory) => directory.to_wkt(),
        }
    }
}

/// A reprojection capability.
///
/// Transforms are not assumed to be thread safe: the filter engine and the
/// point cloud builder check [CoordinateTransform::is_thread_safe] and fall
/// back to serial evaluation when it returns false.
pub trait CoordinateTransform: Send {
    /// Transforms one xyz triple.
    fn transform(&self, xyz: [f64; 3]) -> Result<[f64; 3]>;

    /// May this transform be called from multiple threads at once?
    fn is_thread_safe(&self) -> bool {
        false
    }
}

/// The do-nothing transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn transform(&self, xyz: [f64; 3]) -> Result<[f64; 3]> {
        Ok(xyz)
    }

    fn is_thread_safe(&self) -> bool {
        true
    }
}

impl Header {
    /// Returns the coordinate reference system stored in this header's vlrs.
    ///
    /// Which representation is returned follows the header's WKT flag; if the
    /// flag and the vlrs that are actually present disagree, the discrepancy
    /// is logged and the vlrs win.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Header;
    /// assert!(Header::default().crs().unwrap().is_none());
    /// ```
    pub fn crs(&self) -> Result<Option<Crs>> {
        let wkt = self.wkt_crs();
        let geokeys = GeoKeyDirectory::parse(self.vlrs())?;
        if self.global_encoding().has_wkt_crs {
            if wkt.is_some() {
                return Ok(wkt.map(Crs::Wkt));
            }
            if geokeys.is_some() {
                log::warn!("the header claims a wkt crs but only geokeys are present");
            }
        } else if wkt.is_some() && geokeys.is_none() {
            log::warn!("a wkt crs vlr is present but the header doesn't flag it");
            return Ok(wkt.map(Crs::Wkt));
        }
        Ok(geokeys.map(Crs::GeoKeys).or_else(|| wkt.map(Crs::Wkt)))
    }

    fn wkt_crs(&self) -> Option<String> {
        self.all_vlrs()
            .find(|vlr| {
                vlr.is_projection()
                    && (vlr.record_id == WKT_VLR_RECORD_ID || vlr.record_id == WKT_EVLR_RECORD_ID)
            })
            .map(|vlr| {
                let end = vlr
                    .data
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(vlr.data.len());
                String::from_utf8_lossy(&vlr.data[..end]).into_owned()
            })
    }
}
