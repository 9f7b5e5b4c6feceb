//! The las container: a header plus a point view.
//!
//! [Las] aggregates everything this crate knows about a las source. It is
//! generic over its [PointView], so a container backed by a memory-mapped
//! file, a compressed stream, or a stack of lazy filters is still just a
//! `Las<V>`, and the hot paths monomorphise per backing instead of
//! dispatching per point.
//!
//! ```
//! use pointclouds::{Header, Las, Point};
//!
//! let points = vec![
//!     Point { x: 1., y: 2., z: 3., ..Default::default() },
//!     Point { x: 4., y: 5., z: 6., ..Default::default() },
//! ];
//! let las = Las::new(Header::default(), points).unwrap();
//! assert_eq!(2, las.len());
//! let filtered = las.filter(|point| point.x > 2.).unwrap();
//! assert_eq!(1, filtered.len());
//! ```

mod read;
mod write;

pub use read::{PointReadMode, ReadOptions};
pub use write::{OutputFormat, WriteOptions};

use crate::{
    crs::{CoordinateTransform, Crs},
    point::{Attribute, Value},
    raw,
    view::{AttributeOverlay, Bitmask, Indexed, Masked, OwnedPoints, PointView, Updated},
    Bounds, Header, Point, Result, Transform, Vector,
};
use std::ops::Range;

/// A las container: header fields plus a point view.
#[derive(Clone, Debug)]
pub struct Las<V> {
    header: Header,
    points: V,
}

impl Las<OwnedPoints> {
    /// Creates an in-memory container from cooked points.
    ///
    /// The points are descaled through the header's transforms, and the
    /// header's counts and bounds are rederived from them.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default()]).unwrap();
    /// assert_eq!(1, las.len());
    /// ```
    pub fn new(mut header: Header, points: Vec<Point>) -> Result<Las<OwnedPoints>> {
        let format = *header.point_format();
        let transforms = *header.transforms();
        header.clear();
        let mut raw_points = Vec::with_capacity(points.len());
        for point in points {
            header.add_point(&point);
            raw_points.push(point.into_raw(&transforms, &format)?);
        }
        Ok(Las {
            header,
            points: OwnedPoints::new(raw_points, format),
        })
    }

    /// Keeps only the points matching the predicate, in place.
    ///
    /// Summary statistics are recomputed afterwards.
    pub fn filter_in_place<F>(&mut self, mut predicate: F) -> Result<()>
    where
        F: FnMut(&Point) -> bool,
    {
        let transforms = *self.header.transforms();
        self.points
            .retain(|raw_point| predicate(&Point::new(raw_point.clone(), &transforms)));
        self.recompute_summary()
    }
}

impl<V: PointView> Las<Masked<V>> {
    /// Clears the mask bits of the points failing the predicate, in place.
    ///
    /// Summary statistics are recomputed afterwards.
    pub fn filter_in_place<F>(&mut self, mut predicate: F) -> Result<()>
    where
        F: FnMut(&Point) -> bool,
    {
        let transforms = *self.header.transforms();
        self.points
            .filter_in_place(|raw_point| predicate(&Point::new(raw_point.clone(), &transforms)))?;
        self.recompute_summary()
    }
}

impl<V: PointView> Las<V> {
    /// Assembles a container from a header and a view.
    ///
    /// The header's stored point count is reconciled with the view's length;
    /// a mismatch warns and the view wins.
    pub fn from_parts(mut header: Header, points: V) -> Las<V> {
        if header.number_of_points() != points.len() {
            log::warn!(
                "the header claims {} points but the view holds {}",
                header.number_of_points(),
                points.len()
            );
            header.number_of_points = points.len();
        }
        Las { header, points }
    }

    /// Returns this container's header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns this container's point view.
    pub fn points(&self) -> &V {
        &self.points
    }

    /// Returns the number of points.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default()]).unwrap();
    /// assert_eq!(1, las.len());
    /// assert!(!las.is_empty());
    /// ```
    pub fn len(&self) -> u64 {
        self.points.len()
    }

    /// Returns true if this container holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reads the point at the given index, rescaled into a cooked [Point].
    pub fn point(&self, index: u64) -> Result<Point> {
        let raw_point = self.points.read(index)?;
        Ok(Point::new(raw_point, self.header.transforms()))
    }

    /// Reads the raw (unscaled) record at the given index.
    pub fn raw_point(&self, index: u64) -> Result<raw::Point> {
        self.points.read(index)
    }

    /// Returns an iterator over the cooked points, in view order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Point>> + '_ {
        let transforms = self.header.transforms();
        self.points
            .iter()
            .map(move |raw_point| raw_point.map(|p| Point::new(p, transforms)))
    }

    /// Returns the rescaled coordinates of the point at the given index,
    /// optionally pushed through a coordinate transform.
    ///
    /// The rescale law is `raw * scale + offset`, per axis, before the
    /// transform is applied.
    pub fn coordinates(
        &self,
        index: u64,
        transform: Option<&dyn CoordinateTransform>,
    ) -> Result<[f64; 3]> {
        let raw_point = self.points.read(index)?;
        let transforms = self.header.transforms();
        let xyz = [
            transforms.x.direct(raw_point.x),
            transforms.y.direct(raw_point.y),
            transforms.z.direct(raw_point.z),
        ];
        match transform {
            Some(transform) => transform.transform(xyz),
            None => Ok(xyz),
        }
    }

    /// Returns the stored bounds.
    pub fn bounds(&self) -> Bounds {
        self.header.bounds()
    }

    /// Walks the points and returns their actual bounds.
    ///
    /// The stored bounds are whatever the header claims; these are measured.
    pub fn extrema(&self) -> Result<Bounds> {
        let transforms = self.header.transforms();
        let mut bounds = Bounds::default();
        for raw_point in self.points.iter() {
            let raw_point = raw_point?;
            bounds.grow(&Point {
                x: transforms.x.direct(raw_point.x),
                y: transforms.y.direct(raw_point.y),
                z: transforms.z.direct(raw_point.z),
                ..Default::default()
            });
        }
        Ok(bounds)
    }

    /// Returns the coordinate reference system, WKT or geokeys per the
    /// header's flag.
    pub fn crs(&self) -> Result<Option<Crs>> {
        self.header.crs()
    }

    /// Filters this container, producing a new one over a [Masked] view.
    ///
    /// Summary statistics are recomputed for the survivors.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(
    ///     Header::default(),
    ///     (0..5)
    ///         .map(|x| Point { x: x as f64, ..Default::default() })
    ///         .collect(),
    /// )
    /// .unwrap();
    /// let filtered = las.filter(|point| point.x >= 3.).unwrap();
    /// assert_eq!(2, filtered.len());
    /// ```
    pub fn filter<F>(self, mut predicate: F) -> Result<Las<Masked<V>>>
    where
        F: FnMut(&Point) -> bool,
    {
        let transforms = *self.header.transforms();
        let points = Masked::from_predicate(self.points, |raw_point| {
            predicate(&Point::new(raw_point.clone(), &transforms))
        })?;
        let mut las = Las {
            header: self.header,
            points,
        };
        las.recompute_summary()?;
        Ok(las)
    }

    /// Restricts this container to a bitmask over its current view.
    ///
    /// The mask must be exactly as long as the view.
    pub fn mask(self, mask: Bitmask) -> Result<Las<Masked<V>>> {
        let mut las = Las {
            header: self.header,
            points: Masked::new(self.points, mask),
        };
        las.recompute_summary()?;
        Ok(las)
    }

    /// Restricts this container to an index range.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default(); 10]).unwrap();
    /// let sliced = las.slice(2..5).unwrap();
    /// assert_eq!(3, sliced.len());
    /// ```
    pub fn slice(self, range: Range<u64>) -> Result<Las<Indexed<V>>> {
        let mut las = Las {
            header: self.header,
            points: Indexed::new(self.points, range),
        };
        las.recompute_summary()?;
        Ok(las)
    }

    /// Layers attribute overlays over this container's points.
    ///
    /// Overlay values are given in cooked space: `x`, `y`, and `z` as scaled
    /// `f64`s (descaled through the header's transforms), the scan angle in
    /// degrees, everything else as the attribute's natural type. Counts and
    /// bounds are recomputed when coordinates or return numbers change, or
    /// when the patch replaces the transforms.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::las::HeaderPatch;
    /// use pointclouds::point::{Attribute, Value};
    /// use pointclouds::{Header, Las, Point};
    ///
    /// let las = Las::new(Header::default(), vec![Point::default(); 2]).unwrap();
    /// let updated = las
    ///     .update(
    ///         vec![(Attribute::Intensity, vec![Value::U16(7), Value::U16(8)])],
    ///         HeaderPatch::default(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(7, updated.point(0).unwrap().intensity);
    /// ```
    pub fn update(
        self,
        overlays: Vec<(Attribute, Vec<Value>)>,
        patch: HeaderPatch,
    ) -> Result<Las<Updated<V>>> {
        let mut header = self.header;
        let force_recompute = patch.recompute_summary;
        let transforms_changed = patch.transforms.is_some();
        patch.apply(&mut header);
        let transforms = *header.transforms();
        let format = *header.point_format();
        let mut needs_recompute = transforms_changed || force_recompute;
        let mut built = Vec::with_capacity(overlays.len());
        for (attribute, values) in overlays {
            needs_recompute |= matches!(
                attribute,
                Attribute::X | Attribute::Y | Attribute::Z | Attribute::ReturnNumber
            );
            let values = match attribute {
                Attribute::X => descale(values, &transforms.x)?,
                Attribute::Y => descale(values, &transforms.y)?,
                Attribute::Z => descale(values, &transforms.z)?,
                _ => values,
            };
            built.push(AttributeOverlay::new(attribute, values, &format)?);
        }
        let mut las = Las {
            header,
            points: Updated::new(self.points, built)?,
        };
        if needs_recompute {
            las.recompute_summary()?;
        }
        Ok(las)
    }

    /// Recomputes the header's counts and bounds from the current view.
    pub(crate) fn recompute_summary(&mut self) -> Result<()> {
        let transforms = *self.header.transforms();
        let mut bounds = Bounds::default();
        let mut number_of_points = 0u64;
        let mut number_of_points_by_return = [0u64; 15];
        for raw_point in self.points.iter() {
            let raw_point = raw_point?;
            number_of_points += 1;
            let return_number = raw_point.flags.return_number();
            if (1..=15).contains(&return_number) {
                number_of_points_by_return[usize::from(return_number) - 1] += 1;
            }
            bounds.grow(&Point {
                x: transforms.x.direct(raw_point.x),
                y: transforms.y.direct(raw_point.y),
                z: transforms.z.direct(raw_point.z),
                ..Default::default()
            });
        }
        self.header.number_of_points = number_of_points;
        self.header.number_of_points_by_return = number_of_points_by_return;
        self.header.bounds = bounds;
        Ok(())
    }

    /// Tears the container apart.
    pub fn into_parts(self) -> (Header, V) {
        (self.header, self.points)
    }
}

fn descale(values: Vec<Value>, transform: &Transform) -> Result<Vec<Value>> {
    values
        .into_iter()
        .map(|value| match value {
            Value::F64(n) => Ok(Value::I32(transform.inverse(n)?)),
            other => Ok(other),
        })
        .collect()
}

/// Replacement header fields for [Las::update].
///
/// Every field is optional; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct HeaderPatch {
    /// Replacement coordinate scales and offsets.
    ///
    /// Changing these triggers a summary recomputation.
    pub transforms: Option<Vector<Transform>>,

    /// Replacement file source id.
    pub file_source_id: Option<u16>,

    /// Replacement system identifier.
    pub system_identifier: Option<String>,

    /// Replacement generating software.
    pub generating_software: Option<String>,

    /// Replacement project guid.
    pub guid: Option<uuid::Uuid>,

    /// Replacement creation date.
    pub date: Option<chrono::NaiveDate>,

    /// Force a summary recomputation even when nothing obviously moved.
    pub recompute_summary: bool,
}

impl HeaderPatch {
    fn apply(self, header: &mut Header) {
        if let Some(transforms) = self.transforms {
            header.transforms = transforms;
        }
        if let Some(file_source_id) = self.file_source_id {
            header.file_source_id = file_source_id;
        }
        if let Some(system_identifier) = self.system_identifier {
            header.system_identifier = system_identifier;
        }
        if let Some(generating_software) = self.generating_software {
            header.generating_software = generating_software;
        }
        if let Some(guid) = self.guid {
            header.guid = guid;
        }
        if let Some(date) = self.date {
            header.date = Some(date);
        }
    }
}
