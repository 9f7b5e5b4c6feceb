//! Composable filters over las containers and point clouds.
//!
//! Three descriptor families compose conjunctively: attribute predicates,
//! axis-aligned extents (optionally in a different CRS), and arithmetic
//! sub-ranges over the surviving indices. Las containers filter through the
//! [Masked](crate::view::Masked) view; point clouds materialise a bitmask
//! and drop the failing rows.
//!
//! Predicate evaluation over a cloud runs in parallel, unless a coordinate
//! transform that isn't thread safe is involved, in which case it is
//! serialised.

use crate::{
    cloud::PointCloud,
    crs::CoordinateTransform,
    view::{Bitmask, Masked, PointView},
    Axis, Error, Las, Result,
};
use rayon::prelude::*;

/// The relative tolerance applied to extent intervals.
///
/// Each axis interval is widened by `(max - min)` times this factor, so
/// boundary points survive floating-point noise.
pub const EXTENT_RELATIVE_TOLERANCE: f64 = 1e-9;

/// An axis-aligned extent filter: per-axis intervals combined conjunctively.
///
/// ```
/// use pointclouds::filter::ExtentFilter;
/// use pointclouds::Axis;
/// let filter = ExtentFilter::new().with(Axis::X, 2., 4.);
/// assert!(filter.contains([3., 100., 100.]));
/// assert!(!filter.contains([5., 0., 0.]));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExtentFilter {
    intervals: Vec<(Axis, f64, f64)>,
}

impl ExtentFilter {
    /// Creates an empty extent filter, which keeps everything.
    pub fn new() -> ExtentFilter {
        ExtentFilter::default()
    }

    /// Restricts an axis to `[min, max]`, inclusive with tolerance.
    pub fn with(mut self, axis: Axis, min: f64, max: f64) -> ExtentFilter {
        self.intervals.push((axis, min, max));
        self
    }

    /// Is the location inside every interval?
    pub fn contains(&self, xyz: [f64; 3]) -> bool {
        self.intervals.iter().all(|&(axis, min, max)| {
            let tolerance = (max - min).abs() * EXTENT_RELATIVE_TOLERANCE;
            let value = match axis {
                Axis::X => xyz[0],
                Axis::Y => xyz[1],
                Axis::Z => xyz[2],
            };
            value >= min - tolerance && value <= max + tolerance
        })
    }
}

/// An arithmetic progression over surviving indices.
///
/// All fields are optional: the start defaults to the first index, the step
/// to one, and the stop to the end. Negative and zero steps are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubRange {
    /// The first surviving ordinal to keep (zero-based).
    pub start: Option<u64>,

    /// The progression step.
    pub step: Option<i64>,

    /// The last surviving ordinal to consider, inclusive.
    pub stop: Option<u64>,
}

impl SubRange {
    /// Returns the kept ordinals for a view of the given length.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::filter::SubRange;
    /// let subrange = SubRange {
    ///     start: Some(1),
    ///     step: Some(3),
    ///     stop: None,
    /// };
    /// assert_eq!(
    ///     vec![1, 4, 7, 10, 13, 16, 19],
    ///     subrange.ordinals(20).unwrap().collect::<Vec<_>>()
    /// );
    /// ```
    pub fn ordinals(&self, len: u64) -> Result<impl Iterator<Item = u64>> {
        let step = self.step.unwrap_or(1);
        if step <= 0 {
            return Err(Error::NegativeStep(step));
        }
        let step = step as u64;
        let start = self.start.unwrap_or(0);
        let stop = self.stop.map_or(len, |stop| (stop + 1).min(len));
        Ok((start..stop).step_by(step as usize))
    }
}

impl<V: PointView> Las<V> {
    /// Keeps only the points inside the extent.
    ///
    /// With a transform, the extent is interpreted in the target CRS and
    /// each point is reprojected before the test.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::filter::ExtentFilter;
    /// use pointclouds::{Axis, Header, Las, Point};
    /// let las = Las::new(
    ///     Header::default(),
    ///     (1..=5)
    ///         .map(|x| Point { x: x as f64, ..Default::default() })
    ///         .collect(),
    /// )
    /// .unwrap();
    /// let filtered = las
    ///     .filter_extent(&ExtentFilter::new().with(Axis::X, 2., 4.), None)
    ///     .unwrap();
    /// assert_eq!(3, filtered.len());
    /// ```
    pub fn filter_extent(
        self,
        extent: &ExtentFilter,
        transform: Option<&dyn CoordinateTransform>,
    ) -> Result<Las<Masked<V>>> {
        // The I/O tier is single threaded, so the transform's thread safety
        // doesn't matter here; reprojection failures drop the point.
        self.filter(|point| {
            let mut xyz = [point.x, point.y, point.z];
            if let Some(transform) = transform {
                match transform.transform(xyz) {
                    Ok(transformed) => xyz = transformed,
                    Err(_) => return false,
                }
            }
            extent.contains(xyz)
        })
    }

    /// Keeps only the points whose ordinal falls on the progression.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::filter::SubRange;
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default(); 10]).unwrap();
    /// let subrange = SubRange { start: Some(0), step: Some(2), stop: None };
    /// assert_eq!(5, las.filter_subrange(&subrange).unwrap().len());
    /// ```
    pub fn filter_subrange(self, subrange: &SubRange) -> Result<Las<Masked<V>>> {
        let len = self.len();
        let mut mask = Bitmask::all_clear(len);
        for ordinal in subrange.ordinals(len)? {
            mask.set(ordinal);
        }
        self.mask(mask)
    }
}

impl PointCloud {
    /// Keeps only the rows matching a predicate over the row index.
    ///
    /// Evaluation is parallel; the predicate must be thread safe.
    pub fn filter_rows<F>(&self, predicate: F) -> PointCloud
    where
        F: Fn(usize) -> bool + Send + Sync,
    {
        let keep: Vec<bool> = (0..self.len()).into_par_iter().map(&predicate).collect();
        let mut mask = Bitmask::all_set(self.len() as u64);
        for (row, &keep) in keep.iter().enumerate() {
            if !keep {
                mask.clear(row as u64);
            }
        }
        self.retain_mask(&mask)
    }

    /// Keeps only the rows inside the extent.
    ///
    /// With a thread-safe transform the rows are tested in parallel;
    /// otherwise the evaluation is serialised.
    pub fn filter_extent(
        &self,
        extent: &ExtentFilter,
        transform: Option<&dyn CoordinateTransform>,
    ) -> Result<PointCloud> {
        let len = self.len();
        let coordinates = (0..len)
            .map(|row| self.coordinates(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mask = match transform {
            None => parallel_mask(&coordinates, |xyz| Ok(extent.contains(xyz)))?,
            Some(transform) if transform.is_thread_safe() => {
                parallel_mask(&coordinates, |xyz| {
                    Ok(extent.contains(transform.transform(xyz)?))
                })?
            }
            Some(transform) => {
                let mut mask = Bitmask::all_set(len as u64);
                for (row, &xyz) in coordinates.iter().enumerate() {
                    if !extent.contains(transform.transform(xyz)?) {
                        mask.clear(row as u64);
                    }
                }
                mask
            }
        };
        Ok(self.retain_mask(&mask))
    }

    /// Keeps only the rows whose ordinal falls on the progression.
    ///
    /// The progression walks the current rows; everything off it is
    /// dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::cloud::{Column, PointCloud};
    /// use pointclouds::filter::SubRange;
    /// let mut cloud = PointCloud::new();
    /// cloud.insert("x", Column::from((0..20).map(f64::from).collect::<Vec<_>>())).unwrap();
    /// let subrange = SubRange { start: Some(1), step: Some(3), stop: None };
    /// let kept = cloud.filter_subrange(&subrange).unwrap();
    /// assert_eq!(7, kept.len());
    /// assert_eq!(&[1., 4., 7., 10., 13., 16., 19.][..], kept.typed::<f64>("x").unwrap());
    /// ```
    pub fn filter_subrange(&self, subrange: &SubRange) -> Result<PointCloud> {
        let len = self.len() as u64;
        let mut mask = Bitmask::all_clear(len);
        for ordinal in subrange.ordinals(len)? {
            mask.set(ordinal);
        }
        Ok(self.retain_mask(&mask))
    }
}

fn parallel_mask<F>(coordinates: &[[f64; 3]], test: F) -> Result<Bitmask>
where
    F: Fn([f64; 3]) -> Result<bool> + Send + Sync,
{
    let keep = coordinates
        .par_iter()
        .map(|&xyz| test(xyz))
        .collect::<Result<Vec<_>>>()?;
    let mut mask = Bitmask::all_set(coordinates.len() as u64);
    for (row, &keep) in keep.iter().enumerate() {
        if !keep {
            mask.clear(row as u64);
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::Column;
    use crate::Header;

    #[test]
    fn extent_is_inclusive_with_tolerance() {
        let filter = ExtentFilter::new().with(Axis::X, 2., 4.);
        assert!(filter.contains([2., 0., 0.]));
        assert!(filter.contains([4., 0., 0.]));
        assert!(filter.contains([4. + 1e-12, 0., 0.]));
        assert!(!filter.contains([4.1, 0., 0.]));
    }

    #[test]
    fn las_extent_filter() {
        let las = Las::new(
            Header::default(),
            (1..=5)
                .map(|x| Point {
                    x: f64::from(x),
                    ..Default::default()
                })
                .collect(),
        )
        .unwrap();
        let filtered = las
            .filter_extent(&ExtentFilter::new().with(Axis::X, 2., 4.), None)
            .unwrap();
        let xs = filtered
            .iter()
            .map(|point| point.unwrap().x)
            .collect::<Vec<_>>();
        assert_eq!(vec![2., 3., 4.], xs);
    }

    #[test]
    fn negative_step_is_rejected() {
        let subrange = SubRange {
            start: None,
            step: Some(-2),
            stop: None,
        };
        assert!(subrange.ordinals(10).is_err());
        let subrange = SubRange {
            step: Some(0),
            ..Default::default()
        };
        assert!(subrange.ordinals(10).is_err());
    }

    #[test]
    fn subrange_with_stop() {
        let subrange = SubRange {
            start: Some(2),
            step: Some(2),
            stop: Some(7),
        };
        assert_eq!(
            vec![2, 4, 6],
            subrange.ordinals(100).unwrap().collect::<Vec<_>>()
        );
    }

    #[test]
    fn cloud_composition() {
        let mut cloud = PointCloud::new();
        cloud
            .insert("x", Column::from((0..20).map(f64::from).collect::<Vec<_>>()))
            .unwrap();
        cloud
            .insert("y", Column::from(vec![0.; 20]))
            .unwrap();
        cloud
            .insert("z", Column::from(vec![0.; 20]))
            .unwrap();
        // First the extent, then the sub-range over the survivors.
        let widened = cloud
            .filter_extent(&ExtentFilter::new().with(Axis::X, 5., 15.), None)
            .unwrap();
        assert_eq!(11, widened.len());
        let thinned = widened
            .filter_subrange(&SubRange {
                step: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(&[5., 10., 15.][..], thinned.typed::<f64>("x").unwrap());
    }

    #[test]
    fn serial_transform_path() {
        struct Shift;
        impl CoordinateTransform for Shift {
            fn transform(&self, [x, y, z]: [f64; 3]) -> Result<[f64; 3]> {
                Ok([x + 100., y, z])
            }
        }
        let mut cloud = PointCloud::new();
        cloud
            .insert("x", Column::from(vec![1.0, 2.0, 3.0]))
            .unwrap();
        cloud.insert("y", Column::from(vec![0.; 3])).unwrap();
        cloud.insert("z", Column::from(vec![0.; 3])).unwrap();
        let filtered = cloud
            .filter_extent(
                &ExtentFilter::new().with(Axis::X, 101.5, 200.),
                Some(&Shift),
            )
            .unwrap();
        assert_eq!(2, filtered.len());
    }
}
