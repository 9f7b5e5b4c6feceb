use crate::{
    cloud::{Column, Error, PointCloud},
    crs::CoordinateTransform,
    point::{Attribute, Format, Value},
    raw,
    view::PointView,
    Bounds, Las, Point, Result,
};

/// A custom attribute extractor.
///
/// Extractors run on the raw record, not on rescaled data; the format is
/// passed alongside for offset-aware decisions.
pub type Extractor = Box<dyn Fn(&raw::Point, &Format) -> Value + Send + Sync>;

enum Source {
    Attribute(Attribute),
    Extractor(Extractor),
}

/// Builds a [PointCloud] from one or more las containers.
///
/// ```
/// use pointclouds::cloud::CloudBuilder;
/// use pointclouds::point::Attribute;
/// use pointclouds::{Header, Las, Point};
///
/// let las = Las::new(
///     Header::default(),
///     vec![Point { x: 1., intensity: 7, ..Default::default() }],
/// )
/// .unwrap();
/// let cloud = CloudBuilder::new()
///     .attribute("intensity", Attribute::Intensity)
///     .build(&las)
///     .unwrap();
/// assert_eq!(1, cloud.len());
/// assert_eq!(&[7u16][..], cloud.typed::<u16>("intensity").unwrap());
/// ```
#[derive(Default)]
pub struct CloudBuilder {
    attributes: Vec<(String, Source)>,
    coordinates: Option<[bool; 3]>,
    crs: Option<String>,
    transform: Option<Box<dyn CoordinateTransform>>,
    extent: Option<Bounds>,
    predicate: Option<Box<dyn Fn(&Point) -> bool + Send + Sync>>,
    coord_tolerance: f64,
}

impl std::fmt::Debug for CloudBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudBuilder")
            .field(
                "attributes",
                &self
                    .attributes
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("crs", &self.crs)
            .field("extent", &self.extent)
            .field("coord_tolerance", &self.coord_tolerance)
            .finish_non_exhaustive()
    }
}

impl CloudBuilder {
    /// Creates a builder that extracts the coordinates and nothing else.
    pub fn new() -> CloudBuilder {
        CloudBuilder::default()
    }

    /// Adds a named column sourced from a standard attribute.
    pub fn attribute<S: Into<String>>(mut self, name: S, attribute: Attribute) -> CloudBuilder {
        self.attributes.push((name.into(), Source::Attribute(attribute)));
        self
    }

    /// Adds a named column computed by a custom extractor.
    ///
    /// The extractor sees the raw record.
    pub fn extractor<S: Into<String>>(mut self, name: S, extractor: Extractor) -> CloudBuilder {
        self.attributes.push((name.into(), Source::Extractor(extractor)));
        self
    }

    /// Selects which coordinate columns to keep, as `[x, y, z]` switches.
    ///
    /// All three by default.
    pub fn coordinates(mut self, coordinates: [bool; 3]) -> CloudBuilder {
        self.coordinates = Some(coordinates);
        self
    }

    /// Sets the target CRS handle stored on the cloud.
    pub fn crs<S: Into<String>>(mut self, crs: S) -> CloudBuilder {
        self.crs = Some(crs.into());
        self
    }

    /// Sets the transform from the las CRS to the target CRS.
    ///
    /// Applied to the rescaled coordinates of every point.
    pub fn transform(mut self, transform: Box<dyn CoordinateTransform>) -> CloudBuilder {
        self.transform = Some(transform);
        self
    }

    /// Keeps only points inside the axis-aligned box, in target CRS
    /// coordinates.
    pub fn extent(mut self, extent: Bounds) -> CloudBuilder {
        self.extent = Some(extent);
        self
    }

    /// Keeps only points matching the predicate.
    ///
    /// The predicate sees the cooked las point, before any CRS transform.
    pub fn filter<F>(mut self, predicate: F) -> CloudBuilder
    where
        F: Fn(&Point) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Sets the tolerance used for the extent containment test.
    pub fn coord_tolerance(mut self, tolerance: f64) -> CloudBuilder {
        self.coord_tolerance = tolerance;
        self
    }

    /// Builds a cloud from a single las container.
    pub fn build<V: PointView>(&self, las: &Las<V>) -> Result<PointCloud> {
        self.build_many(std::slice::from_ref(las))
    }

    /// Builds a cloud by concatenating points from several las containers.
    ///
    /// Per input: rescale, transform to the target CRS, test the extent with
    /// the tolerance, test the predicate, then extract the columns.
    pub fn build_many<V: PointView>(&self, lases: &[Las<V>]) -> Result<PointCloud> {
        let [keep_x, keep_y, keep_z] = self.coordinates.unwrap_or([true; 3]);
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut zs = Vec::new();
        let mut values: Vec<Vec<Value>> = self.attributes.iter().map(|_| Vec::new()).collect();
        for las in lases {
            let transforms = *las.header().transforms();
            let format = *las.header().point_format();
            for (name, source) in &self.attributes {
                if let Source::Attribute(attribute) = source {
                    if !attribute.exists_in(&format) {
                        return Err(Error::AbsentAttribute(name.clone()).into());
                    }
                }
            }
            for raw_point in las.points().iter() {
                let raw_point = raw_point?;
                let mut xyz = [
                    transforms.x.direct(raw_point.x),
                    transforms.y.direct(raw_point.y),
                    transforms.z.direct(raw_point.z),
                ];
                if let Some(transform) = self.transform.as_deref() {
                    xyz = transform.transform(xyz)?;
                }
                if let Some(extent) = self.extent {
                    if !extent.contains(xyz, self.coord_tolerance) {
                        continue;
                    }
                }
                if let Some(predicate) = self.predicate.as_deref() {
                    if !predicate(&Point::new(raw_point.clone(), &transforms)) {
                        continue;
                    }
                }
                xs.push(xyz[0]);
                ys.push(xyz[1]);
                zs.push(xyz[2]);
                for ((name, source), column) in self.attributes.iter().zip(values.iter_mut()) {
                    let value = match source {
                        Source::Attribute(attribute) => crate::view::read_attribute_from_raw(
                            &raw_point, *attribute, &format,
                        )
                        .ok_or_else(|| Error::AbsentAttribute(name.clone()))?,
                        Source::Extractor(extractor) => extractor(&raw_point, &format),
                    };
                    column.push(value);
                }
            }
        }
        let mut cloud = PointCloud::new();
        if keep_x {
            cloud.insert("x", Column::from(xs))?;
        }
        if keep_y {
            cloud.insert("y", Column::from(ys))?;
        }
        if keep_z {
            cloud.insert("z", Column::from(zs))?;
        }
        for ((name, _), column_values) in self.attributes.iter().zip(values) {
            cloud.insert(name.clone(), Column::from_values(column_values)?)?;
        }
        cloud.set_crs(self.crs.clone());
        Ok(cloud)
    }
}
