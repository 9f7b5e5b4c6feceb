use crate::{Point, Result, Transform, Vector};

/// Minimum and maximum bounds in three dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// The minimum values.
    pub min: Vector<f64>,
    /// The maximum values.
    pub max: Vector<f64>,
}

impl Bounds {
    /// Grows the bounds to encompass this point in xyz space.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Bounds, Point};
    /// let point = Point { x: 1., y: 2., z: 3., ..Default::default() };
    /// let mut bounds = Bounds::default();
    /// bounds.grow(&point);
    /// assert_eq!(1., bounds.min.x);
    /// ```
    pub fn grow(&mut self, point: &Point) {
        if point.x < self.min.x {
            self.min.x = point.x;
        }
        if point.y < self.min.y {
            self.min.y = point.y;
        }
        if point.z < self.min.z {
            self.min.z = point.z;
        }
        if point.x > self.max.x {
            self.max.x = point.x;
        }
        if point.y > self.max.y {
            self.max.y = point.y;
        }
        if point.z > self.max.z {
            self.max.z = point.z;
        }
    }

    /// Returns true if the xyz location lies inside these bounds.
    ///
    /// The tolerance is applied on every axis, so a point that is `tolerance`
    /// outside of the box still counts as contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Bounds, Vector};
    /// let bounds = Bounds {
    ///     min: Vector { x: 0., y: 0., z: 0. },
    ///     max: Vector { x: 1., y: 1., z: 1. },
    /// };
    /// assert!(bounds.contains([0.5, 0.5, 0.5], 0.));
    /// assert!(!bounds.contains([1.5, 0.5, 0.5], 0.));
    /// assert!(bounds.contains([1.1, 0.5, 0.5], 0.2));
    /// ```
    pub fn contains(&self, [x, y, z]: [f64; 3], tolerance: f64) -> bool {
        x >= self.min.x - tolerance
            && x <= self.max.x + tolerance
            && y >= self.min.y - tolerance
            && y <= self.max.y + tolerance
            && z >= self.min.z - tolerance
            && z <= self.max.z + tolerance
    }

    /// Snaps the bounds onto the grid defined by the transforms.
    ///
    /// Without this, points may lay outside of the bounding box due to
    /// floating-point issues when their coordinates are descaled and rescaled.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::{Bounds, Vector};
    ///
    /// let bounds = Bounds {
    ///     min: Vector { x: -2.7868618965148926, y: -0.9322229027748108, z: -5.8063459396362305 },
    ///     max: Vector { x: 0.6091402173042297, y: 1.5428568124771118, z: -0.09441471844911575 },
    /// };
    ///
    /// // Currently, the default scale is 0.001.
    /// let new_bounds = bounds.adapt(&Default::default()).unwrap();
    /// assert_eq!(new_bounds.max.z, -0.094);
    /// ```
    pub fn adapt(&self, transforms: &Vector<Transform>) -> Result<Bounds> {
        fn snap(value: f64, transform: &Transform) -> Result<f64> {
            // Fresh bounds hold +-inf until the first point grows them.
            if value.is_infinite() {
                return Ok(value);
            }
            Ok(transform.direct(transform.inverse(value)?))
        }

        Ok(Bounds {
            min: Vector {
                x: snap(self.min.x, &transforms.x)?,
                y: snap(self.min.y, &transforms.y)?,
                z: snap(self.min.z, &transforms.z)?,
            },
            max: Vector {
                x: snap(self.max.x, &transforms.x)?,
                y: snap(self.max.y, &transforms.y)?,
                z: snap(self.max.z, &transforms.z)?,
            },
        })
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds {
            min: Vector {
                x: f64::INFINITY,
                y: f64::INFINITY,
                z: f64::INFINITY,
            },
            max: Vector {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
                z: f64::NEG_INFINITY,
            },
        }
    }
}
