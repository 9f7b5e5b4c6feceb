//! An in-memory, columnar point cloud.
//!
//! A [PointCloud] is an ordered set of named, equal-length columns. The
//! coordinate columns `x`, `y`, and `z` are always `f64`; every other column
//! carries the type of its source attribute. Processing lives in the
//! submodules: [apply] for parallel per-point and per-neighborhood maps,
//! [knn] for nearest-neighbor tables, and [raster] for gridding.
//!
//! ```
//! use pointclouds::cloud::{Column, PointCloud};
//!
//! let mut cloud = PointCloud::new();
//! cloud.insert("x", Column::from(vec![1.0, 2.0])).unwrap();
//! cloud.insert("y", Column::from(vec![1.0, 2.0])).unwrap();
//! cloud.insert("z", Column::from(vec![0.5, 0.7])).unwrap();
//! cloud.insert("intensity", Column::from(vec![10u16, 20])).unwrap();
//! assert_eq!(2, cloud.len());
//! ```

pub mod apply;
mod build;
mod column;
pub mod knn;
pub mod raster;

pub use apply::{ApplyOptions, CancellationToken, Neighborhoods};
pub use build::{CloudBuilder, Extractor};
pub use column::{Column, ColumnScalar};
pub use knn::KnnIndex;
pub use raster::{Raster, RasterMode};

use crate::{
    point::{Value, ValueKind},
    view::Bitmask,
};
use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error as ThisError;

const COORDINATE_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// Point-cloud-specific errors.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
    /// A column that was asked for is not in the cloud.
    #[error("no such column: {0}")]
    MissingColumn(String),

    /// A source attribute is not present in the las point format.
    #[error("the las points don't carry the attribute for column {0}")]
    AbsentAttribute(String),

    /// A column has the wrong length for the cloud.
    #[error("column {name} has {actual} rows, expected {expected}")]
    ColumnLength {
        /// The column name.
        name: String,
        /// The cloud's length.
        expected: usize,
        /// The column's length.
        actual: usize,
    },

    /// A column has the wrong element kind.
    #[error("column {name} holds {actual:?}, expected {expected:?}")]
    ColumnKind {
        /// The column name.
        name: String,
        /// The expected element kind.
        expected: ValueKind,
        /// The stored element kind.
        actual: ValueKind,
    },

    /// A value's kind doesn't match its column.
    #[error("value kind {actual:?} doesn't match the column's {expected:?}")]
    ElementKind {
        /// The column's element kind.
        expected: ValueKind,
        /// The value's kind.
        actual: ValueKind,
    },

    /// Not enough points for the requested neighbor count.
    #[error("cannot take {k} neighbors of each of {len} points")]
    NotEnoughPoints {
        /// The requested neighbor count.
        k: usize,
        /// The number of points.
        len: usize,
    },

    /// The spatial index rejected a point.
    #[error("spatial index error: {0}")]
    SpatialIndex(String),

    /// A row index is out of bounds.
    #[error("row {index} is out of bounds of the {len} rows")]
    RowOutOfBounds {
        /// The requested row.
        index: usize,
        /// The number of rows.
        len: usize,
    },

    /// A raster was given an empty or inverted extent.
    #[error("invalid raster extent: ({0}, {1}) to ({2}, {3})")]
    InvalidExtent(f64, f64, f64, f64),
}

/// A columnar point cloud: named attribute vectors of equal length, plus an
/// optional CRS.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    columns: BTreeMap<String, Column>,
    crs: Option<String>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    pub fn new() -> PointCloud {
        PointCloud::default()
    }

    /// Creates a point cloud from name-column pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::cloud::{Column, PointCloud};
    /// let cloud = PointCloud::from_columns([
    ///     ("x", Column::from(vec![1.0, 2.0])),
    ///     ("y", Column::from(vec![3.0, 4.0])),
    /// ])
    /// .unwrap();
    /// assert_eq!(2, cloud.len());
    /// ```
    pub fn from_columns<S, I>(columns: I) -> Result<PointCloud, Error>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Column)>,
    {
        let mut cloud = PointCloud::new();
        for (name, column) in columns {
            cloud.insert(name, column)?;
        }
        Ok(cloud)
    }

    /// Returns the number of points (rows).
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Column::len)
    }

    /// Returns true if the cloud has no points.
    ///
    /// A cloud with columns of length zero is empty too.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the CRS handle, if any.
    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    /// Sets the CRS handle.
    pub fn set_crs(&mut self, crs: Option<String>) {
        self.crs = crs;
    }

    /// Returns the column names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Returns a column by name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Returns a column's elements as a typed slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::cloud::{Column, PointCloud};
    /// let mut cloud = PointCloud::new();
    /// cloud.insert("intensity", Column::from(vec![1u16, 2])).unwrap();
    /// assert_eq!(&[1u16, 2][..], cloud.typed::<u16>("intensity").unwrap());
    /// assert!(cloud.typed::<f64>("intensity").is_err());
    /// ```
    pub fn typed<T: ColumnScalar>(&self, name: &str) -> Result<&[T], Error> {
        let column = self
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        column.typed::<T>().ok_or_else(|| Error::ColumnKind {
            name: name.to_string(),
            expected: T::column_from_vec(Vec::new()).kind(),
            actual: column.kind(),
        })
    }

    /// Inserts or replaces a column.
    ///
    /// The column must match the cloud's length (unless the cloud is empty),
    /// and the coordinate columns `x`, `y`, `z` must be `f64`.
    pub fn insert<S: Into<String>>(&mut self, name: S, column: Column) -> Result<(), Error> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.len() {
            return Err(Error::ColumnLength {
                expected: self.len(),
                actual: column.len(),
                name,
            });
        }
        if COORDINATE_COLUMNS.contains(&name.as_str()) && column.kind() != ValueKind::F64 {
            return Err(Error::ColumnKind {
                name,
                expected: ValueKind::F64,
                actual: column.kind(),
            });
        }
        let _ = self.columns.insert(name, column);
        Ok(())
    }

    /// Removes a column, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    /// Returns one row as an ordered name → value mapping.
    pub fn row(&self, index: usize) -> Result<BTreeMap<&str, Value>, Error> {
        if index >= self.len() {
            return Err(Error::RowOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|(name, column)| (name.as_str(), column.value(index)))
            .collect())
    }

    /// Returns the xyz coordinates of one row.
    ///
    /// Requires `x`, `y`, and `z` columns.
    pub fn coordinates(&self, index: usize) -> Result<[f64; 3], Error> {
        Ok([
            self.typed::<f64>("x")?[index],
            self.typed::<f64>("y")?[index],
            self.typed::<f64>("z")?[index],
        ])
    }

    /// Returns a new cloud holding the rows in the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::cloud::{Column, PointCloud};
    /// let mut cloud = PointCloud::new();
    /// cloud.insert("x", Column::from(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
    /// let sliced = cloud.slice(1..3);
    /// assert_eq!(2, sliced.len());
    /// ```
    pub fn slice(&self, range: Range<usize>) -> PointCloud {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        PointCloud {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.slice_rows(start..end)))
                .collect(),
            crs: self.crs.clone(),
        }
    }

    /// Returns a new cloud holding only the rows whose mask bit is set.
    pub fn retain_mask(&self, mask: &Bitmask) -> PointCloud {
        PointCloud {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.retain_mask(mask)))
                .collect(),
            crs: self.crs.clone(),
        }
    }
}
