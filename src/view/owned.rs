use crate::{point::Format, raw, view::PointView, Error, Result};

/// A point view over an owned, contiguous vector of records.
///
/// This is the default backing on eager reads and the only fully mutable
/// view.
#[derive(Clone, Debug, Default)]
pub struct OwnedPoints {
    points: Vec<raw::Point>,
    format: Format,
}

impl OwnedPoints {
    /// Creates an owned view from records.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::view::OwnedPoints;
    /// let view = OwnedPoints::new(vec![Default::default()], Format::new(0).unwrap());
    /// ```
    pub fn new(points: Vec<raw::Point>, format: Format) -> OwnedPoints {
        OwnedPoints { points, format }
    }

    /// Appends a record.
    pub fn push(&mut self, point: raw::Point) {
        self.points.push(point);
    }

    /// Keeps only the records for which the predicate returns true.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::raw;
    /// use pointclouds::view::{OwnedPoints, PointView};
    /// let points = (0..4)
    ///     .map(|x| raw::Point { x, ..Default::default() })
    ///     .collect();
    /// let mut view = OwnedPoints::new(points, Format::new(0).unwrap());
    /// view.retain(|point| point.x % 2 == 0);
    /// assert_eq!(2, view.len());
    /// ```
    pub fn retain<F: FnMut(&raw::Point) -> bool>(&mut self, predicate: F) {
        self.points.retain(predicate);
    }

    /// Returns a slice of the records.
    pub fn as_slice(&self) -> &[raw::Point] {
        &self.points
    }
}

impl PointView for OwnedPoints {
    fn len(&self) -> u64 {
        self.points.len() as u64
    }

    fn format(&self) -> Format {
        self.format
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        self.points
            .get(index as usize)
            .cloned()
            .ok_or_else(|| out_of_bounds(index, self.len()))
    }
}

pub(crate) fn out_of_bounds(index: u64, len: u64) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("point index {} is out of bounds of the {} points", index, len),
    ))
}
