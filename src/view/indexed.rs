use crate::{
    point::Attribute, point::Format, point::Value, raw,
    view::{owned::out_of_bounds, PointView},
    Result,
};
use std::ops::Range;

/// A contiguous slice of a parent view.
///
/// Random access is O(1) on top of the parent's access. To iterate a view in
/// reverse, slice it with a reversed range one index at a time; the views
/// themselves only run forward.
#[derive(Clone, Debug)]
pub struct Indexed<V> {
    parent: V,
    range: Range<u64>,
}

impl<V: PointView> Indexed<V> {
    /// Creates a sliced view over the ordinal range.
    ///
    /// The range is clamped to the parent's length.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::view::{Indexed, OwnedPoints, PointView};
    /// let parent = OwnedPoints::new(vec![Default::default(); 10], Format::default());
    /// let sliced = Indexed::new(parent, 2..5);
    /// assert_eq!(3, sliced.len());
    /// ```
    pub fn new(parent: V, range: Range<u64>) -> Indexed<V> {
        let end = range.end.min(parent.len());
        let start = range.start.min(end);
        Indexed {
            parent,
            range: start..end,
        }
    }

    /// Returns the parent range this view covers.
    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }

    /// Returns a reference to the parent view.
    pub fn parent(&self) -> &V {
        &self.parent
    }

    /// Discards the range and returns the parent view.
    pub fn into_parent(self) -> V {
        self.parent
    }
}

impl<V: PointView> PointView for Indexed<V> {
    fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    fn format(&self) -> Format {
        self.parent.format()
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        if index >= self.len() {
            return Err(out_of_bounds(index, self.len()));
        }
        self.parent.read(self.range.start + index)
    }

    fn read_attribute(&self, index: u64, attribute: Attribute) -> Result<Option<Value>> {
        if index >= self.len() {
            return Err(out_of_bounds(index, self.len()));
        }
        self.parent.read_attribute(self.range.start + index, attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::OwnedPoints;

    #[test]
    fn slicing() {
        let points = (0..10)
            .map(|x| raw::Point {
                x,
                ..Default::default()
            })
            .collect();
        let parent = OwnedPoints::new(points, Format::default());
        let sliced = Indexed::new(parent, 3..7);
        assert_eq!(4, sliced.len());
        assert_eq!(3, sliced.read(0).unwrap().x);
        assert_eq!(6, sliced.read(3).unwrap().x);
        assert!(sliced.read(4).is_err());
    }

    #[test]
    fn clamped() {
        let parent = OwnedPoints::new(vec![Default::default(); 3], Format::default());
        let sliced = Indexed::new(parent, 2..10);
        assert_eq!(1, sliced.len());
    }
}
