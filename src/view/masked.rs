use crate::{
    point::Attribute, point::Format, point::Value, raw,
    view::{owned::out_of_bounds, Bitmask, PointView},
    Result,
};

/// A filtered view: a parent view plus a bitmask of surviving indices.
///
/// The mask's population count is cached, so `len` stays O(1), and iteration
/// advances with the bitmask's `find_next` rather than probing every parent
/// index. View index `n` maps to the parent index of the `n`th set bit, in
/// ascending order.
#[derive(Clone, Debug)]
pub struct Masked<V> {
    parent: V,
    mask: Bitmask,
}

impl<V: PointView> Masked<V> {
    /// Creates a masked view.
    ///
    /// The mask length must equal the parent's length.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::Format;
    /// use pointclouds::view::{Bitmask, Masked, OwnedPoints, PointView};
    /// let parent = OwnedPoints::new(vec![Default::default(); 4], Format::default());
    /// let mut mask = Bitmask::all_set(4);
    /// mask.clear(1);
    /// let masked = Masked::new(parent, mask);
    /// assert_eq!(3, masked.len());
    /// ```
    pub fn new(parent: V, mask: Bitmask) -> Masked<V> {
        assert_eq!(
            parent.len(),
            mask.len(),
            "the mask must cover the parent view exactly"
        );
        Masked { parent, mask }
    }

    /// Creates a masked view by evaluating a predicate on every parent
    /// record.
    pub fn from_predicate<F>(parent: V, mut predicate: F) -> Result<Masked<V>>
    where
        F: FnMut(&raw::Point) -> bool,
    {
        let mut mask = Bitmask::all_set(parent.len());
        for index in 0..parent.len() {
            if !predicate(&parent.read(index)?) {
                mask.clear(index);
            }
        }
        Ok(Masked { parent, mask })
    }

    /// Clears the bits of the points failing the predicate, in place.
    ///
    /// Only surviving points are visited, so repeated filters are
    /// idempotent and get cheaper each time.
    pub fn filter_in_place<F>(&mut self, mut predicate: F) -> Result<()>
    where
        F: FnMut(&raw::Point) -> bool,
    {
        let mut next = 0;
        while let Some(index) = self.mask.find_next(next) {
            if !predicate(&self.parent.read(index)?) {
                self.mask.clear(index);
            }
            next = index + 1;
        }
        Ok(())
    }

    /// Returns the parent index of the `n`th surviving point.
    pub fn parent_index(&self, n: u64) -> Option<u64> {
        self.mask.select(n)
    }

    /// Returns an iterator over the surviving parent indices, ascending.
    pub fn parent_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.mask.ones()
    }

    /// Returns the bitmask.
    pub fn mask(&self) -> &Bitmask {
        &self.mask
    }

    /// Returns a reference to the parent view.
    pub fn parent(&self) -> &V {
        &self.parent
    }

    /// Discards the mask and returns the parent view.
    pub fn into_parent(self) -> V {
        self.parent
    }
}

impl<V: PointView> PointView for Masked<V> {
    fn len(&self) -> u64 {
        self.mask.count()
    }

    fn format(&self) -> Format {
        self.parent.format()
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        let parent_index = self
            .mask
            .select(index)
            .ok_or_else(|| out_of_bounds(index, self.len()))?;
        self.parent.read(parent_index)
    }

    fn read_attribute(&self, index: u64, attribute: Attribute) -> Result<Option<Value>> {
        let parent_index = self
            .mask
            .select(index)
            .ok_or_else(|| out_of_bounds(index, self.len()))?;
        self.parent.read_attribute(parent_index, attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::OwnedPoints;

    fn parent() -> OwnedPoints {
        let points = (0..10)
            .map(|x| raw::Point {
                x,
                ..Default::default()
            })
            .collect();
        OwnedPoints::new(points, Format::default())
    }

    #[test]
    fn predicate_filter() {
        let masked = Masked::from_predicate(parent(), |point| point.x % 2 == 0).unwrap();
        assert_eq!(5, masked.len());
        let xs = masked
            .iter()
            .map(|point| point.unwrap().x)
            .collect::<Vec<_>>();
        assert_eq!(vec![0, 2, 4, 6, 8], xs);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut masked = Masked::from_predicate(parent(), |point| point.x < 5).unwrap();
        masked.filter_in_place(|point| point.x < 5).unwrap();
        assert_eq!(5, masked.len());
    }

    #[test]
    fn in_place_narrowing() {
        let mut masked = Masked::from_predicate(parent(), |point| point.x < 8).unwrap();
        masked.filter_in_place(|point| point.x >= 4).unwrap();
        assert_eq!(4, masked.len());
        let xs = masked
            .iter()
            .map(|point| point.unwrap().x)
            .collect::<Vec<_>>();
        assert_eq!(vec![4, 5, 6, 7], xs);
    }

    #[test]
    #[should_panic(expected = "the mask must cover")]
    fn mismatched_mask() {
        let _ = Masked::new(parent(), Bitmask::all_set(3));
    }
}
