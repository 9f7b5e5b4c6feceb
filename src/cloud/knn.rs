//! K-nearest-neighbor queries over a point cloud.
//!
//! A [KnnIndex] is a static k-d tree over the cloud's 3D coordinates.
//! Construction is O(n log n) amortised; queries for one point return the k
//! closest *other* points, ties broken by ascending index. [neighbors]
//! computes a whole neighbor table in parallel, and [neighbors_into] stores
//! it as the cloud's `neighbors` column.

use crate::{
    cloud::{Column, Error, PointCloud},
    Result,
};
use kdtree::{distance::squared_euclidean, KdTree};
use rayon::prelude::*;

/// A static spatial index over a cloud's `x`, `y`, and `z` columns.
pub struct KnnIndex {
    tree: KdTree<f64, usize, [f64; 3]>,
    points: Vec<[f64; 3]>,
}

impl std::fmt::Debug for KnnIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnnIndex")
            .field("len", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl KnnIndex {
    /// Builds an index over the cloud's coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::cloud::{Column, KnnIndex, PointCloud};
    /// let mut cloud = PointCloud::new();
    /// cloud.insert("x", Column::from(vec![0.0, 1.0])).unwrap();
    /// cloud.insert("y", Column::from(vec![0.0, 0.0])).unwrap();
    /// cloud.insert("z", Column::from(vec![0.0, 0.0])).unwrap();
    /// let index = KnnIndex::new(&cloud).unwrap();
    /// assert_eq!(vec![1], index.nearest(0, 1).unwrap());
    /// ```
    pub fn new(cloud: &PointCloud) -> Result<KnnIndex> {
        let xs = cloud.typed::<f64>("x")?;
        let ys = cloud.typed::<f64>("y")?;
        let zs = cloud.typed::<f64>("z")?;
        let points: Vec<[f64; 3]> = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| [x, y, z])
            .collect();
        let mut tree = KdTree::with_capacity(3, 64);
        for (index, &point) in points.iter().enumerate() {
            tree.add(point, index)
                .map_err(|err| Error::SpatialIndex(format!("{:?}", err)))?;
        }
        Ok(KnnIndex { tree, points })
    }

    /// Returns the number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the indices of the `k` points closest to the indexed point,
    /// the point itself excluded.
    ///
    /// Ordered by distance, ties broken by ascending index.
    pub fn nearest(&self, index: usize, k: usize) -> Result<Vec<u64>> {
        if k + 1 > self.len() {
            return Err(Error::NotEnoughPoints { k, len: self.len() }.into());
        }
        self.query(self.points[index], k, Some(index))
    }

    /// Returns the indices of the `k` points closest to an arbitrary
    /// location.
    pub fn nearest_to(&self, xyz: [f64; 3], k: usize) -> Result<Vec<u64>> {
        if k > self.len() {
            return Err(Error::NotEnoughPoints { k, len: self.len() }.into());
        }
        self.query(xyz, k, None)
    }

    fn query(&self, xyz: [f64; 3], k: usize, exclude: Option<usize>) -> Result<Vec<u64>> {
        // One extra in case the excluded point is among the hits.
        let want = k + usize::from(exclude.is_some());
        let mut hits = self
            .tree
            .nearest(&xyz, want, &squared_euclidean)
            .map_err(|err| Error::SpatialIndex(format!("{:?}", err)))?
            .into_iter()
            .filter(|(_, &index)| Some(index) != exclude)
            .map(|(distance, &index)| (distance, index as u64))
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);
        Ok(hits.into_iter().map(|(_, index)| index).collect())
    }
}

/// Computes the k-nearest-neighbor table without storing it.
///
/// Returns an index column: one fixed-width tuple of neighbor indices per
/// point.
///
/// # Examples
///
/// ```
/// use pointclouds::cloud::{knn::neighbors, Column, PointCloud};
/// let mut cloud = PointCloud::new();
/// cloud.insert("x", Column::from(vec![1.0, 2.0, 3.0])).unwrap();
/// cloud.insert("y", Column::from(vec![0.0, 0.0, 0.0])).unwrap();
/// cloud.insert("z", Column::from(vec![0.0, 0.0, 0.0])).unwrap();
/// let column = neighbors(&cloud, 1).unwrap();
/// assert_eq!(Some(&[1u64][..]), column.indices(0));
/// assert_eq!(Some(&[0u64][..]), column.indices(1));
/// assert_eq!(Some(&[1u64][..]), column.indices(2));
/// ```
pub fn neighbors(cloud: &PointCloud, k: usize) -> Result<Column> {
    let (width, data) = neighbor_table(cloud, k)?;
    Ok(Column::Indices { width, data })
}

/// Computes the k-nearest-neighbor table and stores it as the cloud's
/// `neighbors` column.
pub fn neighbors_into(cloud: &mut PointCloud, k: usize) -> Result<()> {
    let column = neighbors(cloud, k)?;
    cloud.insert("neighbors", column)?;
    Ok(())
}

/// Computes the flattened neighbor table, `k` entries per point.
pub(crate) fn neighbor_table(cloud: &PointCloud, k: usize) -> Result<(usize, Vec<u64>)> {
    let index = KnnIndex::new(cloud)?;
    if k + 1 > index.len() {
        return Err(Error::NotEnoughPoints {
            k,
            len: index.len(),
        }
        .into());
    }
    let tables = (0..index.len())
        .into_par_iter()
        .map(|point| index.nearest(point, k))
        .collect::<Result<Vec<_>>>()?;
    let mut data = Vec::with_capacity(k * index.len());
    for table in tables {
        data.extend(table);
    }
    Ok((k, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PointCloud {
        // The five-point parabola: z = x^2 along the diagonal.
        let mut cloud = PointCloud::new();
        cloud
            .insert("x", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        cloud
            .insert("y", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        cloud
            .insert("z", Column::from(vec![1.0, 4.0, 9.0, 16.0, 25.0]))
            .unwrap();
        cloud
    }

    #[test]
    fn three_neighbors() {
        let column = neighbors(&cloud(), 3).unwrap();
        assert_eq!(Some(&[1u64, 2, 3][..]), column.indices(0));
        assert_eq!(Some(&[0u64, 2, 3][..]), column.indices(1));
        assert_eq!(Some(&[1u64, 3, 0][..]), column.indices(2));
        assert_eq!(Some(&[2u64, 4, 1][..]), column.indices(3));
        assert_eq!(Some(&[3u64, 2, 1][..]), column.indices(4));
    }

    #[test]
    fn stored_neighbors() {
        let mut cloud = cloud();
        neighbors_into(&mut cloud, 2).unwrap();
        assert!(cloud.get("neighbors").is_some());
        assert_eq!(5, cloud.get("neighbors").unwrap().len());
    }

    #[test]
    fn self_is_excluded() {
        let index = KnnIndex::new(&cloud()).unwrap();
        for point in 0..5 {
            let nearest = index.nearest(point, 4).unwrap();
            assert!(!nearest.contains(&(point as u64)));
            assert_eq!(4, nearest.len());
        }
    }

    #[test]
    fn too_many_neighbors() {
        assert!(neighbors(&cloud(), 5).is_err());
        assert!(neighbors(&cloud(), 4).is_ok());
    }

    #[test]
    fn knn_minimises_distance() {
        let cloud = cloud();
        let index = KnnIndex::new(&cloud).unwrap();
        let nearest = index.nearest(0, 2).unwrap();
        let distance = |a: usize, b: usize| {
            let pa = cloud.coordinates(a).unwrap();
            let pb = cloud.coordinates(b).unwrap();
            (pa[0] - pb[0]).powi(2) + (pa[1] - pb[1]).powi(2) + (pa[2] - pb[2]).powi(2)
        };
        let mut best = (1..5).map(|other| (distance(0, other), other as u64)).collect::<Vec<_>>();
        best.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(vec![best[0].1, best[1].1], nearest);
    }
}
