//! Rasterization of a point cloud onto a regular 2D grid.
//!
//! A [Raster] maps every grid cell to a set of point indices, stored as a
//! CSR-style pair of buffers: a flat `point_indices` array and per-cell
//! `offsets` (a prefix sum). The parent cloud's columns are never copied;
//! per-cell column values are exposed lazily through [CellValues].

use crate::{
    cloud::{Column, Error, PointCloud},
    point::Value,
    Result,
};
use kdtree::{distance::squared_euclidean, KdTree};
use rayon::prelude::*;

/// How points are assigned to cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RasterMode {
    /// Each point lands in at most one cell, by its footprint:
    /// `ix = floor((x - xmin) / dx)`. Points outside the extent are dropped.
    Footprint,

    /// Each cell collects every point within the radius of its center,
    /// measured in the x/y plane. Points may land in several cells; cells
    /// may be empty.
    Radius(f64),

    /// Each cell collects exactly its k nearest points, by distance from
    /// the cell center in the x/y plane.
    Knn(usize),
}

/// A rasterized point cloud.
///
/// ```
/// use pointclouds::cloud::{Column, PointCloud, Raster, RasterMode};
///
/// let mut cloud = PointCloud::new();
/// cloud.insert("x", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
/// cloud.insert("y", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
/// let raster = Raster::new(
///     &cloud,
///     (3, 3),
///     Some(((0., 0.), (7., 7.))),
///     RasterMode::Footprint,
/// )
/// .unwrap();
/// assert_eq!(&[0, 1], raster.cell(0, 0));
/// assert_eq!(&[2, 3], raster.cell(1, 1));
/// assert_eq!(&[4], raster.cell(2, 2));
/// assert!(raster.cell(1, 0).is_empty());
/// ```
#[derive(Debug)]
pub struct Raster<'a> {
    cloud: &'a PointCloud,
    nx: usize,
    ny: usize,
    extent: ((f64, f64), (f64, f64)),
    offsets: Vec<usize>,
    point_indices: Vec<usize>,
}

impl<'a> Raster<'a> {
    /// Rasterizes a cloud onto an `(nx, ny)` grid.
    ///
    /// Without an explicit extent, the cloud's x/y bounding box is used.
    pub fn new(
        cloud: &'a PointCloud,
        (nx, ny): (usize, usize),
        extent: Option<((f64, f64), (f64, f64))>,
        mode: RasterMode,
    ) -> Result<Raster<'a>> {
        let xs = cloud.typed::<f64>("x")?;
        let ys = cloud.typed::<f64>("y")?;
        let ((xmin, ymin), (xmax, ymax)) = match extent {
            Some(extent) => extent,
            None => {
                let xmin = xs.iter().copied().fold(f64::INFINITY, f64::min);
                let xmax = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let ymin = ys.iter().copied().fold(f64::INFINITY, f64::min);
                let ymax = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                ((xmin, ymin), (xmax, ymax))
            }
        };
        if !(xmin < xmax && ymin < ymax) || nx == 0 || ny == 0 {
            return Err(Error::InvalidExtent(xmin, ymin, xmax, ymax).into());
        }
        let dx = (xmax - xmin) / nx as f64;
        let dy = (ymax - ymin) / ny as f64;
        let cells = nx * ny;
        let (offsets, point_indices) = match mode {
            RasterMode::Footprint => {
                let mut counts = vec![0usize; cells];
                let assign = |x: f64, y: f64| -> Option<usize> {
                    let ix = cell_coordinate(x, xmin, xmax, dx, nx)?;
                    let iy = cell_coordinate(y, ymin, ymax, dy, ny)?;
                    Some(ix * ny + iy)
                };
                for (&x, &y) in xs.iter().zip(ys) {
                    if let Some(cell) = assign(x, y) {
                        counts[cell] += 1;
                    }
                }
                let offsets = prefix_sum(&counts);
                let mut cursors: Vec<usize> = std::iter::once(0)
                    .chain(offsets[..cells - 1].iter().copied())
                    .collect();
                let mut point_indices = vec![0usize; offsets[cells - 1]];
                for (point, (&x, &y)) in xs.iter().zip(ys).enumerate() {
                    if let Some(cell) = assign(x, y) {
                        point_indices[cursors[cell]] = point;
                        cursors[cell] += 1;
                    }
                }
                (offsets, point_indices)
            }
            RasterMode::Radius(radius) => {
                let tree = xy_tree(xs, ys)?;
                let per_cell = (0..cells)
                    .into_par_iter()
                    .map(|cell| {
                        let center = cell_center(cell, ny, xmin, ymin, dx, dy);
                        let mut hits = tree
                            .within(&center, radius * radius, &squared_euclidean)
                            .map_err(|err| Error::SpatialIndex(format!("{:?}", err)))?
                            .into_iter()
                            .map(|(_, &point)| point)
                            .collect::<Vec<_>>();
                        hits.sort_unstable();
                        Ok(hits)
                    })
                    .collect::<Result<Vec<_>>>()?;
                assemble(per_cell)
            }
            RasterMode::Knn(k) => {
                if k > cloud.len() {
                    return Err(Error::NotEnoughPoints {
                        k,
                        len: cloud.len(),
                    }
                    .into());
                }
                let tree = xy_tree(xs, ys)?;
                let per_cell = (0..cells)
                    .into_par_iter()
                    .map(|cell| {
                        let center = cell_center(cell, ny, xmin, ymin, dx, dy);
                        let mut hits = tree
                            .nearest(&center, k, &squared_euclidean)
                            .map_err(|err| Error::SpatialIndex(format!("{:?}", err)))?
                            .into_iter()
                            .map(|(distance, &point)| (distance, point))
                            .collect::<Vec<_>>();
                        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                        Ok(hits.into_iter().map(|(_, point)| point).collect())
                    })
                    .collect::<Result<Vec<_>>>()?;
                assemble(per_cell)
            }
        };
        Ok(Raster {
            cloud,
            nx,
            ny,
            extent: ((xmin, ymin), (xmax, ymax)),
            offsets,
            point_indices,
        })
    }

    /// Returns the grid dimensions `(nx, ny)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Returns the extent `((xmin, ymin), (xmax, ymax))`.
    pub fn extent(&self) -> ((f64, f64), (f64, f64)) {
        self.extent
    }

    /// Returns the parent cloud.
    pub fn cloud(&self) -> &PointCloud {
        self.cloud
    }

    /// Returns the point indices assigned to the cell.
    pub fn cell(&self, ix: usize, iy: usize) -> &[usize] {
        let cell = ix * self.ny + iy;
        let start = if cell == 0 { 0 } else { self.offsets[cell - 1] };
        &self.point_indices[start..self.offsets[cell]]
    }

    /// Returns the per-cell point counts as an `[ix][iy]` matrix.
    pub fn counts(&self) -> Vec<Vec<usize>> {
        (0..self.nx)
            .map(|ix| (0..self.ny).map(|iy| self.cell(ix, iy).len()).collect())
            .collect()
    }

    /// Returns the per-cell offsets (a prefix sum over the cells).
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Returns the flat buffer of assigned point indices.
    pub fn point_indices(&self) -> &[usize] {
        &self.point_indices
    }

    /// Returns a lazy per-cell view over one of the parent's columns.
    pub fn column_cells(&self, name: &str) -> Result<CellValues<'_>> {
        let column = self
            .cloud
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        Ok(CellValues {
            raster: self,
            column,
        })
    }
}

/// A lazy 2D view over one column, cell by cell.
///
/// Nothing is copied until a cell is asked for its values.
#[derive(Debug)]
pub struct CellValues<'r> {
    raster: &'r Raster<'r>,
    column: &'r Column,
}

impl CellValues<'_> {
    /// Returns an iterator over the column values of the points in the cell.
    pub fn cell(&self, ix: usize, iy: usize) -> impl Iterator<Item = Value> + '_ {
        self.raster
            .cell(ix, iy)
            .iter()
            .map(|&point| self.column.value(point))
    }

    /// Returns an iterator over all cells, yielding `(ix, iy)` and the cell's
    /// values.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Vec<Value>)> + '_ {
        let (nx, ny) = self.raster.dimensions();
        (0..nx).flat_map(move |ix| {
            (0..ny).map(move |iy| ((ix, iy), self.cell(ix, iy).collect()))
        })
    }
}

fn cell_coordinate(value: f64, min: f64, max: f64, d: f64, n: usize) -> Option<usize> {
    if value < min || value > max {
        return None;
    }
    let cell = ((value - min) / d).floor() as usize;
    // A point exactly on the upper edge belongs to the last cell.
    Some(cell.min(n - 1))
}

fn cell_center(cell: usize, ny: usize, xmin: f64, ymin: f64, dx: f64, dy: f64) -> [f64; 2] {
    let ix = cell / ny;
    let iy = cell % ny;
    [
        xmin + (ix as f64 + 0.5) * dx,
        ymin + (iy as f64 + 0.5) * dy,
    ]
}

fn prefix_sum(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut total = 0;
    for &count in counts {
        total += count;
        offsets.push(total);
    }
    offsets
}

fn assemble(per_cell: Vec<Vec<usize>>) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = Vec::with_capacity(per_cell.len());
    let mut point_indices = Vec::new();
    for cell in per_cell {
        point_indices.extend_from_slice(&cell);
        offsets.push(point_indices.len());
    }
    (offsets, point_indices)
}

fn xy_tree(xs: &[f64], ys: &[f64]) -> Result<KdTree<f64, usize, [f64; 2]>> {
    let mut tree = KdTree::with_capacity(2, 64);
    for (index, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        tree.add([x, y], index)
            .map_err(|err| Error::SpatialIndex(format!("{:?}", err)))?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PointCloud {
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
    fn footprint_counts() {
        let cloud = cloud();
        let raster = Raster::new(
            &cloud,
            (3, 3),
            Some(((0., 0.), (7., 7.))),
            RasterMode::Footprint,
        )
        .unwrap();
        assert_eq!(
            vec![vec![2, 0, 0], vec![0, 2, 0], vec![0, 0, 1]],
            raster.counts()
        );
    }

    #[test]
    fn footprint_partitions_contained_points() {
        let cloud = cloud();
        let raster = Raster::new(
            &cloud,
            (3, 3),
            Some(((0., 0.), (7., 7.))),
            RasterMode::Footprint,
        )
        .unwrap();
        let total: usize = raster.counts().iter().flatten().sum();
        assert_eq!(5, total);
        let (nx, ny) = raster.dimensions();
        assert_eq!(
            *raster.offsets().last().unwrap(),
            raster.point_indices().len()
        );
        assert_eq!(nx * ny, raster.offsets().len());
    }

    #[test]
    fn radius_counts_and_max() {
        let cloud = cloud();
        let raster = Raster::new(
            &cloud,
            (3, 3),
            Some(((0., 0.), (7., 7.))),
            RasterMode::Radius(3.),
        )
        .unwrap();
        assert_eq!(
            vec![vec![3, 4, 0], vec![4, 4, 3], vec![0, 3, 2]],
            raster.counts()
        );
        let values = raster.column_cells("x").unwrap();
        let max_x: Vec<Vec<f64>> = (0..3)
            .map(|ix| {
                (0..3)
                    .map(|iy| {
                        values
                            .cell(ix, iy)
                            .filter_map(|value| value.to_f64())
                            .fold(0., f64::max)
                    })
                    .collect()
            })
            .collect();
        assert_eq!(
            vec![
                vec![3., 4., 0.],
                vec![4., 5., 5.],
                vec![0., 5., 5.]
            ],
            max_x
        );
    }

    #[test]
    fn knn_exact_count_per_cell() {
        let cloud = cloud();
        let raster = Raster::new(&cloud, (2, 2), None, RasterMode::Knn(2)).unwrap();
        for ix in 0..2 {
            for iy in 0..2 {
                assert_eq!(2, raster.cell(ix, iy).len());
            }
        }
        assert!(Raster::new(&cloud, (2, 2), None, RasterMode::Knn(6)).is_err());
    }

    #[test]
    fn default_extent_is_the_bounding_box() {
        let cloud = cloud();
        let raster = Raster::new(&cloud, (2, 2), None, RasterMode::Footprint).unwrap();
        assert_eq!(((1., 1.), (5., 5.)), raster.extent());
        // Points on the max edge land in the last cell, so all five points
        // are retained.
        let total: usize = raster.counts().iter().flatten().sum();
        assert_eq!(5, total);
    }

    #[test]
    fn lazy_cell_values() {
        let cloud = cloud();
        let raster = Raster::new(
            &cloud,
            (3, 3),
            Some(((0., 0.), (7., 7.))),
            RasterMode::Footprint,
        )
        .unwrap();
        let values = raster.column_cells("z").unwrap();
        assert_eq!(
            vec![Value::F64(1.), Value::F64(4.)],
            values.cell(0, 0).collect::<Vec<_>>()
        );
        assert_eq!(9, values.iter().count());
    }

    #[test]
    fn inverted_extent() {
        let cloud = cloud();
        assert!(Raster::new(
            &cloud,
            (3, 3),
            Some(((7., 0.), (0., 7.))),
            RasterMode::Footprint
        )
        .is_err());
    }
}
