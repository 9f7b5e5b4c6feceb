//! Parallel application of user functions over a point cloud.
//!
//! [apply] is a per-point map: the function sees one value per selected
//! column and its results land at the same indices in the output.
//! [apply_neighborhoods] is the per-neighborhood variant: the function sees,
//! per column, the values of the point followed by its neighbors.
//!
//! Work is chunked over a rayon fork-join pool; inputs are read-only and
//! every output slot is independent, so invocation order is unspecified but
//! output element `i` always corresponds to input index `i`. A
//! [CancellationToken] is checked at chunk boundaries; on cancellation the
//! partial output is discarded.

use crate::{
    cloud::{knn, Column, Error as CloudError, PointCloud},
    point::Value,
    Error, Result,
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

const CHUNK_SIZE: usize = 1024;

/// A handle for cancelling long-running parallel batches.
///
/// Clones share the flag.
///
/// # Examples
///
/// ```
/// use pointclouds::cloud::CancellationToken;
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Requests cancellation.
    ///
    /// In-flight chunks drain; no new chunks start.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the neighbor lists for [apply_neighborhoods] come from.
#[derive(Debug)]
pub enum Neighborhoods<'a> {
    /// Use the cloud's stored `neighbors` column.
    Stored,

    /// Compute a transient k-nearest-neighbor table.
    ///
    /// The table is not stored back into the cloud.
    Computed(usize),

    /// Use explicit per-point neighbor lists.
    Explicit(&'a [Vec<u64>]),
}

/// Options shared by the apply entry points.
#[derive(Debug, Default)]
pub struct ApplyOptions<'a> {
    /// Cancel the batch through this token.
    pub cancellation: Option<&'a CancellationToken>,
}

/// Applies a function to every point in parallel.
///
/// The function receives the point's index and one [Value] per selected
/// column. The output is a dense vector with element `i` computed from input
/// index `i`; convert it into a column with `Column::from` if it should live
/// in the cloud.
///
/// # Examples
///
/// ```
/// use pointclouds::cloud::{apply::apply, ApplyOptions, Column, PointCloud};
///
/// let mut cloud = PointCloud::new();
/// cloud.insert("x", Column::from(vec![1.0, 2.0, 3.0])).unwrap();
/// let doubled: Vec<f64> = apply(&cloud, &["x"], &ApplyOptions::default(), |_, values| {
///     2. * values[0].to_f64().unwrap()
/// })
/// .unwrap();
/// assert_eq!(vec![2.0, 4.0, 6.0], doubled);
/// ```
pub fn apply<T, F>(
    cloud: &PointCloud,
    columns: &[&str],
    options: &ApplyOptions<'_>,
    function: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, &[Value]) -> T + Send + Sync,
{
    let selected = select(cloud, columns)?;
    let len = cloud.len();
    let mut output: Vec<Option<T>> = Vec::with_capacity(len);
    output.resize_with(len, || None);
    output
        .par_chunks_mut(CHUNK_SIZE)
        .enumerate()
        .try_for_each(|(chunk_index, chunk)| {
            if options
                .cancellation
                .is_some_and(CancellationToken::is_cancelled)
            {
                return Err(Error::Cancelled);
            }
            let mut values = Vec::with_capacity(selected.len());
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let index = chunk_index * CHUNK_SIZE + offset;
                values.clear();
                values.extend(selected.iter().map(|column| column.value(index)));
                *slot = Some(function(index, &values));
            }
            Ok(())
        })?;
    Ok(output
        .into_iter()
        .map(|slot| slot.expect("every slot was filled"))
        .collect())
}

/// Applies a function to every point's neighborhood in parallel.
///
/// Per selected column, the function receives the values at
/// `[i, neighbors[i]...]`: the point itself first, then its neighbors.
///
/// # Examples
///
/// ```
/// use pointclouds::cloud::{
///     apply::apply_neighborhoods, ApplyOptions, Column, Neighborhoods, PointCloud,
/// };
///
/// let mut cloud = PointCloud::new();
/// cloud.insert("x", Column::from(vec![0.0, 1.0, 2.0])).unwrap();
/// cloud.insert("y", Column::from(vec![0.0, 0.0, 0.0])).unwrap();
/// cloud.insert("z", Column::from(vec![0.0, 0.0, 0.0])).unwrap();
/// // Mean x over each point and its nearest neighbor.
/// let means: Vec<f64> = apply_neighborhoods(
///     &cloud,
///     &["x"],
///     Neighborhoods::Computed(1),
///     &ApplyOptions::default(),
///     |_, neighborhoods| {
///         let xs = &neighborhoods[0];
///         xs.iter().filter_map(|v| v.to_f64()).sum::<f64>() / xs.len() as f64
///     },
/// )
/// .unwrap();
/// // Ties go to the lower index, so point 1's neighbor is point 0.
/// assert_eq!(vec![0.5, 0.5, 1.5], means);
/// ```
pub fn apply_neighborhoods<T, F>(
    cloud: &PointCloud,
    columns: &[&str],
    neighborhoods: Neighborhoods<'_>,
    options: &ApplyOptions<'_>,
    function: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, &[Vec<Value>]) -> T + Send + Sync,
{
    let selected = select(cloud, columns)?;
    let len = cloud.len();
    let table: NeighborTable<'_> = match neighborhoods {
        Neighborhoods::Stored => {
            let column = cloud
                .get("neighbors")
                .ok_or_else(|| CloudError::MissingColumn("neighbors".to_string()))?;
            match column {
                Column::Indices { width, data } => NeighborTable::Flat {
                    width: *width,
                    data,
                },
                other => {
                    return Err(CloudError::ColumnKind {
                        name: "neighbors".to_string(),
                        expected: crate::point::ValueKind::Indices,
                        actual: other.kind(),
                    }
                    .into())
                }
            }
        }
        Neighborhoods::Computed(k) => {
            let (width, data) = knn::neighbor_table(cloud, k)?;
            NeighborTable::Owned { width, data }
        }
        Neighborhoods::Explicit(lists) => {
            if lists.len() != len {
                return Err(CloudError::ColumnLength {
                    name: "neighbors".to_string(),
                    expected: len,
                    actual: lists.len(),
                }
                .into());
            }
            NeighborTable::Lists(lists)
        }
    };
    let mut output: Vec<Option<T>> = Vec::with_capacity(len);
    output.resize_with(len, || None);
    output
        .par_chunks_mut(CHUNK_SIZE)
        .enumerate()
        .try_for_each(|(chunk_index, chunk)| {
            if options
                .cancellation
                .is_some_and(CancellationToken::is_cancelled)
            {
                return Err(Error::Cancelled);
            }
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let index = chunk_index * CHUNK_SIZE + offset;
                let neighbors = table.neighbors(index);
                let per_column = selected
                    .iter()
                    .map(|column| {
                        let mut values = Vec::with_capacity(neighbors.len() + 1);
                        values.push(column.value(index));
                        values.extend(
                            neighbors
                                .iter()
                                .map(|&neighbor| column.value(neighbor as usize)),
                        );
                        values
                    })
                    .collect::<Vec<_>>();
                *slot = Some(function(index, &per_column));
            }
            Ok(())
        })?;
    Ok(output
        .into_iter()
        .map(|slot| slot.expect("every slot was filled"))
        .collect())
}

enum NeighborTable<'a> {
    Flat { width: usize, data: &'a [u64] },
    Owned { width: usize, data: Vec<u64> },
    Lists(&'a [Vec<u64>]),
}

impl NeighborTable<'_> {
    fn neighbors(&self, index: usize) -> &[u64] {
        match self {
            NeighborTable::Flat { width, data } => &data[index * width..(index + 1) * width],
            NeighborTable::Owned { width, data } => &data[index * width..(index + 1) * width],
            NeighborTable::Lists(lists) => &lists[index],
        }
    }
}

fn select<'a>(cloud: &'a PointCloud, columns: &[&str]) -> Result<Vec<&'a Column>> {
    columns
        .iter()
        .map(|&name| {
            cloud
                .get(name)
                .ok_or_else(|| CloudError::MissingColumn(name.to_string()).into())
        })
        .collect()
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
            .insert("intensity", Column::from(vec![10u16, 20, 30, 40, 50]))
            .unwrap();
        cloud
    }

    #[test]
    fn per_point() {
        let sums: Vec<f64> = apply(
            &cloud(),
            &["x", "intensity"],
            &ApplyOptions::default(),
            |_, values| values[0].to_f64().unwrap() + values[1].to_f64().unwrap(),
        )
        .unwrap();
        assert_eq!(vec![11., 22., 33., 44., 55.], sums);
    }

    #[test]
    fn output_index_matches_input_index() {
        let indices: Vec<u64> =
            apply(&cloud(), &[], &ApplyOptions::default(), |index, _| {
                index as u64
            })
            .unwrap();
        assert_eq!(vec![0, 1, 2, 3, 4], indices);
    }

    #[test]
    fn deterministic_for_pure_functions() {
        let run = || {
            apply(&cloud(), &["x"], &ApplyOptions::default(), |_, values| {
                values[0].to_f64().unwrap().sqrt()
            })
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<Vec<u64>> = apply(
            &cloud(),
            &[],
            &ApplyOptions {
                cancellation: Some(&token),
            },
            |index, _| index as u64,
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn missing_column() {
        let result: Result<Vec<f64>> =
            apply(&cloud(), &["nope"], &ApplyOptions::default(), |_, _| 0.);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_neighborhoods() {
        let lists = vec![
            vec![1, 2],
            vec![0, 2],
            vec![1, 3],
            vec![2, 4],
            vec![3, 2],
        ];
        let sums: Vec<f64> = apply_neighborhoods(
            &cloud(),
            &["x"],
            Neighborhoods::Explicit(&lists),
            &ApplyOptions::default(),
            |_, neighborhoods| neighborhoods[0].iter().filter_map(Value::to_f64).sum(),
        )
        .unwrap();
        // Each sum is the point's own x plus its two neighbors'.
        assert_eq!(vec![6., 6., 9., 12., 12.], sums);
    }

    #[test]
    fn stored_neighbors_must_be_an_index_column() {
        let result: Result<Vec<f64>> = apply_neighborhoods(
            &cloud(),
            &["x"],
            Neighborhoods::Stored,
            &ApplyOptions::default(),
            |_, _| 0.,
        );
        assert!(result.is_err());
    }
}
