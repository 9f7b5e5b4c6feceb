//! End-to-end exercises of the processing pipeline on small literal inputs.

use pointclouds::cloud::{
    apply::{apply, apply_neighborhoods},
    knn, ApplyOptions, Column, Neighborhoods, PointCloud, Raster, RasterMode,
};
use pointclouds::filter::{ExtentFilter, SubRange};
use pointclouds::point::Value;
use pointclouds::{Axis, Builder, Header, Las, Point};

/// The five-point diagonal with z = x².
fn parabola() -> PointCloud {
    PointCloud::from_columns([
        ("x", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
        ("y", Column::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
        ("z", Column::from(vec![1.0, 4.0, 9.0, 16.0, 25.0])),
        ("intensity", Column::from(vec![1u16, 2, 3, 4, 5])),
    ])
    .unwrap()
}

#[test]
fn columns_and_rows() {
    let cloud = parabola();
    assert_eq!(5, cloud.len());
    assert_eq!(
        vec!["intensity", "x", "y", "z"],
        cloud.names().collect::<Vec<_>>()
    );
    let row = cloud.row(2).unwrap();
    assert_eq!(Some(&Value::F64(3.)), row.get("x"));
    assert_eq!(Some(&Value::F64(3.)), row.get("y"));
    assert_eq!(Some(&Value::F64(9.)), row.get("z"));
    assert_eq!(Some(&Value::U16(3)), row.get("intensity"));
}

#[test]
fn index_of_points_near_the_origin() {
    let cloud = parabola();
    let near: Vec<u64> = apply(
        &cloud,
        &["x", "y", "z"],
        &ApplyOptions::default(),
        |index, values| {
            let [x, y, z] = [
                values[0].to_f64().unwrap(),
                values[1].to_f64().unwrap(),
                values[2].to_f64().unwrap(),
            ];
            if (x * x + y * y + z * z).sqrt() <= 5. {
                index as u64 + 1
            } else {
                0
            }
        },
    )
    .unwrap();
    assert_eq!(vec![1, 2, 0, 0, 0], near);
}

#[test]
fn neighbor_tables() {
    let mut cloud = parabola();
    knn::neighbors_into(&mut cloud, 3).unwrap();
    let neighbors = cloud.get("neighbors").unwrap();
    assert_eq!(Some(&[1u64, 2, 3][..]), neighbors.indices(0));
    assert_eq!(Some(&[0u64, 2, 3][..]), neighbors.indices(1));
    assert_eq!(Some(&[1u64, 3, 0][..]), neighbors.indices(2));
    assert_eq!(Some(&[2u64, 4, 1][..]), neighbors.indices(3));
    assert_eq!(Some(&[3u64, 2, 1][..]), neighbors.indices(4));

    // The stored table and the transient one agree.
    let transient = knn::neighbors(&cloud, 3).unwrap();
    assert_eq!(neighbors, &transient);
}

#[test]
fn neighborhood_apply_prepends_self() {
    let mut cloud = parabola();
    knn::neighbors_into(&mut cloud, 2).unwrap();
    let firsts: Vec<f64> = apply_neighborhoods(
        &cloud,
        &["x"],
        Neighborhoods::Stored,
        &ApplyOptions::default(),
        |_, neighborhoods| match neighborhoods[0][0] {
            Value::F64(x) => x,
            _ => unreachable!(),
        },
    )
    .unwrap();
    // The first entry of every neighborhood is the point itself.
    assert_eq!(vec![1., 2., 3., 4., 5.], firsts);
}

#[test]
fn footprint_raster_counts() {
    let cloud = parabola();
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
    // Every retained point appears exactly once.
    assert_eq!(5, raster.point_indices().len());
}

#[test]
fn radius_raster_counts_and_max_x() {
    let cloud = parabola();
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
    let xs = raster.column_cells("x").unwrap();
    let max_x: Vec<Vec<f64>> = (0..3)
        .map(|ix| {
            (0..3)
                .map(|iy| {
                    xs.cell(ix, iy)
                        .filter_map(|value| value.to_f64())
                        .fold(0., f64::max)
                })
                .collect()
        })
        .collect();
    assert_eq!(
        vec![vec![3., 4., 0.], vec![4., 5., 5.], vec![0., 5., 5.]],
        max_x
    );
}

#[test]
fn extent_filter_on_las() {
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
fn subrange_progression() {
    let mut cloud = PointCloud::new();
    cloud
        .insert(
            "x",
            Column::from((0..20).map(f64::from).collect::<Vec<_>>()),
        )
        .unwrap();
    let kept = cloud
        .filter_subrange(&SubRange {
            start: Some(1),
            step: Some(3),
            stop: None,
        })
        .unwrap();
    assert_eq!(7, kept.len());
    assert_eq!(
        &[1., 4., 7., 10., 13., 16., 19.][..],
        kept.typed::<f64>("x").unwrap()
    );
}

#[test]
fn skip_mode_exposes_len_only() {
    use pointclouds::las::{PointReadMode, ReadOptions, WriteOptions};
    use std::io::Cursor;

    let las = Las::new(
        Builder::default().into_header().unwrap(),
        vec![Point::default(); 8],
    )
    .unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    cursor.set_position(0);
    let skipped = Las::read(
        cursor,
        ReadOptions {
            mode: PointReadMode::Skip,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(8, skipped.len());
    assert!(matches!(
        skipped.point(0),
        Err(pointclouds::Error::PointsUnavailable)
    ));
}

#[test]
fn stream_mode_matches_eager() {
    use pointclouds::las::{PointReadMode, ReadOptions, WriteOptions};
    use std::io::Cursor;

    let las = Las::new(
        Builder::default().into_header().unwrap(),
        (0..10)
            .map(|i| Point {
                x: f64::from(i),
                ..Default::default()
            })
            .collect(),
    )
    .unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();

    cursor.set_position(0);
    let streamed = Las::read(
        Cursor::new(cursor.get_ref().clone()),
        ReadOptions {
            mode: PointReadMode::Stream,
            ..Default::default()
        },
    )
    .unwrap();
    cursor.set_position(0);
    let eager = Las::read(cursor, ReadOptions::default()).unwrap();

    // Sequential iteration and random access agree with the eager copy.
    for index in 0..10 {
        assert_eq!(
            eager.point(index).unwrap(),
            streamed.point(index).unwrap()
        );
    }
    assert_eq!(eager.point(3).unwrap(), streamed.point(3).unwrap());
    assert_eq!(eager.point(9).unwrap(), streamed.point(9).unwrap());
}

#[test]
fn build_cloud_from_two_las_sources() {
    use pointclouds::cloud::CloudBuilder;
    use pointclouds::point::Attribute;

    let first = Las::new(
        Header::default(),
        vec![Point {
            x: 1.,
            intensity: 1,
            ..Default::default()
        }],
    )
    .unwrap();
    let second = Las::new(
        Header::default(),
        vec![Point {
            x: 2.,
            intensity: 2,
            ..Default::default()
        }],
    )
    .unwrap();
    let cloud = CloudBuilder::new()
        .attribute("intensity", Attribute::Intensity)
        .build_many(&[first, second])
        .unwrap();
    assert_eq!(2, cloud.len());
    assert_eq!(&[1u16, 2][..], cloud.typed::<u16>("intensity").unwrap());
}
