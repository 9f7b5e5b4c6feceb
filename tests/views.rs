//! View algebra: filters, slices, and attribute overlays compose lazily and
//! keep the container's summary honest.

use pointclouds::las::HeaderPatch;
use pointclouds::point::{Attribute, Value};
use pointclouds::view::{Bitmask, PointView};
use pointclouds::{Header, Las, Point};

fn ramp(n: u8) -> Las<pointclouds::view::OwnedPoints> {
    Las::new(
        Header::default(),
        (0..n)
            .map(|i| Point {
                x: f64::from(i),
                y: f64::from(i),
                z: f64::from(i),
                intensity: u16::from(i),
                return_number: 1,
                ..Default::default()
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn filter_is_idempotent() {
    let once = ramp(10).filter(|point| point.x < 5.).unwrap();
    let xs_once = once
        .iter()
        .map(|point| point.unwrap().x)
        .collect::<Vec<_>>();
    let twice = once.filter(|point| point.x < 5.).unwrap();
    let xs_twice = twice
        .iter()
        .map(|point| point.unwrap().x)
        .collect::<Vec<_>>();
    assert_eq!(xs_once, xs_twice);
}

#[test]
fn range_equals_bitmask() {
    let sliced = ramp(10).slice(3..7).unwrap();
    let mut mask = Bitmask::all_clear(10);
    for index in 3..7 {
        mask.set(index);
    }
    let masked = ramp(10).mask(mask).unwrap();
    assert_eq!(sliced.len(), masked.len());
    for index in 0..sliced.len() {
        assert_eq!(sliced.point(index).unwrap(), masked.point(index).unwrap());
    }
}

#[test]
fn masked_iteration_is_ascending() {
    let filtered = ramp(10).filter(|point| point.intensity % 3 == 0).unwrap();
    let xs = filtered
        .iter()
        .map(|point| point.unwrap().x)
        .collect::<Vec<_>>();
    assert_eq!(vec![0., 3., 6., 9.], xs);
}

#[test]
fn stacked_views() {
    // Filter, then slice the survivors, then overlay an attribute.
    let las = ramp(10)
        .filter(|point| point.x >= 2.)
        .unwrap()
        .slice(0..4)
        .unwrap()
        .update(
            vec![(Attribute::UserData, vec![Value::U8(9); 4])],
            HeaderPatch::default(),
        )
        .unwrap();
    assert_eq!(4, las.len());
    assert_eq!(2., las.point(0).unwrap().x);
    assert_eq!(9, las.point(3).unwrap().user_data);
    assert_eq!(5., las.header().bounds().max.x);
}

#[test]
fn update_leaves_parent_attributes_alone() {
    let updated = ramp(5)
        .update(
            vec![(Attribute::Intensity, (0..5).map(|i| Value::U16(i * 10)).collect())],
            HeaderPatch::default(),
        )
        .unwrap();
    for index in 0..5 {
        let point = updated.point(index).unwrap();
        assert_eq!(index as u16 * 10, point.intensity);
        assert_eq!(index as f64, point.x);
    }
}

#[test]
fn update_with_header_patch() {
    let updated = ramp(3)
        .update(
            vec![],
            HeaderPatch {
                system_identifier: Some("TRANSFORMATION".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!("TRANSFORMATION", updated.header().system_identifier());
}

#[test]
fn views_expose_len_in_constant_time() {
    let las = ramp(100);
    let masked = las.filter(|point| point.x < 50.).unwrap();
    assert_eq!(50, masked.len());
    assert_eq!(50, masked.points().len());
}

#[test]
fn attribute_reads_without_materialising() {
    let las = ramp(4);
    let value = las
        .points()
        .read_attribute(2, Attribute::Intensity)
        .unwrap();
    assert_eq!(Some(Value::U16(2)), value);
    // Coordinates read raw at the view level; rescaling lives on the
    // container.
    let raw_x = las.points().read_attribute(2, Attribute::X).unwrap();
    assert_eq!(Some(Value::I32(2000)), raw_x);
}

#[test]
fn filter_in_place_restores_nothing() {
    let mut las = ramp(10).filter(|point| point.x < 8.).unwrap();
    las.filter_in_place(|point| point.x >= 4.).unwrap();
    assert_eq!(4, las.len());
    let xs = las
        .iter()
        .map(|point| point.unwrap().x)
        .collect::<Vec<_>>();
    assert_eq!(vec![4., 5., 6., 7.], xs);
    assert_eq!(4., las.header().bounds().min.x);
}
