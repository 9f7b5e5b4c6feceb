//! Reading tolerates the quirks of real-world files.
//!
//! Only a bad file signature is fatal; everything else downgrades to a
//! warning and the decoded prefix is kept.

use pointclouds::las::{ReadOptions, WriteOptions};
use pointclouds::{Builder, Las, Point};
use std::io::Cursor;

fn write_ramp(n: u8) -> Vec<u8> {
    let las = Las::new(
        Builder::default().into_header().unwrap(),
        (0..n)
            .map(|i| Point {
                x: f64::from(i),
                ..Default::default()
            })
            .collect(),
    )
    .unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    cursor.into_inner()
}

#[test]
fn bad_signature_is_fatal() {
    let mut bytes = write_ramp(1);
    bytes[0] = b'X';
    assert!(Las::read(Cursor::new(bytes), ReadOptions::default()).is_err());
}

#[test]
fn truncated_points_keep_the_prefix() {
    let mut bytes = write_ramp(10);
    // Chop off the last two and a half records.
    bytes.truncate(bytes.len() - 50);
    let las = Las::read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(7, las.len());
    assert_eq!(6., las.point(6).unwrap().x);
}

#[test]
fn trailing_garbage_is_ignored() {
    let mut bytes = write_ramp(3);
    bytes.extend_from_slice(b"garbage");
    let las = Las::read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(3, las.len());
}

#[test]
fn overstated_vlr_count_stops_the_list() {
    let mut bytes = write_ramp(2);
    // The vlr count lives at byte 100; claim five where there are none.
    bytes[100] = 5;
    let las = Las::read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    // The list stops at the point data offset and the points still read.
    assert_eq!(2, las.len());
}

#[test]
fn unknown_minor_version_reads_anyway() {
    let mut bytes = write_ramp(2);
    // The minor version lives at byte 25.
    bytes[25] = 9;
    let las = Las::read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(2, las.len());
    assert_eq!(9, las.header().version().minor);
}

#[test]
fn overstated_point_count_adjusts_down() {
    let mut bytes = write_ramp(4);
    // The legacy point count lives at bytes 107..111.
    bytes[107..111].copy_from_slice(&100u32.to_le_bytes());
    let las = Las::read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(4, las.len());
}

#[test]
fn skip_mode_reads_headers_of_anything() {
    let mut bytes = write_ramp(4);
    bytes.truncate(250);
    let las = Las::read(
        Cursor::new(bytes),
        ReadOptions {
            mode: pointclouds::las::PointReadMode::Skip,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(4, las.len());
    assert!(las.point(0).is_err());
}
