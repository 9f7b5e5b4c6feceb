//! Write-read round-trip tests for every supported version and attribute
//! combination.

use pointclouds::las::{ReadOptions, WriteOptions};
use pointclouds::point::Format;
use pointclouds::raw::Waveform;
use pointclouds::{Builder, Color, Las, Point};
use std::io::Cursor;

fn point_for(format: &Format) -> Point {
    let mut point = Point {
        x: 1.,
        y: 2.,
        z: 3.,
        intensity: 42,
        return_number: 1,
        number_of_returns: 2,
        user_data: 7,
        point_source_id: 1234,
        ..Default::default()
    };
    point.scan_angle = if format.is_extended { 30. } else { 3. };
    if format.is_extended {
        point.scanner_channel = 2;
    }
    if format.has_gps_time {
        point.gps_time = Some(123.456);
    }
    if format.has_color {
        point.color = Some(Color::new(1, 2, 3));
    }
    if format.has_nir {
        point.nir = Some(999);
    }
    if format.has_waveform {
        point.waveform = Some(Waveform {
            wave_packet_descriptor_index: 1,
            byte_offset_to_waveform_data: 2,
            waveform_packet_size_in_bytes: 3,
            return_point_waveform_location: 4.,
            x_t: 5.,
            y_t: 6.,
            z_t: 7.,
        });
    }
    point
}

fn roundtrip(version: (u8, u8), n: u8) {
    let format = Format::new(n).unwrap();
    let mut builder = Builder::from(version);
    builder.point_format = format;
    let point = point_for(&format);
    let las = Las::new(builder.into_header().unwrap(), vec![point.clone()]).unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    cursor.set_position(0);
    let other = Las::read(cursor, ReadOptions::default()).unwrap();
    assert_eq!(1, other.len());
    assert_eq!(point, other.point(0).unwrap());
    assert_eq!(las.header().version(), other.header().version());
    assert_eq!(las.header().point_format(), other.header().point_format());
    assert_eq!(las.header().bounds(), other.header().bounds());
    assert_eq!(
        las.header().number_of_points_by_return(1),
        other.header().number_of_points_by_return(1)
    );
}

mod las_1_0 {
    #[test]
    fn all_formats() {
        for format in [0, 1] {
            super::roundtrip((1, 0), format);
        }
    }
}

mod las_1_1 {
    #[test]
    fn all_formats() {
        for format in [0, 1] {
            super::roundtrip((1, 1), format);
        }
    }
}

mod las_1_2 {
    #[test]
    fn all_formats() {
        for format in [0, 1, 2, 3] {
            super::roundtrip((1, 2), format);
        }
    }
}

mod las_1_3 {
    #[test]
    fn all_formats() {
        for format in [0, 1, 2, 3, 4, 5] {
            super::roundtrip((1, 3), format);
        }
    }
}

mod las_1_4 {
    #[test]
    fn all_formats() {
        for format in 0..=10 {
            super::roundtrip((1, 4), format);
        }
    }
}

#[test]
fn write_read_write_is_byte_stable() {
    // The writer normalizes counts and bounds, so writing what was just
    // read must reproduce the file bit for bit.
    let mut builder = Builder::from((1, 4));
    builder.point_format = Format::new(7).unwrap();
    builder.vlrs.push(pointclouds::Vlr {
        user_id: "LASF_Spec".to_string(),
        record_id: 0,
        description: "stability".to_string(),
        data: vec![9; 16],
    });
    let las = Las::new(
        builder.into_header().unwrap(),
        (0..25)
            .map(|i| {
                let mut point = point_for(&Format::new(7).unwrap());
                point.x = f64::from(i);
                point.return_number = (i % 3 + 1) as u8;
                point
            })
            .map(|mut point| {
                point.number_of_returns = 3;
                point
            })
            .collect(),
    )
    .unwrap();
    let mut first = Cursor::new(Vec::new());
    las.write_to(&mut first, WriteOptions::default()).unwrap();
    first.set_position(0);
    let read_back = Las::read(first, ReadOptions::default()).unwrap();
    let mut second = Cursor::new(Vec::new());
    read_back
        .write_to(&mut second, WriteOptions::default())
        .unwrap();
    let mut third = Cursor::new(Vec::new());
    las.write_to(&mut third, WriteOptions::default()).unwrap();
    assert_eq!(third.get_ref(), second.get_ref());
}

#[test]
fn format_not_allowed_by_version() {
    let mut builder = Builder::from((1, 1));
    builder.point_format = Format::new(2).unwrap();
    let las = Las::new(builder.into_header().unwrap(), vec![point_for(&Format::new(2).unwrap())])
        .unwrap();
    assert!(las
        .write_to(Cursor::new(Vec::new()), WriteOptions::default())
        .is_err());
}

#[test]
fn vlrs_round_trip() {
    let mut builder = Builder::default();
    builder.vlrs.push(pointclouds::Vlr {
        user_id: "LASF_Spec".to_string(),
        record_id: 0,
        description: "a test vlr".to_string(),
        data: vec![0, 1, 2, 3],
    });
    let las = Las::new(builder.into_header().unwrap(), vec![]).unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    cursor.set_position(0);
    let other = Las::read(cursor, ReadOptions::default()).unwrap();
    assert_eq!(las.header().vlrs(), other.header().vlrs());
}

#[test]
fn evlrs_round_trip() {
    let mut builder = Builder::from((1, 4));
    builder.evlrs.push(pointclouds::Vlr {
        user_id: "LASF_Spec".to_string(),
        record_id: 1,
        description: "a test evlr".to_string(),
        data: vec![42; 70000],
    });
    let las = Las::new(builder.into_header().unwrap(), vec![Point::default()]).unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    cursor.set_position(0);
    let other = Las::read(cursor, ReadOptions::default()).unwrap();
    assert_eq!(las.header().evlrs(), other.header().evlrs());
}

#[test]
fn point_data_start_signature_for_1_0() {
    let las = Las::new(
        Builder::from((1, 0)).into_header().unwrap(),
        vec![Point::default()],
    )
    .unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    let bytes = cursor.get_ref();
    let offset = las.header().offset_to_point_data() as usize;
    assert_eq!(&[0xDD, 0xCC], &bytes[offset - 2..offset]);
    cursor.set_position(0);
    let other = Las::read(cursor, ReadOptions::default()).unwrap();
    assert_eq!(1, other.len());
}

#[cfg(feature = "laz")]
#[test]
fn laz_round_trip() {
    use pointclouds::las::OutputFormat;

    let las = Las::new(
        Builder::default().into_header().unwrap(),
        (0..100)
            .map(|i| Point {
                x: f64::from(i),
                y: f64::from(i * 2),
                z: f64::from(i * 3),
                intensity: i as u16,
                return_number: 1,
                ..Default::default()
            })
            .collect(),
    )
    .unwrap();
    let mut cursor = Cursor::new(Vec::new());
    las.write_to(
        &mut cursor,
        WriteOptions {
            format: OutputFormat::Laz,
        },
    )
    .unwrap();
    cursor.set_position(0);
    let other = Las::read(cursor, ReadOptions::default()).unwrap();
    assert_eq!(100, other.len());
    for index in 0..100 {
        assert_eq!(las.point(index).unwrap(), other.point(index).unwrap());
    }
}
