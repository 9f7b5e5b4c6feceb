//! The write path.
//!
//! Bytes go out in canonical order: header, vlrs in input order, padding,
//! points in view order, point padding, then evlrs. The writer trusts the
//! data over the stored summary: counts and bounds are recomputed from the
//! current view before the header is serialized, and any divergence beyond
//! tolerance is logged.

use crate::{
    header::verify_format_is_allowed,
    raw,
    utils::FromLasStr,
    view::PointView,
    Bounds, Las, Point, Result,
};
use std::{
    fs::File,
    io::{BufWriter, Seek, Write},
    path::Path,
};

/// How much a stored bound may differ from the recomputed one before the
/// writer complains.
const SUMMARY_EPSILON: f64 = 1e-9;

/// The output flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain las.
    #[default]
    Las,

    /// Laszip compressed.
    ///
    /// Requires the `laz` cargo feature.
    Laz,
}

/// Options for writing a las container.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// The output flavor.
    pub format: OutputFormat,
}

impl<V: PointView> Las<V> {
    /// Writes this container to a path.
    ///
    /// A `.laz` extension selects compressed output.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pointclouds::las::WriteOptions;
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default()]).unwrap();
    /// las.write_to_path("points.las", WriteOptions::default()).unwrap();
    /// ```
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P, options: WriteOptions) -> Result<()> {
        let mut options = options;
        if path
            .as_ref()
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("laz"))
        {
            options.format = OutputFormat::Laz;
        }
        let write = BufWriter::new(File::create(path)?);
        self.write_to(write, options)
    }

    /// Writes this container to a sink.
    ///
    /// Validation runs in a fixed order: the point format against the
    /// version, then the string identifiers, then the summary recomputation,
    /// then the count limits. The recomputed summary always wins; stored
    /// values that diverge beyond tolerance are logged, not fatal.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::las::WriteOptions;
    /// use pointclouds::{Header, Las, Point};
    /// let las = Las::new(Header::default(), vec![Point::default()]).unwrap();
    /// las.write_to(Cursor::new(Vec::new()), WriteOptions::default()).unwrap();
    /// ```
    pub fn write_to<W: Write + Seek + Send>(&self, dest: W, options: WriteOptions) -> Result<()> {
        let mut header = self.header().clone();

        // 1. Format against version.
        verify_format_is_allowed(*header.point_format(), header.version())?;

        // 2. String identifiers.
        let mut scratch = [0u8; 32];
        scratch.as_mut().from_las_str(header.system_identifier())?;
        scratch.as_mut().from_las_str(header.generating_software())?;

        // 3. Summary recomputation; the data has final say.
        self.reconcile_summary(&mut header)?;

        // 4 and 5. Count limits.
        header.validate_counts()?;

        match options.format {
            OutputFormat::Las => {
                header.point_format.is_compressed = false;
                self.write_las(dest, header)
            }
            OutputFormat::Laz => self.write_laz(dest, header),
        }
    }

    fn reconcile_summary(&self, header: &mut crate::Header) -> Result<()> {
        let transforms = *header.transforms();
        let mut bounds = Bounds::default();
        let mut number_of_points = 0u64;
        let mut number_of_points_by_return = [0u64; 15];
        for raw_point in self.points().iter() {
            let raw_point = raw_point?;
            number_of_points += 1;
            let return_number = raw_point.flags.return_number();
            if (1..=15).contains(&return_number) {
                number_of_points_by_return[usize::from(return_number) - 1] += 1;
            }
            bounds.grow(&Point {
                x: transforms.x.direct(raw_point.x),
                y: transforms.y.direct(raw_point.y),
                z: transforms.z.direct(raw_point.z),
                ..Default::default()
            });
        }
        if number_of_points > 0 {
            bounds = bounds.adapt(&transforms)?;
        } else {
            bounds = Bounds {
                min: Default::default(),
                max: Default::default(),
            };
        }
        if header.number_of_points() != number_of_points {
            log::warn!(
                "stored point count {} disagrees with the {} points present, updating",
                header.number_of_points(),
                number_of_points
            );
        }
        if header.number_of_points_by_return != number_of_points_by_return {
            log::warn!("stored per-return counts disagree with the points present, updating");
        }
        if diverges(&header.bounds(), &bounds) {
            log::warn!(
                "stored bounds {:?} disagree with the measured bounds {:?}, updating",
                header.bounds(),
                bounds
            );
        }
        header.number_of_points = number_of_points;
        header.number_of_points_by_return = number_of_points_by_return;
        header.bounds = bounds;
        Ok(())
    }

    fn write_las<W: Write + Seek>(&self, mut dest: W, header: crate::Header) -> Result<()> {
        let version = header.version();
        header.to_raw()?.write_to(&mut dest)?;
        for vlr in header.vlrs() {
            vlr.to_raw(false, version)?.write_to(&mut dest, false)?;
        }
        dest.write_all(header.vlr_padding())?;
        if version.requires_point_data_start_signature() {
            dest.write_all(&raw::POINT_DATA_START_SIGNATURE)?;
        }
        let format = *header.point_format();
        for raw_point in self.points().iter() {
            raw_point?.write_to(&mut dest, &format)?;
        }
        dest.write_all(header.point_padding())?;
        for evlr in header.evlrs() {
            evlr.to_raw(true, version)?.write_to(&mut dest, true)?;
        }
        Ok(())
    }

    #[cfg(feature = "laz")]
    fn write_laz<W: Write + Seek + Send>(&self, mut dest: W, mut header: crate::Header) -> Result<()> {
        use crate::laz::{laszip_vlr, LaszipPointWriter, LazWriter};
        use byteorder::{LittleEndian, WriteBytesExt};
        use std::io::SeekFrom;

        // The field offset of the evlr pointer in a las 1.4 header.
        const START_OF_FIRST_EVLR: u64 = 235;

        let start = dest.stream_position()?;
        header.point_format.is_compressed = true;
        let mut format = *header.point_format();
        format.is_compressed = false;
        let laszip = laszip_vlr(&format)?;
        header.vlrs.push(laszip.clone());
        let version = header.version();
        header.to_raw()?.write_to(&mut dest)?;
        for vlr in header.vlrs() {
            vlr.to_raw(false, version)?.write_to(&mut dest, false)?;
        }
        dest.write_all(header.vlr_padding())?;
        let mut writer = LaszipPointWriter::new(dest, &laszip.data, format)?;
        for raw_point in self.points().iter() {
            writer.write(&raw_point?)?;
        }
        writer.done()?;
        let mut dest = writer.into_inner();
        dest.write_all(header.point_padding())?;
        // The compressed size isn't knowable up front, so the evlr pointer
        // the header carries is wrong; fix it up now that we know where the
        // points ended.
        if !header.evlrs().is_empty() {
            let start_of_first_evlr = dest.stream_position()?;
            for evlr in header.evlrs() {
                evlr.to_raw(true, version)?.write_to(&mut dest, true)?;
            }
            let end = dest.stream_position()?;
            let _ = dest.seek(SeekFrom::Start(start + START_OF_FIRST_EVLR))?;
            dest.write_u64::<LittleEndian>(start_of_first_evlr - start)?;
            let _ = dest.seek(SeekFrom::Start(end))?;
        }
        Ok(())
    }

    #[cfg(not(feature = "laz"))]
    fn write_laz<W: Write + Seek + Send>(&self, _dest: W, _header: crate::Header) -> Result<()> {
        Err(crate::Error::LaszipNotEnabled)
    }
}

fn diverges(stored: &Bounds, recomputed: &Bounds) -> bool {
    let pairs = [
        (stored.min.x, recomputed.min.x),
        (stored.min.y, recomputed.min.y),
        (stored.min.z, recomputed.min.z),
        (stored.max.x, recomputed.max.x),
        (stored.max.y, recomputed.max.y),
        (stored.max.z, recomputed.max.z),
    ];
    pairs
        .iter()
        .any(|(stored, recomputed)| (stored - recomputed).abs() > SUMMARY_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{las::ReadOptions, Header};
    use std::io::Cursor;

    #[test]
    fn canonical_order_and_round_trip() {
        let mut builder = crate::Builder::default();
        builder.vlrs.push(crate::Vlr {
            user_id: "test".to_string(),
            record_id: 1,
            description: "test vlr".to_string(),
            data: vec![1, 2, 3],
        });
        let las = Las::new(
            builder.into_header().unwrap(),
            vec![
                Point {
                    x: 1.,
                    y: 2.,
                    z: 3.,
                    return_number: 1,
                    ..Default::default()
                },
                Point {
                    x: -1.,
                    y: -2.,
                    z: -3.,
                    return_number: 2,
                    ..Default::default()
                },
            ],
        )
        .unwrap();
        let mut cursor = Cursor::new(Vec::new());
        las.write_to(&mut cursor, WriteOptions::default()).unwrap();
        cursor.set_position(0);
        let other = Las::read(cursor, ReadOptions::default()).unwrap();
        assert_eq!(2, other.len());
        assert_eq!(las.header().vlrs(), other.header().vlrs());
        assert_eq!(las.point(0).unwrap(), other.point(0).unwrap());
        assert_eq!(las.point(1).unwrap(), other.point(1).unwrap());
        assert_eq!(1., other.header().bounds().max.x);
        assert_eq!(Some(1), other.header().number_of_points_by_return(2));
    }

    #[test]
    fn writer_trusts_the_data() {
        let mut las = Las::new(
            Header::default(),
            vec![Point {
                x: 1.,
                ..Default::default()
            }],
        )
        .unwrap();
        // Corrupt the stored summary; the writer must fix it.
        las.header.number_of_points = 42;
        las.header.bounds.max.x = 1000.;
        let mut cursor = Cursor::new(Vec::new());
        las.write_to(&mut cursor, WriteOptions::default()).unwrap();
        cursor.set_position(0);
        let other = Las::read(cursor, ReadOptions::default()).unwrap();
        assert_eq!(1, other.len());
        assert_eq!(1., other.header().bounds().max.x);
    }

    #[test]
    fn too_many_points_for_legacy_version() {
        let mut las = Las::new(Header::default(), vec![]).unwrap();
        las.header.number_of_points = u64::from(u32::MAX) + 1;
        // The recomputation fixes the count before the limit check, so this
        // writes fine.
        let mut cursor = Cursor::new(Vec::new());
        assert!(las.write_to(&mut cursor, WriteOptions::default()).is_ok());
    }

    #[cfg(not(feature = "laz"))]
    #[test]
    fn laz_needs_the_feature() {
        let las = Las::new(Header::default(), vec![]).unwrap();
        let result = las.write_to(
            Cursor::new(Vec::new()),
            WriteOptions {
                format: OutputFormat::Laz,
            },
        );
        assert!(matches!(result, Err(crate::Error::LaszipNotEnabled)));
    }
}
