//! The permissive read path.
//!
//! Reading is tolerant by design: only a bad file signature is fatal.
//! Truncated vlr lists, truncated point data, missing evlrs, and trailing
//! bytes all downgrade to warnings and the decoded prefix is kept.

use crate::{
    raw,
    view::{MappedPoints, OwnedPoints, PointSource, SkippedPoints, StreamedPoints},
    Builder, Error, Header, Las, Result, Vlr,
};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

/// How the point records should be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointReadMode {
    /// Decode every record into memory up front.
    #[default]
    Eager,

    /// Keep the records on disk: memory-map uncompressed files, stream
    /// compressed ones.
    ///
    /// Falls back to [PointReadMode::Eager] for sources that aren't files.
    Lazy,

    /// Decode records on demand through a seekable cursor.
    Stream,

    /// Don't touch the points at all.
    ///
    /// The length from the header is exposed, but any point access yields
    /// [Error::PointsUnavailable](crate::Error::PointsUnavailable).
    Skip,

    /// Like [PointReadMode::Stream], but treat the source as laszip
    /// compressed even if neither the laszip vlr nor the format bit says so.
    LazExplicit,
}

/// Options for reading a las source.
#[derive(Debug, Default)]
pub struct ReadOptions {
    /// How to read the points.
    pub mode: PointReadMode,

    /// Replace whatever CRS the file carries with this WKT description.
    ///
    /// The projection vlrs are dropped from the logical model and a WKT vlr
    /// takes their place.
    pub override_crs: Option<String>,

    /// Skip certificate verification when a transport capability fetches the
    /// source.
    ///
    /// The core reads local sources only; callers that resolve remote tiles
    /// forward this to their fetcher.
    pub insecure: bool,
}

struct Parsed {
    header: Header,
    #[cfg_attr(not(feature = "laz"), allow(dead_code))]
    laz_vlr_data: Option<Vec<u8>>,
    offset_to_point_data: u64,
}

impl Las<PointSource> {
    /// Reads a las or laz file from a path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pointclouds::las::ReadOptions;
    /// use pointclouds::Las;
    /// let las = Las::read_from("points.las", ReadOptions::default()).unwrap();
    /// ```
    pub fn read_from<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Las<PointSource>> {
        let file = File::open(path)?;
        let mut read = BufReader::new(file);
        let parsed = parse(&mut read, &options)?;
        let header = &parsed.header;
        let is_laz = header.point_format().is_compressed
            || options.mode == PointReadMode::LazExplicit;
        let source = if options.mode == PointReadMode::Skip {
            PointSource::Skipped(SkippedPoints::new(
                header.number_of_points(),
                *header.point_format(),
            ))
        } else if is_laz {
            laz_source(read, &parsed)?
        } else {
            match options.mode {
                PointReadMode::Eager => eager_source(&mut read, &parsed)?,
                PointReadMode::Lazy => {
                    let file = read.into_inner();
                    PointSource::Mapped(MappedPoints::new(
                        &file,
                        parsed.offset_to_point_data as usize,
                        header.number_of_points(),
                        *header.point_format(),
                    )?)
                }
                PointReadMode::Stream => PointSource::Streamed(StreamedPoints::new(
                    read,
                    parsed.offset_to_point_data,
                    header.number_of_points(),
                    *header.point_format(),
                )),
                PointReadMode::Skip | PointReadMode::LazExplicit => unreachable!(),
            }
        };
        Ok(Las::from_parts(parsed.header, source))
    }

    /// Reads las data from anything seekable, e.g. an in-memory cursor.
    ///
    /// [PointReadMode::Lazy] has no file to map here and falls back to an
    /// eager read.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::las::{ReadOptions, WriteOptions};
    /// use pointclouds::{Header, Las, Point};
    ///
    /// let mut cursor = Cursor::new(Vec::new());
    /// let las = Las::new(Header::default(), vec![Point::default()]).unwrap();
    /// las.write_to(&mut cursor, WriteOptions::default()).unwrap();
    /// cursor.set_position(0);
    /// let other = Las::read(cursor, ReadOptions::default()).unwrap();
    /// assert_eq!(1, other.len());
    /// ```
    pub fn read<R: Read + Seek + Send + 'static>(
        mut read: R,
        options: ReadOptions,
    ) -> Result<Las<PointSource>> {
        let parsed = parse(&mut read, &options)?;
        let header = &parsed.header;
        let is_laz = header.point_format().is_compressed
            || options.mode == PointReadMode::LazExplicit;
        let source = match options.mode {
            PointReadMode::Skip => PointSource::Skipped(SkippedPoints::new(
                header.number_of_points(),
                *header.point_format(),
            )),
            _ if is_laz => laz_source(read, &parsed)?,
            PointReadMode::Eager | PointReadMode::Lazy => eager_source(&mut read, &parsed)?,
            PointReadMode::Stream => PointSource::Streamed(StreamedPoints::new(
                read,
                parsed.offset_to_point_data,
                header.number_of_points(),
                *header.point_format(),
            )),
            PointReadMode::LazExplicit => unreachable!(),
        };
        Ok(Las::from_parts(parsed.header, source))
    }
}

#[cfg(feature = "laz")]
fn laz_source<R: Read + Seek + Send + 'static>(mut read: R, parsed: &Parsed) -> Result<PointSource> {
    use crate::laz::LaszipPointReader;
    use crate::view::LazPoints;

    let vlr_data = parsed
        .laz_vlr_data
        .as_deref()
        .ok_or(Error::LaszipVlrNotFound)?;
    let _ = read.seek(SeekFrom::Start(parsed.offset_to_point_data))?;
    let mut format = *parsed.header.point_format();
    format.is_compressed = false;
    let reader = LaszipPointReader::new(
        read,
        vlr_data,
        format,
        parsed.header.number_of_points(),
    )?;
    Ok(PointSource::Laz(LazPoints::new(
        Box::new(reader),
        *parsed.header.point_format(),
    )))
}

#[cfg(not(feature = "laz"))]
fn laz_source<R: Read + Seek + Send + 'static>(_read: R, _parsed: &Parsed) -> Result<PointSource> {
    Err(Error::LaszipNotEnabled)
}

fn eager_source<R: Read + Seek>(read: &mut R, parsed: &Parsed) -> Result<PointSource> {
    let format = parsed.header.point_format();
    let count = parsed.header.number_of_points();
    let _ = read.seek(SeekFrom::Start(parsed.offset_to_point_data))?;
    let mut points = Vec::with_capacity(count.min(1 << 20) as usize);
    for index in 0..count {
        match raw::Point::read_from(&mut *read, format) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => {
                log::warn!(
                    "point data ends after {} of {} points, keeping the prefix",
                    index,
                    count
                );
                break;
            }
            Err(err) => {
                log::warn!(
                    "point {} of {} is unreadable ({}), keeping the prefix",
                    index,
                    count,
                    err
                );
                break;
            }
        }
    }
    Ok(PointSource::Owned(OwnedPoints::new(points, *format)))
}

fn parse<R: Read + Seek>(read: &mut R, options: &ReadOptions) -> Result<Parsed> {
    let raw_header = raw::Header::read_from(&mut *read)?;
    let offset_to_point_data = u64::from(raw_header.offset_to_point_data);
    let number_of_vlrs = raw_header.number_of_variable_length_records;
    let evlr = raw_header.evlr;
    let point_data_record_length = u64::from(raw_header.point_data_record_length);
    let version = raw_header.version;
    let mut builder = Builder::new(raw_header)?;

    // Vlrs, bounded by the declared point data offset.
    let mut position = u64::from(builder.version.header_size()) + builder.padding.len() as u64;
    for index in 0..number_of_vlrs {
        if position + raw::Vlr::HEADER_SIZE > offset_to_point_data {
            log::warn!(
                "vlr {} of {} would overrun the point data offset, stopping the vlr list",
                index,
                number_of_vlrs
            );
            break;
        }
        match raw::Vlr::read_from(&mut *read, false) {
            Ok(raw_vlr) => {
                position += raw::Vlr::HEADER_SIZE + raw_vlr.record_length_after_header;
                builder.vlrs.push(Vlr::new(raw_vlr, version)?);
            }
            Err(err) => {
                log::warn!(
                    "vlr {} of {} is unreadable ({}), stopping the vlr list",
                    index,
                    number_of_vlrs,
                    err
                );
                break;
            }
        }
    }

    // Anything between the vlrs and the points is padding, except the las
    // 1.0 point data start signature, which is implied by the version.
    if offset_to_point_data > position {
        let mut vlr_padding = vec![0; (offset_to_point_data - position) as usize];
        read.read_exact(&mut vlr_padding)?;
        if version.requires_point_data_start_signature()
            && vlr_padding.ends_with(&raw::POINT_DATA_START_SIGNATURE)
        {
            vlr_padding.truncate(vlr_padding.len() - raw::POINT_DATA_START_SIGNATURE.len());
        }
        builder.vlr_padding = vlr_padding;
    } else if offset_to_point_data < position {
        log::warn!(
            "the point data offset {} lands inside the vlrs, which end at {}",
            offset_to_point_data,
            position
        );
    }

    // Evlrs live after the points; their content stays opaque.
    if let Some(evlr) = evlr {
        if evlr.number_of_evlrs > 0 {
            let end_of_points =
                offset_to_point_data + builder.number_of_points() * point_data_record_length;
            // Compressed point data has no fixed record stride, so the end of
            // the points can't be computed; any padding there is lost.
            if !builder.point_format.is_compressed && evlr.start_of_first_evlr > end_of_points {
                let _ = read.seek(SeekFrom::Start(end_of_points))?;
                let mut point_padding =
                    vec![0; (evlr.start_of_first_evlr - end_of_points) as usize];
                if read.read_exact(&mut point_padding).is_ok() {
                    builder.point_padding = point_padding;
                }
            }
            match read.seek(SeekFrom::Start(evlr.start_of_first_evlr)) {
                Ok(_) => {
                    for index in 0..evlr.number_of_evlrs {
                        match raw::Vlr::read_from(&mut *read, true) {
                            Ok(raw_vlr) => builder.evlrs.push(Vlr::new(raw_vlr, version)?),
                            Err(err) => {
                                log::warn!(
                                    "evlr {} of {} is unreadable ({}), stopping the evlr list",
                                    index,
                                    evlr.number_of_evlrs,
                                    err
                                );
                                break;
                            }
                        }
                    }
                }
                Err(err) => log::warn!("cannot seek to the evlrs ({}), skipping them", err),
            }
        }
    }

    let laz_vlr_data = builder
        .vlrs
        .iter()
        .find(|vlr| vlr.is_laszip())
        .map(|vlr| vlr.data.clone());
    let mut header = builder.into_header()?;
    if let Some(wkt) = options.override_crs.as_ref() {
        override_crs(&mut header, wkt);
    }
    Ok(Parsed {
        header,
        laz_vlr_data,
        offset_to_point_data,
    })
}

fn override_crs(header: &mut Header, wkt: &str) {
    header.vlrs.retain(|vlr| !vlr.is_projection());
    header.evlrs.retain(|vlr| !vlr.is_projection());
    header.vlrs.push(Vlr {
        user_id: "LASF_Projection".to_string(),
        record_id: 2112,
        description: "OGC WKT override".to_string(),
        data: wkt.as_bytes().to_vec(),
    });
    header.global_encoding.has_wkt_crs = true;
}
