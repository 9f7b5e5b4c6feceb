//! Point storage views.
//!
//! Every way of holding point records satisfies the [PointView] trait: an
//! owned vector, a memory-mapped file, a compressed stream, and the lazy
//! filter/slice/overlay combinators stacked on top of them. Views compose
//! without copying records: a [Masked] filter over a [MappedPoints] file
//! reads bytes straight out of the map, and only when asked.

mod bitmask;
mod indexed;
mod mapped;
mod masked;
mod owned;
mod stream;
mod updated;

pub use bitmask::Bitmask;
pub use indexed::Indexed;
pub use mapped::MappedPoints;
pub use masked::Masked;
pub use owned::OwnedPoints;
pub use stream::{LazPoints, StreamedPoints};
pub use updated::{AttributeOverlay, Updated};

use crate::{point::Attribute, point::Format, point::Value, raw, Error, Result};

/// Random access and iteration over point records, without owning their
/// bytes.
pub trait PointView: Send + Sync {
    /// Returns the number of points in this view.
    ///
    /// Always O(1), even for filtered views.
    fn len(&self) -> u64;

    /// Returns true if this view holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the format of the records in this view.
    fn format(&self) -> Format;

    /// Reads the record at the given view index.
    fn read(&self, index: u64) -> Result<raw::Point>;

    /// Reads a single attribute at the given view index.
    ///
    /// Views that can avoid materialising the whole record (e.g. memory
    /// mapped ones) override this; the default decodes the full record.
    /// Returns `Ok(None)` when the format doesn't carry the attribute.
    fn read_attribute(&self, index: u64, attribute: Attribute) -> Result<Option<Value>> {
        let point = self.read(index)?;
        Ok(read_attribute_from_raw(&point, attribute, &self.format()))
    }

    /// Returns an iterator over this view's records, in view order.
    fn iter(&self) -> Iter<'_, Self>
    where
        Self: Sized,
    {
        Iter {
            view: self,
            index: 0,
        }
    }
}

/// An iterator over the records of a view.
#[derive(Debug)]
pub struct Iter<'a, V> {
    view: &'a V,
    index: u64,
}

impl<V: PointView> Iterator for Iter<'_, V> {
    type Item = Result<raw::Point>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.view.len() {
            let result = self.view.read(self.index);
            self.index += 1;
            Some(result)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.view.len() - self.index) as usize;
        (left, Some(left))
    }
}

/// Decodes one attribute from an already-materialised raw record.
pub(crate) fn read_attribute_from_raw(
    point: &raw::Point,
    attribute: Attribute,
    format: &Format,
) -> Option<Value> {
    if !attribute.exists_in(format) {
        return None;
    }
    Some(match attribute {
        Attribute::X => Value::I32(point.x),
        Attribute::Y => Value::I32(point.y),
        Attribute::Z => Value::I32(point.z),
        Attribute::Intensity => Value::U16(point.intensity),
        Attribute::ReturnNumber => Value::U8(point.flags.return_number()),
        Attribute::NumberOfReturns => Value::U8(point.flags.number_of_returns()),
        Attribute::ScanDirection => {
            Value::U8(u8::from(point.flags.is_scan_direction_left_to_right()))
        }
        Attribute::IsEdgeOfFlightLine => Value::Bool(point.flags.is_edge_of_flight_line()),
        Attribute::Classification => Value::U8(point.flags.classification()),
        Attribute::IsSynthetic => Value::Bool(point.flags.is_synthetic()),
        Attribute::IsKeyPoint => Value::Bool(point.flags.is_key_point()),
        Attribute::IsWithheld => Value::Bool(point.flags.is_withheld()),
        Attribute::IsOverlap => Value::Bool(point.flags.is_overlap()),
        Attribute::ScannerChannel => Value::U8(point.flags.scanner_channel()),
        Attribute::ScanAngle => Value::F32(point.scan_angle.degrees()),
        Attribute::UserData => Value::U8(point.user_data),
        Attribute::PointSourceId => Value::U16(point.point_source_id),
        Attribute::GpsTime => Value::F64(point.gps_time?),
        Attribute::Red => Value::U16(point.color?.red),
        Attribute::Green => Value::U16(point.color?.green),
        Attribute::Blue => Value::U16(point.color?.blue),
        Attribute::Nir => Value::U16(point.nir?),
    })
}

/// The point backing chosen while reading a las source.
///
/// [Las::read_from](crate::Las::read_from) picks a variant based on the
/// [PointReadMode](crate::las::PointReadMode) option.
#[derive(Debug)]
pub enum PointSource {
    /// Points were read eagerly into memory.
    Owned(OwnedPoints),

    /// Points are backed by a memory-mapped file.
    Mapped(MappedPoints),

    /// Points are decoded on demand from an uncompressed stream.
    Streamed(StreamedPoints),

    /// Points are decompressed on demand from a laszip stream.
    Laz(LazPoints),

    /// Points were skipped; only the header is available.
    Skipped(SkippedPoints),
}

impl PointView for PointSource {
    fn len(&self) -> u64 {
        match self {
            PointSource::Owned(view) => view.len(),
            PointSource::Mapped(view) => view.len(),
            PointSource::Streamed(view) => view.len(),
            PointSource::Laz(view) => view.len(),
            PointSource::Skipped(view) => view.len(),
        }
    }

    fn format(&self) -> Format {
        match self {
            PointSource::Owned(view) => view.format(),
            PointSource::Mapped(view) => view.format(),
            PointSource::Streamed(view) => view.format(),
            PointSource::Laz(view) => view.format(),
            PointSource::Skipped(view) => view.format(),
        }
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        match self {
            PointSource::Owned(view) => view.read(index),
            PointSource::Mapped(view) => view.read(index),
            PointSource::Streamed(view) => view.read(index),
            PointSource::Laz(view) => view.read(index),
            PointSource::Skipped(view) => view.read(index),
        }
    }

    fn read_attribute(&self, index: u64, attribute: Attribute) -> Result<Option<Value>> {
        match self {
            PointSource::Owned(view) => view.read_attribute(index, attribute),
            PointSource::Mapped(view) => view.read_attribute(index, attribute),
            PointSource::Streamed(view) => view.read_attribute(index, attribute),
            PointSource::Laz(view) => view.read_attribute(index, attribute),
            PointSource::Skipped(view) => view.read_attribute(index, attribute),
        }
    }
}

/// The stand-in view used when points were skipped on read.
///
/// The length from the header is available; every point access fails with
/// [Error::PointsUnavailable].
#[derive(Clone, Copy, Debug)]
pub struct SkippedPoints {
    len: u64,
    format: Format,
}

impl SkippedPoints {
    /// Creates a new skipped-points stand-in.
    pub fn new(len: u64, format: Format) -> SkippedPoints {
        SkippedPoints { len, format }
    }
}

impl PointView for SkippedPoints {
    fn len(&self) -> u64 {
        self.len
    }

    fn format(&self) -> Format {
        self.format
    }

    fn read(&self, _index: u64) -> Result<raw::Point> {
        Err(Error::PointsUnavailable)
    }

    fn read_attribute(&self, _index: u64, _attribute: Attribute) -> Result<Option<Value>> {
        Err(Error::PointsUnavailable)
    }
}
