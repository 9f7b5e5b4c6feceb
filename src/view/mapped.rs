use crate::{
    point::Attribute, point::Format, point::Value, raw,
    view::owned::out_of_bounds, view::PointView, Result,
};
use memmap::Mmap;
use std::fs::File;

/// A read-only point view backed by a memory-mapped file.
///
/// Records overlap the underlying bytes: random access computes a byte
/// offset, and single-attribute reads decode straight from the mapped slice
/// without materialising the record.
#[derive(Debug)]
pub struct MappedPoints {
    mmap: Mmap,
    offset_to_point_data: usize,
    len: u64,
    format: Format,
}

impl MappedPoints {
    /// Maps the given file and views `len` records starting at the byte
    /// offset.
    ///
    /// # Safety-adjacent caveat
    ///
    /// The map stays valid only while the underlying file is not truncated
    /// or rewritten by somebody else; this is inherent to memory mapping.
    pub fn new(
        file: &File,
        offset_to_point_data: usize,
        len: u64,
        format: Format,
    ) -> Result<MappedPoints> {
        let mmap = unsafe { Mmap::map(file)? };
        let available = mmap
            .len()
            .saturating_sub(offset_to_point_data) as u64
            / u64::from(format.len());
        let len = if available < len {
            log::warn!(
                "point data is truncated: expected {} points, the file holds {}",
                len,
                available
            );
            available
        } else {
            len
        };
        Ok(MappedPoints {
            mmap,
            offset_to_point_data,
            len,
            format,
        })
    }

    fn record(&self, index: u64) -> Result<&[u8]> {
        if index >= self.len {
            return Err(out_of_bounds(index, self.len));
        }
        let record_length = usize::from(self.format.len());
        let start = self.offset_to_point_data + index as usize * record_length;
        Ok(&self.mmap[start..start + record_length])
    }
}

impl PointView for MappedPoints {
    fn len(&self) -> u64 {
        self.len
    }

    fn format(&self) -> Format {
        self.format
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        let mut record = self.record(index)?;
        let point = raw::Point::read_from(&mut record, &self.format)?
            .expect("the record slice is exactly one record long");
        Ok(point)
    }

    fn read_attribute(&self, index: u64, attribute: Attribute) -> Result<Option<Value>> {
        let record = self.record(index)?;
        Ok(attribute.read(&self.format, record))
    }
}
