//! The laszip compression hook.
//!
//! This crate never compresses or decompresses point data itself. Instead,
//! the stream-backed point view talks to the [LazReader] capability, and the
//! writer to [LazWriter]. Enabling the `laz` cargo feature provides default
//! implementations backed by the [laz](https://crates.io/crates/laz) crate;
//! without it, opening compressed data fails with
//! [Error::LaszipNotEnabled](crate::Error::LaszipNotEnabled).

use crate::{raw, Result};

/// Sequential and random access over laszip-compressed points.
///
/// Implementations maintain a cursor: [LazReader::read_next] yields the
/// record under the cursor and advances it, [LazReader::seek] moves it.
pub trait LazReader: Send {
    /// Returns the total number of compressed points.
    fn len(&self) -> u64;

    /// Returns true if there are no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the cursor to the given point index.
    fn seek(&mut self, index: u64) -> Result<()>;

    /// Decompresses the record under the cursor and advances past it.
    fn read_next(&mut self) -> Result<raw::Point>;
}

/// Sequential compressed point output.
pub trait LazWriter: Send {
    /// Compresses one record.
    fn write(&mut self, point: &raw::Point) -> Result<()>;

    /// Finishes the compressed stream, flushing the chunk table.
    fn done(&mut self) -> Result<()>;
}

#[cfg(feature = "laz")]
pub(crate) use self::laszip::{laszip_vlr, LaszipPointReader, LaszipPointWriter};

#[cfg(feature = "laz")]
mod laszip {
    use super::{LazReader, LazWriter};
    use crate::{point::Format, raw, Result, Vlr};
    use laz::{LasZipCompressor, LasZipDecompressor, LazItemRecordBuilder, LazItemType, LazVlr};
    use std::io::{Cursor, Read, Seek, Write};

    /// Builds the laszip vlr for the given point format.
    ///
    /// Waveform data is not compressible; the waveform fields of formats 4,
    /// 5, 9, and 10 are not described by any laz item.
    pub(crate) fn laszip_vlr(format: &Format) -> Result<Vlr> {
        let mut laz_items = LazItemRecordBuilder::new();
        if !format.is_extended {
            let _ = laz_items.add_item(LazItemType::Point10);
            if format.has_gps_time {
                let _ = laz_items.add_item(LazItemType::GpsTime);
            }
            if format.has_color {
                let _ = laz_items.add_item(LazItemType::RGB12);
            }
            if format.extra_bytes > 0 {
                let _ = laz_items.add_item(LazItemType::Byte(format.extra_bytes));
            }
        } else {
            let _ = laz_items.add_item(LazItemType::Point14);
            if format.has_color {
                if format.has_nir {
                    let _ = laz_items.add_item(LazItemType::RGBNIR14);
                } else {
                    let _ = laz_items.add_item(LazItemType::RGB14);
                }
            }
            if format.extra_bytes > 0 {
                let _ = laz_items.add_item(LazItemType::Byte14(format.extra_bytes));
            }
        }
        let laz_vlr = LazVlr::from_laz_items(laz_items.build());
        let mut cursor = Cursor::new(Vec::new());
        laz_vlr.write_to(&mut cursor)?;
        Ok(Vlr {
            user_id: LazVlr::USER_ID.to_string(),
            record_id: LazVlr::RECORD_ID,
            description: LazVlr::DESCRIPTION.to_string(),
            data: cursor.into_inner(),
        })
    }

    /// The default [LazReader], backed by [laz::LasZipDecompressor].
    pub(crate) struct LaszipPointReader<R: Read + Seek + Send> {
        decompressor: LasZipDecompressor<'static, R>,
        buffer: Cursor<Vec<u8>>,
        format: Format,
        len: u64,
    }

    impl<R: Read + Seek + Send> LaszipPointReader<R> {
        pub(crate) fn new(read: R, vlr_data: &[u8], format: Format, len: u64) -> Result<Self> {
            let laz_vlr = LazVlr::from_buffer(vlr_data)?;
            let decompressor = LasZipDecompressor::new(read, laz_vlr)?;
            Ok(LaszipPointReader {
                decompressor,
                buffer: Cursor::new(vec![0u8; usize::from(format.len())]),
                format,
                len,
            })
        }
    }

    impl<R: Read + Seek + Send> LazReader for LaszipPointReader<R> {
        fn len(&self) -> u64 {
            self.len
        }

        fn seek(&mut self, index: u64) -> Result<()> {
            self.decompressor.seek(index)?;
            Ok(())
        }

        fn read_next(&mut self) -> Result<raw::Point> {
            self.decompressor.decompress_one(self.buffer.get_mut())?;
            self.buffer.set_position(0);
            let point = raw::Point::read_from(&mut self.buffer, &self.format)?
                .expect("the decompressed buffer holds exactly one record");
            Ok(point)
        }
    }

    /// The default [LazWriter], backed by [laz::LasZipCompressor].
    pub(crate) struct LaszipPointWriter<W: Write + Seek + Send> {
        compressor: LasZipCompressor<'static, W>,
        buffer: Cursor<Vec<u8>>,
        format: Format,
    }

    impl<W: Write + Seek + Send> LaszipPointWriter<W> {
        pub(crate) fn new(write: W, vlr_data: &[u8], format: Format) -> Result<Self> {
            let laz_vlr = LazVlr::from_buffer(vlr_data)?;
            let compressor = LasZipCompressor::new(write, laz_vlr)?;
            Ok(LaszipPointWriter {
                compressor,
                buffer: Cursor::new(vec![0u8; usize::from(format.len())]),
                format,
            })
        }

        pub(crate) fn into_inner(self) -> W {
            self.compressor.into_inner()
        }
    }

    impl<W: Write + Seek + Send> LazWriter for LaszipPointWriter<W> {
        fn write(&mut self, point: &raw::Point) -> Result<()> {
            self.buffer.set_position(0);
            point.write_to(&mut self.buffer, &self.format)?;
            self.compressor.compress_one(self.buffer.get_ref())?;
            Ok(())
        }

        fn done(&mut self) -> Result<()> {
            self.compressor.done()?;
            Ok(())
        }
    }
}
