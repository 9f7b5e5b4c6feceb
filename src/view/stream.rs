use crate::{laz::LazReader, point::Format, raw, view::owned::out_of_bounds, view::PointView, Result};
use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

/// A read-only point view over a laszip-compressed stream.
///
/// The underlying [LazReader] is stateful: it decompresses forward from a
/// cursor. Random access seeks on demand, but consecutive reads short-circuit
/// the seek, so iterating this view sequentially never seeks at all. The
/// cursor is owned exclusively behind a mutex, which serialises concurrent
/// indexed access.
#[derive(Debug)]
pub struct LazPoints {
    inner: Mutex<Cursor>,
    len: u64,
    format: Format,
}

struct Cursor {
    reader: Box<dyn LazReader>,
    position: u64,
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl LazPoints {
    /// Creates a stream view over a compressed reader.
    pub fn new(reader: Box<dyn LazReader>, format: Format) -> LazPoints {
        let len = reader.len();
        LazPoints {
            inner: Mutex::new(Cursor {
                reader,
                position: 0,
            }),
            len,
            format,
        }
    }
}

impl PointView for LazPoints {
    fn len(&self) -> u64 {
        self.len
    }

    fn format(&self) -> Format {
        self.format
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        if index >= self.len {
            return Err(out_of_bounds(index, self.len));
        }
        let mut inner = self
            .inner
            .lock()
            .expect("a panic can only happen outside the cursor update");
        if inner.position != index {
            inner.reader.seek(index)?;
            inner.position = index;
        }
        let point = inner.reader.read_next()?;
        inner.position = index + 1;
        Ok(point)
    }
}

/// A read-only point view over an uncompressed, seekable stream.
///
/// Like [LazPoints] this is stateful and single-threaded at heart: the
/// reader's position is the cursor, sequential reads don't seek, and a mutex
/// serialises concurrent access.
pub struct StreamedPoints {
    inner: Mutex<StreamCursor>,
    offset_to_point_data: u64,
    len: u64,
    format: Format,
}

struct StreamCursor {
    read: Box<dyn ReadSeekSend>,
    position: u64,
}

pub(crate) trait ReadSeekSend: Read + Seek + Send {}
impl<R: Read + Seek + Send> ReadSeekSend for R {}

impl std::fmt::Debug for StreamedPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedPoints")
            .field("offset_to_point_data", &self.offset_to_point_data)
            .field("len", &self.len)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl StreamedPoints {
    /// Creates a streamed view over `len` records starting at the byte
    /// offset.
    ///
    /// The reader's current position is taken over; the first read seeks.
    pub fn new<R: Read + Seek + Send + 'static>(
        read: R,
        offset_to_point_data: u64,
        len: u64,
        format: Format,
    ) -> StreamedPoints {
        StreamedPoints {
            inner: Mutex::new(StreamCursor {
                read: Box::new(read),
                // Not a real position; forces a seek on the first read.
                position: u64::MAX,
            }),
            offset_to_point_data,
            len,
            format,
        }
    }
}

impl PointView for StreamedPoints {
    fn len(&self) -> u64 {
        self.len
    }

    fn format(&self) -> Format {
        self.format
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        if index >= self.len {
            return Err(out_of_bounds(index, self.len));
        }
        let mut inner = self
            .inner
            .lock()
            .expect("a panic can only happen outside the cursor update");
        if inner.position != index {
            let byte_offset =
                self.offset_to_point_data + index * u64::from(self.format.len());
            let _ = inner.read.seek(SeekFrom::Start(byte_offset))?;
        }
        let point = raw::Point::read_from(&mut inner.read, &self.format)?
            .ok_or_else(|| out_of_bounds(index, self.len))?;
        inner.position = index + 1;
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::PointView;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A fake decompressor that counts its seeks.
    struct Fake {
        points: Vec<raw::Point>,
        cursor: u64,
        seeks: Arc<AtomicUsize>,
    }

    impl LazReader for Fake {
        fn len(&self) -> u64 {
            self.points.len() as u64
        }

        fn seek(&mut self, index: u64) -> Result<()> {
            let _ = self.seeks.fetch_add(1, Ordering::SeqCst);
            self.cursor = index;
            Ok(())
        }

        fn read_next(&mut self) -> Result<raw::Point> {
            let point = self.points[self.cursor as usize].clone();
            self.cursor += 1;
            Ok(point)
        }
    }

    fn fake(n: i32, seeks: &Arc<AtomicUsize>) -> LazPoints {
        let points = (0..n)
            .map(|x| raw::Point {
                x,
                ..Default::default()
            })
            .collect();
        LazPoints::new(
            Box::new(Fake {
                points,
                cursor: 0,
                seeks: Arc::clone(seeks),
            }),
            Format::new(0).unwrap(),
        )
    }

    #[test]
    fn sequential_reads_never_seek() {
        let seeks = Arc::new(AtomicUsize::new(0));
        let view = fake(10, &seeks);
        for index in 0..10 {
            let point = view.read(index).unwrap();
            assert_eq!(index as i32, point.x);
        }
        assert_eq!(0, seeks.load(Ordering::SeqCst));
    }

    #[test]
    fn random_access_seeks_and_resumes() {
        let seeks = Arc::new(AtomicUsize::new(0));
        let view = fake(10, &seeks);
        assert_eq!(5, view.read(5).unwrap().x);
        assert_eq!(1, seeks.load(Ordering::SeqCst));
        // The cursor is left at 6, so the next sequential read is free.
        assert_eq!(6, view.read(6).unwrap().x);
        assert_eq!(1, seeks.load(Ordering::SeqCst));
        assert_eq!(0, view.read(0).unwrap().x);
        assert_eq!(2, seeks.load(Ordering::SeqCst));
    }

    #[test]
    fn out_of_bounds() {
        let seeks = Arc::new(AtomicUsize::new(0));
        let view = fake(3, &seeks);
        assert!(view.read(3).is_err());
    }
}
