//! Private utility functions.

use crate::{Error, Result};

/// Converts fixed-width zero-padded byte buffers into strs.
pub(crate) trait AsLasStr {
    /// Interprets these bytes as an ASCII string, stopping at the first null.
    fn as_las_str(&self) -> Result<&str>;
}

/// Writes strs into fixed-width zero-padded byte buffers.
pub(crate) trait FromLasStr {
    /// Fills this buffer with the string's bytes, zero-padding the rest.
    fn from_las_str(&mut self, s: &str) -> Result<()>;
}

impl AsLasStr for &'_ [u8] {
    fn as_las_str(&self) -> Result<&str> {
        let end = self.iter().position(|&b| b == 0).unwrap_or(self.len());
        let s = std::str::from_utf8(&self[..end]).map_err(|_| not_ascii(self))?;
        if !s.is_ascii() {
            Err(not_ascii(self))
        } else {
            Ok(s)
        }
    }
}

impl FromLasStr for &'_ mut [u8] {
    fn from_las_str(&mut self, s: &str) -> Result<()> {
        if !s.is_ascii() {
            return Err(Error::NotAscii(s.to_string()));
        }
        if self.len() < s.len() {
            return Err(Error::StringTooLong {
                string: s.to_string(),
                len: self.len(),
            });
        }
        for (a, b) in self.iter_mut().zip(s.bytes()) {
            *a = b;
        }
        for a in self.iter_mut().skip(s.len()) {
            *a = 0;
        }
        Ok(())
    }
}

fn not_ascii(bytes: &[u8]) -> Error {
    Error::NotAscii(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_las_str_stops_at_null() {
        let bytes: &[u8] = &[b'h', b'i', 0, 0];
        assert_eq!("hi", bytes.as_las_str().unwrap());
    }

    #[test]
    fn as_las_str_rejects_non_ascii() {
        let bytes: &[u8] = &[0xc3, 0xa9, 0, 0];
        assert!(bytes.as_las_str().is_err());
    }

    #[test]
    fn from_las_str_pads_with_zeros() {
        let mut buffer = [1u8; 4];
        (&mut buffer[..]).from_las_str("hi").unwrap();
        assert_eq!([b'h', b'i', 0, 0], buffer);
    }

    #[test]
    fn from_las_str_too_long() {
        let mut buffer = [0u8; 2];
        assert!((&mut buffer[..]).from_las_str("toolong").is_err());
    }

    #[test]
    fn from_las_str_not_ascii() {
        let mut buffer = [0u8; 8];
        assert!((&mut buffer[..]).from_las_str("café").is_err());
    }
}
