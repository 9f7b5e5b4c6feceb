use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A raw variable length record.
///
/// The same structure covers both regular VLRs (two byte data lengths, stored
/// between the header and the points) and extended VLRs (eight byte data
/// lengths, stored after the points).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vlr {
    /// Reserved for future use.
    ///
    /// Should be zero for las 1.1 and above, 0xAABB for las 1.0.
    pub reserved: u16,

    /// The user id that defines the meaning of the record id.
    pub user_id: [u8; 16],

    /// The type of record, dependent on the user id.
    pub record_id: u16,

    /// The number of bytes of data after the vlr header.
    ///
    /// Regular vlrs can only hold two bytes worth of length, extended vlrs
    /// eight.
    pub record_length_after_header: u64,

    /// A textual description of these data.
    pub description: [u8; 32],

    /// The data themselves.
    pub data: Vec<u8>,
}

impl Vlr {
    /// The number of header bytes in a regular vlr.
    pub const HEADER_SIZE: u64 = 54;

    /// The number of header bytes in an extended vlr.
    pub const EXTENDED_HEADER_SIZE: u64 = 60;

    /// Reads a raw VLR.
    ///
    /// Pass `true` for `extended` to read an extended vlr with its eight byte
    /// data length.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::raw::Vlr;
    /// let mut cursor = Cursor::new(vec![0u8; 54]);
    /// let vlr = Vlr::read_from(&mut cursor, false).unwrap();
    /// ```
    pub fn read_from<R: Read>(mut read: R, extended: bool) -> Result<Vlr> {
        let reserved = read.read_u16::<LittleEndian>()?;
        let mut user_id = [0; 16];
        read.read_exact(&mut user_id)?;
        let record_id = read.read_u16::<LittleEndian>()?;
        let record_length_after_header = if extended {
            read.read_u64::<LittleEndian>()?
        } else {
            u64::from(read.read_u16::<LittleEndian>()?)
        };
        let mut description = [0; 32];
        read.read_exact(&mut description)?;
        let mut data = Vec::new();
        let taken = read
            .take(record_length_after_header)
            .read_to_end(&mut data)?;
        if (taken as u64) < record_length_after_header {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "vlr data truncated: expected {} bytes, got {}",
                    record_length_after_header, taken
                ),
            )
            .into());
        }
        Ok(Vlr {
            reserved,
            user_id,
            record_id,
            record_length_after_header,
            description,
            data,
        })
    }

    /// Writes a raw VLR.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::raw::Vlr;
    /// let mut cursor = Cursor::new(Vec::new());
    /// Vlr::default().write_to(&mut cursor, false).unwrap();
    /// assert_eq!(54, cursor.into_inner().len());
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W, extended: bool) -> Result<()> {
        write.write_u16::<LittleEndian>(self.reserved)?;
        write.write_all(&self.user_id)?;
        write.write_u16::<LittleEndian>(self.record_id)?;
        if extended {
            write.write_u64::<LittleEndian>(self.record_length_after_header)?;
        } else {
            write.write_u16::<LittleEndian>(self.record_length_after_header as u16)?;
        }
        write.write_all(&self.description)?;
        write.write_all(&self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip() {
        let vlr = Vlr {
            reserved: 0,
            user_id: *b"integration-test",
            record_id: 42,
            record_length_after_header: 3,
            description: [0; 32],
            data: vec![1, 2, 3],
        };
        let mut cursor = Cursor::new(Vec::new());
        vlr.write_to(&mut cursor, false).unwrap();
        cursor.set_position(0);
        let other = Vlr::read_from(&mut cursor, false).unwrap();
        assert_eq!(vlr, other);
    }

    #[test]
    fn extended_round_trip() {
        let vlr = Vlr {
            record_length_after_header: 2,
            data: vec![7, 8],
            ..Default::default()
        };
        let mut cursor = Cursor::new(Vec::new());
        vlr.write_to(&mut cursor, true).unwrap();
        assert_eq!(62, cursor.get_ref().len());
        cursor.set_position(0);
        let other = Vlr::read_from(&mut cursor, true).unwrap();
        assert_eq!(vlr, other);
    }

    #[test]
    fn truncated_data() {
        let mut bytes = vec![0u8; 54];
        bytes[18] = 10; // record_length_after_header
        let cursor = Cursor::new(bytes);
        assert!(Vlr::read_from(cursor, false).is_err());
    }
}
