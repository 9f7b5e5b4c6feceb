//! Raw file metadata.

use crate::{header::Error, raw::LASF, Result, Version};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A raw las header, mapping byte-for-byte onto the Public Header Block.
///
/// Optional trailing sections grew over the minor versions: las 1.3 added the
/// waveform data packet offset, las 1.4 the evlr pointers and the 64-bit point
/// counts. Those live in `Option`s here so that one structure can round-trip
/// every version.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// The file signature.
    ///
    /// Must be "LASF".
    pub file_signature: [u8; 4],

    /// A project-wide unique ID for the file.
    ///
    /// A value of zero is interpreted to mean that an ID has not been
    /// assigned.
    pub file_source_id: u16,

    /// A bit field used to indicate certain global properties about the file.
    ///
    /// See [GlobalEncoding](crate::GlobalEncoding) for the defined bits.
    pub global_encoding: u16,

    /// The four fields that comprise a complete Globally Unique Identifier.
    pub guid: [u8; 16],

    /// The version of this file.
    pub version: Version,

    /// The hardware or operation that produced this file.
    pub system_identifier: [u8; 32],

    /// The software which generated these data.
    pub generating_software: [u8; 32],

    /// Day on which this file was created, computed as the Greenwich Mean
    /// Time day. January 1 is considered day 1.
    pub file_creation_day_of_year: u16,

    /// The year in which the file was created.
    pub file_creation_year: u16,

    /// The size, in bytes, of the Public Header Block itself.
    ///
    /// If a generating software adds data to the end of the header, this
    /// must be updated; those bytes land in `padding` on read.
    pub header_size: u16,

    /// The actual number of bytes from the beginning of the file to the
    /// first field of the first point record.
    pub offset_to_point_data: u32,

    /// The number of VLRs that are stored in the file preceding the point
    /// data.
    pub number_of_variable_length_records: u32,

    /// The point data record format number, with the high bit set for
    /// laszip-compressed data.
    pub point_data_record_format: u8,

    /// The size, in bytes, of each point record.
    pub point_data_record_length: u16,

    /// The number of point records, as a legacy 32-bit count.
    ///
    /// Zero when the real count lives in `large_file`.
    pub number_of_point_records: u32,

    /// The number of points by return, as legacy 32-bit counts.
    pub number_of_points_by_return: [u32; 5],

    /// The scale factors applied to each coordinate axis.
    pub x_scale_factor: f64,
    /// See `x_scale_factor`.
    pub y_scale_factor: f64,
    /// See `x_scale_factor`.
    pub z_scale_factor: f64,

    /// The offsets applied to each coordinate axis.
    pub x_offset: f64,
    /// See `x_offset`.
    pub y_offset: f64,
    /// See `x_offset`.
    pub z_offset: f64,

    /// The maximum x value, unscaled.
    pub max_x: f64,
    /// The minimum x value, unscaled.
    pub min_x: f64,
    /// The maximum y value, unscaled.
    pub max_y: f64,
    /// The minimum y value, unscaled.
    pub min_y: f64,
    /// The maximum z value, unscaled.
    pub max_z: f64,
    /// The minimum z value, unscaled.
    pub min_z: f64,

    /// The offset to the first byte of the waveform data package record.
    ///
    /// Las 1.3 and above.
    pub start_of_waveform_data_packet_record: Option<u64>,

    /// The evlr pointers, las 1.4 and above.
    pub evlr: Option<Evlr>,

    /// The 64-bit point counts, las 1.4 and above.
    pub large_file: Option<LargeFile>,

    /// Any bytes between the defined fields and `header_size`.
    pub padding: Vec<u8>,
}

/// The extended variable length record pointers in a las 1.4 header.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Evlr {
    /// The offset to the first byte of the first EVLR.
    pub start_of_first_evlr: u64,

    /// The number of EVLRs in the file.
    pub number_of_evlrs: u32,
}

/// The 64-bit point counts of a las 1.4 header.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LargeFile {
    /// The total number of point records.
    pub number_of_point_records: u64,

    /// The number of points by return.
    pub number_of_points_by_return: [u64; 15],
}

impl Header {
    /// Reads a raw header.
    ///
    /// An invalid file signature is fatal; everything else is read as
    /// presented and left for [Builder](crate::Builder) to judge.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::raw::Header;
    /// let mut cursor = Cursor::new(Vec::new());
    /// Header::default().write_to(&mut cursor).unwrap();
    /// cursor.set_position(0);
    /// let header = Header::read_from(&mut cursor).unwrap();
    /// ```
    pub fn read_from<R: Read>(mut read: R) -> Result<Header> {
        let mut file_signature = [0; 4];
        read.read_exact(&mut file_signature)?;
        if file_signature != LASF {
            return Err(Error::FileSignature(file_signature).into());
        }
        let file_source_id = read.read_u16::<LittleEndian>()?;
        let global_encoding = read.read_u16::<LittleEndian>()?;
        let mut guid = [0; 16];
        read.read_exact(&mut guid)?;
        let version = Version::new(read.read_u8()?, read.read_u8()?);
        let mut system_identifier = [0; 32];
        read.read_exact(&mut system_identifier)?;
        let mut generating_software = [0; 32];
        read.read_exact(&mut generating_software)?;
        let file_creation_day_of_year = read.read_u16::<LittleEndian>()?;
        let file_creation_year = read.read_u16::<LittleEndian>()?;
        let header_size = read.read_u16::<LittleEndian>()?;
        let offset_to_point_data = read.read_u32::<LittleEndian>()?;
        let number_of_variable_length_records = read.read_u32::<LittleEndian>()?;
        let point_data_record_format = read.read_u8()?;
        let point_data_record_length = read.read_u16::<LittleEndian>()?;
        let number_of_point_records = read.read_u32::<LittleEndian>()?;
        let mut number_of_points_by_return = [0; 5];
        for n in &mut number_of_points_by_return {
            *n = read.read_u32::<LittleEndian>()?;
        }
        let x_scale_factor = read.read_f64::<LittleEndian>()?;
        let y_scale_factor = read.read_f64::<LittleEndian>()?;
        let z_scale_factor = read.read_f64::<LittleEndian>()?;
        let x_offset = read.read_f64::<LittleEndian>()?;
        let y_offset = read.read_f64::<LittleEndian>()?;
        let z_offset = read.read_f64::<LittleEndian>()?;
        let max_x = read.read_f64::<LittleEndian>()?;
        let min_x = read.read_f64::<LittleEndian>()?;
        let max_y = read.read_f64::<LittleEndian>()?;
        let min_y = read.read_f64::<LittleEndian>()?;
        let max_z = read.read_f64::<LittleEndian>()?;
        let min_z = read.read_f64::<LittleEndian>()?;
        let mut consumed = 227u16;
        let start_of_waveform_data_packet_record =
            if version.minor >= 3 && header_size >= consumed + 8 {
                consumed += 8;
                Some(read.read_u64::<LittleEndian>()?)
            } else {
                None
            };
        let (evlr, large_file) = if version.minor >= 4 && header_size >= consumed + 140 {
            consumed += 140;
            let evlr = Evlr {
                start_of_first_evlr: read.read_u64::<LittleEndian>()?,
                number_of_evlrs: read.read_u32::<LittleEndian>()?,
            };
            let mut large_file = LargeFile {
                number_of_point_records: read.read_u64::<LittleEndian>()?,
                ..Default::default()
            };
            for n in &mut large_file.number_of_points_by_return {
                *n = read.read_u64::<LittleEndian>()?;
            }
            (Some(evlr), Some(large_file))
        } else {
            (None, None)
        };
        let mut padding = Vec::new();
        if header_size > consumed {
            let taken = read
                .take(u64::from(header_size - consumed))
                .read_to_end(&mut padding)?;
            if taken < usize::from(header_size - consumed) {
                return Err(Error::TooSmall(header_size).into());
            }
        }
        Ok(Header {
            file_signature,
            file_source_id,
            global_encoding,
            guid,
            version,
            system_identifier,
            generating_software,
            file_creation_day_of_year,
            file_creation_year,
            header_size,
            offset_to_point_data,
            number_of_variable_length_records,
            point_data_record_format,
            point_data_record_length,
            number_of_point_records,
            number_of_points_by_return,
            x_scale_factor,
            y_scale_factor,
            z_scale_factor,
            x_offset,
            y_offset,
            z_offset,
            max_x,
            min_x,
            max_y,
            min_y,
            max_z,
            min_z,
            start_of_waveform_data_packet_record,
            evlr,
            large_file,
            padding,
        })
    }

    /// Writes a raw header.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use pointclouds::raw::Header;
    /// let mut cursor = Cursor::new(Vec::new());
    /// Header::default().write_to(&mut cursor).unwrap();
    /// ```
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_all(&self.file_signature)?;
        write.write_u16::<LittleEndian>(self.file_source_id)?;
        write.write_u16::<LittleEndian>(self.global_encoding)?;
        write.write_all(&self.guid)?;
        write.write_u8(self.version.major)?;
        write.write_u8(self.version.minor)?;
        write.write_all(&self.system_identifier)?;
        write.write_all(&self.generating_software)?;
        write.write_u16::<LittleEndian>(self.file_creation_day_of_year)?;
        write.write_u16::<LittleEndian>(self.file_creation_year)?;
        write.write_u16::<LittleEndian>(self.header_size)?;
        write.write_u32::<LittleEndian>(self.offset_to_point_data)?;
        write.write_u32::<LittleEndian>(self.number_of_variable_length_records)?;
        write.write_u8(self.point_data_record_format)?;
        write.write_u16::<LittleEndian>(self.point_data_record_length)?;
        write.write_u32::<LittleEndian>(self.number_of_point_records)?;
        for &n in &self.number_of_points_by_return {
            write.write_u32::<LittleEndian>(n)?;
        }
        write.write_f64::<LittleEndian>(self.x_scale_factor)?;
        write.write_f64::<LittleEndian>(self.y_scale_factor)?;
        write.write_f64::<LittleEndian>(self.z_scale_factor)?;
        write.write_f64::<LittleEndian>(self.x_offset)?;
        write.write_f64::<LittleEndian>(self.y_offset)?;
        write.write_f64::<LittleEndian>(self.z_offset)?;
        write.write_f64::<LittleEndian>(self.max_x)?;
        write.write_f64::<LittleEndian>(self.min_x)?;
        write.write_f64::<LittleEndian>(self.max_y)?;
        write.write_f64::<LittleEndian>(self.min_y)?;
        write.write_f64::<LittleEndian>(self.max_z)?;
        write.write_f64::<LittleEndian>(self.min_z)?;
        if let Some(start) = self.start_of_waveform_data_packet_record {
            write.write_u64::<LittleEndian>(start)?;
        }
        if let Some(evlr) = self.evlr {
            write.write_u64::<LittleEndian>(evlr.start_of_first_evlr)?;
            write.write_u32::<LittleEndian>(evlr.number_of_evlrs)?;
        }
        if let Some(large_file) = self.large_file {
            write.write_u64::<LittleEndian>(large_file.number_of_point_records)?;
            for &n in &large_file.number_of_points_by_return {
                write.write_u64::<LittleEndian>(n)?;
            }
        }
        write.write_all(&self.padding)?;
        Ok(())
    }
}

impl Default for Header {
    fn default() -> Header {
        Header {
            file_signature: LASF,
            file_source_id: 0,
            global_encoding: 0,
            guid: [0; 16],
            version: Version::new(0, 0),
            system_identifier: [0; 32],
            generating_software: [0; 32],
            file_creation_day_of_year: 0,
            file_creation_year: 0,
            header_size: 227,
            offset_to_point_data: 227,
            number_of_variable_length_records: 0,
            point_data_record_format: 0,
            point_data_record_length: 20,
            number_of_point_records: 0,
            number_of_points_by_return: [0; 5],
            x_scale_factor: 1.,
            y_scale_factor: 1.,
            z_scale_factor: 1.,
            x_offset: 0.,
            y_offset: 0.,
            z_offset: 0.,
            max_x: 0.,
            min_x: 0.,
            max_y: 0.,
            min_y: 0.,
            max_z: 0.,
            min_z: 0.,
            start_of_waveform_data_packet_record: None,
            evlr: None,
            large_file: None,
            padding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(header: Header) {
        let mut cursor = Cursor::new(Vec::new());
        header.write_to(&mut cursor).unwrap();
        assert_eq!(usize::from(header.header_size), cursor.get_ref().len());
        cursor.set_position(0);
        assert_eq!(header, Header::read_from(&mut cursor).unwrap());
    }

    #[test]
    fn las_1_2() {
        round_trip(Header {
            version: Version::new(1, 2),
            ..Default::default()
        });
    }

    #[test]
    fn las_1_3() {
        round_trip(Header {
            version: Version::new(1, 3),
            header_size: 235,
            offset_to_point_data: 235,
            start_of_waveform_data_packet_record: Some(0),
            ..Default::default()
        });
    }

    #[test]
    fn las_1_4() {
        round_trip(Header {
            version: Version::new(1, 4),
            header_size: 375,
            offset_to_point_data: 375,
            start_of_waveform_data_packet_record: Some(0),
            evlr: Some(Evlr::default()),
            large_file: Some(LargeFile {
                number_of_point_records: 42,
                number_of_points_by_return: [1; 15],
            }),
            ..Default::default()
        });
    }

    #[test]
    fn padding() {
        round_trip(Header {
            header_size: 230,
            padding: vec![1, 2, 3],
            ..Default::default()
        });
    }

    #[test]
    fn bad_signature() {
        let mut bytes = vec![0u8; 227];
        bytes[0..4].copy_from_slice(b"LASX");
        assert!(Header::read_from(Cursor::new(bytes)).is_err());
    }
}
