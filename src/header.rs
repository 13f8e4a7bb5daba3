//! Fixed 32-byte container header at offset 0.
//!
//! ```text
//!  0  magic          4   "DXBC"
//!  4  digest        16   hash of [20, total_size)
//! 20  version_major  2
//! 22  version_minor  2
//! 24  total_size     4
//! 28  part_count     4
//! ```
//!
//! All integers little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::fourcc::{FourCC, DXBC};

pub const DIGEST_LEN:     usize = 16;
pub const HEADER_SIZE:    usize = 32;
pub const DIGEST_OFFSET:  usize = 4;
/// First byte covered by the digest.
pub const VERSION_OFFSET: usize = 20;
pub const VERSION_MAJOR:  u16   = 1;
pub const VERSION_MINOR:  u16   = 0;

pub type Digest = [u8; DIGEST_LEN];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic:         FourCC,
    pub digest:        Digest,
    pub version_major: u16,
    pub version_minor: u16,
    pub total_size:    u32,
    pub part_count:    u32,
}

impl ContainerHeader {
    pub fn new(total_size: u32, part_count: u32, digest: Digest) -> Self {
        Self {
            magic: DXBC,
            digest,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            total_size,
            part_count,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic.0)?;
        writer.write_all(&self.digest)?;
        writer.write_u16::<LittleEndian>(self.version_major)?;
        writer.write_u16::<LittleEndian>(self.version_minor)?;
        writer.write_u32::<LittleEndian>(self.total_size)?;
        writer.write_u32::<LittleEndian>(self.part_count)?;
        Ok(())
    }

    /// Reads the raw fields.  No validation; the container codec decides
    /// what a usable header is.
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let mut digest = [0u8; DIGEST_LEN];
        reader.read_exact(&mut digest)?;
        Ok(Self {
            magic:         FourCC(magic),
            digest,
            version_major: reader.read_u16::<LittleEndian>()?,
            version_minor: reader.read_u16::<LittleEndian>()?,
            total_size:    reader.read_u32::<LittleEndian>()?,
            part_count:    reader.read_u32::<LittleEndian>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_offsets_match_layout() {
        let mut buf = Vec::new();
        ContainerHeader::new(0x1122_3344, 7, [0xAB; DIGEST_LEN]).write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..4], b"DXBC");
        assert_eq!(&buf[DIGEST_OFFSET..DIGEST_OFFSET + DIGEST_LEN], &[0xAB; DIGEST_LEN]);
        assert_eq!(&buf[VERSION_OFFSET..VERSION_OFFSET + 4], &[1, 0, 0, 0]);
        assert_eq!(&buf[24..28], &0x1122_3344u32.to_le_bytes());
        assert_eq!(&buf[28..32], &7u32.to_le_bytes());

        let back = ContainerHeader::read(&buf[..]).unwrap();
        assert_eq!(back.total_size, 0x1122_3344);
        assert_eq!(back.part_count, 7);
    }

    #[test]
    fn short_read_is_an_error() {
        assert!(ContainerHeader::read(&[0u8; HEADER_SIZE - 1][..]).is_err());
    }
}
