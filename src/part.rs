use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::fourcc::FourCC;

/// On-wire size of a part header (tag + content size).
pub const PART_HEADER_SIZE: usize = 8;

/// Header preceding every part's content.  No padding follows the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartHeader {
    pub tag:          FourCC,
    pub content_size: u32,
}

impl PartHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.tag.0)?;
        writer.write_u32::<LittleEndian>(self.content_size)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        Ok(Self {
            tag:          FourCC(tag),
            content_size: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// A part owned by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub tag:     FourCC,
    pub content: Vec<u8>,
}

impl Part {
    pub fn new(tag: FourCC, content: Vec<u8>) -> Self {
        Self { tag, content }
    }

    /// Bytes this part occupies on the wire, header included.
    #[inline]
    pub fn wire_size(&self) -> u64 {
        (PART_HEADER_SIZE + self.content.len()) as u64
    }
}

/// A part borrowed from a parsed container buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRef<'a> {
    pub tag:     FourCC,
    pub content: &'a [u8],
}

impl PartRef<'_> {
    pub fn to_owned_part(&self) -> Part {
        Part::new(self.tag, self.content.to_vec())
    }
}

/// Anything the layout/writer can treat as a part.
pub trait PartData {
    fn tag(&self) -> FourCC;
    fn content(&self) -> &[u8];
}

impl PartData for Part {
    fn tag(&self) -> FourCC { self.tag }
    fn content(&self) -> &[u8] { &self.content }
}

impl PartData for PartRef<'_> {
    fn tag(&self) -> FourCC { self.tag }
    fn content(&self) -> &[u8] { self.content }
}
