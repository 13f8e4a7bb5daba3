//! Stateless container codec: parse, layout and write.
//!
//! # Layout
//! ```text
//! ┌────────────────────────────┐ 0
//! │ ContainerHeader (32 B)     │
//! ├────────────────────────────┤ 32
//! │ offset table (4 B × count) │  absolute offsets of each part header
//! ├────────────────────────────┤ 32 + 4·count
//! │ PartHeader (8 B) | content │  part 0
//! │ PartHeader (8 B) | content │  part 1
//! │ ...                        │
//! └────────────────────────────┘ total_size
//! ```
//!
//! Parts are packed with no alignment padding, in offset-table order.
//! Parsing borrows from the input; nothing is copied until the builder takes
//! ownership.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Write};

use crate::error::ContainerError;
use crate::fourcc::DXBC;
use crate::header::{ContainerHeader, Digest, DIGEST_LEN, DIGEST_OFFSET, HEADER_SIZE, VERSION_OFFSET};
use crate::part::{PartData, PartHeader, PartRef, PART_HEADER_SIZE};

/// Size of one offset-table entry.
pub const OFFSET_ENTRY_SIZE: usize = 4;

// ── Parse ────────────────────────────────────────────────────────────────────

/// A parsed container: its header plus borrowed part views in table order.
#[derive(Debug, Clone)]
pub struct ParsedContainer<'a> {
    pub header: ContainerHeader,
    pub parts:  Vec<PartRef<'a>>,
}

/// Parse `bytes` as a complete container.
///
/// The header must be readable, carry the `DXBC` magic, and declare a
/// `total_size` equal to `bytes.len()`.  Every offset-table entry and every
/// part extent must lie inside the buffer.  Any violation is
/// [`ContainerError::NotAContainer`]; no partial result is returned.
pub fn parse(bytes: &[u8]) -> Result<ParsedContainer<'_>, ContainerError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ContainerError::not_a_container(format!(
            "need at least {HEADER_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    let header = ContainerHeader::read(&bytes[..HEADER_SIZE])
        .map_err(|e| ContainerError::not_a_container(format!("unreadable header: {e}")))?;
    if header.magic != DXBC {
        return Err(ContainerError::not_a_container(format!(
            "bad magic {}, expected {}",
            header.magic, DXBC
        )));
    }
    if header.total_size as usize != bytes.len() {
        return Err(ContainerError::not_a_container(format!(
            "total_size {} does not match buffer length {}",
            header.total_size,
            bytes.len()
        )));
    }

    let count = header.part_count as usize;
    let table_end = count
        .checked_mul(OFFSET_ENTRY_SIZE)
        .and_then(|len| len.checked_add(HEADER_SIZE))
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            ContainerError::not_a_container(format!(
                "offset table for {count} parts does not fit in {} bytes",
                bytes.len()
            ))
        })?;

    let mut table = Cursor::new(&bytes[HEADER_SIZE..table_end]);
    let mut parts = Vec::with_capacity(count);
    for i in 0..count {
        let offset = table.read_u32::<LittleEndian>()? as usize;
        parts.push(read_part(bytes, i, offset, table_end)?);
    }

    Ok(ParsedContainer { header, parts })
}

fn read_part(bytes: &[u8], index: usize, offset: usize, table_end: usize) -> Result<PartRef<'_>, ContainerError> {
    if offset < table_end {
        return Err(ContainerError::not_a_container(format!(
            "part {index} offset {offset} points into header or offset table (< {table_end})"
        )));
    }
    let content_start = offset
        .checked_add(PART_HEADER_SIZE)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            ContainerError::not_a_container(format!(
                "part {index} header at {offset} runs past end of container"
            ))
        })?;
    let ph = PartHeader::read(&bytes[offset..content_start])?;
    let content_end = content_start
        .checked_add(ph.content_size as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            ContainerError::not_a_container(format!(
                "part {index} ({}) content of {} bytes at {content_start} runs past end of container",
                ph.tag, ph.content_size
            ))
        })?;
    Ok(PartRef { tag: ph.tag, content: &bytes[content_start..content_end] })
}

/// Cheap yes/no form of [`parse`].
pub fn is_container(bytes: &[u8]) -> bool {
    parse(bytes).is_ok()
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Byte placement of every part for a given part list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Absolute offset of each part header, in list order.
    pub offsets:    Vec<u64>,
    pub total_size: u64,
}

impl Layout {
    /// Where the first part header lands for `count` parts.
    #[inline]
    pub fn parts_start(count: usize) -> u64 {
        (HEADER_SIZE + count * OFFSET_ENTRY_SIZE) as u64
    }

    /// `true` if every value fits the on-wire `u32` fields.
    pub fn fits_on_wire(&self) -> bool {
        self.total_size <= u32::MAX as u64
    }
}

/// Compute offsets and total size.  Infallible for any list, including empty.
pub fn layout<P: PartData>(parts: &[P]) -> Layout {
    let mut cursor = Layout::parts_start(parts.len());
    let mut offsets = Vec::with_capacity(parts.len());
    for part in parts {
        offsets.push(cursor);
        cursor += (PART_HEADER_SIZE + part.content().len()) as u64;
    }
    Layout { offsets, total_size: cursor }
}

// ── Write ────────────────────────────────────────────────────────────────────

/// Serialize header, offset table and parts into `sink`.
///
/// `digest` is written verbatim.  Fails with `InvalidInput` if `layout` does
/// not belong to `parts` or does not fit the 32-bit size fields.
pub fn write<P: PartData, W: Write>(
    parts:  &[P],
    layout: &Layout,
    digest: &Digest,
    mut sink: W,
) -> io::Result<()> {
    if layout.offsets.len() != parts.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("layout has {} offsets for {} parts", layout.offsets.len(), parts.len()),
        ));
    }
    let total_size = u32::try_from(layout.total_size).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("container of {} bytes exceeds the 32-bit size field", layout.total_size),
        )
    })?;

    ContainerHeader::new(total_size, parts.len() as u32, *digest).write(&mut sink)?;
    for &offset in &layout.offsets {
        // Every offset is below total_size, which fits.
        sink.write_u32::<LittleEndian>(offset as u32)?;
    }
    for part in parts {
        PartHeader { tag: part.tag(), content_size: part.content().len() as u32 }.write(&mut sink)?;
        sink.write_all(part.content())?;
    }
    Ok(())
}

/// [`write`] into a freshly allocated buffer.
pub fn write_to_vec<P: PartData>(parts: &[P], layout: &Layout, digest: &Digest) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(layout.total_size as usize);
    write(parts, layout, digest, &mut out)?;
    Ok(out)
}

// ── Digest field helpers ─────────────────────────────────────────────────────

/// The byte range the digest covers: from the version field to the end.
pub fn hashed_range(container: &[u8]) -> &[u8] {
    container.get(VERSION_OFFSET..).unwrap_or(&[])
}

/// Digest currently stored in a container's header.  `None` if too short.
pub fn stored_digest(container: &[u8]) -> Option<Digest> {
    container
        .get(DIGEST_OFFSET..DIGEST_OFFSET + DIGEST_LEN)
        .and_then(|s| s.try_into().ok())
}

/// Overwrite the digest field in place.  No re-layout is needed: the field
/// sits at a fixed offset.
pub fn patch_digest(container: &mut [u8], digest: &Digest) {
    if let Some(field) = container.get_mut(DIGEST_OFFSET..DIGEST_OFFSET + DIGEST_LEN) {
        field.copy_from_slice(digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fourcc::{FourCC, PART_DEBUG_NAME, PART_PROGRAM, PART_STATISTICS};
    use crate::part::Part;

    fn sample() -> Vec<Part> {
        vec![
            Part::new(PART_PROGRAM, vec![1, 2, 3, 4, 5]),
            Part::new(PART_DEBUG_NAME, b"shader.pdb\0\0".to_vec()),
            Part::new(PART_STATISTICS, Vec::new()),
        ]
    }

    #[test]
    fn empty_layout_is_header_only() {
        let l = layout::<Part>(&[]);
        assert!(l.offsets.is_empty());
        assert_eq!(l.total_size, HEADER_SIZE as u64);

        let bytes = write_to_vec::<Part>(&[], &l, &[0; DIGEST_LEN]).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.header.part_count, 0);
        assert!(parsed.parts.is_empty());
    }

    #[test]
    fn layout_follows_cumulative_sum() {
        let parts = sample();
        let l = layout(&parts);
        assert_eq!(l.offsets, vec![44, 57, 77]);
        assert_eq!(l.total_size, 85);
    }

    #[test]
    fn parse_yields_parts_in_table_order() {
        let parts = sample();
        let l = layout(&parts);
        let bytes = write_to_vec(&parts, &l, &[7; DIGEST_LEN]).unwrap();
        assert_eq!(bytes.len() as u64, l.total_size);

        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.header.digest, [7; DIGEST_LEN]);
        let tags: Vec<FourCC> = parsed.parts.iter().map(|p| p.tag).collect();
        assert_eq!(tags, vec![PART_PROGRAM, PART_DEBUG_NAME, PART_STATISTICS]);
        assert_eq!(parsed.parts[1].content, b"shader.pdb\0\0");
        assert!(parsed.parts[2].content.is_empty());
    }

    #[test]
    fn rejects_short_bad_magic_and_size_mismatch() {
        assert!(matches!(parse(b"DXBC"), Err(ContainerError::NotAContainer(_))));

        let parts = sample();
        let mut bytes = write_to_vec(&parts, &layout(&parts), &[0; DIGEST_LEN]).unwrap();

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(parse(&trailing), Err(ContainerError::NotAContainer(_))));

        bytes[0] = b'X';
        assert!(matches!(parse(&bytes), Err(ContainerError::NotAContainer(_))));
    }

    #[test]
    fn rejects_offsets_outside_buffer() {
        let parts = sample();
        let bytes = write_to_vec(&parts, &layout(&parts), &[0; DIGEST_LEN]).unwrap();

        let mut into_table = bytes.clone();
        into_table[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&4u32.to_le_bytes());
        assert!(matches!(parse(&into_table), Err(ContainerError::NotAContainer(_))));

        let mut past_end = bytes.clone();
        past_end[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&(bytes.len() as u32 - 2).to_le_bytes());
        assert!(matches!(parse(&past_end), Err(ContainerError::NotAContainer(_))));

        let mut huge_count = bytes.clone();
        huge_count[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse(&huge_count), Err(ContainerError::NotAContainer(_))));
    }

    #[test]
    fn write_rejects_mismatched_layout() {
        let parts = sample();
        let l = layout(&parts[..1]);
        let err = write_to_vec(&parts, &l, &[0; DIGEST_LEN]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn digest_helpers_touch_only_the_digest_field() {
        let parts = sample();
        let mut bytes = write_to_vec(&parts, &layout(&parts), &[0; DIGEST_LEN]).unwrap();
        let before = hashed_range(&bytes).to_vec();
        patch_digest(&mut bytes, &[0x5A; DIGEST_LEN]);
        assert_eq!(stored_digest(&bytes), Some([0x5A; DIGEST_LEN]));
        assert_eq!(hashed_range(&bytes), &before[..]);
        assert_eq!(hashed_range(&bytes).len(), bytes.len() - VERSION_OFFSET);
    }
}
