//! Part tags (FourCC) and the frozen set of tags the builder may mutate.
//!
//! A tag is four raw bytes, compared verbatim.  On the wire it occupies the
//! first `u32` of a part header, stored as the bytes themselves (so `b"RTS0"`
//! reads as `RTS0` in a hex dump regardless of host endianness).

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Four-byte part identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

// ── Well-known tags ─────────────────────────────────────────────────────────

/// Container magic, also spelled as a FourCC.
pub const DXBC: FourCC = FourCC(*b"DXBC");

/// Compiled program.  Preserved, never mutated by the builder.
pub const PART_PROGRAM:        FourCC = FourCC(*b"DXIL");
pub const PART_FEATURE_INFO:   FourCC = FourCC(*b"SFI0");
pub const PART_INPUT_SIG:      FourCC = FourCC(*b"ISG1");
pub const PART_OUTPUT_SIG:     FourCC = FourCC(*b"OSG1");
pub const PART_PSV:            FourCC = FourCC(*b"PSV0");
pub const PART_SHADER_HASH:    FourCC = FourCC(*b"HASH");

// ── Mutable allow-list ──────────────────────────────────────────────────────
//
// These five are the only tags `add`/`remove` accept.  The set is closed.

/// Program with full debug information.
pub const PART_DEBUG_BYTECODE: FourCC = FourCC(*b"ILDB");
/// Name of the external debug-info file.
pub const PART_DEBUG_NAME:     FourCC = FourCC(*b"ILDN");
/// Serialized resource-binding layout; requires validation on serialize.
pub const PART_ROOT_SIGNATURE: FourCC = FourCC(*b"RTS0");
/// Compiler statistics.
pub const PART_STATISTICS:     FourCC = FourCC(*b"STAT");
/// Opaque caller data.  Must stay the last part in the container.
pub const PART_PRIVATE_DATA:   FourCC = FourCC(*b"PRIV");

pub const MUTABLE_PARTS: [FourCC; 5] = [
    PART_DEBUG_BYTECODE,
    PART_DEBUG_NAME,
    PART_ROOT_SIGNATURE,
    PART_STATISTICS,
    PART_PRIVATE_DATA,
];

impl FourCC {
    #[inline]
    pub const fn from_u32_le(v: u32) -> Self {
        FourCC(v.to_le_bytes())
    }

    #[inline]
    pub const fn as_u32_le(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// `true` for the five tags `add`/`remove` are allowed to touch.
    pub fn is_mutable(self) -> bool {
        MUTABLE_PARTS.contains(&self)
    }

    /// Human-readable role (diagnostics only, never parsed).
    pub fn describe(self) -> &'static str {
        match self {
            PART_DEBUG_BYTECODE => "debug bytecode",
            PART_DEBUG_NAME     => "debug name",
            PART_ROOT_SIGNATURE => "root signature",
            PART_STATISTICS     => "statistics",
            PART_PRIVATE_DATA   => "private data",
            PART_PROGRAM        => "program",
            PART_FEATURE_INFO   => "feature info",
            PART_INPUT_SIG      => "input signature",
            PART_OUTPUT_SIG     => "output signature",
            PART_PSV            => "pipeline state validation",
            PART_SHADER_HASH    => "shader hash",
            _                   => "unknown",
        }
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.as_u32_le())
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse from a CLI string: exactly four ASCII characters.
impl FromStr for FourCC {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !s.is_ascii() {
            return Err(format!("'{s}' is not a four-character ASCII tag"));
        }
        Ok(FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
