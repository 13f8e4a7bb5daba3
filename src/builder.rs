//! Stateful container editor.
//!
//! ```
//! use dxcontainer::{ContainerBuilder, PART_DEBUG_NAME, PART_PRIVATE_DATA, PART_STATISTICS};
//!
//! let mut b = ContainerBuilder::new();
//! b.add(PART_DEBUG_NAME, b"foo".to_vec())?;
//! b.add(PART_PRIVATE_DATA, b"x".to_vec())?;
//! b.add(PART_STATISTICS, b"y".to_vec())?;   // lands before PRIV
//! let out = b.serialize()?;
//!
//! let parsed = dxcontainer::container::parse(&out.bytes)?;
//! assert_eq!(parsed.parts.last().unwrap().tag, PART_PRIVATE_DATA);
//! # Ok::<(), dxcontainer::ContainerError>(())
//! ```
//!
//! # Stages
//! `Empty → Populated → Serialized`.  `load` is only accepted while Empty;
//! the first successful `load`, `add` or `remove` moves to Populated.  After
//! `serialize` the part list is frozen: further edits fail with
//! `InvalidState`, while repeated `serialize` calls return the same output.
//! Serializing an Empty builder is allowed and goes straight to Serialized,
//! producing a header-only container.
//!
//! # Ordering
//! Tags are unique and a `PRIV` part is always last.  Parts added while one
//! is present are inserted directly in front of it.  `load` moves a `PRIV`
//! part that a foreign tool left mid-container to the end.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};

use crate::container::{self, Layout};
use crate::error::ContainerError;
use crate::fourcc::{FourCC, PART_PRIVATE_DATA, PART_ROOT_SIGNATURE};
use crate::hash::{self, ContainerHasher, HashFunction, StandardHasher};
use crate::header::DIGEST_LEN;
use crate::part::{Part, PART_HEADER_SIZE};
use crate::validator::{ValidationMode, ValidationOutcome, Validator};

// ── Options ──────────────────────────────────────────────────────────────────

/// Configuration for [`ContainerBuilder::with_options`].
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    /// Used when no hash function was detected on load (or nothing was loaded).
    pub default_hash: HashFunction,
}

// ── Stage ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Empty,
    Populated,
    Serialized,
}

// ── Output ───────────────────────────────────────────────────────────────────

/// Everything the validator said during `serialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// `None` when no validation was required.
    pub validation: Option<ValidationOutcome>,
}

impl Diagnostics {
    /// `true` if the validator ran and rejected the container.
    pub fn validation_failed(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| !v.success)
    }

    pub fn errors(&self) -> &str {
        self.validation.as_ref().map_or("", |v| v.errors.as_str())
    }

    pub fn warnings(&self) -> &str {
        self.validation.as_ref().map_or("", |v| v.warnings.as_str())
    }
}

/// Result of [`ContainerBuilder::serialize`].
///
/// When validation failed, `bytes` is structurally complete but its digest
/// field is all zeros and `hash` is `None`.
#[derive(Debug, Clone)]
pub struct SerializedContainer {
    pub bytes:       Vec<u8>,
    pub diagnostics: Diagnostics,
    pub hash:        Option<HashFunction>,
}

impl SerializedContainer {
    pub fn is_hashed(&self) -> bool {
        self.hash.is_some()
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

pub struct ContainerBuilder {
    parts:            Vec<Part>,
    stage:            Stage,
    needs_validation: bool,
    has_private_data: bool,
    detected_hash:    Option<HashFunction>,
    options:          BuilderOptions,
    hasher:           Box<dyn ContainerHasher>,
    validator:        Option<Box<dyn Validator>>,
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("parts", &self.parts.iter().map(|p| p.tag).collect::<Vec<_>>())
            .field("stage", &self.stage)
            .field("needs_validation", &self.needs_validation)
            .field("has_private_data", &self.has_private_data)
            .field("detected_hash", &self.detected_hash)
            .field("has_validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            parts:            Vec::new(),
            stage:            Stage::Empty,
            needs_validation: false,
            has_private_data: false,
            detected_hash:    None,
            options,
            hasher:           Box::new(StandardHasher),
            validator:        None,
        }
    }

    /// `new()` followed by [`load`](Self::load).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        let mut b = Self::new();
        b.load(bytes)?;
        Ok(b)
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn with_hasher(mut self, hasher: impl ContainerHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, tag: FourCC) -> Option<&Part> {
        self.parts.iter().find(|p| p.tag == tag)
    }

    pub fn contains(&self, tag: FourCC) -> bool {
        self.part(tag).is_some()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn needs_validation(&self) -> bool {
        self.needs_validation
    }

    pub fn has_private_data(&self) -> bool {
        self.has_private_data
    }

    pub fn detected_hash(&self) -> Option<HashFunction> {
        self.detected_hash
    }

    pub fn layout(&self) -> Layout {
        container::layout(&self.parts)
    }

    // ── Load ─────────────────────────────────────────────────────────────────

    /// Take ownership of every part in `bytes` and detect which hash function
    /// stamped its digest.
    ///
    /// Part order is preserved except that a `PRIV` part is moved to the end.
    /// A container repeating a tag is rejected with `DuplicateTag` and the
    /// builder stays Empty.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), ContainerError> {
        if self.stage != Stage::Empty {
            return Err(ContainerError::InvalidState("load requires an empty builder"));
        }
        let parsed = container::parse(bytes)?;

        let mut seen = HashSet::with_capacity(parsed.parts.len());
        if let Some(dup) = parsed.parts.iter().find(|p| !seen.insert(p.tag)) {
            return Err(ContainerError::DuplicateTag(dup.tag));
        }

        let mut parts: Vec<Part> = parsed.parts.iter().map(|p| p.to_owned_part()).collect();
        if let Some(at) = parts.iter().position(|p| p.tag == PART_PRIVATE_DATA) {
            if at + 1 != parts.len() {
                debug!(index = at, parts = parts.len(), "moving {PART_PRIVATE_DATA} part to the end");
                let private = parts.remove(at);
                parts.push(private);
            }
        }

        self.parts = parts;
        self.has_private_data = self.contains(PART_PRIVATE_DATA);
        self.detected_hash = hash::detect_hash_function(self.hasher.as_ref(), bytes);
        self.stage = Stage::Populated;

        match self.detected_hash {
            Some(func) => debug!(parts = self.parts.len(), hash = func.name(), "loaded container"),
            None => warn!(
                parts = self.parts.len(),
                digest = %hex::encode(parsed.header.digest),
                "loaded container with unrecognised digest; default hash will be used"
            ),
        }
        Ok(())
    }

    // ── Edit ─────────────────────────────────────────────────────────────────

    /// Add a part from the mutable allow-list.
    ///
    /// Fails with `InvalidArgument` if `tag` is not mutable or `content` is
    /// itself a whole container, and with `DuplicateTag` if `tag` is present.
    /// State is untouched on failure.
    pub fn add(&mut self, tag: FourCC, content: Vec<u8>) -> Result<(), ContainerError> {
        check_mutable(tag)?;
        self.check_editable()?;
        if container::is_container(&content) {
            return Err(ContainerError::InvalidArgument(format!(
                "content for {tag} is a complete container; add its parts instead"
            )));
        }
        if self.contains(tag) {
            return Err(ContainerError::DuplicateTag(tag));
        }
        let grown = self.layout().total_size
            + (container::OFFSET_ENTRY_SIZE + PART_HEADER_SIZE + content.len()) as u64;
        if grown > u32::MAX as u64 {
            return Err(ContainerError::InvalidArgument(format!(
                "adding {} bytes for {tag} would exceed the 4 GiB container limit",
                content.len()
            )));
        }

        let size = content.len();
        let part = Part::new(tag, content);
        match self.parts.iter().position(|p| p.tag == PART_PRIVATE_DATA) {
            Some(at) => self.parts.insert(at, part),
            None => self.parts.push(part),
        }
        if tag == PART_ROOT_SIGNATURE {
            self.needs_validation = true;
        }
        if tag == PART_PRIVATE_DATA {
            self.has_private_data = true;
        }
        self.stage = Stage::Populated;
        debug!(%tag, size, parts = self.parts.len(), "added part");
        Ok(())
    }

    /// Remove a part from the mutable allow-list.
    pub fn remove(&mut self, tag: FourCC) -> Result<(), ContainerError> {
        check_mutable(tag)?;
        self.check_editable()?;
        let idx = self
            .parts
            .iter()
            .position(|p| p.tag == tag)
            .ok_or(ContainerError::MissingPart(tag))?;

        self.parts.remove(idx);
        self.has_private_data = self.contains(PART_PRIVATE_DATA);
        self.stage = Stage::Populated;
        debug!(%tag, parts = self.parts.len(), "removed part");
        Ok(())
    }

    fn check_editable(&self) -> Result<(), ContainerError> {
        if self.stage == Stage::Serialized {
            return Err(ContainerError::InvalidState("container has already been serialized"));
        }
        Ok(())
    }

    // ── Serialize ────────────────────────────────────────────────────────────

    /// Lay out and write the container, validate it if a root signature was
    /// added, then stamp the digest.
    ///
    /// A validator that rejects the container does not make this fail: the
    /// zero-digest bytes come back together with the validator's report.
    /// A missing or broken validator is `ValidatorUnavailable`.
    pub fn serialize(&mut self) -> Result<SerializedContainer, ContainerError> {
        let out = self.render()?;
        self.stage = Stage::Serialized;
        Ok(out)
    }

    /// [`serialize`](Self::serialize), then write the bytes to `sink`.  The
    /// stage only advances once the sink accepted everything.
    pub fn serialize_to<W: Write>(&mut self, mut sink: W) -> Result<SerializedContainer, ContainerError> {
        let out = self.render()?;
        sink.write_all(&out.bytes)?;
        sink.flush()?;
        self.stage = Stage::Serialized;
        Ok(out)
    }

    fn render(&self) -> Result<SerializedContainer, ContainerError> {
        let layout = self.layout();
        let mut bytes = container::write_to_vec(&self.parts, &layout, &[0u8; DIGEST_LEN])?;
        let mut diagnostics = Diagnostics::default();

        if self.needs_validation {
            let validator = self.validator.as_deref().ok_or_else(|| {
                ContainerError::ValidatorUnavailable(format!(
                    "{PART_ROOT_SIGNATURE} part requires validation but no validator is attached"
                ))
            })?;
            let outcome = validator
                .validate(&bytes, ValidationMode::RootSignatureOnly)
                .map_err(|e| ContainerError::ValidatorUnavailable(e.0))?;
            if !outcome.warnings.is_empty() {
                warn!(warnings = %outcome.warnings, "root signature validation warnings");
            }
            let passed = outcome.success;
            diagnostics.validation = Some(outcome);

            if !passed {
                warn!(errors = %diagnostics.errors(), "root signature validation failed; digest left unset");
                return Ok(SerializedContainer { bytes, diagnostics, hash: None });
            }
        }

        let func = self.detected_hash.unwrap_or(self.options.default_hash);
        let digest = hash::compute_digest(self.hasher.as_ref(), func, &bytes);
        container::patch_digest(&mut bytes, &digest);

        debug!(
            parts = self.parts.len(),
            total_size = layout.total_size,
            hash = func.name(),
            "serialized container"
        );
        Ok(SerializedContainer { bytes, diagnostics, hash: Some(func) })
    }
}

fn check_mutable(tag: FourCC) -> Result<(), ContainerError> {
    if !tag.is_mutable() {
        return Err(ContainerError::InvalidArgument(format!(
            "part {tag} cannot be added or removed"
        )));
    }
    Ok(())
}
