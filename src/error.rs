use std::io;
use thiserror::Error;

use crate::fourcc::FourCC;

/// Every failure the codec and builder can report.
///
/// A validator that runs and *rejects* the root signature is not an error;
/// see [`crate::builder::SerializedContainer::diagnostics`].
#[derive(Error, Debug)]
pub enum ContainerError {
    /// The bytes are not a well-formed container. Retrying with the same
    /// input will fail the same way.
    #[error("Not a container: {0}")]
    NotAContainer(String),
    /// Tag outside the mutable allow-list, or content that is itself a container.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Duplicate part {0}")]
    DuplicateTag(FourCC),
    #[error("Missing part {0}")]
    MissingPart(FourCC),
    /// Operation not allowed in the builder's current stage.
    #[error("Invalid builder state: {0}")]
    InvalidState(&'static str),
    /// The validator could not be invoked at all.
    #[error("Validator unavailable: {0}")]
    ValidatorUnavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ContainerError {
    pub(crate) fn not_a_container(reason: impl Into<String>) -> Self {
        ContainerError::NotAContainer(reason.into())
    }
}
