pub mod error;
pub mod fourcc;
pub mod header;
pub mod part;
pub mod container;
pub mod hash;
pub mod validator;
pub mod builder;

pub use error::ContainerError;
pub use fourcc::{
    FourCC, MUTABLE_PARTS, PART_DEBUG_BYTECODE, PART_DEBUG_NAME, PART_PRIVATE_DATA,
    PART_ROOT_SIGNATURE, PART_STATISTICS,
};
pub use header::{ContainerHeader, Digest, DIGEST_LEN};
pub use part::{Part, PartRef};
pub use container::{layout, parse, Layout, ParsedContainer};
pub use hash::{ContainerHasher, HashFunction, StandardHasher};
pub use validator::{ValidationMode, ValidationOutcome, Validator, ValidatorError};
pub use builder::{BuilderOptions, ContainerBuilder, Diagnostics, SerializedContainer, Stage};
