// ABOUTME: Artifact validation and extraction.
// ABOUTME: Nothing is unpacked until `validate` has accepted the file.

mod extract;
mod validate;

pub use extract::{ExtractError, extract, resolve_content_root, unpack};
pub use validate::{
    ArtifactMetadata, ArtifactType, MIN_ARTIFACT_SIZE, PREVIEW_LEN, ValidationError, validate,
};
