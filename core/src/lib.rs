//! Tag pipeline for the chat composer.
//!
//! The composer's authored text mixes free text with two kinds of atomic
//! embedded references: uploaded-file resources (`@image://id`) and
//! parameterized commands (`[cmd:id]`). This crate owns the bidirectional
//! mapping between that machine text form, the structured
//! [`composer_protocol::EditorContent`] segment list, and the editable
//! document's inline units — plus the async upload-resolution step that
//! swaps locally issued temp ids for server ids on submit, and the reverse
//! codec that re-derives command parameters from already-expanded
//! human-readable history text.

pub mod command_codec;
pub mod content_model;
pub mod document;
pub mod registry;
pub mod resolver;
pub mod submission;
pub mod tag_matcher;

pub use command_codec::DecodedCommand;
pub use command_codec::decode_command_sentence;
pub use content_model::parse;
pub use content_model::serialize_machine;
pub use registry::TagLookup;
pub use registry::TagRegistry;
pub use resolver::ResolveError;
pub use resolver::ResolveOutcome;
pub use resolver::UploadOperation;
pub use resolver::UploadResolver;
pub use resolver::UploadedResource;
pub use submission::SubmitValidationError;
pub use submission::serialize_for_submission;
pub use submission::validate_for_submission;
