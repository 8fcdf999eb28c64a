//! Data model shared between the composer front end and the tag pipeline.
//!
//! Everything here is plain data: serde-tagged unions mirrored into
//! TypeScript via `ts-rs`, with JSON schemas for the app-server surface.
//! The pipeline logic itself lives in `composer-core`.

pub mod content;
pub mod session_id;
pub mod tags;

pub use content::EditorContent;
pub use content::Segment;
pub use session_id::SessionId;
pub use tags::CommandConfig;
pub use tags::CommandKind;
pub use tags::CommandPendingFiles;
pub use tags::CommandTag;
pub use tags::FileHandle;
pub use tags::ResourceKind;
pub use tags::ResourceTag;
pub use tags::Tag;
