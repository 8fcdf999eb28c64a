use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

/// Prefix of locally issued resource ids. Whether a tag still awaits a
/// server-issued identity is a pure string predicate on its id, never
/// registry state.
pub const TEMP_ID_PREFIX: &str = "tmp_";

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

pub fn new_temp_resource_id() -> String {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4().simple())
}

pub fn new_command_id() -> String {
    format!("cmd_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, TS, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Text,
    Doc,
}

impl ResourceKind {
    /// Scheme component of the machine form `@<scheme>://<id>`.
    pub fn as_scheme(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Text => "text",
            ResourceKind::Doc => "doc",
        }
    }

    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "image" => Some(ResourceKind::Image),
            "text" => Some(ResourceKind::Text),
            "doc" => Some(ResourceKind::Doc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, TS, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    TextToImage,
    ImageToImage,
}

/// Owned handle to a local file that has not been uploaded yet. The upload
/// resolver consumes the handle when the upload succeeds; file identity
/// (for upload de-duplication) is the path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, TS, JsonSchema)]
pub struct FileHandle {
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// An uploaded (or still-uploading) file reference embedded in the text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
pub struct ResourceTag {
    pub resource_kind: ResourceKind,
    pub id: String,
    pub name: String,
    pub is_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_file: Option<FileHandle>,
}

impl ResourceTag {
    /// A freshly inserted local file: temp id, pending until resolved.
    pub fn pending(resource_kind: ResourceKind, file: FileHandle) -> Self {
        let tag = Self {
            resource_kind,
            id: new_temp_resource_id(),
            name: file.display_name(),
            is_pending: true,
            pending_file: Some(file),
        };
        debug_assert_eq!(tag.is_pending, tag.pending_file.is_some());
        tag
    }

    /// A tag that already carries a server-issued id.
    pub fn resolved(resource_kind: ResourceKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_kind,
            id: id.into(),
            name: name.into(),
            is_pending: false,
            pending_file: None,
        }
    }
}

/// Per-command-kind set of files awaiting upload. A closed struct rather
/// than a map so unknown entries are rejected at the serde boundary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CommandPendingFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<FileHandle>,
}

impl CommandPendingFiles {
    pub fn is_empty(&self) -> bool {
        self.source_image.is_none()
    }
}

/// Structured parameters of a command tag. Unknown fields are rejected at
/// the boundary rather than passed through.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    /// Human label printed next to `style_id` in the expanded sentence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    /// Resource id of the source image (image-to-image). Holds a temp id
    /// while the corresponding `pending_files.source_image` upload is in
    /// flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
}

/// A parameterized action embedded in the text, e.g. "generate an image
/// from this prompt".
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
pub struct CommandTag {
    pub command_kind: CommandKind,
    pub id: String,
    /// Short label shown for the atomic inline unit in the editor.
    pub display: String,
    pub config: CommandConfig,
    pub is_pending: bool,
    #[serde(default, skip_serializing_if = "CommandPendingFiles::is_empty")]
    pub pending_files: CommandPendingFiles,
}

impl CommandTag {
    pub fn new(command_kind: CommandKind, display: impl Into<String>, config: CommandConfig) -> Self {
        Self {
            command_kind,
            id: new_command_id(),
            display: display.into(),
            config,
            is_pending: false,
            pending_files: CommandPendingFiles::default(),
        }
    }

    /// Attach a not-yet-uploaded source image. Flips the tag pending.
    pub fn with_pending_source_image(mut self, file: FileHandle) -> Self {
        self.pending_files.source_image = Some(file);
        self.is_pending = true;
        debug_assert_eq!(self.is_pending, !self.pending_files.is_empty());
        self
    }
}

/// An atomic, identifiable reference embedded in text content.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tag {
    Resource(ResourceTag),
    Command(CommandTag),
}

impl Tag {
    pub fn id(&self) -> &str {
        match self {
            Tag::Resource(tag) => &tag.id,
            Tag::Command(tag) => &tag.id,
        }
    }

    pub fn is_pending(&self) -> bool {
        match self {
            Tag::Resource(tag) => tag.is_pending,
            Tag::Command(tag) => tag.is_pending,
        }
    }
}
