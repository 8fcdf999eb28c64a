//! Forward serializer for the human-readable submission form, plus the
//! required-field validation that runs before the upload resolver.
//!
//! A command tag is expanded into a natural-language sentence with a fixed
//! field order: action phrase, prompt, then the optional clauses. The
//! sentence always ends in a terminator — that terminator is the boundary
//! signal [`crate::command_codec`] stops greedy prompt capture on, so the
//! two directions share their marker constants.

use composer_protocol::CommandKind;
use composer_protocol::CommandTag;
use composer_protocol::EditorContent;
use composer_protocol::Segment;
use composer_protocol::Tag;
use thiserror::Error;

use crate::command_codec::IMAGE_TO_IMAGE_ACTION;
use crate::command_codec::SENTENCE_TERMINATORS;
use crate::command_codec::SIZE_MARKER;
use crate::command_codec::SOURCE_IMAGE_MARKER;
use crate::command_codec::STRENGTH_MARKER;
use crate::command_codec::STYLE_ID_KEY;
use crate::command_codec::STYLE_MARKER;
use crate::command_codec::TEXT_TO_IMAGE_ACTION;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitValidationError {
    #[error("image-to-image command {tag_id} has no source image")]
    MissingSourceImage { tag_id: String },
}

/// Reject required-field violations before any upload runs, so a failed
/// check never leaves a half-resolved submission behind.
pub fn validate_for_submission(content: &EditorContent) -> Result<(), SubmitValidationError> {
    for tag in content.tags() {
        if let Tag::Command(command) = tag
            && command.command_kind == CommandKind::ImageToImage
            && command.config.source_image.is_none()
            && command.pending_files.source_image.is_none()
        {
            return Err(SubmitValidationError::MissingSourceImage {
                tag_id: command.id.clone(),
            });
        }
    }
    Ok(())
}

/// Expand content into the one-way submission text: plain text and resource
/// tags keep their machine form, command tags become sentences. Never
/// re-ingested except through the reverse codec at redisplay time.
pub fn serialize_for_submission(content: &EditorContent) -> String {
    let mut out = String::new();
    for segment in &content.segments {
        match segment {
            Segment::Text { text } => out.push_str(text),
            Segment::Tag {
                tag: Tag::Resource(tag),
            } => {
                out.push('@');
                out.push_str(tag.resource_kind.as_scheme());
                out.push_str("://");
                out.push_str(&tag.id);
            }
            Segment::Tag {
                tag: Tag::Command(tag),
            } => out.push_str(&expand_command(tag)),
        }
    }
    out
}

fn expand_command(tag: &CommandTag) -> String {
    let config = &tag.config;
    let mut sentence = String::new();
    match tag.command_kind {
        CommandKind::TextToImage => sentence.push_str(TEXT_TO_IMAGE_ACTION),
        CommandKind::ImageToImage => sentence.push_str(IMAGE_TO_IMAGE_ACTION),
    }
    sentence.push_str(&config.prompt);

    if tag.command_kind == CommandKind::ImageToImage {
        if let Some(source) = &config.source_image {
            sentence.push('，');
            sentence.push_str(SOURCE_IMAGE_MARKER);
            sentence.push_str(source);
        }
        if let Some(strength) = config.strength {
            sentence.push('，');
            sentence.push_str(STRENGTH_MARKER);
            sentence.push_str(&strength.to_string());
        }
    }

    if let (Some(width), Some(height)) = (config.width, config.height) {
        sentence.push('，');
        sentence.push_str(SIZE_MARKER);
        sentence.push_str(&format!("{width}×{height}"));
    }

    // The style clause carries both the human label and the raw identifier:
    // re-parsing needs the identifier, not the label.
    if let Some(style_id) = &config.style_id {
        let label = config.style_name.as_deref().unwrap_or(style_id);
        sentence.push('，');
        sentence.push_str(STYLE_MARKER);
        sentence.push_str(label);
        sentence.push('，');
        sentence.push_str(STYLE_ID_KEY);
        sentence.push_str(style_id);
    }

    if !sentence.ends_with(SENTENCE_TERMINATORS) {
        sentence.push('。');
    }
    sentence
}
