//! Reverse codec: re-derives a structured [`CommandTag`] from the expanded
//! human-readable sentence a command was serialized to. Historical messages
//! only keep that expanded text, so redisplay has nothing else to go on.
//!
//! The sentence grammar here and the forward expansion in
//! [`crate::submission`] are a coupled contract; the marker strings below
//! are the single source of truth for both directions.

use composer_protocol::CommandConfig;
use composer_protocol::CommandKind;
use composer_protocol::CommandPendingFiles;
use composer_protocol::CommandTag;
use composer_protocol::tags::new_command_id;
use lazy_static::lazy_static;
use regex_lite::Regex;

pub(crate) const TEXT_TO_IMAGE_ACTION: &str = "请使用文生图功能生成图片：";
pub(crate) const IMAGE_TO_IMAGE_ACTION: &str = "请使用图生图功能生成图片：";
pub(crate) const SOURCE_IMAGE_MARKER: &str = "参考图：";
pub(crate) const STRENGTH_MARKER: &str = "相似度：";
pub(crate) const SIZE_MARKER: &str = "尺寸：";
pub(crate) const STYLE_MARKER: &str = "使用风格：";
pub(crate) const STYLE_ID_KEY: &str = "finetune_id：";

/// Sentence terminators. The forward serializer guarantees one; the prompt
/// capture below leans on it as its final boundary signal.
pub(crate) const SENTENCE_TERMINATORS: &[char] = &['。', '．', '.', '！', '!', '？', '?'];

// Character class of the terminator set, reused inside field captures so a
// field never swallows the sentence end.
const TERM_CLASS: &str = "。．.!！?？";

lazy_static! {
    // The prompt capture is `.+?`: lazy, but anchored to consume at least
    // one character before any trailing clause may match. With every clause
    // optional AND a zero-length prompt allowed, a short multi-byte word
    // would be split in half by an alternative matching too early.
    static ref TEXT_TO_IMAGE_REGEX: Regex = Regex::new(&format!(
        "^{TEXT_TO_IMAGE_ACTION}(?P<prompt>.+?)\
         (?:[，,]\\s*{SIZE_MARKER}(?P<w>[0-9]+)\\s*[×xX*]\\s*(?P<h>[0-9]+))?\
         (?:[，,]\\s*{STYLE_MARKER}(?P<style>[^，{TERM_CLASS}]+?))?\
         (?:[，,]\\s*{STYLE_ID_KEY}(?P<fid>[^，{TERM_CLASS}]+?))*\
         \\s*(?P<term>[{TERM_CLASS}])"
    ))
    .unwrap_or_else(|_| std::process::abort());

    static ref IMAGE_TO_IMAGE_REGEX: Regex = Regex::new(&format!(
        "^{IMAGE_TO_IMAGE_ACTION}(?P<prompt>.+?)\
         (?:[，,]\\s*{SOURCE_IMAGE_MARKER}(?P<src>[^\\s，{TERM_CLASS}]+))?\
         (?:[，,]\\s*{STRENGTH_MARKER}(?P<strength>[0-9]+(?:\\.[0-9]+)?))?\
         (?:[，,]\\s*{SIZE_MARKER}(?P<w>[0-9]+)\\s*[×xX*]\\s*(?P<h>[0-9]+))?\
         (?:[，,]\\s*{STYLE_MARKER}(?P<style>[^，{TERM_CLASS}]+?))?\
         (?:[，,]\\s*{STYLE_ID_KEY}(?P<fid>[^，{TERM_CLASS}]+?))*\
         \\s*(?P<term>[{TERM_CLASS}])"
    ))
    .unwrap_or_else(|_| std::process::abort());
}

/// Result of decoding one command sentence at the head of `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCommand {
    pub tag: CommandTag,
    /// Bytes consumed, including the terminator, so the caller can keep
    /// scanning the remainder of the message.
    pub consumed: usize,
}

/// Decode the command sentence `text` begins with, if any. The original tag
/// id was never serialized into the human-readable form, so the synthesized
/// tag carries a fresh id. Malformed or truncated sentences yield `None`;
/// the caller then treats the span as plain text.
pub fn decode_command_sentence(text: &str) -> Option<DecodedCommand> {
    if text.starts_with(TEXT_TO_IMAGE_ACTION) {
        decode_with(&TEXT_TO_IMAGE_REGEX, CommandKind::TextToImage, text)
    } else if text.starts_with(IMAGE_TO_IMAGE_ACTION) {
        decode_with(&IMAGE_TO_IMAGE_REGEX, CommandKind::ImageToImage, text)
    } else {
        None
    }
}

fn decode_with(regex: &Regex, command_kind: CommandKind, text: &str) -> Option<DecodedCommand> {
    let captures = regex.captures(text).or_else(|| {
        tracing::debug!("command sentence did not match its grammar variant");
        None
    })?;
    let whole = captures.get(0)?;

    let prompt = captures.name("prompt")?.as_str().trim().to_string();
    let mut config = CommandConfig {
        prompt: prompt.clone(),
        ..Default::default()
    };

    if let (Some(w), Some(h)) = (captures.name("w"), captures.name("h"))
        && let (Ok(width), Ok(height)) = (w.as_str().parse::<u32>(), h.as_str().parse::<u32>())
    {
        config.aspect_ratio = Some(aspect_ratio_label(width, height));
        config.width = Some(width);
        config.height = Some(height);
    }

    let style_label = captures.name("style").map(|m| m.as_str().trim().to_string());
    let style_raw_id = captures.name("fid").map(|m| m.as_str().trim().to_string());
    // Prefer the raw identifier field; the label is only a display fallback.
    config.style_id = style_raw_id.or_else(|| style_label.clone());
    config.style_name = style_label;

    if command_kind == CommandKind::ImageToImage {
        config.source_image = captures.name("src").map(|m| m.as_str().to_string());
        config.strength = captures
            .name("strength")
            .and_then(|m| m.as_str().parse::<f32>().ok());
    }

    let display = match command_kind {
        CommandKind::TextToImage => format!("文生图：{prompt}"),
        CommandKind::ImageToImage => format!("图生图：{prompt}"),
    };

    Some(DecodedCommand {
        tag: CommandTag {
            command_kind,
            id: new_command_id(),
            display,
            config,
            is_pending: false,
            pending_files: CommandPendingFiles::default(),
        },
        consumed: whole.end(),
    })
}

/// Canonical label for a width×height pair: reduce, look up the known
/// ratios, otherwise fall back to the raw `<w>:<h>`.
pub fn aspect_ratio_label(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return format!("{width}:{height}");
    }
    let divisor = gcd(width, height);
    let reduced = (width / divisor, height / divisor);
    match reduced {
        (1, 1) | (4, 3) | (3, 4) | (16, 9) | (9, 16) | (3, 2) | (2, 3) => {
            format!("{}:{}", reduced.0, reduced.1)
        }
        _ => format!("{width}:{height}"),
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
