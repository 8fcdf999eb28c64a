use std::ops::Range;

use composer_protocol::ResourceKind;
use lazy_static::lazy_static;
use regex_lite::Regex;

lazy_static! {
    // The id run excludes whitespace and `@` so a resource tag stops at the
    // next tag instead of swallowing it.
    static ref RESOURCE_TAG_REGEX: Regex =
        Regex::new(r"@(image|text|doc)://([^\s@]+)").unwrap_or_else(|_| std::process::abort());
    static ref COMMAND_TAG_REGEX: Regex =
        Regex::new(r"\[cmd:([^\]]+)\]").unwrap_or_else(|_| std::process::abort());
}

/// Captures of one grammar hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatchKind {
    Resource { resource_kind: ResourceKind, id: String },
    Command { id: String },
}

/// One non-overlapping hit of either grammar, with byte offsets into the
/// scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub kind: TagMatchKind,
    pub range: Range<usize>,
}

impl TagMatch {
    pub fn raw<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range.clone()]
    }
}

/// Scan `text` with both grammars and merge the hits, ordered by start
/// offset. Hits never overlap: where a command placeholder would overlap a
/// resource tag, the narrower resource grammar wins. Malformed syntax is
/// simply not matched, never an error.
pub fn scan(text: &str) -> Vec<TagMatch> {
    let mut matches: Vec<TagMatch> = Vec::new();

    for captures in RESOURCE_TAG_REGEX.captures_iter(text) {
        let (Some(whole), Some(scheme), Some(id)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        let Some(resource_kind) = ResourceKind::from_scheme(scheme.as_str()) else {
            continue;
        };
        matches.push(TagMatch {
            kind: TagMatchKind::Resource {
                resource_kind,
                id: id.as_str().to_string(),
            },
            range: whole.range(),
        });
    }

    for captures in COMMAND_TAG_REGEX.captures_iter(text) {
        let (Some(whole), Some(id)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let range = whole.range();
        let overlaps_resource = matches
            .iter()
            .any(|m| m.range.start < range.end && range.start < m.range.end);
        if overlaps_resource {
            continue;
        }
        matches.push(TagMatch {
            kind: TagMatchKind::Command {
                id: id.as_str().to_string(),
            },
            range,
        });
    }

    matches.sort_by_key(|m| m.range.start);
    matches
}
