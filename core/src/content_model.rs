use composer_protocol::CommandConfig;
use composer_protocol::CommandKind;
use composer_protocol::CommandPendingFiles;
use composer_protocol::CommandTag;
use composer_protocol::EditorContent;
use composer_protocol::ResourceTag;
use composer_protocol::Segment;
use composer_protocol::Tag;

use crate::registry::TagLookup;
use crate::tag_matcher;
use crate::tag_matcher::TagMatch;
use crate::tag_matcher::TagMatchKind;

/// Build an [`EditorContent`] from machine-form text: scan both grammars,
/// rehydrate each match through the registry and interleave the gaps as
/// plain-text segments. Concatenating every segment's span reproduces the
/// input exactly. Never fails; unresolvable ids fall back to a minimal tag
/// synthesized from the match captures alone.
pub fn parse(text: &str, registry: &dyn TagLookup) -> EditorContent {
    let mut content = EditorContent::new();
    let mut cursor = 0usize;
    for tag_match in tag_matcher::scan(text) {
        content.push_text(&text[cursor..tag_match.range.start]);
        let tag = registry
            .get(match_id(&tag_match))
            .unwrap_or_else(|| fallback_tag(&tag_match, text));
        content.push_tag(tag);
        cursor = tag_match.range.end;
    }
    content.push_text(&text[cursor..]);
    content
}

/// Reduce an [`EditorContent`] to its compact machine text form. Only valid
/// where the registry stays reachable: the text keeps tag ids, not payloads.
pub fn serialize_machine(content: &EditorContent) -> String {
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
            } => {
                out.push_str("[cmd:");
                out.push_str(&tag.id);
                out.push(']');
            }
        }
    }
    out
}

fn match_id(tag_match: &TagMatch) -> &str {
    match &tag_match.kind {
        TagMatchKind::Resource { id, .. } => id,
        TagMatchKind::Command { id } => id,
    }
}

/// Minimal tag for a registry miss, built from the captures alone so the
/// parse never fails. A later registry hit for the same id re-renders the
/// full payload.
fn fallback_tag(tag_match: &TagMatch, text: &str) -> Tag {
    match &tag_match.kind {
        TagMatchKind::Resource { resource_kind, id } => {
            let name = id.rsplit('/').next().unwrap_or(id);
            Tag::Resource(ResourceTag::resolved(*resource_kind, id.clone(), name))
        }
        TagMatchKind::Command { id } => Tag::Command(CommandTag {
            command_kind: CommandKind::TextToImage,
            id: id.clone(),
            display: tag_match.raw(text).to_string(),
            config: CommandConfig::default(),
            is_pending: false,
            pending_files: CommandPendingFiles::default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagRegistry;
    use composer_protocol::ResourceKind;
    use pretty_assertions::assert_eq;

    fn command_tag(id: &str, prompt: &str) -> CommandTag {
        CommandTag {
            command_kind: CommandKind::TextToImage,
            id: id.to_string(),
            display: format!("文生图：{prompt}"),
            config: CommandConfig {
                prompt: prompt.to_string(),
                ..Default::default()
            },
            is_pending: false,
            pending_files: CommandPendingFiles::default(),
        }
    }

    #[test]
    fn round_trip_with_populated_registry() {
        let registry = TagRegistry::new();
        registry.put(Tag::Resource(ResourceTag::resolved(
            ResourceKind::Image,
            "res_1",
            "cat.png",
        )));
        registry.put(Tag::Command(command_tag("cmd_1", "一只小猫")));

        let mut content = EditorContent::new();
        content.push_text("see ");
        content.push_tag(Tag::Resource(ResourceTag::resolved(
            ResourceKind::Image,
            "res_1",
            "cat.png",
        )));
        content.push_text(" then ");
        content.push_tag(Tag::Command(command_tag("cmd_1", "一只小猫")));

        let wire = serialize_machine(&content);
        assert_eq!(wire, "see @image://res_1 then [cmd:cmd_1]");
        assert_eq!(parse(&wire, &registry), content);
    }

    #[test]
    fn span_coverage_over_arbitrary_text() {
        let registry = TagRegistry::new();
        for text in [
            "no tags at all",
            "@image://a mid @doc://b end",
            "[cmd:one]tail",
            "汉字 @text://路径/文件.txt 混合 [cmd:x]。",
            "@video://not-a-tag [cmd:unterminated",
            "",
        ] {
            assert_eq!(serialize_machine(&parse(text, &registry)), text);
        }
    }

    #[test]
    fn adjacent_tags_produce_no_empty_text_segment() {
        let registry = TagRegistry::new();
        let content = parse("@image://tmp_abc@text://tmp_def", &registry);
        assert_eq!(content.segments.len(), 2);
        assert!(
            content
                .segments
                .iter()
                .all(|segment| matches!(segment, Segment::Tag { .. }))
        );
    }

    #[test]
    fn registry_miss_synthesizes_resource_fallback() {
        let registry = TagRegistry::new();
        let content = parse("@doc://uploads/2024/report.pdf", &registry);
        let [
            Segment::Tag {
                tag: Tag::Resource(tag),
            },
        ] = content.segments.as_slice()
        else {
            panic!("expected a single resource segment");
        };
        assert_eq!(tag.resource_kind, ResourceKind::Doc);
        assert_eq!(tag.id, "uploads/2024/report.pdf");
        assert_eq!(tag.name, "report.pdf");
        assert!(!tag.is_pending);
    }

    #[test]
    fn registry_miss_synthesizes_command_fallback() {
        let registry = TagRegistry::new();
        let content = parse("[cmd:cmd_lost]", &registry);
        let [
            Segment::Tag {
                tag: Tag::Command(tag),
            },
        ] = content.segments.as_slice()
        else {
            panic!("expected a single command segment");
        };
        assert_eq!(tag.id, "cmd_lost");
        assert_eq!(tag.display, "[cmd:cmd_lost]");
        assert_eq!(tag.config, CommandConfig::default());
    }

    #[test]
    fn rehydration_prefers_registry_payload() {
        let registry = TagRegistry::new();
        registry.put(Tag::Command(command_tag("cmd_1", "海边日落")));
        let content = parse("[cmd:cmd_1]", &registry);
        let [
            Segment::Tag {
                tag: Tag::Command(tag),
            },
        ] = content.segments.as_slice()
        else {
            panic!("expected a single command segment");
        };
        assert_eq!(tag.config.prompt, "海边日落");
    }
}
