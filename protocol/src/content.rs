use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::tags::Tag;

/// One span of the authored text: either a free-text run or an atomic tag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Tag { tag: Tag },
}

/// Ordered segment list a document tree is built from and reduced back to.
/// Ordering corresponds to left-to-right position in the authored text.
///
/// Tags placed here are owned by the content model for the lifetime of the
/// editing session; the registry only keeps a lookup-side clone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, TS, JsonSchema)]
pub struct EditorContent {
    pub segments: Vec<Segment>,
}

impl EditorContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plain text, coalescing into a trailing text segment so two
    /// adjacent text runs never produce a spurious tag boundary on
    /// serialization. Empty pushes are dropped.
    pub fn push_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text { text: last }) = self.segments.last_mut() {
            last.push_str(text);
            return;
        }
        self.segments.push(Segment::Text {
            text: text.to_string(),
        });
    }

    pub fn push_tag(&mut self, tag: Tag) {
        self.segments.push(Segment::Tag { tag });
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Tag { tag } => Some(tag),
            Segment::Text { .. } => None,
        })
    }

    pub fn tags_mut(&mut self) -> impl Iterator<Item = &mut Tag> {
        self.segments.iter_mut().filter_map(|segment| match segment {
            Segment::Tag { tag } => Some(tag),
            Segment::Text { .. } => None,
        })
    }

    pub fn has_pending_tags(&self) -> bool {
        self.tags().any(Tag::is_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::FileHandle;
    use crate::tags::ResourceKind;
    use crate::tags::ResourceTag;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_text_coalesces_adjacent_runs() {
        let mut content = EditorContent::new();
        content.push_text("hello ");
        content.push_text("world");
        assert_eq!(
            content.segments,
            vec![Segment::Text {
                text: "hello world".to_string()
            }]
        );
    }

    #[test]
    fn push_text_drops_empty_runs() {
        let mut content = EditorContent::new();
        content.push_text("");
        assert!(content.is_empty());
    }

    #[test]
    fn tag_interrupts_coalescing() {
        let mut content = EditorContent::new();
        content.push_text("a");
        content.push_tag(Tag::Resource(ResourceTag::resolved(
            ResourceKind::Image,
            "res_1",
            "cat.png",
        )));
        content.push_text("b");
        assert_eq!(content.segments.len(), 3);
    }

    #[test]
    fn tags_mut_rewrites_in_place() {
        let mut content = EditorContent::new();
        content.push_text("see ");
        content.push_tag(Tag::Resource(ResourceTag::resolved(
            ResourceKind::Image,
            "tmp_old",
            "cat.png",
        )));
        for tag in content.tags_mut() {
            if let Tag::Resource(resource) = tag {
                resource.id = "srv_1".to_string();
            }
        }
        let ids: Vec<&str> = content.tags().map(Tag::id).collect();
        assert_eq!(ids, vec!["srv_1"]);
    }

    #[test]
    fn pending_detection_sees_into_tags() {
        let mut content = EditorContent::new();
        content.push_tag(Tag::Resource(ResourceTag::resolved(
            ResourceKind::Doc,
            "res_2",
            "a.pdf",
        )));
        assert!(!content.has_pending_tags());
        content.push_tag(Tag::Resource(ResourceTag::pending(
            ResourceKind::Image,
            FileHandle::new("/tmp/cat.png"),
        )));
        assert!(content.has_pending_tags());
    }
}
