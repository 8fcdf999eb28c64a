//! Contract the editable document tree has to satisfy to stay in sync with
//! the content model. The tree itself (and its reconciliation algorithm) is
//! an external collaborator; this module only fixes the narrow interface
//! plus the conversions between segments and inline units.

use composer_protocol::EditorContent;
use composer_protocol::Segment;
use composer_protocol::Tag;

use crate::content_model;
use crate::registry::TagLookup;

/// One atomic inline unit of the document tree, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineUnit {
    /// A plain-text run the user can freely retype into.
    Text(String),
    /// An indivisible tag unit. `machine` is the tag's compact text form
    /// (`@kind://id` / `[cmd:id]`); `placeholder` is the label the tree
    /// renders for it. The tree must never merge this into adjoining text.
    TagRef { machine: String, placeholder: String },
}

/// What the editable tree must expose. `splice_units` replaces `remove`
/// units starting at unit index `at` — insertion at a cursor is a splice
/// with `remove == 0` — and must preserve the text/tag classification of
/// every unit it is handed.
pub trait DocumentTreeAdapter {
    fn inline_units(&self) -> Vec<InlineUnit>;
    fn splice_units(&mut self, at: usize, remove: usize, units: Vec<InlineUnit>);
}

pub fn content_to_units(content: &EditorContent) -> Vec<InlineUnit> {
    content
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => InlineUnit::Text(text.clone()),
            Segment::Tag { tag } => {
                let placeholder = match tag {
                    Tag::Resource(tag) => tag.name.clone(),
                    Tag::Command(tag) => tag.display.clone(),
                };
                let mut single = EditorContent::new();
                single.push_tag(tag.clone());
                InlineUnit::TagRef {
                    machine: content_model::serialize_machine(&single),
                    placeholder,
                }
            }
        })
        .collect()
}

/// Rebuild content from the tree's units. Tag units rehydrate through the
/// registry exactly like machine text does (including the fallback path),
/// so a stale tree survives a registry reload.
pub fn content_from_units(units: &[InlineUnit], registry: &dyn TagLookup) -> EditorContent {
    let mut content = EditorContent::new();
    for unit in units {
        match unit {
            InlineUnit::Text(text) => content.push_text(text),
            InlineUnit::TagRef { machine, .. } => {
                for segment in content_model::parse(machine, registry).segments {
                    match segment {
                        Segment::Text { text } => content.push_text(text),
                        Segment::Tag { tag } => content.push_tag(tag),
                    }
                }
            }
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagRegistry;
    use composer_protocol::ResourceKind;
    use composer_protocol::ResourceTag;
    use pretty_assertions::assert_eq;

    /// Minimal vec-backed stand-in for the real editable tree.
    struct FakeTree {
        units: Vec<InlineUnit>,
    }

    impl DocumentTreeAdapter for FakeTree {
        fn inline_units(&self) -> Vec<InlineUnit> {
            self.units.clone()
        }

        fn splice_units(&mut self, at: usize, remove: usize, units: Vec<InlineUnit>) {
            self.units.splice(at..at + remove, units);
        }
    }

    fn image_tag(id: &str) -> Tag {
        Tag::Resource(ResourceTag::resolved(ResourceKind::Image, id, "cat.png"))
    }

    #[test]
    fn units_round_trip_through_the_tree() {
        let registry = TagRegistry::new();
        registry.put(image_tag("res_1"));

        let mut content = EditorContent::new();
        content.push_text("before ");
        content.push_tag(image_tag("res_1"));
        content.push_text(" after");

        let tree = FakeTree {
            units: content_to_units(&content),
        };
        assert_eq!(content_from_units(&tree.inline_units(), &registry), content);
    }

    #[test]
    fn tag_units_carry_a_placeholder_label() {
        let mut content = EditorContent::new();
        content.push_tag(image_tag("res_1"));
        let units = content_to_units(&content);
        assert_eq!(
            units,
            vec![InlineUnit::TagRef {
                machine: "@image://res_1".to_string(),
                placeholder: "cat.png".to_string(),
            }]
        );
    }

    #[test]
    fn splicing_a_tag_between_text_runs_keeps_it_atomic() {
        let registry = TagRegistry::new();
        registry.put(image_tag("res_1"));

        let mut tree = FakeTree {
            units: vec![
                InlineUnit::Text("left ".to_string()),
                InlineUnit::Text("right".to_string()),
            ],
        };
        tree.splice_units(
            1,
            0,
            vec![InlineUnit::TagRef {
                machine: "@image://res_1".to_string(),
                placeholder: "cat.png".to_string(),
            }],
        );

        let content = content_from_units(&tree.inline_units(), &registry);
        // The tag stays its own segment; the text runs around it are not
        // merged across it.
        assert_eq!(content.segments.len(), 3);
        assert_eq!(
            content.segments[1],
            Segment::Tag {
                tag: image_tag("res_1")
            }
        );
    }
}
