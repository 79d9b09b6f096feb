//! Preprocessing of the native tree: whitespace trivia removal and position normalization.

use crate::config::NormalizerConfig;
use crate::ir::node::{KEY_TOKEN, KEY_TYPE};
use crate::ir::op::Mapping;
use crate::ir::ops::{
    any, boolean, cases_obj, check, contains, drop_nils, has, is_in, not, null, obj, part,
    string, var,
};
use crate::ir::pipeline::{Pipeline, Stage};
use crate::ir::transforms::Mappings;
use crate::ir::transforms::trivia::{LEADING_TRIVIA, TRAILING_TRIVIA};
use crate::normalizer::positions::{SPAN_END, SPAN_START, offsets_to_positions, text_span};

/// Whitespace, end-of-line and skipped-token trivia become `Null` tombstones.
fn erase_trivia(config: &NormalizerConfig) -> Mappings {
    let trivia = obj()
        .field(KEY_TYPE, check(is_in(config.erased_trivia.clone()), any()))
        .field("FullSpan", any())
        .field("Span", any())
        .field("SpanStart", any())
        .field("IsDirective", boolean(false));
    Mappings::new(
        "erase-trivia",
        vec![Mapping::new("erase-trivia", trivia.into_op(), null())],
    )
}

/// Removes tombstones from trivia arrays. Arrays without tombstones are left alone.
fn drop_nils_stage() -> Mappings {
    let dirty = |v: &str| check(contains(null()), drop_nils(var(v)));
    let src = cases_obj(
        "trivia",
        obj(),
        vec![
            obj()
                .field(LEADING_TRIVIA, dirty("leading"))
                .field(TRAILING_TRIVIA, dirty("trailing")),
            obj().field(LEADING_TRIVIA, dirty("leading")),
            obj().field(TRAILING_TRIVIA, dirty("trailing")),
        ],
    );
    let dst = cases_obj(
        "trivia",
        obj(),
        vec![
            obj()
                .field(LEADING_TRIVIA, var("leading"))
                .field(TRAILING_TRIVIA, var("trailing")),
            obj().field(LEADING_TRIVIA, var("leading")),
            obj().field(TRAILING_TRIVIA, var("trailing")),
        ],
    );
    Mappings::new(
        "drop-nils",
        vec![Mapping::new("drop-nils", part("_", src), part("_", dst))],
    )
}

/// Drops `TextSpan.IsEmpty` and the redundant `SpanStart` offsets.
fn position_cleanup() -> Mappings {
    let text_span_tag = || obj().field(KEY_TYPE, string("TextSpan"));
    Mappings::new(
        "position-cleanup",
        vec![
            Mapping::new(
                "text-span-is-empty",
                part("_", text_span_tag().field("IsEmpty", any())),
                part("_", text_span_tag()),
            ),
            Mapping::new(
                "span-start",
                part("_", obj().field("SpanStart", any())),
                part("_", obj()),
            ),
        ],
    )
}

/// Moves the offsets of the selected span (`FullSpan` for allow-listed types, `Span`
/// otherwise) to temporary `spanStart`/`spanEnd` fields.
fn span_select(config: &NormalizerConfig) -> Mappings {
    let full = || is_in(config.full_span_types.clone());
    let src = cases_obj(
        "span",
        obj(),
        vec![
            obj()
                .field(KEY_TYPE, check(full(), var("typ")))
                .field("FullSpan", text_span("start", "end"))
                .field("Span", any()),
            obj()
                .field(KEY_TYPE, check(not(full()), var("typ")))
                .field("Span", text_span("start", "end"))
                .field("FullSpan", any()),
        ],
    );
    let dst = cases_obj(
        "span",
        obj()
            .field(SPAN_START, var("start"))
            .field(SPAN_END, var("end")),
        vec![
            obj().field(KEY_TYPE, var("typ")),
            obj().field(KEY_TYPE, var("typ")),
        ],
    );
    Mappings::new(
        "span-select",
        vec![Mapping::new("span-select", part("_", src), part("_", dst))],
    )
}

/// Comment trivia get an empty `@token` for the comment parser to fill or read.
fn comment_tokens(config: &NormalizerConfig) -> Mappings {
    let src = check(
        not(has(obj().field(KEY_TOKEN, any()))),
        part(
            "_",
            obj().field(KEY_TYPE, check(is_in(config.comment_types.clone()), var("typ"))),
        ),
    );
    let dst = part(
        "_",
        obj()
            .field(KEY_TYPE, var("typ"))
            .field(KEY_TOKEN, string("")),
    );
    Mappings::new("comment-tokens", vec![Mapping::new("comment-tokens", src, dst)])
}

/// Builds the preprocessing pipeline.
pub fn pipeline(config: &NormalizerConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.add_stage(Stage::new("erase-trivia", &[], erase_trivia(config)));
    pipeline.add_stage(Stage::new("drop-nils", &["erase-trivia"], drop_nils_stage()));
    pipeline.add_stage(Stage::new("position-cleanup", &["drop-nils"], position_cleanup()));
    pipeline.add_stage(Stage::new("span-select", &["position-cleanup"], span_select(config)));
    pipeline.add_stage(Stage::new(
        "positions",
        &["span-select"],
        Mappings::new("positions", vec![offsets_to_positions()]),
    ));
    pipeline.add_stage(Stage::new("comment-tokens", &["positions"], comment_tokens(config)));
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Node;
    use crate::ir::transforms::Transformer;
    use serde_json::{Value, json};

    fn span(start: i64, end: i64) -> Value {
        json!({"@type": "TextSpan", "Start": start, "End": end, "Length": end - start, "IsEmpty": start == end})
    }

    fn whitespace(start: i64, end: i64) -> Value {
        json!({
            "@type": "WhitespaceTrivia",
            "FullSpan": span(start, end),
            "Span": span(start, end),
            "SpanStart": start,
            "IsDirective": false,
        })
    }

    fn pos(start: i64, end: i64) -> Value {
        json!({
            "@type": "uast:Positions",
            "start": {"@type": "uast:Position", "offset": start},
            "end": {"@type": "uast:Position", "offset": end},
        })
    }

    #[test]
    fn test_pipeline_order() {
        let p = pipeline(&NormalizerConfig::default());
        assert_eq!(
            p.order().unwrap(),
            vec![
                "erase-trivia",
                "drop-nils",
                "position-cleanup",
                "span-select",
                "positions",
                "comment-tokens",
            ]
        );
    }

    #[test]
    fn test_whitespace_trivia_is_removed() {
        let tree = Node::from(json!({
            "@type": "SemicolonToken",
            "LeadingTrivia": [whitespace(0, 1)],
            "TrailingTrivia": [whitespace(2, 3), {"@type": "SingleLineCommentTrivia", "Span": span(3, 9), "FullSpan": span(3, 9), "SpanStart": 3, "IsDirective": false}],
            "Span": span(1, 2),
            "FullSpan": span(0, 3),
            "SpanStart": 1,
        }));
        let out = pipeline(&NormalizerConfig::default()).apply(&tree).unwrap();
        assert_eq!(
            out.to_json(),
            json!({
                "@type": "SemicolonToken",
                "@pos": pos(1, 2),
                "LeadingTrivia": [],
                "TrailingTrivia": [{
                    "@type": "SingleLineCommentTrivia",
                    "@pos": pos(3, 9),
                    "@token": "",
                    "IsDirective": false,
                }],
            })
        );
    }

    #[test]
    fn test_documentation_comments_use_full_span() {
        let tree = Node::from(json!({
            "@type": "SingleLineDocumentationCommentTrivia",
            "Span": span(3, 10),
            "FullSpan": span(0, 12),
            "IsDirective": false,
        }));
        let out = pipeline(&NormalizerConfig::default()).apply(&tree).unwrap();
        assert_eq!(out.get("@pos").map(Node::to_json), Some(pos(0, 12)));
    }

    #[test]
    fn test_existing_token_is_kept() {
        let stage = comment_tokens(&NormalizerConfig::default());
        let tree = Node::from(json!({"@type": "MultiLineCommentTrivia", "@token": "/* a */"}));
        assert_eq!(stage.transform(&tree).unwrap(), tree);
    }

    #[test]
    fn test_clean_tree_is_a_fixpoint() {
        let tree = Node::from(json!({
            "@type": "IdentifierToken",
            "LeadingTrivia": [whitespace(0, 1)],
            "TrailingTrivia": [],
            "Span": span(1, 4),
            "FullSpan": span(0, 4),
            "SpanStart": 1,
        }));
        let p = pipeline(&NormalizerConfig::default());
        let once = p.apply(&tree).unwrap();
        assert_eq!(p.apply(&once).unwrap(), once);
    }

    #[test]
    fn test_malformed_span_aborts() {
        let tree = Node::from(json!({
            "@type": "IdentifierToken",
            "Span": {"@type": "TextSpan", "Start": 5, "End": 1, "Length": 0},
            "FullSpan": span(0, 5),
        }));
        let err = pipeline(&NormalizerConfig::default()).apply(&tree).unwrap_err();
        assert!(err.is_malformed_input());
    }
}
