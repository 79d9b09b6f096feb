//! Position normalization.
//!
//! The native parser describes locations with `TextSpan` objects (`Span`, `FullSpan`). They are
//! reduced to one canonical `@pos` per node, a `uast:Positions` object holding the half-open
//! byte range `[start, end)`. When the source text is available, line and column numbers are
//! filled in as well.

use std::sync::Arc;

use ropey::Rope;
use tracing::debug;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{KEY_POS, KEY_TOKEN, KEY_TYPE, Kinds, Node, NodeMap};
use crate::ir::op::{Mapping, Op, OpRef};
use crate::ir::ops::{ObjectOp, obj, part};
use crate::ir::state::State;
use crate::ir::transforms::Transformer;
use crate::ir::visitor::{Visitor, walk_object};
use crate::uast::{TYPE_POSITION, TYPE_POSITIONS};

pub const SPAN_START: &str = "spanStart";
pub const SPAN_END: &str = "spanEnd";
const TEXT_SPAN: &str = "TextSpan";

fn offset_of(node: Option<&Node>) -> Option<i64> {
    node.and_then(Node::as_int).filter(|v| *v >= 0)
}

/// Matches a `TextSpan{Start, End, Length}` and binds its offsets.
///
/// A `TextSpan` without usable `Start`/`End`, or with `Start > End`, is malformed input.
pub struct TextSpanOp {
    start: String,
    end: String,
}

pub fn text_span(start: &str, end: &str) -> OpRef {
    Arc::new(TextSpanOp {
        start: start.to_string(),
        end: end.to_string(),
    })
}

impl Op for TextSpanOp {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        if node.type_of() != Some(TEXT_SPAN) {
            return Ok(false);
        }
        let (Some(start), Some(end)) = (offset_of(node.get("Start")), offset_of(node.get("End")))
        else {
            return Err(TransformError::MalformedInput(format!(
                "TextSpan without valid Start/End: {node}"
            )));
        };
        if start > end {
            return Err(TransformError::MalformedInput(format!(
                "TextSpan starts after it ends: {start} > {end}"
            )));
        }
        Ok(st.bind(&self.start, Node::Int(start)) && st.bind(&self.end, Node::Int(end)))
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        let start = read_offset(st, &self.start)?;
        let end = read_offset(st, &self.end)?;
        Ok(Node::typed(
            TEXT_SPAN,
            [
                ("Start", Node::Int(start)),
                ("End", Node::Int(end)),
                ("Length", Node::Int(end - start)),
            ],
        ))
    }
}

fn read_offset(st: &State, name: &str) -> Result<i64> {
    let node = st.must_get(name)?;
    node.as_int()
        .ok_or_else(|| TransformError::unexpected("int", node))
}

/// Builds a `uast:Positions` node for the range `[start, end)`.
pub fn positions(start: i64, end: i64) -> Node {
    let point = |offset: i64| Node::typed(TYPE_POSITION, [("offset", Node::Int(offset))]);
    Node::typed(TYPE_POSITIONS, [("start", point(start)), ("end", point(end))])
}

/// The temporary `spanStart`/`spanEnd` offset pair left by span selection.
///
/// Exactly one of the two fields present is malformed input.
struct SpanOffsets;

impl ObjectOp for SpanOffsets {
    fn match_fields(&self, st: &mut State, fields: &NodeMap) -> Result<Option<NodeMap>> {
        let (start, end) = match (fields.get(SPAN_START), fields.get(SPAN_END)) {
            (None, None) => return Ok(None),
            (Some(s), Some(e)) => (s, e),
            _ => {
                return Err(TransformError::MalformedInput(format!(
                    "only one of {SPAN_START}/{SPAN_END} is set"
                )));
            }
        };
        let (Some(start), Some(end)) = (offset_of(Some(start)), offset_of(Some(end))) else {
            return Err(TransformError::MalformedInput(format!(
                "{SPAN_START}/{SPAN_END} must be non-negative integers"
            )));
        };
        if !(st.bind("start", Node::Int(start)) && st.bind("end", Node::Int(end))) {
            return Ok(None);
        }
        Ok(Some(fields.remove(SPAN_START).remove(SPAN_END)))
    }

    fn construct_fields(&self, st: &State, mut base: NodeMap) -> Result<NodeMap> {
        base.insert_mut(SPAN_START.to_string(), Node::Int(read_offset(st, "start")?));
        base.insert_mut(SPAN_END.to_string(), Node::Int(read_offset(st, "end")?));
        Ok(base)
    }
}

/// `@pos` built from the `start`/`end` bindings.
struct PositionsOp;

impl Op for PositionsOp {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        if node.type_of() != Some(TYPE_POSITIONS) {
            return Ok(false);
        }
        let offset = |key: &str| node.get(key).and_then(|p| offset_of(p.get("offset")));
        match (offset("start"), offset("end")) {
            (Some(start), Some(end)) => {
                Ok(st.bind("start", Node::Int(start)) && st.bind("end", Node::Int(end)))
            }
            _ => Ok(false),
        }
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        Ok(positions(read_offset(st, "start")?, read_offset(st, "end")?))
    }
}

/// Turns `spanStart`/`spanEnd` into a canonical `@pos`.
pub fn offsets_to_positions() -> Mapping {
    Mapping::new(
        "offsets-to-positions",
        part("_", SpanOffsets),
        part("_", obj().field(KEY_POS, Arc::new(PositionsOp))),
    )
}

/// Byte offset → 1-based line and column lookup over a source text.
pub struct LineIndex {
    text: Rope,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        Self {
            text: Rope::from_str(source),
        }
    }

    pub fn len_lines(&self) -> usize {
        self.text.len_lines()
    }

    fn byte_index(&self, offset: i64) -> Result<usize> {
        usize::try_from(offset)
            .ok()
            .filter(|o| *o <= self.text.len_bytes())
            .ok_or_else(|| {
                TransformError::MalformedInput(format!(
                    "offset {offset} is outside of the source ({} bytes)",
                    self.text.len_bytes()
                ))
            })
    }

    /// Line and column of `offset`. The end-of-text offset is valid.
    pub fn line_col(&self, offset: i64) -> Result<(i64, i64)> {
        let byte = self.byte_index(offset)?;
        let line = self.text.try_byte_to_line(byte).map_err(|e| {
            TransformError::MalformedInput(format!("offset {offset}: {e}"))
        })?;
        let line_start = self.text.line_to_byte(line);
        Ok((line as i64 + 1, (byte - line_start) as i64 + 1))
    }

    /// The source text of `[start, end)`.
    pub fn slice(&self, start: i64, end: i64) -> Result<String> {
        let invalid = || {
            TransformError::MalformedInput(format!(
                "range [{start}, {end}) is not a valid slice of the source"
            ))
        };
        let start = self.byte_index(start).map_err(|_| invalid())?;
        let end = self.byte_index(end).map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }
        self.text
            .get_byte_slice(start..end)
            .map(|s| s.to_string())
            .ok_or_else(invalid)
    }
}

/// Fills `line`/`col` on every `uast:Position` from its `offset`.
pub struct FromOffset<'a> {
    index: &'a LineIndex,
}

impl<'a> FromOffset<'a> {
    pub fn new(index: &'a LineIndex) -> Self {
        Self { index }
    }
}

impl Visitor for FromOffset<'_> {
    fn visit_object(&self, fields: &NodeMap) -> Result<Node> {
        let walked = walk_object(self, fields)?;
        if walked.type_of() != Some(TYPE_POSITION) {
            return Ok(walked);
        }
        let Some(offset) = walked.get("offset").and_then(Node::as_int) else {
            return Ok(walked);
        };
        let (line, col) = self.index.line_col(offset)?;
        Ok(walked
            .with_field("line", Node::Int(line))
            .with_field("col", Node::Int(col)))
    }
}

impl Transformer for FromOffset<'_> {
    fn name(&self) -> &str {
        "from-offset"
    }

    fn transform(&self, tree: &Node) -> Result<Node> {
        self.visit_node(tree)
    }
}

/// Sets `@token` from the source text for nodes of the given types.
pub struct TokenFromSource<'a> {
    index: &'a LineIndex,
    types: &'a [String],
}

impl<'a> TokenFromSource<'a> {
    pub fn new(index: &'a LineIndex, types: &'a [String]) -> Self {
        Self { index, types }
    }
}

impl Visitor for TokenFromSource<'_> {
    fn visit_object(&self, fields: &NodeMap) -> Result<Node> {
        let walked = walk_object(self, fields)?;
        let Some(typ) = walked.get(KEY_TYPE).and_then(Node::as_str) else {
            return Ok(walked);
        };
        if !self.types.iter().any(|t| t == typ) {
            return Ok(walked);
        }
        let Some(pos) = walked.get(KEY_POS) else {
            return Ok(walked);
        };
        let offset = |key: &str| pos.get(key).and_then(|p| p.get("offset")).and_then(Node::as_int);
        let (Some(start), Some(end)) = (offset("start"), offset("end")) else {
            return Ok(walked);
        };
        let token = self.index.slice(start, end)?;
        Ok(walked.with_field(KEY_TOKEN, Node::from(token)))
    }
}

impl Transformer for TokenFromSource<'_> {
    fn name(&self) -> &str {
        "token-from-source"
    }

    fn transform(&self, tree: &Node) -> Result<Node> {
        self.visit_node(tree)
    }
}

/// Runs the source-aware passes: comment tokens first, then line/column numbers.
pub fn apply_source(tree: &Node, source: &str, token_types: &[String]) -> Result<Node> {
    let index = LineIndex::new(source);
    let tree = TokenFromSource::new(&index, token_types).transform(tree)?;
    let tree = FromOffset::new(&index).transform(&tree)?;
    debug!(bytes = source.len(), lines = index.len_lines(), "source positions applied");
    Ok(tree)
}
