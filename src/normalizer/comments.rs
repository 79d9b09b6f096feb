//! Comment token parsing.
//!
//! A comment token such as `//  text ` is split into its markers, the whitespace around the
//! text and the text itself, so that the semantic comment node can be turned back into the
//! exact original token.

use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node};
use crate::ir::op::{Op, OpRef};
use crate::ir::ops::{Obj, boolean, obj, var};
use crate::ir::state::State;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentParts {
    pub text: String,
    pub prefix: String,
    pub suffix: String,
    pub tab: String,
}

fn is_space(c: char) -> bool {
    c.is_whitespace()
}

/// Longest whitespace prefix shared by every non-blank line after the first.
fn common_tab(lines: &[&str]) -> String {
    let mut tab: Option<&str> = None;
    for line in lines.iter().skip(1).filter(|l| !l.trim().is_empty()) {
        let indent_len = line.len() - line.trim_start_matches(is_space).len();
        let indent = &line[..indent_len];
        tab = Some(match tab {
            None => indent,
            Some(current) => {
                let shared = current
                    .char_indices()
                    .zip(indent.chars())
                    .take_while(|((_, a), b)| a == b)
                    .last()
                    .map(|((i, c), _)| i + c.len_utf8())
                    .unwrap_or(0);
                &current[..shared]
            }
        });
    }
    tab.unwrap_or("").to_string()
}

impl CommentParts {
    /// Splits `token` delimited by `start`/`end`. Returns `None` if the markers do not match.
    pub fn split(token: &str, start: &str, end: &str) -> Option<Self> {
        let inner = token.strip_prefix(start)?.strip_suffix(end)?;
        let Some(first) = inner.find(|c: char| !is_space(c)) else {
            return Some(CommentParts {
                prefix: inner.to_string(),
                ..Default::default()
            });
        };
        let prefix = &inner[..first];
        let body = &inner[first..];
        let trimmed = body.trim_end_matches(is_space);
        let suffix = &body[trimmed.len()..];

        let lines: Vec<&str> = trimmed.split('\n').collect();
        let tab = common_tab(&lines);
        let text = if tab.is_empty() {
            trimmed.to_string()
        } else {
            let mut out = Vec::with_capacity(lines.len());
            out.push(lines[0]);
            for &line in &lines[1..] {
                out.push(line.strip_prefix(tab.as_str()).unwrap_or(line));
            }
            out.join("\n")
        };
        Some(CommentParts {
            text,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            tab,
        })
    }

    /// Rebuilds the original token.
    pub fn join(&self, start: &str, end: &str) -> String {
        let text = if self.tab.is_empty() {
            self.text.clone()
        } else {
            self.text.replace('\n', &format!("\n{}", self.tab))
        };
        format!("{start}{}{text}{}{end}", self.prefix, self.suffix)
    }
}

/// Matches a comment token string and binds its parts to `var`, `var_pref`, `var_suf` and
/// `var_tab`.
pub struct CommentText {
    start: &'static str,
    end: &'static str,
    var: String,
}

pub fn comment_text(start: &'static str, end: &'static str, var: &str) -> OpRef {
    Arc::new(CommentText {
        start,
        end,
        var: var.to_string(),
    })
}

fn part_var(var: &str, part: &str) -> String {
    format!("{var}_{part}")
}

impl Op for CommentText {
    fn kinds(&self) -> Kinds {
        Kinds::STRING
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Some(token) = node.as_str() else {
            return Ok(false);
        };
        let Some(parts) = CommentParts::split(token, self.start, self.end) else {
            return Ok(false);
        };
        Ok(st.bind(&self.var, Node::from(parts.text))
            && st.bind(&part_var(&self.var, "pref"), Node::from(parts.prefix))
            && st.bind(&part_var(&self.var, "suf"), Node::from(parts.suffix))
            && st.bind(&part_var(&self.var, "tab"), Node::from(parts.tab)))
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        let read = |name: &str| -> Result<String> {
            let node = st.must_get(name)?;
            node.as_str()
                .map(str::to_string)
                .ok_or_else(|| TransformError::unexpected("string", node))
        };
        let parts = CommentParts {
            text: read(&self.var)?,
            prefix: read(&part_var(&self.var, "pref"))?,
            suffix: read(&part_var(&self.var, "suf"))?,
            tab: read(&part_var(&self.var, "tab"))?,
        };
        Ok(Node::from(parts.join(self.start, self.end)))
    }
}

/// Body of a `uast:Comment` built from the variables bound by [`CommentText`].
pub fn comment_node(block: bool, var_name: &str) -> Obj {
    obj()
        .field("Block", boolean(block))
        .field("Text", var(var_name))
        .field("Prefix", var(&part_var(var_name, "pref")))
        .field("Suffix", var(&part_var(var_name, "suf")))
        .field("Tab", var(&part_var(var_name, "tab")))
}
