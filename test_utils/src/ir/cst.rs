//! Builds native C# syntax trees in the JSON shape produced by the Roslyn-based parser,
//! together with the source text they describe.
//!
//! Text is written left to right; every token and trivia records the span of what was just
//! written, and nodes take their spans from their children.

use serde_json::{Map, Value, json};

/// Trivia attached to a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trivia {
    Space,
    Newline,
    /// `// text`
    Line(String),
    /// `/// text`
    Doc(String),
}

pub fn text_span(start: usize, end: usize) -> Value {
    json!({
        "@type": "TextSpan",
        "Start": start,
        "End": end,
        "Length": end - start,
        "IsEmpty": start == end,
    })
}

fn span_bounds(node: &Value, key: &str) -> Option<(usize, usize)> {
    let span = node.get(key)?;
    let start = span.get("Start")?.as_u64()? as usize;
    let end = span.get("End")?.as_u64()? as usize;
    Some((start, end))
}

fn merge(acc: Option<(usize, usize)>, next: Option<(usize, usize)>) -> Option<(usize, usize)> {
    match (acc, next) {
        (Some((s1, e1)), Some((s2, e2))) => Some((s1.min(s2), e1.max(e2))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Writes source text and returns the matching tree pieces.
#[derive(Default)]
pub struct CstWriter {
    source: String,
}

impl CstWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Writes text that no tree node covers, such as list separators.
    pub fn raw(&mut self, text: &str) {
        self.source.push_str(text);
    }

    fn trivia(&mut self, trivia: &Trivia) -> Value {
        let start = self.source.len();
        let (kind, text, marker) = match trivia {
            Trivia::Space => ("WhitespaceTrivia", " ".to_string(), 0),
            Trivia::Newline => ("EndOfLineTrivia", "\n".to_string(), 0),
            Trivia::Line(t) => ("SingleLineCommentTrivia", format!("// {t}"), 0),
            Trivia::Doc(t) => ("SingleLineDocumentationCommentTrivia", format!("/// {t}"), 3),
        };
        self.source.push_str(&text);
        let end = self.source.len();
        json!({
            "@type": kind,
            "Span": text_span(start + marker, end),
            "FullSpan": text_span(start, end),
            "SpanStart": start + marker,
            "IsDirective": false,
        })
    }

    /// Writes a token surrounded by its trivia.
    pub fn token(&mut self, kind: &str, text: &str, leading: &[Trivia], trailing: &[Trivia]) -> Value {
        let full_start = self.source.len();
        let leading: Vec<Value> = leading.iter().map(|t| self.trivia(t)).collect();
        let start = self.source.len();
        self.source.push_str(text);
        let end = self.source.len();
        let trailing: Vec<Value> = trailing.iter().map(|t| self.trivia(t)).collect();
        let full_end = self.source.len();
        json!({
            "@type": kind,
            "Text": text,
            "Value": text,
            "ValueText": text,
            "IsMissing": false,
            "LeadingTrivia": leading,
            "TrailingTrivia": trailing,
            "Span": text_span(start, end),
            "FullSpan": text_span(full_start, full_end),
            "SpanStart": start,
        })
    }
}

/// A syntax node spanning its children.
pub fn node(kind: &str, fields: Vec<(&str, Value)>) -> Value {
    let mut span = None;
    let mut full = None;
    for (_, value) in &fields {
        let children: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for child in children {
            span = merge(span, span_bounds(child, "Span"));
            full = merge(full, span_bounds(child, "FullSpan"));
        }
    }
    let (start, end) = span.unwrap_or((0, 0));
    let (full_start, full_end) = full.unwrap_or((start, end));

    let mut obj = Map::new();
    obj.insert("@type".to_string(), json!(kind));
    for (name, value) in fields {
        obj.insert(name.to_string(), value);
    }
    obj.insert("IsMissing".to_string(), json!(false));
    obj.insert("IsStructuredTrivia".to_string(), json!(false));
    obj.insert("Span".to_string(), text_span(start, end));
    obj.insert("FullSpan".to_string(), text_span(full_start, full_end));
    obj.insert("SpanStart".to_string(), json!(start));
    Value::Object(obj)
}

pub fn identifier_name(w: &mut CstWriter, name: &str, leading: &[Trivia], trailing: &[Trivia]) -> Value {
    let ident = w.token("IdentifierToken", name, leading, trailing);
    node(
        "IdentifierName",
        vec![
            ("Identifier", ident),
            ("Arity", json!(0)),
            ("IsUnmanaged", json!(false)),
            ("IsVar", json!(false)),
        ],
    )
}

/// `A.B.C` as a left-leaning chain of `QualifiedName` nodes.
pub fn qualified_name(w: &mut CstWriter, parts: &[String], trailing: &[Trivia]) -> Value {
    let last = parts.len().saturating_sub(1);
    let trailing_of = |i: usize| if i == last { trailing } else { &[][..] };
    let Some(first) = parts.first() else {
        return Value::Null;
    };
    let mut name = identifier_name(w, first, &[], trailing_of(0));
    for (i, part) in parts.iter().enumerate().skip(1) {
        let dot = w.token("DotToken", ".", &[], &[]);
        let right = identifier_name(w, part, &[], trailing_of(i));
        name = node(
            "QualifiedName",
            vec![("Left", name), ("DotToken", dot), ("Right", right)],
        );
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_follow_the_written_text() {
        let mut w = CstWriter::new();
        let tok = w.token("UsingKeyword", "using", &[Trivia::Line("x".into()), Trivia::Newline], &[Trivia::Space]);
        assert_eq!(w.source(), "// x\nusing ");
        assert_eq!(tok["Span"]["Start"], json!(5));
        assert_eq!(tok["FullSpan"]["End"], json!(11));

        let name = qualified_name(&mut w, &["A".into(), "B".into()], &[]);
        assert_eq!(name["@type"], json!("QualifiedName"));
        assert_eq!(name["Span"]["Start"], json!(11));
        assert_eq!(name["Span"]["End"], json!(14));
    }
}
