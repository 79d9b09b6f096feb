//! JSON-lines request loop.
//!
//! Each input line is a [`Request`]; each output line the matching [`Response`]. A line that
//! cannot be parsed produces an error response and the loop carries on.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::driver::{Driver, Request, Response, Status, parse_json};

/// Counters reported when the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub handled: usize,
    pub failed: usize,
}

fn respond(driver: &Driver, line: &str) -> Response {
    match parse_json::<Request>(line) {
        Ok(request) => driver.handle(&request),
        Err(e) => {
            error!(error = %e, "invalid request");
            Response::error(format!("invalid request: {e}"))
        }
    }
}

/// Handles one line on a driver worker and renders the response there, so deep trees are
/// never parsed, rewritten or dropped on the caller's stack.
fn respond_line(driver: &Driver, line: &str) -> Result<(Status, String)> {
    driver.install(|| {
        let response = respond(driver, line);
        let rendered = serde_json::to_string(&response).context("rendering response")?;
        Ok((response.status, rendered))
    })
}

/// Serves requests from `input` until end of input.
pub fn serve<R: BufRead, W: Write>(driver: &Driver, input: R, mut output: W) -> Result<ServeStats> {
    info!(mode = ?driver.mode(), "serving requests");
    let mut stats = ServeStats::default();
    for (n, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("reading request line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let (status, rendered) = respond_line(driver, &line)?;
        stats.handled += 1;
        if status == Status::Error {
            stats.failed += 1;
        }
        output.write_all(rendered.as_bytes()).context("writing response")?;
        output.write_all(b"\n").context("writing response")?;
        output.flush().context("flushing response")?;
        debug!(line = n + 1, status = ?status, "request handled");
    }
    info!(handled = stats.handled, failed = stats.failed, "input exhausted");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use crate::driver::Mode;
    use indoc::indoc;
    use serde_json::{Value, json};

    #[test]
    fn test_bad_line_does_not_stop_the_loop() {
        let driver = Driver::new(NormalizerConfig::default(), Mode::Preprocessed);
        let input = indoc! {r#"
            {"ast": {"@type": "A"}}
            not json

            {"ast": {"@type": "B"}}
        "#};
        let mut out = Vec::new();
        let stats = serve(&driver, input.as_bytes(), &mut out).unwrap();
        assert_eq!(stats, ServeStats { handled: 3, failed: 1 });

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["ast"], json!({"@type": "A"}));
        assert_eq!(lines[1]["status"], json!("error"));
        assert_eq!(lines[1]["ast"], Value::Null);
        assert_eq!(lines[2]["status"], json!("ok"));
    }

    #[test]
    fn test_deep_request_is_normalized() {
        // `a + a + ... + a` nests one AddExpression per operand.
        let operand = r#"{"@type": "IdentifierName", "Identifier": {"@type": "IdentifierToken", "Text": "a"}}"#;
        let depth = 1500;
        let mut ast = r#"{"@type": "AddExpression", "Left": "#.repeat(depth);
        ast.push_str(operand);
        ast.push_str(&format!(r#", "Right": {operand}}}"#).repeat(depth));
        let input = format!("{{\"ast\": {ast}}}\n");

        let driver = Driver::new(NormalizerConfig::default(), Mode::Preprocessed);
        let mut out = Vec::new();
        let stats = serve(&driver, input.as_bytes(), &mut out).unwrap();
        assert_eq!(stats, ServeStats { handled: 1, failed: 0 });
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(r#"{"status":"ok""#), "{}", &text[..text.len().min(200)]);
    }
}
