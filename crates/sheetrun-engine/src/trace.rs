//! Formats Rhai evaluation errors as tracebacks into the script body.
//!
//! Rhai wraps an error raised inside a script function in one
//! `ErrorInFunctionCall` layer per call, each carrying the call-site
//! position. Walking the layers outermost first yields the call stack with
//! the raising frame last.

use std::fmt::Write;

use rhai::{EvalAltResult, Position};

/// First line of every trace.
pub const TRACE_HEADER: &str = "Traceback (most recent call last):";

const TOP_LEVEL: &str = "<script>";

/// Renders `err` as a multi-line trace pointing into `script`.
pub fn format_trace(err: &EvalAltResult, script: &str) -> String {
    let mut out = String::from(TRACE_HEADER);
    out.push('\n');

    let mut frame = TOP_LEVEL.to_string();
    let mut current = err;
    loop {
        match current {
            EvalAltResult::ErrorInFunctionCall(name, _, inner, pos) => {
                push_frame(&mut out, &frame, *pos, script);
                frame = format!("fn {name}");
                current = inner.as_ref();
            }
            EvalAltResult::ErrorInModule(path, inner, pos) => {
                push_frame(&mut out, &frame, *pos, script);
                frame = format!("module {path}");
                current = inner.as_ref();
            }
            _ => {
                push_frame(&mut out, &frame, current.position(), script);
                break;
            }
        }
    }

    let _ = write!(out, "{}: {}", label(current), message(err));
    out
}

/// The innermost error, with function-call wrappers peeled off.
pub fn innermost(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => innermost(inner),
        other => other,
    }
}

/// One-line message for the innermost error, without position suffix.
///
/// Values raised by `throw` are shown as-is.
pub fn message(err: &EvalAltResult) -> String {
    match innermost(err) {
        EvalAltResult::ErrorRuntime(value, _) | EvalAltResult::ErrorTerminated(value, _) => {
            value.to_string()
        }
        other => {
            let text = other.to_string();
            let pos = other.position();
            if pos.is_none() {
                return text;
            }
            text.strip_suffix(&format!(" ({pos})"))
                .map(str::to_string)
                .unwrap_or(text)
        }
    }
}

fn label(err: &EvalAltResult) -> &'static str {
    match err {
        EvalAltResult::ErrorParsing(..) => "SyntaxError",
        EvalAltResult::ErrorRuntime(..) => "ScriptError",
        EvalAltResult::ErrorTerminated(..) => "Terminated",
        EvalAltResult::ErrorVariableNotFound(..) | EvalAltResult::ErrorFunctionNotFound(..) => {
            "NameError"
        }
        EvalAltResult::ErrorMismatchDataType(..) | EvalAltResult::ErrorMismatchOutputType(..) => {
            "TypeError"
        }
        _ => "Error",
    }
}

fn push_frame(out: &mut String, frame: &str, pos: Position, script: &str) {
    let (Some(line), column) = (pos.line(), pos.position()) else {
        let _ = writeln!(out, "  in {frame}");
        return;
    };
    match column {
        Some(column) => {
            let _ = writeln!(out, "  in {frame}, line {line}, column {column}");
        }
        None => {
            let _ = writeln!(out, "  in {frame}, line {line}");
        }
    }

    let Some(source) = script.lines().nth(line.saturating_sub(1)) else {
        return;
    };
    let _ = writeln!(out, "    {source}");
    if let Some(column) = column {
        let indent: String = source
            .chars()
            .take(column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let _ = writeln!(out, "    {indent}^");
    }
}
