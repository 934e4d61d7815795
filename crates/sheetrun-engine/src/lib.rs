//! # sheetrun-engine
//!
//! The execution sandbox. Compiles and evaluates an untrusted script with
//! the capability set as its only namespace and `output_path` as its only
//! binding, then checks the one postcondition that defines success: a file
//! now exists at the output path.
//!
//! Failures carry a trace pointing into the script body.

pub mod error;
pub mod sandbox;
pub mod trace;

pub use error::EngineError;
pub use sandbox::{run, Bindings, RunReport, Sandbox, ScriptRunner};
pub use trace::{format_trace, TRACE_HEADER};
