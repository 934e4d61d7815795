//! The capability registry.
//!
//! [`CapabilityRegistry::build`] assembles the one engine every script runs
//! on. It starts from a raw Rhai engine, which has no functions at all, and
//! adds exactly the granted surface:
//!
//! - scalar, string, array, map, range and math primitives
//!   (Rhai `StandardPackage`, which performs no I/O);
//! - the `print` and `debug` sink, routed to `tracing`;
//! - the `xlsx` namespace and its `Workbook`/`Sheet` types;
//! - the `ArtifactPath` type of the `output_path` binding.
//!
//! Module imports resolve against a resolver that knows no modules, and
//! `eval` is disabled as a symbol.

use std::fmt;

use rhai::module_resolvers::DummyModuleResolver;
use rhai::packages::{Package, StandardPackage};
use rhai::{Dynamic, Engine, EvalAltResult, Position, FLOAT, INT};

use crate::artifact_path::ArtifactPath;
use crate::limits;
use crate::xlsx;

/// Kind of name granted to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Built-in value constructors and operations.
    Primitive,
    /// Output sink for diagnostics.
    Sink,
    /// Library namespace reachable as `name::fn()`.
    Namespace,
    /// Host type whose methods scripts may call.
    Type,
    /// Per-invocation variable bound into the script scope.
    Binding,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Primitive => "primitive",
            Self::Sink => "sink",
            Self::Namespace => "namespace",
            Self::Type => "type",
            Self::Binding => "binding",
        };
        f.write_str(label)
    }
}

/// One granted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEntry {
    /// Identifier as seen by scripts.
    pub name: &'static str,
    /// What the identifier refers to.
    pub kind: CapabilityKind,
    /// Short description.
    pub description: &'static str,
}

const fn entry(
    name: &'static str,
    kind: CapabilityKind,
    description: &'static str,
) -> CapabilityEntry {
    CapabilityEntry {
        name,
        kind,
        description,
    }
}

const MANIFEST: &[CapabilityEntry] = &[
    entry("int", CapabilityKind::Primitive, "integers, arithmetic, parse_int"),
    entry("float", CapabilityKind::Primitive, "floats, math functions, parse_float"),
    entry("bool", CapabilityKind::Primitive, "true, false, logic operators"),
    entry("string", CapabilityKind::Primitive, "string literals and methods, to_string"),
    entry("array", CapabilityKind::Primitive, "array literals and methods"),
    entry("map", CapabilityKind::Primitive, "object map literals and methods"),
    entry("range", CapabilityKind::Primitive, "ranges and iteration"),
    entry("print", CapabilityKind::Sink, "log a line at info level"),
    entry("debug", CapabilityKind::Sink, "log a value at debug level"),
    entry(xlsx::NAMESPACE, CapabilityKind::Namespace, "xlsx::workbook(), xlsx::cell_ref()"),
    entry("Workbook", CapabilityKind::Type, "add_sheet, sheet_count, save"),
    entry(
        "Sheet",
        CapabilityKind::Type,
        "name, write, write_cell, write_formula, write_row, write_rows, set_column_width",
    ),
    entry("ArtifactPath", CapabilityKind::Type, "the write grant; to_string"),
    entry(
        CapabilityRegistry::OUTPUT_BINDING,
        CapabilityKind::Binding,
        "where the script must save its workbook",
    ),
];

/// The frozen set of names reachable from untrusted scripts.
///
/// Built once at startup and shared read-only by every request.
pub struct CapabilitySet {
    engine: Engine,
    entries: Vec<CapabilityEntry>,
}

impl CapabilitySet {
    /// The configured engine. Only shared references are handed out, so the
    /// set cannot be altered after construction.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Every granted name.
    pub fn entries(&self) -> &[CapabilityEntry] {
        &self.entries
    }

    /// Returns `true` if `name` is granted.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Builds [`CapabilitySet`]s.
pub struct CapabilityRegistry;

impl CapabilityRegistry {
    /// Name of the per-invocation output binding.
    pub const OUTPUT_BINDING: &'static str = "output_path";

    /// Assembles the capability set.
    pub fn build() -> CapabilitySet {
        let mut engine = Engine::new_raw();

        engine.register_global_module(StandardPackage::new().as_shared_module());
        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");
        shadow_process_control(&mut engine);

        engine.on_print(|text| {
            tracing::info!(target: "sheetrun::script", "{text}");
        });
        engine.on_debug(|text, source, pos: Position| {
            tracing::debug!(target: "sheetrun::script", source = ?source, position = ?pos, "{text}");
        });
        engine.on_progress(limits::on_progress);

        register_artifact_path(&mut engine);
        xlsx::register(&mut engine);

        tracing::debug!(capabilities = MANIFEST.len(), "capability set built");
        CapabilitySet {
            engine,
            entries: MANIFEST.to_vec(),
        }
    }
}

/// Registers failing `exit` and `sleep` overloads in the engine's own
/// namespace, which is searched before any package. `Fn("exit").call()`
/// resolves the same way, so neither is reachable indirectly either.
fn shadow_process_control(engine: &mut Engine) {
    fn denied(name: &str) -> Box<EvalAltResult> {
        format!("function '{name}' is not available").into()
    }
    engine
        .register_fn("exit", || -> Result<(), Box<EvalAltResult>> { Err(denied("exit")) })
        .register_fn("exit", |_: Dynamic| -> Result<(), Box<EvalAltResult>> {
            Err(denied("exit"))
        })
        .register_fn("sleep", |_: INT| -> Result<(), Box<EvalAltResult>> {
            Err(denied("sleep"))
        })
        .register_fn("sleep", |_: FLOAT| -> Result<(), Box<EvalAltResult>> {
            Err(denied("sleep"))
        });
}

fn register_artifact_path(engine: &mut Engine) {
    engine
        .register_type_with_name::<ArtifactPath>("ArtifactPath")
        .register_fn("to_string", |p: &mut ArtifactPath| p.to_string())
        .register_fn("to_debug", |p: &mut ArtifactPath| format!("ArtifactPath({p})"));
}
