//! The `xlsx` spreadsheet capability.
//!
//! Scripts build a workbook in memory through [`Workbook`] and [`Sheet`]
//! handles and render it with `Workbook.save(output_path)`. Rendering goes
//! through `rust_xlsxwriter`; the script never touches a file handle.

pub mod api;
pub mod cellref;
pub mod model;
pub mod render;

use rhai::{Engine, EvalAltResult, Module};

pub use api::{Sheet, Workbook};
pub use model::{BookModel, CellValue, SheetModel};

/// Result of a script-callable function.
pub type RhaiResultOf<T> = Result<T, Box<EvalAltResult>>;

/// Name under which the namespace is reachable from scripts.
pub const NAMESPACE: &str = "xlsx";

fn new_workbook() -> RhaiResultOf<Workbook> {
    Ok(Workbook::new())
}

/// Registers the workbook types, their methods and the `xlsx::` namespace.
pub fn register(engine: &mut Engine) {
    engine
        .register_type_with_name::<Workbook>("Workbook")
        .register_fn("add_sheet", Workbook::add_sheet)
        .register_fn("sheet_count", Workbook::sheet_count)
        .register_fn("save", Workbook::save)
        .register_fn("to_string", |wb: &mut Workbook| {
            format!("Workbook({} sheets)", wb.sheet_count())
        })
        .register_type_with_name::<Sheet>("Sheet")
        .register_fn("name", Sheet::name)
        .register_fn("write", Sheet::write)
        .register_fn("write_cell", Sheet::write_cell)
        .register_fn("write_formula", Sheet::write_formula)
        .register_fn("write_row", Sheet::write_row)
        .register_fn("write_rows", Sheet::write_rows)
        .register_fn("write_rows", Sheet::write_rows_with_header)
        .register_fn("set_column_width", Sheet::set_column_width)
        .register_fn("to_string", |sheet: &mut Sheet| format!("Sheet({})", sheet.name()));

    let mut module = Module::new();
    module.set_native_fn("workbook", new_workbook);
    module.set_native_fn("cell_ref", api::cell_ref);
    engine.register_static_module(NAMESPACE, module.into());
}
