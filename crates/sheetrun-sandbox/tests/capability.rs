//! Integration tests for the capability set seen by scripts.

use calamine::{open_workbook, Data, Reader, Xlsx};
use rhai::Scope;

use sheetrun_sandbox::{ArtifactPath, CapabilityKind, CapabilityRegistry};

fn run_with_output(script: &str, path: &std::path::Path) -> Result<(), Box<rhai::EvalAltResult>> {
    let set = CapabilityRegistry::build();
    let mut scope = Scope::new();
    scope.push(CapabilityRegistry::OUTPUT_BINDING, ArtifactPath::new(path));
    set.engine().run_with_scope(&mut scope, script)
}

#[test]
fn hello_workbook_round_trips_through_calamine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hello.xlsx");
    let script = r#"
        let wb = xlsx::workbook();
        let sheet = wb.add_sheet("Sheet1");
        sheet.write(0, 0, "hello");
        wb.save(output_path);
    "#;
    run_with_output(script, &path).expect("script runs");

    let mut xlsx: Xlsx<_> = open_workbook(&path).expect("open");
    assert_eq!(xlsx.sheet_names().len(), 1);
    let range = xlsx.worksheet_range("Sheet1").expect("range");
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("hello".into())));
}

#[test]
fn table_and_formula_are_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("table.xlsx");
    let script = r#"
        let wb = xlsx::workbook();
        let sheet = wb.add_sheet("Sales");
        sheet.write_row(0, 0, ["item", "qty"]);
        sheet.write_rows(1, 0, [["apple", 3], ["pear", 4]]);
        sheet.write_formula(3, 1, "=SUM(B2:B3)");
        sheet.write_cell("D1", true);
        sheet.set_column_width(0, 20);
        wb.save(output_path);
    "#;
    run_with_output(script, &path).expect("script runs");

    let mut xlsx: Xlsx<_> = open_workbook(&path).expect("open");
    let range = xlsx.worksheet_range("Sales").expect("range");
    assert_eq!(range.get_value((0, 1)), Some(&Data::String("qty".into())));
    assert_eq!(range.get_value((2, 0)), Some(&Data::String("pear".into())));
    assert_eq!(range.get_value((2, 1)), Some(&Data::Float(4.0)));
    assert_eq!(range.get_value((0, 3)), Some(&Data::Bool(true)));
}

#[test]
fn loops_and_maps_are_usable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("loop.xlsx");
    let script = r#"
        let wb = xlsx::workbook();
        let sheet = wb.add_sheet("Squares");
        let totals = #{ sum: 0 };
        for i in 0..5 {
            sheet.write(i, 0, i * i);
            totals.sum += i * i;
        }
        print(`sum = ${totals.sum}`);
        sheet.write(5, 0, totals.sum);
        wb.save(output_path);
    "#;
    run_with_output(script, &path).expect("script runs");

    let mut xlsx: Xlsx<_> = open_workbook(&path).expect("open");
    let range = xlsx.worksheet_range("Squares").expect("range");
    assert_eq!(range.get_value((5, 0)), Some(&Data::Float(30.0)));
}

#[test]
fn thrown_errors_surface_with_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("never.xlsx");
    let err = run_with_output("throw \"bad\";", &path).unwrap_err();
    assert!(err.to_string().contains("bad"));
    assert!(!path.exists());
}

#[test]
fn unknown_functions_are_lookup_misses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("never.xlsx");
    for script in [
        "open(\"/etc/passwd\")",
        "system(\"ls\")",
        "read_file(\"x\")",
        "let f = Fn(\"exit\"); f.call();",
    ] {
        assert!(run_with_output(script, &path).is_err(), "{script} should fail");
    }
}

#[test]
fn duplicate_sheet_is_script_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dup.xlsx");
    let script = r#"
        let wb = xlsx::workbook();
        wb.add_sheet("A");
        wb.add_sheet("A");
    "#;
    let err = run_with_output(script, &path).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn manifest_covers_every_kind() {
    let set = CapabilityRegistry::build();
    for kind in [
        CapabilityKind::Primitive,
        CapabilityKind::Sink,
        CapabilityKind::Namespace,
        CapabilityKind::Type,
        CapabilityKind::Binding,
    ] {
        assert!(
            set.entries().iter().any(|e| e.kind == kind),
            "no entry of kind {kind}"
        );
    }
}
