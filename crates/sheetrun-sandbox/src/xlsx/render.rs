//! Renders a [`BookModel`] to an `.xlsx` file with `rust_xlsxwriter`.

use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};

use crate::error::SandboxError;
use crate::xlsx::model::{BookModel, CellValue};

/// Writes `book` to `path`, replacing any existing file.
///
/// A workbook without sheets is saved with one empty default sheet.
pub fn render(book: &BookModel, path: &Path) -> Result<(), SandboxError> {
    build(book)
        .and_then(|mut workbook| workbook.save(path))
        .map_err(|e| SandboxError::Render {
            reason: e.to_string(),
        })
}

fn build(book: &BookModel) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    for sheet in &book.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (&(row, col), value) in &sheet.cells {
            match value {
                CellValue::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number(row, col, *number)?;
                }
                CellValue::Bool(flag) => {
                    worksheet.write_boolean(row, col, *flag)?;
                }
                CellValue::Formula(formula) => {
                    worksheet.write_formula(row, col, formula.as_str())?;
                }
                CellValue::Blank => {}
            }
        }
        for (&col, &width) in &sheet.column_widths {
            worksheet.set_column_width(col, width)?;
        }
    }
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};

    #[test]
    fn renders_cells_readable_by_calamine() {
        let mut book = BookModel::default();
        let idx = book.add_sheet("Report").expect("sheet");
        let sheet = book.sheet_mut(idx).expect("exists");
        sheet.set(0, 0, CellValue::Text("hello".into()));
        sheet.set(1, 0, CellValue::Number(42.0));
        sheet.set(2, 0, CellValue::Bool(true));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xlsx");
        render(&book, &path).expect("render");

        let mut xlsx: Xlsx<_> = open_workbook(&path).expect("open");
        assert_eq!(xlsx.sheet_names(), vec!["Report".to_string()]);
        let range = xlsx.worksheet_range("Report").expect("range");
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("hello".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(42.0)));
        assert_eq!(range.get_value((2, 0)), Some(&Data::Bool(true)));
    }

    #[test]
    fn empty_book_still_renders() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.xlsx");
        render(&BookModel::default(), &path).expect("render");
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_render_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("out.xlsx");
        let err = render(&BookModel::default(), &path).unwrap_err();
        assert!(matches!(err, SandboxError::Render { .. }));
    }
}
