//! Script-facing workbook handles.
//!
//! `Workbook` and `Sheet` are cheap clonable handles onto one shared
//! [`BookModel`], so a script can keep several sheet handles alive at once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rhai::{Array, Dynamic, EvalAltResult, Map, FLOAT, INT};

use crate::artifact_path::ArtifactPath;
use crate::xlsx::cellref::{cell_ref as format_cell_ref, col_index, parse_cell_ref, row_index};
use crate::xlsx::model::{BookModel, CellValue, SheetModel};
use crate::xlsx::render::render;
use crate::xlsx::RhaiResultOf;

/// Handle to a workbook under construction.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    book: Arc<Mutex<BookModel>>,
}

/// Handle to one sheet of a [`Workbook`].
#[derive(Debug, Clone)]
pub struct Sheet {
    book: Arc<Mutex<BookModel>>,
    index: usize,
}

fn lock(book: &Mutex<BookModel>) -> MutexGuard<'_, BookModel> {
    book.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Workbook {
    /// `xlsx::workbook()`
    pub fn new() -> Self {
        Self::default()
    }

    /// `wb.add_sheet(name)`
    pub fn add_sheet(&mut self, name: &str) -> RhaiResultOf<Sheet> {
        let index = lock(&self.book).add_sheet(name)?;
        Ok(Sheet {
            book: Arc::clone(&self.book),
            index,
        })
    }

    /// `wb.sheet_count()`
    pub fn sheet_count(&mut self) -> INT {
        lock(&self.book).len() as INT
    }

    /// `wb.save(output_path)`
    pub fn save(&mut self, path: ArtifactPath) -> RhaiResultOf<()> {
        let book = lock(&self.book);
        render(&book, path.as_path()).map_err(|e| e.to_string().into())
    }

    /// Copy of the current model, for host-side inspection.
    pub fn snapshot(&self) -> BookModel {
        lock(&self.book).clone()
    }
}

impl Sheet {
    fn update<F>(&self, f: F) -> RhaiResultOf<()>
    where
        F: FnOnce(&mut SheetModel) -> Result<(), String>,
    {
        let mut book = lock(&self.book);
        let sheet = book
            .sheet_mut(self.index)
            .ok_or_else(|| format!("sheet #{} no longer exists", self.index))?;
        f(sheet).map_err(Into::into)
    }

    /// `sheet.name()`
    pub fn name(&mut self) -> String {
        lock(&self.book)
            .sheet(self.index)
            .map(|s| s.name().to_string())
            .unwrap_or_default()
    }

    /// `sheet.write(row, col, value)`
    pub fn write(&mut self, row: INT, col: INT, value: Dynamic) -> RhaiResultOf<()> {
        let (row, col) = (row_index(row)?, col_index(col)?);
        let value = to_cell(value)?;
        self.update(|sheet| {
            sheet.set(row, col, value);
            Ok(())
        })
    }

    /// `sheet.write_cell("B3", value)`
    pub fn write_cell(&mut self, reference: &str, value: Dynamic) -> RhaiResultOf<()> {
        let (row, col) = parse_cell_ref(reference)?;
        let value = to_cell(value)?;
        self.update(|sheet| {
            sheet.set(row, col, value);
            Ok(())
        })
    }

    /// `sheet.write_formula(row, col, "=SUM(A1:A3)")`
    pub fn write_formula(&mut self, row: INT, col: INT, formula: &str) -> RhaiResultOf<()> {
        let (row, col) = (row_index(row)?, col_index(col)?);
        if formula.trim().is_empty() {
            return Err("formula must not be empty".into());
        }
        let formula = formula.to_string();
        self.update(|sheet| {
            sheet.set(row, col, CellValue::Formula(formula));
            Ok(())
        })
    }

    /// `sheet.write_row(row, col, [a, b, c])`
    pub fn write_row(&mut self, row: INT, col: INT, values: Array) -> RhaiResultOf<()> {
        let row = row_index(row)?;
        let cells = cells_from(col, values)?;
        self.update(|sheet| {
            for (col, value) in cells {
                sheet.set(row, col, value);
            }
            Ok(())
        })
    }

    /// `sheet.write_rows(row, col, rows)`
    ///
    /// Rows are arrays, or object maps; for maps a header row made of the
    /// first map's keys is written first and later maps are read by those
    /// keys. Object map keys are sorted, so that header is alphabetical;
    /// use the `header` overload to choose the column order.
    pub fn write_rows(&mut self, row: INT, col: INT, rows: Array) -> RhaiResultOf<()> {
        self.write_grid(row, col, grid_from(rows, None)?)
    }

    /// `sheet.write_rows(row, col, rows, header)`
    ///
    /// Writes `header` first; map rows are read by its keys, in its order.
    pub fn write_rows_with_header(
        &mut self,
        row: INT,
        col: INT,
        rows: Array,
        header: Array,
    ) -> RhaiResultOf<()> {
        let header = header
            .into_iter()
            .enumerate()
            .map(|(i, key)| {
                key.into_immutable_string()
                    .map(|k| k.to_string())
                    .map_err(|t| -> Box<EvalAltResult> {
                        format!("header entry {i} is {t}, not a string").into()
                    })
            })
            .collect::<RhaiResultOf<Vec<String>>>()?;
        self.write_grid(row, col, grid_from(rows, Some(header))?)
    }

    fn write_grid(&mut self, row: INT, col: INT, grid: Vec<Array>) -> RhaiResultOf<()> {
        for (offset, values) in grid.into_iter().enumerate() {
            self.write_row(row + offset as INT, col, values)?;
        }
        Ok(())
    }

    /// `sheet.set_column_width(col, width)`
    pub fn set_column_width(&mut self, col: INT, width: Dynamic) -> RhaiResultOf<()> {
        let col = col_index(col)?;
        let width = as_number(&width)
            .filter(|w| w.is_finite() && *w >= 0.0)
            .ok_or_else(|| format!("column width must be a non-negative number, got {width}"))?;
        self.update(|sheet| {
            sheet.set_column_width(col, width);
            Ok(())
        })
    }
}

/// `xlsx::cell_ref(row, col)`
pub fn cell_ref(row: INT, col: INT) -> RhaiResultOf<String> {
    Ok(format_cell_ref(row_index(row)?, col_index(col)?))
}

fn as_number(value: &Dynamic) -> Option<FLOAT> {
    value
        .as_int()
        .map(|i| i as FLOAT)
        .or_else(|_| value.as_float())
        .ok()
}

fn to_cell(value: Dynamic) -> RhaiResultOf<CellValue> {
    if value.is_unit() {
        return Ok(CellValue::Blank);
    }
    if let Ok(flag) = value.as_bool() {
        return Ok(CellValue::Bool(flag));
    }
    if let Some(number) = as_number(&value) {
        return Ok(CellValue::Number(number));
    }
    if let Ok(c) = value.as_char() {
        return Ok(CellValue::Text(c.to_string()));
    }
    let type_name = value.type_name();
    value
        .into_string()
        .map(CellValue::Text)
        .map_err(|_| format!("cannot write a value of type '{type_name}' to a cell").into())
}

fn cells_from(col: INT, values: Array) -> RhaiResultOf<Vec<(u16, CellValue)>> {
    values
        .into_iter()
        .enumerate()
        .map(|(offset, value)| -> RhaiResultOf<(u16, CellValue)> {
            Ok((col_index(col + offset as INT)?, to_cell(value)?))
        })
        .collect()
}

fn grid_from(rows: Array, header: Option<Vec<String>>) -> RhaiResultOf<Vec<Array>> {
    let maps = rows.first().is_some_and(Dynamic::is_map);
    let header = match header {
        Some(header) => Some(header),
        None if maps => rows[0]
            .clone()
            .try_cast::<Map>()
            .map(|m| m.keys().map(|k| k.to_string()).collect()),
        None => None,
    };

    let mut grid = Vec::with_capacity(rows.len() + 1);
    if let Some(header) = &header {
        grid.push(header.iter().cloned().map(Dynamic::from).collect::<Array>());
    }

    for (i, row) in rows.into_iter().enumerate() {
        if maps {
            let map = row
                .try_cast::<Map>()
                .ok_or_else(|| format!("row {i} is not an object map like the first row"))?;
            let keys = header.as_deref().unwrap_or_default();
            grid.push(
                keys.iter()
                    .map(|key| map.get(key.as_str()).cloned().unwrap_or(Dynamic::UNIT))
                    .collect(),
            );
        } else {
            let values = row
                .try_cast::<Array>()
                .ok_or_else(|| format!("row {i} is not an array"))?;
            grid.push(values);
        }
    }
    Ok(grid)
}
