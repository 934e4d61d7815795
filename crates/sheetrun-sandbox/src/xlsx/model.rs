//! In-memory workbook built up by a script before it is saved.

use std::collections::BTreeMap;

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Value stored in one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A string.
    Text(String),
    /// Any numeric value (integers are stored as floats, as Excel does).
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// A formula such as `=SUM(A1:A3)`.
    Formula(String),
    /// An explicitly cleared cell.
    Blank,
}

/// One worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetModel {
    pub(crate) name: String,
    pub(crate) cells: BTreeMap<(u32, u16), CellValue>,
    pub(crate) column_widths: BTreeMap<u16, f64>,
}

impl SheetModel {
    /// The sheet's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value at a zero-based coordinate.
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Stores a value, replacing any previous one.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        if value == CellValue::Blank {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// Sets a column width in character units.
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }
}

/// A whole workbook.
#[derive(Debug, Clone, Default)]
pub struct BookModel {
    pub(crate) sheets: Vec<SheetModel>,
}

impl BookModel {
    /// Adds a sheet and returns its index.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize, String> {
        validate_sheet_name(name)?;
        if self
            .sheets
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return Err(format!("a sheet named '{name}' already exists"));
        }
        self.sheets.push(SheetModel {
            name: name.to_string(),
            ..SheetModel::default()
        });
        Ok(self.sheets.len() - 1)
    }

    /// Returns the sheet at `index`.
    pub fn sheet(&self, index: usize) -> Option<&SheetModel> {
        self.sheets.get(index)
    }

    /// Returns the sheet at `index` mutably.
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut SheetModel> {
        self.sheets.get_mut(index)
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Returns `true` if no sheet was added.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

fn validate_sheet_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("sheet name must not be empty".into());
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(format!(
            "sheet name '{name}' is longer than {MAX_SHEET_NAME_LEN} characters"
        ));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(format!("sheet name '{name}' contains forbidden character '{c}'"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(format!("sheet name '{name}' must not start or end with an apostrophe"));
    }
    Ok(())
}
