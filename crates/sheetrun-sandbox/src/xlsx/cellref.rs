//! A1-style cell references and sheet bounds.

/// Number of rows in an Excel worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in an Excel worksheet.
pub const MAX_COLS: u16 = 16_384;

/// Converts a zero-based script row into a worksheet row.
pub fn row_index(row: i64) -> Result<u32, String> {
    u32::try_from(row)
        .ok()
        .filter(|r| *r < MAX_ROWS)
        .ok_or_else(|| format!("row {row} is out of range (0..{MAX_ROWS})"))
}

/// Converts a zero-based script column into a worksheet column.
pub fn col_index(col: i64) -> Result<u16, String> {
    u16::try_from(col)
        .ok()
        .filter(|c| *c < MAX_COLS)
        .ok_or_else(|| format!("column {col} is out of range (0..{MAX_COLS})"))
}

/// Returns the letters naming a zero-based column (`0` → `A`, `27` → `AB`).
pub fn column_name(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Formats a zero-based coordinate as an A1 reference.
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Parses an A1 reference (`"B3"`, `"$b$3"`) into zero-based coordinates.
pub fn parse_cell_ref(reference: &str) -> Result<(u32, u16), String> {
    let cleaned: String = reference.trim().chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| format!("invalid cell reference '{reference}'"))?;
    let (letters, digits) = cleaned.split_at(split);

    if letters.is_empty()
        || letters.len() > 3
        || !letters.chars().all(|c| c.is_ascii_alphabetic())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("invalid cell reference '{reference}'"));
    }

    let col_number = letters
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
    let row_number: u32 = digits
        .parse()
        .map_err(|_| format!("invalid cell reference '{reference}'"))?;

    if row_number == 0 || row_number > MAX_ROWS || col_number > u32::from(MAX_COLS) {
        return Err(format!("cell reference '{reference}' is outside the sheet"));
    }
    Ok((row_number - 1, (col_number - 1) as u16))
}
