//! Property-based tests for A1 cell references.

use proptest::prelude::*;

use sheetrun_sandbox::xlsx::cellref::{cell_ref, parse_cell_ref, MAX_COLS, MAX_ROWS};

proptest! {
    /// Every in-range coordinate formats to a reference that parses back.
    #[test]
    fn formatted_references_parse_back(row in 0..MAX_ROWS, col in 0..MAX_COLS) {
        let reference = cell_ref(row, col);
        prop_assert_eq!(parse_cell_ref(&reference), Ok((row, col)));
    }

    /// Arbitrary text never panics and never yields an out-of-range cell.
    #[test]
    fn arbitrary_text_stays_in_bounds(input in "[A-Za-z$]{0,4}[0-9]{0,8}") {
        if let Ok((row, col)) = parse_cell_ref(&input) {
            prop_assert!(row < MAX_ROWS);
            prop_assert!(col < MAX_COLS);
        }
    }

    /// References without a row number are always rejected.
    #[test]
    fn letters_only_rejected(letters in "[A-Z]{1,3}") {
        prop_assert!(parse_cell_ref(&letters).is_err());
    }
}
