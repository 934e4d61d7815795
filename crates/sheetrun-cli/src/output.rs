//! Output formatting for CLI responses.

use sheetrun_types::DiagnosticError;

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("[OK] {message}");
}

/// Prints an error message.
pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

/// Prints the cause and fix of a diagnosable error, when it has them.
pub fn print_diagnostic(error: &dyn DiagnosticError) {
    if let Some(hint) = error.hint() {
        eprintln!("\n  Cause: {hint}");
    }
    if let Some(fix) = error.fix() {
        eprintln!("  Fix:   {fix}\n");
    }
}
