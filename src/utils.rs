//! Utilities module.

use colored::Colorize;

/// Prints an error to `stderr` in red.
///
/// When not in verbose mode, a hint about the `-v` flag follows the error.
pub fn print_error<S: AsRef<str>>(error: S, verbose: bool) {
    eprintln!("{} {}", "Error:".bold().red(), error.as_ref().red());

    if !verbose {
        eprintln!(
            "If you need more information, try to run the program again with the {} flag.",
            "-v".bold()
        );
    }
}

/// Prints a warning to `stderr` in yellow.
pub fn print_warning<S: AsRef<str>>(warning: S) {
    eprintln!(
        "{} {}",
        "Warning:".bold().yellow(),
        warning.as_ref().yellow()
    );
}

/// Formats a file size for humans, in binary multiples.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Renders a progress bar of `width` cells for a 0 to 100 value.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = usize::from(progress.min(100)) * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
