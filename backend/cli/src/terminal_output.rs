//! Terminal notes with optional ANSI styling.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Colour a record status word: green success, yellow partial, red otherwise.
pub fn paint_status(status: &str) -> String {
    let color = match status {
        "ok" | "success" => GREEN,
        "partial" | "degraded" => YELLOW,
        _ => RED,
    };
    if supports_color() {
        format!("{color}{BOLD}{status}{RESET}")
    } else {
        status.to_string()
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn painted_status_keeps_the_word() {
        assert!(paint_status("partial").contains("partial"));
        assert!(paint_status("failed").contains("failed"));
    }
}
