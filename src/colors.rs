//! ANSI color codes for REPL output. Never used inside pipeline buffers.

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

/// Wrap `text` in an ANSI color code.
pub fn colorize(text: &str, code: &str) -> String {
    format!("{code}{text}{RESET}")
}

/// Color set selected by the config `theme`; `"plain"` disables coloring.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn from_theme(theme: &str) -> Self {
        Self {
            enabled: theme != "plain",
        }
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, CYAN)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(text, YELLOW)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, RED)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.enabled {
            colorize(text, code)
        } else {
            text.to_string()
        }
    }
}
