//! Terminal capability detection and colouring.

use donormatch::EligibilityState;
use owo_colors::{colors::css, OwoColorize};

/// Whether stdout should receive ANSI colours.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Terminal width in columns, if stdout is a terminal.
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Narrow terminals (< 60 columns) get stacked output instead of tables.
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < 60)
}

/// Extension trait for colouring text when the terminal allows it.
pub trait Colorize {
    /// Good news (green).
    fn success(&self) -> String;
    /// Needs attention (amber).
    fn warning(&self) -> String;
    /// Blocked (red).
    fn danger(&self) -> String;
    /// Labels and headings (bold).
    fn heading(&self) -> String;
    /// Secondary text.
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Orange>().to_string())
    }

    fn danger(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Red>().to_string())
    }

    fn heading(&self) -> String {
        paint(self.as_ref(), |s| s.bold().to_string())
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), |s| s.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// An eligibility state rendered in the colour that matches its outcome.
pub fn eligibility_label(state: &EligibilityState) -> String {
    let text = state.to_string();
    match state {
        EligibilityState::Eligible => text.success(),
        EligibilityState::UnderAge { .. } | EligibilityState::Unknown => text.warning(),
        EligibilityState::AboveAge | EligibilityState::HealthExcluded => text.danger(),
    }
}
