// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

// Role prefixes; colour is applied in the UI.
pub const PREFIX_USER: &str = "| ";
pub const PREFIX_ASSISTANT: &str = "> ";
pub const PREFIX_NOTICE: &str = "* ";

pub const INPUT_HINT: &str = "What would you like to ask? Enter to send / Shift+Enter for newline";
pub const INPUT_HINT_NO_MODEL: &str = "No model selected. Pull one with `ollama pull llama3`, then Ctrl+R";

// Block titles (surrounding spaces are visual padding)
pub const TITLE_CHAT: &str = " Ollama Chat ";
pub const TITLE_INPUT: &str = " Input ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_MODELS: &str = " Select an Ollama Model ";

pub fn asking(model: &str) -> String {
    format!("Asking {}...", model)
}

pub fn model_selected(model: &str) -> String {
    format!("Model set to '{}'", model)
}

pub fn model_not_installed(model: &str) -> String {
    format!("Model '{}' is not in the local model list", model)
}

pub fn model_fallback(wanted: &str, using: &str) -> String {
    format!("Model '{}' is not installed; using '{}' instead", wanted, using)
}

pub fn model_cleared(model: &str) -> String {
    format!("Model '{}' is no longer installed; no model is selected", model)
}

pub const BUSY_SELECT: &str = "Wait for the current response to finish before changing models.";
pub const BUSY_REFRESH: &str = "Wait for the current response to finish before refreshing models.";
pub const BUSY_SUBMIT: &str = "Wait for the model list to finish refreshing before sending.";
pub const REFRESHING: &str = "Refreshing model list...";

pub fn models_refreshed(count: usize) -> String {
    format!("Model list refreshed: {} available", count)
}

pub const STICK_BOTTOM: &str = "Bottom";

pub fn build_stick_label(scroll: u16) -> String {
    if scroll == 0 {
        STICK_BOTTOM.to_string()
    } else {
        format!("+{} lines", scroll)
    }
}

pub fn models_footer(models: &[String]) -> String {
    if models.is_empty() {
        "Models: none".to_string()
    } else {
        format!("Models({}): {}", models.len(), models.join(", "))
    }
}

// Build the status bar line with width-aware compaction.
// - server: (model label, base url)
// - stick: "Bottom" or "+12 lines"
// - line_disp/col_disp: caret location (1-based)
// - streaming: a generation is in flight
// - max_width: available width for the status text
#[allow(clippy::too_many_arguments)]
pub fn build_status_line(
    server: (&str, &str),
    stick: &str,
    line_disp: u16,
    col_disp: u16,
    history_len: usize,
    models: &[String],
    streaming: bool,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    let (model, base_url) = server;
    segments.push(format!("[Ollama][{}][{}]", model, base_url));
    if streaming {
        segments.push("Streaming...".to_string());
    }
    segments.push(format!("[{}] L{} C{}", stick, line_disp, col_disp));
    segments.push(models_footer(models));
    segments.push(format!("Hist:{}", history_len));
    // Hints ordered by importance; appended while space allows.
    let hints: [&str; 5] = [
        "Enter: send; Shift+Enter: newline",
        "Ctrl+O: models; Ctrl+R: refresh",
        "PgUp/PgDn: scroll",
        "History: Up/Down",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw + if i == 0 { 0 } else { UnicodeWidthStr::width(sep) };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += UnicodeWidthStr::width(sep);
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Send    Shift+Enter: Newline    Esc/Ctrl-C: Quit",
        "Models",
        "  Ctrl+O or /model: Choose a model    /model NAME: Select directly",
        "  Ctrl+R or /refresh: Reload the model list from the server",
        "Input Editing",
        "  Arrow: Move cursor    Backspace/Delete: Delete prev/next char",
        "  Home/End, Ctrl+A/E: Line start/end    Ctrl+Arrow: Word move",
        "  Ctrl+W: Delete prev word    Ctrl+U/K: Kill to line start/end",
        "  Up/Down: Input history",
        "Chat Scrolling",
        "  Mouse wheel: Scroll    PgUp/PgDn: Page    Shift+PgUp/PgDn: Fast page",
        "  Ctrl+Up/Down: Fine scroll    Ctrl+Home/End: Top/bottom",
        "Help",
        "  F1: Open/close this panel",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_respects_width() {
        let models = vec!["llama3:latest".to_string()];
        let full = build_status_line(
            ("llama3:latest", "http://127.0.0.1:11434"),
            "Bottom",
            1,
            1,
            0,
            &models,
            false,
            400,
        );
        assert!(full.starts_with("[Ollama][llama3:latest][http://127.0.0.1:11434]"));
        assert!(full.contains("Models(1): llama3:latest"));

        let narrow = build_status_line(
            ("llama3:latest", "http://127.0.0.1:11434"),
            "Bottom",
            1,
            1,
            0,
            &models,
            false,
            50,
        );
        assert!(UnicodeWidthStr::width(narrow.as_str()) <= 50);
        assert!(narrow.starts_with("[Ollama]"));
    }

    #[test]
    fn stick_label() {
        assert_eq!(build_stick_label(0), "Bottom");
        assert_eq!(build_stick_label(7), "+7 lines");
    }
}
