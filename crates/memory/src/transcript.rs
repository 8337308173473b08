//! Transcript rendering: replays the conversation log for display.

use oraculo_core::message::{Role, Turn};

/// Render turns as a plain-text transcript, oldest first.
///
/// Each turn is prefixed with its speaker label; multi-line content is
/// indented under the label so turns stay visually separated.
pub fn render_transcript(turns: &[Turn], assistant_label: &str) -> String {
    let mut out = String::new();
    for turn in turns {
        let label = match turn.role() {
            Role::User => "You",
            Role::Assistant => assistant_label,
            Role::System => "System",
        };
        let mut lines = turn.content().lines();
        out.push_str(&format!("{label} > {}\n", lines.next().unwrap_or("")));
        let pad = " ".repeat(label.chars().count() + 3);
        for line in lines {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_renders_nothing() {
        assert_eq!(render_transcript(&[], "Oracle"), "");
    }

    #[test]
    fn renders_turns_in_order_with_labels() {
        let turns = vec![Turn::user("what does the doc say?"), Turn::assistant("It says hello.")];
        let text = render_transcript(&turns, "Oracle");
        assert_eq!(text, "You > what does the doc say?\nOracle > It says hello.\n");
    }

    #[test]
    fn multiline_content_is_indented() {
        let turns = vec![Turn::assistant("line one\nline two")];
        let text = render_transcript(&turns, "Bot");
        assert_eq!(text, "Bot > line one\n      line two\n");
    }
}
