//! Bounded rendering of a transcript into prompt context
//!
//! The transcript itself grows without limit; what reaches the model is only
//! the most recent slice allowed by a [`ContextWindow`].

use super::turn::{Role, Turn, CONTINUATION_INDENT};
use serde::{Deserialize, Serialize};

/// Rendered in place of history when no turns are selected
pub const EMPTY_HISTORY: &str = "No previous conversation.";

/// Policy bounding how much history is rendered into a prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "limit", rename_all = "snake_case")]
pub enum ContextWindow {
    /// Render every turn
    Unbounded,
    /// Render at most this many of the most recent turns
    Turns(usize),
    /// Render the longest run of recent turns whose rendered text fits in
    /// this many characters, separators included
    Chars(usize),
}

impl Default for ContextWindow {
    fn default() -> Self {
        ContextWindow::Turns(10)
    }
}

impl ContextWindow {
    /// Select the most recent turns allowed by this window
    pub fn select<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        match *self {
            ContextWindow::Unbounded => turns,
            ContextWindow::Turns(n) => &turns[turns.len().saturating_sub(n)..],
            ContextWindow::Chars(limit) => {
                let mut used = 0usize;
                let mut start = turns.len();

                for (i, turn) in turns.iter().enumerate().rev() {
                    let separator = usize::from(start != turns.len());
                    let cost = turn.render().chars().count() + separator;
                    if used + cost > limit {
                        break;
                    }
                    used += cost;
                    start = i;
                }

                &turns[start..]
            }
        }
    }
}

/// Render the selected turns as `"<RoleLabel>: <text>"` lines.
///
/// Returns [`EMPTY_HISTORY`] when nothing is selected, including every
/// zero-sized window.
pub fn render_context(turns: &[Turn], window: ContextWindow) -> String {
    let selected = window.select(turns);
    if selected.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    selected
        .iter()
        .map(Turn::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recover the role sequence from rendered context.
///
/// A line that begins with a role label followed by `": "` starts a new
/// turn. Indented lines continue the previous turn, whatever they contain.
pub fn parse_role_labels(rendered: &str) -> Vec<Role> {
    if rendered == EMPTY_HISTORY {
        return Vec::new();
    }

    rendered
        .lines()
        .filter(|line| !line.starts_with(CONTINUATION_INDENT))
        .filter_map(|line| {
            let (label, _) = line.split_once(": ")?;
            Role::from_label(label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Turn::new(role, format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn test_empty_renders_placeholder() {
        assert_eq!(render_context(&[], ContextWindow::Unbounded), EMPTY_HISTORY);
        assert_eq!(render_context(&[], ContextWindow::Turns(5)), EMPTY_HISTORY);
        assert_eq!(render_context(&[], ContextWindow::Chars(100)), EMPTY_HISTORY);
    }

    #[test]
    fn test_zero_window_renders_placeholder() {
        let history = turns(4);
        assert_eq!(render_context(&history, ContextWindow::Turns(0)), EMPTY_HISTORY);
        assert_eq!(render_context(&history, ContextWindow::Chars(0)), EMPTY_HISTORY);
    }

    #[test]
    fn test_turn_window_keeps_most_recent() {
        let history = turns(12);
        let rendered = render_context(&history, ContextWindow::Turns(10));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "User: message 2");
        assert_eq!(lines[9], "AI: message 11");
        assert!(!lines.contains(&"User: message 0"));
        assert!(!lines.contains(&"AI: message 1"));
    }

    #[test]
    fn test_window_larger_than_history() {
        let history = turns(3);
        let rendered = render_context(&history, ContextWindow::Turns(10));
        assert_eq!(rendered.lines().count(), 3);
        assert_eq!(rendered, render_context(&history, ContextWindow::Unbounded));
    }

    #[test]
    fn test_char_window_fits_limit() {
        let history = turns(6);
        // "AI: message 5" is 13 chars, "User: message 4" is 15, plus a newline
        let rendered = render_context(&history, ContextWindow::Chars(29));
        assert_eq!(rendered, "User: message 4\nAI: message 5");

        let rendered = render_context(&history, ContextWindow::Chars(28));
        assert_eq!(rendered, "AI: message 5");
    }

    #[test]
    fn test_char_window_too_small_for_latest_turn() {
        let history = turns(2);
        assert_eq!(render_context(&history, ContextWindow::Chars(5)), EMPTY_HISTORY);
    }

    #[test]
    fn test_parse_role_labels() {
        let rendered = "User: hi\nAI: hello\nsecond line\nUser: bye";
        assert_eq!(
            parse_role_labels(rendered),
            vec![Role::User, Role::Assistant, Role::User]
        );
        assert!(parse_role_labels(EMPTY_HISTORY).is_empty());
    }

    #[test]
    fn test_multiline_turns_round_trip() {
        let history = vec![
            Turn::new(Role::User, "Write a dialogue"),
            Turn::new(Role::Assistant, "Sure:\nUser: hi\nAI: hello"),
            Turn::new(Role::User, "Thanks"),
        ];
        let rendered = render_context(&history, ContextWindow::Unbounded);

        assert_eq!(
            rendered,
            "User: Write a dialogue\nAI: Sure:\n  User: hi\n  AI: hello\nUser: Thanks"
        );
        assert_eq!(
            parse_role_labels(&rendered),
            vec![Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn test_window_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            window: ContextWindow,
        }

        let parsed: Wrapper =
            toml::from_str("[window]\npolicy = \"chars\"\nlimit = 2000\n").unwrap();
        assert_eq!(parsed.window, ContextWindow::Chars(2000));

        let parsed: Wrapper = toml::from_str("[window]\npolicy = \"unbounded\"\n").unwrap();
        assert_eq!(parsed.window, ContextWindow::Unbounded);
    }
}
