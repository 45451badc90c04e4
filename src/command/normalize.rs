//! Transcript normalization
//!
//! Strips at most one leading wake-phrase alias and recognizes dismissal
//! utterances before anything reaches the dispatcher.

/// Dismissal vocabulary, matched exactly against the stripped command
const DISMISSALS: &[&str] = &[
    "nothing",
    "never mind",
    "nevermind",
    "no thanks",
    "cancel",
    "forget it",
];

/// Normalization outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A command ready for dispatch
    Command(String),
    /// The user dismissed the interaction; acknowledge, do not dispatch
    Dismissed,
    /// Nothing left after stripping; prompt the user to repeat
    Empty,
}

/// Normalize a raw transcript into a dispatchable command
///
/// Lowercases and trims, strips at most one leading alias (first literal
/// prefix match wins), then checks the dismissal vocabulary.
#[must_use]
pub fn normalize(raw: &str, wake_aliases: &[String]) -> Normalized {
    let mut text = raw.trim().to_lowercase();

    for alias in wake_aliases {
        if let Some(rest) = strip_alias(&text, alias) {
            text = rest;
            break;
        }
    }

    let text = text.trim_start_matches([',', '.', '!', '?', ' ']).trim();

    if text.is_empty() {
        return Normalized::Empty;
    }
    if DISMISSALS.contains(&text) {
        return Normalized::Dismissed;
    }

    Normalized::Command(text.to_string())
}

/// Strip `alias` from the front of `text` when it is a whole-word prefix
fn strip_alias(text: &str, alias: &str) -> Option<String> {
    let rest = text.strip_prefix(alias)?;
    // "hey" must not eat the front of "heyday"
    if rest.is_empty() || rest.starts_with([' ', ',', '.', '!', '?']) {
        Some(rest.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> Vec<String> {
        vec!["hey nova".to_string(), "nova".to_string(), "hey".to_string()]
    }

    #[test]
    fn strips_one_leading_alias() {
        assert_eq!(
            normalize("Hey Nova, open chrome", &aliases()),
            Normalized::Command("open chrome".to_string())
        );
    }

    #[test]
    fn first_prefix_match_wins_and_only_one_is_stripped() {
        // "hey nova" strips as a whole; the remaining "nova" is preserved
        assert_eq!(
            normalize("hey nova nova station", &aliases()),
            Normalized::Command("nova station".to_string())
        );
    }

    #[test]
    fn alias_must_be_a_whole_word_prefix() {
        assert_eq!(
            normalize("heyday planner", &aliases()),
            Normalized::Command("heyday planner".to_string())
        );
    }

    #[test]
    fn dismissals_short_circuit() {
        for phrase in ["nothing", "never mind", "no thanks"] {
            let raw = format!("hey nova {phrase}");
            assert_eq!(normalize(&raw, &aliases()), Normalized::Dismissed);
        }
    }

    #[test]
    fn bare_wake_phrase_is_empty() {
        assert_eq!(normalize("hey nova", &aliases()), Normalized::Empty);
        assert_eq!(normalize("   ", &aliases()), Normalized::Empty);
    }

    #[test]
    fn command_is_lowercased_and_trimmed() {
        assert_eq!(
            normalize("  Open CHROME  ", &aliases()),
            Normalized::Command("open chrome".to_string())
        );
    }
}
