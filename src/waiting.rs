//! Heuristic "is this session blocked on a human?" classifier.
//!
//! An unapologetic best-effort check over the tail of captured pane text.
//! False positives and negatives are expected; the only guarantees are
//! determinism, purity, and a fixed check order (first match wins).

type Check = fn(&str) -> bool;

/// Ordered pattern checks. The order is load-bearing: callers rely on the
/// short-circuit behavior staying stable.
const CHECKS: &[Check] = &[
    ends_with_question_mark,
    ends_with_yes_no,
    prompts_proceed,
    prompts_continue,
    mentions_enter_key,
    mentions_input_field,
    ends_with_angle_prompt,
    ends_with_dollar_prompt,
];

/// Decide whether recent pane output looks like an idle prompt awaiting
/// human input.
pub fn is_waiting_for_input(output: &str) -> bool {
    CHECKS.iter().any(|check| check(output))
}

fn ends_with_question_mark(text: &str) -> bool {
    text.trim_end().ends_with('?')
}

/// A trailing `y/n` token, each letter case-insensitive.
fn ends_with_yes_no(text: &str) -> bool {
    let tail = text.trim_end().as_bytes();
    let [.., y, slash, n] = tail else { return false };
    y.eq_ignore_ascii_case(&b'y') && *slash == b'/' && n.eq_ignore_ascii_case(&b'n')
}

fn prompts_proceed(text: &str) -> bool {
    word_then_question_mark(text, "proceed")
}

fn prompts_continue(text: &str) -> bool {
    word_then_question_mark(text, "continue")
}

/// `word`, optional whitespace, then `?`, anywhere in the text. The word
/// match is case-insensitive.
fn word_then_question_mark(text: &str, word: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .match_indices(word)
        .any(|(idx, _)| lower[idx + word.len()..].trim_start().starts_with('?'))
}

/// The literal word `Enter` followed by a whitespace character, anywhere.
fn mentions_enter_key(text: &str) -> bool {
    text.match_indices("Enter")
        .any(|(idx, m)| text[idx + m.len()..].chars().next().is_some_and(char::is_whitespace))
}

/// `Input`, optional whitespace, then `:`, anywhere.
fn mentions_input_field(text: &str) -> bool {
    text.match_indices("Input")
        .any(|(idx, m)| text[idx + m.len()..].trim_start().starts_with(':'))
}

fn ends_with_angle_prompt(text: &str) -> bool {
    text.trim_end().ends_with('>')
}

fn ends_with_dollar_prompt(text: &str) -> bool {
    text.trim_end().ends_with('$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_question_mark() {
        assert!(is_waiting_for_input("Apply these changes?"));
        assert!(is_waiting_for_input("Apply these changes?  \n"));
    }

    #[test]
    fn trailing_yes_no_token() {
        assert!(is_waiting_for_input("Overwrite file y/n"));
        assert!(is_waiting_for_input("Overwrite file Y/N \n"));
        assert!(is_waiting_for_input("Overwrite file y/N"));
    }

    #[test]
    fn yes_no_must_be_trailing() {
        assert!(!is_waiting_for_input("typed y/n earlier, now working..."));
    }

    #[test]
    fn proceed_prompt_anywhere() {
        assert!(is_waiting_for_input("Proceed? [default: yes]\nsome tail text."));
        assert!(is_waiting_for_input("proceed ? then more output."));
        assert!(is_waiting_for_input("PROCEED\t? tail."));
    }

    #[test]
    fn continue_prompt_anywhere() {
        assert!(is_waiting_for_input("Continue? 1 of 3 hunks applied."));
        assert!(is_waiting_for_input("continue  ? more lines follow."));
    }

    #[test]
    fn proceed_without_question_mark_is_not_a_prompt() {
        assert!(!is_waiting_for_input("proceeding with the build."));
        assert!(!is_waiting_for_input("will continue in the background."));
    }

    #[test]
    fn enter_key_mention() {
        assert!(is_waiting_for_input("Press Enter to accept the default."));
        assert!(is_waiting_for_input("Enter\nyour choice below."));
    }

    #[test]
    fn enter_is_case_sensitive_and_needs_whitespace() {
        assert!(!is_waiting_for_input("press enter to accept."));
        assert!(!is_waiting_for_input("re-Entered the main loop."));
    }

    #[test]
    fn input_field_mention() {
        assert!(is_waiting_for_input("Input: name of the branch."));
        assert!(is_waiting_for_input("Input : value required."));
    }

    #[test]
    fn shell_style_prompts() {
        assert!(is_waiting_for_input("$ "));
        assert!(is_waiting_for_input("user@host:~/src$"));
        assert!(is_waiting_for_input(">"));
        assert!(is_waiting_for_input("mysql> \n"));
    }

    #[test]
    fn busy_output_is_not_waiting() {
        assert!(!is_waiting_for_input("done.\n"));
        assert!(!is_waiting_for_input("compiling crate 3 of 12..."));
        assert!(!is_waiting_for_input(""));
    }

    #[test]
    fn classifier_is_deterministic() {
        let sample = "Proceed? later output\ndone.";
        let first = is_waiting_for_input(sample);
        for _ in 0..10 {
            assert_eq!(is_waiting_for_input(sample), first);
        }
    }
}
