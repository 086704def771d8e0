//! Regex intent parsers for the structured question shapes the rule
//! engine understands.
//!
//! The three patterns are the user-facing contract of the parts
//! ledger: total cost, last change date, and has-it-been-changed.
//! They are ad hoc by design; new intents get their own parser rather
//! than being forced into these shapes.

use std::sync::OnceLock;

use regex::Regex;

fn total_cost_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)paljonko\s+(?P<target>.+?)\s+on\s+maksanut\s+yhteensä")
            .expect("total cost pattern is valid")
    })
}

fn last_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)milloin\s+viimeksi\s+(?P<target>.+?)\s+vaihdettiin")
            .expect("last date pattern is valid")
    })
}

fn yes_no_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)onko\s+(?P<target>.+?)\s+vaihdettu").expect("yes/no pattern is valid")
    })
}

fn extract_target(pattern: &Regex, text: &str) -> Option<String> {
    let captures = pattern.captures(text.trim())?;
    Some(captures["target"].trim().to_lowercase())
}

/// "paljonko X on maksanut yhteensä" → X
pub fn parse_total_cost_question(text: &str) -> Option<String> {
    extract_target(total_cost_pattern(), text)
}

/// "milloin viimeksi X vaihdettiin" → X
pub fn parse_last_date_question(text: &str) -> Option<String> {
    extract_target(last_date_pattern(), text)
}

/// "onko X vaihdettu" → X
pub fn parse_yes_no_question(text: &str) -> Option<String> {
    extract_target(yes_no_pattern(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_total_cost_target() {
        let target = parse_total_cost_question("Paljonko jarrupalat on maksanut yhteensä?");
        assert_eq!(target.as_deref(), Some("jarrupalat"));
    }

    #[test]
    fn parses_last_date_target() {
        let target = parse_last_date_question("milloin viimeksi öljynsuodatin vaihdettiin");
        assert_eq!(target.as_deref(), Some("öljynsuodatin"));
    }

    #[test]
    fn parses_yes_no_target_case_insensitively() {
        let target = parse_yes_no_question("ONKO Jakohihna VAIHDETTU?");
        assert_eq!(target.as_deref(), Some("jakohihna"));
    }

    #[test]
    fn multi_word_targets_are_kept_whole() {
        let target = parse_yes_no_question("onko jarrupalat eteen vaihdettu");
        assert_eq!(target.as_deref(), Some("jarrupalat eteen"));
    }

    #[test]
    fn unrelated_questions_do_not_match() {
        assert!(parse_total_cost_question("miten vaihdan öljyt?").is_none());
        assert!(parse_last_date_question("paljonko öljyä moottoriin mahtuu").is_none());
        assert!(parse_yes_no_question("").is_none());
    }
}
