//! Deterministic rule engine over the parts ledger.
//!
//! Intercepts structured questions before semantic retrieval runs.
//! Each intent is its own [`IntentRule`]; the engine asks them in order
//! and the first match wins.

pub mod intent;
pub mod parts;

use parts::PartsLedger;

/// Answer produced by a matched rule, with a tag naming the intent.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleAnswer {
    pub answer: String,
    pub kind: &'static str,
}

/// Capability for one structured-question intent.
pub trait IntentRule: Send + Sync {
    fn try_match(&self, question: &str, ledger: &PartsLedger) -> Option<RuleAnswer>;
}

/// "paljonko X on maksanut yhteensä"
struct TotalCostRule;

impl IntentRule for TotalCostRule {
    fn try_match(&self, question: &str, ledger: &PartsLedger) -> Option<RuleAnswer> {
        let target = intent::parse_total_cost_question(question)?;
        let summary = ledger.total_cost(&target);
        Some(RuleAnswer {
            answer: format!("{:.2} € ({} osumaa)", summary.total_eur, summary.matches),
            kind: "parts_cost",
        })
    }
}

/// "milloin viimeksi X vaihdettiin"
struct LastDateRule;

impl IntentRule for LastDateRule {
    fn try_match(&self, question: &str, ledger: &PartsLedger) -> Option<RuleAnswer> {
        let target = intent::parse_last_date_question(question)?;
        let summary = ledger.last_change_date(&target);
        let answer = match summary.date {
            Some(date) => format!(
                "Viimeksi vaihdettu {} ({} merkintää).",
                date, summary.matches
            ),
            None => format!("Ei päivämäärää löytynyt osalle '{}'.", summary.target),
        };
        Some(RuleAnswer {
            answer,
            kind: "parts_last_date",
        })
    }
}

/// "onko X vaihdettu"
struct YesNoChangedRule;

impl IntentRule for YesNoChangedRule {
    fn try_match(&self, question: &str, ledger: &PartsLedger) -> Option<RuleAnswer> {
        let target = intent::parse_yes_no_question(question)?;
        let summary = ledger.changed(&target);

        let answer = if !summary.changed {
            format!("Ei. Osaa '{}' ei ole vaihdettu.", summary.target)
        } else {
            match summary.last_date {
                Some(date) => format!(
                    "Kyllä. Viimeksi vaihdettu {} ({} merkintää).",
                    date, summary.matches
                ),
                None => format!(
                    "Kyllä. Vaihdettu {} kertaa, mutta päivämäärä puuttuu.",
                    summary.matches
                ),
            }
        };

        Some(RuleAnswer {
            answer,
            kind: "parts_yes_no",
        })
    }
}

/// Ordered collection of intent rules.
pub struct RuleEngine {
    rules: Vec<Box<dyn IntentRule>>,
}

impl RuleEngine {
    pub fn with_default_rules() -> Self {
        RuleEngine {
            rules: vec![
                Box::new(TotalCostRule),
                Box::new(LastDateRule),
                Box::new(YesNoChangedRule),
            ],
        }
    }

    /// Run the question through every rule in order; first match wins.
    pub fn try_match(&self, question: &str, ledger: &PartsLedger) -> Option<RuleAnswer> {
        let question = question.trim();
        self.rules
            .iter()
            .find_map(|rule| rule.try_match(question, ledger))
    }
}

#[cfg(test)]
mod tests {
    use super::parts::PartRow;
    use super::*;

    fn ledger() -> PartsLedger {
        PartsLedger::new(vec![
            PartRow {
                id: 1,
                date: Some("2024-02-03".to_string()),
                part: "jarrupalat eteen".to_string(),
                cost: Some(89.90),
                notes: None,
            },
            PartRow {
                id: 2,
                date: None,
                part: "sytytystulpat".to_string(),
                cost: Some(35.00),
                notes: None,
            },
        ])
    }

    #[test]
    fn total_cost_question_answers_with_sum_and_match_count() {
        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("paljonko jarrupalat on maksanut yhteensä", &ledger())
            .unwrap();

        assert_eq!(answer.kind, "parts_cost");
        assert_eq!(answer.answer, "89.90 € (1 osumaa)");
    }

    #[test]
    fn last_date_question_reports_the_date() {
        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("milloin viimeksi jarrupalat vaihdettiin?", &ledger())
            .unwrap();

        assert_eq!(answer.kind, "parts_last_date");
        assert_eq!(answer.answer, "Viimeksi vaihdettu 2024-02-03 (1 merkintää).");
    }

    #[test]
    fn last_date_answer_counts_only_dated_entries() {
        let ledger = PartsLedger::new(vec![
            PartRow {
                id: 1,
                date: Some("2024-02-03".to_string()),
                part: "jarrupalat eteen".to_string(),
                cost: Some(89.90),
                notes: None,
            },
            PartRow {
                id: 2,
                date: Some("ei tiedossa".to_string()),
                part: "jarrupalat taakse".to_string(),
                cost: Some(74.50),
                notes: None,
            },
        ]);

        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("milloin viimeksi jarrupalat vaihdettiin", &ledger)
            .unwrap();

        assert_eq!(answer.answer, "Viimeksi vaihdettu 2024-02-03 (1 merkintää).");
    }

    #[test]
    fn last_date_answer_without_any_date_names_the_part() {
        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("milloin viimeksi sytytystulpat vaihdettiin", &ledger())
            .unwrap();

        assert_eq!(
            answer.answer,
            "Ei päivämäärää löytynyt osalle 'sytytystulpat'."
        );
    }

    #[test]
    fn yes_no_question_without_date_mentions_missing_date() {
        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("onko sytytystulpat vaihdettu", &ledger())
            .unwrap();

        assert_eq!(answer.kind, "parts_yes_no");
        assert_eq!(
            answer.answer,
            "Kyllä. Vaihdettu 1 kertaa, mutta päivämäärä puuttuu."
        );
    }

    #[test]
    fn yes_no_question_for_unknown_part_is_negative() {
        let engine = RuleEngine::with_default_rules();
        let answer = engine
            .try_match("onko turboahdin vaihdettu", &ledger())
            .unwrap();

        assert_eq!(answer.answer, "Ei. Osaa 'turboahdin' ei ole vaihdettu.");
    }

    #[test]
    fn free_form_questions_fall_through_to_retrieval() {
        let engine = RuleEngine::with_default_rules();
        assert!(engine
            .try_match("miten ilmastointi huolletaan?", &ledger())
            .is_none());
    }
}
