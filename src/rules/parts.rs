//! Parts ledger: structured rows plus the aggregations the rule engine
//! answers from.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct PartRow {
    pub id: i64,
    pub date: Option<String>,
    pub part: String,
    pub cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub target: String,
    pub matches: usize,
    pub total_eur: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastDateSummary {
    pub target: String,
    pub date: Option<NaiveDate>,
    pub matches: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSummary {
    pub target: String,
    pub changed: bool,
    pub matches: usize,
    pub last_date: Option<NaiveDate>,
}

/// In-memory parts ledger, loaded once at startup.
///
/// Matching is token-based substring filtering: a row matches a target
/// when its lowercased part name contains every whitespace-separated
/// token of the lowercased target.
pub struct PartsLedger {
    rows: Vec<PartRow>,
    parts_lc: Vec<String>,
}

impl PartsLedger {
    pub fn new(rows: Vec<PartRow>) -> Self {
        let parts_lc = rows
            .iter()
            .map(|row| row.part.trim().to_lowercase())
            .collect();
        PartsLedger { rows, parts_lc }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn matching_rows(&self, target: &str) -> Vec<&PartRow> {
        let tokens: Vec<String> = target
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        self.rows
            .iter()
            .zip(&self.parts_lc)
            .filter(|(_, part_lc)| tokens.iter().all(|tok| part_lc.contains(tok)))
            .map(|(row, _)| row)
            .collect()
    }

    /// Sum of costs over matching rows; missing costs count as zero.
    pub fn total_cost(&self, target: &str) -> CostSummary {
        let target_lc = target.trim().to_lowercase();
        if target_lc.is_empty() {
            return CostSummary {
                target: target_lc,
                matches: 0,
                total_eur: 0.0,
            };
        }

        let hits = self.matching_rows(&target_lc);
        let total = hits.iter().filter_map(|row| row.cost).sum();

        CostSummary {
            target: target_lc,
            matches: hits.len(),
            total_eur: total,
        }
    }

    /// Most recent parseable change date among matching rows.
    ///
    /// Rows with missing or unparseable dates are dropped before the
    /// count, so `matches` reports dated entries only.
    pub fn last_change_date(&self, target: &str) -> LastDateSummary {
        let target_lc = target.trim().to_lowercase();
        if target_lc.is_empty() {
            return LastDateSummary {
                target: target_lc,
                date: None,
                matches: 0,
            };
        }

        let dates: Vec<NaiveDate> = self
            .matching_rows(&target_lc)
            .iter()
            .filter_map(|row| parse_date(row))
            .collect();

        LastDateSummary {
            target: target_lc,
            date: dates.iter().copied().max(),
            matches: dates.len(),
        }
    }

    /// Has this part ever been changed, and if so when last.
    pub fn changed(&self, target: &str) -> ChangeSummary {
        let target_lc = target.trim().to_lowercase();
        if target_lc.is_empty() {
            return ChangeSummary {
                target: target_lc,
                changed: false,
                matches: 0,
                last_date: None,
            };
        }

        let hits = self.matching_rows(&target_lc);
        let last_date = hits.iter().filter_map(|row| parse_date(row)).max();

        ChangeSummary {
            target: target_lc,
            changed: !hits.is_empty(),
            matches: hits.len(),
            last_date,
        }
    }
}

fn parse_date(row: &PartRow) -> Option<NaiveDate> {
    let raw = row.date.as_deref()?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
