//! Review Dashboard: read-only view over stored evaluations.
//!
//! Rows are shown in store order (score descending). Rationale and the raw
//! structured CV are passed through untouched: they are what auditors read.

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::models::evaluation::StoredEvaluation;
use crate::screening::models::APPROVED_DECISION;
use crate::store::EvaluationStore;

pub mod handlers;

pub const EMPTY_NOTICE: &str =
    "No evaluated candidates in the store yet. Run a CV through the screening pipeline first.";
pub const LOAD_FAILED_NOTICE: &str = "Evaluations could not be loaded from the store.";

const PASS_MARKER: &str = "🟢";
const FAIL_MARKER: &str = "🔴";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub approved: usize,
    /// Percentage rounded to one decimal place. `None` when there are no rows.
    pub approval_rate: Option<f64>,
    /// `"66.7%"`, or `"n/a"` when there are no rows.
    pub approval_rate_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub approved: bool,
    pub marker: &'static str,
    pub name: String,
    pub score: i64,
    pub decision: String,
    pub rationale: String,
    pub candidate_data: Value,
    #[serde(skip)]
    pub candidate_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub rows: Vec<DashboardRow>,
    pub notice: Option<String>,
}

/// Case-insensitive match against "Apto". "No Apto" and "Error" do not pass.
pub fn is_approved(decision: &str) -> bool {
    decision.eq_ignore_ascii_case(APPROVED_DECISION)
}

pub fn summarize(rows: &[StoredEvaluation]) -> DashboardSummary {
    let total = rows.len();
    let approved = rows.iter().filter(|r| is_approved(r.decision())).count();
    let approval_rate = if total == 0 {
        None
    } else {
        let rate = approved as f64 / total as f64 * 100.0;
        Some((rate * 10.0).round() / 10.0)
    };
    let approval_rate_label = match approval_rate {
        Some(rate) => format!("{rate:.1}%"),
        None => "n/a".to_string(),
    };
    DashboardSummary {
        total,
        approved,
        approval_rate,
        approval_rate_label,
    }
}

pub fn build_view(rows: &[StoredEvaluation]) -> DashboardView {
    let summary = summarize(rows);
    let notice = rows.is_empty().then(|| EMPTY_NOTICE.to_string());
    let rows = rows.iter().map(to_row).collect();
    DashboardView {
        summary,
        rows,
        notice,
    }
}

/// Reads every row from the store. A failed read is logged and shown as "no data".
pub async fn load_dashboard(store: &dyn EvaluationStore) -> DashboardView {
    match store.list_by_score().await {
        Ok(rows) => build_view(&rows),
        Err(e) => {
            error!("Failed to load evaluations: {e}");
            let mut view = build_view(&[]);
            view.notice = Some(LOAD_FAILED_NOTICE.to_string());
            view
        }
    }
}

fn to_row(row: &StoredEvaluation) -> DashboardRow {
    let approved = is_approved(row.decision());
    let candidate_data = row.candidate_data();
    let candidate_json =
        serde_json::to_string_pretty(&candidate_data).unwrap_or_else(|_| candidate_data.to_string());
    DashboardRow {
        approved,
        marker: if approved { PASS_MARKER } else { FAIL_MARKER },
        name: row.name().to_string(),
        score: row.score(),
        decision: row.decision().to_string(),
        rationale: row.rationale().to_string(),
        candidate_data,
        candidate_json,
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    let s = &view.summary;
    let _ = writeln!(out, "Total candidates:  {}", s.total);
    let _ = writeln!(out, "Approved (Apto):   {}", s.approved);
    let _ = writeln!(out, "Approval rate:     {}", s.approval_rate_label);

    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "\n{notice}");
    }

    for row in &view.rows {
        let _ = writeln!(out, "\n{} {} - Score: {}/100", row.marker, row.name, row.score);
        let _ = writeln!(out, "Decision: {}", row.decision);
        let _ = writeln!(out, "Rationale:\n{}", row.rationale);
        let _ = writeln!(out, "Structured CV:\n{}", row.candidate_json);
    }
    out
}
