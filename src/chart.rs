//! Trend chart shaping
//!
//! Turns a [`HistoryResult`] into rows ready for a two-axis area chart and
//! draws a plain-text version for the terminal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{CurrencyPair, HistoryPoint, HistoryResult};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub date: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendChart {
    pub pair: CurrencyPair,
    pub compare_pair: Option<CurrencyPair>,
    pub rows: Vec<ChartRow>,
    pub analysis: String,
    pub compare_analysis: Option<String>,
    pub has_comparison: bool,
}

impl TrendChart {
    /// `None` when there is nothing to plot; the chart area is omitted then
    pub fn from_history(
        history: &HistoryResult,
        pair: CurrencyPair,
        compare_pair: Option<CurrencyPair>,
    ) -> Option<Self> {
        if history.data.is_empty() {
            return None;
        }

        let compare_data = history
            .compare_data
            .as_deref()
            .filter(|d| !d.is_empty());

        let rows = merge_series(&history.data, compare_data);
        let has_comparison = compare_data.is_some() && compare_pair.is_some();

        Some(Self {
            pair,
            compare_pair: if has_comparison { compare_pair } else { None },
            rows,
            analysis: history.analysis.clone(),
            compare_analysis: if has_comparison {
                history.compare_analysis.clone()
            } else {
                None
            },
            has_comparison,
        })
    }

    pub fn primary_extent(&self) -> Option<(f64, f64)> {
        extent(self.rows.iter().map(|r| r.rate))
    }

    pub fn compare_extent(&self) -> Option<(f64, f64)> {
        if !self.has_comparison {
            return None;
        }
        extent(self.rows.iter().filter_map(|r| r.compare_rate))
    }

    /// Terminal rendering: one sparkline per series, each on its own scale
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let primary: Vec<f64> = self.rows.iter().map(|r| r.rate).collect();
        push_series(&mut out, "●", &self.pair.to_string(), &primary, Some(&self.analysis));

        if let (true, Some(compare_pair)) = (self.has_comparison, self.compare_pair) {
            let compare: Vec<f64> = self.rows.iter().filter_map(|r| r.compare_rate).collect();
            push_series(
                &mut out,
                "◆",
                &compare_pair.to_string(),
                &compare,
                self.compare_analysis.as_ref(),
            );
        }

        if let (Some(first), Some(last)) = (self.rows.first(), self.rows.last()) {
            out.push_str(&format!(
                "  {} … {}\n",
                tick_label(&first.date),
                tick_label(&last.date)
            ));
        }

        out
    }
}

/// Pair the comparison series with the primary one by position
fn merge_series(data: &[HistoryPoint], compare: Option<&[HistoryPoint]>) -> Vec<ChartRow> {
    data.iter()
        .enumerate()
        .map(|(i, point)| {
            let other = compare.and_then(|c| c.get(i));
            ChartRow {
                date: point.date.clone(),
                rate: point.rate,
                compare_rate: other.map(|p| p.rate),
                compare_date: other.map(|p| p.date.clone()),
            }
        })
        .collect()
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn push_series(out: &mut String, marker: &str, label: &str, values: &[f64], analysis: Option<&String>) {
    out.push_str(&format!("{} {}", marker, label));
    if let (Some(first), Some(last)) = (values.first(), values.last()) {
        out.push_str(&format!("  {} → {}", format_rate(*first), format_rate(*last)));
    }
    out.push('\n');
    out.push_str(&format!("  {}\n", sparkline(values)));
    if let Some(text) = analysis.filter(|a| !a.is_empty()) {
        out.push_str(&format!("  {}\n", text));
    }
}

pub fn sparkline(values: &[f64]) -> String {
    let Some((lo, hi)) = extent(values.iter().copied()) else {
        return String::new();
    };
    let span = hi - lo;
    let top = SPARK_LEVELS.len() - 1;

    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return ' ';
            }
            if span <= f64::EPSILON {
                return SPARK_LEVELS[top / 2];
            }
            let level = (((v - lo) / span) * top as f64).round() as usize;
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}

/// `2024-06-03` → `06/03`
pub fn tick_label(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%m/%d").to_string(),
        Err(_) => date.split('-').skip(1).collect::<Vec<_>>().join("/"),
    }
}

pub fn format_rate(value: f64) -> String {
    format!("{:.4}", value)
}
