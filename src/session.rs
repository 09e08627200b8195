//! Converter session
//!
//! Holds the form selections and the last results, and runs the two flows in
//! order: conversion first, history once the conversion has settled.
//! Mutated only through `&mut self`; there is no cancellation, so a caller that
//! fires overlapping submits on separate sessions may see stale results.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chart::TrendChart;
use crate::conversion::convert_currency;
use crate::error::ConverterError;
use crate::gemini::ContentGenerator;
use crate::history::historical_trends;
use crate::models::{ConversionResult, CurrencyCode, CurrencyPair, HistoryResult};
use crate::Result;

pub const NO_TOTAL_LABEL: &str = "Conversion Complete";
pub const UNTITLED_SOURCE: &str = "Source";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Converting,
    LoadingHistory,
}

/// A citation that is safe to render as a link
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceLink {
    pub uri: String,
    pub title: String,
}

/// Everything a front end needs after a submit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub amount: f64,
    pub pair: CurrencyPair,
    pub compare_pair: Option<CurrencyPair>,
    pub conversion: Option<ConversionResult>,
    pub formatted_total: Option<String>,
    pub rate_caption: Option<String>,
    pub sources: Vec<SourceLink>,
    pub history: Option<HistoryResult>,
    pub chart: Option<TrendChart>,
    pub error: Option<String>,
}

pub struct ConverterSession {
    generator: Arc<dyn ContentGenerator>,

    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,

    comparing: bool,
    compare_from: CurrencyCode,
    compare_to: CurrencyCode,

    conversion: Option<ConversionResult>,
    history: Option<HistoryResult>,
    error: Option<String>,
    phase: Phase,
}

impl ConverterSession {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator,
            amount: 1.0,
            from: CurrencyCode::USD,
            to: CurrencyCode::EUR,
            comparing: false,
            compare_from: CurrencyCode::GBP,
            compare_to: CurrencyCode::USD,
            conversion: None,
            history: None,
            error: None,
            phase: Phase::Idle,
        }
    }

    // =============================
    // Form state
    // =============================

    /// Apply raw text from the amount field.
    ///
    /// `-`, `e` and `E` are refused outright; an empty field means zero; anything
    /// else that is not a number leaves the current amount in place.
    pub fn set_amount_input(&mut self, input: &str) -> Result<f64> {
        if input.contains(&['-', 'e', 'E'][..]) {
            return Err(ConverterError::InvalidAmount(input.to_string()));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            self.amount = 0.0;
            return Ok(self.amount);
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.amount = value.abs();
                Ok(self.amount)
            }
            _ => Err(ConverterError::InvalidAmount(input.to_string())),
        }
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }

    pub fn set_from(&mut self, code: CurrencyCode) {
        self.from = code;
    }

    pub fn set_to(&mut self, code: CurrencyCode) {
        self.to = code;
    }

    pub fn set_compare_from(&mut self, code: CurrencyCode) {
        self.compare_from = code;
    }

    pub fn set_compare_to(&mut self, code: CurrencyCode) {
        self.compare_to = code;
    }

    pub fn toggle_compare(&mut self) -> bool {
        self.comparing = !self.comparing;
        self.comparing
    }

    pub fn set_comparing(&mut self, comparing: bool) {
        self.comparing = comparing;
    }

    /// Exchange the primary currencies and forget previous results
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.conversion = None;
        self.history = None;
    }

    // =============================
    // Submit
    // =============================

    /// Run conversion, then history. Returns `false` without issuing any
    /// request when the amount is not positive.
    pub async fn submit(&mut self) -> bool {
        if self.amount.is_nan() || self.amount <= 0.0 {
            warn!(amount = self.amount, "Ignoring submit with non-positive amount");
            return false;
        }

        self.error = None;
        self.conversion = None;
        self.history = None;

        let pair = self.pair();
        let compare = self.compare_pair();

        info!(amount = self.amount, %pair, compare = ?compare.map(|c| c.to_string()), "Submitting conversion");

        self.phase = Phase::Converting;
        match convert_currency(self.generator.as_ref(), self.amount, pair.from, pair.to).await {
            Ok(result) => self.conversion = Some(result),
            Err(e) => self.error = Some(e.to_string()),
        }

        self.phase = Phase::LoadingHistory;
        let history = historical_trends(self.generator.as_ref(), pair.from, pair.to, compare).await;
        self.history = Some(history);

        self.phase = Phase::Idle;
        true
    }

    // =============================
    // Accessors
    // =============================

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from, self.to)
    }

    /// The second pair, only while comparison is switched on
    pub fn compare_pair(&self) -> Option<CurrencyPair> {
        self.comparing
            .then(|| CurrencyPair::new(self.compare_from, self.compare_to))
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn conversion(&self) -> Option<&ConversionResult> {
        self.conversion.as_ref()
    }

    pub fn history(&self) -> Option<&HistoryResult> {
        self.history.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn visible_sources(&self) -> Vec<SourceLink> {
        self.conversion
            .as_ref()
            .map(|c| visible_sources(&c.grounding_chunks))
            .unwrap_or_default()
    }

    pub fn formatted_total(&self) -> Option<String> {
        let conversion = self.conversion.as_ref()?;
        let total = conversion
            .calculated_amount
            .as_deref()
            .and_then(parse_decimal)
            .map(|v| format!("{} {}", format_amount(v), self.to));

        Some(total.unwrap_or_else(|| NO_TOTAL_LABEL.to_string()))
    }

    pub fn rate_caption(&self) -> Option<String> {
        let rate = self.conversion.as_ref()?.exchange_rate.as_deref()?;
        Some(format!("1 {} ≈ {} {}", self.from, rate, self.to))
    }

    pub fn chart(&self) -> Option<TrendChart> {
        TrendChart::from_history(self.history.as_ref()?, self.pair(), self.compare_pair())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            amount: self.amount,
            pair: self.pair(),
            compare_pair: self.compare_pair(),
            conversion: self.conversion.clone(),
            formatted_total: self.formatted_total(),
            rate_caption: self.rate_caption(),
            sources: self.visible_sources(),
            history: self.history.clone(),
            chart: self.chart(),
            error: self.error.clone(),
        }
    }
}

/// Keep only citations that carry a usable link
pub fn visible_sources(chunks: &[crate::models::GroundingChunk]) -> Vec<SourceLink> {
    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.as_deref().filter(|u| !u.trim().is_empty())?;
            Some(SourceLink {
                uri: uri.to_string(),
                title: web
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
            })
        })
        .collect()
}

/// Lenient decimal parse; thousands separators are ignored
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Grouped thousands, at most two fraction digits, no trailing zeros
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}
