//! Live conversion via search-grounded Gemini
//!
//! The model is asked to look up the current rate, do the multiplication and
//! answer with four labeled lines. Rate and total are pulled out with regexes;
//! a model that ignores the format yields missing fields, not an error.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::error::ConverterError;
use crate::gemini::{ContentGenerator, GenerateRequest, GenerationMode};
use crate::models::{ConversionResult, CurrencyCode};
use crate::Result;

pub const FALLBACK_TEXT: &str = "Sorry, I couldn't retrieve the data.";
pub const INSIGHTS_HEADING: &str = "\n\n**Market Insights:**";

const TEMPERATURE: f32 = 0.7;

lazy_static! {
    static ref RATE_RE: Regex = Regex::new(r"RESULT_RATE:\s*([0-9,.]+)").unwrap();
    static ref TOTAL_RE: Regex = Regex::new(r"RESULT_TOTAL:\s*([0-9,.]+)").unwrap();
    static ref RATE_LINE_RE: Regex = Regex::new(r"RESULT_RATE:.*\n?").unwrap();
    static ref TOTAL_LINE_RE: Regex = Regex::new(r"RESULT_TOTAL:.*\n?").unwrap();
}

/// Convert `amount` of `from` into `to` using a search-grounded model call.
///
/// Every failure is collapsed into [`ConverterError::ConversionFailed`].
pub async fn convert_currency(
    generator: &dyn ContentGenerator,
    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,
) -> Result<ConversionResult> {
    let request = GenerateRequest {
        prompt: build_prompt(amount, from, to),
        mode: GenerationMode::SearchGrounded {
            temperature: TEMPERATURE,
        },
    };

    info!(amount, %from, %to, "Requesting live conversion");

    let content = generator.generate(request).await.map_err(|e| {
        error!(%from, %to, "Gemini conversion error: {}", e);
        ConverterError::ConversionFailed
    })?;

    let text = content
        .text
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TEXT.to_string());

    let result = parse_conversion_text(&text);

    if result.exchange_rate.is_none() || result.calculated_amount.is_none() {
        warn!(
            rate = ?result.exchange_rate,
            total = ?result.calculated_amount,
            "Model response did not follow the labeled format"
        );
    }

    Ok(ConversionResult {
        grounding_chunks: content.grounding_chunks,
        ..result
    })
}

pub fn build_prompt(amount: f64, from: CurrencyCode, to: CurrencyCode) -> String {
    format!(
        r#"I need to convert {amount} {from} to {to}.
1. Search for the current real-time exchange rate for {from} to {to}.
2. Calculate the converted amount.
3. Provide a response in this specific format:
   "RESULT_RATE: [Exchange Rate Number]"
   "RESULT_TOTAL: [Total Converted Amount Number]"
   "SUMMARY: [A natural language sentence describing the conversion and the current rate source date]"
   "INSIGHTS: [Two brief bullet points about recent trends or news affecting this currency pair]"
"#
    )
}

/// Extract rate, total and the cleaned narrative from the raw model text.
/// Grounding chunks are left empty for the caller to fill.
pub fn parse_conversion_text(text: &str) -> ConversionResult {
    let exchange_rate = capture(&RATE_RE, text);
    let calculated_amount = capture(&TOTAL_RE, text);

    ConversionResult {
        rate_text: clean_narrative(text),
        exchange_rate,
        calculated_amount,
        grounding_chunks: vec![],
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop the machine-readable lines and relabel insights for display
pub fn clean_narrative(text: &str) -> String {
    let without_rate = RATE_LINE_RE.replacen(text, 1, "");
    let without_total = TOTAL_LINE_RE.replacen(&without_rate, 1, "");

    without_total
        .replacen("SUMMARY:", "", 1)
        .replacen("INSIGHTS:", INSIGHTS_HEADING, 1)
        .trim()
        .to_string()
}
