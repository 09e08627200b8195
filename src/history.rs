//! Historical trend series from model knowledge
//!
//! No search grounding here: the 14-day series is synthesized by the model and
//! is illustrative only. Failures never propagate; the caller gets an empty
//! series with a placeholder analysis instead.

use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::gemini::{ContentGenerator, GenerateRequest, GenerationMode};
use crate::models::{CurrencyCode, CurrencyPair, HistoryResult};
use crate::Result;

pub const HISTORY_DAYS: usize = 14;
pub const UNAVAILABLE_ANALYSIS: &str = "Could not load historical data.";

/// Fetch the daily series for `from/to`, plus a second series when `compare` is set.
pub async fn historical_trends(
    generator: &dyn ContentGenerator,
    from: CurrencyCode,
    to: CurrencyCode,
    compare: Option<CurrencyPair>,
) -> HistoryResult {
    let pair = CurrencyPair::new(from, to);

    match fetch_history(generator, pair, compare).await {
        Ok(result) => {
            info!(
                %pair,
                points = result.data.len(),
                compare_points = result.compare_data.as_ref().map(Vec::len).unwrap_or(0),
                "Historical trends loaded"
            );
            result
        }
        Err(e) => {
            error!(%pair, "Gemini history error: {}", e);
            unavailable()
        }
    }
}

/// The degraded result used for every history failure
pub fn unavailable() -> HistoryResult {
    HistoryResult {
        data: vec![],
        analysis: UNAVAILABLE_ANALYSIS.to_string(),
        compare_data: None,
        compare_analysis: None,
    }
}

async fn fetch_history(
    generator: &dyn ContentGenerator,
    pair: CurrencyPair,
    compare: Option<CurrencyPair>,
) -> Result<HistoryResult> {
    let request = GenerateRequest {
        prompt: build_prompt(pair, compare),
        mode: GenerationMode::Structured {
            schema: response_schema(compare.is_some()),
        },
    };

    let content = generator.generate(request).await?;
    let text = content.text.unwrap_or_else(|| "{}".to_string());

    parse_history_response(&text, compare.is_some())
}

pub fn build_prompt(pair: CurrencyPair, compare: Option<CurrencyPair>) -> String {
    match compare {
        Some(other) => format!(
            r#"Generate a JSON dataset representing the daily exchange rate closing values for two pairs:
1. {} to {} (field: data)
2. {} to {} (field: compareData)
For the past {} days.
The data should be realistic based on your training data.
Provide a brief 1-sentence analysis for each trend."#,
            pair.from, pair.to, other.from, other.to, HISTORY_DAYS
        ),
        None => format!(
            r#"Generate a JSON dataset representing the daily exchange rate closing values for {} to {} for the past {} days.
The data should be realistic based on your training data.
Also provide a brief 1-sentence analysis of the trend."#,
            pair.from, pair.to, HISTORY_DAYS
        ),
    }
}

fn series_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": { "type": "STRING", "description": "YYYY-MM-DD" },
                "rate": { "type": "NUMBER" }
            },
            "required": ["date", "rate"]
        }
    })
}

/// Response schema; the comparison fields are declared only when comparing
pub fn response_schema(comparing: bool) -> Value {
    let mut properties = Map::new();
    properties.insert("data".to_string(), series_schema());
    properties.insert("analysis".to_string(), json!({ "type": "STRING" }));

    let mut required = vec!["data", "analysis"];

    if comparing {
        properties.insert("compareData".to_string(), series_schema());
        properties.insert("compareAnalysis".to_string(), json!({ "type": "STRING" }));
        required.extend(["compareData", "compareAnalysis"]);
    }

    json!({
        "type": "OBJECT",
        "properties": Value::Object(properties),
        "required": required,
    })
}

/// Strip code fences and decode. Comparison fields are discarded unless requested.
pub fn parse_history_response(text: &str, comparing: bool) -> Result<HistoryResult> {
    let cleaned = strip_code_fences(text);
    let mut result: HistoryResult = serde_json::from_str(&cleaned)?;

    if !comparing {
        result.compare_data = None;
        result.compare_analysis = None;
    }

    Ok(result)
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGenerator, ScriptedReply};

    fn series_json(days: usize, base: f64) -> Value {
        Value::Array(
            (1..=days)
                .map(|d| json!({ "date": format!("2024-06-{:02}", d), "rate": base + d as f64 / 1000.0 }))
                .collect(),
        )
    }

    #[test]
    fn test_schema_single_series() {
        let schema = response_schema(false);
        assert!(schema["properties"].get("compareData").is_none());
        assert_eq!(schema["required"], json!(["data", "analysis"]));
        assert_eq!(schema["properties"]["data"]["items"]["required"], json!(["date", "rate"]));
    }

    #[test]
    fn test_schema_with_comparison() {
        let schema = response_schema(true);
        assert_eq!(schema["properties"]["compareData"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["compareAnalysis"]["type"], "STRING");
        assert_eq!(
            schema["required"],
            json!(["data", "analysis", "compareData", "compareAnalysis"])
        );
    }

    #[test]
    fn test_prompt_variants() {
        let pair = CurrencyPair::new(CurrencyCode::USD, CurrencyCode::EUR);
        let single = build_prompt(pair, None);
        assert!(single.contains("USD to EUR for the past 14 days"));
        assert!(!single.contains("compareData"));

        let compare = CurrencyPair::new(CurrencyCode::GBP, CurrencyCode::USD);
        let double = build_prompt(pair, Some(compare));
        assert!(double.contains("GBP to USD (field: compareData)"));
    }

    #[test]
    fn test_strip_code_fences() {
        let fenced = "```json\n{\"data\":[],\"analysis\":\"x\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"data\":[],\"analysis\":\"x\"}");
    }

    #[test]
    fn test_stray_comparison_fields_dropped() {
        let body = json!({
            "data": series_json(2, 1.0),
            "analysis": "Up.",
            "compareData": series_json(2, 2.0),
            "compareAnalysis": "Down."
        })
        .to_string();

        let result = parse_history_response(&body, false).unwrap();
        assert!(result.compare_data.is_none());
        assert!(result.compare_analysis.is_none());
    }

    #[tokio::test]
    async fn test_single_series_has_no_comparison() {
        let body = json!({ "data": series_json(14, 1.08), "analysis": "EUR firmed slightly." });
        let generator = MockGenerator::new([ScriptedReply::text(body.to_string())]);

        let result =
            historical_trends(&generator, CurrencyCode::USD, CurrencyCode::EUR, None).await;

        assert_eq!(result.data.len(), 14);
        assert_eq!(result.data[0].date, "2024-06-01");
        assert!(result.compare_data.is_none());

        let requests = generator.requests();
        assert!(matches!(requests[0].mode, GenerationMode::Structured { .. }));
    }

    #[tokio::test]
    async fn test_comparison_series_parsed_from_fenced_text() {
        let body = json!({
            "data": series_json(14, 1.08),
            "analysis": "EUR firmed.",
            "compareData": series_json(14, 1.27),
            "compareAnalysis": "GBP steady."
        });
        let fenced = format!("```json\n{}\n```", body);
        let generator = MockGenerator::new([ScriptedReply::text(fenced)]);

        let compare = CurrencyPair::new(CurrencyCode::GBP, CurrencyCode::USD);
        let result =
            historical_trends(&generator, CurrencyCode::USD, CurrencyCode::EUR, Some(compare))
                .await;

        assert_eq!(result.compare_data.as_ref().map(Vec::len), Some(14));
        assert_eq!(result.compare_analysis.as_deref(), Some("GBP steady."));
    }

    #[tokio::test]
    async fn test_malformed_json_degrades() {
        let generator = MockGenerator::new([ScriptedReply::text("The rate went up, trust me.")]);

        let result =
            historical_trends(&generator, CurrencyCode::USD, CurrencyCode::EUR, None).await;

        assert_eq!(result, unavailable());
        assert_eq!(result.analysis, "Could not load historical data.");
        assert!(result.data.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_identically() {
        let generator = MockGenerator::new([ScriptedReply::fail("connection reset")]);

        let result =
            historical_trends(&generator, CurrencyCode::BTC, CurrencyCode::USD, None).await;

        assert_eq!(result, unavailable());
    }

    #[tokio::test]
    async fn test_missing_text_degrades() {
        let generator = MockGenerator::new([ScriptedReply::Text {
            text: None,
            grounding_chunks: vec![],
        }]);

        let result =
            historical_trends(&generator, CurrencyCode::USD, CurrencyCode::JPY, None).await;

        assert_eq!(result, unavailable());
    }
}
