//! Core data models for the currency converter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConverterError;

//
// ================= Currencies =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CurrencyCode {
    USD,
    EUR,
    JPY,
    GBP,
    AUD,
    CAD,
    CHF,
    CNY,
    INR,
    SGD,
    BTC,
    ETH,
}

impl CurrencyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::USD => "USD",
            CurrencyCode::EUR => "EUR",
            CurrencyCode::JPY => "JPY",
            CurrencyCode::GBP => "GBP",
            CurrencyCode::AUD => "AUD",
            CurrencyCode::CAD => "CAD",
            CurrencyCode::CHF => "CHF",
            CurrencyCode::CNY => "CNY",
            CurrencyCode::INR => "INR",
            CurrencyCode::SGD => "SGD",
            CurrencyCode::BTC => "BTC",
            CurrencyCode::ETH => "ETH",
        }
    }

    /// Display metadata from the static currency table
    pub fn option(&self) -> &'static CurrencyOption {
        CURRENCIES
            .iter()
            .find(|c| c.code == *self)
            .unwrap_or(&CURRENCIES[0])
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CURRENCIES
            .iter()
            .map(|c| c.code)
            .find(|code| code.as_str() == upper)
            .ok_or_else(|| ConverterError::UnknownCurrency(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyOption {
    pub code: CurrencyCode,
    pub name: &'static str,
    pub symbol: &'static str,
}

/// Selectable currencies, in display order
pub static CURRENCIES: [CurrencyOption; 12] = [
    CurrencyOption { code: CurrencyCode::USD, name: "US Dollar", symbol: "🇺🇸" },
    CurrencyOption { code: CurrencyCode::EUR, name: "Euro", symbol: "🇪🇺" },
    CurrencyOption { code: CurrencyCode::GBP, name: "British Pound", symbol: "🇬🇧" },
    CurrencyOption { code: CurrencyCode::JPY, name: "Japanese Yen", symbol: "🇯🇵" },
    CurrencyOption { code: CurrencyCode::AUD, name: "Australian Dollar", symbol: "🇦🇺" },
    CurrencyOption { code: CurrencyCode::CAD, name: "Canadian Dollar", symbol: "🇨🇦" },
    CurrencyOption { code: CurrencyCode::CHF, name: "Swiss Franc", symbol: "🇨🇭" },
    CurrencyOption { code: CurrencyCode::CNY, name: "Chinese Yuan", symbol: "🇨🇳" },
    CurrencyOption { code: CurrencyCode::INR, name: "Indian Rupee", symbol: "🇮🇳" },
    CurrencyOption { code: CurrencyCode::SGD, name: "Singapore Dollar", symbol: "🇸🇬" },
    CurrencyOption { code: CurrencyCode::BTC, name: "Bitcoin", symbol: "₿" },
    CurrencyOption { code: CurrencyCode::ETH, name: "Ethereum", symbol: "Ξ" },
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyPair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

//
// ================= Conversion =================
//

/// One citation returned alongside a search-grounded answer.
/// Both fields come straight from the provider and may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Cleaned narrative (summary + insights)
    pub rate_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_amount: Option<String>,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

//
// ================= History =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    /// YYYY-MM-DD
    pub date: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResult {
    pub data: Vec<HistoryPoint>,
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_data: Option<Vec<HistoryPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_analysis: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_table_is_closed_set() {
        assert_eq!(CURRENCIES.len(), 12);
        assert_eq!(CURRENCIES[0].code, CurrencyCode::USD);
        assert_eq!(CURRENCIES[11].code, CurrencyCode::ETH);
        assert_eq!(CurrencyCode::BTC.option().name, "Bitcoin");
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert_eq!(" ETH ".parse::<CurrencyCode>().unwrap(), CurrencyCode::ETH);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_conversion_result_wire_format() {
        let result = ConversionResult {
            rate_text: "ok".to_string(),
            exchange_rate: Some("1.23".to_string()),
            calculated_amount: None,
            grounding_chunks: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rateText"], "ok");
        assert_eq!(json["exchangeRate"], "1.23");
        assert!(json.get("calculatedAmount").is_none());
    }

    #[test]
    fn test_history_result_without_comparison() {
        let raw = r#"{"data":[{"date":"2024-05-01","rate":1.08}],"analysis":"Flat."}"#;
        let parsed: HistoryResult = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert!(parsed.compare_data.is_none());
        assert!(parsed.compare_analysis.is_none());
    }
}
