//! Lumina Currency
//!
//! A currency converter that delegates the substantive work to Gemini:
//! - Live conversion with web-search grounding and cited sources
//! - A 14-day trend series (optionally two pairs) from model knowledge
//! - Chart shaping and session state for a CLI or browser front end
//!
//! FLOW:
//! SUBMIT → CONVERT (grounded) → SETTLE → HISTORY (structured JSON) → CHART

pub mod api;
pub mod chart;
pub mod config;
pub mod conversion;
pub mod error;
pub mod gemini;
pub mod history;
pub mod mock;
pub mod models;
pub mod session;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use gemini::{ContentGenerator, GeminiClient};
pub use session::ConverterSession;
