//! Scripted content generator for development & testing
//! Keeps the converter functional without network access

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::ConverterError;
use crate::gemini::{ContentGenerator, GenerateRequest, GeneratedContent};
use crate::models::GroundingChunk;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text {
        text: Option<String>,
        grounding_chunks: Vec<GroundingChunk>,
    },
    Fail(String),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text {
            text: Some(text.into()),
            grounding_chunks: vec![],
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ScriptedReply::Fail(message.into())
    }
}

/// Replays queued replies in order and records every request it receives
#[derive(Default)]
pub struct MockGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockGenerator {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: GenerateRequest) -> crate::Result<GeneratedContent> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .ok_or_else(|| ConverterError::LlmError("No scripted reply left".to_string()))?;

        match reply {
            ScriptedReply::Text {
                text,
                grounding_chunks,
            } => Ok(GeneratedContent {
                text,
                grounding_chunks,
            }),
            ScriptedReply::Fail(message) => Err(ConverterError::LlmError(message)),
        }
    }
}
