use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const CLAUDE_MODEL: &str = "claude-3-5-haiku-20241022";

/// Inputs are capped to bound token use.
const MAX_INPUT_CHARS: usize = 4000;

/// Inputs shorter than this are returned truncated, no API call.
const MIN_INPUT_CHARS: usize = 50;

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

pub struct Summarizer {
    client: Client,
    api_key: String,
}

impl Summarizer {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, api_key }
    }

    /// Generate a summary of at most `max_len` characters. Callers treat any
    /// error as "no summary" and persist the article regardless.
    pub async fn summarize(&self, text: &str, max_len: usize) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_INPUT_CHARS {
            return Ok(truncate_chars(trimmed, max_len));
        }

        let content = if trimmed.chars().count() > MAX_INPUT_CHARS {
            let capped: String = trimmed.chars().take(MAX_INPUT_CHARS).collect();
            format!("{}...", capped)
        } else {
            trimmed.to_string()
        };

        let system_prompt = format!(
            "你是一个新闻摘要助手。请用中文总结以下新闻内容。\n\
             要求：\n\
             1. 摘要长度控制在 {}-{} 字\n\
             2. 突出新闻的核心信息和要点\n\
             3. 使用简洁清晰的语言\n\
             4. 不要编造信息，只基于原文总结\n\
             5. 直接输出摘要，不要加任何前缀或后缀",
            max_len / 2,
            max_len
        );

        let user_message = format!("新闻内容：\n\n{}\n\n请生成中文摘要：", content);

        let request = MessageRequest {
            model: CLAUDE_MODEL.to_string(),
            max_tokens: (max_len as u32).clamp(256, 1024),
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message,
            }],
            system: Some(system_prompt),
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::ClaudeApi(format!("API error: {}", error_text)));
        }

        let message_response: MessageResponse = response.json().await?;

        let summary = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        Ok(summary)
    }

    /// Target summary length scaled to the input size.
    pub fn dynamic_target_length(text: &str) -> usize {
        match text.chars().count() {
            0..=499 => 100,
            500..=1499 => 200,
            1500..=2999 => 250,
            _ => 300,
        }
    }

    pub fn model_version(&self) -> &'static str {
        CLAUDE_MODEL
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
