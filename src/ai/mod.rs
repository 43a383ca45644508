pub mod prompt;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AppError, AppResult};
use prompt::PromptKind;

/// Environment variable holding the remote-backend credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default chat-completions endpoint for a local Ollama-style server.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434/v1/chat/completions";
const REMOTE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const TEMPERATURE: f32 = 0.5;
const REMOTE_MAX_TOKENS: u32 = 400;
const LOCAL_TIMEOUT: Duration = Duration::from_secs(10);
const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Which text-generation service to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Key-authenticated OpenAI chat-completions API.
    Remote,
    /// Unauthenticated local HTTP endpoint with the same wire shape.
    Local,
}

/// Explicit configuration for one generation request. The CLI resolves the
/// credential and endpoint up front so nothing in here reads ambient state.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub backend: Backend,
    pub model: String,
    /// Endpoint override for the local backend (and the credential fallback).
    pub endpoint: Option<String>,
    /// API key for the remote backend, typically from `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub prompt: PromptKind,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Send the diff to the configured backend and return the model's reply.
///
/// Remote mode without an API key is not an error: it logs one warning and
/// retries in local mode with the same diff, model, and prompt kind.
#[tracing::instrument(name = "Generating summary with LLM", level = "debug", skip_all)]
pub async fn generate_summary(diff: &str, config: &GenerationConfig) -> AppResult<String> {
    match config.backend {
        Backend::Local => generate_local(diff, config).await,
        Backend::Remote => match config.api_key.as_deref() {
            Some(key) => generate_remote(diff, key, config).await,
            None => {
                warn!("No OpenAI key found, falling back to local mode.");
                generate_local(diff, config).await
            }
        },
    }
}

async fn generate_local(diff: &str, config: &GenerationConfig) -> AppResult<String> {
    let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_LOCAL_ENDPOINT);
    let body = ChatRequest {
        model: &config.model,
        messages: vec![ChatMessage {
            role: "user",
            content: config.prompt.local_prompt(diff),
        }],
        temperature: TEMPERATURE,
        max_tokens: None,
    };

    let client = Client::builder()
        .timeout(LOCAL_TIMEOUT)
        .build()
        .map_err(AppError::HttpClient)?;
    let response = client
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(AppError::LocalBackend)?;
    let text = response.text().await.map_err(AppError::LocalBackend)?;

    first_choice(endpoint, &text)
}

async fn generate_remote(diff: &str, api_key: &str, config: &GenerationConfig) -> AppResult<String> {
    let body = ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: config.prompt.system_instruction().to_string(),
            },
            ChatMessage {
                role: "user",
                content: config.prompt.user_prompt(diff),
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: Some(REMOTE_MAX_TOKENS),
    };

    let client = Client::builder()
        .timeout(REMOTE_TIMEOUT)
        .build()
        .map_err(AppError::HttpClient)?;
    let response = client
        .post(REMOTE_ENDPOINT)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(AppError::RemoteBackend)?;
    let text = response.text().await.map_err(AppError::RemoteBackend)?;

    first_choice(REMOTE_ENDPOINT, &text)
}

/// Decode a chat-completions body and pull out the trimmed content of the
/// first choice. Decoding goes through `serde_path_to_error` so a malformed
/// payload names the field that broke.
fn first_choice(endpoint: &str, body: &str) -> AppResult<String> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    let parsed: ChatResponse = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| AppError::MalformedResponse(endpoint.to_string(), e))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::EmptyChoices(endpoint.to_string()))?;

    Ok(choice.message.content.trim().to_string())
}
