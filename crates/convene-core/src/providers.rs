//! LLM provider routing — Ollama chat API or OpenAI-compatible Chat
//! Completions, via reqwest.
//!
//! These are thin HTTP adapters: request encoding, response normalization,
//! and error classification. Anything the provider reports (auth failures,
//! quota, refusals, truncation) becomes a [`ModelResponse`] status rather
//! than an `Err` — only transport-level failures propagate as errors.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::Config;
use crate::convert::ConversationMessage;
use crate::types::{ModelGenerationConfig, ModelResponse, ModelResponseStatus};

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .expect("Failed to build HTTP client")
}

// ── Request encoding ──

/// Body for the Ollama chat endpoint ({base}/api/chat).
fn encode_ollama_body(
    model: &str,
    messages: &[ConversationMessage],
    generation: &ModelGenerationConfig,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "options": {
            "temperature": generation.temperature,
            "top_p": generation.top_p,
        },
    });

    for field in &generation.custom_request_body_fields {
        body[&field.name] = field.value.clone();
    }

    body
}

/// Body for an OpenAI-compatible chat completions endpoint.
fn encode_completions_body(
    model: &str,
    messages: &[ConversationMessage],
    generation: &ModelGenerationConfig,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "max_tokens": generation.max_tokens,
        "temperature": generation.temperature,
        "top_p": generation.top_p,
    });

    for field in &generation.custom_request_body_fields {
        body[&field.name] = field.value.clone();
    }

    body
}

// ── Response normalization ──

/// Finish reasons that downgrade an otherwise-successful response.
fn map_finish_reason(finish_reason: Option<&str>) -> Option<ModelResponseStatus> {
    match finish_reason {
        Some("length") | Some("max_tokens") => Some(ModelResponseStatus::LengthError),
        Some("content_filter") | Some("content-filter") => Some(ModelResponseStatus::RefusalError),
        Some("error") => Some(ModelResponseStatus::UnknownError),
        _ => None,
    }
}

fn normalize_ollama_response(data: Value) -> ModelResponse {
    // Ollama reports errors in the body rather than via HTTP status.
    if let Some(err) = data.get("error").and_then(Value::as_str) {
        return ModelResponse::error(ModelResponseStatus::UnknownError, err);
    }

    let text = data["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    ModelResponse::ok(text, Some(data))
}

fn normalize_completions_response(data: Value) -> ModelResponse {
    let choice = &data["choices"][0];
    let finish_reason = choice.get("finish_reason").and_then(Value::as_str);

    if let Some(status) = map_finish_reason(finish_reason) {
        let mut response = ModelResponse::error(
            status,
            format!("finish_reason: {}", finish_reason.unwrap_or_default()),
        );
        response.text = choice["message"]["content"].as_str().map(String::from);
        response.raw_response = Some(data);
        return response;
    }

    let text = choice["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    ModelResponse::ok(text, Some(data))
}

/// Classify an HTTP error status the way the platform's adapters do.
fn map_http_status(status: reqwest::StatusCode, body: &str) -> ModelResponse {
    let code = status.as_u16();
    let message = format!("HTTP {}: {}", status, &body[..body.len().min(500)]);

    let response_status = match code {
        401 | 403 => ModelResponseStatus::AuthenticationError,
        429 => ModelResponseStatus::QuotaError,
        code if code >= 500 => ModelResponseStatus::ProviderUnavailableError,
        _ => ModelResponseStatus::UnknownError,
    };

    ModelResponse::error(response_status, message)
}

// ── API calls ──

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
) -> Result<reqwest::Response> {
    let mut request = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body);
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }
    request.send().await.context("HTTP request failed")
}

/// Call an Ollama chat endpoint.
async fn ollama_chat(
    config: &Config,
    messages: &[ConversationMessage],
    generation: &ModelGenerationConfig,
) -> Result<ModelResponse> {
    let base_url = config
        .base_url
        .as_deref()
        .unwrap_or("http://localhost:11434");
    let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
    let body = encode_ollama_body(&config.model, messages, generation);

    info!(
        model = %config.model,
        msg_count = messages.len(),
        "ollama chat request"
    );

    let client = build_client();
    let response = post_json(&client, &url, config.api_key.as_deref(), &body).await?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        error!("ollama HTTP {}: {}", status, &text[..text.len().min(200)]);
        return Ok(map_http_status(status, &text));
    }

    let data: Value = response
        .json()
        .await
        .context("Failed to parse Ollama response")?;
    Ok(normalize_ollama_response(data))
}

/// Call an OpenAI-compatible chat completions endpoint.
async fn completions_chat(
    config: &Config,
    messages: &[ConversationMessage],
    generation: &ModelGenerationConfig,
) -> Result<ModelResponse> {
    let base_url = config
        .base_url
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let body = encode_completions_body(&config.model, messages, generation);

    info!(
        model = %config.model,
        provider = %config.provider,
        msg_count = messages.len(),
        "chat completions request"
    );

    let client = build_client();
    let response = post_json(&client, &url, config.api_key.as_deref(), &body).await?;

    let status = response.status();
    if status.is_success() {
        let data: Value = response
            .json()
            .await
            .context("Failed to parse API response")?;
        return Ok(normalize_completions_response(data));
    }

    let text = response.text().await.unwrap_or_default();
    error!(
        "API HTTP {}: {} | url={}",
        status,
        &text[..text.len().min(500)],
        url
    );

    // Retry once on 500 errors (transient provider issues).
    if status.as_u16() == 500 {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        let retry = post_json(&client, &url, config.api_key.as_deref(), &body).await?;
        let retry_status = retry.status();
        if retry_status.is_success() {
            let data: Value = retry
                .json()
                .await
                .context("Failed to parse retry response")?;
            return Ok(normalize_completions_response(data));
        }
        let retry_text = retry.text().await.unwrap_or_default();
        return Ok(map_http_status(retry_status, &retry_text));
    }

    Ok(map_http_status(status, &text))
}

// ── Public API ──

/// Make an LLM chat call, routed by the configured provider.
pub async fn chat(
    config: &Config,
    messages: &[ConversationMessage],
    generation: &ModelGenerationConfig,
) -> Result<ModelResponse> {
    if config.provider == "ollama" {
        ollama_chat(config, messages, generation).await
    } else {
        completions_chat(config, messages, generation).await
    }
}
