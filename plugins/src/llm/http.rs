use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deskpilot_core::api as core_api;
use deskpilot_core::error::LlmError;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
/// One instance per configured endpoint; the text and vision models of a
/// deployment are two instances that may share a base URL.
pub struct HttpChatModel {
    name: String,
    model: String,
    url_chat: String,
    api_key: String,
    timeout_ms: u64,
    http: reqwest::Client,
}

impl HttpChatModel {
    pub fn new(
        name: impl Into<String>,
        endpoint: &core_api::ModelEndpoint,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = endpoint.base_url.trim_end_matches('/');
        Ok(Self {
            name: name.into(),
            model: endpoint.model.clone(),
            url_chat: format!("{}/chat/completions", normalized),
            api_key: endpoint.api_key.clone(),
            timeout_ms,
            http,
        })
    }

    pub fn text(cfg: &core_api::LlmConfig) -> anyhow::Result<Self> {
        Self::new("text", &cfg.text, cfg.request_timeout_ms)
    }

    pub fn vision(cfg: &core_api::LlmConfig) -> anyhow::Result<Self> {
        Self::new("vision", &cfg.vision, cfg.request_timeout_ms)
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    fn wire_request(&self, request: &core_api::ChatRequest) -> Result<WireRequest, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: WireContent::Text(system.clone()),
            });
        }
        for msg in &request.messages {
            messages.push(WireMessage {
                role: msg.role.clone(),
                content: WireContent::Text(msg.content.clone()),
            });
        }
        if messages.is_empty() {
            return Err(LlmError::InvalidRequest("request has no messages".to_string()));
        }
        if let Some(image) = &request.image {
            attach_image(&mut messages, image);
        }
        Ok(WireRequest {
            model: self.model.clone(),
            messages,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout_ms)
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl core_api::ChatModel for HttpChatModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: core_api::ChatRequest) -> Result<String, LlmError> {
        let payload = self.wire_request(&request)?;
        tracing::debug!(
            model = %self.model,
            messages = payload.messages.len(),
            json = request.json_mode,
            image = request.image.is_some(),
            "chat completion request"
        );

        let req = self.http.post(&self.url_chat).json(&payload);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: preview_body(&body),
            });
        }

        let parsed: WireResponse = serde_json::from_str(&body).map_err(|err| {
            LlmError::Transport(format!(
                "failed to decode response body: {} | body={}",
                err,
                preview_body(&body)
            ))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        tracing::debug!(model = %self.model, status = status.as_u16(), chars = content.len(), "chat completion response");
        Ok(content)
    }
}

/// Puts the image on the last user turn as a `data:` URL content part,
/// keeping any text of that turn as a sibling part. A request with no
/// user turn gets a fresh one carrying only the image.
fn attach_image(messages: &mut Vec<WireMessage>, image: &core_api::ImageAttachment) {
    let url = format!("data:{};base64,{}", image.media_type, image.data);
    let image_part = WirePart::ImageUrl {
        image_url: WireImageUrl { url },
    };
    match messages.iter_mut().rev().find(|m| m.role == "user") {
        Some(msg) => {
            let mut parts = Vec::with_capacity(2);
            if let WireContent::Text(text) = &msg.content {
                if !text.is_empty() {
                    parts.push(WirePart::Text { text: text.clone() });
                }
            }
            parts.push(image_part);
            msg.content = WireContent::Parts(parts);
        }
        None => messages.push(WireMessage {
            role: "user".to_string(),
            content: WireContent::Parts(vec![image_part]),
        }),
    }
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: WireContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Serialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    out.push_str("...");
    out
}
