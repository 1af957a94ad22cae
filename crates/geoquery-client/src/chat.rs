//! OpenAI-compatible chat completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use geoquery_ai::{CompletionError, TextCompletion, Turn};

use crate::error::{ClientError, http_client, success_body, trim_base};

pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

fn first_answer(body: &str) -> Result<Option<String>, ClientError> {
    let resp: ChatResponse = serde_json::from_str(body)?;
    Ok(resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty()))
}

impl ChatClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            base_url: trim_base(base_url),
            model: model.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, turns: &[Turn]) -> Result<Option<String>, ClientError> {
        let request = ChatRequest {
            model: &self.model,
            messages: turns,
            temperature: 0.0,
        };
        debug!(url = %self.endpoint(), turns = turns.len(), "chat completion request");
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let body = success_body(builder.send().await?).await?;
        first_answer(&body)
    }
}

#[async_trait]
impl TextCompletion for ChatClient {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        match self.send(turns).await {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) => Err(CompletionError::Empty),
            Err(err) => {
                warn!(error = %err, "chat completion failed");
                Err(CompletionError::Unavailable(err.to_string()))
            }
        }
    }
}
