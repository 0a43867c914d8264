use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Reply used whenever the hosted model cannot answer.
pub const FALLBACK_ANSWER: &str = "Olá! Tive um pequeno problema técnico ao processar sua dúvida. \
Você pode tentar novamente ou falar conosco via WhatsApp pelo botão no rodapé da página.";

const SYSTEM_INSTRUCTION: &str = "Você é o assistente virtual de uma fintech brasileira de microcrédito. \
Seu objetivo é ajudar clientes a entenderem como funciona o empréstimo, tirar dúvidas sobre taxas (20% ao mês) \
e prazos (1 a 5 parcelas). Seja profissional, amigável, direto e transmita segurança. \
Lembre-se: o valor máximo é R$500 e o mínimo R$100. Pagamentos via PIX. \
Responda sempre em Português do Brasil de forma concisa.";

/// Product Q&A backed by a hosted chat model.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, AssistantError>;

    /// Like [`ask`](Self::ask) but never fails: errors are logged and replaced by [`FALLBACK_ANSWER`].
    async fn answer(&self, question: &str) -> String {
        match self.ask(question).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "assistant unavailable; sending fallback answer");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant API key not configured")]
    NotConfigured,
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("assistant request failed: {0}")]
    Transport(String),
    #[error("assistant API answered {status}: {body}")]
    Api { status: u16, body: String },
    #[error("assistant returned no answer")]
    EmptyAnswer,
}

pub struct GeminiAssistant {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GeminiAssistant {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| AssistantError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or(AssistantError::NotConfigured)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: question.to_string(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: 0.8,
                top_p: 0.95,
                top_k: 40,
            },
        };

        info!("calling assistant model");
        let url = format!("{}?key={}", self.endpoint, api_key);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|err| AssistantError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| AssistantError::Transport(err.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .map(|part| part.text)
            .find(|text| !text.trim().is_empty())
            .ok_or(AssistantError::EmptyAnswer)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
