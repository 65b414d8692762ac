//! Customer-assistant chat relayed to an OpenAI-compatible completion endpoint.
//!
//! The relay always answers with text: upstream failures are logged and replaced
//! by a fixed apology so the client never sees provider errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{BrandConfig, ChatConfig};

pub const MAX_TOKENS: u32 = 500;
pub const TEMPERATURE: f32 = 0.7;

pub const UNAVAILABLE_REPLY: &str = "Mi dispiace, il servizio di chat non è al momento disponibile. Puoi contattarci direttamente per assistenza.";
pub const EMPTY_REPLY: &str = "Mi dispiace, non sono riuscito a elaborare la tua richiesta.";
pub const ERROR_REPLY: &str = "Mi dispiace, si è verificato un errore. Puoi contattarci direttamente per assistenza immediata.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat API key is not configured")]
    MissingApiKey,
    #[error("chat provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("chat provider rate limit exceeded")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("chat provider returned no content")]
    EmptyReply,
}

/// Completion backend used by the relay.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `POST {api_base}/chat/completions` with bearer auth.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ChatError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
        })
    }

    /// Builds a client when the configuration carries an API key.
    pub fn from_config(config: &ChatConfig) -> Result<Option<Self>, ChatError> {
        match &config.api_key {
            Some(key) => Self::new(key.clone(), config.model.clone(), &config.api_base, config.timeout)
                .map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ChatError::EmptyReply)
    }
}

/// Assistant persona sent ahead of every conversation.
pub fn system_prompt(brand: &BrandConfig) -> String {
    let name = &brand.name;
    let email = &brand.email;
    let phone = &brand.phone;
    format!(
        "Sei l'assistente virtuale di {name}, una società con sede a Dubai specializzata nella gestione di crediti fiscali.

INFORMAZIONI AZIENDALI:
- Nome: {name}
- Sede: Dubai, Emirati Arabi Uniti
- Servizi: Gestione crediti fiscali (Superbonus 110%, Bonus Edilizi, Industria 4.0, Crediti IVA, Crediti P.A.)
- Email: {email}
- Telefono: {phone}

SERVIZI PRINCIPALI:
1. Superbonus 110% - Detrazioni per efficientamento energetico e antisismico
2. Bonus Edilizi - Detrazioni 50-90% per ristrutturazioni ed ecobonus
3. Crediti Industria 4.0 - Crediti d'imposta 10-50% per investimenti tecnologici
4. Crediti IVA - Recupero e cessione crediti IVA maturati
5. Crediti P.A. - Crediti verso la Pubblica Amministrazione

PROCESSO:
1. Valutazione gratuita
2. Analisi tecnica della documentazione
3. Proposta commerciale
4. Gestione completa del processo

Rispondi sempre in italiano, sii professionale ma amichevole. Fornisci informazioni accurate sui nostri servizi e invita gli utenti a richiedere una valutazione gratuita quando appropriato."
    )
}

/// Prepends the persona to the visitor's history and returns the assistant reply.
pub struct ChatRelay {
    client: Option<Arc<dyn ChatCompletionClient>>,
    system_prompt: String,
}

impl ChatRelay {
    pub fn new(client: Option<Arc<dyn ChatCompletionClient>>, brand: &BrandConfig) -> Self {
        Self {
            client,
            system_prompt: system_prompt(brand),
        }
    }

    pub fn from_config(config: &ChatConfig, brand: &BrandConfig) -> Result<Self, ChatError> {
        let client = OpenAiChatClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn ChatCompletionClient>);
        if client.is_none() {
            warn!("OPENAI_API_KEY not set, chat replies will use the unavailable message");
        }
        Ok(Self::new(client, brand))
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Visitor-supplied system messages are dropped; only the persona is sent as system.
    pub async fn reply(&self, history: Vec<ChatMessage>) -> String {
        let Some(client) = &self.client else {
            error!(error = %ChatError::MissingApiKey, "chat relay unavailable");
            return UNAVAILABLE_REPLY.to_string();
        };

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(
            history
                .into_iter()
                .filter(|message| message.role != ChatRole::System),
        );

        match client.complete(&messages).await {
            Ok(reply) => {
                debug!(turns = messages.len() - 1, "chat reply relayed");
                reply
            }
            Err(ChatError::EmptyReply) => {
                warn!("chat provider returned an empty choice");
                EMPTY_REPLY.to_string()
            }
            Err(err) => {
                error!(error = %err, "chat completion failed");
                ERROR_REPLY.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

pub fn chat_router(relay: Arc<ChatRelay>) -> Router {
    Router::new()
        .route("/api/v1/chat", post(chat_handler))
        .with_state(relay)
}

pub(crate) async fn chat_handler(
    State(relay): State<Arc<ChatRelay>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    let reply = relay.reply(request.messages).await;
    Json(ChatReply { reply })
}
