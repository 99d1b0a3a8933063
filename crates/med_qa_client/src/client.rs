//! HTTP client for the RAG service: one POST per user turn, JSON in and out.

use async_trait::async_trait;

use crate::config::RagSettings;
use crate::messages::{ConsultRequest, ConsultResponse, RagReply};
use crate::query_type::QueryType;

/// RAG client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Mode has no endpoint; raised before any network I/O.
    #[error("invalid query type: {0} has no RAG endpoint")]
    InvalidMode(QueryType),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("network error: {0}")]
    Http(#[source] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Anything that can answer a user turn. Implemented by [`RagClient`].
#[async_trait]
pub trait Consult: Send + Sync {
    async fn consult(
        &self,
        input: &str,
        history: &[String],
        query_type: QueryType,
    ) -> Result<RagReply, ClientError>;
}

/// Client for `POST {base_url}/rag_{mode}/{llm_model}/{embedding_model}`.
#[derive(Debug, Clone)]
pub struct RagClient {
    settings: RagSettings,
    http: reqwest::Client,
}

impl RagClient {
    pub fn new(settings: RagSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ClientError::Http)?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Target URL for `query_type`.
    pub fn endpoint(&self, query_type: QueryType) -> Result<String, ClientError> {
        let segment = query_type
            .endpoint_segment()
            .ok_or(ClientError::InvalidMode(query_type))?;
        Ok(format!(
            "{}/{}/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            segment,
            self.settings.llm_model,
            self.settings.embedding_model
        ))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.settings.timeout)
        } else {
            ClientError::Http(e)
        }
    }
}

#[async_trait]
impl Consult for RagClient {
    async fn consult(
        &self,
        input: &str,
        history: &[String],
        query_type: QueryType,
    ) -> Result<RagReply, ClientError> {
        let url = self.endpoint(query_type)?;
        tracing::debug!(mode = %query_type, %url, history = history.len(), "consulting RAG service");

        let response = self
            .http
            .post(&url)
            .json(&ConsultRequest::new(input, history))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, %url, "RAG service returned an error status");
            return Err(ClientError::Status(status));
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: ConsultResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        let reply = parsed.into_reply()?;
        tracing::debug!(
            utterance_len = reply.utterance.len(),
            knowledge_len = reply.knowledge.len(),
            "RAG reply received"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client(base_url: &str) -> RagClient {
        let mut cfg = Config::default();
        cfg.api.base_url = Some(base_url.into());
        RagClient::new(cfg.resolved()).unwrap()
    }

    #[test]
    fn endpoint_templates_mode_and_models() {
        let c = client("http://rag.local:8000/");
        assert_eq!(
            c.endpoint(QueryType::Agent).unwrap(),
            "http://rag.local:8000/rag_agent/baichuan2-13b-chat/corom-chinese-medical"
        );
        assert_eq!(
            c.endpoint(QueryType::Qa).unwrap(),
            "http://rag.local:8000/rag_qa/baichuan2-13b-chat/corom-chinese-medical"
        );
    }

    #[tokio::test]
    async fn risk_mode_fails_before_dispatch() {
        // Nothing listens on port 9; a dispatched request would surface as Http.
        let c = client("http://127.0.0.1:9");
        let err = c.consult("hi", &[], QueryType::Risk).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidMode(QueryType::Risk)));
    }
}
