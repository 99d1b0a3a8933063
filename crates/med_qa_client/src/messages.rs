//! HTTP message types for the RAG service. Client ↔ server JSON.

use serde::{Deserialize, Serialize};

use crate::client::ClientError;

/// Client → server: one user turn with the prior message texts.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultRequest<'a> {
    pub input: &'a str,
    pub history: &'a [String],
}

impl<'a> ConsultRequest<'a> {
    pub fn new(input: &'a str, history: &'a [String]) -> Self {
        Self { input, history }
    }
}

/// Server → client. Both fields may be absent; see [`ConsultResponse::into_reply`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub background_knowledge: Option<String>,
}

/// Assistant utterance plus the retrieved background knowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagReply {
    pub utterance: String,
    pub knowledge: String,
}

impl ConsultResponse {
    /// A reply without `response` is rejected; missing knowledge becomes empty.
    pub fn into_reply(self) -> Result<RagReply, ClientError> {
        let utterance = self
            .response
            .ok_or_else(|| ClientError::MalformedResponse("missing `response` field".into()))?;
        Ok(RagReply {
            utterance,
            knowledge: self.background_knowledge.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_input_and_history() {
        let history = vec!["q1".to_string(), "a1".to_string()];
        let json = serde_json::to_value(ConsultRequest::new("q2", &history)).unwrap();
        assert_eq!(json, serde_json::json!({"input": "q2", "history": ["q1", "a1"]}));
    }

    #[test]
    fn missing_knowledge_defaults_to_empty() {
        let resp: ConsultResponse = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        let reply = resp.into_reply().unwrap();
        assert_eq!(reply.utterance, "hi");
        assert_eq!(reply.knowledge, "");
    }

    #[test]
    fn null_response_is_rejected() {
        let resp: ConsultResponse =
            serde_json::from_str(r#"{"response":null,"background_knowledge":"k"}"#).unwrap();
        assert!(matches!(resp.into_reply(), Err(ClientError::MalformedResponse(_))));
    }
}
