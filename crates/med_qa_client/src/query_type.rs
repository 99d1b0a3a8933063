//! Conversation modes and the canned example prompts offered on an empty chat.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conversational strategy for a session. Picks the endpoint and the label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Plain multi-turn question answering.
    #[default]
    Qa,
    /// Proactive dialogue where the assistant asks follow-up questions.
    Agent,
    /// Risk assessment. Listed in the selector but has no backend.
    Risk,
}

impl QueryType {
    pub const ALL: [QueryType; 3] = [QueryType::Qa, QueryType::Agent, QueryType::Risk];

    /// Key used in config files, CLI flags and the endpoint path.
    pub fn key(self) -> &'static str {
        match self {
            QueryType::Qa => "qa",
            QueryType::Agent => "agent",
            QueryType::Risk => "risk",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QueryType::Qa => "问答",
            QueryType::Agent => "主动式对话",
            QueryType::Risk => "风险评估",
        }
    }

    /// Path segment of the RAG endpoint, `None` when the mode is not wired.
    pub fn endpoint_segment(self) -> Option<&'static str> {
        match self {
            QueryType::Qa => Some("rag_qa"),
            QueryType::Agent => Some("rag_agent"),
            QueryType::Risk => None,
        }
    }

    /// Whether the mode selector lets the user pick this mode directly.
    pub fn selectable(self) -> bool {
        self.endpoint_segment().is_some()
    }

    /// Next selectable mode, wrapping around.
    pub fn next_selectable(self) -> QueryType {
        let pos = Self::ALL.iter().position(|q| *q == self).unwrap_or(0);
        Self::ALL
            .iter()
            .cycle()
            .skip(pos + 1)
            .take(Self::ALL.len())
            .copied()
            .find(|q| q.selectable())
            .unwrap_or(self)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query type: {0} (expected qa, agent or risk)")]
pub struct ParseQueryTypeError(pub String);

impl FromStr for QueryType {
    type Err = ParseQueryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .into_iter()
            .find(|q| q.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseQueryTypeError(s.to_string()))
    }
}

/// Example prompt shown while the conversation is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub title: &'static str,
    pub prompt: &'static str,
    pub query_type: QueryType,
}

pub const TEMPLATES: [PromptTemplate; 3] = [
    PromptTemplate {
        title: "主动式问诊案例",
        prompt: "我想知道我是否有心力衰竭？",
        query_type: QueryType::Agent,
    },
    PromptTemplate {
        title: "多轮问答案例",
        prompt: "请问高血压应该注意吃什么？",
        query_type: QueryType::Qa,
    },
    PromptTemplate {
        title: "风险预警评估案例",
        prompt: "TBD",
        query_type: QueryType::Risk,
    },
];
