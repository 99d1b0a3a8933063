//! Medical RAG chat client library (config, HTTP protocol, conversation session).
//! Used by the `med-qa` CLI and the terminal front end.

pub mod client;
pub mod config;
pub mod conversation;
pub mod messages;
pub mod query_type;
pub mod sanitizer;
pub mod session;

pub use client::{ClientError, Consult, RagClient};
pub use config::{default_config_path, ApiSection, ChatSection, Config, ConfigError, RagSettings};
pub use conversation::{Conversation, Message};
pub use messages::RagReply;
pub use query_type::{PromptTemplate, QueryType, TEMPLATES};
pub use sanitizer::{ProfanityFilter, Sanitizer};
pub use session::{ChatSession, PendingTurn, SessionError, TurnOutcome};
