//! Terminal front end for the medical RAG chat client.
//!
//! - **App**: event loop, key bindings, single in-flight request task
//! - **ui**: stateless rendering of a [`med_qa_client::ChatSession`]

pub mod app;
pub mod ui;

pub use app::App;
