//! These models represent the objects passed around by the agent and the
//! evaluation pipeline.
//!
//! There are a few related formats to reconcile:
//! - openai-style messages/tools, sent from the agent to the hosted LLM
//! - tool result payloads, handed back by retrieval and search tools
//! - externally-recorded transcripts, consumed by the extraction layer
//!
//! External data is converted into the internal structs at the serde
//! boundary; content items carry no explicit type tag upstream, so the
//! message model classifies them by their distinguishing fields.
pub mod document;
pub mod message;
pub mod role;
pub mod tool;
