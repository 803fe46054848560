//! Retrieval-augmented financial research agent and the evaluation
//! plumbing around it: a transcript data model, tool-result
//! normalization and tool-routing extraction, hosted-model providers,
//! and the retrieval/web-search tool systems.
pub mod agent;
pub mod errors;
pub mod extract;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod retriever;
pub mod systems;
