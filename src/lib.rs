pub mod chat;
pub mod core;
pub mod history;
pub mod ingest;
pub mod llm;
pub mod retrieval;
pub mod server;
pub mod state;
