//! Ingestion pipeline: JSONL sources → flattened documents → overlapping
//! chunks → embeddings → corpus collections.

pub mod chunker;
pub mod flatten;
pub mod jsonl;
pub mod pipeline;

pub use chunker::TextChunker;
pub use jsonl::{parse_jsonl, IngestDocument};
pub use pipeline::{chunk_id, IngestPipeline, IngestReport, SeenIds};
