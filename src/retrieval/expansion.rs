//! Query expansion for fusion retrieval.
//!
//! One input query becomes a fixed, ordered set of reworded variants to
//! improve recall. Pure and deterministic; no I/O.

/// Expansion templates, applied in order. The identity template comes first
/// so the original query always leads the set.
const QUERY_TEMPLATES: [&str; 5] = [
    "{}",
    "Explain {}",
    "What are the details of {}?",
    "List all components of {}",
    "Give schema or structure for {}",
];

/// Number of variants produced for every input query.
pub const EXPANSION_COUNT: usize = QUERY_TEMPLATES.len();

/// Produce the expanded query set for one query.
///
/// Always returns exactly [`EXPANSION_COUNT`] strings in template order.
/// An empty query is valid and is substituted into every template as-is.
pub fn expand_query(query: &str) -> Vec<String> {
    QUERY_TEMPLATES
        .iter()
        .map(|template| template.replacen("{}", query, 1))
        .collect()
}
