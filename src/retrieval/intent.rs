//! Query intent detection.
//!
//! Routes a query to document-generation mode or normal QA mode with a
//! case-insensitive keyword match. No fuzzy matching; first hit wins.

const PRD_TRIGGERS: [&str; 4] = [
    "create a prd",
    "generate a prd",
    "write prd",
    "make a prd",
];

/// True when the query asks for a PRD to be generated.
pub fn is_prd_prompt(user_query: &str) -> bool {
    let lowered = user_query.to_lowercase();
    PRD_TRIGGERS.iter().any(|kw| lowered.contains(kw))
}
