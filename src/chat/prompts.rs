//! Prompt templates for the two generation modes.

/// Separator between chunks in the QA context block.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Build the fixed-section PRD generation prompt around the raw user
/// request. No retrieval context is included in document mode.
pub fn build_prd_prompt(user_query: &str) -> String {
    format!(
        "You are a senior product manager generating a PRD in the following format:

Title:
Brief:
Objective:
Problem Statement:
User Painpoints:
Assumptions and Dependencies:
Success Metrics:
User Stories & Acceptance Criteria:
Solution Overview:
Requirements:
Test Cases:
Edge Cases:
Impact Areas:
Notifications:
Permission Schema:
Data Migration:
Conclusion:

Please generate a detailed PRD based on this request:
{}

Only return the PRD. Do not include any extra commentary.",
        user_query
    )
}

/// Build the grounded QA prompt. An empty context is valid; the template
/// instructs the model to say when the answer is not in the context.
pub fn build_qa_prompt(context: &str, question: &str) -> String {
    format!(
        "You are Progress AI Assistant 1.0, a helpful product expert for a construction tech platform.

Use the below context to answer the user's question clearly and accurately.

If the answer isn't in the context, say:
\"I couldn't find that information in the current project data.\"

--------------------
Context:
{}

User Question:
{}

Answer:",
        context, question
    )
}
