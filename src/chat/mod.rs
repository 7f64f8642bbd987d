pub mod engine;
pub mod memory;
pub mod prompts;

pub use engine::{AnswerMode, ChatEngine, ChatOutcome};
pub use memory::ConversationMemory;
