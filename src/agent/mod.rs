pub mod client;
pub mod conversation;
pub mod message;
pub mod tools;

pub use client::{ChatModel, OpenAiClient};
pub use conversation::Agent;
pub use message::{AssistantReply, ChatMessage, ToolCall, ToolDefinition};
pub use tools::TodoTools;
