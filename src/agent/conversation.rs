use crate::error::TodoError;

use super::client::ChatModel;
use super::message::{ChatMessage, ToolDefinition};
use super::tools::{self, TodoTools};

/// Upper bound on model round trips within a single user turn.
pub const MAX_ROUNDS: usize = 10;

pub const SYSTEM_PROMPT: &str = "\
You are a to-do list assistant. You help the user manage their tasks.

You can:
1. List and summarize tasks
2. Add new tasks
3. Mark tasks completed or pending
4. Delete tasks
5. Search tasks by keyword
6. Report statistics
7. Complete or delete several tasks at once

Guidelines:
- When asked about the current tasks, call get_all_tasks or get_statistics first.
- For vague task descriptions, use search_tasks to find the right ID.
- Use batch_complete_tasks or batch_delete_tasks for bulk changes.
- Take priority and category into account when giving advice.
- Before deleting, make sure the user really meant it.
- Keep summaries short; with many tasks, summarize first and then list what matters.";

/// A chat session: history plus the tools the model may call.
pub struct Agent<'a, M: ChatModel> {
    model: M,
    tools: TodoTools<'a>,
    definitions: Vec<ToolDefinition>,
    messages: Vec<ChatMessage>,
}

impl<'a, M: ChatModel> Agent<'a, M> {
    pub fn new(model: M, tools: TodoTools<'a>) -> Self {
        let definitions = tools::definitions();
        tracing::debug!(
            tools = ?definitions.iter().map(ToolDefinition::name).collect::<Vec<_>>(),
            "tool catalog loaded"
        );
        Self {
            model,
            tools,
            definitions,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT)],
        }
    }

    /// Run one user turn to completion and return the model's final text.
    ///
    /// Tool calls requested by the model are executed in order, and their
    /// results fed back, until the model answers without calling anything.
    /// Errors leave everything exchanged so far in the history.
    pub fn chat(&mut self, input: &str) -> Result<String, TodoError> {
        self.messages.push(ChatMessage::user(input));

        for round in 1..=MAX_ROUNDS {
            let reply = self.model.complete(&self.messages, &self.definitions)?;

            if reply.tool_calls.is_empty() {
                let text = reply.content.clone().unwrap_or_default();
                self.messages.push(reply.into_message());
                tracing::debug!(round, "turn finished");
                return Ok(text);
            }

            let calls = reply.tool_calls.clone();
            self.messages.push(reply.into_message());
            for call in calls {
                tracing::info!(round, tool = %call.function.name, "tool call");
                let result = self.tools.execute(&call.function.name, &call.function.arguments);
                self.messages.push(ChatMessage::tool(call.id, result.to_string()));
            }
        }

        tracing::warn!(rounds = MAX_ROUNDS, "turn exhausted without a final answer");
        Err(TodoError::conversation_exhausted(MAX_ROUNDS))
    }

    /// Drop every turn, keeping only the system prompt.
    pub fn clear_history(&mut self) {
        self.messages.truncate(1);
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::agent::message::{AssistantReply, ToolCall};
    use crate::db::{task_repo, Database};
    use crate::error::ErrorCode;
    use crate::models::{Priority, TaskCategory};

    /// Replays canned replies and records how many messages each request carried.
    struct ScriptedModel {
        replies: RefCell<VecDeque<Result<AssistantReply, TodoError>>>,
        seen: RefCell<Vec<usize>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<AssistantReply, TodoError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn remaining(&self) -> usize {
            self.replies.borrow().len()
        }
    }

    impl ChatModel for &ScriptedModel {
        fn complete(
            &self,
            messages: &[ChatMessage],
            tools: &[ToolDefinition],
        ) -> Result<AssistantReply, TodoError> {
            assert_eq!(tools.len(), 9);
            self.seen.borrow_mut().push(messages.len());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TodoError::model("script exhausted")))
        }
    }

    fn call(id: &str, name: &str, args: &str) -> AssistantReply {
        AssistantReply::calls(vec![ToolCall::new(id, name, args)])
    }

    #[test]
    fn text_reply_ends_turn() {
        let db = Database::open_in_memory().unwrap();
        let model = ScriptedModel::new(vec![Ok(AssistantReply::text("Hello!"))]);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));

        assert_eq!(agent.chat("hi").unwrap(), "Hello!");
        let roles: Vec<&str> = agent.history().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }

    #[test]
    fn tool_call_then_text_adds_task() {
        let db = Database::open_in_memory().unwrap();
        let model = ScriptedModel::new(vec![
            Ok(call("call_1", "add_task", r#"{"title":"x"}"#)),
            Ok(AssistantReply::text("Added \"x\".")),
        ]);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));

        let answer = agent.chat("remind me to x").unwrap();
        assert_eq!(answer, "Added \"x\".");

        let tasks = task_repo::list_tasks(db.conn(), &Default::default()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "x");
        assert_eq!(tasks[0].category, TaskCategory::Other);
        assert_eq!(tasks[0].priority, Priority::Medium);

        // Second request saw system, user, assistant(call), tool result.
        assert_eq!(*model.seen.borrow(), vec![2, 4]);
        match &agent.history()[3] {
            ChatMessage::Tool {
                tool_call_id,
                content,
            } => {
                assert_eq!(tool_call_id, "call_1");
                let v: serde_json::Value = serde_json::from_str(content).unwrap();
                assert_eq!(v["success"], true);
            }
            other => panic!("expected tool message, got {other:?}"),
        }
    }

    #[test]
    fn multiple_calls_run_in_order() {
        let db = Database::open_in_memory().unwrap();
        let model = ScriptedModel::new(vec![
            Ok(AssistantReply::calls(vec![
                ToolCall::new("a", "add_task", r#"{"title":"first"}"#),
                ToolCall::new("b", "get_task_detail", r#"{"task_id":1}"#),
                ToolCall::new("c", "no_such_tool", "{}"),
            ])),
            Ok(AssistantReply::text("done")),
        ]);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));
        agent.chat("go").unwrap();

        let results: Vec<(String, serde_json::Value)> = agent
            .history()
            .iter()
            .filter_map(|m| match m {
                ChatMessage::Tool {
                    tool_call_id,
                    content,
                } => Some((tool_call_id.clone(), serde_json::from_str(content).unwrap())),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
        assert_eq!(results[1].1["task"]["title"], "first");
        assert_eq!(results[2].1["success"], false);
    }

    #[test]
    fn endless_tool_calls_exhaust_the_turn() {
        let db = Database::open_in_memory().unwrap();
        let replies = (0..=MAX_ROUNDS)
            .map(|i| Ok(call(&format!("call_{i}"), "get_statistics", "{}")))
            .collect();
        let model = ScriptedModel::new(replies);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));

        let err = agent.chat("loop forever").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConversationExhausted);
        assert_eq!(model.remaining(), 1);

        let history = agent.history();
        assert_eq!(history.len(), 2 + 2 * MAX_ROUNDS);
        assert_eq!(history[1], ChatMessage::user("loop forever"));
        for pair in history[2..].chunks(2) {
            assert_eq!(pair[0].role(), "assistant");
            assert_eq!(pair[1].role(), "tool");
        }
    }

    #[test]
    fn model_error_keeps_history_consistent() {
        let db = Database::open_in_memory().unwrap();
        let model = ScriptedModel::new(vec![
            Ok(call("call_1", "get_statistics", "{}")),
            Err(TodoError::model("429 Too Many Requests")),
            Ok(AssistantReply::text("recovered")),
        ]);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));

        let err = agent.chat("stats?").unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelError);
        let roles: Vec<&str> = agent.history().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);

        assert_eq!(agent.chat("try again").unwrap(), "recovered");
    }

    #[test]
    fn clear_history_keeps_system_prompt() {
        let db = Database::open_in_memory().unwrap();
        let model = ScriptedModel::new(vec![Ok(AssistantReply::text("ok"))]);
        let mut agent = Agent::new(&model, TodoTools::new(db.conn()));
        agent.chat("hi").unwrap();

        agent.clear_history();
        assert_eq!(agent.history(), &[ChatMessage::system(SYSTEM_PROMPT)]);
    }
}
