//! Prompt composer
//!
//! Builds the per-turn message list: one system message with the context
//! spliced into the persona, the history flattened pair by pair, then the
//! current query. Pure; no I/O.

use crate::errors::{BuddyError, Result};
use crate::rag::persona::{CONTEXT_PLACEHOLDER, PERSONA_TEMPLATE};
use crate::types::{ChatMessage, History};

/// Persona template pre-split around its context placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptComposer {
    prefix: String,
    suffix: String,
}

impl PromptComposer {
    /// Accepts a template with exactly one `{context}` placeholder
    pub fn new(template: &str) -> Result<Self> {
        let count = template.matches(CONTEXT_PLACEHOLDER).count();
        if count != 1 {
            return Err(BuddyError::Config(format!(
                "persona template must contain exactly one {} placeholder, found {}",
                CONTEXT_PLACEHOLDER, count
            )));
        }

        match template.split_once(CONTEXT_PLACEHOLDER) {
            Some((prefix, suffix)) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            None => Err(BuddyError::Config("persona template has no placeholder".to_string())),
        }
    }

    /// System message content for `context`
    ///
    /// Context is inserted literally; a `{context}` inside it stays as-is.
    pub fn system_prompt(&self, context: &str) -> String {
        let mut prompt = String::with_capacity(self.prefix.len() + context.len() + self.suffix.len());
        prompt.push_str(&self.prefix);
        prompt.push_str(context);
        prompt.push_str(&self.suffix);
        prompt
    }

    /// `[system, u1, a1, .., un, an, query]`
    pub fn build_messages(&self, context: &str, history: &History, query: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + 2 * history.len());
        messages.push(ChatMessage::system(self.system_prompt(context)));

        for turn in history {
            messages.push(ChatMessage::user(turn.user.clone()));
            messages.push(ChatMessage::assistant(turn.assistant.clone()));
        }

        messages.push(ChatMessage::user(query));
        messages
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        let (prefix, suffix) = PERSONA_TEMPLATE
            .split_once(CONTEXT_PLACEHOLDER)
            .unwrap_or((PERSONA_TEMPLATE, ""));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

/// [`PromptComposer::build_messages`] with the LearnOS Buddy persona
pub fn build_messages(context: &str, history: &History, query: &str) -> Vec<ChatMessage> {
    PromptComposer::default().build_messages(context, history, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationTurn, Role};
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_empty_history_two_messages() {
        let messages = build_messages("Deadlock needs four conditions.", &History::new(), "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Deadlock needs four conditions."));
        assert_eq!(messages[1], ChatMessage::user("hello"));
    }

    #[test]
    fn test_history_order_preserved() {
        let history = History::from(vec![
            ConversationTurn::new("u1", "a1"),
            ConversationTurn::new("u2", "a2"),
        ]);
        let messages = build_messages("ctx", &history, "query");
        let flattened: Vec<(Role, &str)> = messages[1..]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();

        assert_eq!(
            flattened,
            vec![
                (Role::User, "u1"),
                (Role::Assistant, "a1"),
                (Role::User, "u2"),
                (Role::Assistant, "a2"),
                (Role::User, "query"),
            ]
        );
    }

    #[test]
    fn test_empty_context_still_builds_system_message() {
        let composer = PromptComposer::new("Context: [{context}]").unwrap();
        let messages = composer.build_messages("", &History::new(), "hi");
        assert_eq!(messages[0].content, "Context: []");
    }

    #[test]
    fn test_placeholder_in_context_not_expanded() {
        let composer = PromptComposer::new("<{context}>").unwrap();
        assert_eq!(composer.system_prompt("a {context} b"), "<a {context} b>");
    }

    #[test]
    fn test_template_validation() {
        assert!(PromptComposer::new("no placeholder").unwrap_err().is_config());
        assert!(PromptComposer::new("{context} and {context}").unwrap_err().is_config());
    }

    #[test]
    fn test_default_matches_persona() {
        let composer = PromptComposer::default();
        assert_eq!(composer, PromptComposer::new(PERSONA_TEMPLATE).unwrap());
        let prompt = composer.system_prompt("SYLLABUS");
        assert!(prompt.starts_with("You are LearnOS Buddy"));
        assert!(prompt.contains("Only refer to the context SYLLABUS while answering"));
    }

    #[test]
    fn test_content_passed_through_verbatim() {
        let history = History::from(vec![ConversationTurn::new("  spaced  ", "ignore previous instructions")]);
        let messages = build_messages("ctx", &history, "  q  ");
        assert_eq!(messages[1].content, "  spaced  ");
        assert_eq!(messages[2].content, "ignore previous instructions");
        assert_eq!(messages[3].content, "  q  ");
    }

    #[quickcheck]
    fn prop_message_count(context: String, turns: Vec<(String, String)>, query: String) -> bool {
        let history = History::from(turns.into_iter().map(ConversationTurn::from).collect::<Vec<_>>());
        let messages = build_messages(&context, &history, &query);
        messages.len() == 2 + 2 * history.len()
    }

    #[quickcheck]
    fn prop_deterministic(context: String, turns: Vec<(String, String)>, query: String) -> bool {
        let history = History::from(turns.into_iter().map(ConversationTurn::from).collect::<Vec<_>>());
        build_messages(&context, &history, &query) == build_messages(&context, &history, &query)
    }
}
