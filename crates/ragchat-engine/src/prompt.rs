use ragchat_core::config::HistoryPolicy;
use ragchat_core::types::{ChatMessage, HistoryEntry, Role};

/// Retrieved texts in rank order, separated by a blank line.
pub fn build_context(sources: &[String]) -> String {
    sources.join("\n\n")
}

pub fn grounded_question(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}")
}

/// System turn, optional prior turns, then the grounded question.
pub fn build_messages(
    system_prompt: &str,
    question: &str,
    sources: &[String],
    history: &[HistoryEntry],
    policy: HistoryPolicy,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt)];
    if policy == HistoryPolicy::Fold {
        messages.extend(history_messages(history));
    }
    let context = build_context(sources);
    messages.push(ChatMessage::user(grounded_question(&context, question)));
    messages
}

/// Plain strings alternate user/assistant by position; objects keep their
/// role. The system turn is ours alone, so client `system` turns become `user`.
fn history_messages(history: &[HistoryEntry]) -> impl Iterator<Item = ChatMessage> + '_ {
    history.iter().enumerate().map(|(i, entry)| match entry {
        HistoryEntry::Text(text) if i % 2 == 0 => ChatMessage::user(text.clone()),
        HistoryEntry::Text(text) => ChatMessage::assistant(text.clone()),
        HistoryEntry::Turn {
            role: Role::Assistant,
            content,
        } => ChatMessage::assistant(content.clone()),
        HistoryEntry::Turn { content, .. } => ChatMessage::user(content.clone()),
    })
}
