//! Prompt assembly for answering and summarization calls.

use mnemo_rs_memory::{MemoryRecord, Message, SessionContext};
use mnemo_rs_protocol::PromptMessage;

/// System instruction for answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are an intelligent assistant that uses short-term memory \
(the current conversation context) and long-term memory (persisted information about the user) \
to give personalized replies.
Short-term memory holds the recent conversation and a summary of older turns; long-term memory \
holds durable facts about the user.
Combine both kinds of memory to give coherent, personalized replies.";

/// System instruction for summary generation.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a conversation summarization assistant. \
Summarize the following conversation history into concise key points, keeping key information \
and context.";

const SUMMARY_HEADING: &str = "[Conversation summary]";
const RECENT_HEADING: &str = "[Recent conversation]";
const RECALL_HEADING: &str = "Relevant stored information:";

/// Render messages as `role: content` lines.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(message.role.as_str());
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

/// Short-term section: cached summary (if any) followed by the recent window.
pub fn render_short_term(context: &SessionContext) -> String {
    let mut out = String::new();
    if let Some(summary) = context.summary_text() {
        out.push_str(SUMMARY_HEADING);
        out.push('\n');
        out.push_str(summary.trim_end());
        out.push_str("\n\n");
    }
    out.push_str(RECENT_HEADING);
    out.push('\n');
    out.push_str(&render_transcript(&context.recent));
    out
}

/// Long-term section: a numbered list of recalled records, empty when none.
pub fn render_long_term(records: &[MemoryRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut out = String::from(RECALL_HEADING);
    out.push('\n');
    for (idx, record) in records.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, record.content));
    }
    out
}

/// Deterministic merge of short-term context, recalled records and the query.
pub fn compose_answer_prompt(
    context: &SessionContext,
    recalled: &[MemoryRecord],
    query: &str,
) -> Vec<PromptMessage> {
    let user = format!(
        "Short-term memory (conversation history):\n{}\n\
         Long-term memory (user information):\n{}\n\
         Current user input: {}",
        render_short_term(context),
        render_long_term(recalled),
        query
    );
    vec![
        PromptMessage::system(ANSWER_SYSTEM_PROMPT),
        PromptMessage::user(user),
    ]
}

/// Prompt compressing `transcript` into a summary.
pub fn compose_summary_prompt(transcript: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(SUMMARY_SYSTEM_PROMPT),
        PromptMessage::user(format!(
            "Please summarize the following conversation history:\n\n{transcript}"
        )),
    ]
}

/// Prompt folding newly aged rounds into an existing summary.
pub fn compose_incremental_summary_prompt(
    previous_summary: &str,
    transcript: &str,
) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(SUMMARY_SYSTEM_PROMPT),
        PromptMessage::user(format!(
            "Please update the summary below with the conversation that follows it.\n\n\
             Current summary:\n{previous_summary}\n\n\
             Conversation since the summary:\n{transcript}"
        )),
    ]
}
