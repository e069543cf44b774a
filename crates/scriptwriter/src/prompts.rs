//! Prompt text for the continuation step.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes,
//! so logs show which prompt produced a given script.

use crate::contracts::continuation_schema;
use crate::state::GenerationState;

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.1.0";

/// Role and budget rules sent as the system message on every step.
pub const CONTINUATION_PREAMBLE: &str = "\
You are a YouTube script continuation agent.

Your task is to generate the next part of an ongoing YouTube script based on the given \
topic, current word count, maximum word limit, and summary of what has been written so far.

Guidelines:
- If it's the beginning of the script, create an engaging hook to capture viewers' attention.
- **CRITICAL**: Strictly adhere to the maximum word limit. NEVER exceed it.
- Write ONLY the number of words remaining (or fewer). If only n words remain, write AT MOST n words.
- Calculate: Words Remaining = Max Words - Current Word Count. Your continuation MUST be <= Words Remaining.
- When the new continuation's word count is very close or equal to the remaining words count, \
mark the script as completed.
- Try to generate as much content as possible within the remaining word limit.
- When approaching the limit, start wrapping up naturally.
";

/// Full system preamble: rules followed by the response schema.
pub fn system_preamble() -> String {
    format!(
        "{CONTINUATION_PREAMBLE}\n\
         Respond with a single JSON object matching this JSON schema, and nothing else:\n\
         {}\n",
        continuation_schema()
    )
}

/// User message carrying the five state fields. The script itself is never sent.
pub fn continuation_prompt(state: &GenerationState) -> String {
    format!(
        "Please write me the next part of a YouTube script based on the data given below.\n\
         Topic: {topic}\n\
         Current Word Count: {word_count}\n\
         Maximum Word Limit: {max_words}\n\
         **Words Remaining: {remaining}** (DO NOT EXCEED THIS!)\n\
         Summary of Written Content So Far: {summary}",
        topic = state.topic(),
        word_count = state.word_count(),
        max_words = state.max_words(),
        remaining = state.words_remaining(),
        summary = state.summary().trim_end(),
    )
}
