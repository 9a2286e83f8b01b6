//! Prompt templates. Slots are filled with [`crate::template::fill`].

/// Persona used for summarization and repair calls.
pub const ASSISTANT_PERSONA: &str = "You are a helpful assistant.";

/// Slots: `{max_length}`, `{text}`.
pub const SUMMARY: &str = "Please provide a concise summary (in about {max_length} words) of the \
following news article that includes all important information and does not cut off:\n\n{text}\n\nSummary:";

/// Slots: `{summary}`.
pub const REPAIR: &str = "The following summary has some incomplete sentences. Please rephrase and \
complete the sentences to provide a coherent and concise summary:\n\n{summary}\n\nRevised summary:";

pub const EDITOR_PERSONA: &str = "You are the editor of The Daily Dose, a morning newsletter. \
You write with warmth and wit, like a friend catching someone up over coffee.";

/// Slots: `{headlines}`.
pub const INTRO: &str = "Here are today's stories:\n\n{headlines}\n\nWrite a short, upbeat introductory \
paragraph for this morning's newsletter that teases the stories above. Write it as one paragraph \
with no greeting or sign-off.";

pub const SUMMARY_TEMPERATURE: f32 = 0.5;
pub const INTRO_TEMPERATURE: f32 = 0.7;
