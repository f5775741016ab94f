use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const JOURNAL_PROMPTS: [&str; 4] = [
    "What felt real today?",
    "How did your mind react to silence?",
    "Where did you feel the biggest urge to scroll?",
    "What micro-win are you proud of?",
];

const SUMMARY_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub prompt: String,
    pub text: String,
    pub summary: Option<String>,
}

impl JournalEntry {
    /// Build an entry from raw user input. Returns `None` when the text is blank.
    pub fn compose(prompt: &str, text: &str, date: DateTime<Utc>) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4(),
            date,
            prompt: prompt.to_string(),
            text: trimmed.to_string(),
            summary: Some(summarize(trimmed)),
        })
    }
}

pub fn default_prompt() -> &'static str {
    JOURNAL_PROMPTS[0]
}

pub fn random_prompt() -> &'static str {
    JOURNAL_PROMPTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_else(default_prompt)
}

/// Last non-empty sentence, capped at 80 characters.
pub fn summarize(text: &str) -> String {
    let last_sentence = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last();

    match last_sentence {
        Some(sentence) => sentence.chars().take(SUMMARY_MAX_CHARS).collect(),
        None if text.chars().count() > SUMMARY_MAX_CHARS => {
            let head: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
            format!("{head}…")
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_last_sentence() {
        let text = "The first ten minutes were restless. Then my focus softened.";
        assert_eq!(summarize(text), "Then my focus softened");
    }

    #[test]
    fn summary_without_boundary_is_whole_text_capped() {
        let text = "a".repeat(120);
        assert_eq!(summarize(&text).chars().count(), 80);
        assert_eq!(summarize("walked outside"), "walked outside");
    }

    #[test]
    fn summary_of_only_dots_keeps_text() {
        assert_eq!(summarize("..."), "...");
    }

    #[test]
    fn compose_trims_and_rejects_blank() {
        let now = Utc::now();
        assert!(JournalEntry::compose(default_prompt(), "   \n", now).is_none());

        let entry = JournalEntry::compose(default_prompt(), "  Walked without my phone. ", now)
            .unwrap();
        assert_eq!(entry.text, "Walked without my phone.");
        assert_eq!(entry.summary.as_deref(), Some("Walked without my phone"));
        assert_eq!(entry.prompt, "What felt real today?");
    }

    #[test]
    fn random_prompt_comes_from_catalog() {
        assert!(JOURNAL_PROMPTS.contains(&random_prompt()));
    }
}
