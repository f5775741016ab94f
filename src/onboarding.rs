//! Onboarding questionnaire producing the dopamine index.
//!
//! Every question starts pre-answered with the neutral score 2, so a user who
//! skips questions lands on an index of 50 rather than 0.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use serde::Serialize;

pub const MAX_RESPONSE: u8 = 4;
pub const DEFAULT_RESPONSE: u8 = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    pub help_text: &'static str,
    /// Contribution of this question to the index.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OnboardingOption {
    pub label: &'static str,
    pub score: u8,
}

pub const OPTIONS: [OnboardingOption; 5] = [
    OnboardingOption { label: "Rarely", score: 0 },
    OnboardingOption { label: "Sometimes", score: 1 },
    OnboardingOption { label: "Often", score: 2 },
    OnboardingOption { label: "Very Often", score: 3 },
    OnboardingOption { label: "Constantly", score: 4 },
];

const QUESTION_TEXT: [(&str, &str, &str); 8] = [
    (
        "scrolling",
        "How often do you lose track of time scrolling?",
        "High frequency indicates overstimulation.",
    ),
    (
        "morning_check",
        "Do you check your phone within 5 minutes of waking?",
        "Morning habits set the tone for the day.",
    ),
    (
        "restlessness",
        "How restless do you feel when away from screens?",
        "Restlessness = higher dopamine load.",
    ),
    (
        "notifications",
        "How often do notifications interrupt deep work?",
        "Interruptions fracture focus.",
    ),
    (
        "late_nights",
        "How late do you stay up browsing or gaming?",
        "Late hours affect recovery.",
    ),
    (
        "impulse_checks",
        "How impulsive are your social media checks?",
        "Impulse loops accelerate dopamine spikes.",
    ),
    (
        "starting_tasks",
        "How difficult is it to start a focused task?",
        "Difficulty starting hints at overload.",
    ),
    (
        "balance",
        "How satisfied are you with your current balance?",
        "Satisfaction correlates with lower stimulation.",
    ),
];

pub fn default_questions() -> Vec<OnboardingQuestion> {
    let weight = 1.0 / QUESTION_TEXT.len() as f64;
    QUESTION_TEXT
        .iter()
        .map(|&(id, prompt, help_text)| OnboardingQuestion {
            id,
            prompt,
            help_text,
            weight,
        })
        .collect()
}

/// Weighted mean of normalised responses, scaled to 0..=100.
pub fn dopamine_index(questions: &[OnboardingQuestion], responses: &HashMap<&str, u8>) -> u8 {
    let total_weight: f64 = questions.iter().map(|q| q.weight).sum();
    if total_weight <= 0.0 {
        return 0;
    }

    let weighted: f64 = questions
        .iter()
        .map(|q| {
            let answer = responses.get(q.id).copied().unwrap_or(0).min(MAX_RESPONSE);
            (answer as f64 / MAX_RESPONSE as f64) * q.weight
        })
        .sum();

    (100.0 * weighted / total_weight).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone)]
pub struct Questionnaire {
    questions: Vec<OnboardingQuestion>,
    responses: HashMap<&'static str, u8>,
    answered: HashSet<&'static str>,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::new(default_questions())
    }
}

impl Questionnaire {
    pub fn new(questions: Vec<OnboardingQuestion>) -> Self {
        let responses = questions
            .iter()
            .map(|q| (q.id, DEFAULT_RESPONSE))
            .collect();
        Self {
            questions,
            responses,
            answered: HashSet::new(),
        }
    }

    pub fn questions(&self) -> &[OnboardingQuestion] {
        &self.questions
    }

    pub fn response(&self, id: &str) -> Option<u8> {
        self.responses.get(id).copied()
    }

    pub fn answer(&mut self, id: &str, score: u8) -> Result<()> {
        if score > MAX_RESPONSE {
            bail!("response {score} is outside 0..={MAX_RESPONSE}");
        }
        let Some(question) = self.questions.iter().find(|q| q.id == id) else {
            bail!("unknown onboarding question {id}");
        };
        self.responses.insert(question.id, score);
        self.answered.insert(question.id);
        Ok(())
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answered.len() as f64 / self.questions.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.answered.len() == self.questions.len()
    }

    pub fn score(&self) -> u8 {
        dopamine_index(&self.questions, &self.responses)
    }
}
