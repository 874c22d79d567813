use serde::{Deserialize, Serialize};

use extract::PersonProfile;
use query::FALLBACK_ANSWER;

pub const SKY_DOCUMENT: &str = "The sky is blue.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAPair {
    pub question: String,
    pub expected: Expectation,
    pub category: QuestionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum QuestionType {
    Answerable,   // The document holds the answer
    Unanswerable, // Must produce the fallback sentence
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expectation {
    /// Every keyword appears, case-insensitively.
    Contains(Vec<String>),
    /// The trimmed answer equals this text exactly.
    Exact(String),
}

/// Questions asked against a store built from [`SKY_DOCUMENT`].
pub fn get_test_set() -> Vec<QAPair> {
    vec![
        QAPair {
            question: "What color is the sky?".to_string(),
            expected: Expectation::Contains(vec!["blue".to_string()]),
            category: QuestionType::Answerable,
        },
        QAPair {
            question: "What is the capital of France?".to_string(),
            expected: Expectation::Exact(FALLBACK_ANSWER.to_string()),
            category: QuestionType::Unanswerable,
        },
    ]
}

/// Simple scoring: fraction of expected keywords that appear in the answer
pub fn score_answer(answer: &str, expected_keywords: &[String]) -> f64 {
    if expected_keywords.is_empty() {
        return 1.0;
    }

    let answer = answer.to_lowercase();
    let hits = expected_keywords
        .iter()
        .filter(|keyword| answer.contains(&keyword.to_lowercase()))
        .count();

    hits as f64 / expected_keywords.len() as f64
}

pub fn evaluate(answer: &str, expected: &Expectation) -> f64 {
    match expected {
        Expectation::Contains(keywords) => score_answer(answer, keywords),
        Expectation::Exact(text) if answer.trim() == text.as_str() => 1.0,
        Expectation::Exact(_) => 0.0,
    }
}

/// Problems with a generated profile; empty when it looks right.
pub fn check_profile(profile: &PersonProfile) -> Vec<String> {
    let mut problems = Vec::new();
    if profile.name.trim().is_empty() {
        problems.push("name is empty".to_string());
    }
    if profile.age == 0 {
        problems.push("age is not positive".to_string());
    }
    if profile.interests.is_empty() {
        problems.push("no interests listed".to_string());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_answer_is_case_insensitive() {
        let keywords = vec!["blue".to_string(), "sky".to_string()];
        assert_eq!(score_answer("The SKY is Blue.", &keywords), 1.0);
        assert_eq!(score_answer("It is blue.", &keywords), 0.5);
        assert_eq!(score_answer("No idea.", &keywords), 0.0);
    }

    #[test]
    fn test_exact_expectation_ignores_surrounding_whitespace_only() {
        let expected = Expectation::Exact(FALLBACK_ANSWER.to_string());
        assert_eq!(evaluate(&format!("  {}\n", FALLBACK_ANSWER), &expected), 1.0);
        assert_eq!(evaluate("I don't know based on the document.", &expected), 0.0);
        assert_eq!(evaluate("Paris.", &expected), 0.0);
    }

    #[test]
    fn test_check_profile() {
        let mut profile = PersonProfile {
            name: "Kelvin".to_string(),
            age: 32,
            bio: "Engineer.".to_string(),
            education: None,
            interests: vec!["hiking".to_string()],
        };
        assert!(check_profile(&profile).is_empty());

        profile.age = 0;
        profile.interests.clear();
        assert_eq!(check_profile(&profile).len(), 2);
    }
}
