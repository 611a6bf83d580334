//! Builders for collaborator responses.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use hirelens::enrichment::{EnrichmentResult, GithubProfile, Repository};
use hirelens::evaluator::{DetailedAnalysis, EvaluationResult, SkillMatch, SkillMatches};
use hirelens::model::Recommendation;

pub const TEST_MODEL: &str = "test-model";

/// A resume that mentions a GitHub profile.
pub const RESUME_WITH_PROFILE: &str = "Jane Doe\nSenior Rust engineer\n\
    Eight years building backend services in Rust and Go.\n\
    Code: https://github.com/janedoe\n";

/// A resume without any profile reference.
pub const RESUME_PLAIN: &str = "John Smith\nBackend developer\n\
    Five years of Python and PostgreSQL.\n";

/// A validated evaluation with a consistent recommendation.
pub fn evaluation(score: u8) -> EvaluationResult {
    EvaluationResult {
        score,
        recommendation: Recommendation::for_score(score),
        analysis: DetailedAnalysis {
            strengths: vec!["Strong Rust background".to_string()],
            weaknesses: vec!["Little frontend work".to_string()],
            skill_matches: SkillMatches(vec![SkillMatch {
                skill: "Rust".to_string(),
                score: Some(9),
                evidence: Some("Eight years of Rust services".to_string()),
                matched: true,
            }]),
            key_highlights: vec!["Led a storage engine rewrite".to_string()],
            concerns: vec!["Short tenure at last job".to_string()],
            interview_questions: vec!["How do you structure async services?".to_string()],
            summary: Some("Experienced backend engineer.".to_string()),
            recommendation_reasoning: Some("Skills match the role.".to_string()),
            ..Default::default()
        },
        model: TEST_MODEL.to_string(),
    }
}

pub fn repository(name: &str, language: &str, stars: u64, is_fork: bool) -> Repository {
    Repository {
        name: name.to_string(),
        description: Some(format!("{} project", name)),
        language: Some(language.to_string()),
        stars,
        forks: 0,
        is_fork,
        created_at: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
        updated_at: Some(Utc::now()),
        size: 100,
        topics: vec!["cli".to_string()],
    }
}

pub fn github_result(login: &str) -> EnrichmentResult {
    EnrichmentResult {
        profile: GithubProfile {
            login: login.to_string(),
            name: Some("Jane Doe".to_string()),
            public_repos: 3,
            followers: 12,
            ..Default::default()
        },
        repositories: vec![
            repository("engine", "Rust", 3, false),
            repository("tools", "Rust", 2, false),
            repository("upstream", "Go", 40, true),
        ],
    }
}

/// Chat-completions body whose message content is `content` serialized.
pub fn chat_completion(content: &Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content.to_string()},
            "finish_reason": "stop"
        }]
    })
}

/// A well-formed model answer.
pub fn model_answer(score: i64, recommendation: &str) -> Value {
    json!({
        "overall_score": score,
        "recommendation": recommendation,
        "detailed_analysis": {
            "strengths": ["Rust"],
            "weaknesses": [],
            "skill_matches": {"Rust": {"score": 9, "evidence": "years of Rust", "matched": true}},
            "key_highlights": ["Shipped a database"],
            "concerns": [],
            "interview_questions": ["Tell us about lifetimes"]
        },
        "summary": "Solid candidate.",
        "recommendation_reasoning": "Meets the bar."
    })
}
