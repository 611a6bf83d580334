//! Parsing and validation of the model's JSON verdict.

use log::info;
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{EvaluationError, EvaluationResult};
use crate::model::Recommendation;

/// Per-skill verdict. Serialized as a map keyed by skill name, in the order
/// the model listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub skill: String,
    pub score: Option<u8>,
    pub evidence: Option<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillMatches(pub Vec<SkillMatch>);

impl SkillMatches {
    pub fn iter(&self) -> impl Iterator<Item = &SkillMatch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.0.iter().filter(|m| m.matched).count()
    }
}

impl Serialize for SkillMatches {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for m in &self.0 {
            map.serialize_entry(
                &m.skill,
                &json!({
                    "score": m.score,
                    "evidence": m.evidence,
                    "matched": m.matched,
                }),
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SkillMatches {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(entries) = value else {
            return Ok(SkillMatches::default());
        };
        let matches = entries
            .into_iter()
            .map(|(skill, entry)| SkillMatch {
                skill,
                score: entry.get("score").and_then(score_from_value),
                evidence: entry
                    .get("evidence")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                matched: entry.get("matched").and_then(Value::as_bool).unwrap_or(false),
            })
            .collect();
        Ok(SkillMatches(matches))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredNote {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceAssessment {
    /// Free-form; models answer with numbers and with phrases like "5+".
    #[serde(default)]
    pub years_of_experience: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub meets_requirement: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
}

/// The structured body of an evaluation. Every field is optional in
/// practice: a field of the wrong shape reads as empty instead of failing
/// the whole evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    #[serde(default, deserialize_with = "lenient")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub skill_matches: SkillMatches,
    #[serde(default, deserialize_with = "lenient")]
    pub experience_assessment: Option<ExperienceAssessment>,
    #[serde(default, deserialize_with = "lenient")]
    pub technical_depth: Option<ScoredNote>,
    #[serde(default, deserialize_with = "lenient")]
    pub culture_fit: Option<ScoredNote>,
    #[serde(default, deserialize_with = "lenient")]
    pub github_contribution: Option<ScoredNote>,
    #[serde(default, deserialize_with = "lenient")]
    pub key_highlights: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub interview_questions: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recommendation_reasoning: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value))
}

/// Sub-scores accept integers, floats and numeric strings in 0..=10.
fn score_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = raw.round();
    (0.0..=10.0).contains(&rounded).then_some(rounded as u8)
}

/// Validates the model's message content and builds the result.
///
/// `overall_score` must be an integer in 1..=10 and `recommendation` one of
/// "interview"/"decline" (any case). The stored recommendation is always
/// recomputed from the score.
pub fn parse_evaluation(content: &str, model: &str) -> Result<EvaluationResult, EvaluationError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| EvaluationError::MalformedResponse(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(EvaluationError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let score = take_required(&mut root, "overall_score")?;
    let recommendation = take_required(&mut root, "recommendation")?;
    let analysis = take_required(&mut root, "detailed_analysis")?;

    let score = match score.as_i64() {
        Some(n) if (1..=10).contains(&n) => n as u8,
        _ => return Err(EvaluationError::ScoreOutOfRange(score.to_string())),
    };

    let claimed = recommendation
        .as_str()
        .and_then(|s| Recommendation::parse(&s.to_lowercase()))
        .ok_or_else(|| {
            let shown = match &recommendation {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            EvaluationError::InvalidRecommendation(shown)
        })?;

    let mut analysis: DetailedAnalysis = serde_json::from_value(analysis)
        .map_err(|e| EvaluationError::MalformedResponse(format!("detailed_analysis: {}", e)))?;

    if analysis.summary.is_none() {
        analysis.summary = take_string(&mut root, "summary");
    }
    if analysis.recommendation_reasoning.is_none() {
        analysis.recommendation_reasoning = take_string(&mut root, "recommendation_reasoning");
    }

    let final_recommendation = Recommendation::for_score(score);
    if final_recommendation != claimed {
        info!(
            "Overriding model recommendation '{}' with '{}' for score {}",
            claimed, final_recommendation, score
        );
    }

    Ok(EvaluationResult {
        score,
        recommendation: final_recommendation,
        analysis,
        model: model.to_string(),
    })
}

fn take_required(root: &mut Map<String, Value>, field: &'static str) -> Result<Value, EvaluationError> {
    match root.remove(field) {
        Some(Value::Null) | None => Err(EvaluationError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn take_string(root: &mut Map<String, Value>, field: &str) -> Option<String> {
    match root.remove(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(score: Value, recommendation: &str) -> String {
        json!({
            "overall_score": score,
            "recommendation": recommendation,
            "detailed_analysis": {
                "strengths": ["Rust"],
                "skill_matches": {
                    "Rust": {"score": 9, "evidence": "Five years of systems work", "matched": true},
                    "Kubernetes": {"score": 2, "evidence": "Not mentioned", "matched": false},
                    "Go": {"score": "6", "matched": true}
                }
            },
            "summary": "Strong systems engineer.",
            "recommendation_reasoning": "Solid match."
        })
        .to_string()
    }

    #[test]
    fn test_valid_verdict() {
        let result = parse_evaluation(&verdict(json!(8), "interview"), "test-model").unwrap();
        assert_eq!(result.score, 8);
        assert_eq!(result.recommendation, Recommendation::Interview);
        assert_eq!(result.model, "test-model");
        assert_eq!(result.analysis.strengths, vec!["Rust"]);
        assert_eq!(result.analysis.summary.as_deref(), Some("Strong systems engineer."));
        assert_eq!(
            result.analysis.recommendation_reasoning.as_deref(),
            Some("Solid match.")
        );
    }

    #[test]
    fn test_skill_matches_keep_model_order() {
        let result = parse_evaluation(&verdict(json!(7), "interview"), "m").unwrap();
        let skills: Vec<&str> = result
            .analysis
            .skill_matches
            .iter()
            .map(|m| m.skill.as_str())
            .collect();
        assert_eq!(skills, vec!["Rust", "Kubernetes", "Go"]);
        assert_eq!(result.analysis.skill_matches.matched_count(), 2);
        assert_eq!(result.analysis.skill_matches.0[2].score, Some(6));
    }

    #[test]
    fn test_recommendation_recomputed_from_score() {
        let low = parse_evaluation(&verdict(json!(4), "Interview"), "m").unwrap();
        assert_eq!(low.recommendation, Recommendation::Decline);

        let high = parse_evaluation(&verdict(json!(6), "decline"), "m").unwrap();
        assert_eq!(high.recommendation, Recommendation::Interview);
    }

    #[test]
    fn test_score_must_be_integer_in_range() {
        for bad in [json!(0), json!(11), json!(7.5), json!("8")] {
            let err = parse_evaluation(&verdict(bad.clone(), "interview"), "m").unwrap_err();
            assert!(
                matches!(err, EvaluationError::ScoreOutOfRange(_)),
                "score {} gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_unknown_recommendation_rejected() {
        let err = parse_evaluation(&verdict(json!(7), "maybe"), "m").unwrap_err();
        assert_eq!(err, EvaluationError::InvalidRecommendation("maybe".into()));
    }

    #[test]
    fn test_missing_fields_reported_by_name() {
        let err = parse_evaluation(r#"{"recommendation":"interview","detailed_analysis":{}}"#, "m")
            .unwrap_err();
        assert_eq!(err, EvaluationError::MissingField("overall_score"));

        let err = parse_evaluation(r#"{"overall_score":7,"recommendation":"interview"}"#, "m")
            .unwrap_err();
        assert_eq!(err, EvaluationError::MissingField("detailed_analysis"));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = parse_evaluation("I think they are great", "m").unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
        assert!(err.to_string().starts_with("Failed to parse AI response as JSON"));
    }

    #[test]
    fn test_wrongly_shaped_fields_read_as_empty() {
        let content = json!({
            "overall_score": 5,
            "recommendation": "decline",
            "detailed_analysis": {
                "strengths": "not a list",
                "technical_depth": {"score": 7.4, "notes": "ok"},
                "culture_fit": "n/a",
                "summary": "Inside analysis."
            },
            "summary": "Top level."
        })
        .to_string();
        let result = parse_evaluation(&content, "m").unwrap();
        assert!(result.analysis.strengths.is_empty());
        assert_eq!(result.analysis.technical_depth.unwrap().score, Some(7));
        assert!(result.analysis.culture_fit.is_none());
        assert_eq!(result.analysis.summary.as_deref(), Some("Inside analysis."));
    }

    #[test]
    fn test_skill_matches_serialize_as_ordered_map() {
        let matches = SkillMatches(vec![
            SkillMatch {
                skill: "Zig".into(),
                score: Some(3),
                evidence: None,
                matched: false,
            },
            SkillMatch {
                skill: "Ada".into(),
                score: Some(8),
                evidence: Some("Avionics".into()),
                matched: true,
            },
        ]);
        let text = serde_json::to_string(&matches).unwrap();
        assert!(text.find("Zig").unwrap() < text.find("Ada").unwrap());
        let back: SkillMatches = serde_json::from_str(&text).unwrap();
        assert_eq!(back, matches);
    }
}
