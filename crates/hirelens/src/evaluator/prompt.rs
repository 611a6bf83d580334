use std::fmt::Write as _;

use super::EvaluationRequest;
use crate::sanitize::truncate_chars;

/// Languages listed in the profile section of the prompt.
const PROMPT_LANGUAGES: usize = 5;

pub const SYSTEM_PROMPT: &str = "You are an experienced technical recruiter and hiring manager \
who knows software engineering, programming languages and industry practice well. Assess \
candidates objectively and give specific, actionable findings.";

const RESPONSE_FORMAT: &str = r#"Respond with a single JSON object of this shape:
{
  "overall_score": <integer 1-10>,
  "recommendation": "<interview or decline>",
  "detailed_analysis": {
    "strengths": ["<strength>", ...],
    "weaknesses": ["<weakness>", ...],
    "skill_matches": {
      "<skill name>": {"score": <integer 1-10>, "evidence": "<short justification>", "matched": <boolean>},
      ...
    },
    "experience_assessment": {"years_of_experience": <estimate>, "meets_requirement": <boolean>, "notes": "<notes>"},
    "technical_depth": {"score": <integer 1-10>, "notes": "<notes>"},
    "culture_fit": {"score": <integer 1-10>, "notes": "<notes>"},
    "github_contribution": {"score": <integer 1-10>, "notes": "<notes>"},
    "key_highlights": ["<highlight>", ...],
    "concerns": ["<concern>", ...],
    "interview_questions": ["<question>", ...]
  },
  "summary": "<two or three sentences about the candidate>",
  "recommendation_reasoning": "<why interview or decline>"
}

Scoring guidance:
1. Score every required skill from evidence in the resume and the GitHub profile.
2. Judge overall technical competency and depth.
3. Compare the candidate's experience with the required years.
4. Treat public GitHub activity as a positive signal.
5. Keep feedback concrete.
6. Recommend "interview" only when overall_score is 6 or higher and most required skills match.
7. Stay objective and fair."#;

/// Builds the user message for one evaluation. The resume is cut to
/// `resume_char_budget` characters.
pub fn build_prompt(request: &EvaluationRequest, resume_char_budget: usize) -> String {
    let job = &request.job;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Evaluate this candidate for the position below.\n");
    let _ = writeln!(prompt, "JOB DESCRIPTION:");
    let _ = writeln!(prompt, "Title: {}", job.title);
    let _ = writeln!(prompt, "Description: {}", job.description);
    let _ = writeln!(prompt, "Required Skills: {}", job.required_skills.join(", "));
    let _ = writeln!(
        prompt,
        "Nice-to-Have Skills: {}",
        job.nice_to_have_skills.join(", ")
    );
    let _ = writeln!(
        prompt,
        "Required Experience: {} years\n",
        job.min_experience_years
    );

    let _ = writeln!(prompt, "CANDIDATE RESUME:");
    let _ = writeln!(
        prompt,
        "{}\n",
        truncate_chars(&request.resume_text, resume_char_budget)
    );

    if let Some(github) = &request.github {
        let languages: Vec<&str> = github
            .languages
            .iter()
            .take(PROMPT_LANGUAGES)
            .map(String::as_str)
            .collect();
        let _ = writeln!(prompt, "GITHUB PROFILE ANALYSIS:");
        let _ = writeln!(prompt, "- Total Repositories: {}", github.total_repos);
        let _ = writeln!(prompt, "- Active Repositories: {}", github.active_repos);
        let _ = writeln!(prompt, "- Primary Languages: {}", languages.join(", "));
        let _ = writeln!(prompt, "- Total Stars Received: {}", github.total_stars);
        let _ = writeln!(
            prompt,
            "- Total Contributions: {}\n",
            github.total_contributions
        );
    }

    prompt.push_str(RESPONSE_FORMAT);
    prompt
}
