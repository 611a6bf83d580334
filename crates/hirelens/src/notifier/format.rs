//! Telegram message text and inline keyboard.

use std::fmt::Write as _;

use serde_json::{json, Value};

use super::EvaluationSummary;
use crate::model::{FeedbackKind, Recommendation};
use crate::sanitize::truncate_chars;

const MAX_LISTED: usize = 3;
const MAX_SUMMARY_CHARS: usize = 500;
const MAX_REASONING_CHARS: usize = 200;

pub fn score_emoji(score: u8) -> &'static str {
    match score {
        9.. => "🌟",
        7..=8 => "⭐",
        5..=6 => "👍",
        _ => "👎",
    }
}

/// Escapes the characters legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | ']' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn shorten(text: &str, max: usize) -> String {
    let cut = truncate_chars(text, max);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

pub fn format_message(summary: &EvaluationSummary) -> String {
    let analysis = &summary.analysis;
    let decision = match summary.recommendation {
        Recommendation::Interview => "✅",
        Recommendation::Decline => "❌",
    };

    let mut text = String::new();
    let _ = writeln!(text, "🎯 *New Candidate Evaluation*\n");
    let _ = writeln!(text, "*Candidate:* {}", escape_markdown(&summary.candidate_name));
    let _ = writeln!(text, "*Email:* {}", escape_markdown(&summary.candidate_email));
    let _ = writeln!(text, "*Position:* {}\n", escape_markdown(&summary.position));
    let _ = writeln!(
        text,
        "{} *Overall Score:* {}/10",
        score_emoji(summary.score),
        summary.score
    );
    let _ = writeln!(
        text,
        "{} *Recommendation:* {}\n",
        decision,
        summary.recommendation.as_str().to_uppercase()
    );

    if !analysis.key_highlights.is_empty() {
        let _ = writeln!(text, "*💡 Key Highlights:*");
        for item in analysis.key_highlights.iter().take(MAX_LISTED) {
            let _ = writeln!(text, "  • {}", escape_markdown(item));
        }
        text.push('\n');
    }

    if !analysis.concerns.is_empty() {
        let _ = writeln!(text, "*⚠️ Concerns:*");
        for item in analysis.concerns.iter().take(MAX_LISTED) {
            let _ = writeln!(text, "  • {}", escape_markdown(item));
        }
        text.push('\n');
    }

    if !analysis.skill_matches.is_empty() {
        let _ = writeln!(
            text,
            "*✓ Matched Skills:* {}/{}\n",
            analysis.skill_matches.matched_count(),
            analysis.skill_matches.len()
        );
    }

    if let Some(s) = analysis.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(
            text,
            "*Summary:*\n{}\n",
            escape_markdown(&shorten(s, MAX_SUMMARY_CHARS))
        );
    }

    if let Some(r) = analysis
        .recommendation_reasoning
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        let _ = writeln!(
            text,
            "*Reasoning:*\n{}",
            escape_markdown(&shorten(r, MAX_REASONING_CHARS))
        );
    }

    text
}

pub fn callback_data(kind: FeedbackKind, evaluation_id: &str) -> String {
    format!("{}_{}", kind.as_str(), evaluation_id)
}

/// Bot API `InlineKeyboardMarkup`: approve/reject on the first row,
/// comment and a details link on the second.
pub fn action_keyboard(evaluation_id: &str, candidate_id: &str, details_base_url: &str) -> Value {
    json!({
        "inline_keyboard": [
            [
                {"text": "✅ Approve", "callback_data": callback_data(FeedbackKind::Approve, evaluation_id)},
                {"text": "❌ Reject", "callback_data": callback_data(FeedbackKind::Reject, evaluation_id)},
            ],
            [
                {"text": "💬 Add Comment", "callback_data": callback_data(FeedbackKind::Comment, evaluation_id)},
                {
                    "text": "📄 View Details",
                    "url": format!("{}/candidates/{}", details_base_url.trim_end_matches('/'), candidate_id),
                },
            ],
        ]
    })
}
