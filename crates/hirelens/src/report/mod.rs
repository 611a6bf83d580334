//! Two-page PDF assessment report.
//!
//! Page one carries the header block, summary, highlights, concerns and the
//! skills table; page two the detailed analysis, the recommendation banner
//! and interview questions. Rendering has no side effects: the caller
//! decides where the bytes go.

mod error;
pub mod layout;

use chrono::{DateTime, Utc};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;

use crate::evaluator::{DetailedAnalysis, ScoredNote};
use crate::model::Recommendation;
use crate::sanitize::{sanitize_filename, truncate_chars};

pub use error::ReportError;
use layout::{
    Font, PageBuilder, Rgb, ACCENT, BLACK, CONTENT_WIDTH, GREY, LABEL_FILL, MARGIN_X,
    PAGE_HEIGHT, PAGE_WIDTH, STRIPE_FILL, WHITE,
};

const MAX_SKILL_ROWS: usize = 10;
const MAX_EVIDENCE_CHARS: usize = 50;
const MAX_QUESTIONS: usize = 5;

const INTERVIEW_COLOR: Rgb = Rgb(0x10b981);
const DECLINE_COLOR: Rgb = Rgb(0xef4444);

/// ZapfDingbats codes.
const CHECK_MARK: &str = "4";
const CROSS_MARK: &str = "8";

/// Everything a report shows.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub candidate_name: &'a str,
    pub candidate_email: &'a str,
    pub position: &'a str,
    pub score: u8,
    pub recommendation: Recommendation,
    pub analysis: &'a DetailedAnalysis,
    pub model: &'a str,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, input: &ReportInput<'_>) -> Result<RenderedReport, ReportError> {
        let pages = vec![overview_page(input), analysis_page(input)];
        let bytes = assemble(pages, input)?;
        Ok(RenderedReport {
            filename: report_filename(input.candidate_name, input.generated_at),
            bytes,
        })
    }
}

/// `assessment_{name}_{YYYYMMDD}.pdf`
pub fn report_filename(candidate_name: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "assessment_{}_{}.pdf",
        sanitize_filename(candidate_name),
        generated_at.format("%Y%m%d")
    )
}

fn overview_page(input: &ReportInput<'_>) -> PageBuilder {
    let analysis = input.analysis;
    let mut page = PageBuilder::new();
    page.title("CANDIDATE ASSESSMENT REPORT");

    let date = input.generated_at.format("%Y-%m-%d").to_string();
    let score = format!("{}/10", input.score);
    let recommendation = input.recommendation.as_str().to_uppercase();
    header_block(
        &mut page,
        &[
            ("Candidate:", input.candidate_name, "Score:", score.as_str()),
            ("Email:", input.candidate_email, "Recommendation:", recommendation.as_str()),
            ("Position:", input.position, "Date:", date.as_str()),
        ],
    );

    if let Some(summary) = non_blank(&analysis.summary) {
        page.heading("Executive Summary");
        page.body(summary);
    }

    if !analysis.key_highlights.is_empty() {
        page.heading("Key Highlights");
        for item in &analysis.key_highlights {
            page.bullet(item);
        }
    }

    if !analysis.concerns.is_empty() {
        page.heading("Areas of Concern");
        for item in &analysis.concerns {
            page.bullet(item);
        }
    }

    if !analysis.skill_matches.is_empty() {
        page.heading("Technical Skills Assessment");
        skills_table(&mut page, analysis);
    }

    page
}

fn header_block(page: &mut PageBuilder, rows: &[(&str, &str, &str, &str)]) {
    const ROW: f32 = 18.0;
    const SIZE: f32 = 10.0;
    let columns = [MARGIN_X, MARGIN_X + 72.0, MARGIN_X + 252.0, MARGIN_X + 348.0];

    for (label_a, value_a, label_b, value_b) in rows {
        if !page.fits(ROW) {
            return;
        }
        page.space(ROW);
        let bottom = page.cursor();
        page.fill_rect(columns[0], bottom, 72.0, ROW, LABEL_FILL);
        page.fill_rect(columns[2], bottom, 96.0, ROW, LABEL_FILL);

        let baseline = bottom + 5.0;
        page.text_at(columns[0] + 3.0, baseline, Font::Bold, SIZE, BLACK, label_a);
        page.text_at(columns[1] + 3.0, baseline, Font::Regular, SIZE, BLACK, truncate_chars(value_a, 32));
        page.text_at(columns[2] + 3.0, baseline, Font::Bold, SIZE, BLACK, label_b);
        page.text_at(columns[3] + 3.0, baseline, Font::Regular, SIZE, BLACK, truncate_chars(value_b, 20));
    }
    page.space(6.0);
}

fn skills_table(page: &mut PageBuilder, analysis: &DetailedAnalysis) {
    const ROW: f32 = 16.0;
    const SIZE: f32 = 9.0;
    let columns = [MARGIN_X, MARGIN_X + 110.0, MARGIN_X + 160.0, MARGIN_X + 210.0];

    if !page.fits(ROW) {
        return;
    }
    page.space(ROW);
    let bottom = page.cursor();
    page.fill_rect(MARGIN_X, bottom, CONTENT_WIDTH, ROW, ACCENT);
    for (x, label) in columns.iter().zip(["Skill", "Score", "Match", "Notes"]) {
        page.text_at(x + 3.0, bottom + 5.0, Font::Bold, SIZE, WHITE, label);
    }

    for (idx, skill) in analysis.skill_matches.iter().take(MAX_SKILL_ROWS).enumerate() {
        if !page.fits(ROW) {
            return;
        }
        page.space(ROW);
        let bottom = page.cursor();
        if idx % 2 == 1 {
            page.fill_rect(MARGIN_X, bottom, CONTENT_WIDTH, ROW, STRIPE_FILL);
        }
        let baseline = bottom + 5.0;
        let score = format!("{}/10", skill.score.unwrap_or(0));
        let mark = if skill.matched { CHECK_MARK } else { CROSS_MARK };
        let evidence = skill.evidence.as_deref().unwrap_or("");

        page.text_at(columns[0] + 3.0, baseline, Font::Regular, SIZE, BLACK, truncate_chars(&skill.skill, 22));
        page.text_at(columns[1] + 3.0, baseline, Font::Regular, SIZE, BLACK, &score);
        page.text_at(columns[2] + 14.0, baseline, Font::Symbols, SIZE, BLACK, mark);
        page.text_at(
            columns[3] + 3.0,
            baseline,
            Font::Regular,
            SIZE,
            BLACK,
            truncate_chars(evidence, MAX_EVIDENCE_CHARS),
        );
    }
}

fn analysis_page(input: &ReportInput<'_>) -> PageBuilder {
    let analysis = input.analysis;
    let mut page = PageBuilder::new();
    page.title("Detailed Analysis");

    if let Some(exp) = &analysis.experience_assessment {
        page.heading("Experience Evaluation");
        page.body(&format!(
            "Estimated Years: {}",
            years_display(exp.years_of_experience.as_ref())
        ));
        page.body(&format!(
            "Meets Requirement: {}",
            if exp.meets_requirement.unwrap_or(false) { "Yes" } else { "No" }
        ));
        if let Some(notes) = non_blank(&exp.notes) {
            page.body(notes);
        }
    }

    if let Some(tech) = &analysis.technical_depth {
        scored_section(&mut page, "Technical Depth", tech);
    }
    if let Some(github) = &analysis.github_contribution {
        scored_section(&mut page, "GitHub Activity", github);
    }

    page.heading("Final Recommendation");
    let banner = match input.recommendation {
        Recommendation::Interview => INTERVIEW_COLOR,
        Recommendation::Decline => DECLINE_COLOR,
    };
    const BANNER: f32 = 24.0;
    if page.fits(BANNER) {
        page.space(BANNER);
        let bottom = page.cursor();
        page.fill_rect(MARGIN_X, bottom, CONTENT_WIDTH, BANNER, banner);
        page.text_at(
            MARGIN_X + 8.0,
            bottom + 8.0,
            Font::Bold,
            12.0,
            WHITE,
            &format!("RECOMMENDATION: {}", input.recommendation.as_str().to_uppercase()),
        );
        page.space(6.0);
    }
    if let Some(reasoning) = non_blank(&analysis.recommendation_reasoning) {
        page.body(reasoning);
    }

    if !analysis.interview_questions.is_empty() {
        page.heading("Suggested Interview Questions");
        for (idx, question) in analysis
            .interview_questions
            .iter()
            .take(MAX_QUESTIONS)
            .enumerate()
        {
            page.body(&format!("{}. {}", idx + 1, question));
        }
    }

    page.space(14.0);
    page.paragraph(
        MARGIN_X,
        Font::Regular,
        8.0,
        GREY,
        &format!(
            "Generated by hirelens on {} | Model: {}",
            input.generated_at.format("%Y-%m-%d %H:%M UTC"),
            input.model
        ),
    );

    page
}

fn scored_section(page: &mut PageBuilder, heading: &str, note: &ScoredNote) {
    page.heading(heading);
    page.body(&format!("Score: {}/10", note.score.unwrap_or(0)));
    if let Some(notes) = non_blank(&note.notes) {
        page.body(notes);
    }
}

fn years_display(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => "N/A".to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn assemble(pages: Vec<PageBuilder>, input: &ReportInput<'_>) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold, Font::Symbols] {
        let mut dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
        };
        if font != Font::Symbols {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        fonts.set(font.resource_name(), doc.add_object(dict));
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page.into_operations(),
        };
        let encoded = content
            .encode()
            .map_err(|e| ReportError::Content(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(layout::win_ansi(&format!(
            "Assessment: {}",
            input.candidate_name
        ))),
        "Producer" => Object::string_literal("hirelens"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    Ok(buffer)
}
