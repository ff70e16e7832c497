use std::path::Path;

use askama::Template;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::{
    error::{CoachError, Result},
    problem::ProblemRecord,
    record::{AnalysisRecord, Bound},
};

const PLATFORM: &str = "Codeforces";
const NOT_AVAILABLE: &str = "N/A";

/// Flat, render-ready sections of an analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSections {
    pub problem_name: String,
    pub problem_snapshot: String,
    pub problem_link: ProblemLink,
    pub problem_summary: String,
    pub key_insights: Vec<String>,
    /// Absent when the analysis has no key observation.
    pub why_this_works: Option<String>,
    pub input_format: String,
    pub output_format: String,
    pub constraints_and_implications: String,
    pub high_level_strategy: String,
    pub common_mistakes_and_edge_cases: String,
    pub example: String,
    pub final_complexity_analysis: String,
    pub takeaway: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProblemLink {
    pub name: String,
    pub url: String,
}

pub fn build_report_sections(record: &AnalysisRecord, problem: &ProblemRecord) -> ReportSections {
    let analysis = record.view();
    let summary = &analysis.summary;
    let constraints = &summary.constraints;
    let code = problem.code();

    let bounds = if constraints.bounds.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        constraints
            .bounds
            .iter()
            .map(Bound::render)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let example = summary
        .sample_cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            format!(
                "Example {}\nInput:\n{}\n\nOutput:\n{}",
                i + 1,
                case.input,
                case.output
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let rating = problem
        .rating
        .map(|r| r.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let observation = analysis.deep.key_observation.clone();

    ReportSections {
        problem_snapshot: format!(
            "Problem Code: {code}\nTitle: {}\nRating: {rating}\nPlatform: {PLATFORM}",
            or_na(&problem.title)
        ),
        problem_link: ProblemLink {
            name: format!("CodeForces Problem {code}"),
            url: problem.url.clone(),
        },
        problem_summary: summary.problem_statement.clone(),
        key_insights: analysis.solution.key_insights.clone(),
        why_this_works: observation.clone(),
        input_format: summary.input_format.description.clone(),
        output_format: summary.output_format.description.clone(),
        constraints_and_implications: format!(
            "Time Limit: {}\nMemory Limit: {}\nBounds:\n{bounds}",
            opt_or_na(&constraints.time_limit),
            opt_or_na(&constraints.memory_limit),
        ),
        high_level_strategy: analysis.solution.approach.clone(),
        common_mistakes_and_edge_cases: analysis
            .deep
            .edge_cases
            .iter()
            .map(|e| format!("- {e}"))
            .collect::<Vec<_>>()
            .join("\n"),
        example,
        final_complexity_analysis: format!(
            "Time Complexity: {}\nSpace Complexity: {}",
            opt_or_na(&analysis.solution.time_complexity),
            opt_or_na(&analysis.solution.space_complexity),
        ),
        takeaway: observation.unwrap_or_default(),
        problem_name: code,
    }
}

fn or_na(text: &str) -> &str {
    if text.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        text
    }
}

fn opt_or_na(text: &Option<String>) -> &str {
    text.as_deref().map(or_na).unwrap_or(NOT_AVAILABLE)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Sepia,
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub heading: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub divider: &'static str,
    pub code_background: &'static str,
    pub code_text: &'static str,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: "#1e1f24",
                text: "#d6d8de",
                heading: "#ffffff",
                muted: "#9aa0ac",
                accent: "#6cb6ff",
                divider: "#3a3d46",
                code_background: "#2a2c33",
                code_text: "#e6e6e6",
            },
            Theme::Light => Palette {
                background: "#ffffff",
                text: "#24292f",
                heading: "#111111",
                muted: "#57606a",
                accent: "#0066cc",
                divider: "#d0d7de",
                code_background: "#f6f8fa",
                code_text: "#24292f",
            },
            Theme::Sepia => Palette {
                background: "#f4ecd8",
                text: "#433422",
                heading: "#2b2117",
                muted: "#7a6a55",
                accent: "#8a4b08",
                divider: "#d8c8a8",
                code_background: "#ebe0c6",
                code_text: "#3b2f20",
            },
        }
    }
}

#[derive(Template)]
#[template(path = "report.html.j2")]
struct HtmlReport<'a> {
    sections: &'a ReportSections,
    why: &'a str,
    has_why: bool,
    theme: Theme,
    palette: Palette,
}

pub fn render_report(sections: &ReportSections, theme: Theme) -> Result<String> {
    let why = sections.why_this_works.as_deref().unwrap_or_default();
    let report = HtmlReport {
        sections,
        why,
        has_why: !why.is_empty(),
        theme,
        palette: theme.palette(),
    };
    Ok(report.render()?)
}

pub fn write_report(sections: &ReportSections, theme: Theme, path: &Path) -> Result<()> {
    let html = render_report(sections, theme)?;
    std::fs::write(path, html).map_err(|e| CoachError::io(path, e))
}

pub fn default_report_name(sections: &ReportSections) -> String {
    format!("CPCoach_analysis_{}.html", sections.problem_name)
}
