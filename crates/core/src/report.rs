//! Report data model.
//!
//! These are the wire shapes the generative endpoint is asked to produce. The
//! per-answer report is one shape for every level (only its display strings
//! differ); the final report is a level-tagged union with a shared core and a
//! junior/advanced payload, so a renderer can only reach the fields its level
//! actually populates.

use serde::{Deserialize, Deserializer};

/// Accepts any JSON number for a score field and clamps it into 0..=100.
///
/// Model output is untrusted: scores occasionally arrive as floats or drift
/// out of range, and the growth graph downstream requires a valid score.
fn de_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

/// Feedback on a single answer, shown between questions.
///
/// `score` is the only field aggregation may rely on; everything else is
/// display copy whose form varies by level (stars, points, letter grade).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
    pub title: String,
    pub evaluation_title: String,
    pub evaluation_value: String,
    pub praise_title: String,
    pub praise: String,
    pub growth_tip_title: String,
    pub growth_tip: String,
    pub button_text: String,
    #[serde(deserialize_with = "de_score")]
    pub score: u8,
}

/// One axis of the radar display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RadarEntry {
    pub label: String,
    #[serde(deserialize_with = "de_score")]
    pub score: u8,
}

/// One point of the growth series; `question` is the 1-based question index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrowthPoint {
    pub question: u32,
    #[serde(deserialize_with = "de_score")]
    pub score: u8,
}

/// Per-category line for the junior tiers: a score and a one-sentence comment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JuniorAnalysisItem {
    pub category: String,
    #[serde(deserialize_with = "de_score")]
    pub score: u8,
    pub comment: String,
}

/// Per-category line for the advanced tier: quoted evidence plus analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedAnalysisItem {
    pub category: String,
    #[serde(deserialize_with = "de_score")]
    pub score: u8,
    pub quote: String,
    pub analysis: String,
}

/// Final report shape for the elementary and middle tiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JuniorReport {
    pub title: String,
    #[serde(deserialize_with = "de_score")]
    pub overall_score: u8,
    pub overall_grade: String,
    pub persona: String,
    pub radar_chart_data: Vec<RadarEntry>,
    pub detailed_analysis: Vec<JuniorAnalysisItem>,
    pub final_comment_title: String,
    pub final_comment: String,
    #[serde(default)]
    pub growth_graph_title: Option<String>,
    pub growth_graph_data: Vec<GrowthPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub interview_strategy: String,
    pub student_record_tips: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisAndGuide {
    pub profiling: String,
    pub utilization: Utilization,
}

/// Simulated follow-up round for the advanced tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub follow_up_questions: Vec<String>,
    pub logic_enhancement: String,
    pub answer_extension_guide: String,
}

/// Final report shape for the advanced tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedReport {
    pub title: String,
    pub overall_tier: String,
    pub strength_keywords: Vec<String>,
    pub radar_chart_data: Vec<RadarEntry>,
    pub detailed_analysis: Vec<AdvancedAnalysisItem>,
    pub diagnosis_and_guide: DiagnosisAndGuide,
    pub simulation: Simulation,
    pub future_strategy: String,
    #[serde(default)]
    pub growth_graph_title: Option<String>,
    pub growth_graph_data: Vec<GrowthPoint>,
}

/// The aggregate report, tagged by the audience tier that requested it.
///
/// Validation at the client boundary deserializes only the variant for the
/// requested level, so a junior renderer can never observe advanced-only
/// fields and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalReport {
    Junior(JuniorReport),
    Advanced(AdvancedReport),
}

impl FinalReport {
    pub fn title(&self) -> &str {
        match self {
            FinalReport::Junior(r) => &r.title,
            FinalReport::Advanced(r) => &r.title,
        }
    }

    pub fn radar(&self) -> &[RadarEntry] {
        match self {
            FinalReport::Junior(r) => &r.radar_chart_data,
            FinalReport::Advanced(r) => &r.radar_chart_data,
        }
    }

    pub fn growth_series(&self) -> &[GrowthPoint] {
        match self {
            FinalReport::Junior(r) => &r.growth_graph_data,
            FinalReport::Advanced(r) => &r.growth_graph_data,
        }
    }

    pub fn growth_title(&self) -> Option<&str> {
        match self {
            FinalReport::Junior(r) => r.growth_graph_title.as_deref(),
            FinalReport::Advanced(r) => r.growth_graph_title.as_deref(),
        }
    }
}
