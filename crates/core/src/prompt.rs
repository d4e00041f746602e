//! Prompt construction for the report pipeline.
//!
//! Both builders are pure: no I/O, no clock, no state. Identical inputs
//! produce byte-identical prompts, which keeps report requests reproducible
//! and testable.

use crate::level::Level;
use crate::session::InterviewAnswer;

/// Rendered in place of an empty answer so the positional Q/A numbering the
/// growth series depends on is never disturbed.
pub const NO_ANSWER_PLACEHOLDER: &str = "(No answer provided)";

/// Builds the prompt for a single-answer report.
///
/// The instruction block pins the exact JSON object the model must return;
/// the level block sets persona, tone, the evaluation display form, and a
/// worked example so the model imitates a concrete shape rather than
/// improvising one.
pub fn answer_report_prompt(level: Level, question: &str, answer: &str) -> String {
    let common = r#"You are an AI speaking coach. Your task is to provide a "mini report" on a user's single interview answer.
Analyze the given question and answer based on the user's level.
Provide feedback in a concise, encouraging, and level-appropriate tone.
You MUST respond with a single valid JSON object and nothing else. Do not include any text outside the JSON object.
The JSON response must strictly follow this structure:
{
  "title": "string",            // Report title
  "evaluationTitle": "string",  // Title for the evaluation metric
  "evaluationValue": "string",  // The metric value in the level's display form
  "praiseTitle": "string",      // Title for the praise point
  "praise": "string",           // One specific praise point
  "growthTipTitle": "string",   // Title for the growth tip
  "growthTip": "string",        // One specific, actionable growth tip
  "buttonText": "string",       // Text for the "next" button
  "score": number               // Overall score for this answer, 0 to 100, for the growth graph
}"#;

    let level_block = match level {
        Level::Elementary => r#"Concept: "the praising AI friend"
Tone: easy, warm, encouraging words, like a friendly peer.
Evaluation display form: a five-star rating rendered as text (e.g. "4/5 stars").
Example praise: "I love how you spoke in a big, confident voice!"
Example tip: "If you cut down the little 'um...' pauses, you will sound even sharper!"
JSON example:
{
  "title": "Answer 1 analyzed!",
  "evaluationTitle": "Confidence stars",
  "evaluationValue": "4/5 stars",
  "praiseTitle": "Well done!",
  "praise": "You explained your nickname with a fun reason, so it was easy to remember.",
  "growthTipTitle": "Shall we try this?",
  "growthTip": "Speak just a little slower and your friends will catch every word.",
  "buttonText": "Great! Next question",
  "score": 85
}"#,
        Level::Middle => r#"Concept: "the smart AI analyst"
Tone: use learning vocabulary such as logic, evidence, and structure, while staying positive.
Evaluation display form: a numerical score out of 100 (e.g. "78 points").
Example praise: "Backing your claim with your own experience made the argument very logical."
Example tip: "Leading with your conclusion before the reasons will double the impact."
JSON example:
{
  "title": "Question 2 analysis report",
  "evaluationTitle": "Speaking score",
  "evaluationValue": "78 points",
  "praiseTitle": "Strength analysis",
  "praise": "You connected your strength to a concrete experience and analyzed it objectively.",
  "growthTipTitle": "Improvement suggestion",
  "growthTip": "Presenting the key keyword in your opening sentence will sharpen the interviewer's focus.",
  "buttonText": "Got it, next question",
  "score": 78
}"#,
        Level::Advanced => r#"Concept: "the professional AI consultant"
Tone: professional, analytical vocabulary appropriate to college admissions evaluation.
Evaluation display form: a letter grade (e.g. "A-", "B+", "C").
Example praise: "Linking a historical figure to modern leadership substantially strengthened your claim."
Example tip: "Raising the expected counterargument first and rebutting it would demonstrate depth of thought."
JSON example:
{
  "title": "Item 3 in-depth analysis",
  "evaluationTitle": "Critical thinking",
  "evaluationValue": "B+",
  "praiseTitle": "Outstanding point",
  "praise": "You framed the conflict as a problem and explained the resolution process around your own role.",
  "growthTipTitle": "Advanced strategy",
  "growthTip": "Mentioning your teammates' contributions as well would additionally signal collaboration skills.",
  "buttonText": "Got it, next question",
  "score": 88
}"#,
    };

    format!(
        "{common}\n\n--- User Level & Request ---\nLevel: {level}\n{level_block}\n\n--- User's Answer ---\nQuestion: \"{question}\"\nAnswer: \"{answer}\"\n\nProvide the JSON output now.",
        level = level.label(),
    )
}

/// Builds the prompt for the aggregate report over the full answer set.
///
/// The transcript block preserves the positional index of every Q/A pair;
/// an unanswered question is rendered with [`NO_ANSWER_PLACEHOLDER`], never
/// omitted, so the growth series stays aligned with question numbers.
pub fn final_report_prompt(level: Level, answers: &[InterviewAnswer]) -> String {
    let common = r#"You are an AI speaking coach. Your task is to provide a "Comprehensive Analysis Report" based on all of the user's interview answers.
Analyze all answers holistically based on the user's level.
You MUST respond with a single valid JSON object and nothing else. Do not include any text outside the JSON object."#;

    let level_block = match level {
        Level::Elementary => r#"Concept: "a final report full of praise" - bright and friendly.
JSON structure:
{
  "title": "AI Comprehensive Analysis Report",
  "overallScore": number (0-100),
  "overallGrade": string (e.g. "Great job!"),
  "persona": string (e.g. "The Spirited Adventurer"),
  "radarChartData": [
    {"label": "Speaking boldly", "score": number (0-100)},
    {"label": "Telling fun stories", "score": number (0-100)},
    {"label": "Expressing my thoughts", "score": number (0-100)},
    {"label": "Good posture", "score": number (0-100)},
    {"label": "Listening carefully", "score": number (0-100)}
  ],
  "detailedAnalysis": [
    {"category": "Speaking boldly", "score": number, "comment": "string (one-sentence summary)"}
    // ... one entry per radar category
  ],
  "finalCommentTitle": "A final word from your AI friend",
  "finalComment": "string (3-4 sentences summarizing strengths and one key improvement area, with encouragement)",
  "growthGraphTitle": "Confidence growth graph",
  "growthGraphData": [
    {"question": 1, "score": number}
    // ... one entry per question, in order
  ]
}"#,
        Level::Middle => r#"Concept: "a data-centered smart report" - clean and analytic.
JSON structure:
{
  "title": "AI Comprehensive Analysis Report",
  "overallScore": number (0-100),
  "overallGrade": string (e.g. "A-"),
  "persona": string (e.g. "The Cool-Headed Logician"),
  "radarChartData": [
    {"label": "Logical content", "score": number (0-100)},
    {"label": "Clarity of expression", "score": number (0-100)},
    {"label": "Vocal confidence", "score": number (0-100)},
    {"label": "Presentation attitude", "score": number (0-100)},
    {"label": "Originality of thought", "score": number (0-100)}
  ],
  "detailedAnalysis": [
    {"category": "Logical content", "score": number, "comment": "string (one-sentence summary)"}
    // ... one entry per radar category
  ],
  "finalCommentTitle": "Final analysis from your AI coach",
  "finalComment": "string (3-4 sentences summarizing strengths, one key improvement, and how to practice it)",
  "growthGraphTitle": "Logic growth graph",
  "growthGraphData": [
    {"question": 1, "score": number}
    // ... one entry per question, in order
  ]
}"#,
        Level::Advanced => r#"Concept: "a professional admissions consulting report" - trustworthy, academic, with in-depth actionable advice.
JSON structure:
{
  "title": "AI In-Depth Competency Analysis Report",
  "overallTier": "string (e.g. 'Advanced capability', 'Balanced growth', 'Emerging potential')",
  "strengthKeywords": ["string", "string", "string"],
  "radarChartData": [
    {"label": "Problem solving", "score": number (0-100)},
    {"label": "Critical thinking", "score": number (0-100)},
    {"label": "Major fit", "score": number (0-100)},
    {"label": "Communication", "score": number (0-100)},
    {"label": "Leadership and collaboration", "score": number (0-100)}
  ],
  "detailedAnalysis": [
    {
      "category": "Problem solving", "score": number,
      "quote": "string (the user's most relevant answer quote for this category)",
      "analysis": "string (in-depth analysis of the quote and the user's ability in this category)"
    }
    // ... one entry per radar category, each with quote and analysis
  ],
  "diagnosisAndGuide": {
    "profiling": "string (a paragraph diagnosing the student's speaking style and thinking process)",
    "utilization": {
      "interviewStrategy": "string (actionable advice for college admission interviews)",
      "studentRecordTips": "string (tips for reflecting these strengths in school records or a portfolio)"
    }
  },
  "simulation": {
    "followUpQuestions": [
      "string (a sharp, probing follow-up question based on the user's answers)",
      "string (another one)",
      "string (and a third one)"
    ],
    "logicEnhancement": "string (a tip on making the user's arguments more robust, e.g. citing data or papers)",
    "answerExtensionGuide": "string (a guide on connecting the answers to the user's desired major)"
  },
  "futureStrategy": "string (a concrete next step, like a specific book to read or a topic to research)",
  "growthGraphTitle": "Logic and delivery growth trend",
  "growthGraphData": [
    {"question": 1, "score": number}
    // ... one entry per question, in order
  ]
}"#,
    };

    format!(
        "{common}\n\n--- User Level & Request ---\nLevel: {level}\n{level_block}\n\n--- User's Answers ---\n{transcript}\n\nProvide the JSON output now.",
        level = level.label(),
        transcript = transcript_block(answers),
    )
}

/// Renders the ordered Q/A transcript, one numbered pair per entry.
fn transcript_block(answers: &[InterviewAnswer]) -> String {
    answers
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let n = i + 1;
            let answer = if item.answer.trim().is_empty() {
                NO_ANSWER_PLACEHOLDER
            } else {
                item.answer.as_str()
            };
            format!("Q{n}: {}\nA{n}: {answer}", item.question)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
