mod config;
mod speech;

use crate::config::Config;
use anyhow::{Context, Result, bail};
use clap::Parser;
use coach_core::client::{GeminiReportClient, ReportGenerator};
use coach_core::level::Level;
use coach_core::report::FinalReport;
use coach_core::session::{Effect, Screen, Session, SessionEvent};
use coach_core::speech::{ChannelSynthesis, SpeechCapture, SpeechSynthesis};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(about = "Practice spoken interviews with an AI coach")]
struct Cli {
    /// Audience level: elementary, middle, or advanced. Prompted for if omitted.
    #[arg(long)]
    level: Option<Level>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting coach service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Initialize the Report Client and Speech Adapters ---
    let generator: Arc<dyn ReportGenerator> = Arc::new(GeminiReportClient::with_base_url(
        config.gemini_api_key.clone(),
        config.chat_model.clone(),
        config.base_url.clone(),
        config.report_timeout,
    ));

    let synthesis = speech::console_synthesis();
    // A terminal has no recognition engine; answers are typed instead.
    let capture = speech::NoCapture;
    if !capture.is_supported() {
        tracing::info!("speech capture unavailable; falling back to manual text entry");
    }

    // --- 5. Run the Session Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    run_session(args.level, &generator, &synthesis, &capture, &mut lines).await
}

/// Drives the session to completion: every `apply` happens on this task, and
/// report completions re-enter through the event channel.
async fn run_session(
    mut preset_level: Option<Level>,
    generator: &Arc<dyn ReportGenerator>,
    synthesis: &ChannelSynthesis,
    capture: &dyn SpeechCapture,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(32);
    let mut session = Session::new();

    loop {
        match session.screen() {
            Screen::Start => {
                let level = match preset_level.take() {
                    Some(level) => level,
                    None => prompt_for_level(lines).await?,
                };
                let effects = session.apply(SessionEvent::LevelSelected(level));
                execute(effects, generator, synthesis, capture, &event_tx);
            }
            Screen::Interviewing => {
                // Capture controls stay disabled until the question has been
                // read out.
                synthesis.wait_until_idle().await;
                println!(
                    "[Question {} of {}]",
                    session.question_number(),
                    session.total_questions()
                );
                let answer = read_nonempty_line(lines, "Your answer > ").await?;
                let effects = session.apply(SessionEvent::AnswerSubmitted(answer));
                execute(effects, generator, synthesis, capture, &event_tx);
            }
            Screen::AwaitingAnswerReport => {
                println!("Analyzing your answer...");
                let event = event_rx
                    .recv()
                    .await
                    .context("report task channel closed unexpectedly")?;
                let effects = session.apply(event);
                execute(effects, generator, synthesis, capture, &event_tx);
            }
            Screen::AnswerReport => {
                render_answer_report(&session);
                wait_for_enter(lines).await?;
                let effects = session.apply(SessionEvent::Advanced);
                execute(effects, generator, synthesis, capture, &event_tx);
            }
            Screen::AwaitingFinalReport => {
                println!("Generating your comprehensive report. This may take a moment...");
                let event = event_rx
                    .recv()
                    .await
                    .context("report task channel closed unexpectedly")?;
                let effects = session.apply(event);
                execute(effects, generator, synthesis, capture, &event_tx);
            }
            Screen::FinalResults => {
                render_final_report(&session);
                println!("\nType 'again' for another session, or press Enter to exit.");
                match lines.next_line().await? {
                    Some(line) if line.trim().eq_ignore_ascii_case("again") => {
                        session.apply(SessionEvent::Restarted);
                    }
                    _ => return Ok(()),
                }
            }
        }
    }
}

/// Executes the effects of one transition. Report requests are spawned so the
/// session task stays free; their completions come back as events tagged with
/// the issuing epoch.
fn execute(
    effects: Vec<Effect>,
    generator: &Arc<dyn ReportGenerator>,
    synthesis: &ChannelSynthesis,
    capture: &dyn SpeechCapture,
    event_tx: &mpsc::Sender<SessionEvent>,
) {
    for effect in effects {
        match effect {
            Effect::Speak(text) => synthesis.speak(&text),
            Effect::StopCapture => capture.stop(),
            Effect::ResetCapture => capture.reset(),
            Effect::RequestAnswerReport {
                epoch,
                level,
                question,
                answer,
            } => {
                let generator = Arc::clone(generator);
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let report = match generator.answer_report(level, &question, &answer).await {
                        Ok(report) => Some(report),
                        Err(error) => {
                            tracing::warn!(%error, "per-answer report unavailable");
                            None
                        }
                    };
                    let _ = event_tx
                        .send(SessionEvent::AnswerReportReady { epoch, report })
                        .await;
                });
            }
            Effect::RequestFinalReport {
                epoch,
                level,
                answers,
            } => {
                let generator = Arc::clone(generator);
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let report = match generator.final_report(level, &answers).await {
                        Ok(report) => Some(report),
                        Err(error) => {
                            tracing::warn!(%error, "final report unavailable");
                            None
                        }
                    };
                    let _ = event_tx
                        .send(SessionEvent::FinalReportReady { epoch, report })
                        .await;
                });
            }
        }
    }
}

async fn prompt_for_level(lines: &mut Lines<BufReader<Stdin>>) -> Result<Level> {
    println!("Choose your level: elementary / middle / advanced");
    loop {
        let Some(line) = lines.next_line().await? else {
            bail!("input closed before a level was chosen");
        };
        match line.trim().parse::<Level>() {
            Ok(level) => return Ok(level),
            Err(error) => println!("{error}"),
        }
    }
}

/// Reads a line, re-prompting until it is non-empty. Submitting an empty
/// answer is prevented here rather than reported as an error later.
async fn read_nonempty_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
) -> Result<String> {
    loop {
        println!("{prompt}");
        let Some(line) = lines.next_line().await? else {
            bail!("input closed mid-session");
        };
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        println!("Please enter an answer first.");
    }
}

async fn wait_for_enter(lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    if lines.next_line().await?.is_none() {
        bail!("input closed mid-session");
    }
    Ok(())
}

fn render_answer_report(session: &Session) {
    println!("{}", "-".repeat(60));
    match session.answer_report() {
        Some(report) => {
            println!("{}", report.title);
            println!("  {}: {}", report.evaluation_title, report.evaluation_value);
            println!("  {}: {}", report.praise_title, report.praise);
            println!("  {}: {}", report.growth_tip_title, report.growth_tip);
            println!("  (score: {}/100)", report.score);
            println!("\n[{}] Press Enter to continue.", report.button_text);
        }
        None => {
            println!("Feedback for this answer could not be generated.");
            println!("You can still continue. Press Enter for the next step.");
        }
    }
}

fn render_final_report(session: &Session) {
    println!("{}", "=".repeat(60));
    let Some(report) = session.final_report() else {
        println!("The comprehensive report could not be generated.");
        println!("You can start a new session to try again.");
        return;
    };

    println!("{}", report.title());
    println!("\nCompetency radar:");
    for entry in report.radar() {
        println!("  {:<28} {:>3}/100", entry.label, entry.score);
    }

    match report {
        FinalReport::Junior(junior) => {
            println!("\nOverall: {} ({}/100)", junior.overall_grade, junior.overall_score);
            println!("Persona: {}", junior.persona);
            println!("\nDetailed analysis:");
            for item in &junior.detailed_analysis {
                println!("  {:<28} {:>3}/100  {}", item.category, item.score, item.comment);
            }
            println!("\n{}", junior.final_comment_title);
            println!("{}", junior.final_comment);
        }
        FinalReport::Advanced(advanced) => {
            println!("\nOverall tier: {}", advanced.overall_tier);
            println!("Strength keywords: {}", advanced.strength_keywords.join(", "));
            println!("\nDetailed analysis:");
            for item in &advanced.detailed_analysis {
                println!("  {} ({}/100)", item.category, item.score);
                println!("    quote: \"{}\"", item.quote);
                println!("    {}", item.analysis);
            }
            println!("\nDiagnosis: {}", advanced.diagnosis_and_guide.profiling);
            println!(
                "Interview strategy: {}",
                advanced.diagnosis_and_guide.utilization.interview_strategy
            );
            println!(
                "School record tips: {}",
                advanced.diagnosis_and_guide.utilization.student_record_tips
            );
            println!("\nFollow-up simulation:");
            for question in &advanced.simulation.follow_up_questions {
                println!("  - {question}");
            }
            println!("  Logic: {}", advanced.simulation.logic_enhancement);
            println!("  Extension: {}", advanced.simulation.answer_extension_guide);
            println!("\nNext step: {}", advanced.future_strategy);
        }
    }

    if let Some(title) = report.growth_title() {
        println!("\n{title}:");
    } else {
        println!("\nGrowth per question:");
    }
    for point in report.growth_series() {
        println!("  Q{} {:>3}/100", point.question, point.score);
    }
}
