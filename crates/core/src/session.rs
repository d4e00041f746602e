//! The session orchestrator.
//!
//! [`Session`] is a reducer: all mutation happens inside [`Session::apply`],
//! which consumes one [`SessionEvent`] and returns the [`Effect`]s the host
//! must execute (speak a question, stop capture, issue a report request).
//! Completions of those effects re-enter as events, so the whole session runs
//! on a single task with no locking and every transition is unit-testable.

use crate::level::{self, Level};
use crate::report::{AnswerReport, FinalReport};

/// One finalized question/answer pair.
///
/// Created exactly once per submission and never mutated; the list lives for
/// one session and is discarded on restart.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewAnswer {
    pub question: String,
    pub answer: String,
}

/// The screen the presentation layer should render. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Interviewing,
    AwaitingAnswerReport,
    AnswerReport,
    AwaitingFinalReport,
    FinalResults,
}

/// External happenings the session reacts to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user picked an audience level on the start screen.
    LevelSelected(Level),
    /// The user hit submit while capture may still be running. The answer is
    /// not built yet; the final transcript arrives with [`Self::CaptureStopped`].
    SubmitRequested,
    /// The capture adapter confirmed it has fully stopped and delivers the
    /// final transcript, including any segments that trailed the stop request.
    CaptureStopped { transcript: String },
    /// A finalized answer, submitted directly: the manual-entry fallback, or
    /// the speech path when capture was already idle. The host only sends this
    /// for non-empty text.
    AnswerSubmitted(String),
    /// The per-answer report request resolved. `report` is `None` when the
    /// generation failed; that is a renderable outcome, not a fault.
    AnswerReportReady {
        epoch: u64,
        report: Option<AnswerReport>,
    },
    /// The aggregate report request resolved, same failure policy.
    FinalReportReady {
        epoch: u64,
        report: Option<FinalReport>,
    },
    /// The user acknowledged the current report screen.
    Advanced,
    /// Explicit exit/restart from any screen.
    Restarted,
}

/// Side effects for the host to execute after an `apply` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read the text aloud through the synthesis adapter.
    Speak(String),
    /// Ask the capture adapter to stop; it will answer with `CaptureStopped`.
    StopCapture,
    /// Clear the capture transcript for a new question.
    ResetCapture,
    /// Issue the per-answer report request. `epoch` must be echoed back in
    /// `AnswerReportReady` so stale results can be fenced off.
    RequestAnswerReport {
        epoch: u64,
        level: Level,
        question: String,
        answer: String,
    },
    /// Issue the aggregate report request over a snapshot of the answer list
    /// taken at the moment the last per-answer report was dismissed.
    RequestFinalReport {
        epoch: u64,
        level: Level,
        answers: Vec<InterviewAnswer>,
    },
}

/// The session state machine.
pub struct Session {
    screen: Screen,
    level: Option<Level>,
    cursor: usize,
    answers: Vec<InterviewAnswer>,
    answer_report: Option<AnswerReport>,
    final_report: Option<FinalReport>,
    /// Bumped on every (re)start. Report completions carrying an older epoch
    /// belong to an abandoned session and are dropped.
    epoch: u64,
    /// Half of the submission join: set when submit was requested while
    /// capture was still winding down, cleared the moment the answer fires.
    submit_pending: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            screen: Screen::Start,
            level: None,
            cursor: 0,
            answers: Vec::new(),
            answer_report: None,
            final_report: None,
            epoch: 0,
            submit_pending: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn level(&self) -> Option<Level> {
        self.level
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn answers(&self) -> &[InterviewAnswer] {
        &self.answers
    }

    pub fn answer_report(&self) -> Option<&AnswerReport> {
        self.answer_report.as_ref()
    }

    pub fn final_report(&self) -> Option<&FinalReport> {
        self.final_report.as_ref()
    }

    /// 1-based number of the active question, for display.
    pub fn question_number(&self) -> usize {
        self.cursor + 1
    }

    pub fn total_questions(&self) -> usize {
        self.level.map(|l| level::questions_for(l).len()).unwrap_or(0)
    }

    pub fn current_question(&self) -> Option<&'static str> {
        let level = self.level?;
        level::questions_for(level).get(self.cursor).copied()
    }

    /// Feeds one event through the machine and returns the effects to run.
    ///
    /// Events that do not fit the current screen (a double-click, a stale
    /// completion) are logged and dropped; the machine never panics on them.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::LevelSelected(level) if self.screen == Screen::Start => {
                self.begin(level)
            }
            SessionEvent::SubmitRequested if self.screen == Screen::Interviewing => {
                // The transcript buffer may still be settling; remember the
                // intent and fire once the adapter confirms the stop.
                self.submit_pending = true;
                vec![Effect::StopCapture]
            }
            SessionEvent::CaptureStopped { transcript }
                if self.screen == Screen::Interviewing =>
            {
                if self.submit_pending {
                    self.submit_pending = false;
                    self.submit(transcript)
                } else {
                    // The user stopped recording without submitting; the
                    // transcript stays readable in the adapter.
                    Vec::new()
                }
            }
            SessionEvent::AnswerSubmitted(text) if self.screen == Screen::Interviewing => {
                self.submit_pending = false;
                self.submit(text)
            }
            SessionEvent::AnswerReportReady { epoch, report } => {
                if epoch != self.epoch || self.screen != Screen::AwaitingAnswerReport {
                    tracing::debug!(
                        epoch,
                        current_epoch = self.epoch,
                        screen = ?self.screen,
                        "dropping stale answer-report completion"
                    );
                    return Vec::new();
                }
                self.answer_report = report;
                self.screen = Screen::AnswerReport;
                Vec::new()
            }
            SessionEvent::FinalReportReady { epoch, report } => {
                if epoch != self.epoch || self.screen != Screen::AwaitingFinalReport {
                    tracing::debug!(
                        epoch,
                        current_epoch = self.epoch,
                        screen = ?self.screen,
                        "dropping stale final-report completion"
                    );
                    return Vec::new();
                }
                self.final_report = report;
                self.screen = Screen::FinalResults;
                Vec::new()
            }
            SessionEvent::Advanced if self.screen == Screen::AnswerReport => {
                self.advance()
            }
            SessionEvent::Restarted => {
                self.reset();
                Vec::new()
            }
            other => {
                tracing::debug!(event = ?other, screen = ?self.screen, "event ignored on this screen");
                Vec::new()
            }
        }
    }

    fn begin(&mut self, level: Level) -> Vec<Effect> {
        self.level = Some(level);
        self.cursor = 0;
        self.answers.clear();
        self.answer_report = None;
        self.final_report = None;
        self.submit_pending = false;
        self.epoch += 1;
        self.screen = Screen::Interviewing;
        tracing::info!(%level, epoch = self.epoch, "session started");
        let question = level::questions_for(level)[0];
        vec![Effect::ResetCapture, Effect::Speak(question.to_string())]
    }

    /// Appends exactly one answer for the current question and issues the
    /// per-answer report request.
    fn submit(&mut self, answer_text: String) -> Vec<Effect> {
        let Some(level) = self.level else {
            // Interviewing without a level cannot happen through `apply`.
            tracing::error!("submission with no level selected; ignoring");
            return Vec::new();
        };
        let question = level::questions_for(level)[self.cursor];
        self.answers.push(InterviewAnswer {
            question: question.to_string(),
            answer: answer_text.clone(),
        });
        self.screen = Screen::AwaitingAnswerReport;
        tracing::info!(
            question_number = self.question_number(),
            chars = answer_text.len(),
            "answer submitted"
        );
        vec![Effect::RequestAnswerReport {
            epoch: self.epoch,
            level,
            question: question.to_string(),
            answer: answer_text,
        }]
    }

    fn advance(&mut self) -> Vec<Effect> {
        let Some(level) = self.level else {
            tracing::error!("advance with no level selected; ignoring");
            return Vec::new();
        };
        let total = level::questions_for(level).len();
        if self.cursor + 1 < total {
            self.cursor += 1;
            self.screen = Screen::Interviewing;
            let question = level::questions_for(level)[self.cursor];
            vec![Effect::ResetCapture, Effect::Speak(question.to_string())]
        } else {
            // Snapshot the list now; a late-arriving mutation can never race
            // with the aggregate request.
            self.screen = Screen::AwaitingFinalReport;
            vec![Effect::RequestFinalReport {
                epoch: self.epoch,
                level,
                answers: self.answers.clone(),
            }]
        }
    }

    fn reset(&mut self) {
        tracing::info!("session reset");
        self.screen = Screen::Start;
        self.level = None;
        self.cursor = 0;
        self.answers.clear();
        self.answer_report = None;
        self.final_report = None;
        self.submit_pending = false;
        self.epoch += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
