//! Speech capability adapters.
//!
//! Concrete recognition/synthesis engines live outside this crate; the session
//! host only sees the two capability traits here. [`ChannelCapture`] and
//! [`ChannelSynthesis`] adapt any engine that communicates over channels,
//! translating engine traffic into the events the orchestrator understands.

use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

/// Events a capture adapter emits on its event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// The live transcript grew while capture is running.
    Partial(String),
    /// Capture fully stopped. `transcript` is the final value, including any
    /// segments the engine flushed after the stop was requested.
    Stopped { transcript: String },
}

/// Continuous speech-to-text capability.
///
/// `start` and `stop` are idempotent; the transcript is readable at any time,
/// including mid-capture, and is replaced (not appended) across questions via
/// `reset`. When `is_supported` is false the host falls back to manual text
/// entry and hides the capture controls.
pub trait SpeechCapture {
    fn is_supported(&self) -> bool;
    fn is_listening(&self) -> bool;
    fn transcript(&self) -> String;
    fn start(&self);
    fn stop(&self);
    fn reset(&self);
}

/// Text-to-speech capability.
///
/// `speak` cancels any in-flight utterance; at most one is active at a time.
/// The adapter returns to idle on completion and on synthesis error alike.
pub trait SpeechSynthesis {
    fn is_supported(&self) -> bool;
    fn is_speaking(&self) -> bool;
    fn speak(&self, text: &str);
}

#[derive(Debug, Default)]
struct CaptureState {
    transcript: String,
    listening: bool,
    /// A stop was requested but the pump has not finalized it yet. Restarting
    /// capture in that window cancels the pending stop.
    stop_requested: bool,
}

/// Adapts a recognition engine that streams transcript segments over a
/// channel.
///
/// Stopping is asynchronous by design: `stop` only requests the halt, and the
/// pump task drains whatever segments the engine had already queued before
/// emitting [`CaptureEvent::Stopped`] with the final transcript. That event is
/// the only place the definitive post-stop value exists.
pub struct ChannelCapture {
    state: Arc<Mutex<CaptureState>>,
    stop_notify: Arc<Notify>,
}

impl ChannelCapture {
    /// Spawns the pump task over `segment_rx` and returns the adapter together
    /// with its event stream. Must be called within a tokio runtime.
    pub fn new(
        mut segment_rx: mpsc::UnboundedReceiver<String>,
    ) -> (Self, mpsc::Receiver<CaptureEvent>) {
        let state = Arc::new(Mutex::new(CaptureState::default()));
        let stop_notify = Arc::new(Notify::new());
        let (event_tx, event_rx) = mpsc::channel(32);

        let task_state = Arc::clone(&state);
        let task_notify = Arc::clone(&stop_notify);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_segment = segment_rx.recv() => {
                        let Some(segment) = maybe_segment else {
                            tracing::debug!("capture engine hung up");
                            break;
                        };
                        let snapshot = {
                            let mut state = task_state.lock().unwrap();
                            if state.listening {
                                append_segment(&mut state.transcript, &segment);
                                Some(state.transcript.clone())
                            } else {
                                None
                            }
                        };
                        if let Some(transcript) = snapshot {
                            if event_tx.send(CaptureEvent::Partial(transcript)).await.is_err() {
                                break;
                            }
                        }
                    }
                    _ = task_notify.notified() => {
                        let final_transcript = {
                            let mut state = task_state.lock().unwrap();
                            if !state.stop_requested || !state.listening {
                                None
                            } else {
                                // Take the segments the engine flushed between
                                // the stop request and now; they belong to the
                                // answer.
                                while let Ok(segment) = segment_rx.try_recv() {
                                    append_segment(&mut state.transcript, &segment);
                                }
                                state.stop_requested = false;
                                state.listening = false;
                                Some(state.transcript.clone())
                            }
                        };
                        if let Some(transcript) = final_transcript {
                            if event_tx
                                .send(CaptureEvent::Stopped { transcript })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                    }
                }
            }
        });

        (Self { state, stop_notify }, event_rx)
    }
}

fn append_segment(transcript: &mut String, segment: &str) {
    if !transcript.is_empty() {
        transcript.push(' ');
    }
    transcript.push_str(segment);
}

impl SpeechCapture for ChannelCapture {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_listening(&self) -> bool {
        self.state.lock().unwrap().listening
    }

    fn transcript(&self) -> String {
        self.state.lock().unwrap().transcript.clone()
    }

    fn start(&self) {
        let mut state = self.state.lock().unwrap();
        state.listening = true;
        // A restart overrides any stop that has not finalized yet.
        state.stop_requested = false;
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if state.listening && !state.stop_requested {
            state.stop_requested = true;
            self.stop_notify.notify_one();
        }
    }

    fn reset(&self) {
        self.state.lock().unwrap().transcript.clear();
    }
}

/// Commands a synthesis engine receives from [`ChannelSynthesis`].
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisCommand {
    /// Abort the named utterance if it is still playing.
    Cancel { id: u64 },
    Speak { id: u64, text: String },
}

/// Completion feedback a synthesis engine sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisFeedback {
    Finished { id: u64 },
    Failed { id: u64, error: String },
}

#[derive(Debug, Default)]
struct SynthesisState {
    current: Option<u64>,
    next_id: u64,
}

/// Adapts a synthesis engine driven over command/feedback channels.
///
/// Utterances carry ids so that feedback for a cancelled utterance cannot be
/// mistaken for the active one.
pub struct ChannelSynthesis {
    state: Arc<Mutex<SynthesisState>>,
    command_tx: mpsc::UnboundedSender<SynthesisCommand>,
    idle_notify: Arc<Notify>,
}

impl ChannelSynthesis {
    /// Spawns the feedback pump and returns the adapter. Must be called within
    /// a tokio runtime.
    pub fn new(
        command_tx: mpsc::UnboundedSender<SynthesisCommand>,
        mut feedback_rx: mpsc::UnboundedReceiver<SynthesisFeedback>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SynthesisState::default()));
        let idle_notify = Arc::new(Notify::new());

        let task_state = Arc::clone(&state);
        let task_notify = Arc::clone(&idle_notify);
        tokio::spawn(async move {
            while let Some(feedback) = feedback_rx.recv().await {
                let (id, error) = match feedback {
                    SynthesisFeedback::Finished { id } => (id, None),
                    SynthesisFeedback::Failed { id, error } => (id, Some(error)),
                };
                let became_idle = {
                    let mut state = task_state.lock().unwrap();
                    if state.current == Some(id) {
                        state.current = None;
                        true
                    } else {
                        false
                    }
                };
                if let Some(error) = error {
                    // A failed utterance is a logging matter, never a session
                    // fault; the adapter still returns to idle.
                    tracing::warn!(id, %error, "speech synthesis failed");
                }
                if became_idle {
                    task_notify.notify_one();
                }
            }
            tracing::debug!("synthesis engine hung up");
        });

        Self {
            state,
            command_tx,
            idle_notify,
        }
    }

    /// Resolves once no utterance is active.
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.idle_notify.notified();
            if !self.is_speaking() {
                return;
            }
            notified.await;
        }
    }
}

impl SpeechSynthesis for ChannelSynthesis {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_speaking(&self) -> bool {
        self.state.lock().unwrap().current.is_some()
    }

    fn speak(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(active) = state.current.take() {
            if self.command_tx.send(SynthesisCommand::Cancel { id: active }).is_err() {
                tracing::warn!("synthesis engine is gone; dropping cancel");
            }
        }
        let id = state.next_id;
        state.next_id += 1;
        if self
            .command_tx
            .send(SynthesisCommand::Speak {
                id,
                text: text.to_string(),
            })
            .is_err()
        {
            tracing::warn!("synthesis engine is gone; dropping utterance");
            self.idle_notify.notify_one();
            return;
        }
        state.current = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_accumulates_segments_while_listening() {
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        capture.start();
        segment_tx.send("hello".to_string()).unwrap();
        segment_tx.send("world".to_string()).unwrap();

        assert_eq!(events.recv().await, Some(CaptureEvent::Partial("hello".to_string())));
        assert_eq!(
            events.recv().await,
            Some(CaptureEvent::Partial("hello world".to_string()))
        );
        assert!(capture.is_listening());
        assert_eq!(capture.transcript(), "hello world");
    }

    #[tokio::test]
    async fn stop_drains_trailing_segments_into_the_final_transcript() {
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        capture.start();
        segment_tx.send("first".to_string()).unwrap();
        assert_eq!(events.recv().await, Some(CaptureEvent::Partial("first".to_string())));

        // The engine flushes one more segment right as the user hits stop.
        segment_tx.send("second".to_string()).unwrap();
        capture.stop();

        // Whatever interleaving the pump sees, the stopped event must carry
        // both segments.
        let mut finished = None;
        while let Some(event) = events.recv().await {
            if let CaptureEvent::Stopped { transcript } = event {
                finished = Some(transcript);
                break;
            }
        }
        assert_eq!(finished.as_deref(), Some("first second"));
        assert!(!capture.is_listening());
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let (_segment_tx, segment_rx) = mpsc::unbounded_channel::<String>();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        capture.stop();
        capture.stop();
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err(), "no Stopped event should be emitted");
    }

    #[tokio::test]
    async fn segments_while_idle_are_dropped() {
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        segment_tx.send("ignored".to_string()).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(capture.transcript(), "");
        assert!(events.try_recv().is_err());

        // Idempotent start: two calls arm capture once.
        capture.start();
        capture.start();
        segment_tx.send("kept".to_string()).unwrap();
        assert_eq!(events.recv().await, Some(CaptureEvent::Partial("kept".to_string())));
    }

    #[tokio::test]
    async fn restart_cancels_a_pending_stop() {
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        capture.start();
        capture.stop();
        capture.start();
        tokio::task::yield_now().await;

        // The pending stop was overridden; capture keeps accumulating and no
        // Stopped event fires.
        assert!(capture.is_listening());
        segment_tx.send("still recording".to_string()).unwrap();
        assert_eq!(
            events.recv().await,
            Some(CaptureEvent::Partial("still recording".to_string()))
        );
    }

    #[tokio::test]
    async fn reset_replaces_the_transcript_for_a_new_question() {
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (capture, mut events) = ChannelCapture::new(segment_rx);

        capture.start();
        segment_tx.send("old answer".to_string()).unwrap();
        events.recv().await;
        capture.stop();
        while let Some(event) = events.recv().await {
            if matches!(event, CaptureEvent::Stopped { .. }) {
                break;
            }
        }

        capture.reset();
        assert_eq!(capture.transcript(), "");

        capture.start();
        segment_tx.send("new answer".to_string()).unwrap();
        assert_eq!(
            events.recv().await,
            Some(CaptureEvent::Partial("new answer".to_string()))
        );
    }

    #[tokio::test]
    async fn speak_cancels_the_previous_utterance() {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        let synthesis = ChannelSynthesis::new(command_tx, feedback_rx);

        synthesis.speak("first question");
        assert!(synthesis.is_speaking());
        assert_eq!(
            command_rx.recv().await,
            Some(SynthesisCommand::Speak { id: 0, text: "first question".to_string() })
        );

        synthesis.speak("second question");
        assert_eq!(command_rx.recv().await, Some(SynthesisCommand::Cancel { id: 0 }));
        assert_eq!(
            command_rx.recv().await,
            Some(SynthesisCommand::Speak { id: 1, text: "second question".to_string() })
        );

        // Feedback for the cancelled utterance must not mark the adapter idle.
        feedback_tx.send(SynthesisFeedback::Finished { id: 0 }).unwrap();
        tokio::task::yield_now().await;
        assert!(synthesis.is_speaking());

        feedback_tx.send(SynthesisFeedback::Finished { id: 1 }).unwrap();
        synthesis.wait_until_idle().await;
        assert!(!synthesis.is_speaking());
    }

    #[tokio::test]
    async fn synthesis_error_returns_the_adapter_to_idle() {
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        let synthesis = ChannelSynthesis::new(command_tx, feedback_rx);

        synthesis.speak("question");
        feedback_tx
            .send(SynthesisFeedback::Failed { id: 0, error: "engine glitch".to_string() })
            .unwrap();
        synthesis.wait_until_idle().await;
        assert!(!synthesis.is_speaking());
    }
}
