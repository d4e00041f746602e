//! Console-environment speech adapters.
//!
//! A terminal has no continuous recognition engine, so capture reports itself
//! unsupported and the host falls back to typed answers. Synthesis is backed
//! by a print-engine so the session still "reads" each question aloud through
//! the same adapter seam a real engine would use.

use coach_core::speech::{
    ChannelSynthesis, SpeechCapture, SynthesisCommand, SynthesisFeedback,
};
use tokio::sync::mpsc;

/// The capability-absent capture adapter.
///
/// Every control is a no-op and the transcript is always empty; the host must
/// check `is_supported` and offer manual text entry instead.
pub struct NoCapture;

impl SpeechCapture for NoCapture {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn transcript(&self) -> String {
        String::new()
    }

    fn start(&self) {}

    fn stop(&self) {}

    fn reset(&self) {}
}

/// Builds a [`ChannelSynthesis`] wired to a console engine that prints each
/// utterance and acknowledges it immediately.
pub fn console_synthesis() -> ChannelSynthesis {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                SynthesisCommand::Speak { id, text } => {
                    println!("\nCoach: {text}");
                    if feedback_tx.send(SynthesisFeedback::Finished { id }).is_err() {
                        break;
                    }
                }
                // Nothing is ever actually playing; a cancel has no effect.
                SynthesisCommand::Cancel { .. } => {}
            }
        }
    });

    ChannelSynthesis::new(command_tx, feedback_rx)
}
