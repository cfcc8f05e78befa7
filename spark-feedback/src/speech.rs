use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

/// Speech synthesis collaborator.
///
/// `speak` may block until the utterance has finished; it is only ever called
/// from an output worker, never from the frame loop.
pub trait Speaker: Send + Sync + 'static {
    fn speak(&self, message: &str) -> anyhow::Result<()>;
}

/// Used when no speech engine is available: every message ends up in the log.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, message: &str) -> anyhow::Result<()> {
        info!("[AUDIO] {}", message);
        Ok(())
    }
}

/// Keeps every spoken message in memory, in delivery order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, message: &str) -> anyhow::Result<()> {
        self.spoken.lock().push(message.to_string());
        Ok(())
    }
}
