pub mod channel;
pub mod haptic;
pub mod hub;
pub mod speech;

pub use channel::{Admission, OutputChannel};
pub use haptic::{HapticPattern, LogVibrator, Pulse, RecordingVibrator, Vibrator};
pub use hub::{FeedbackHub, HubSettings};
pub use speech::{LogSpeaker, RecordingSpeaker, Speaker};
