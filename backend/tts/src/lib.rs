pub mod handlers;
pub mod roster;
pub mod sequencer;
pub mod synth;

pub use handlers::{RandomVoiceReward, SkipTtsReward, SpeakerReward, TtsSystem};
pub use roster::{random_voice, VOICES};
pub use sequencer::{AudioSink, Sequencer};
pub use synth::{AudioClip, SpeechProvider, StreamElementsTts};
