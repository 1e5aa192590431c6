pub mod audio;
pub mod envelope;
pub mod midi;
pub mod sink;
pub mod transport;
pub mod voice;

pub use audio::AudioPlayerHandle;
pub use midi::MidiOutputHandle;
pub use sink::{OutputMode, SinkRouter, TriggerSink};
pub use transport::Transport;
