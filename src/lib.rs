//! Real-time stereo field analysis: goniometer points, persistence trail and
//! phase correlation for a stream of audio blocks.

pub mod audio;
pub mod dsp;
pub mod settings;
pub mod util;

pub use dsp::goniometer::{
    ConfigError, EngineState, GoniometerConfig, GoniometerProcessor, GoniometerSnapshot,
};
pub use dsp::{AudioBlock, AudioProcessor, Reconfigurable, SampleLayout};
