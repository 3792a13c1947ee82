//! Sample encoder implementations

mod flac;
mod wav;

pub use flac::FlacEncoder;
pub use wav::WavEncoder;
