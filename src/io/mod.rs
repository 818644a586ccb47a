//! WAV file I/O and sample-rate conversion, the audio-device-agnostic half
//! of the crate's external interfaces.

pub mod audio;
