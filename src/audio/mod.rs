pub mod file;
pub mod mixer;

pub use file::{encode_wav, wav_duration, write_wav, AudioFile};
pub use mixer::{downmix_to_mono, mix_file_to_mono};
