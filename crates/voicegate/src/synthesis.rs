use async_trait::async_trait;
use base64::Engine;

use crate::error::SynthesisError;
use crate::voice::VoiceSelection;

/// Audio returned by a provider. Some providers hand back base64 already,
/// others raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesizedAudio {
    Base64(String),
    Bytes(Vec<u8>),
}

impl SynthesizedAudio {
    pub fn into_base64(self) -> String {
        match self {
            SynthesizedAudio::Base64(encoded) => encoded,
            SynthesizedAudio::Bytes(raw) => base64::engine::general_purpose::STANDARD.encode(raw),
        }
    }
}

/// A text-to-speech provider producing MP3 audio.
///
/// One call is one round trip; implementations do not retry.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelection,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}
