//! Google Cloud Text-to-Speech REST client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voicegate::{SpeechSynthesizer, SynthesisError, SynthesizedAudio, VoiceSelection, AUDIO_ENCODING};

pub struct GoogleTtsClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceParams<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Deserialize)]
struct GoogleError {
    message: Option<String>,
}

impl GoogleTtsClient {
    /// Fails only if the HTTP client (30 s timeout, no redirects) cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelection,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let start = std::time::Instant::now();
        tracing::info!(
            language = voice.language_code,
            voice = voice.name,
            len = text.chars().count(),
            "Google TTS synthesize start"
        );

        let url = format!(
            "{}/v1/text:synthesize",
            self.base_url.trim_end_matches('/')
        );
        let request = SynthesizeRequest {
            input: TextInput { text },
            voice: VoiceParams {
                language_code: voice.language_code,
                name: voice.name,
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING,
            },
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SynthesisError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GoogleErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::warn!(status = status.as_u16(), %message, "Google TTS returned an error");
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SynthesizeResponse = serde_json::from_str(&body).map_err(|e| {
            SynthesisError::Transport(format!("failed to parse provider response: {e}"))
        })?;

        let audio = parsed
            .audio_content
            .filter(|a| !a.is_empty())
            .ok_or(SynthesisError::EmptyAudio)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Google TTS synthesize completed"
        );
        Ok(SynthesizedAudio::Base64(audio))
    }
}
