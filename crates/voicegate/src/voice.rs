//! Language normalisation and voice selection.

use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    #[default]
    Female,
}

impl Gender {
    /// Case-insensitive and untrimmed; only `"male"` selects a male voice.
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw {
            Some(g) if g.eq_ignore_ascii_case("male") => Gender::Male,
            _ => Gender::Female,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Voice resolved for a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelection {
    /// BCP-47 code sent to the provider.
    pub language_code: &'static str,
    /// Provider voice name.
    pub name: &'static str,
}

struct VoiceProfile {
    code: &'static str,
    male: &'static str,
    female: &'static str,
}

// Short language keys accepted from clients.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("ja", "ja-JP"),
    ("es", "es-ES"),
    ("fr", "fr-FR"),
    ("de", "de-DE"),
    ("zh", "zh-CN"),
    ("ko", "ko-KR"),
    ("it", "it-IT"),
    ("pt", "pt-BR"),
    ("ru", "ru-RU"),
    ("ar", "ar-XA"),
    ("hi", "hi-IN"),
    ("tr", "tr-TR"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("sv", "sv-SE"),
    ("vi", "vi-VN"),
    ("th", "th-TH"),
    ("id", "id-ID"),
    ("he", "he-IL"),
    ("da", "da-DK"),
    ("el", "el-GR"),
    ("fi", "fi-FI"),
    ("no", "nb-NO"),
];

const fn profile(code: &'static str, male: &'static str, female: &'static str) -> VoiceProfile {
    VoiceProfile { code, male, female }
}

const VOICES: &[VoiceProfile] = &[
    profile("en-US", "en-US-Neural2-A", "en-US-Neural2-F"),
    profile("en-GB", "en-GB-Neural2-B", "en-GB-Neural2-A"),
    profile("ja-JP", "ja-JP-Neural2-B", "ja-JP-Neural2-A"),
    profile("zh-CN", "zh-CN-Wavenet-B", "zh-CN-Wavenet-A"),
    profile("zh-TW", "zh-TW-Wavenet-B", "zh-TW-Wavenet-A"),
    profile("es-ES", "es-ES-Polyglot-1", "es-ES-Neural2-A"),
    profile("fr-FR", "fr-FR-Neural2-B", "fr-FR-Neural2-A"),
    profile("de-DE", "de-DE-Neural2-B", "de-DE-Neural2-A"),
    profile("ko-KR", "ko-KR-Neural2-B", "ko-KR-Neural2-A"),
    profile("it-IT", "it-IT-Neural2-B", "it-IT-Neural2-A"),
    profile("pt-BR", "pt-BR-Neural2-B", "pt-BR-Neural2-A"),
    profile("ru-RU", "ru-RU-Neural2-B", "ru-RU-Neural2-A"),
    profile("ar-XA", "ar-XA-Wavenet-B", "ar-XA-Wavenet-A"),
    profile("hi-IN", "hi-IN-Neural2-B", "hi-IN-Neural2-A"),
    profile("tr-TR", "tr-TR-Wavenet-B", "tr-TR-Wavenet-A"),
    profile("nl-NL", "nl-NL-Neural2-B", "nl-NL-Neural2-A"),
    profile("pl-PL", "pl-PL-Neural2-B", "pl-PL-Neural2-A"),
    profile("sv-SE", "sv-SE-Neural2-B", "sv-SE-Neural2-A"),
    profile("vi-VN", "vi-VN-Neural2-B", "vi-VN-Neural2-A"),
    profile("th-TH", "th-TH-Neural2-B", "th-TH-Neural2-A"),
    profile("id-ID", "id-ID-Neural2-B", "id-ID-Neural2-A"),
    profile("he-IL", "he-IL-Wavenet-B", "he-IL-Wavenet-A"),
    profile("da-DK", "da-DK-Neural2-B", "da-DK-Neural2-A"),
    profile("el-GR", "el-GR-Neural2-B", "el-GR-Neural2-A"),
    profile("fi-FI", "fi-FI-Neural2-B", "fi-FI-Neural2-A"),
    profile("nb-NO", "nb-NO-Neural2-B", "nb-NO-Neural2-A"),
];

/// Map a short key like `ja` onto its canonical code. Unknown input passes
/// through unchanged.
pub fn normalize_language(lang: &str) -> &str {
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lang)
        .map(|(_, code)| *code)
        .unwrap_or(lang)
}

/// Pick the provider voice for a language and gender.
pub fn resolve_voice(lang: &str, gender: Gender) -> Result<VoiceSelection, SynthesisError> {
    let normalized = normalize_language(lang);
    let profile = VOICES
        .iter()
        .find(|p| p.code == normalized)
        .ok_or_else(|| SynthesisError::UnsupportedLanguage(lang.to_string()))?;

    Ok(VoiceSelection {
        language_code: profile.code,
        name: match gender {
            Gender::Male => profile.male,
            Gender::Female => profile.female,
        },
    })
}
