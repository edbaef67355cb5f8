/// Free-tier token cap used when `FREE_PLAN_MAX_TOKENS` is not configured.
pub const DEFAULT_FREE_PLAN_MAX_TOKENS: u64 = 1000;

/// Language used when a synthesis request names none.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Audio encoding requested from the provider and reported to callers.
pub const AUDIO_ENCODING: &str = "MP3";

/// Primary webhook signature header sent by RevenueCat.
pub const SIGNATURE_HEADER: &str = "X-RevenueCat-Signature";

/// Generic signature header accepted when the primary one is absent.
pub const FALLBACK_SIGNATURE_HEADER: &str = "X-Signature";
