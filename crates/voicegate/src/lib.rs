//! Domain logic for the voicegate text-to-speech service.
//!
//! voicegate fronts a speech-synthesis provider behind a per-user token quota
//! and keeps each account's plan in sync with a subscription billing provider.
//! This crate holds everything that does not depend on the HTTP server:
//!
//! - [`plan`] - account plan, provenance tag, and the stored account record
//! - [`quota`] - token estimation and the reservation decision
//! - [`billing`] - billing webhook payload parsing and event-to-plan mapping
//! - [`voice`] - language normalisation and the per-gender voice catalogue
//! - [`synthesis`] - the [`SpeechSynthesizer`] provider seam
//! - [`identity`] - caller identity and the [`IdentityAdmin`] claim seam
//! - [`hmac`] - webhook signature computation and constant-time verification
//!
//! The server crate (`voicegate-server`) wires these into actix-web handlers
//! backed by SQLite.

pub mod billing;
pub mod constants;
pub mod error;
pub mod hmac;
pub mod identity;
pub mod plan;
pub mod quota;
pub mod synthesis;
pub mod voice;

pub use billing::{BillingEvent, EventDisposition};
pub use constants::*;
pub use error::{EventParseError, IdentityError, PlanInputError, QuotaError, SynthesisError};
pub use identity::{CallerIdentity, IdentityAdmin};
pub use plan::{Plan, PlanSource, UserAccount};
pub use quota::{CharCountEstimator, ReservationDecision, TokenEstimator};
pub use synthesis::{SpeechSynthesizer, SynthesizedAudio};
pub use voice::{Gender, VoiceSelection};
