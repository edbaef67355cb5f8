//! Billing webhook payloads and the event-type to plan mapping.
//!
//! RevenueCat delivers `{"api_version": "1.0", "event": {...}}`; some relays
//! and test tools post the event fields flat at the top level. Both shapes
//! normalise into a [`BillingEvent`].

use serde::Deserialize;

use crate::error::EventParseError;
use crate::plan::Plan;

/// Event types that grant premium.
pub const ACTIVATING_EVENTS: &[&str] = &[
    "INITIAL_PURCHASE",
    "RENEWAL",
    "UNCANCELLATION",
    "NON_RENEWING_PURCHASE",
    "PRODUCT_CHANGE",
    "SUBSCRIPTION_EXTENDED",
    "TEMPORARY_ENTITLEMENT_GRANT",
];

/// Event types that drop the account back to free.
pub const DEACTIVATING_EVENTS: &[&str] = &["EXPIRATION", "SUBSCRIPTION_PAUSED"];

#[derive(Debug, Default, Deserialize)]
struct EventFields {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    app_user_id: Option<String>,
    #[serde(default, rename = "type")]
    event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEvent {
    Nested { event: EventFields },
    Flat(EventFields),
}

/// Normalised billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEvent {
    /// Provider-side event id, when present. Logged only.
    pub id: Option<String>,
    /// Subject whose plan the event concerns.
    pub app_user_id: String,
    pub event_type: String,
}

/// What a billing event means for the stored plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    SetPlan(Plan),
    Ignored,
}

impl BillingEvent {
    /// Parse a raw webhook body in either the nested or the flat shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, EventParseError> {
        let fields = match serde_json::from_slice::<RawEvent>(body)? {
            RawEvent::Nested { event } => event,
            RawEvent::Flat(fields) => fields,
        };

        let app_user_id = non_empty(fields.app_user_id)
            .ok_or(EventParseError::MissingField("app_user_id"))?;
        let event_type =
            non_empty(fields.event_type).ok_or(EventParseError::MissingField("type"))?;

        Ok(Self {
            id: fields.id,
            app_user_id,
            event_type,
        })
    }

    pub fn disposition(&self) -> EventDisposition {
        classify(&self.event_type)
    }
}

/// Map an event type onto a plan transition.
pub fn classify(event_type: &str) -> EventDisposition {
    if ACTIVATING_EVENTS.contains(&event_type) {
        EventDisposition::SetPlan(Plan::Premium)
    } else if DEACTIVATING_EVENTS.contains(&event_type) {
        EventDisposition::SetPlan(Plan::Free)
    } else {
        EventDisposition::Ignored
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_shape() {
        let body = br#"{"api_version":"1.0","event":{"id":"evt_1","type":"INITIAL_PURCHASE","app_user_id":"user-42","product_id":"pro_monthly"}}"#;
        let event = BillingEvent::from_slice(body).unwrap();
        assert_eq!(event.app_user_id, "user-42");
        assert_eq!(event.event_type, "INITIAL_PURCHASE");
        assert_eq!(event.id.as_deref(), Some("evt_1"));
    }

    #[test]
    fn test_parses_flat_shape() {
        let body = br#"{"type":"EXPIRATION","app_user_id":"user-7"}"#;
        let event = BillingEvent::from_slice(body).unwrap();
        assert_eq!(event.app_user_id, "user-7");
        assert_eq!(event.event_type, "EXPIRATION");
        assert!(event.id.is_none());
    }

    #[test]
    fn test_non_object_event_falls_back_to_flat_fields() {
        let body = br#"{"event":"noise","type":"RENEWAL","app_user_id":"u"}"#;
        let event = BillingEvent::from_slice(body).unwrap();
        assert_eq!(event.event_type, "RENEWAL");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let err = BillingEvent::from_slice(br#"{"event":{"type":"RENEWAL"}}"#).unwrap_err();
        assert!(matches!(err, EventParseError::MissingField("app_user_id")));

        let err = BillingEvent::from_slice(br#"{"app_user_id":"u1"}"#).unwrap_err();
        assert!(matches!(err, EventParseError::MissingField("type")));

        let err = BillingEvent::from_slice(br#"{"app_user_id":"  ","type":"RENEWAL"}"#).unwrap_err();
        assert!(matches!(err, EventParseError::MissingField("app_user_id")));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            BillingEvent::from_slice(b"not json"),
            Err(EventParseError::Malformed(_))
        ));
        assert!(matches!(
            BillingEvent::from_slice(b"[1,2,3]"),
            Err(EventParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("INITIAL_PURCHASE"),
            EventDisposition::SetPlan(Plan::Premium)
        );
        assert_eq!(classify("RENEWAL"), EventDisposition::SetPlan(Plan::Premium));
        assert_eq!(classify("EXPIRATION"), EventDisposition::SetPlan(Plan::Free));
        assert_eq!(classify("CANCELLATION"), EventDisposition::Ignored);
        assert_eq!(classify("BILLING_ISSUE"), EventDisposition::Ignored);
        assert_eq!(classify("initial_purchase"), EventDisposition::Ignored);
    }
}
