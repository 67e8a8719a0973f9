//! Sensitive-field masking for payload logging.
//!
//! Provider payloads can carry card and credential material. Nothing
//! sensitive may reach the logs, so payloads are passed through this
//! filter before any logging. Stored `raw_event` blobs are NOT
//! redacted; the database is the audit trail.

use serde_json::{Map, Value};

const MASK: &str = "[REDACTED]";

/// Key fragments that mark a field as sensitive, matched
/// case-insensitively against each object key.
const SENSITIVE_FRAGMENTS: &[&str] = &[
    "cardnumber",
    "card_number",
    "cvv",
    "cvc",
    "password",
    "secret",
    "billingkey",
    "billing_key",
];

/// Returns a copy of `value` with sensitive fields masked, recursing
/// through nested objects and arrays.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                if is_sensitive(key) {
                    out.insert(key.clone(), Value::String(MASK.to_string()));
                } else {
                    out.insert(key.clone(), redact(val));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|f| key.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_card_fields() {
        let payload = json!({
            "orderId": "BIZ-1-PRO-1",
            "cardNumber": "4111111111111111",
            "cvv": "123"
        });

        let redacted = redact(&payload);

        assert_eq!(redacted["orderId"], "BIZ-1-PRO-1");
        assert_eq!(redacted["cardNumber"], MASK);
        assert_eq!(redacted["cvv"], MASK);
    }

    #[test]
    fn masks_nested_objects() {
        let payload = json!({
            "card": { "number_cvc": "123", "issuer": "visa" },
            "meta": [{ "password": "hunter2" }]
        });

        let redacted = redact(&payload);

        assert_eq!(redacted["card"]["number_cvc"], MASK);
        assert_eq!(redacted["card"]["issuer"], "visa");
        assert_eq!(redacted["meta"][0]["password"], MASK);
    }

    #[test]
    fn masks_billing_key() {
        let payload = json!({ "billingKey": "bk_secret_token" });
        assert_eq!(redact(&payload)["billingKey"], MASK);
    }

    #[test]
    fn key_matching_is_case_insensitive() {
        let payload = json!({ "CardNumber": "4111", "clientSecret": "sh" });
        let redacted = redact(&payload);

        assert_eq!(redacted["CardNumber"], MASK);
        assert_eq!(redacted["clientSecret"], MASK);
    }

    #[test]
    fn leaves_ordinary_payloads_untouched() {
        let payload = json!({
            "eventType": "payment.confirmed",
            "orderId": "BIZ-42-PRO-20260101",
            "totalAmount": 29000
        });

        assert_eq!(redact(&payload), payload);
    }

    #[test]
    fn handles_non_object_values() {
        assert_eq!(redact(&json!(42)), json!(42));
        assert_eq!(redact(&json!("text")), json!("text"));
        assert_eq!(redact(&json!(null)), json!(null));
    }
}
