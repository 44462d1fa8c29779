//! Response Extraction
//!
//! Normalizes a heterogeneous upstream JSON response into a plain text
//! string. The three transports return differently shaped bodies; the
//! known shapes are modeled as an explicit tagged union so the "try
//! several shapes" policy stays exhaustively testable.
//!
//! Extraction is total: absence of extractable content is signaled by
//! an empty string, never an error.

use serde_json::Value;

/// Direct field keys checked on a top-level object, in trust order.
/// Direct fields are the common case from the backend and cheaper to
/// check; the choice-list shape implies a raw third-party passthrough
/// and is only consulted as a fallback.
const DIRECT_KEYS: &[&str] = &["response", "message", "content", "data", "text"];

/// The known upstream response shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// The body is already a bare JSON string
    PlainString(String),
    /// Text under a known top-level key
    DirectField { key: &'static str, text: String },
    /// OpenAI-style `choices[0].message.content` or `choices[0].text`
    ChoiceList(String),
    /// Nothing extractable
    Unrecognized,
}

impl ResponseShape {
    /// Classify a raw JSON value into one of the known shapes.
    pub fn classify(raw: &Value) -> Self {
        if let Value::String(s) = raw {
            return Self::PlainString(s.clone());
        }

        for &key in DIRECT_KEYS {
            if let Some(text) = raw.get(key).and_then(Value::as_str)
                && !text.is_empty()
            {
                return Self::DirectField {
                    key,
                    text: text.to_string(),
                };
            }
        }

        if let Some(first) = raw.get("choices").and_then(|c| c.get(0)) {
            let nested = first
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
                .or_else(|| first.get("text").and_then(Value::as_str));
            if let Some(text) = nested
                && !text.is_empty()
            {
                return Self::ChoiceList(text.to_string());
            }
        }

        Self::Unrecognized
    }

    /// The embedded text, or empty for `Unrecognized`.
    pub fn into_text(self) -> String {
        match self {
            Self::PlainString(text) | Self::ChoiceList(text) => text,
            Self::DirectField { text, .. } => text,
            Self::Unrecognized => String::new(),
        }
    }
}

/// Extract generated text from any upstream JSON value. Never panics
/// and never errors; an unrecognized shape yields an empty string.
pub fn extract_text(raw: &Value) -> String {
    ResponseShape::classify(raw).into_text()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_plain_string() {
        let raw = json!("the tide went out at dusk");
        assert_eq!(extract_text(&raw), "the tide went out at dusk");
        assert!(matches!(
            ResponseShape::classify(&raw),
            ResponseShape::PlainString(_)
        ));
    }

    #[test]
    fn test_direct_field_response() {
        let raw = json!({"response": "generated text", "conversation_id": "abc"});
        assert_eq!(extract_text(&raw), "generated text");
    }

    #[test]
    fn test_direct_field_trust_order() {
        // `response` wins over later keys when both are present
        let raw = json!({"response": "first", "content": "second"});
        assert_eq!(
            ResponseShape::classify(&raw),
            ResponseShape::DirectField {
                key: "response",
                text: "first".to_string()
            }
        );
    }

    #[test]
    fn test_direct_field_each_key() {
        for key in ["response", "message", "content", "data", "text"] {
            let raw = json!({ key: "body" });
            assert_eq!(extract_text(&raw), "body", "key {key} failed");
        }
    }

    #[test]
    fn test_choice_list_message_content() {
        let raw = json!({
            "choices": [{"message": {"role": "assistant", "content": "prose"}}],
            "usage": {"total_tokens": 42}
        });
        assert_eq!(extract_text(&raw), "prose");
        assert!(matches!(
            ResponseShape::classify(&raw),
            ResponseShape::ChoiceList(_)
        ));
    }

    #[test]
    fn test_choice_list_text_fallback() {
        let raw = json!({"choices": [{"text": "completion style"}]});
        assert_eq!(extract_text(&raw), "completion style");
    }

    #[test]
    fn test_direct_field_preferred_over_choices() {
        let raw = json!({
            "response": "from the backend",
            "choices": [{"message": {"content": "passthrough"}}]
        });
        assert_eq!(extract_text(&raw), "from the backend");
    }

    #[test]
    fn test_unrecognized_shapes_yield_empty() {
        for raw in [
            json!(null),
            json!(42),
            json!(true),
            json!([1, 2, 3]),
            json!({}),
            json!({"status": "ok"}),
            json!({"response": 17}),
            json!({"response": ""}),
            json!({"choices": []}),
            json!({"choices": [{"message": {}}]}),
            json!({"choices": [{"message": {"content": ""}}]}),
        ] {
            assert_eq!(extract_text(&raw), "", "shape {raw} should be empty");
        }
    }

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-z ]{0,32}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(4, 32, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
                prop::collection::hash_map("[a-z]{1,10}", inner, 0..4).prop_map(|m| {
                    serde_json::Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        /// Extraction is total over arbitrary JSON: never panics, and a
        /// non-empty result only comes from a recognized shape.
        #[test]
        fn prop_extract_never_panics(raw in arb_json()) {
            let text = extract_text(&raw);
            if !text.is_empty() {
                prop_assert!(ResponseShape::classify(&raw) != ResponseShape::Unrecognized);
            }
        }
    }
}
