//! Request body decoding and field lookup shared by the submission handlers.

use serde_json::{Map, Value};

/// Decoded top-level fields of a submission body.
pub type Payload = Map<String, Value>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// A submitted field together with the keys it may arrive under, in the
/// order they are consulted.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

pub const CONTACT_NAME: Field = Field {
    name: "name",
    aliases: &["name"],
};

pub const CONTACT_EMAIL: Field = Field {
    name: "email",
    aliases: &["email"],
};

pub const CONTACT_MESSAGE: Field = Field {
    name: "message",
    aliases: &["message"],
};

pub const TODO_NAME: Field = Field {
    name: "itemName",
    aliases: &["itemName", "item_name"],
};

pub const TODO_DESCRIPTION: Field = Field {
    name: "itemDescription",
    aliases: &["itemDescription", "item_description"],
};

impl Field {
    /// Value of the first alias holding a non-empty string, trimmed.
    /// Absent, empty and non-string values all resolve to `""`.
    pub fn resolve(&self, payload: &Payload) -> String {
        self.aliases
            .iter()
            .filter_map(|alias| payload.get(*alias).and_then(Value::as_str))
            .find(|value| !value.is_empty())
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

/// Parses `body` as a JSON object. Anything else, including `{}` and
/// `null`, counts as no payload.
pub fn decode_json(body: &[u8]) -> Option<Payload> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Media type of a `Content-Type` header value, lower-cased and without
/// parameters.
pub fn mime_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .filter(|mime| !mime.is_empty())
}

/// `application/json` or any `+json` suffixed type.
pub fn is_json(content_type: Option<&str>) -> bool {
    mime_type(content_type)
        .is_some_and(|mime| mime == JSON_CONTENT_TYPE || mime.ends_with("+json"))
}

pub fn is_multipart(content_type: Option<&str>) -> bool {
    mime_type(content_type).is_some_and(|mime| mime == MULTIPART_CONTENT_TYPE)
}

/// Collects form fields in arrival order; the first occurrence of a
/// repeated key wins.
pub fn payload_from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Payload {
    let mut payload = Payload::new();
    for (key, value) in pairs {
        payload.entry(key).or_insert(Value::String(value));
    }
    payload
}

/// Parses a url-encoded form body. Only attempted when the request declares
/// the form content type.
pub fn decode_form(content_type: Option<&str>, body: &[u8]) -> Option<Payload> {
    if mime_type(content_type).as_deref() != Some(FORM_CONTENT_TYPE) {
        return None;
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
    let payload = payload_from_pairs(pairs);
    (!payload.is_empty()).then_some(payload)
}

/// JSON when the request is typed as JSON, url-encoded form fields
/// otherwise, then nothing.
pub fn decode_json_or_form(content_type: Option<&str>, body: &[u8]) -> Payload {
    is_json(content_type)
        .then(|| decode_json(body))
        .flatten()
        .or_else(|| decode_form(content_type, body))
        .unwrap_or_default()
}
