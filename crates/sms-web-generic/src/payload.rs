use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode;
use sms_core::RelayError;
use std::borrow::Cow;
use std::collections::HashMap;

/// Form fields decoded from the request body, each key mapped to its values
/// in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: HashMap<String, Vec<String>>,
}

impl Payload {
    /// Decode a base64 body and parse the resulting form.
    pub fn decode(body_b64: &str) -> Result<Self, RelayError> {
        let raw = STANDARD
            .decode(body_b64.trim())
            .map_err(|e| RelayError::Decode(format!("invalid base64 body: {}", e)))?;
        Self::parse(&raw)
    }

    /// Parse `application/x-www-form-urlencoded` bytes.
    ///
    /// Pairs with an empty value are dropped, so `authToken=` reads the same as
    /// a missing `authToken`. Keys and values must decode to valid UTF-8,
    /// percent escapes included.
    pub fn parse(raw: &[u8]) -> Result<Self, RelayError> {
        std::str::from_utf8(raw)
            .map_err(|e| RelayError::Decode(format!("body is not valid utf-8: {}", e)))?;

        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for pair in raw.split(|b| *b == b'&').filter(|pair| !pair.is_empty()) {
            let (key, value) = match pair.iter().position(|b| *b == b'=') {
                Some(at) => (&pair[..at], &pair[at + 1..]),
                None => (pair, &[][..]),
            };
            if value.is_empty() {
                continue;
            }
            fields
                .entry(decode_component(key)?)
                .or_default()
                .push(decode_component(value)?);
        }

        Ok(Self { fields })
    }

    /// All values for `key`, `None` when the key is absent.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.fields
            .get(key)
            .map(Vec::as_slice)
            .filter(|values| !values.is_empty())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// `+` means space; percent escapes are decoded strictly.
fn decode_component(raw: &[u8]) -> Result<String, RelayError> {
    let unplussed: Cow<'_, [u8]> = if raw.contains(&b'+') {
        Cow::Owned(
            raw.iter()
                .map(|&b| if b == b'+' { b' ' } else { b })
                .collect(),
        )
    } else {
        Cow::Borrowed(raw)
    };

    percent_decode(&unplussed)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| RelayError::Decode(format!("form field is not valid utf-8: {}", e)))
}
