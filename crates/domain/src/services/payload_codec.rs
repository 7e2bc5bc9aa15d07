//! Scan payload codec.
//!
//! Encodes a registration into the string rendered into its QR code and
//! decodes scanned text back into identifiers. Decoding accepts the canonical
//! JSON envelope plus the historical formats still printed on older tickets:
//!
//! 1. JSON record (`{"type":"event_registration","eventId":..,"registrationId":..}`
//!    or any object exposing a known registration-id field)
//! 2. Verification link (`https://host/verify/<event>/<registration>`)
//! 3. Colon pair (`<event>:<registration>`)
//! 4. Bare UUID (`a1b2c3d4-e5f6-7890-abcd-ef1234567890`)
//!
//! The first format that matches wins. Nothing here touches storage.

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Type tag of the canonical envelope.
pub const PAYLOAD_TYPE: &str = "event_registration";

/// Version marker of the canonical envelope.
pub const PAYLOAD_VERSION: &str = "1.0";

const VERIFY_PATH_MARKER: &str = "/verify/";
const PAIR_SEPARATOR: char = ':';
const MAX_TOKEN_LENGTH: usize = 128;

/// Fields that may carry the registration identifier, in lookup order.
const REGISTRATION_ID_FIELDS: &[&str] = &["registrationId", "registration_id", "regId", "id"];

/// Fields that may carry the event identifier, in lookup order.
const EVENT_ID_FIELDS: &[&str] = &["eventId", "event_id"];

lazy_static::lazy_static! {
    static ref BARE_UUID_REGEX: regex::Regex = regex::Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

/// Which encoding a scanned payload was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Structured,
    VerificationPath,
    DelimitedPair,
    BareIdentifier,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Structured => "structured",
            PayloadFormat::VerificationPath => "verification_path",
            PayloadFormat::DelimitedPair => "delimited_pair",
            PayloadFormat::BareIdentifier => "bare_identifier",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifiers recovered from a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    /// Empty when the scanned format carried no event identifier.
    pub event_id: String,
    /// Always non-empty.
    pub registration_id: String,
    pub format: PayloadFormat,
}

impl ScanPayload {
    pub fn has_event_id(&self) -> bool {
        !self.event_id.is_empty()
    }
}

/// Why a scan could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Scan payload is empty")]
    Empty,

    #[error("Unrecognized payload format: {raw}")]
    Unrecognized { raw: String },
}

type Extractor = fn(&str) -> Option<(String, String)>;

/// Decode strategies in precedence order.
const STRATEGIES: &[(PayloadFormat, Extractor)] = &[
    (PayloadFormat::Structured, from_structured),
    (PayloadFormat::VerificationPath, from_verification_path),
    (PayloadFormat::DelimitedPair, from_delimited_pair),
    (PayloadFormat::BareIdentifier, from_bare_identifier),
];

/// Encodes a registration into the canonical envelope, stamped with the current time.
pub fn encode(event_id: &str, registration_id: &str) -> String {
    encode_at(event_id, registration_id, Utc::now().timestamp_millis())
}

/// Encodes with an explicit timestamp (milliseconds since the Unix epoch).
pub fn encode_at(event_id: &str, registration_id: &str, timestamp_millis: i64) -> String {
    json!({
        "type": PAYLOAD_TYPE,
        "eventId": event_id,
        "registrationId": registration_id,
        "timestamp": timestamp_millis,
        "version": PAYLOAD_VERSION,
    })
    .to_string()
}

/// Builds the public verification link for a registration.
pub fn verification_url(base_url: &str, event_id: &str, registration_id: &str) -> String {
    format!(
        "{}{}{}/{}",
        base_url.trim_end_matches('/'),
        VERIFY_PATH_MARKER,
        event_id,
        registration_id
    )
}

/// Decodes scanned text into identifiers.
pub fn decode(raw: &str) -> Result<ScanPayload, DecodeError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    STRATEGIES
        .iter()
        .find_map(|(format, extract)| {
            extract(text).map(|(event_id, registration_id)| ScanPayload {
                event_id,
                registration_id,
                format: *format,
            })
        })
        .ok_or_else(|| DecodeError::Unrecognized {
            raw: raw.to_string(),
        })
}

/// JSON object with a recognizable registration-id field. The canonical
/// envelope is the case where the type tag and `registrationId` are present.
fn from_structured(text: &str) -> Option<(String, String)> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    let registration_id = REGISTRATION_ID_FIELDS
        .iter()
        .find_map(|key| identifier_field(object, key))?;
    let event_id = EVENT_ID_FIELDS
        .iter()
        .find_map(|key| identifier_field(object, key))
        .unwrap_or_default();

    Some((event_id, registration_id))
}

fn identifier_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn from_verification_path(text: &str) -> Option<(String, String)> {
    let start = text.find(VERIFY_PATH_MARKER)? + VERIFY_PATH_MARKER.len();
    let path = text[start..].split(['?', '#']).next().unwrap_or_default();

    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let (registration_id, preceding) = segments.split_last()?;
    if !is_identifier_token(registration_id) {
        return None;
    }

    let event_id = preceding
        .last()
        .filter(|s| is_identifier_token(s))
        .map(|s| s.to_string())
        .unwrap_or_default();

    Some((event_id, registration_id.to_string()))
}

fn from_delimited_pair(text: &str) -> Option<(String, String)> {
    if text.matches(PAIR_SEPARATOR).count() != 1 {
        return None;
    }

    let (left, right) = text.split_once(PAIR_SEPARATOR)?;
    let (left, right) = (left.trim(), right.trim());
    if !is_identifier_token(right) {
        return None;
    }

    let event_id = if is_identifier_token(left) {
        left.to_string()
    } else {
        String::new()
    };

    Some((event_id, right.to_string()))
}

fn from_bare_identifier(text: &str) -> Option<(String, String)> {
    BARE_UUID_REGEX
        .is_match(text)
        .then(|| (String::new(), text.to_string()))
}

/// Identifier-shaped token: 1..=128 ASCII letters, digits, `-` or `_`.
fn is_identifier_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LENGTH
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
