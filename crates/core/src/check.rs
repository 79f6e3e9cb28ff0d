//! Check definitions, runtime state, and the record validator.
//!
//! Checks are stored as loosely-typed JSON documents owned by an external
//! CRUD surface. [`validate_check`] normalizes one document into a
//! [`ValidCheck`] or reports every required field that failed. Runtime state
//! (`state`, `lastChecked`) never fails validation; malformed values fall
//! back to "down, never checked".

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::UnixMillis;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Record-store collection holding check documents.
pub const CHECKS_COLLECTION: &str = "checks";

/// Exact length of a check id.
pub const CHECK_ID_LEN: usize = 20;

/// Exact length of the owner's phone number (alert destination).
pub const OWNER_PHONE_LEN: usize = 10;

/// Inclusive bounds for `timeoutSeconds`.
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 5;

// Record keys.
const KEY_ID: &str = "id";
const KEY_PHONE: &str = "userPhone";
const KEY_PROTOCOL: &str = "protocol";
const KEY_URL: &str = "url";
const KEY_METHOD: &str = "method";
const KEY_SUCCESS_CODES: &str = "successCodes";
const KEY_TIMEOUT: &str = "timeoutSeconds";
const KEY_STATE: &str = "state";
const KEY_LAST_CHECKED: &str = "lastChecked";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// URL scheme used to reach a check's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

/// HTTP method issued by the probe. Stored lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Wire form, e.g. `"GET"`.
    pub fn as_upper(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Health of a check's target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Up,
    #[default]
    Down,
}

impl HealthState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CheckDefinition / CheckRuntimeState
// ---------------------------------------------------------------------------

/// The immutable, validated part of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDefinition {
    pub id: String,
    /// Ten-digit phone number alerts are sent to.
    pub owner_phone: String,
    pub protocol: Protocol,
    /// Host plus optional path and query, without a scheme.
    pub url: String,
    pub method: HttpMethod,
    pub success_codes: Vec<u16>,
    pub timeout_secs: u64,
}

impl CheckDefinition {
    /// Full target URL, e.g. `http://example.com/health`.
    pub fn target_url(&self) -> String {
        format!("{}://{}", self.protocol.as_str(), self.url)
    }

    /// Hard deadline for a single probe.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_secs * 1000)
    }

    /// Whether `code` is one of the acceptable response codes.
    pub fn accepts(&self, code: u16) -> bool {
        self.success_codes.contains(&code)
    }
}

/// Mutable per-check state written back after every evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckRuntimeState {
    pub state: HealthState,
    /// `None` until the first evaluation.
    pub last_checked: Option<UnixMillis>,
}

impl CheckRuntimeState {
    /// Write `state` and `lastChecked` onto a raw check record, leaving every
    /// other field untouched. Non-object records are left as they are.
    pub fn write_to(&self, record: &mut Value) {
        let Some(obj) = record.as_object_mut() else {
            return;
        };
        obj.insert(KEY_STATE.into(), Value::from(self.state.as_str()));
        match self.last_checked {
            Some(ts) => obj.insert(KEY_LAST_CHECKED.into(), Value::from(ts)),
            None => obj.remove(KEY_LAST_CHECKED),
        };
    }
}

/// A check that passed validation and may be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheck {
    pub definition: CheckDefinition,
    pub runtime: CheckRuntimeState,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate and normalize one raw check record.
///
/// Every required field is checked so the returned error names all of the
/// failures at once rather than only the first.
pub fn validate_check(record: &Value) -> Result<ValidCheck, ValidationError> {
    let empty = serde_json::Map::new();
    let obj = record.as_object().unwrap_or(&empty);
    let mut failed = Vec::new();

    let id = obj
        .get(KEY_ID)
        .and_then(Value::as_str)
        .filter(|s| s.chars().count() == CHECK_ID_LEN);
    if id.is_none() {
        failed.push(KEY_ID);
    }

    let owner_phone = obj
        .get(KEY_PHONE)
        .and_then(Value::as_str)
        .filter(|s| s.len() == OWNER_PHONE_LEN && s.bytes().all(|b| b.is_ascii_digit()));
    if owner_phone.is_none() {
        failed.push(KEY_PHONE);
    }

    let protocol = obj
        .get(KEY_PROTOCOL)
        .and_then(Value::as_str)
        .and_then(Protocol::parse);
    if protocol.is_none() {
        failed.push(KEY_PROTOCOL);
    }

    let url = obj
        .get(KEY_URL)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    if url.is_none() {
        failed.push(KEY_URL);
    }

    let method = obj
        .get(KEY_METHOD)
        .and_then(Value::as_str)
        .and_then(HttpMethod::parse);
    if method.is_none() {
        failed.push(KEY_METHOD);
    }

    let success_codes = obj.get(KEY_SUCCESS_CODES).and_then(parse_success_codes);
    if success_codes.is_none() {
        failed.push(KEY_SUCCESS_CODES);
    }

    let timeout_secs = obj
        .get(KEY_TIMEOUT)
        .and_then(whole_number)
        .filter(|t| (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(t));
    if timeout_secs.is_none() {
        failed.push(KEY_TIMEOUT);
    }

    let runtime = CheckRuntimeState {
        state: obj
            .get(KEY_STATE)
            .and_then(Value::as_str)
            .and_then(HealthState::parse)
            .unwrap_or_default(),
        last_checked: obj.get(KEY_LAST_CHECKED).and_then(positive_millis),
    };

    match (id, owner_phone, protocol, url, method, success_codes, timeout_secs) {
        (
            Some(id),
            Some(owner_phone),
            Some(protocol),
            Some(url),
            Some(method),
            Some(success_codes),
            Some(timeout_secs),
        ) => Ok(ValidCheck {
            definition: CheckDefinition {
                id: id.to_string(),
                owner_phone: owner_phone.to_string(),
                protocol,
                url: url.to_string(),
                method,
                success_codes,
                timeout_secs,
            },
            runtime,
        }),
        _ => Err(ValidationError {
            check_id: obj.get(KEY_ID).and_then(Value::as_str).map(str::to_string),
            fields: failed,
        }),
    }
}

/// A non-empty array whose every element is an HTTP status code.
fn parse_success_codes(value: &Value) -> Option<Vec<u16>> {
    let codes = value
        .as_array()?
        .iter()
        .map(|v| {
            whole_number(v)
                .filter(|c| (100..=599).contains(c))
                .map(|c| c as u16)
        })
        .collect::<Option<Vec<u16>>>()?;
    (!codes.is_empty()).then_some(codes)
}

/// Non-negative integer, accepting integral floats such as `3.0`.
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64)
    })
}

fn positive_millis(value: &Value) -> Option<UnixMillis> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .filter(|ts| *ts > 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
