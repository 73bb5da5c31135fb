// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · envelope
// ──────────────────────────────────────────────────────────────────────────────
// OCS response envelope decoding:
//  • `{ "ocs": { "meta": { "statuscode": … }, "data": … } }` parsing
//  • Key-path walking with per-segment shape checks
//  • Typed extraction (int, string list, subtree)
//  • `OcsReply`: HTTP status paired with the (possibly undecodable) envelope
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{DecodeError, Rejection};
use crate::transport::RawResponse;
use log::debug;
use serde_json::Value;

const STATUS_PATH: &[&str] = &["ocs", "meta", "statuscode"];
const DATA_PATH: &[&str] = &["ocs", "data"];

/// A decoded OCS response body. The root is always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope(Value);

impl Envelope {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::NotJson(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        if !value.is_object() {
            return Err(DecodeError::NotJson("root is not an object".into()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// `ocs.meta.statuscode`
    pub fn status_code(&self) -> Result<i64, DecodeError> {
        self.extract_int(STATUS_PATH)
    }

    /// True iff the OCS status code equals `expected`. Decode failures count
    /// as a mismatch.
    pub fn validate_status(&self, expected: i64) -> bool {
        self.status_code().map(|c| c == expected).unwrap_or(false)
    }

    /// `ocs.data`
    pub fn data(&self) -> Result<&Value, DecodeError> {
        self.subtree(DATA_PATH)
    }

    /// The node at `path`; every segment must exist.
    pub fn subtree(&self, path: &[&str]) -> Result<&Value, DecodeError> {
        walk(&self.0, path)?.ok_or_else(|| DecodeError::bad_shape(path))
    }

    /// The number at `path`, truncated toward zero.
    pub fn extract_int(&self, path: &[&str]) -> Result<i64, DecodeError> {
        let node = self.subtree(path)?;
        node.as_i64()
            .or_else(|| node.as_f64().map(|f| f as i64))
            .ok_or_else(|| DecodeError::bad_shape(path))
    }

    /// The string array at `path`. An absent, `null` or empty terminal array
    /// yields an empty list; any non-string element is a shape error.
    pub fn extract_string_list(&self, path: &[&str]) -> Result<Vec<String>, DecodeError> {
        match walk(&self.0, path)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| DecodeError::bad_shape(path))
                })
                .collect(),
            Some(_) => Err(DecodeError::bad_shape(path)),
        }
    }
}

/// Walk `path` through nested objects. The terminal lookup may miss
/// (`Ok(None)`); a missing or non-object intermediate is a shape error.
/// An empty array stands in for an empty object (PHP encodes `[]` for both).
fn walk<'a>(root: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, DecodeError> {
    let mut current = root;
    for (i, key) in path.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(*key),
            Value::Array(items) if items.is_empty() => None,
            _ => return Err(DecodeError::bad_shape(&path[..=i])),
        };
        match next {
            Some(v) => current = v,
            None if i + 1 == path.len() => return Ok(None),
            None => return Err(DecodeError::bad_shape(&path[..=i])),
        }
    }
    Ok(Some(current))
}

// ── Reply ────────────────────────────────────────────────────────────────────

/// HTTP status plus the decoded envelope. Both must be consulted: the server
/// may answer HTTP 200 with a failing OCS code and vice versa.
#[derive(Debug, Clone)]
pub struct OcsReply {
    pub http_status: u16,
    pub envelope: Result<Envelope, DecodeError>,
}

impl OcsReply {
    pub fn from_raw(raw: RawResponse) -> Self {
        let reply = Self {
            http_status: raw.status,
            envelope: Envelope::decode(&raw.body),
        };
        debug!(
            "OCS reply: HTTP {}, OCS status {:?}",
            reply.http_status,
            reply.ocs_status()
        );
        reply
    }

    pub fn ocs_status(&self) -> Option<i64> {
        self.envelope.as_ref().ok()?.status_code().ok()
    }

    pub fn has_ocs_status(&self, code: i64) -> bool {
        self.envelope
            .as_ref()
            .map(|e| e.validate_status(code))
            .unwrap_or(false)
    }

    /// HTTP 200 with OCS status 200.
    pub fn is_success(&self) -> bool {
        self.http_status == 200 && self.has_ocs_status(200)
    }

    /// HTTP 404 or OCS 404.
    pub fn is_not_found(&self) -> bool {
        self.http_status == 404 || self.has_ocs_status(404)
    }

    pub fn rejection(&self) -> Rejection {
        Rejection {
            http_status: self.http_status,
            ocs_status: self.ocs_status(),
        }
    }

    pub fn envelope(&self) -> Result<&Envelope, DecodeError> {
        self.envelope.as_ref().map_err(Clone::clone)
    }

    pub fn data(&self) -> Result<&Value, DecodeError> {
        self.envelope()?.data()
    }

    pub fn string_list(&self, path: &[&str]) -> Result<Vec<String>, DecodeError> {
        self.envelope()?.extract_string_list(path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(v: Value) -> Envelope {
        Envelope::from_value(v).unwrap()
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(matches!(
            Envelope::decode(b"<html>oops</html>"),
            Err(DecodeError::NotJson(_))
        ));
        assert!(matches!(Envelope::decode(b""), Err(DecodeError::NotJson(_))));
    }

    #[test]
    fn decode_rejects_non_object_root() {
        assert!(matches!(
            Envelope::decode(b"[1, 2, 3]"),
            Err(DecodeError::NotJson(_))
        ));
        assert!(matches!(Envelope::decode(b"\"ok\""), Err(DecodeError::NotJson(_))));
    }

    #[test]
    fn status_code_read_from_meta() {
        let e = env(json!({"ocs": {"meta": {"statuscode": 102}, "data": []}}));
        assert_eq!(e.status_code().unwrap(), 102);
        assert!(e.validate_status(102));
        assert!(!e.validate_status(200));
    }

    #[test]
    fn status_code_missing_segment_is_bad_shape() {
        let e = env(json!({"ocs": {"data": []}}));
        assert_eq!(
            e.status_code().unwrap_err(),
            DecodeError::BadShape {
                path: "ocs.meta".into()
            }
        );
        assert!(!e.validate_status(200));
    }

    #[test]
    fn status_code_wrong_kind_is_bad_shape() {
        let e = env(json!({"ocs": {"meta": {"statuscode": "200"}}}));
        assert!(matches!(e.status_code(), Err(DecodeError::BadShape { .. })));
        let e = env(json!({"ocs": "broken"}));
        assert!(matches!(e.status_code(), Err(DecodeError::BadShape { .. })));
        assert!(!e.validate_status(200));
    }

    #[test]
    fn status_code_accepts_any_json_number() {
        let e = env(json!({"ocs": {"meta": {"statuscode": 200.0}}}));
        assert_eq!(e.status_code().unwrap(), 200);
        assert!(e.validate_status(200));

        let e = Envelope::decode(br#"{"ocs": {"meta": {"statuscode": 1e2}}}"#).unwrap();
        assert_eq!(e.status_code().unwrap(), 100);

        let e = env(json!({"ocs": {"data": {"used": 41.9}}}));
        assert_eq!(e.extract_int(&["ocs", "data", "used"]).unwrap(), 41);
    }

    #[test]
    fn extract_int_nested() {
        let e = env(json!({"ocs": {"data": {"quota": {"used": 42}}}}));
        assert_eq!(e.extract_int(&["ocs", "data", "quota", "used"]).unwrap(), 42);
        assert!(matches!(
            e.extract_int(&["ocs", "data", "quota"]),
            Err(DecodeError::BadShape { .. })
        ));
        assert!(matches!(
            e.extract_int(&["ocs", "data", "quota", "free"]),
            Err(DecodeError::BadShape { .. })
        ));
    }

    #[test]
    fn string_list_preserves_order() {
        let e = env(json!({"ocs": {"data": {"apps": ["files", "dav", "activity"]}}}));
        assert_eq!(
            e.extract_string_list(&["ocs", "data", "apps"]).unwrap(),
            vec!["files", "dav", "activity"]
        );
    }

    #[test]
    fn string_list_empty_array_is_empty() {
        let e = env(json!({"ocs": {"data": {"apps": []}}}));
        assert!(e.extract_string_list(&["ocs", "data", "apps"]).unwrap().is_empty());
    }

    #[test]
    fn string_list_absent_terminal_is_empty() {
        let e = env(json!({"ocs": {"data": {}}}));
        assert!(e.extract_string_list(&["ocs", "data", "apps"]).unwrap().is_empty());
        let e = env(json!({"ocs": {"data": {"apps": null}}}));
        assert!(e.extract_string_list(&["ocs", "data", "apps"]).unwrap().is_empty());
    }

    #[test]
    fn string_list_php_empty_map_is_empty() {
        let e = env(json!({"ocs": {"data": []}}));
        assert!(e.extract_string_list(&["ocs", "data", "groups"]).unwrap().is_empty());
    }

    #[test]
    fn string_list_wrong_terminal_type_is_bad_shape() {
        let e = env(json!({"ocs": {"data": {"apps": "files"}}}));
        assert_eq!(
            e.extract_string_list(&["ocs", "data", "apps"]).unwrap_err(),
            DecodeError::BadShape {
                path: "ocs.data.apps".into()
            }
        );
    }

    #[test]
    fn string_list_non_string_element_is_bad_shape() {
        let e = env(json!({"ocs": {"data": {"apps": ["files", 7]}}}));
        assert!(matches!(
            e.extract_string_list(&["ocs", "data", "apps"]),
            Err(DecodeError::BadShape { .. })
        ));
    }

    #[test]
    fn string_list_missing_intermediate_is_bad_shape() {
        let e = env(json!({"ocs": {"meta": {}}}));
        assert!(matches!(
            e.extract_string_list(&["ocs", "data", "apps"]),
            Err(DecodeError::BadShape { .. })
        ));
    }

    #[test]
    fn reply_success_needs_both_statuses() {
        let body = json!({"ocs": {"meta": {"statuscode": 200}, "data": []}}).to_string();
        assert!(OcsReply::from_raw(RawResponse::new(200, body.clone())).is_success());
        assert!(!OcsReply::from_raw(RawResponse::new(400, body)).is_success());

        let failing = json!({"ocs": {"meta": {"statuscode": 997}, "data": []}}).to_string();
        let reply = OcsReply::from_raw(RawResponse::new(200, failing));
        assert!(!reply.is_success());
        assert_eq!(
            reply.rejection(),
            Rejection {
                http_status: 200,
                ocs_status: Some(997)
            }
        );
    }

    #[test]
    fn reply_with_undecodable_body() {
        let reply = OcsReply::from_raw(RawResponse::new(500, ""));
        assert!(!reply.is_success());
        assert_eq!(reply.ocs_status(), None);
        assert!(!reply.has_ocs_status(500));
        assert!(matches!(reply.envelope(), Err(DecodeError::NotJson(_))));
    }

    #[test]
    fn reply_not_found_from_either_status() {
        assert!(OcsReply::from_raw(RawResponse::new(404, "")).is_not_found());
        let body = json!({"ocs": {"meta": {"statuscode": 404}, "data": []}}).to_string();
        assert!(OcsReply::from_raw(RawResponse::new(200, body)).is_not_found());
    }
}
