//! API row to domain conversion
//!
//! Everything the backend sends passes through here before the controller
//! sees it. Literal `"undefined"` / `"null"` strings and blank values are
//! turned into `None`, so a `Session` never carries a sentinel.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::service::wire::{ApiMessage, ApiSession};
use crate::session::types::{DeliveryStatus, Message, Session, SyncState};

/// Epoch values below this are seconds, at or above it milliseconds.
const SECONDS_CUTOFF: f64 = 1e11;

/// Scrub a loosely-typed identifier.
///
/// # Examples
///
/// ```
/// use chatrpc::session::convert::clean_identifier;
///
/// assert_eq!(clean_identifier(Some("openai")), Some("openai".to_string()));
/// assert_eq!(clean_identifier(Some("undefined")), None);
/// assert_eq!(clean_identifier(Some("  ")), None);
/// assert_eq!(clean_identifier(None), None);
/// ```
pub fn clean_identifier(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    match trimmed {
        "" | "undefined" | "null" => None,
        other => Some(other.to_string()),
    }
}

/// Normalise a backend timestamp to epoch milliseconds.
///
/// Returns `None` when the value is missing or cannot be interpreted.
pub fn parse_timestamp(raw: Option<&Value>) -> Option<i64> {
    match raw? {
        Value::Number(n) => {
            let v = n.as_f64()?;
            if !v.is_finite() || v < 0.0 {
                return None;
            }
            if v < SECONDS_CUTOFF {
                Some((v * 1000.0) as i64)
            } else {
                Some(v as i64)
            }
        }
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    // numeric strings show up from some proxies
    s.parse::<f64>()
        .ok()
        .and_then(|v| parse_timestamp(Some(&serde_json::json!(v))))
}

/// Convert a backend session row.
///
/// Returns `None` when the row has no usable id.
pub fn session_from_api(api: &ApiSession, default_title: &str) -> Option<Session> {
    let id = clean_identifier(api.id.as_deref())?;
    let now = Utc::now().timestamp_millis();
    let title = api
        .name
        .as_deref()
        .or(api.title.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(default_title)
        .to_string();
    let created_at = parse_timestamp(api.created_at.as_ref()).unwrap_or(now);
    let updated_at = parse_timestamp(api.updated_at.as_ref()).unwrap_or(created_at);

    Some(Session {
        id,
        title,
        created_at,
        updated_at,
        llm_provider: clean_identifier(api.llm_provider.as_deref()),
        llm_model: clean_identifier(api.llm_model.as_deref()),
        mcp_server_id: clean_identifier(api.mcp_server_id.as_deref()),
        message_count: api.message_count,
        sync: SyncState::Synced,
    })
}

/// Convert a backend message row. Messages without an id get a fresh one.
pub fn message_from_api(api: &ApiMessage) -> Message {
    message_with_fallbacks(
        api,
        || uuid::Uuid::new_v4().to_string(),
        Utc::now().timestamp_millis(),
    )
}

/// Convert a whole message list, preserving order.
///
/// Rows without an id are keyed by their position and rows without a
/// timestamp get `0`, so converting the same log twice yields equal lists.
pub fn messages_from_api(rows: &[ApiMessage]) -> Vec<Message> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| message_with_fallbacks(row, || format!("row-{}", index), 0))
        .collect()
}

fn message_with_fallbacks(
    api: &ApiMessage,
    fallback_id: impl FnOnce() -> String,
    fallback_timestamp: i64,
) -> Message {
    let id = api
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(fallback_id);
    Message {
        id,
        role: api
            .role
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "assistant".to_string()),
        content: api.content.clone(),
        timestamp: parse_timestamp(api.timestamp.as_ref()).unwrap_or(fallback_timestamp),
        tool_calls: api.tool_calls.clone().filter(|calls| !calls.is_empty()),
        status: DeliveryStatus::Confirmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> ApiSession {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_name_preferred_over_title() {
        let s = session_from_api(
            &row(json!({ "id": "s1", "name": "Named", "title": "Titled" })),
            "New Session",
        )
        .unwrap();
        assert_eq!(s.title, "Named");

        let s = session_from_api(&row(json!({ "id": "s1", "title": "Titled" })), "New Session")
            .unwrap();
        assert_eq!(s.title, "Titled");

        let s = session_from_api(&row(json!({ "id": "s1" })), "New Session").unwrap();
        assert_eq!(s.title, "New Session");
    }

    #[test]
    fn test_sentinels_become_none() {
        let s = session_from_api(
            &row(json!({
                "id": "s1",
                "llm_provider": "undefined",
                "llm_model": "null",
                "mcp_server_id": ""
            })),
            "t",
        )
        .unwrap();
        assert!(s.llm_provider.is_none());
        assert!(s.llm_model.is_none());
        assert!(s.mcp_server_id.is_none());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(session_from_api(&row(json!({ "name": "x" })), "t").is_none());
        assert!(session_from_api(&row(json!({ "id": "" })), "t").is_none());
    }

    #[test]
    fn test_timestamp_encodings() {
        assert_eq!(
            parse_timestamp(Some(&json!(1_700_000_000))),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            parse_timestamp(Some(&json!(1_700_000_000_123i64))),
            Some(1_700_000_000_123)
        );
        assert_eq!(
            parse_timestamp(Some(&json!("2024-01-02T03:04:05Z"))),
            Some(1_704_164_645_000)
        );
        assert_eq!(
            parse_timestamp(Some(&json!("2024-01-02T03:04:05.500"))),
            Some(1_704_164_645_500)
        );
        assert_eq!(parse_timestamp(Some(&json!("yesterday"))), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn test_updated_at_falls_back_to_created_at() {
        let s = session_from_api(&row(json!({ "id": "s1", "created_at": 1_000 })), "t").unwrap();
        assert_eq!(s.created_at, 1_000_000);
        assert_eq!(s.updated_at, 1_000_000);
    }

    #[test]
    fn test_message_conversion_is_confirmed() {
        let api: ApiMessage = serde_json::from_value(json!({
            "id": "m1",
            "role": "assistant",
            "content": { "text": "hi" },
            "timestamp": 1_700_000_000,
            "tool_calls": []
        }))
        .unwrap();
        let msg = message_from_api(&api);
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.status, DeliveryStatus::Confirmed);
        assert_eq!(msg.timestamp, 1_700_000_000_000);
        assert!(msg.tool_calls.is_none());
        assert_eq!(msg.content_text(), "hi");
    }

    #[test]
    fn test_rows_without_id_or_timestamp_convert_stably() {
        let rows: Vec<ApiMessage> = serde_json::from_value(json!([
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "hello" }
        ]))
        .unwrap();
        let first = messages_from_api(&rows);
        let second = messages_from_api(&rows);
        assert_eq!(first, second);
        assert_eq!(first[0].id, "row-0");
        assert_eq!(first[1].id, "row-1");
        assert_eq!(first[0].timestamp, 0);
    }
}
