// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire formats of the evaluate and track endpoints.

use serde::Serialize;
use serde_json::Value;

use super::{NetworkError, NetworkResult};
use crate::models::{FlagResult, FlagSet, TrackEvent};

/// Body sent to the track endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrackRequestJson<'a> {
    pub api_key: &'a str,
    #[serde(flatten)]
    pub event: &'a TrackEvent,
}

/// Parses the body returned by the evaluate endpoint.
///
/// The body must be a JSON object keyed by flag name. Entries that are not
/// objects are skipped, a missing or non-boolean `enabled` reads as `false` and
/// a non-string `variant` reads as absent.
pub(crate) fn parse_evaluate_response(body: &str) -> NetworkResult<FlagSet> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| NetworkError::DeserializationError(e.to_string()))?;

    let Value::Object(entries) = value else {
        return Err(NetworkError::DeserializationError(
            "expected a JSON object keyed by flag name".to_string(),
        ));
    };

    Ok(entries
        .into_iter()
        .filter_map(|(flag_name, entry)| {
            let Value::Object(fields) = entry else {
                return None;
            };
            let enabled = fields.get("enabled").and_then(Value::as_bool).unwrap_or(false);
            let variant = fields
                .get("variant")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((flag_name, FlagResult::new(enabled, variant)))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_well_formed() {
        let flags = parse_evaluate_response(
            r#"{"f": {"enabled": true, "variant": "b"}, "g": {"enabled": false}}"#,
        )
        .unwrap();

        assert_eq!(flags.len(), 2);
        assert_eq!(flags["f"], FlagResult::new(true, Some("b".to_string())));
        assert_eq!(flags["g"], FlagResult::new(false, None));
    }

    #[test]
    fn test_parse_skips_non_object_entries() {
        let flags = parse_evaluate_response(
            r#"{"f": {"enabled": true}, "version": 3, "list": [1, 2], "text": "x", "nothing": null}"#,
        )
        .unwrap();

        assert_eq!(flags.len(), 1);
        assert!(flags.contains_key("f"));
    }

    #[test]
    fn test_parse_malformed_fields() {
        let flags = parse_evaluate_response(
            r#"{"a": {}, "b": {"enabled": "yes", "variant": 7}, "c": {"variant": "v"}}"#,
        )
        .unwrap();

        assert_eq!(flags["a"], FlagResult::new(false, None));
        assert_eq!(flags["b"], FlagResult::new(false, None));
        assert_eq!(flags["c"], FlagResult::new(false, Some("v".to_string())));
    }

    #[test]
    fn test_parse_rejects_non_object_body() {
        assert!(matches!(
            parse_evaluate_response("[1, 2, 3]"),
            Err(NetworkError::DeserializationError(_))
        ));
        assert!(matches!(
            parse_evaluate_response("not json"),
            Err(NetworkError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_track_request_body() {
        let event = TrackEvent {
            event_name: "purchase".to_string(),
            user_id: "user-1".to_string(),
            flag_name: Some("f".to_string()),
            variant: Some("b".to_string()),
            metadata: None,
        };
        let body = TrackRequestJson {
            api_key: "key",
            event: &event,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "apiKey": "key",
                "eventName": "purchase",
                "userId": "user-1",
                "flagName": "f",
                "variant": "b"
            })
        );
    }
}
