use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SellsyError};

/// Params is a convenience type for structured call parameters.
pub type Params = Map<String, Value>;

/// Status value the API uses for a successful call
pub const STATUS_SUCCESS: &str = "success";

/// Marker present in bodies of OAuth-level rejections
pub(crate) const OAUTH_PROBLEM: &str = "oauth_problem";

/// Outbound envelope wrapped into the `do_in` form field.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope<'a> {
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> RequestEnvelope<'a> {
    pub fn new(method: &'a str, params: &'a Value) -> Self {
        RequestEnvelope { method, params }
    }

    /// JSON text sent in `do_in` and written to the activity log
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

}

/// Form fields of the multipart body, in a stable order
pub fn form_fields(do_in: String) -> Vec<(String, String)> {
    vec![
        ("request".to_string(), "1".to_string()),
        ("io_mode".to_string(), "json".to_string()),
        ("do_in".to_string(), do_in),
    ]
}

/// Encode a call into the multipart form fields expected by the API
pub fn encode_request(method: &str, params: &Value) -> Result<Vec<(String, String)>> {
    Ok(form_fields(RequestEnvelope::new(method, params).to_json()?))
}

/// Decode a raw response body into the call payload.
///
/// The payload is the untouched `response` value; anything else in the
/// envelope is turned into the matching [`SellsyError`].
pub fn decode_response(body: &str) -> Result<Value> {
    if body.contains(OAUTH_PROBLEM) {
        return Err(SellsyError::Authentication {
            body: body.to_string(),
        });
    }

    let mut envelope = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(SellsyError::malformed("unable to decode JSON", body)),
    };

    let status = envelope
        .get("status")
        .ok_or_else(|| SellsyError::malformed("status field missing", body))?;

    if status.as_str() != Some(STATUS_SUCCESS) {
        return Err(api_error(envelope.get("error")));
    }

    envelope
        .remove("response")
        .ok_or_else(|| SellsyError::malformed("response field missing", body))
}

/// Build the error for a non-success envelope from its `error` field
fn api_error(error: Option<&Value>) -> SellsyError {
    let Some(Value::Object(error)) = error else {
        return SellsyError::UnknownApi;
    };
    let Some(code) = error.get("code") else {
        return SellsyError::UnknownApi;
    };

    let message = match error.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    SellsyError::Api {
        message,
        code: code.clone(),
        more: error.get("more").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_request_fields() {
        let fields = encode_request("Client.getOne", &json!({"clientid": 7})).unwrap();

        assert_eq!(fields[0], ("request".to_string(), "1".to_string()));
        assert_eq!(fields[1], ("io_mode".to_string(), "json".to_string()));
        assert_eq!(fields[2].0, "do_in");

        let do_in: Value = serde_json::from_str(&fields[2].1).unwrap();
        assert_eq!(do_in, json!({"method": "Client.getOne", "params": {"clientid": 7}}));
    }

    #[test]
    fn test_encode_then_decode_success() {
        let fields = encode_request("M", &json!({"a": 1})).unwrap();
        assert!(fields[2].1.contains("\"method\":\"M\""));

        let payload = decode_response(r#"{"status":"success","response":{"a":1}}"#).unwrap();
        assert_eq!(payload, json!({"a": 1}));
    }

    #[test]
    fn test_decode_null_response_is_payload() {
        let payload = decode_response(r#"{"status":"success","response":null}"#).unwrap();
        assert_eq!(payload, Value::Null);
    }

    #[test]
    fn test_decode_api_error() {
        let err = decode_response(r#"{"status":"failed","error":{"code":42,"message":"bad"}}"#)
            .unwrap_err();

        match err {
            SellsyError::Api { message, code, more } => {
                assert_eq!(message, "bad");
                assert_eq!(code, json!(42));
                assert!(more.is_none());
            }
            other => panic!("expected SellsyError::Api, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_api_error_with_more_and_no_message() {
        let err = decode_response(
            r#"{"status":"error","error":{"code":"E_PARAM","more":{"field":"name"}}}"#,
        )
        .unwrap_err();

        match err {
            SellsyError::Api { message, code, more } => {
                assert_eq!(message, "");
                assert_eq!(code, json!("E_PARAM"));
                assert_eq!(more, Some(json!({"field": "name"})));
            }
            other => panic!("expected SellsyError::Api, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_api_error() {
        for body in [
            r#"{"status":"failed"}"#,
            r#"{"status":"failed","error":"oops"}"#,
            r#"{"status":"failed","error":{"message":"no code"}}"#,
            r#"{"status":null,"response":1}"#,
        ] {
            let err = decode_response(body).unwrap_err();
            assert!(matches!(err, SellsyError::UnknownApi), "body {}: {:?}", body, err);
        }
    }

    #[test]
    fn test_decode_oauth_problem() {
        let err = decode_response("oauth_problem=token_rejected").unwrap_err();
        assert!(err.is_auth_error());

        // JSON validity does not matter
        let err = decode_response(r#"{"status":"success","response":"oauth_problem"}"#).unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_decode_malformed() {
        for body in ["not json", "[1,2,3]", "\"text\"", ""] {
            let err = decode_response(body).unwrap_err();
            assert!(
                matches!(err, SellsyError::MalformedResponse { .. }),
                "body {:?}: {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn test_decode_missing_status() {
        match decode_response(r#"{"response":"x"}"#).unwrap_err() {
            SellsyError::MalformedResponse { reason, .. } => {
                assert_eq!(reason, "status field missing")
            }
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_response() {
        match decode_response(r#"{"status":"success"}"#).unwrap_err() {
            SellsyError::MalformedResponse { reason, body } => {
                assert_eq!(reason, "response field missing");
                assert_eq!(body, r#"{"status":"success"}"#);
            }
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }
}
