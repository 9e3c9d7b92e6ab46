use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ApiError;

/// Call arguments: each key may carry several values, matching Flickr's
/// query-string conventions.
pub type Args = BTreeMap<String, Vec<String>>;

/// Minimal authenticated call capability used by the fetcher.
/// The concrete implementation lives in `crate::auth::session`.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Invoke a REST method and return the decoded body of a successful
    /// (`stat == "ok"`) response.
    async fn call(&self, method: &str, args: &Args) -> Result<Value, ApiError>;
}

/// Build an `Args` map from single-valued pairs.
pub fn args<const N: usize>(pairs: [(&str, String); N]) -> Args {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), vec![v]))
        .collect()
}

/// Check the `stat` envelope every Flickr response carries.
pub fn decode_response(method: &str, body: Value) -> Result<Value, ApiError> {
    match body["stat"].as_str() {
        Some("ok") => Ok(body),
        Some(_) => Err(ApiError::Remote {
            method: method.to_string(),
            code: body["code"].as_i64().unwrap_or(-1),
            message: body["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string(),
        }),
        None => Err(ApiError::Decode {
            method: method.to_string(),
            reason: "missing 'stat' field".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_ok_passes_body_through() {
        let body = json!({"stat": "ok", "user": {"id": "1"}});
        let out = decode_response("flickr.test.login", body.clone()).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn test_decode_fail_surfaces_code_and_message() {
        let body = json!({"stat": "fail", "code": 98, "message": "Invalid auth token"});
        match decode_response("flickr.test.login", body) {
            Err(ApiError::Remote { code, message, method }) => {
                assert_eq!(code, 98);
                assert_eq!(message, "Invalid auth token");
                assert_eq!(method, "flickr.test.login");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_without_stat_is_decode_error() {
        let err = decode_response("m", json!({"photos": {}})).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_args_builder() {
        let a = args([("photoset_id", "42".to_string()), ("page", "1".to_string())]);
        assert_eq!(a["photoset_id"], vec!["42".to_string()]);
        assert_eq!(a.len(), 2);
    }
}
