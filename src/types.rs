use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::{Result, Timestamp};

/// Request body. Keys keep their insertion order, which the signature depends on.
pub type Payload = Map<String, Value>;

/// Code the API uses for "everything went fine".
pub const SUCCESS_CODE: &str = "0";

/// Pagination body shared by the `*/page` endpoints.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub size: u32,
    pub current: u32,
}

impl Page {
    #[must_use]
    pub const fn new(size: u32, current: u32) -> Self {
        Self { size, current }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(20, 1)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub account_name: &'a str,
    pub account_password: String,
    pub device_info: &'a str,
}

/// Serializes any body type into a [`Payload`].
pub fn to_payload<T: Serialize>(body: &T) -> Result<Payload> {
    match serde_json::to_value(body)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Payload::new()),
        other => Err(Error::validation(format!(
            "payload must serialize to a JSON object, got {other}"
        ))),
    }
}

/// Values pinned for a single request instead of generated fresh.
#[derive(Clone, Debug, Default)]
pub struct HeaderOverrides {
    pub nonce: Option<String>,
    pub timestamp: Option<Timestamp>,
}

impl HeaderOverrides {
    #[must_use]
    pub fn with_nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// How the API judged a request.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Success,
    /// `code` missing from the body.
    Malformed,
    /// `code` other than `"0"`, or a non-200 status.
    Failed,
}

/// Parsed API response, returned whatever its [`Outcome`].
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    path: String,
    status: StatusCode,
    body: Value,
}

impl Response {
    pub(crate) fn new(path: String, status: StatusCode, body: Value) -> Self {
        Self { path, status, body }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }

    /// The `code` field, when it is a string.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self.body.get("code") {
            None => Outcome::Malformed,
            Some(code) if code.as_str() == Some(SUCCESS_CODE) && self.status == StatusCode::OK => {
                Outcome::Success
            }
            Some(_) => Outcome::Failed,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome() == Outcome::Success
    }

    /// Turns a malformed or failed response into an [`Error`], passing the body through otherwise.
    pub fn error_for_outcome(self) -> Result<Value> {
        match self.outcome() {
            Outcome::Success => Ok(self.body),
            Outcome::Malformed => Err(Error::malformed(
                self.path,
                self.status,
                "response has no `code` field",
            )),
            Outcome::Failed => {
                let code = self.body.get("code").map(|code| match code {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                Err(Error::failed(self.path, self.status, code, self.body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{Failed, Kind};

    fn response(status: StatusCode, body: Value) -> Response {
        Response::new("app/dict/list".to_owned(), status, body)
    }

    #[test]
    fn zero_code_with_ok_status_is_success() {
        let r = response(StatusCode::OK, json!({ "code": "0", "data": { "a": 1 } }));

        assert_eq!(r.outcome(), Outcome::Success);
        assert_eq!(r.data(), Some(&json!({ "a": 1 })));
        assert_eq!(r.error_for_outcome().expect("success")["data"]["a"], 1);
    }

    #[test]
    fn zero_code_with_bad_status_fails() {
        let r = response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "code": "0" }));

        assert_eq!(r.outcome(), Outcome::Failed);
    }

    #[test]
    fn numeric_zero_code_is_not_success() {
        let r = response(StatusCode::OK, json!({ "code": 0 }));

        assert_eq!(r.outcome(), Outcome::Failed);
        assert_eq!(r.code(), None);
        let err = r.error_for_outcome().expect_err("numeric code");
        let failed = err.downcast_ref::<Failed>().expect("failed source");
        assert_eq!(failed.code.as_deref(), Some("0"));
    }

    #[test]
    fn missing_code_is_malformed() {
        let r = response(StatusCode::OK, json!({}));

        assert_eq!(r.outcome(), Outcome::Malformed);
        assert_eq!(r.body(), &json!({}));
        let err = r.error_for_outcome().expect_err("no code");
        assert_eq!(err.kind(), Kind::Malformed);
    }

    #[test]
    fn page_serializes_size_before_current() {
        let payload = to_payload(&Page::default()).expect("page payload");

        assert_eq!(
            serde_json::to_string(&payload).expect("serialize"),
            r#"{"size":20,"current":1}"#
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = to_payload(&[1, 2, 3]).expect_err("array payload");

        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn outcome_displays_lowercase() {
        assert_eq!(Outcome::Malformed.to_string(), "malformed");
    }
}
