//! Outbound request descriptor.

use reqwest::Method;
use serde::Serialize;

use crate::error::Result;

/// A replayable outbound request.
///
/// Carries everything needed to reissue the call after a credential
/// renewal: method, path, and the serialized body. The `retried` flag
/// records that this request has already been replayed once, which caps
/// every request at a single replay.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    /// Create a request for an arbitrary method.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Whether this request has already been replayed once.
    pub fn retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_method() {
        assert_eq!(ApiRequest::get("widgets").method(), &Method::GET);
        assert_eq!(ApiRequest::post("widgets").method(), &Method::POST);
        assert_eq!(ApiRequest::delete("widgets/1").method(), &Method::DELETE);
    }

    #[test]
    fn test_json_body_serializes() {
        #[derive(Serialize)]
        struct Payload {
            name: &'static str,
        }

        let request = ApiRequest::post("widgets")
            .json(&Payload { name: "winch" })
            .unwrap();
        assert_eq!(
            request.body().unwrap(),
            &serde_json::json!({ "name": "winch" })
        );
    }

    #[test]
    fn test_new_requests_start_unretried() {
        let mut request = ApiRequest::get("widgets");
        assert!(!request.retried());
        request.mark_retried();
        assert!(request.retried());
    }
}
