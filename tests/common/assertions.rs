//! Assertion macros for API responses
//!
//! Every error body has the shape `{"error": "...", "status": <code>}`; these
//! macros check status and shape together so failures print the whole body.

/// Assert the status of a `(StatusCode, Value)` pair and return the body
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {{
        let (status, body) = $response;
        assert_eq!(status, $status, "unexpected status, body: {}", body);
        body
    }};
}

/// Assert an error response: status plus the `{"error", "status"}` envelope
#[macro_export]
macro_rules! assert_api_error {
    ($response:expr, $status:expr) => {{
        let body = $crate::assert_status!($response, $status);
        assert_eq!(body["status"], $status.as_u16(), "body: {}", body);
        assert!(body["error"].is_string(), "missing error message: {}", body);
        body
    }};
    ($response:expr, $status:expr, $message:expr) => {{
        let body = $crate::assert_api_error!($response, $status);
        assert_eq!(body["error"], $message);
        body
    }};
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
