//! Assertion macros for rowdesk harnesses.
//!
//! These wrap `pretty_assertions` and say which rows went missing or
//! appeared, rather than dumping two whole tables.

// ---------------------------------------------------------------------------
// Row set assertions
// ---------------------------------------------------------------------------

/// Assert that a result holds exactly the rows whose `column` has the given
/// values, in that order.
///
/// ```rust
/// assert_column!(found, "id", [1, 3]);
/// ```
#[macro_export]
macro_rules! assert_column {
    ($rows:expr, $column:expr, [$($value:expr),* $(,)?]) => {{
        let rows: &[rowdesk_core::Row] = &$rows;
        let column: &str = $column;
        let actual: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(serde_json::Value::Null))
            .collect();
        let expected: Vec<serde_json::Value> = vec![$(serde_json::json!($value)),*];
        pretty_assertions::assert_eq!(actual, expected, "values of column {:?}", column);
    }};
}

/// Assert that `$sub` is an order-preserving subsequence of `$rows`.
#[macro_export]
macro_rules! assert_subsequence {
    ($sub:expr, $rows:expr) => {{
        let sub: &[rowdesk_core::Row] = &$sub;
        let rows: &[rowdesk_core::Row] = &$rows;
        let mut remaining = rows.iter();
        for (i, wanted) in sub.iter().enumerate() {
            if !remaining.any(|row| row == wanted) {
                panic!(
                    "assert_subsequence! failed: result row {} is out of order or not in the input:\n  {:?}",
                    i, wanted
                );
            }
        }
    }};
}

/// Assert that an HTTP response has the expected status, printing the body
/// when it does not.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {{
        let (status, body): (axum::http::StatusCode, String) = $response;
        assert_eq!(status, $status, "unexpected status; body: {}", body);
        body
    }};
}
