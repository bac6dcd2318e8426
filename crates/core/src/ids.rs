//! Request and session identifiers.
//!
//! Request ids must be UUIDv4 per the approval-request wire contract;
//! session ids are opaque strings supplied by the device or generated
//! the same way when absent.

use uuid::Uuid;

/// A fresh UUIDv4, suitable for both a new approval `requestId` and a
/// generated `session_id`.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
