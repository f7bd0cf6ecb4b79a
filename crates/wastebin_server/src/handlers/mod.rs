//! HTTP request handlers.

/// Paste endpoints and the edit form.
pub mod paste;
