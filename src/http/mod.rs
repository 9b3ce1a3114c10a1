//! HTTP transport layer
//!
//! Carries the websocket push channel and the snapshot/metadata endpoints.
//! Transport mechanics only; all monitoring logic lives in `crate::monitor`.

pub mod handlers;
