//! Service inventory core
//!
//! Poll cycle: run the backend listing command, parse the raw block text into
//! service records, attach aggregate counts and host gauges, publish the
//! resulting snapshot to every subscriber. Control operations go through the
//! controller, which serializes commands per service name.

pub mod broadcaster;
pub mod controller;
pub mod inventory;
pub mod parser;
pub mod poller;
