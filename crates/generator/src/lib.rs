//! Sensor stream generator daemon
//!
//! Appends synthetic readings for every zone to the stream file on a fixed
//! interval and exposes health and Prometheus metrics over HTTP.

pub mod api;
pub mod config;
