//! Input subsystem for relative-motion event intake
//!
//! Implements the event source side of the pipeline:
//!
//! 1. [`event_collector`] - Raw event types and the trace replay collector
//!
//! # Architecture
//!
//! ```text
//! Trace File ──► ReplayCollector ──► RawInputEvent ──► GestureEngineManager
//!                (paced by at_ms)     (mpsc channel)
//! ```
//!
//! The production event source is a sensor driver outside this repository;
//! the replay collector exists so the pipeline can be driven end to end from
//! recorded motion traces.

pub mod event_collector;
