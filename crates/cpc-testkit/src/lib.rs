//! Conformance scenarios exercising the capability protocol end-to-end.
//!
//! This crate has no library surface of its own; everything lives under
//! `tests/` as integration tests, one file per scenario, each built on top
//! of the full `cpc` facade (or a lower layer directly, when a scenario is
//! about that layer specifically).
