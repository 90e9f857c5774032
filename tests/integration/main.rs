//! Integration tests for the crawler
//!
//! `scenarios` drives the orchestrator with in-test page sources and
//! extractors against both persistence backends; `end_to_end` runs whole
//! crawls against wiremock sites.

mod end_to_end;
mod scenarios;
