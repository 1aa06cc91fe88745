//! Integration tests for Site-Harvest
//!
//! `crawl_tests` drives the static backend against wiremock servers;
//! `expansion_tests` uses the scripted backend for browser-only behaviour.

mod crawl_tests;
mod expansion_tests;
