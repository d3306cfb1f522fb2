//! Test support for topiclens integration suites
//!
//! Provides an in-process scripted broker and shared helpers; the actual
//! suites live under `tests/`.

pub mod broker;
pub mod helpers;
