//! Shared test helpers for `deskpulse-core` integration tests.
//!
//! Reusable fixtures and lightweight mocks so the integration tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod repositories;
