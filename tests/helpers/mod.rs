//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod tree_assertions;
pub mod type_fixtures;
