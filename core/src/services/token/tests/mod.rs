//! Tests for the token and session services

#[cfg(test)]
mod service_tests;
#[cfg(test)]
mod cleanup_tests;
