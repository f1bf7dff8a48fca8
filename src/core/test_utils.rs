//! Test utilities for arena-based testing.
//!
//! Provides arena-backed session contexts and a small simulated heap that
//! implements the memory-read capabilities.
