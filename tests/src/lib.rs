//! # Agora Test Suite
//!
//! Cross-crate flows exercising the reconciliation services against the
//! fake ledger and both store adapters, plus HTTP-level flows through the
//! gateway router.

pub mod integration;
