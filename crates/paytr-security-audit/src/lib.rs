//! Test-only crate. The invariants live in `tests/security_invariants.rs`.
