//! Workspace root crate. Carries no runtime code of its own — the two
//! service binaries live under `services/` and the shared logic lives in
//! the `sc-*` crates under `crates/` — but owns the cross-crate
//! integration suites under `tests/integration/`.
