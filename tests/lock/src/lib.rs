//! Shared scenarios for the lock tests and the `search_fixture` binary.
//!
//! Both sides build their runs from [`scenarios::fixture_runs`], so the
//! cross-process tests compare exactly what the in-process tests check.
