//! Wayfinder Harness: worlds, run configuration, and auditable run reports.
//!
//! The harness wires a world (a domain implementing the search contract
//! traits plus a heuristic) into one of the search engines according to a
//! [`policy::RunConfigV1`], and packages the outcome as a digest-stamped
//! [`report::RunReportV1`].
//!
//! Worlds provide domain data only; the harness owns orchestration.

#![forbid(unsafe_code)]

pub mod contract;
pub mod policy;
pub mod report;
pub mod runner;
pub mod worlds;
