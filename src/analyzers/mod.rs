//! Mastery aggregation and search.
//!
//! This module takes the per-student outcome lists fetched for a class,
//! classifies each student/objective pair into a mastery tier, groups the
//! results by objective and filters them for search.

pub mod aggregate;
pub mod search;
pub mod tier;
pub mod types;
