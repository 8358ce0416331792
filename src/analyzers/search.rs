//! Free-text filtering over a class's students and objective reports.

use crate::analyzers::aggregate::aggregate_objectives;
use crate::analyzers::types::{ObjectiveReport, SearchResult, SearchView};
use crate::models::StudentOutcomes;

/// Case-insensitive substring matcher. The query is taken literally,
/// whitespace included. An empty query matches everything.
struct Needle(String);

impl Needle {
    fn new(query: &str) -> Self {
        Self(query.to_lowercase())
    }

    fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }
}

pub fn search(students: &[StudentOutcomes], query: &str, view: SearchView) -> SearchResult {
    match view {
        SearchView::Students => SearchResult::Students(search_students(students, query)),
        SearchView::Objectives => SearchResult::Objectives(search_objectives(students, query)),
    }
}

/// Students whose name contains `query`.
pub fn search_students(students: &[StudentOutcomes], query: &str) -> Vec<StudentOutcomes> {
    let needle = Needle::new(query);
    students
        .iter()
        .filter(|s| needle.matches(&s.name))
        .cloned()
        .collect()
}

/// Objective reports filtered by `query`.
///
/// An objective whose name matches comes back untouched. Otherwise its
/// buckets are narrowed to matching student names and the counts
/// recomputed; objectives left with nobody are dropped.
pub fn search_objectives(students: &[StudentOutcomes], query: &str) -> Vec<ObjectiveReport> {
    let needle = Needle::new(query);

    aggregate_objectives(students)
        .into_iter()
        .filter_map(|report| {
            if needle.matches(&report.objective) {
                return Some(report);
            }

            let mut buckets = report.students;
            buckets.retain(|entry| needle.matches(&entry.name));
            if buckets.is_empty() {
                None
            } else {
                Some(ObjectiveReport::from_buckets(
                    report.objective,
                    buckets,
                    report.total_students,
                ))
            }
        })
        .collect()
}
