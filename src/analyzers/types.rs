//! Data types produced by aggregation and search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::tier::MasteryTier;
use crate::models::{Outcome, StudentOutcomes};

/// Lightweight projection of a student inside a tier bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub name: String,
    pub top_score: Outcome,
    pub second_score: Outcome,
}

/// Students of one objective partitioned by mastery tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBuckets {
    pub mastered: Vec<BucketEntry>,
    pub partial: Vec<BucketEntry>,
    pub not_mastered: Vec<BucketEntry>,
}

impl TierBuckets {
    pub fn push(&mut self, tier: MasteryTier, entry: BucketEntry) {
        match tier {
            MasteryTier::Mastered => self.mastered.push(entry),
            MasteryTier::Partial => self.partial.push(entry),
            MasteryTier::NotMastered => self.not_mastered.push(entry),
        }
    }

    /// Keeps only the entries matching `keep`, bucket by bucket.
    pub fn retain(&mut self, mut keep: impl FnMut(&BucketEntry) -> bool) {
        self.mastered.retain(&mut keep);
        self.partial.retain(&mut keep);
        self.not_mastered.retain(&mut keep);
    }

    pub fn len(&self) -> usize {
        self.mastered.len() + self.partial.len() + self.not_mastered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregated results for a single learning objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveReport {
    pub objective: String,
    pub students: TierBuckets,
    pub mastered_count: usize,
    pub partial_count: usize,
    pub not_mastered_count: usize,
    /// Students enrolled in the class, recorded outcome or not.
    pub total_students: usize,
}

impl ObjectiveReport {
    /// Builds a report whose counts reflect `students`.
    pub fn from_buckets(objective: String, students: TierBuckets, total_students: usize) -> Self {
        Self {
            objective,
            mastered_count: students.mastered.len(),
            partial_count: students.partial.len(),
            not_mastered_count: students.not_mastered.len(),
            students,
            total_students,
        }
    }

    /// Students with a recorded outcome on this objective.
    pub fn recorded(&self) -> usize {
        self.mastered_count + self.partial_count + self.not_mastered_count
    }
}

/// Complete results for one class, served by the results endpoint and the
/// `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub class_id: i64,
    pub class_name: String,
    pub generated_at: DateTime<Utc>,
    pub total_students: usize,
    pub objectives: Vec<ObjectiveReport>,
}

/// Which listing a search filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchView {
    #[default]
    Students,
    Objectives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "results", rename_all = "lowercase")]
pub enum SearchResult {
    Students(Vec<StudentOutcomes>),
    Objectives(Vec<ObjectiveReport>),
}
