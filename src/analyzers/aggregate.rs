use crate::analyzers::tier::MasteryTier;
use crate::analyzers::types::{BucketEntry, ClassReport, ObjectiveReport, TierBuckets};
use crate::models::{Class, StudentOutcomes};
use chrono::Utc;
use std::collections::HashMap;

/// Groups every recorded outcome by objective name and buckets the students
/// of each objective by mastery tier.
///
/// Objectives come out in the order they are first seen while scanning
/// `students`; students keep their input order inside each bucket. A student
/// with no outcome for an objective is left out of that objective entirely.
pub fn aggregate_objectives(students: &[StudentOutcomes]) -> Vec<ObjectiveReport> {
    let total_students = students.len();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, TierBuckets)> = Vec::new();

    for student in students {
        for result in &student.outcomes {
            let slot = *index.entry(result.objective.as_str()).or_insert_with(|| {
                grouped.push((result.objective.as_str(), TierBuckets::default()));
                grouped.len() - 1
            });

            let tier = MasteryTier::classify(result.top_score, result.second_score);
            grouped[slot].1.push(
                tier,
                BucketEntry {
                    name: student.name.clone(),
                    top_score: result.top_score,
                    second_score: result.second_score,
                },
            );
        }
    }

    grouped
        .into_iter()
        .map(|(objective, buckets)| {
            ObjectiveReport::from_buckets(objective.to_string(), buckets, total_students)
        })
        .collect()
}

/// Wraps [`aggregate_objectives`] with the class metadata.
pub fn class_report(class: &Class, students: &[StudentOutcomes]) -> ClassReport {
    ClassReport {
        class_id: class.id,
        class_name: class.name.clone(),
        generated_at: Utc::now(),
        total_students: students.len(),
        objectives: aggregate_objectives(students),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ObjectiveResult, Outcome};

    fn result(objective: &str, top: &str, second: &str) -> ObjectiveResult {
        ObjectiveResult {
            objective: objective.to_string(),
            top_score: Outcome::from_cell(top),
            second_score: Outcome::from_cell(second),
        }
    }

    fn student(id: i64, name: &str, outcomes: Vec<ObjectiveResult>) -> StudentOutcomes {
        StudentOutcomes {
            student_id: id,
            name: name.to_string(),
            student_number: id.to_string(),
            outcomes,
        }
    }

    fn names(entries: &[BucketEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_objectives(&[]).is_empty());
    }

    #[test]
    fn test_buckets_by_tier() {
        let students = vec![
            student(1, "Alice", vec![result("LO1", "M", "M"), result("LO2", "X", "M")]),
            student(2, "Bob", vec![result("LO1", "X", "X"), result("LO2", "M", "M")]),
            student(3, "Cara", vec![result("LO1", "M", "")]),
        ];

        let reports = aggregate_objectives(&students);
        assert_eq!(reports.len(), 2);

        let lo1 = &reports[0];
        assert_eq!(lo1.objective, "LO1");
        assert_eq!(names(&lo1.students.mastered), vec!["Alice"]);
        assert_eq!(names(&lo1.students.partial), vec!["Cara"]);
        assert_eq!(names(&lo1.students.not_mastered), vec!["Bob"]);
        assert_eq!((lo1.mastered_count, lo1.partial_count, lo1.not_mastered_count), (1, 1, 1));
        assert_eq!(lo1.total_students, 3);

        let lo2 = &reports[1];
        assert_eq!(names(&lo2.students.mastered), vec!["Bob"]);
        assert_eq!(names(&lo2.students.partial), vec!["Alice"]);
        assert!(lo2.students.not_mastered.is_empty());
        // Cara has nothing recorded for LO2, so she is absent rather than tier 0.
        assert_eq!(lo2.recorded(), 2);
        assert_eq!(lo2.total_students, 3);
    }

    #[test]
    fn test_objectives_in_first_seen_order() {
        let students = vec![
            student(1, "A", vec![result("Zeta", "M", "M")]),
            student(2, "B", vec![result("Alpha", "M", "M"), result("Zeta", "", "")]),
            student(3, "C", vec![result("Mid", "M", "M")]),
        ];
        let order: Vec<_> = aggregate_objectives(&students)
            .into_iter()
            .map(|r| r.objective)
            .collect();
        assert_eq!(order, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_bucket_keeps_input_order() {
        let students = vec![
            student(1, "Zed", vec![result("LO1", "M", "M")]),
            student(2, "Amy", vec![result("LO1", "M", "M")]),
            student(3, "Kim", vec![result("LO1", "M", "M")]),
        ];
        let reports = aggregate_objectives(&students);
        assert_eq!(names(&reports[0].students.mastered), vec!["Zed", "Amy", "Kim"]);
    }

    #[test]
    fn test_counts_never_exceed_total() {
        let students = vec![
            student(1, "A", vec![result("LO1", "M", "X")]),
            student(2, "B", vec![]),
            student(3, "C", vec![result("LO1", "", ""), result("LO2", "M", "M")]),
        ];
        for report in aggregate_objectives(&students) {
            assert_eq!(report.recorded(), report.students.len());
            assert!(report.recorded() <= report.total_students);
            assert_eq!(report.total_students, 3);
        }
    }

    #[test]
    fn test_class_report_wraps_metadata() {
        let class = Class {
            id: 9,
            name: "Algebra".into(),
            instructor_id: "u1".into(),
        };
        let students = vec![student(1, "A", vec![result("LO1", "M", "M")]), student(2, "B", vec![])];
        let report = class_report(&class, &students);
        assert_eq!(report.class_id, 9);
        assert_eq!(report.class_name, "Algebra");
        assert_eq!(report.total_students, 2);
        assert_eq!(report.objectives.len(), 1);
    }
}
