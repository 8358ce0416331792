//! Trait for the relational storage behind the gradebook.

use anyhow::Result;

use crate::models::{Class, Grade, LearningObjective, Outcome, Student, StudentOutcomes};

/// Abstraction over the gradebook tables (`classes`, `students`,
/// `learning_objectives`, `grades`).
///
/// Lookups return zero or one row, inserts return the new identifier and
/// updates address a row by identifier. Nothing here is transactional.
#[async_trait::async_trait]
pub trait GradebookStore: Send + Sync {
    async fn create_class(&self, instructor_id: &str, name: &str) -> Result<Class>;

    async fn find_class(&self, class_id: i64) -> Result<Option<Class>>;

    /// Classes owned by the given instructor, oldest first.
    async fn list_classes(&self, instructor_id: &str) -> Result<Vec<Class>>;

    async fn find_student(&self, class_id: i64, student_number: &str) -> Result<Option<Student>>;

    async fn insert_student(
        &self,
        class_id: i64,
        student_number: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<i64>;

    async fn set_student_email(&self, student_id: i64, email: &str) -> Result<()>;

    /// Whether the class roster lists a student with this sign-in email.
    async fn is_enrolled(&self, class_id: i64, email: &str) -> Result<bool>;

    async fn find_objective(&self, class_id: i64, name: &str) -> Result<Option<LearningObjective>>;

    async fn insert_objective(&self, class_id: i64, name: &str) -> Result<i64>;

    async fn list_objectives(&self, class_id: i64) -> Result<Vec<LearningObjective>>;

    async fn find_grade(&self, student_id: i64, objective_id: i64) -> Result<Option<Grade>>;

    async fn insert_grade(
        &self,
        student_id: i64,
        objective_id: i64,
        top: Outcome,
        second: Outcome,
    ) -> Result<i64>;

    async fn update_grade(&self, grade_id: i64, top: Outcome, second: Outcome) -> Result<()>;

    /// Every student of the class, in insertion order, each with the
    /// outcomes recorded for them resolved to objective names.
    async fn class_outcomes(&self, class_id: i64) -> Result<Vec<StudentOutcomes>>;
}
