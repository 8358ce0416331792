//! Gradebook records as they are stored and exchanged with the backend.

use serde::{Deserialize, Serialize};

/// Cell value marking an attempt as mastered.
pub const MASTERY_SENTINEL: &str = "M";

/// Result of a single attempt slot on a learning objective.
///
/// The wire form is `"M"`, `"NM"` or `""` for storage columns and JSON
/// responses alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "M")]
    Mastered,
    #[serde(rename = "NM")]
    NotMastered,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl Outcome {
    /// Interprets an uploaded cell or stored column value.
    ///
    /// Only the sentinel counts as mastery; blank means the slot was never
    /// filled in; anything else is a recorded miss.
    pub fn from_cell(value: &str) -> Self {
        match value.trim() {
            MASTERY_SENTINEL => Outcome::Mastered,
            "" => Outcome::Unset,
            _ => Outcome::NotMastered,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Mastered => MASTERY_SENTINEL,
            Outcome::NotMastered => "NM",
            Outcome::Unset => "",
        }
    }

    pub fn is_mastered(self) -> bool {
        self == Outcome::Mastered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    /// Auth user id of the instructor who created the class.
    pub instructor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    /// Enrollment number, unique within the class.
    pub student_number: String,
    /// Sign-in email, lowercased. Grants a student-role account read access
    /// to the class.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
}

/// One student's two attempt outcomes on one objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub student_id: i64,
    pub learning_objective_id: i64,
    pub top_score: Outcome,
    pub second_score: Outcome,
}

/// A recorded outcome pair with the objective resolved to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveResult {
    pub objective: String,
    pub top_score: Outcome,
    pub second_score: Outcome,
}

/// A student of a class together with every outcome recorded for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentOutcomes {
    pub student_id: i64,
    pub name: String,
    pub student_number: String,
    pub outcomes: Vec<ObjectiveResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_cell() {
        assert_eq!(Outcome::from_cell("M"), Outcome::Mastered);
        assert_eq!(Outcome::from_cell(" M "), Outcome::Mastered);
        assert_eq!(Outcome::from_cell("X"), Outcome::NotMastered);
        assert_eq!(Outcome::from_cell("m"), Outcome::NotMastered);
        assert_eq!(Outcome::from_cell("NM"), Outcome::NotMastered);
        assert_eq!(Outcome::from_cell(""), Outcome::Unset);
        assert_eq!(Outcome::from_cell("   "), Outcome::Unset);
    }

    #[test]
    fn test_outcome_wire_form() {
        assert_eq!(serde_json::to_string(&Outcome::Mastered).unwrap(), "\"M\"");
        assert_eq!(serde_json::to_string(&Outcome::Unset).unwrap(), "\"\"");
        let parsed: Outcome = serde_json::from_str("\"NM\"").unwrap();
        assert_eq!(parsed, Outcome::NotMastered);
        for outcome in [Outcome::Mastered, Outcome::NotMastered, Outcome::Unset] {
            assert_eq!(Outcome::from_cell(outcome.as_str()), outcome);
        }
    }
}
