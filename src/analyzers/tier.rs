use serde::Serialize;

use crate::models::Outcome;

/// Counts how many of the two attempt slots were mastered.
///
/// | top | second | slots |
/// |-----|--------|-------|
/// | M   | M      | 2     |
/// | M   | other  | 1     |
/// | other | M    | 1     |
/// | other | other | 0    |
///
/// "other" covers both a recorded miss and an unset slot.
pub fn mastered_slots(top: Outcome, second: Outcome) -> u8 {
    u8::from(top.is_mastered()) + u8::from(second.is_mastered())
}

/// Reporting bucket for a student/objective pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryTier {
    /// Neither attempt mastered.
    NotMastered,
    /// Exactly one attempt mastered.
    Partial,
    /// Both attempts mastered.
    Mastered,
}

impl MasteryTier {
    pub fn classify(top: Outcome, second: Outcome) -> Self {
        match mastered_slots(top, second) {
            2 => MasteryTier::Mastered,
            1 => MasteryTier::Partial,
            _ => MasteryTier::NotMastered,
        }
    }

    pub fn slots(self) -> u8 {
        match self {
            MasteryTier::Mastered => 2,
            MasteryTier::Partial => 1,
            MasteryTier::NotMastered => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::*;

    #[test]
    fn test_mastered_slots_table() {
        assert_eq!(mastered_slots(Mastered, Mastered), 2);
        assert_eq!(mastered_slots(Mastered, NotMastered), 1);
        assert_eq!(mastered_slots(Mastered, Unset), 1);
        assert_eq!(mastered_slots(NotMastered, Mastered), 1);
        assert_eq!(mastered_slots(Unset, Mastered), 1);
        assert_eq!(mastered_slots(NotMastered, NotMastered), 0);
        assert_eq!(mastered_slots(Unset, NotMastered), 0);
        assert_eq!(mastered_slots(Unset, Unset), 0);
    }

    #[test]
    fn test_classify_matches_slot_count() {
        let all = [Mastered, NotMastered, Unset];
        for top in all {
            for second in all {
                let tier = MasteryTier::classify(top, second);
                assert_eq!(tier.slots(), mastered_slots(top, second));
            }
        }
    }
}
