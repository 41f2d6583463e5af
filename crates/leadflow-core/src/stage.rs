//! The seven fixed stages of the outreach sequence.
//!
//! A lead traverses the stages strictly in order; each stage is bound to one
//! email template. The numeric "step" shown in the UI is always derived from
//! the stage ordinal — it is never stored separately, so stage and step can
//! never disagree.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{LeadflowError, Result};

/// One of the seven points in the outreach sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CalledOnce,
    CalledTwice,
    CalledThreeTimes,
    CalledFourTimes,
    CalledFiveTimes,
    CalledSixTimes,
    CalledSevenTimes,
}

impl Stage {
    /// All stages in sequence order.
    pub const ALL: [Stage; 7] = [
        Stage::CalledOnce,
        Stage::CalledTwice,
        Stage::CalledThreeTimes,
        Stage::CalledFourTimes,
        Stage::CalledFiveTimes,
        Stage::CalledSixTimes,
        Stage::CalledSevenTimes,
    ];

    /// Entry point of every sequence.
    pub fn first() -> Stage {
        Stage::CalledOnce
    }

    /// Stable string key, as stored and exposed over the API.
    pub fn key(&self) -> &'static str {
        match self {
            Stage::CalledOnce => "called_once",
            Stage::CalledTwice => "called_twice",
            Stage::CalledThreeTimes => "called_three_times",
            Stage::CalledFourTimes => "called_four_times",
            Stage::CalledFiveTimes => "called_five_times",
            Stage::CalledSixTimes => "called_six_times",
            Stage::CalledSevenTimes => "called_seven_times",
        }
    }

    /// Parse a stage key. The only structurally invalid input the template
    /// and scheduling layers ever reject.
    pub fn from_key(key: &str) -> Result<Stage> {
        Stage::ALL
            .into_iter()
            .find(|s| s.key() == key)
            .ok_or_else(|| LeadflowError::InvalidStage(key.to_string()))
    }

    /// 1-based position in the sequence.
    pub fn ordinal(&self) -> u8 {
        match self {
            Stage::CalledOnce => 1,
            Stage::CalledTwice => 2,
            Stage::CalledThreeTimes => 3,
            Stage::CalledFourTimes => 4,
            Stage::CalledFiveTimes => 5,
            Stage::CalledSixTimes => 6,
            Stage::CalledSevenTimes => 7,
        }
    }

    /// The following stage, or `None` after the seventh.
    pub fn next(&self) -> Option<Stage> {
        let idx = self.ordinal() as usize; // ordinal is 1-based, so this is already +1
        Stage::ALL.get(idx).copied()
    }

    /// Whether this is the terminal stage of the sequence.
    pub fn is_last(&self) -> bool {
        matches!(self, Stage::CalledSevenTimes)
    }

    /// Builtin delay before this stage's email goes out, used when the user
    /// has no timing override: the first touch is immediate, follow-ups wait
    /// a week.
    pub fn default_delay(&self) -> Duration {
        match self {
            Stage::CalledOnce => Duration::zero(),
            _ => Duration::days(7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_key(stage.key()).unwrap(), stage);
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Stage::from_key("called_eight_times").unwrap_err();
        assert!(matches!(err, LeadflowError::InvalidStage(_)));
    }

    #[test]
    fn test_ordinals_are_sequential() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal() as usize, i + 1);
        }
    }

    #[test]
    fn test_next_walks_the_sequence() {
        let mut stage = Stage::first();
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen, Stage::ALL.to_vec());
        assert!(stage.is_last());
        assert_eq!(stage.next(), None);
    }

    #[test]
    fn test_default_delays() {
        assert_eq!(Stage::CalledOnce.default_delay(), Duration::zero());
        for stage in &Stage::ALL[1..] {
            assert_eq!(stage.default_delay(), Duration::days(7));
        }
    }

    #[test]
    fn test_serde_uses_stage_keys() {
        let json = serde_json::to_string(&Stage::CalledThreeTimes).unwrap();
        assert_eq!(json, "\"called_three_times\"");
        let back: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Stage::CalledThreeTimes);
    }
}
