use crate::types::QuestionType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scoring profile selected at startup. Two variants exist with different
/// base-point scales and speed thresholds; the math is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    LowScale,
    HighScale,
}

/// All point tables and thresholds as injected configuration, so both
/// scoring profiles share one code path.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub base_points: HashMap<QuestionType, u32>,
    /// Latency strictly below this gets the fast multiplier.
    pub fast_threshold_seconds: f64,
    /// Latency strictly below this (but not fast) gets the medium multiplier.
    pub medium_threshold_seconds: f64,
    pub fast_multiplier: f64,
    pub medium_multiplier: f64,
    /// (inclusive streak floor, bonus), highest floor first; only the first
    /// matching tier applies.
    pub streak_tiers: Vec<(u32, u32)>,
    /// Bonus by buzz rank, index 0 = rank 1. Ranks past the end get 0.
    pub rank_bonuses: Vec<u32>,
}

impl ScoringConfig {
    pub fn for_profile(profile: ScoringProfile) -> Self {
        match profile {
            ScoringProfile::LowScale => Self::low_scale(),
            ScoringProfile::HighScale => Self::high_scale(),
        }
    }

    /// Casual profile: 10-25 point base table, 5s/10s speed thresholds.
    pub fn low_scale() -> Self {
        Self {
            base_points: HashMap::from([
                (QuestionType::GuessSurah, 10),
                (QuestionType::GuessMeaning, 15),
                (QuestionType::GuessNextAyat, 20),
                (QuestionType::GuessPreviousAyat, 25),
                (QuestionType::GuessReciter, 15),
            ]),
            fast_threshold_seconds: 5.0,
            medium_threshold_seconds: 10.0,
            fast_multiplier: 1.5,
            medium_multiplier: 1.2,
            streak_tiers: vec![(10, 250), (5, 100), (3, 50)],
            rank_bonuses: vec![25, 10],
        }
    }

    /// Stage profile: 100-250 point base table, 7s/14s speed thresholds.
    pub fn high_scale() -> Self {
        Self {
            base_points: HashMap::from([
                (QuestionType::GuessSurah, 100),
                (QuestionType::GuessMeaning, 150),
                (QuestionType::GuessNextAyat, 200),
                (QuestionType::GuessPreviousAyat, 250),
                (QuestionType::GuessReciter, 150),
            ]),
            fast_threshold_seconds: 7.0,
            medium_threshold_seconds: 14.0,
            fast_multiplier: 1.5,
            medium_multiplier: 1.2,
            streak_tiers: vec![(10, 250), (5, 100), (3, 50)],
            rank_bonuses: vec![25, 10],
        }
    }

    pub fn base_points(&self, question_type: QuestionType) -> u32 {
        self.base_points.get(&question_type).copied().unwrap_or(0)
    }

    fn speed_multiplier(&self, latency_seconds: Option<f64>) -> f64 {
        match latency_seconds {
            Some(s) if s < self.fast_threshold_seconds => self.fast_multiplier,
            Some(s) if s < self.medium_threshold_seconds => self.medium_multiplier,
            _ => 1.0,
        }
    }

    fn streak_bonus(&self, streak: u32) -> u32 {
        self.streak_tiers
            .iter()
            .find(|(floor, _)| streak >= *floor)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }

    fn rank_bonus(&self, buzz_rank: Option<u32>) -> u32 {
        match buzz_rank {
            Some(rank) if rank >= 1 => {
                self.rank_bonuses.get(rank as usize - 1).copied().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Every component of a point award, independently inspectable for the
/// answer-validated broadcast and for tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_points: u32,
    pub speed_multiplier: f64,
    pub speed_bonus: u32,
    pub streak_bonus: u32,
    pub rank_bonus: u32,
    pub admin_bonus: u32,
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn zero() -> Self {
        Self {
            base_points: 0,
            speed_multiplier: 1.0,
            speed_bonus: 0,
            streak_bonus: 0,
            rank_bonus: 0,
            admin_bonus: 0,
            total: 0,
        }
    }
}

/// Compute the point award for an answer.
///
/// `streak_before` counts consecutive correct answers prior to this one; the
/// answer being scored counts toward the streak tiers. Latency and rank are
/// optional because an admin may validate a participant who never buzzed.
/// An incorrect answer always scores zero; the caller resets the streak.
pub fn score(
    config: &ScoringConfig,
    question_type: QuestionType,
    latency_seconds: Option<f64>,
    buzz_rank: Option<u32>,
    streak_before: u32,
    is_correct: bool,
    admin_bonus: u32,
) -> ScoreBreakdown {
    if !is_correct {
        return ScoreBreakdown::zero();
    }

    let base_points = config.base_points(question_type);
    let speed_multiplier = config.speed_multiplier(latency_seconds);
    let points_after_speed = (base_points as f64 * speed_multiplier).round() as u32;
    let speed_bonus = points_after_speed - base_points;
    let streak_bonus = config.streak_bonus(streak_before + 1);
    let rank_bonus = config.rank_bonus(buzz_rank);

    ScoreBreakdown {
        base_points,
        speed_multiplier,
        speed_bonus,
        streak_bonus,
        rank_bonus,
        admin_bonus,
        total: points_after_speed + streak_bonus + rank_bonus + admin_bonus,
    }
}
