//! Score policy.
//!
//! Each matched pair earns a base award plus a bonus that shrinks by one point
//! for every resolve already spent. A session that runs out of steps ends as a
//! loss. With these coefficients the best possible loss (four pairs found on
//! the first four resolves) never outscores the worst possible win.

use crate::board::PAIR_COUNT;

pub const MATCH_BASE_POINTS: u32 = 10;
pub const MATCH_MAX_BONUS: u32 = 4;

/// Resolves allowed per pair before the session is lost.
pub const STEP_BUDGET_PER_PAIR: u32 = 4;
pub const MAX_STEPS: u32 = STEP_BUDGET_PER_PAIR * PAIR_COUNT;

/// Points for a match found after `steps_so_far` earlier resolves.
pub fn score_for_match(steps_so_far: u32) -> u32 {
    MATCH_BASE_POINTS + MATCH_MAX_BONUS.saturating_sub(steps_so_far)
}

/// Score of a game where every resolve is a match.
pub fn perfect_score() -> u32 {
    (0..PAIR_COUNT).map(score_for_match).sum()
}
