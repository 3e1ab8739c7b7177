//! Threshold crossing detection
//!
//! A threshold is crossed when the metric moves from below it to at or above
//! it. Each threshold is checked on its own, so one large jump can cross
//! several at once. Calling again with the same pair of values yields the
//! same answer; callers own the previous value.

/// Budget spend thresholds, in percent
pub const BUDGET_THRESHOLDS: [u8; 3] = [50, 75, 90];

/// Goal progress milestones, in percent
pub const GOAL_MILESTONES: [u8; 4] = [25, 50, 75, 90];

/// Days-before-deadline at which a reminder goes out
pub const DEADLINE_REMINDER_DAYS: [i64; 3] = [30, 7, 1];

/// Full budget or goal
pub const COMPLETE_PERCENT: f64 = 100.0;

/// Whether `threshold` was crossed going from `previous` to `current`
pub fn crossed(previous: f64, current: f64, threshold: f64) -> bool {
    current >= threshold && previous < threshold
}

/// Thresholds from `thresholds` crossed between `previous` and `current`, ascending
pub fn crossed_thresholds(previous: f64, current: f64, thresholds: &[u8]) -> Vec<u8> {
    let mut hit: Vec<u8> = thresholds
        .iter()
        .copied()
        .filter(|t| crossed(previous, current, f64::from(*t)))
        .collect();
    hit.sort_unstable();
    hit
}

/// Whether the metric went strictly past 100% on this update
pub fn exceeded(previous: f64, current: f64) -> bool {
    current > COMPLETE_PERCENT && previous <= COMPLETE_PERCENT
}

/// Whether the metric reached 100% on this update
pub fn completed(previous: f64, current: f64) -> bool {
    crossed(previous, current, COMPLETE_PERCENT)
}

/// Whether a deadline reminder is due `days_left` days out at `progress` percent
pub fn deadline_reminder_due(days_left: i64, progress: f64) -> bool {
    progress < COMPLETE_PERCENT && DEADLINE_REMINDER_DAYS.contains(&days_left)
}
