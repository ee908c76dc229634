//! Scoring, chains and level progression

use std::time::Duration;

/// Points per removed cell before the chain multiplier
pub const POINTS_PER_CELL: u64 = 100;
/// Extra points per cell for every earlier wave in the same chain
pub const CHAIN_BONUS_PER_CELL: u64 = 50;
/// Groups cleared per level
pub const CLEARS_PER_LEVEL: u32 = 5;
/// Fall interval base while soft drop is held
pub const SOFT_DROP_INTERVAL: Duration = Duration::from_millis(25);

/// Result of scoring one removal wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveScore {
    pub points: u64,
    /// Chain length including this wave
    pub chain: u32,
    pub leveled_up: bool,
}

/// Session counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Current level, starts at 1 and never drops
    pub level: u32,
    /// Total groups cleared
    pub clears: u32,
    /// Waves fired during the current lock-in
    pub chain: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            level: 1,
            clears: 0,
            chain: 0,
        }
    }

    /// Points for groups of the given sizes removed after `chain` earlier waves.
    /// The chain multiplier is 1.0, 1.5, 2.0, ..., so this stays in integers.
    pub fn wave_points(group_sizes: &[usize], chain: u32) -> u64 {
        let per_cell = POINTS_PER_CELL + CHAIN_BONUS_PER_CELL * chain as u64;
        group_sizes.iter().map(|&size| size as u64 * per_cell).sum()
    }

    /// Start of a lock-in: the chain starts over
    pub fn begin_lock(&mut self) {
        self.chain = 0;
    }

    /// Score one wave of removed groups and advance the chain
    pub fn add_wave(&mut self, group_sizes: &[usize]) -> WaveScore {
        let points = Self::wave_points(group_sizes, self.chain);
        self.points += points;
        self.chain += 1;

        let mut leveled_up = false;
        if !group_sizes.is_empty() {
            self.clears += group_sizes.len() as u32;
            if self.clears / CLEARS_PER_LEVEL >= self.level {
                self.level += 1;
                leveled_up = true;
            }
        }

        WaveScore {
            points,
            chain: self.chain,
            leveled_up,
        }
    }

    /// Time between automatic one-row falls at the current level
    pub fn fall_interval(&self, base: Duration, soft: bool) -> Duration {
        let base = if soft { SOFT_DROP_INTERVAL } else { base };
        base.div_f64(0.5 + 0.25 * self.level as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_multiplier(chain: u32) -> f64 {
        1.0 + 0.5 * chain as f64
    }

    #[test]
    fn test_wave_points_match_multiplier() {
        for chain in 0..6 {
            let sizes = [4, 5, 7];
            let expected: f64 = sizes
                .iter()
                .map(|&s| s as f64 * 100.0 * chain_multiplier(chain))
                .sum();
            assert_eq!(Score::wave_points(&sizes, chain), expected as u64);
        }
    }

    #[test]
    fn test_single_wave() {
        let mut score = Score::new();
        score.begin_lock();
        let wave = score.add_wave(&[4]);
        assert_eq!(wave.points, 400);
        assert_eq!(wave.chain, 1);
        assert_eq!(score.points, 400);
        assert_eq!(score.clears, 1);
    }

    #[test]
    fn test_second_wave_uses_chain_bonus() {
        let mut score = Score::new();
        score.begin_lock();
        score.add_wave(&[4]);
        let wave = score.add_wave(&[4]);
        assert_eq!(wave.points, 600);
        assert_eq!(score.points, 1000);
        assert_eq!(score.chain, 2);

        score.begin_lock();
        assert_eq!(score.chain, 0);
        assert_eq!(score.add_wave(&[4]).points, 400);
    }

    #[test]
    fn test_level_up_every_five_clears() {
        let mut score = Score::new();
        for _ in 0..4 {
            score.begin_lock();
            assert!(!score.add_wave(&[4]).leveled_up);
        }
        assert_eq!(score.level, 1);
        score.begin_lock();
        assert!(score.add_wave(&[4]).leveled_up);
        assert_eq!(score.level, 2);
    }

    #[test]
    fn test_at_most_one_level_per_wave() {
        let mut score = Score::new();
        score.begin_lock();
        score.add_wave(&[4; 12]);
        assert_eq!(score.clears, 12);
        assert_eq!(score.level, 2);
        // The backlog is paid off by later waves
        score.begin_lock();
        score.add_wave(&[4]);
        assert_eq!(score.level, 3);
    }

    #[test]
    fn test_fall_interval() {
        let mut score = Score::new();
        let base = Duration::from_secs(1);
        // Level 1: 1.0 / 0.75
        let level_one = score.fall_interval(base, false);
        assert!((level_one.as_secs_f64() - 1.0 / 0.75).abs() < 1e-9);
        score.level = 6;
        assert!((score.fall_interval(base, false).as_secs_f64() - 0.5).abs() < 1e-9);
        assert!(score.fall_interval(base, true) < score.fall_interval(base, false));
    }
}
