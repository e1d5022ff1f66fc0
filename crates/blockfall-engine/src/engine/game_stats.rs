use serde::{Deserialize, Serialize};

/// Base points for clearing 0-4 lines at once, multiplied by the current level.
const SCORE_TABLE: [usize; 5] = [0, 40, 100, 300, 1200];

/// Game statistics tracking score, level, lines cleared, and piece count.
///
/// # Scoring
///
/// A drop that clears `n` lines earns `SCORE_TABLE[n] * level` points, using the level
/// in effect before the drop. The level starts at 1 and advances by one whenever the
/// total number of cleared lines exceeds ten times the current level.
///
/// # Example
///
/// ```
/// use blockfall_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4);
///
/// assert_eq!(stats.score(), 1200);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: usize,
    level: usize,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Number of pieces locked so far.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Histogram of drops by number of lines cleared (index 0 counts drops clearing nothing).
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Records one locked piece that cleared `cleared_lines` rows.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        self.completed_pieces += 1;
        if let Some(count) = self.line_cleared_counter.get_mut(cleared_lines) {
            *count += 1;
        }
        if cleared_lines == 0 {
            return;
        }
        self.total_cleared_lines += cleared_lines;
        let base = SCORE_TABLE[cleared_lines.min(SCORE_TABLE.len() - 1)];
        self.score += base * self.level;
        if self.total_cleared_lines > self.level * 10 {
            self.level += 1;
        }
    }
}
