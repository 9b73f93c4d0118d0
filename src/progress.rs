//! Campaign progress and screen flow
//!
//! Tracks which levels are unlocked and the best result per level, and maps
//! menu actions and round outcomes to the next screen. Serializable so a
//! front end can persist it wherever it keeps saves.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::level::BUILTIN_LEVEL_COUNT;
use crate::sim::state::RoundPhase;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Home,
    LevelSelect,
    /// Playing level N
    Level(u32),
    /// Level N paused
    Paused(u32),
    LevelComplete(u32),
    LevelFailed(u32),
}

/// A button press on some screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Start from level 1
    Play,
    OpenLevelSelect,
    SelectLevel(u32),
    Pause,
    Resume,
    Restart,
    NextLevel,
    Home,
}

/// Best result for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub level: u32,
    /// Most projectiles left unused in a win
    pub best_spare: u32,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Highest playable level
    pub unlocked: u32,
    /// Sorted by level
    pub records: Vec<LevelRecord>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Fresh campaign: only level 1 is open
    pub fn new() -> Self {
        Self {
            unlocked: 1,
            records: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let progress: Progress = serde_json::from_str(json).map_err(SimError::ProgressParse)?;
        log::info!(
            "Loaded progress: {} levels unlocked, {} records",
            progress.unlocked,
            progress.records.len()
        );
        Ok(progress)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string(self).map_err(SimError::ProgressParse)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        level >= 1 && level <= self.unlocked.min(BUILTIN_LEVEL_COUNT)
    }

    pub fn record(&self, level: u32) -> Option<&LevelRecord> {
        self.records
            .binary_search_by_key(&level, |r| r.level)
            .ok()
            .map(|i| &self.records[i])
    }

    fn record_mut(&mut self, level: u32) -> &mut LevelRecord {
        let idx = match self.records.binary_search_by_key(&level, |r| r.level) {
            Ok(i) => i,
            Err(i) => {
                self.records.insert(
                    i,
                    LevelRecord {
                        level,
                        best_spare: 0,
                        wins: 0,
                        losses: 0,
                    },
                );
                i
            }
        };
        &mut self.records[idx]
    }

    /// Record how a round of `level` ended and return the screen to show.
    /// Rounds still in play map back to their own screen.
    pub fn finish_round(&mut self, level: u32, phase: RoundPhase, spare_projectiles: u32) -> Screen {
        match phase {
            RoundPhase::Won => {
                let record = self.record_mut(level);
                record.wins += 1;
                record.best_spare = record.best_spare.max(spare_projectiles);
                if level < BUILTIN_LEVEL_COUNT && self.unlocked <= level {
                    self.unlocked = level + 1;
                    log::info!("Level {} unlocked", self.unlocked);
                }
                Screen::LevelComplete(level)
            }
            RoundPhase::Lost => {
                self.record_mut(level).losses += 1;
                Screen::LevelFailed(level)
            }
            RoundPhase::Paused => Screen::Paused(level),
            RoundPhase::Playing => Screen::Level(level),
        }
    }

    /// Screen reached by pressing `action` on `screen`; unavailable actions stay put
    pub fn navigate(&self, screen: Screen, action: MenuAction) -> Screen {
        use MenuAction::*;

        match (screen, action) {
            (_, Home) => Screen::Home,
            (Screen::Home, Play) => Screen::Level(1),
            (Screen::Home | Screen::LevelFailed(_), OpenLevelSelect) => Screen::LevelSelect,
            (Screen::LevelSelect, SelectLevel(n)) if self.is_unlocked(n) => Screen::Level(n),
            (Screen::Level(n), Pause) => Screen::Paused(n),
            (Screen::Paused(n), Resume) => Screen::Level(n),
            (Screen::Paused(n) | Screen::LevelComplete(n) | Screen::LevelFailed(n), Restart) => {
                Screen::Level(n)
            }
            (Screen::LevelComplete(n), NextLevel) if self.is_unlocked(n + 1) => Screen::Level(n + 1),
            // Past the last level, "next" goes home
            (Screen::LevelComplete(_), NextLevel) => Screen::Home,
            (current, _) => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_campaign() {
        let progress = Progress::new();
        assert!(progress.is_unlocked(1));
        assert!(!progress.is_unlocked(2));
        assert!(!progress.is_unlocked(0));
        assert!(progress.record(1).is_none());
    }

    #[test]
    fn test_win_unlocks_next_and_keeps_best() {
        let mut progress = Progress::new();
        assert_eq!(progress.finish_round(1, RoundPhase::Won, 1), Screen::LevelComplete(1));
        assert!(progress.is_unlocked(2));

        progress.finish_round(1, RoundPhase::Won, 0);
        let record = progress.record(1).unwrap();
        assert_eq!(record.best_spare, 1);
        assert_eq!(record.wins, 2);
    }

    #[test]
    fn test_loss_does_not_unlock() {
        let mut progress = Progress::new();
        assert_eq!(progress.finish_round(1, RoundPhase::Lost, 0), Screen::LevelFailed(1));
        assert!(!progress.is_unlocked(2));
        assert_eq!(progress.record(1).unwrap().losses, 1);
    }

    #[test]
    fn test_unlock_capped_at_last_level() {
        let mut progress = Progress::new();
        progress.finish_round(1, RoundPhase::Won, 2);
        progress.finish_round(2, RoundPhase::Won, 2);
        assert_eq!(progress.unlocked, BUILTIN_LEVEL_COUNT);
    }

    #[test]
    fn test_navigation() {
        let mut progress = Progress::new();
        assert_eq!(progress.navigate(Screen::Home, MenuAction::Play), Screen::Level(1));
        assert_eq!(
            progress.navigate(Screen::LevelSelect, MenuAction::SelectLevel(2)),
            Screen::LevelSelect,
            "locked level"
        );
        assert_eq!(progress.navigate(Screen::Level(1), MenuAction::Pause), Screen::Paused(1));
        assert_eq!(progress.navigate(Screen::Paused(1), MenuAction::Resume), Screen::Level(1));
        assert_eq!(progress.navigate(Screen::LevelFailed(1), MenuAction::Restart), Screen::Level(1));

        progress.finish_round(1, RoundPhase::Won, 0);
        assert_eq!(
            progress.navigate(Screen::LevelComplete(1), MenuAction::NextLevel),
            Screen::Level(2)
        );
        assert_eq!(
            progress.navigate(Screen::LevelComplete(2), MenuAction::NextLevel),
            Screen::Home
        );
        assert_eq!(progress.navigate(Screen::Level(2), MenuAction::Home), Screen::Home);
    }

    #[test]
    fn test_json_round_trip() {
        let mut progress = Progress::new();
        progress.finish_round(1, RoundPhase::Won, 1);
        progress.finish_round(2, RoundPhase::Lost, 0);

        let json = progress.to_json().unwrap();
        assert_eq!(Progress::from_json(&json).unwrap(), progress);
        assert!(matches!(
            Progress::from_json("[]"),
            Err(SimError::ProgressParse(_))
        ));
    }
}
