use crate::{GameConfig, GameEvent, GameState, MoveRecord};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Summary of one round, built from engine events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub width: usize,
    pub height: usize,
    pub total_mines: usize,
    /// `Playing` for rounds abandoned before they finished.
    pub state: GameState,
    pub duration: Duration,
    pub moves: u32,
    pub history: Vec<MoveRecord>,
}

impl SessionRecord {
    fn new(width: usize, height: usize, total_mines: usize) -> Self {
        Self {
            width,
            height,
            total_mines,
            state: GameState::Playing,
            duration: Duration::ZERO,
            moves: 0,
            history: Vec::new(),
        }
    }

    pub fn matches(&self, config: &GameConfig) -> bool {
        self.width == config.width
            && self.height == config.height
            && self.total_mines == config.mines
    }
}

/// Accumulates session records from a stream of [`GameEvent`]s.
#[derive(Debug, Default)]
pub struct SessionLog {
    sessions: Vec<SessionRecord>,
    current: Option<SessionRecord>,
    started_at: Option<Instant>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `event`, timing it against the wall clock.
    pub fn observe(&mut self, event: &GameEvent) {
        let now = Instant::now();
        if matches!(event, GameEvent::Started { .. }) {
            self.started_at = Some(now);
        }
        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |start| now.duration_since(start));
        self.observe_at(event, elapsed);
    }

    /// Records `event` as happening `elapsed` after its round started.
    pub fn observe_at(&mut self, event: &GameEvent, elapsed: Duration) {
        match *event {
            GameEvent::Started {
                width,
                height,
                mines,
            } => {
                self.close_current();
                self.current = Some(SessionRecord::new(width, height, mines));
            }
            GameEvent::Move(record) => {
                if let Some(session) = self.current.as_mut() {
                    session.moves += 1;
                    session.history.push(record);
                    session.duration = elapsed;
                }
            }
            GameEvent::Finished { state } => {
                if let Some(session) = self.current.as_mut() {
                    session.state = state;
                    session.duration = elapsed;
                }
                self.close_current();
            }
        }
    }

    fn close_current(&mut self) {
        if let Some(session) = self.current.take() {
            self.sessions.push(session);
        }
    }

    /// Rounds that have finished or been replaced by a newer one.
    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub total_games: usize,
    pub wins: usize,
    /// Percentage in `0.0..=100.0`.
    pub win_rate: f64,
    pub best_time: Option<Duration>,
}

impl Statistics {
    /// Aggregates every session played on `config`'s board.
    pub fn for_config(sessions: &[SessionRecord], config: &GameConfig) -> Self {
        let matching: Vec<&SessionRecord> =
            sessions.iter().filter(|s| s.matches(config)).collect();
        let won: Vec<&SessionRecord> = matching
            .iter()
            .copied()
            .filter(|s| s.state == GameState::Won)
            .collect();

        let total_games = matching.len();
        let wins = won.len();
        let win_rate = if total_games > 0 {
            wins as f64 / total_games as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_games,
            wins,
            win_rate,
            best_time: won.iter().map(|s| s.duration).min(),
        }
    }

    pub fn formatted_win_rate(&self) -> String {
        format!("{:.1}%", self.win_rate)
    }

    pub fn formatted_best_time(&self) -> String {
        match self.best_time {
            Some(time) => {
                let secs = time.as_secs();
                format!("{:02}:{:02}", secs / 60, secs % 60)
            }
            None => "N/A".to_owned(),
        }
    }
}
