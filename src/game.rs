use crate::{Board, Cell, CellColor, CellState, GameConfig, Mask, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Playing => "playing",
            Self::Won => "won",
            Self::Lost => "lost",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Reveal,
    Flag,
    Chord,
}

/// How a command left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveOutcome {
    /// The game is still in progress, whether or not anything changed.
    Success,
    /// A direct reveal uncovered a mine.
    Mine,
    Win,
    /// A chord uncovered a mine behind a misplaced flag.
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub kind: MoveKind,
    pub position: Position,
    pub outcome: MoveOutcome,
}

/// Notifications for whoever persists sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum GameEvent {
    Started {
        width: usize,
        height: usize,
        mines: usize,
    },
    Move(MoveRecord),
    Finished {
        state: GameState,
    },
}

/// The minesweeper state machine. A rectangular game is a masked game whose
/// mask is full; both share one code path.
///
/// Every command is a silent no-op when its preconditions do not hold.
#[derive(Debug, Clone)]
pub struct Engine {
    board: Board,
    /// Mines requested for random rounds.
    configured_mines: usize,
    /// Mines actually on the current board.
    total_mines: usize,
    mine_count: isize,
    flagged_count: usize,
    revealed_count: usize,
    safe_cells: usize,
    state: GameState,
    events: Vec<GameEvent>,
}

impl Engine {
    /// A rectangular engine. No mines are placed until a game is started.
    pub fn new(width: usize, height: usize, mines: usize) -> Self {
        Self::with_mask(Mask::full(width, height), mines)
    }

    /// A masked engine whose dimensions come from `mask`.
    pub fn with_mask(mask: Mask, mines: usize) -> Self {
        let board = Board::new(mask);
        let safe_cells = board.mask().active_count().saturating_sub(mines);
        Self {
            board,
            configured_mines: mines,
            total_mines: mines,
            mine_count: mines as isize,
            flagged_count: 0,
            revealed_count: 0,
            safe_cells,
            state: GameState::Playing,
            events: Vec::new(),
        }
    }

    pub fn from_config(config: GameConfig) -> Self {
        Self::new(config.width, config.height, config.mines)
    }

    /// Places mines with the thread-local generator and starts a new round.
    ///
    /// The mine count must be below the number of active cells. On a
    /// rectangular board a count above the cell count never returns; use
    /// [`GameConfig::new`] to validate first.
    pub fn start_new_game(&mut self) {
        self.start_new_game_with_rng(&mut rand::thread_rng());
    }

    pub fn start_new_game_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut board = Board::new(self.board.mask().clone());
        let placed = board.place_random_mines(self.configured_mines, rng);
        self.begin(board, placed);
    }

    /// Starts a round with mines at exactly `positions`. Inactive,
    /// out-of-bounds and duplicate positions are ignored, and the round's
    /// mine total is the number actually placed. Later random rounds still
    /// use the configured count.
    pub fn start_with_mines(&mut self, positions: impl IntoIterator<Item = Position>) {
        let mut board = Board::new(self.board.mask().clone());
        let placed = board.place_mines_at(positions);
        self.begin(board, placed);
    }

    /// Reconfigures as a rectangular game and starts it.
    pub fn new_game(&mut self, width: usize, height: usize, mines: usize) {
        *self = Self {
            events: std::mem::take(&mut self.events),
            ..Self::new(width, height, mines)
        };
        self.start_new_game();
    }

    /// Reconfigures with a story-level shape and starts it.
    pub fn new_story_game(&mut self, mask: Mask, mines: usize) {
        *self = Self {
            events: std::mem::take(&mut self.events),
            ..Self::with_mask(mask, mines)
        };
        self.start_new_game();
    }

    fn begin(&mut self, mut board: Board, placed: usize) {
        board.compute_adjacency();
        self.safe_cells = board.mask().active_count() - placed;
        self.board = board;
        self.total_mines = placed;
        self.mine_count = placed as isize;
        self.flagged_count = 0;
        self.revealed_count = 0;
        self.state = GameState::Playing;

        debug!(
            width = self.width(),
            height = self.height(),
            mines = placed,
            "started new game"
        );
        self.events.push(GameEvent::Started {
            width: self.width(),
            height: self.height(),
            mines: self.total_mines,
        });
    }

    /// Reveals a hidden, unflagged, active cell. Zero cells flood outward.
    /// Returns `None` when the game was already over.
    ///
    /// Hitting a mine reveals it without adding to [`Engine::revealed_count`],
    /// which only ever counts safe cells.
    pub fn reveal(&mut self, pos: Position) -> Option<MoveOutcome> {
        if self.is_finished() {
            return None;
        }
        self.reveal_from(pos);
        Some(self.finish_move(MoveKind::Reveal, pos))
    }

    /// Flags or unflags a hidden active cell. Never ends the game.
    pub fn toggle_flag(&mut self, pos: Position) -> Option<MoveOutcome> {
        if self.is_finished() {
            return None;
        }

        if let Some(cell) = self.board.get_mut(pos).filter(|cell| cell.is_active()) {
            match cell.state() {
                CellState::Hidden => {
                    cell.set_state(CellState::Flagged);
                    self.flagged_count += 1;
                    self.mine_count -= 1;
                }
                CellState::Flagged => {
                    cell.set_state(CellState::Hidden);
                    self.flagged_count -= 1;
                    self.mine_count += 1;
                }
                CellState::Revealed => {}
            }
        }

        Some(self.finish_move(MoveKind::Flag, pos))
    }

    /// Reveals every unflagged hidden neighbour of a revealed number whose
    /// flagged neighbours match it. Anything else changes nothing.
    pub fn chord(&mut self, pos: Position) -> Option<MoveOutcome> {
        if self.is_finished() {
            return None;
        }

        if let Some(&cell) = self.board.get(pos) {
            let count = cell.adjacent_mines();
            if cell.is_active()
                && cell.is_revealed()
                && count > 0
                && self.board.count_adjacent_flags(pos) == count
            {
                let targets: Vec<Position> = self.board.neighbors(pos).collect();
                for target in targets {
                    self.reveal_from(target);
                }
            }
        }

        Some(self.finish_move(MoveKind::Chord, pos))
    }

    fn reveal_from(&mut self, start: Position) {
        if self.state != GameState::Playing {
            return;
        }
        let Some(&cell) = self.board.get(start) else {
            return;
        };
        if !cell.is_active() || !cell.is_hidden() {
            return;
        }

        if cell.is_mine() {
            self.detonate(start);
            return;
        }

        let mut to_reveal = vec![start];
        let mut revealed = 0;
        while let Some(pos) = to_reveal.pop() {
            let adjacent = match self.board.get_mut(pos) {
                Some(cell) if cell.is_active() && cell.is_hidden() => {
                    cell.set_state(CellState::Revealed);
                    cell.adjacent_mines()
                }
                _ => continue,
            };
            revealed += 1;

            if adjacent == 0 {
                to_reveal.extend(
                    self.board
                        .neighbors(pos)
                        .filter(|&n| self.board.get(n).is_some_and(Cell::is_hidden)),
                );
            }
        }

        self.revealed_count += revealed;
        trace!(?start, revealed, "revealed region");

        if self.revealed_count == self.safe_cells {
            self.state = GameState::Won;
            info!(revealed = self.revealed_count, "game won");
        }
    }

    /// Ends the game on `pos` and shows every hidden mine. Flagged mines keep
    /// their flag.
    fn detonate(&mut self, pos: Position) {
        self.state = GameState::Lost;
        let mines: Vec<Position> = self
            .board
            .iter()
            .filter(|(_, cell)| cell.is_mine() && cell.is_hidden())
            .map(|(p, _)| p)
            .collect();
        for mine in mines {
            if let Some(cell) = self.board.get_mut(mine) {
                cell.set_state(CellState::Revealed);
            }
        }
        info!(?pos, revealed = self.revealed_count, "game lost");
    }

    fn finish_move(&mut self, kind: MoveKind, position: Position) -> MoveOutcome {
        let outcome = match (self.state, kind) {
            (GameState::Playing, _) => MoveOutcome::Success,
            (GameState::Won, _) => MoveOutcome::Win,
            (GameState::Lost, MoveKind::Reveal) => MoveOutcome::Mine,
            (GameState::Lost, _) => MoveOutcome::Lose,
        };
        self.events.push(GameEvent::Move(MoveRecord {
            kind,
            position,
            outcome,
        }));
        if self.state.is_finished() {
            self.events.push(GameEvent::Finished { state: self.state });
        }
        outcome
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Mines left to flag. Goes negative when the player over-flags.
    pub fn mine_count(&self) -> isize {
        self.mine_count
    }

    /// Mines on the current board.
    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_count
    }

    /// Safe cells revealed so far. A detonated mine is not counted.
    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mask(&self) -> &Mask {
        self.board.mask()
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.board.get(pos)
    }

    /// Empty for positions off the board.
    pub fn display_text(&self, pos: Position) -> Cow<'static, str> {
        self.cell(pos)
            .map_or(Cow::Borrowed(""), Cell::display_text)
    }

    /// Positions off the board report [`CellColor::Inactive`].
    pub fn cell_color(&self, pos: Position) -> CellColor {
        self.cell(pos).map_or(CellColor::Inactive, Cell::color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn engine_with_mines(width: usize, height: usize, mines: &[(usize, usize)]) -> Engine {
        let mut engine = Engine::new(width, height, mines.len());
        engine.start_with_mines(mines.iter().copied().map(Position::from));
        engine.drain_events();
        engine
    }

    #[test]
    fn test_start_resets_counters() {
        let mut engine = engine_with_mines(4, 4, &[(0, 0)]);
        engine.toggle_flag(pos(3, 3));
        engine.reveal(pos(0, 1));

        engine.start_new_game_with_rng(&mut StdRng::seed_from_u64(3));
        assert_eq!(engine.state(), GameState::Playing);
        assert_eq!(engine.mine_count(), 1);
        assert_eq!(engine.flagged_count(), 0);
        assert_eq!(engine.revealed_count(), 0);
        assert_eq!(engine.board().mine_count(), 1);
    }

    #[test]
    fn test_reveal_numbered_cell_does_not_flood() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        assert_eq!(engine.reveal(pos(1, 1)), Some(MoveOutcome::Success));
        assert_eq!(engine.revealed_count(), 1);
    }

    #[test]
    fn test_reveal_mine_loses_and_shows_mines() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0), (2, 2)]);
        engine.toggle_flag(pos(2, 2));

        assert_eq!(engine.reveal(pos(0, 0)), Some(MoveOutcome::Mine));
        assert_eq!(engine.state(), GameState::Lost);
        assert!(engine.cell(pos(0, 0)).unwrap().is_revealed());
        assert!(engine.cell(pos(2, 2)).unwrap().is_flagged());
        assert!(engine.cell(pos(1, 1)).unwrap().is_hidden());
        assert_eq!(engine.revealed_count(), 0);
    }

    #[test]
    fn test_flagged_cell_cannot_be_revealed() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.toggle_flag(pos(0, 0));
        assert_eq!(engine.reveal(pos(0, 0)), Some(MoveOutcome::Success));
        assert_eq!(engine.state(), GameState::Playing);
        assert!(engine.cell(pos(0, 0)).unwrap().is_flagged());
    }

    #[test]
    fn test_flag_counters_and_negative_remaining() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.toggle_flag(pos(0, 0));
        engine.toggle_flag(pos(0, 1));
        assert_eq!(engine.flagged_count(), 2);
        assert_eq!(engine.mine_count(), -1);

        engine.toggle_flag(pos(0, 1));
        assert_eq!(engine.flagged_count(), 1);
        assert_eq!(engine.mine_count(), 0);
    }

    #[test]
    fn test_cannot_flag_revealed_cell() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.reveal(pos(1, 1));
        engine.toggle_flag(pos(1, 1));
        assert_eq!(engine.flagged_count(), 0);
        assert!(engine.cell(pos(1, 1)).unwrap().is_revealed());
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        assert_eq!(engine.reveal(pos(3, 0)), Some(MoveOutcome::Success));
        assert_eq!(engine.toggle_flag(pos(0, 9)), Some(MoveOutcome::Success));
        assert_eq!(engine.chord(pos(9, 9)), Some(MoveOutcome::Success));
        assert_eq!(engine.revealed_count(), 0);
        assert_eq!(engine.flagged_count(), 0);
    }

    #[test]
    fn test_commands_after_game_over_are_ignored() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.reveal(pos(0, 0));
        engine.drain_events();

        assert_eq!(engine.reveal(pos(2, 2)), None);
        assert_eq!(engine.toggle_flag(pos(2, 2)), None);
        assert_eq!(engine.chord(pos(2, 2)), None);
        assert!(engine.cell(pos(2, 2)).unwrap().is_hidden());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_chord_with_matching_flags() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.reveal(pos(1, 1));
        engine.toggle_flag(pos(0, 0));

        assert_eq!(engine.chord(pos(1, 1)), Some(MoveOutcome::Win));
        assert_eq!(engine.state(), GameState::Won);
        assert_eq!(engine.revealed_count(), 8);
    }

    #[test]
    fn test_chord_with_mismatched_flags_is_noop() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0), (0, 2)]);
        engine.reveal(pos(1, 1));
        engine.toggle_flag(pos(0, 0));
        let before = engine.board().clone();

        assert_eq!(engine.chord(pos(1, 1)), Some(MoveOutcome::Success));
        assert_eq!(engine.board(), &before);
    }

    #[test]
    fn test_chord_on_wrong_flag_loses() {
        let mut engine = engine_with_mines(3, 3, &[(0, 0)]);
        engine.reveal(pos(1, 1));
        engine.toggle_flag(pos(0, 1));

        assert_eq!(engine.chord(pos(1, 1)), Some(MoveOutcome::Lose));
        assert_eq!(engine.state(), GameState::Lost);
    }

    #[test]
    fn test_chord_on_hidden_or_zero_cell_is_noop() {
        let mut engine = engine_with_mines(4, 1, &[(0, 0)]);
        engine.chord(pos(0, 3));
        assert_eq!(engine.revealed_count(), 0);

        engine.reveal(pos(0, 3));
        let revealed = engine.revealed_count();
        engine.chord(pos(0, 3));
        assert_eq!(engine.revealed_count(), revealed);
    }

    #[test]
    fn test_events_record_moves_and_finish() {
        let mut engine = Engine::new(2, 1, 1);
        engine.start_with_mines([pos(0, 0)]);
        engine.toggle_flag(pos(0, 0));
        engine.reveal(pos(0, 1));

        let flag = MoveRecord {
            kind: MoveKind::Flag,
            position: pos(0, 0),
            outcome: MoveOutcome::Success,
        };
        let reveal = MoveRecord {
            kind: MoveKind::Reveal,
            position: pos(0, 1),
            outcome: MoveOutcome::Win,
        };
        assert_eq!(
            engine.drain_events(),
            vec![
                GameEvent::Started {
                    width: 2,
                    height: 1,
                    mines: 1
                },
                GameEvent::Move(flag),
                GameEvent::Move(reveal),
                GameEvent::Finished {
                    state: GameState::Won
                },
            ]
        );
    }

    #[test]
    fn test_fixed_layout_counts_placed_mines() {
        let mut engine = Engine::new(3, 3, 3);
        engine.start_with_mines([pos(0, 0), pos(0, 0), pos(7, 7)]);

        assert_eq!(engine.board().mine_count(), 1);
        assert_eq!(engine.total_mines(), 1);
        assert_eq!(engine.mine_count(), engine.board().mine_count() as isize);
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::Started {
                width: 3,
                height: 3,
                mines: 1
            }]
        );

        engine.start_new_game_with_rng(&mut StdRng::seed_from_u64(5));
        assert_eq!(engine.total_mines(), 3);
        assert_eq!(engine.mine_count(), 3);
        assert_eq!(engine.board().mine_count(), 3);
    }

    #[test]
    fn test_detonated_mine_is_not_counted_as_revealed() {
        let mut engine = engine_with_mines(2, 1, &[(0, 0)]);
        engine.reveal(pos(0, 0));

        assert_eq!(engine.state(), GameState::Lost);
        assert!(engine.cell(pos(0, 0)).unwrap().is_revealed());
        assert_eq!(engine.revealed_count(), 0);
    }

    #[test]
    fn test_new_story_game_switches_shape() {
        let mut engine = Engine::new(9, 9, 10);
        engine.start_new_game();
        engine.new_story_game(Mask::diamond(7), 5);

        assert_eq!((engine.width(), engine.height()), (7, 7));
        assert_eq!(engine.total_mines(), 5);
        assert_eq!(engine.board().mine_count(), 5);
        assert_eq!(engine.drain_events().len(), 2);
    }

    #[test]
    fn test_event_serialization() {
        let event = GameEvent::Move(MoveRecord {
            kind: MoveKind::Chord,
            position: pos(1, 2),
            outcome: MoveOutcome::Lose,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"move","kind":"chord","position":{"row":1,"col":2},"outcome":"lose"}"#
        );
    }
}
