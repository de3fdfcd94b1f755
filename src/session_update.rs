/*!
This module handles what happens when [`Session::update`] is called.
*/

use super::*;

impl Session {
    /// A convenience variant of [`Session::update`] where the time elapsed since
    /// the previous tick is used instead of an absolute in-session timestamp.
    pub fn update_delta(
        &mut self,
        elapsed: Duration,
        input: TickInput,
    ) -> Result<Vec<FeedbackMsg>, UpdateError> {
        let now = self.state.time + elapsed;
        self.update(now, input)
    }

    /// The main function used to advance the session state by one simulation tick.
    ///
    /// `now` is the adapter's monotonic reading of in-session time; the engine
    /// never consults a clock itself. Per tick, the given input intents are
    /// applied in order (each validated against the board), then gravity and the
    /// lock-delay counter advance, and a piece whose counter has run out is
    /// settled: clearing rows, awarding score, progressing the level, and
    /// spawning the next piece from the queue.
    ///
    /// Unless an error occurs, this function returns all [`FeedbackMsg`]s caused
    /// by the tick, in chronological order.
    ///
    /// # Errors
    ///
    /// This function may error with:
    /// - [`UpdateError::SessionEnded`] if `session.ended()` is `true`, indicating
    ///   that no more updates can change the session state, or
    /// - [`UpdateError::TimeRegressed`] if `now < session.state().time`, indicating
    ///   that the requested update lies in the past.
    pub fn update(
        &mut self,
        now: SessionTime,
        input: TickInput,
    ) -> Result<Vec<FeedbackMsg>, UpdateError> {
        if self.ended() {
            return Err(UpdateError::SessionEnded);
        }
        if now < self.state.time {
            return Err(UpdateError::TimeRegressed);
        }
        self.state.time = now;

        let mut feedback_msgs = Vec::new();
        let Phase::PieceInPlay { piece } = &mut self.phase else {
            return Err(UpdateError::SessionEnded);
        };

        // Player intents first; each one is validated against the board and a
        // success refreshes the lock-delay counter.
        for &intent in &input.intents {
            apply_intent(
                piece,
                &self.state.board,
                &self.config,
                intent,
                now,
                &mut feedback_msgs,
            );
        }

        // Gravity. While the piece can descend it falls on a wall-clock interval;
        // while it rests, the lock-delay counter ticks up instead.
        let mut lock_now = false;
        if self.state.board.is_valid(&piece.shape, piece.x, piece.y + 1) {
            let soft_drop = input.soft_drop.then_some(self.config.soft_drop_factor);
            if now.saturating_sub(self.state.last_fall) >= gravity_interval(self.state.level, soft_drop)
            {
                piece.y += 1;
                self.state.last_fall = now;
                piece.lock_ticks = 0;
            }
        } else {
            piece.lock_ticks += 1;
            lock_now = piece.lock_ticks >= self.config.max_lock_ticks;
        }

        if lock_now {
            let locked = piece.clone();
            self.phase = lock_piece(&mut self.state, locked, &mut feedback_msgs);
        }

        Ok(feedback_msgs)
    }
}

/// Applies a single input intent to the active piece, board permitting.
fn apply_intent(
    piece: &mut ActivePiece,
    board: &Board,
    config: &SessionConfig,
    intent: Intent,
    now: SessionTime,
    feedback_msgs: &mut Vec<FeedbackMsg>,
) {
    match intent {
        Intent::MoveLeft => {
            if board.is_valid(&piece.shape, piece.x - 1, piece.y) {
                piece.x -= 1;
                piece.lock_ticks = 0;
            }
        }
        Intent::MoveRight => {
            if board.is_valid(&piece.shape, piece.x + 1, piece.y) {
                piece.x += 1;
                piece.lock_ticks = 0;
            }
        }
        Intent::Rotate => {
            // Plain 90° turn at the same anchor; no kick offsets are searched,
            // an obstructed rotation is silently rejected.
            let rotated = piece.shape.rotated_cw();
            if board.is_valid(&rotated, piece.x, piece.y) {
                piece.shape = rotated;
                piece.lock_ticks = 0;
            }
        }
        Intent::HardDrop => {
            let old_piece = piece.clone();
            while board.is_valid(&piece.shape, piece.x, piece.y + 1) {
                piece.y += 1;
            }
            // Saturate the lock-delay counter so the gravity step of this same
            // tick settles the piece.
            piece.lock_ticks = config.max_lock_ticks;
            feedback_msgs.push((
                now,
                Feedback::HardDrop {
                    old_piece,
                    new_piece: piece.clone(),
                },
            ));
        }
    }
}

/// Settles a locked piece: merge, clear rows, score, level, spawn the next piece.
///
/// Returns the session phase to continue with.
fn lock_piece(state: &mut State, piece: ActivePiece, feedback_msgs: &mut Vec<FeedbackMsg>) -> Phase {
    let now = state.time;

    state
        .board
        .merge(&piece.shape, piece.x, piece.y, piece.color());
    feedback_msgs.push((now, Feedback::PieceLocked { piece }));

    let full = state.board.full_rows();
    if !full.is_empty() {
        let rows_cleared = full.len() as u32;
        state.level_lines += rows_cleared;
        state.board.clear_rows(&full);

        let score_bonus = line_clear_score(full.len(), state.level);
        state.score += score_bonus;

        feedback_msgs.push((now, Feedback::RowsCleared { rows: full }));
        feedback_msgs.push((
            now,
            Feedback::Accolade {
                score_bonus,
                rows_cleared,
            },
        ));
    }

    // The level check runs after every lock, cleared rows or not. At level 0 the
    // threshold is zero lines, so the very first settled piece reaches level 1.
    if state.level_lines >= state.level * 5 {
        state.level += 1;
        state.level_lines = 0;
        feedback_msgs.push((
            now,
            Feedback::LevelUp {
                level: state.level,
            },
        ));
    }

    let next = state.queue.pop(&mut state.rng);
    let spawned = spawn_piece(next, state.board.width());
    if state.board.is_valid(&spawned.shape, spawned.x, spawned.y) {
        Phase::PieceInPlay { piece: spawned }
    } else {
        feedback_msgs.push((now, Feedback::SessionEnded));
        Phase::Ended
    }
}

/// Places a fresh piece horizontally centered at the top of the grid.
pub(crate) fn spawn_piece(kind: PieceKind, grid_width: usize) -> ActivePiece {
    let shape = kind.shape();
    let x = (grid_width / 2) as i32 - (shape.width() / 2) as i32;
    ActivePiece {
        kind,
        shape,
        x,
        y: 0,
        lock_ticks: 0,
    }
}

/// The score bonus for clearing `rows` rows simultaneously at the given level.
fn line_clear_score(rows: usize, level: u32) -> u32 {
    LINE_CLEAR_POINTS[rows - 1] * (1 + level)
}

/// The time a piece takes to fall one unit, purely dependent on level and an
/// optional soft-drop factor.
fn gravity_interval(level: u32, soft_drop_factor: Option<u32>) -> Duration {
    let seconds = (725.0 * 0.85_f64.powi(level as i32) + f64::from(level)) / 1000.0;
    let interval = Duration::from_secs_f64(seconds);
    match soft_drop_factor {
        Some(factor) => interval.div_f64(f64::from(factor)),
        None => interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_session() -> Session {
        Session::builder().seed(7).build().unwrap()
    }

    #[test]
    fn gravity_interval_follows_the_level_curve() {
        assert_eq!(gravity_interval(0, None), Duration::from_millis(725));
        // (725 * 0.85 + 1) / 1000
        assert_eq!(gravity_interval(1, None), Duration::from_secs_f64(0.61725));
        assert!(gravity_interval(10, None) < gravity_interval(3, None));
    }

    #[test]
    fn soft_drop_divides_the_interval() {
        let base = gravity_interval(0, None);
        assert_eq!(gravity_interval(0, Some(15)), base.div_f64(15.0));
    }

    #[test]
    fn line_clear_score_multiplies_base_points_by_level() {
        assert_eq!(line_clear_score(1, 0), 40);
        assert_eq!(line_clear_score(4, 0), 1200);
        assert_eq!(line_clear_score(4, 2), 3600);
        assert_eq!(line_clear_score(2, 9), 1000);
    }

    #[test]
    fn spawn_is_centered_by_integer_division() {
        let piece = spawn_piece(PieceKind::I, 10);
        assert_eq!((piece.x, piece.y), (3, 0));
        let piece = spawn_piece(PieceKind::O, 10);
        assert_eq!((piece.x, piece.y), (4, 0));
        let piece = spawn_piece(PieceKind::T, 10);
        assert_eq!((piece.x, piece.y), (4, 0));
    }

    #[test]
    fn first_lock_reaches_level_one_without_any_clears() {
        let mut session = fixed_session();
        let msgs = session
            .update(Duration::ZERO, TickInput::intents([Intent::HardDrop]))
            .unwrap();

        assert!(msgs
            .iter()
            .any(|(_, msg)| matches!(msg, Feedback::PieceLocked { .. })));
        assert!(msgs
            .iter()
            .any(|(_, msg)| matches!(msg, Feedback::LevelUp { level: 1 })));
        assert_eq!(session.state().level, 1);
        assert_eq!(session.state().level_lines, 0);
        assert_eq!(session.state().score, 0);
        // The settled piece left exactly its four blocks on the board.
        let occupied = session
            .state()
            .board
            .rows()
            .iter()
            .flatten()
            .filter(|cell| cell.is_some())
            .count();
        assert_eq!(occupied, 4);
        // A new piece is already in play.
        let respawned = session.phase().piece().unwrap();
        assert_eq!(respawned.y, 0);
        assert_eq!(respawned.lock_ticks, 0);
    }

    #[test]
    fn second_level_requires_five_cleared_rows() {
        let mut session = fixed_session();
        session.update(Duration::ZERO, TickInput::intents([Intent::HardDrop])).unwrap();
        assert_eq!(session.state().level, 1);

        // Four rows at once are not enough for the next tier.
        session.state_mut().level_lines = 4;
        session.update(Duration::ZERO, TickInput::intents([Intent::HardDrop])).unwrap();
        assert_eq!(session.state().level, 1);
        assert_eq!(session.state().level_lines, 4);

        session.state_mut().level_lines = 5;
        session.update(Duration::ZERO, TickInput::intents([Intent::HardDrop])).unwrap();
        assert_eq!(session.state().level, 2);
        assert_eq!(session.state().level_lines, 0);
    }
}
