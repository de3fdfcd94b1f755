/*!
# Blockfall Engine

`blockfall_engine` is the rule engine of a falling-block puzzle game. It owns the
playfield, piece geometry, movement and rotation legality, gravity timing, locking,
line clearing and score/level progression, and nothing else. Window creation,
pixel drawing and keyboard polling live in an external adapter that feeds discrete
input intents into the engine each tick and renders a read-only snapshot of its
state.

# Examples

```
use std::time::Duration;
use blockfall_engine::{Intent, Session, TickInput};

// Starting up a session - note that in-session time starts at 0.0s.
let mut session = Session::builder().seed(42).build()?;

// Updating the session with the info that 'left' is wanted at second 1.0;
// the active piece will try to move left.
session.update(Duration::from_secs(1), TickInput::intents([Intent::MoveLeft]))?;

// Updating the session with no input up to second 2.0; pieces fall on their own.
session.update(Duration::from_secs(2), TickInput::idle())?;

// Read the most recent session state;
// This is how a UI can know how to render the board, score, preview piece, etc.
let snapshot = session.snapshot();
assert!(!snapshot.ended);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

#![warn(missing_docs)]

pub mod board;
pub mod piece_queue;
mod session_builder;
mod session_update;
pub mod shape;

use std::{fmt, time::Duration};

use rand_chacha::ChaCha12Rng;

pub use board::Board;
pub use piece_queue::PieceQueue;
pub use session_builder::SessionBuilder;
pub use shape::ShapeMatrix;

/// A color as an `(r, g, b)` triple, carried per settled cell for external rendering.
pub type Rgb = (u8, u8, u8);
/// The type used to identify points in time on a session's internal timeline.
pub type SessionTime = Duration;
/// The internal RNG used by a session.
pub type SessionRng = ChaCha12Rng;
/// Convenient type alias to denote a [`Feedback`] associated with some [`SessionTime`].
pub type FeedbackMsg = (SessionTime, Feedback);

/// Base score values for clearing 1 through 4 rows simultaneously, indexed by
/// (rows cleared − 1). The awarded bonus is `LINE_CLEAR_POINTS[n - 1] * (1 + level)`.
pub const LINE_CLEAR_POINTS: [u32; 4] = [40, 100, 300, 1200];

/// Represents one of the seven catalog piece shapes.
///
/// The discriminants 0–6 are the identifiers handed out by the [`PieceQueue`];
/// `PieceKind::VARIANTS[k as usize] == k` always holds.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceKind {
    /// 'I'-piece; four blocks in a straight line, cyan.
    I = 0,
    /// 'J'-piece; a row of three with a block under its left end, blue.
    J,
    /// 'L'-piece; a row of three with a block under its right end, orange.
    L,
    /// 'O'-piece; a two-by-two square, yellow.
    O,
    /// 'S'-piece; two offset rows snaking rightward, green.
    S,
    /// 'T'-piece; a row of three with a block under its center, purple.
    T,
    /// 'Z'-piece; two offset rows snaking leftward, red.
    Z,
}

impl PieceKind {
    /// All `PieceKind` enum variants in order.
    ///
    /// Note that `PieceKind::VARIANTS[k as usize] == k` always holds.
    pub const VARIANTS: [Self; 7] = {
        use PieceKind::*;
        [I, J, L, O, S, T, Z]
    };

    /// The canonical orientation of this piece as a borrowed boolean pattern.
    pub const fn pattern(&self) -> &'static [&'static [bool]] {
        match self {
            PieceKind::I => &[&[true, true, true, true]],
            PieceKind::J => &[&[true, true, true], &[true, false, false]],
            PieceKind::L => &[&[true, true, true], &[false, false, true]],
            PieceKind::O => &[&[true, true], &[true, true]],
            PieceKind::S => &[&[false, true, true], &[true, true, false]],
            PieceKind::T => &[&[true, true, true], &[false, true, false]],
            PieceKind::Z => &[&[true, true, false], &[false, true, true]],
        }
    }

    /// The canonical orientation of this piece as an owned [`ShapeMatrix`].
    pub fn shape(&self) -> ShapeMatrix {
        ShapeMatrix::from_pattern(self.pattern())
    }

    /// The convened-on display color of this piece.
    pub const fn color(&self) -> Rgb {
        match self {
            PieceKind::I => (0, 255, 255),
            PieceKind::J => (0, 0, 255),
            PieceKind::L => (255, 165, 0),
            PieceKind::O => (255, 255, 0),
            PieceKind::S => (0, 255, 0),
            PieceKind::T => (128, 0, 128),
            PieceKind::Z => (255, 0, 0),
        }
    }
}

/// The piece currently in play.
///
/// Holds its own (possibly rotated) shape matrix; the catalog entry it was built
/// from is never mutated. `(x, y)` anchor the shape's top-left matrix corner on
/// the board, so every filled cell `(row, col)` sits at board coordinates
/// `(x + col, y + row)`.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivePiece {
    /// Which catalog entry the piece was spawned from.
    pub kind: PieceKind,
    /// The shape matrix in the piece's current orientation.
    pub shape: ShapeMatrix,
    /// The anchor column on the board.
    pub x: i32,
    /// The anchor row on the board.
    pub y: i32,
    /// How many ticks the piece has spent resting on a surface.
    ///
    /// Reset to 0 by every successful move, rotation or gravity step; the piece
    /// locks once this reaches the session's `max_lock_ticks`.
    pub lock_ticks: u32,
}

impl ActivePiece {
    /// The display color of the piece, derived from its catalog entry.
    pub const fn color(&self) -> Rgb {
        self.kind.color()
    }
}

/// Represents a discrete input intent delivered by the adapter.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intent {
    /// Moves the piece once to the left.
    MoveLeft,
    /// Moves the piece once to the right.
    MoveRight,
    /// Rotates the piece by 90° clockwise, keeping its anchor.
    Rotate,
    /// Immediately drops the piece to the lowest valid row and schedules its lock.
    HardDrop,
}

/// One tick's worth of player input, as collected by the adapter.
#[derive(Eq, PartialEq, Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickInput {
    /// Discrete intents, applied in order before gravity advances.
    pub intents: Vec<Intent>,
    /// Whether the soft-drop button is currently held down.
    pub soft_drop: bool,
}

impl TickInput {
    /// A tick with no input at all.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A tick carrying the given intents, soft drop released.
    pub fn intents(intents: impl IntoIterator<Item = Intent>) -> Self {
        Self {
            intents: intents.into_iter().collect(),
            soft_drop: false,
        }
    }

    /// Marks the soft-drop button as held for this tick.
    pub fn with_soft_drop(mut self) -> Self {
        self.soft_drop = true;
        self
    }
}

/// The top-level state machine of a session.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// The state of the session having an active piece in play.
    PieceInPlay {
        /// The piece currently being controlled by the player.
        piece: ActivePiece,
    },
    /// The state of the session being irreversibly over, and not playable anymore.
    Ended,
}

impl Phase {
    /// Read accessor to a `Phase`'s possible [`ActivePiece`].
    pub fn piece(&self) -> Option<&ActivePiece> {
        if let Phase::PieceInPlay { piece } = self {
            Some(piece)
        } else {
            None
        }
    }

    /// Mutable accessor to a `Phase`'s possible [`ActivePiece`].
    pub fn piece_mut(&mut self) -> Option<&mut ActivePiece> {
        if let Phase::PieceInPlay { piece } = self {
            Some(piece)
        } else {
            None
        }
    }
}

/// Struct storing internal session state that changes over the course of play.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    /// Current in-session time.
    pub time: SessionTime,
    /// The internal pseudo random number generator used.
    pub rng: SessionRng,
    /// Upcoming pieces to be played.
    pub queue: PieceQueue,
    /// The playing grid storing settled cells.
    pub board: Board,
    /// When the active piece last descended by gravity.
    pub last_fall: SessionTime,
    /// The current total score the player has achieved in this round of play.
    pub score: u32,
    /// The current difficulty tier, controlling gravity speed and score multiplier.
    pub level: u32,
    /// Rows cleared since the last level-up.
    pub level_lines: u32,
}

/// A number of feedback events that can be returned by the session.
///
/// These can be used to more easily render visual feedback to the player; an
/// adapter may also log them.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    /// A piece was settled onto the board in a certain configuration.
    PieceLocked {
        /// The state of the piece at the moment it locked.
        piece: ActivePiece,
    },
    /// A number of rows were completed and removed from the board.
    RowsCleared {
        /// Indices of the cleared rows at detection time, ascending.
        rows: Vec<usize>,
    },
    /// The player cleared rows and was awarded points.
    Accolade {
        /// The computed score bonus.
        score_bonus: u32,
        /// How many rows were cleared simultaneously.
        rows_cleared: u32,
    },
    /// The session advanced to a new difficulty tier.
    LevelUp {
        /// The level that was just reached.
        level: u32,
    },
    /// A piece was quickly dropped from its original position to a new one.
    HardDrop {
        /// The state of the piece before the drop.
        old_piece: ActivePiece,
        /// The state of the piece at its final resting position.
        new_piece: ActivePiece,
    },
    /// A freshly spawned piece did not fit the board; the session is over.
    SessionEnded,
}

/// An error that can be thrown by [`Session::update`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum UpdateError {
    /// Error variant caused by an attempt to update the session with a requested
    /// timestamp that lies in the session's past (` < session.state().time`).
    TimeRegressed,
    /// Error variant caused by an attempt to update a session that has ended
    /// (`session.ended() == true`).
    SessionEnded,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateError::TimeRegressed => "attempt to update session to a timestamp it already passed",
            UpdateError::SessionEnded => "attempt to update session after it ended",
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for UpdateError {}

/// An error that can be thrown by [`SessionBuilder::build`].
///
/// Malformed grid geometry fails fast here; the engine never silently truncates
/// pixel dimensions into a smaller grid.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum ConfigError {
    /// The cell size was zero, leaving the grid dimensions undefined.
    ZeroCellSize,
    /// The board pixel dimensions are not evenly divisible by the cell size.
    UnevenGrid {
        /// Configured board width in pixels.
        width: u32,
        /// Configured board height in pixels.
        height: u32,
        /// Configured cell size in pixels.
        cell_size: u32,
    },
    /// The derived grid has no rows or no columns.
    EmptyGrid,
    /// The soft-drop factor must be at least 1.
    ZeroSoftDropFactor,
    /// The piece preview depth must be at least 1.
    ZeroPreview,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCellSize => write!(f, "cell size must be nonzero"),
            ConfigError::UnevenGrid {
                width,
                height,
                cell_size,
            } => write!(
                f,
                "board dimensions {width}x{height} are not divisible by cell size {cell_size}"
            ),
            ConfigError::EmptyGrid => write!(f, "derived grid has no rows or no columns"),
            ConfigError::ZeroSoftDropFactor => write!(f, "soft drop factor must be at least 1"),
            ConfigError::ZeroPreview => write!(f, "piece preview depth must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration options of a session, fixed at construction.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Board width in pixels.
    pub width: u32,
    /// Board height in pixels.
    pub height: u32,
    /// Edge length of one grid cell in pixels.
    ///
    /// Must divide both `width` and `height` evenly; the logical grid dimensions
    /// are derived by integer division.
    pub cell_size: u32,
    /// How many ticks a resting piece may accumulate before it locks.
    pub max_lock_ticks: u32,
    /// How many times faster than normal a piece falls while soft drop is held.
    pub soft_drop_factor: u32,
    /// How many pieces beyond the next one are pre-generated and visible.
    pub preview_count: usize,
}

impl SessionConfig {
    /// The number of grid columns derived from the pixel dimensions.
    pub const fn grid_width(&self) -> usize {
        (self.width / self.cell_size) as usize
    }

    /// The number of grid rows derived from the pixel dimensions.
    pub const fn grid_height(&self) -> usize {
        (self.height / self.cell_size) as usize
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1600,
            cell_size: 80,
            max_lock_ticks: 180,
            soft_drop_factor: 15,
            preview_count: 1,
        }
    }
}

/// Read-only view of everything an adapter needs to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    /// The grid of settled cells.
    pub board: &'a Board,
    /// The piece in play, if the session has not ended.
    pub piece: Option<&'a ActivePiece>,
    /// The piece that will spawn next, for preview rendering.
    pub next_piece: PieceKind,
    /// The current score.
    pub score: u32,
    /// The current level.
    pub level: u32,
    /// Whether the session is over.
    pub ended: bool,
}

/// Source of per-tick player input, implemented by the embedding adapter.
///
/// Keeping input behind this seam means the engine never links a windowing or
/// terminal library, and tests can drive whole sessions from scripted inputs.
pub trait TickInputSource {
    /// Collects the input for the upcoming tick.
    fn poll(&mut self) -> TickInput;
}

/// Consumer of per-tick state snapshots, implemented by the embedding adapter.
pub trait FrameRenderer {
    /// Presents one frame of session state.
    fn frame(&mut self, snapshot: &Snapshot<'_>);
}

/// Main session struct representing a round of play.
#[derive(Debug)]
pub struct Session {
    /// Some internal configuration options of the `Session`.
    pub config: SessionConfig,
    seed: u64,
    state: State,
    phase: Phase,
}

impl Session {
    /// Creates a blank new template representing a yet-to-be-started [`Session`]
    /// ready for configuration.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// The value the session's PRNG was seeded with, for reproducing a round.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read accessor for the current session state.
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Mutable accessor for the current session state.
    ///
    /// Intended for adapters that rig or restore a round; regular play only
    /// mutates state through [`Session::update`].
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Read accessor for the current phase.
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether the session has ended, and whether it can continue to update.
    pub const fn ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Assembles the read-only view an adapter renders each frame.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: &self.state.board,
            piece: self.phase.piece(),
            next_piece: self.state.queue.next_up(),
            score: self.state.score,
            level: self.state.level,
            ended: self.ended(),
        }
    }

    /// Drives one tick through an input source and a renderer.
    ///
    /// The renderer is handed the post-update snapshot even when the update is
    /// rejected, so a frame showing the terminal state is still presented.
    pub fn step_with(
        &mut self,
        now: SessionTime,
        input: &mut impl TickInputSource,
        renderer: &mut impl FrameRenderer,
    ) -> Result<Vec<FeedbackMsg>, UpdateError> {
        let result = self.update(now, input.poll());
        renderer.frame(&self.snapshot());
        result
    }
}
