/*!
This module handles creation / initialization / building of [`Session`]s.
*/

use rand::Rng as _;
use rand_chacha::rand_core::SeedableRng;

use super::*;

/// This builder exposes the ability to configure a new [`Session`] to varying degrees.
///
/// Generally speaking, when using `SessionBuilder`, you'll first call
/// [`SessionBuilder::new`] or [`Session::builder`], then chain calls to methods to
/// set each option, then call [`SessionBuilder::build`]. The `SessionBuilder` is
/// not used up and its configuration can be re-used to initialize more [`Session`]s.
#[derive(Eq, PartialEq, Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionBuilder {
    /// The configuration options that will be set for the session.
    pub config: SessionConfig,
    /// The value to seed the session's PRNG with.
    pub seed: Option<u64>,
}

impl SessionBuilder {
    /// Creates a blank new template representing a yet-to-be-started [`Session`]
    /// ready for configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Session`] with the information specified by `self`.
    ///
    /// The first piece is popped from the queue and spawned immediately, so the
    /// returned session is ready to [`update`](Session::update).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the grid geometry is malformed (zero cell
    /// size, pixel dimensions not divisible by the cell size, or an empty derived
    /// grid) or when the soft-drop factor or preview depth is zero.
    pub fn build(&self) -> Result<Session, ConfigError> {
        let config = self.config;
        if config.cell_size == 0 {
            return Err(ConfigError::ZeroCellSize);
        }
        if config.width % config.cell_size != 0 || config.height % config.cell_size != 0 {
            return Err(ConfigError::UnevenGrid {
                width: config.width,
                height: config.height,
                cell_size: config.cell_size,
            });
        }
        if config.grid_width() == 0 || config.grid_height() == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if config.soft_drop_factor == 0 {
            return Err(ConfigError::ZeroSoftDropFactor);
        }
        if config.preview_count == 0 {
            return Err(ConfigError::ZeroPreview);
        }

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = SessionRng::seed_from_u64(seed);
        let mut queue = PieceQueue::new(config.preview_count, &mut rng);
        let board = Board::new(config.grid_width(), config.grid_height());

        let first = queue.pop(&mut rng);
        let piece = session_update::spawn_piece(first, board.width());
        // An empty board can still reject the spawn (e.g. a grid narrower than
        // the piece), which makes the session terminal from the start.
        let phase = if board.is_valid(&piece.shape, piece.x, piece.y) {
            Phase::PieceInPlay { piece }
        } else {
            Phase::Ended
        };

        Ok(Session {
            config,
            seed,
            state: State {
                time: Duration::ZERO,
                rng,
                queue,
                board,
                last_fall: Duration::ZERO,
                score: 0,
                level: 0,
                level_lines: 0,
            },
            phase,
        })
    }

    /// Sets the whole [`SessionConfig`] that will be used by the [`Session`].
    pub fn config(&mut self, x: SessionConfig) -> &mut Self {
        self.config = x;
        self
    }

    /// Board pixel width, height, and grid cell size, from which the logical grid
    /// dimensions are derived by integer division.
    pub fn dimensions(&mut self, width: u32, height: u32, cell_size: u32) -> &mut Self {
        self.config.width = width;
        self.config.height = height;
        self.config.cell_size = cell_size;
        self
    }

    /// How many ticks a resting piece may accumulate before it locks.
    pub fn max_lock_ticks(&mut self, x: u32) -> &mut Self {
        self.config.max_lock_ticks = x;
        self
    }

    /// How many times faster than normal a piece falls while soft drop is held.
    pub fn soft_drop_factor(&mut self, x: u32) -> &mut Self {
        self.config.soft_drop_factor = x;
        self
    }

    /// How many pieces beyond the next one are pre-generated and visible.
    pub fn preview_count(&mut self, x: usize) -> &mut Self {
        self.config.preview_count = x;
        self
    }

    /// The value to seed the session's PRNG with.
    pub fn seed(&mut self, x: u64) -> &mut Self {
        self.seed = Some(x);
        self
    }
}
