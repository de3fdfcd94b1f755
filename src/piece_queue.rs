/*!
This module handles random generation of upcoming [`PieceKind`]s.
*/

use std::collections::VecDeque;

use rand::Rng;

use crate::PieceKind;

/// The buffer of upcoming pieces, kept at a constant depth.
///
/// The queue always holds the piece about to spawn plus a fixed number of preview
/// pieces behind it. Draws are uniform over the seven catalog entries and
/// independent of each other; the same kind may repeat arbitrarily often.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceQueue {
    upcoming: VecDeque<PieceKind>,
}

impl PieceQueue {
    /// Creates a queue pre-filled with `1 + preview_count` freshly drawn pieces.
    pub fn new(preview_count: usize, rng: &mut impl Rng) -> Self {
        let upcoming = (0..=preview_count).map(|_| draw_uniform(rng)).collect();
        Self { upcoming }
    }

    /// Removes and returns the next piece to spawn, appending one fresh draw to
    /// keep the buffer depth constant.
    pub fn pop(&mut self, rng: &mut impl Rng) -> PieceKind {
        let next = self
            .upcoming
            .pop_front()
            .unwrap_or_else(|| draw_uniform(rng));
        self.upcoming.push_back(draw_uniform(rng));
        next
    }

    /// The piece that will spawn after the active one, for preview rendering.
    ///
    /// Does not consume the piece.
    pub fn next_up(&self) -> PieceKind {
        self.upcoming[0]
    }

    /// Iterates over all buffered upcoming pieces, soonest first.
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.upcoming.iter().copied()
    }

    /// The constant buffer depth of the queue.
    pub fn depth(&self) -> usize {
        self.upcoming.len()
    }
}

fn draw_uniform(rng: &mut impl Rng) -> PieceKind {
    PieceKind::VARIANTS[rng.random_range(0..=6)]
}
