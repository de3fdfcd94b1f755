/*!
A module that implements the two-dimensional boolean grid used to describe piece shapes.
*/

/// A rectangular grid of cells where `true` denotes a filled block of the piece.
///
/// Catalog shapes are stored in their canonical orientation; an active piece owns its
/// own (possibly rotated) copy. Rotation never mutates; it produces a new matrix.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeMatrix {
    rows: Vec<Vec<bool>>,
}

impl ShapeMatrix {
    /// Creates a shape matrix from its rows.
    ///
    /// All rows must have equal length and there must be at least one row.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        debug_assert!(!rows.is_empty());
        debug_assert!(rows.iter().all(|row| row.len() == rows[0].len()));
        Self { rows }
    }

    /// Creates a shape matrix from a borrowed catalog pattern.
    pub fn from_pattern(pattern: &[&[bool]]) -> Self {
        Self::from_rows(pattern.iter().map(|row| row.to_vec()).collect())
    }

    /// The number of columns of the matrix.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// The number of rows of the matrix.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Read accessor for the raw rows of the matrix.
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Iterates over the `(row, col)` positions of all filled cells.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, &filled)| filled.then_some((row, col)))
        })
    }

    /// Returns this shape turned by 90° clockwise as a new matrix.
    ///
    /// A matrix of `h` rows × `w` columns turns into one of `w` rows × `h` columns,
    /// where output cell `(r, c)` is input cell `(h - 1 - c, r)`.
    pub fn rotated_cw(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let rows = (0..w)
            .map(|r| (0..h).map(|c| self.rows[h - 1 - c][r]).collect())
            .collect();
        Self { rows }
    }
}
