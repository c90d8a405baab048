//! Connected-texture side resolution.
//!
//! A connected texture is a 4×4 atlas of 16×16 cells. Which cell is drawn
//! depends on which of the four cardinal neighbours the tile joins with.

use atoll_common::coords::TilePos;

use crate::tile::{TileKind, TileView};

/// Which cardinal neighbours a tile joins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    /// Joins the tile to the left
    pub left: bool,
    /// Joins the tile to the right
    pub right: bool,
    /// Joins the tile above
    pub top: bool,
    /// Joins the tile below
    pub bottom: bool,
}

/// Atlas cell `(column, row)` for each side mask
/// (`left = 1, right = 2, top = 4, bottom = 8`).
///
/// Columns encode horizontal joins (none, right only, both, left only); rows
/// encode vertical joins (none, bottom only, both, top only).
pub const SIDE_TABLE: [(u32, u32); 16] = [
    (0, 0),
    (3, 0),
    (1, 0),
    (2, 0),
    (0, 3),
    (3, 3),
    (1, 3),
    (2, 3),
    (0, 1),
    (3, 1),
    (1, 1),
    (2, 1),
    (0, 2),
    (3, 2),
    (1, 2),
    (2, 2),
];

impl Sides {
    /// Joined on every side.
    pub const ALL: Self = Self {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };

    /// Joined on no side.
    pub const NONE: Self = Self {
        left: false,
        right: false,
        top: false,
        bottom: false,
    };

    /// Bit mask of the joined sides.
    #[must_use]
    pub const fn mask(self) -> u8 {
        (self.left as u8) | (self.right as u8) << 1 | (self.top as u8) << 2 | (self.bottom as u8) << 3
    }

    /// Sides from a bit mask.
    #[must_use]
    pub const fn from_mask(mask: u8) -> Self {
        Self {
            left: mask & 1 != 0,
            right: mask & 2 != 0,
            top: mask & 4 != 0,
            bottom: mask & 8 != 0,
        }
    }

    /// Atlas cell for these sides.
    #[must_use]
    pub const fn atlas_cell(self) -> (u32, u32) {
        SIDE_TABLE[self.mask() as usize]
    }
}

/// Resolves the joined sides of the tile at `pos`.
///
/// Neighbours that are not resident count as not joined; a chunk arriving
/// later triggers a redraw of its neighbours.
#[must_use]
pub fn resolve_sides(pos: TilePos, connects_to: &[TileKind], view: &dyn TileView) -> Sides {
    let [left, right, top, bottom] = pos.neighbors4().map(|neighbor| {
        view.peek_block(neighbor)
            .is_some_and(|tile| connects_to.contains(&tile.kind()))
    });
    Sides {
        left,
        right,
        top,
        bottom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_a_permutation_of_the_atlas() {
        let mut cells = SIDE_TABLE.to_vec();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), 16);
        assert!(cells.iter().all(|&(col, row)| col < 4 && row < 4));
    }

    #[test]
    fn test_mask_round_trip_and_landmarks() {
        for mask in 0..16u8 {
            assert_eq!(Sides::from_mask(mask).mask(), mask);
        }
        assert_eq!(Sides::NONE.atlas_cell(), (0, 0));
        assert_eq!(Sides::ALL.atlas_cell(), (2, 2));
        let right_only = Sides {
            right: true,
            ..Sides::NONE
        };
        assert_eq!(right_only.atlas_cell(), (1, 0));
    }
}
