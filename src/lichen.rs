//! Lichen growth room and the rubble standing in its way.

use crate::board::*;
use crate::config::NeedsConfig;
use crate::geometry::*;
use crate::location::*;
use fnv::FnvHashSet;
use itertools::Itertools;

/// Rubble level up to which a tile blocking growth is quick to clear.
const QUICK_CLEAR_RUBBLE: u32 = 30;

fn own_lichen(board: &Board, strain: i32) -> impl Iterator<Item = Location> + '_ {
    board
        .lichen_strains
        .iter()
        .map(|(loc, _)| loc)
        .filter(move |&loc| board.strain_at(loc) == Some(strain))
}

/// Whether a facility's lichen has run out of room to spread.
///
/// Lichen is boxed in when most of it has grown dense, which happens once it
/// presses against another strain, or when too few rubble-free tiles border
/// it. Returns the verdict and the number of free bordering tiles.
pub fn lichen_surrounded(
    board: &Board,
    strain: i32,
    opp_strains: &[i32],
    off_limits: &FnvHashSet<Location>,
    config: &NeedsConfig,
) -> (bool, usize) {
    let tiles: Vec<Location> = own_lichen(board, strain).collect();

    if !tiles.is_empty() {
        let dense = tiles
            .iter()
            .filter(|&&loc| board.lichen.at(loc) > config.crowded_lichen_level)
            .count();
        if dense as f32 / tiles.len() as f32 > config.crowded_fraction {
            return (true, 0);
        }
    }

    let free_spaces = tiles
        .iter()
        .flat_map(|loc| loc.cardinal_neighbors())
        .filter(|n| !off_limits.contains(n))
        .filter(|&n| board.rubble_at(n) == 0)
        .filter(|&n| match board.strain_at(n) {
            Some(s) => opp_strains.contains(&s),
            None => true,
        })
        .count();

    (free_spaces < config.surrounded_free_spaces, free_spaces)
}

/// Rubble tiles bordering a strain's lichen, in scan order without repeats.
pub fn next_positions_to_clear(
    board: &Board,
    strain: i32,
    off_limits: &FnvHashSet<Location>,
) -> Vec<Location> {
    own_lichen(board, strain)
        .flat_map(|loc| loc.cardinal_neighbors())
        .filter(|n| !off_limits.contains(n))
        .filter(|&n| board.rubble_at(n) > 0)
        .unique()
        .collect()
}

/// Best tile to clear among `candidates`: the quick-to-clear tile nearest
/// `origin`, otherwise whichever carries the least rubble.
pub fn lowest_rubble_position(
    board: &Board,
    candidates: &[Location],
    off_limits: &FnvHashSet<Location>,
    origin: Location,
) -> Option<Location> {
    let open: Vec<Location> = candidates
        .iter()
        .copied()
        .filter(|loc| !off_limits.contains(loc))
        .filter(|&loc| board.rubble_at(loc) > 0)
        .collect();

    open.iter()
        .copied()
        .filter(|&loc| board.rubble_at(loc) <= QUICK_CLEAR_RUBBLE)
        .min_by_key(|loc| origin.distance_sq(*loc))
        .or_else(|| open.iter().copied().min_by_key(|&loc| board.rubble_at(loc)))
}

/// Rubble tiles exactly `n` steps (Manhattan) outside a facility footprint.
pub fn orthogonal_positions(
    board: &Board,
    center: Location,
    n: i32,
    off_limits: &FnvHashSet<Location>,
) -> Vec<Location> {
    factory_tiles(center)
        .into_iter()
        .flat_map(|border| {
            (-n..=n)
                .flat_map(move |dx| (-n..=n).map(move |dy| (dx, dy)))
                .filter(|(dx, dy)| dx.abs() + dy.abs() == n)
                .filter_map(move |(dx, dy)| border.offset(dx, dy))
        })
        .filter(|loc| !off_limits.contains(loc))
        .filter(|&loc| board.rubble_at(loc) > 0)
        .sorted()
        .dedup()
        .collect()
}

pub fn total_rubble(board: &Board, tiles: &[Location]) -> u32 {
    tiles.iter().map(|&loc| board.rubble_at(loc)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: u32, y: u32) -> Location {
        Location::from_coords(x, y)
    }

    fn grow(board: &mut Board, strain: i32, tiles: &[Location], amount: u32) {
        for &tile in tiles {
            board.lichen_strains.set_at(tile, strain);
            board.lichen.set_at(tile, amount);
        }
    }

    #[test]
    fn open_lichen_is_not_surrounded() {
        let mut board = Board::empty();
        let row: Vec<Location> = (10..16).map(|x| loc(x, 10)).collect();
        grow(&mut board, 0, &row, 5);
        let (surrounded, free) = lichen_surrounded(
            &board,
            0,
            &[1],
            &FnvHashSet::default(),
            &NeedsConfig::default(),
        );
        assert!(!surrounded);
        assert_eq!(free, 14);
    }

    #[test]
    fn lichen_hemmed_in_by_rubble_is_surrounded() {
        let mut board = Board::empty();
        board.rubble = BoardArray::new(50);
        let lichen = [loc(10, 10), loc(10, 11)];
        for &tile in &[lichen[0], lichen[1], loc(10, 9), loc(10, 12)] {
            board.rubble.set_at(tile, 0);
        }
        grow(&mut board, 0, &lichen, 5);

        let (surrounded, free) = lichen_surrounded(
            &board,
            0,
            &[1],
            &FnvHashSet::default(),
            &NeedsConfig::default(),
        );
        assert!(surrounded);
        assert_eq!(free, 2);
    }

    #[test]
    fn dense_lichen_counts_as_surrounded() {
        let mut board = Board::empty();
        grow(&mut board, 0, &[loc(10, 10), loc(10, 11)], 90);
        let (surrounded, _) = lichen_surrounded(
            &board,
            0,
            &[1],
            &FnvHashSet::default(),
            &NeedsConfig::default(),
        );
        assert!(surrounded);
    }

    #[test]
    fn clearing_candidates_border_the_lichen() {
        let mut board = Board::empty();
        grow(&mut board, 0, &[loc(10, 10), loc(10, 11)], 5);
        board.rubble.set_at(loc(9, 10), 60);
        board.rubble.set_at(loc(11, 11), 12);
        board.rubble.set_at(loc(20, 20), 1);

        let positions = next_positions_to_clear(&board, 0, &FnvHashSet::default());
        assert_eq!(positions.len(), 2);
        assert!(!positions.contains(&loc(20, 20)));

        let best = lowest_rubble_position(&board, &positions, &FnvHashSet::default(), loc(10, 10));
        assert_eq!(best, Some(loc(11, 11)));
    }

    #[test]
    fn heavy_only_candidates_pick_least_rubble() {
        let mut board = Board::empty();
        board.rubble.set_at(loc(3, 3), 80);
        board.rubble.set_at(loc(4, 4), 50);
        let best = lowest_rubble_position(
            &board,
            &[loc(3, 3), loc(4, 4)],
            &FnvHashSet::default(),
            loc(3, 2),
        );
        assert_eq!(best, Some(loc(4, 4)));
    }

    #[test]
    fn ring_around_footprint() {
        let mut board = Board::empty();
        board.rubble.set_at(loc(10, 12), 10);
        board.rubble.set_at(loc(12, 12), 10);
        board.rubble.set_at(loc(10, 13), 10);
        let footprint: FnvHashSet<Location> = factory_tiles(loc(10, 10)).into_iter().collect();

        let ring = orthogonal_positions(&board, loc(10, 10), 1, &footprint);
        assert_eq!(ring, vec![loc(10, 12)]);
        assert_eq!(total_rubble(&board, &ring), 10);
    }
}
