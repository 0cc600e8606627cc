//! Nearest-tile queries and movement helpers over the board.
//!
//! Everything here is a pure function of the board and the positions passed
//! in. Ties are always broken by board scan order so repeated calls agree.

use crate::board::*;
use crate::location::*;
use crate::snapshot::*;
use fnv::FnvHashSet;
use itertools::Itertools;

/// Squared distance under which a light, cheap rubble tile is preferred over
/// any heavier tile that might be nearer.
const NEAR_RUBBLE_DISTANCE_SQ: u32 = 40;

/// Rubble level up to which a tile counts as cheap to clear.
const CHEAP_RUBBLE: u32 = 40;

const NEIGHBORS_8: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// The 3x3 footprint of a facility, center first.
pub fn factory_tiles(center: Location) -> Vec<Location> {
    std::iter::once(center)
        .chain(
            NEIGHBORS_8
                .iter()
                .filter_map(|&(dx, dy)| center.offset(dx, dy)),
        )
        .collect()
}

/// A tile and its in-bounds cardinal neighbours, the tile first.
pub fn cardinal_tiles(pos: Location) -> Vec<Location> {
    std::iter::once(pos).chain(pos.cardinal_neighbors()).collect()
}

/// Tiles two moves away: straight two-steps and diagonals.
pub fn second_level_tiles(pos: Location) -> Vec<Location> {
    [
        (0, 2),
        (2, 0),
        (0, -2),
        (-2, 0),
        (1, 1),
        (-1, 1),
        (1, -1),
        (-1, -1),
    ]
    .iter()
    .filter_map(|&(dx, dy)| pos.offset(dx, dy))
    .collect()
}

/// Cardinal tiles of `pos` that lie toward `target`: one tile when the two
/// share a row or column, the two flanking tiles otherwise.
pub fn cardinal_tiles_toward(pos: Location, target: Location) -> Vec<Location> {
    let dx = target.x() as i32 - pos.x() as i32;
    let dy = target.y() as i32 - pos.y() as i32;

    if dx == 0 && dy == 0 {
        return Vec::new();
    }

    if dx == 0 || dy == 0 {
        return pos.step(pos.direction_to(target)).into_iter().collect();
    }

    [(0, dy.signum()), (dx.signum(), 0)]
        .iter()
        .filter_map(|&(ox, oy)| pos.offset(ox, oy))
        .collect()
}

/// Nearest tile of `resource` by straight-line distance, skipping `off_limits`.
pub fn closest_resource_tile(
    board: &Board,
    resource: Resource,
    start: Location,
    off_limits: &FnvHashSet<Location>,
) -> Option<Location> {
    board
        .resource_tiles(resource)
        .filter(|tile| !off_limits.contains(tile))
        .min_by_key(|tile| start.distance_sq(*tile))
}

/// Nearest rubble tile to clear. Cheap tiles close by win; otherwise the
/// nearest tile with any rubble at all.
pub fn closest_rubble_tile(
    board: &Board,
    start: Location,
    off_limits: &FnvHashSet<Location>,
) -> Option<Location> {
    let candidates = || {
        board
            .rubble
            .iter()
            .filter(|(loc, &rubble)| rubble > 0 && !off_limits.contains(loc))
    };

    let cheap = candidates()
        .filter(|(_, &rubble)| rubble <= CHEAP_RUBBLE)
        .map(|(loc, _)| loc)
        .min_by_key(|loc| start.distance_sq(*loc));

    match cheap {
        Some(tile) if start.distance_sq(tile) < NEAR_RUBBLE_DISTANCE_SQ => Some(tile),
        _ => candidates()
            .map(|(loc, _)| loc)
            .min_by_key(|loc| start.distance_sq(*loc)),
    }
}

/// Strains worth concentrating attacks on: opponent strains claiming at
/// least `min_tiles` lichen tiles, largest first.
pub fn priority_strains(board: &Board, opp_strains: &[i32], min_tiles: usize) -> Vec<i32> {
    board
        .lichen_strains
        .iter()
        .filter_map(|(loc, _)| board.strain_at(loc))
        .filter(|strain| opp_strains.contains(strain))
        .counts()
        .into_iter()
        .filter(|&(_, count)| count >= min_tiles)
        .sorted_by_key(|&(strain, count)| (std::cmp::Reverse(count), strain))
        .map(|(strain, _)| strain)
        .collect()
}

/// Nearest tile (Manhattan) carrying opponent lichen, skipping `off_limits`.
///
/// With `priority` set, only the opponent's largest qualifying strain is
/// considered; when no strain qualifies every opponent strain is.
pub fn closest_opp_lichen(
    board: &Board,
    opp_strains: &[i32],
    start: Location,
    off_limits: &FnvHashSet<Location>,
    priority: Option<usize>,
) -> Option<Location> {
    let targets: Vec<i32> = match priority {
        Some(min_tiles) => {
            let largest = priority_strains(board, opp_strains, min_tiles);
            match largest.first() {
                Some(&strain) => vec![strain],
                None => opp_strains.to_vec(),
            }
        }
        None => opp_strains.to_vec(),
    };

    board
        .lichen_strains
        .iter()
        .map(|(loc, _)| loc)
        .filter(|loc| !off_limits.contains(loc))
        .filter(|&loc| board.strain_at(loc).map_or(false, |s| targets.contains(&s)))
        .min_by_key(|loc| start.distance_to(*loc))
}

/// Footprint tile of the facility at `center` nearest to `pos`, avoiding
/// `avoid`. Falls back to the center when every tile is taken.
pub fn closest_factory_tile(
    center: Location,
    pos: Location,
    avoid: &FnvHashSet<Location>,
) -> Location {
    factory_tiles(center)
        .into_iter()
        .filter(|tile| !avoid.contains(tile))
        .min_by_key(|tile| pos.distance_to(*tile))
        .unwrap_or(center)
}

/// Facility whose center is nearest to `pos`.
pub fn closest_factory(factories: &[Factory], pos: Location) -> Option<&Factory> {
    factories.iter().min_by_key(|f| f.pos.distance_sq(pos))
}

pub fn can_stay(pos: Location, off_limits: &FnvHashSet<Location>) -> bool {
    !off_limits.contains(&pos)
}

/// Direction preference when the straight step toward `target` is blocked:
/// the primary axis first, then the two sideways steps, then backing off.
fn fallback_order(pos: Location, target: Location) -> [Direction; 4] {
    use Direction::*;

    let dx = target.x() as i32 - pos.x() as i32;
    let dy = target.y() as i32 - pos.y() as i32;

    match (dx.signum(), dy.signum()) {
        (1, 0) => [Right, Down, Up, Left],
        (-1, 0) => [Left, Up, Down, Right],
        (0, 1) => [Down, Right, Left, Up],
        (0, -1) => [Up, Left, Right, Down],
        (1, 1) => [Down, Right, Left, Up],
        (1, -1) => [Right, Up, Left, Down],
        (-1, 1) => [Down, Left, Right, Up],
        (-1, -1) => [Left, Up, Right, Down],
        _ => Direction::CARDINAL,
    }
}

/// First in-bounds direction from `pos` that avoids `off_limits`, favouring
/// moves toward `target`. `Center` when boxed in.
pub fn find_new_direction(
    pos: Location,
    target: Location,
    off_limits: &FnvHashSet<Location>,
) -> Direction {
    fallback_order(pos, target)
        .into_iter()
        .find(|&d| pos.step(d).map_or(false, |next| !off_limits.contains(&next)))
        .unwrap_or(Direction::Center)
}

/// Step toward `target` (or in `desired` when given), detouring when the
/// step would land on an off-limits tile or leave the board.
pub fn move_toward(
    pos: Location,
    target: Location,
    off_limits: &FnvHashSet<Location>,
    desired: Option<Direction>,
) -> Direction {
    let direction = desired.unwrap_or_else(|| pos.direction_to(target));

    match pos.step(direction) {
        Some(next) if !off_limits.contains(&next) => direction,
        _ => find_new_direction(pos, target, off_limits),
    }
}

/// Count of ice and ore tiles within `radius` of `center` that no other
/// facility is strictly closer to.
pub fn nearby_resources(
    board: &Board,
    center: Location,
    factory_centers: &[Location],
    radius: u32,
) -> (usize, usize) {
    let others: Vec<Location> = factory_centers
        .iter()
        .copied()
        .filter(|&c| c != center)
        .collect();

    let count = |resource: Resource| {
        board
            .resource_tiles(resource)
            .filter(|&tile| {
                let distance = center.distance_to(tile);
                distance < radius && others.iter().all(|o| o.distance_to(tile) >= distance)
            })
            .count()
    };

    (count(Resource::Ice), count(Resource::Ore))
}
