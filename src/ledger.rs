//! Who stands where next turn, and who has called dibs on what.
//!
//! The reservation set is rebuilt at the start of every turn and grows as
//! each unit's plan is finalized. Dibs outlive the turn: a unit keeps its
//! claim until it replans or dies.

use crate::constants::*;
use crate::geometry::*;
use crate::location::*;
use crate::snapshot::*;
use fnv::{FnvHashMap, FnvHashSet};

/// Holder of a next-turn reservation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Holder {
    /// An opponent facility tile, never enterable.
    Facility,
    Unit(UnitId),
}

#[derive(Clone, Debug, Default)]
pub struct ReservationLedger {
    occupied_next: FnvHashMap<Location, Holder>,
    next_tiles: FnvHashMap<UnitId, Location>,
    opp_factory_tiles: FnvHashSet<Location>,
    my_factory_tiles: FnvHashSet<Location>,
    light_dibs: FnvHashMap<UnitId, Location>,
    heavy_dibs: FnvHashMap<UnitId, Location>,
    attack_dibs: FnvHashMap<UnitId, Vec<Location>>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the reservation set for a new turn. Opponent footprints are
    /// reserved outright and units that cannot move hold their own tile.
    pub fn rebuild<'a>(
        &mut self,
        snapshot: &Snapshot,
        immobile: impl IntoIterator<Item = &'a Unit>,
    ) {
        self.occupied_next.clear();
        self.next_tiles.clear();

        self.opp_factory_tiles = snapshot
            .opp_factories
            .iter()
            .flat_map(|f| factory_tiles(f.pos))
            .collect();
        self.my_factory_tiles = snapshot
            .factories
            .iter()
            .flat_map(|f| factory_tiles(f.pos))
            .collect();

        for &tile in &self.opp_factory_tiles {
            self.occupied_next.insert(tile, Holder::Facility);
        }

        for unit in immobile {
            self.occupied_next.insert(unit.pos, Holder::Unit(unit.id));
            self.next_tiles.insert(unit.id, unit.pos);
        }
    }

    pub fn reserve(&mut self, tile: Location, holder: Holder) -> bool {
        match self.occupied_next.get(&tile) {
            Some(&existing) => existing == holder,
            None => {
                self.occupied_next.insert(tile, holder);
                true
            }
        }
    }

    /// Drop a reservation. Releasing a free tile is a no-op.
    pub fn release(&mut self, tile: Location) {
        self.occupied_next.remove(&tile);
    }

    pub fn is_reserved(&self, tile: Location) -> bool {
        self.occupied_next.contains_key(&tile)
    }

    /// Reserved by anything other than `unit`.
    pub fn is_reserved_by_other(&self, tile: Location, unit: UnitId) -> bool {
        match self.occupied_next.get(&tile) {
            Some(&Holder::Unit(holder)) => holder != unit,
            Some(&Holder::Facility) => true,
            None => false,
        }
    }

    /// Reserve the tile `unit` will stand on next turn, first releasing any
    /// tile it reserved earlier this turn. Returns false when someone else
    /// already holds the tile.
    pub fn reserve_next(&mut self, unit: UnitId, tile: Location) -> bool {
        if let Some(old) = self.next_tiles.remove(&unit) {
            if self.occupied_next.get(&old) == Some(&Holder::Unit(unit)) {
                self.occupied_next.remove(&old);
            }
        }

        let reserved = self.reserve(tile, Holder::Unit(unit));
        if reserved {
            self.next_tiles.insert(unit, tile);
        }
        reserved
    }

    pub fn next_tile(&self, unit: UnitId) -> Option<Location> {
        self.next_tiles.get(&unit).copied()
    }

    pub fn occupied(&self) -> FnvHashSet<Location> {
        self.occupied_next.keys().copied().collect()
    }

    pub fn is_opp_factory_tile(&self, tile: Location) -> bool {
        self.opp_factory_tiles.contains(&tile)
    }

    pub fn is_home_tile(&self, tile: Location) -> bool {
        self.my_factory_tiles.contains(&tile)
    }

    pub fn opp_factory_tiles(&self) -> &FnvHashSet<Location> {
        &self.opp_factory_tiles
    }

    pub fn my_factory_tiles(&self) -> &FnvHashSet<Location> {
        &self.my_factory_tiles
    }

    fn dibs(&self, class: UnitClass) -> &FnvHashMap<UnitId, Location> {
        match class {
            UnitClass::Light => &self.light_dibs,
            UnitClass::Heavy => &self.heavy_dibs,
        }
    }

    fn dibs_mut(&mut self, class: UnitClass) -> &mut FnvHashMap<UnitId, Location> {
        match class {
            UnitClass::Light => &mut self.light_dibs,
            UnitClass::Heavy => &mut self.heavy_dibs,
        }
    }

    /// Claim a harvest tile. Fails when another unit of the same class
    /// already holds it.
    pub fn claim_target(&mut self, class: UnitClass, unit: UnitId, tile: Location) -> bool {
        let taken = self
            .dibs(class)
            .iter()
            .any(|(&holder, &claimed)| claimed == tile && holder != unit);
        if taken {
            return false;
        }

        self.dibs_mut(class).insert(unit, tile);
        true
    }

    pub fn release_target(&mut self, class: UnitClass, unit: UnitId) {
        self.dibs_mut(class).remove(&unit);
    }

    pub fn target_of(&self, class: UnitClass, unit: UnitId) -> Option<Location> {
        self.dibs(class).get(&unit).copied()
    }

    /// Harvest tiles a unit of `class` must not pick. Lights also stay off
    /// tiles a heavy has claimed.
    pub fn claimed_tiles(&self, class: UnitClass) -> FnvHashSet<Location> {
        let mut tiles: FnvHashSet<Location> = self.heavy_dibs.values().copied().collect();
        if class == UnitClass::Light {
            tiles.extend(self.light_dibs.values().copied());
        }
        tiles
    }

    pub fn claim_attack_tiles(&mut self, unit: UnitId, tiles: Vec<Location>) {
        self.attack_dibs.insert(unit, tiles);
    }

    pub fn release_attack(&mut self, unit: UnitId) {
        self.attack_dibs.remove(&unit);
    }

    pub fn attack_tiles(&self, unit: UnitId) -> &[Location] {
        self.attack_dibs.get(&unit).map_or(&[][..], |tiles| tiles.as_slice())
    }

    /// Mutable access to a unit's attack run, for dropping finished tiles.
    pub fn attack_tiles_mut(&mut self, unit: UnitId) -> Option<&mut Vec<Location>> {
        self.attack_dibs.get_mut(&unit)
    }

    /// Every tile any attacker has already claimed.
    pub fn all_attack_tiles(&self) -> FnvHashSet<Location> {
        self.attack_dibs.values().flatten().copied().collect()
    }

    /// Forget every claim held by units that no longer exist.
    pub fn prune(&mut self, live: &FnvHashSet<UnitId>) {
        self.light_dibs.retain(|id, _| live.contains(id));
        self.heavy_dibs.retain(|id, _| live.contains(id));
        self.attack_dibs.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: u32, y: u32) -> Location {
        Location::from_coords(x, y)
    }

    #[test]
    fn replanning_releases_the_stale_tile() {
        let mut ledger = ReservationLedger::new();
        let unit = UnitId(1);

        assert!(ledger.reserve_next(unit, loc(3, 3)));
        assert!(ledger.reserve_next(unit, loc(3, 4)));
        assert!(!ledger.is_reserved(loc(3, 3)));
        assert!(ledger.is_reserved(loc(3, 4)));
        assert_eq!(ledger.next_tile(unit), Some(loc(3, 4)));
    }

    #[test]
    fn a_tile_has_one_holder() {
        let mut ledger = ReservationLedger::new();
        assert!(ledger.reserve_next(UnitId(1), loc(3, 3)));
        assert!(!ledger.reserve_next(UnitId(2), loc(3, 3)));
        assert!(ledger.is_reserved_by_other(loc(3, 3), UnitId(2)));
        assert!(!ledger.is_reserved_by_other(loc(3, 3), UnitId(1)));
    }

    #[test]
    fn double_release_is_a_no_op() {
        let mut ledger = ReservationLedger::new();
        ledger.reserve(loc(1, 1), Holder::Unit(UnitId(4)));
        ledger.release(loc(1, 1));
        ledger.release(loc(1, 1));
        assert!(!ledger.is_reserved(loc(1, 1)));
    }

    #[test]
    fn dibs_are_exclusive_per_class() {
        let mut ledger = ReservationLedger::new();
        let tile = loc(8, 8);

        assert!(ledger.claim_target(UnitClass::Light, UnitId(1), tile));
        assert!(!ledger.claim_target(UnitClass::Light, UnitId(2), tile));
        assert!(ledger.claim_target(UnitClass::Heavy, UnitId(3), tile));

        ledger.release_target(UnitClass::Light, UnitId(1));
        assert!(ledger.claim_target(UnitClass::Light, UnitId(2), tile));
    }

    #[test]
    fn lights_respect_heavy_claims() {
        let mut ledger = ReservationLedger::new();
        ledger.claim_target(UnitClass::Heavy, UnitId(3), loc(2, 2));
        ledger.claim_target(UnitClass::Light, UnitId(1), loc(4, 4));

        assert!(ledger.claimed_tiles(UnitClass::Light).contains(&loc(2, 2)));
        assert!(ledger.claimed_tiles(UnitClass::Light).contains(&loc(4, 4)));
        assert!(!ledger.claimed_tiles(UnitClass::Heavy).contains(&loc(4, 4)));
    }

    #[test]
    fn pruning_drops_dead_claims() {
        let mut ledger = ReservationLedger::new();
        ledger.claim_target(UnitClass::Heavy, UnitId(3), loc(2, 2));
        ledger.claim_attack_tiles(UnitId(5), vec![loc(9, 9)]);

        let live: FnvHashSet<UnitId> = [UnitId(5)].into_iter().collect();
        ledger.prune(&live);

        assert_eq!(ledger.target_of(UnitClass::Heavy, UnitId(3)), None);
        assert_eq!(ledger.attack_tiles(UnitId(5)), &[loc(9, 9)]);
    }
}
