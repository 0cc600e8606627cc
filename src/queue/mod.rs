//! Action-queue synthesis.
//!
//! A [`QueueBuilder`] turns one unit, one task and one facility into a
//! concrete, power-checked plan. Builders record claims and in-flight tasks
//! on success but never commit a plan; the dispatcher decides which plan a
//! unit finally runs.

mod aggro;
mod attack;
mod evasion;
mod helper;
mod mining;
mod recharge;
mod solar;
mod transfer;
mod waiting;

pub use mining::MiningTarget;
pub use recharge::daylight_turns_needed;

use crate::action::*;
use crate::board::*;
use crate::config::*;
use crate::constants::*;
use crate::context::*;
use crate::geometry::*;
use crate::location::*;
use crate::needs::{LaneKind, Task};
use crate::pathing::*;
use crate::snapshot::*;
use fnv::FnvHashSet;
use thiserror::Error;

/// Why a builder could not produce a plan. Always handled by the caller's
/// fallback chain.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum Infeasible {
    #[error("no target tile available")]
    NoTarget,
    #[error("no path to the target")]
    NoPath,
    #[error("not enough power")]
    InsufficientPower,
    #[error("every way out is taken")]
    Blocked,
}

pub type BuildResult = Result<ActionQueue, Infeasible>;

pub struct QueueBuilder<'c, 'a> {
    pub ctx: &'c mut TurnContext<'a>,
    pub unit: &'a Unit,
    pub factory: &'a Factory,
}

impl<'c, 'a> QueueBuilder<'c, 'a> {
    pub fn new(ctx: &'c mut TurnContext<'a>, unit: &'a Unit, factory: &'a Factory) -> Self {
        QueueBuilder { ctx, unit, factory }
    }

    fn tuning(&self) -> &'a Tuning {
        self.ctx.tuning
    }

    fn board(&self) -> &'a Board {
        self.ctx.board()
    }

    fn class(&self) -> UnitClass {
        self.unit.class
    }

    pub fn state(&self) -> UnitState {
        self.ctx.memory.state(self.unit.id)
    }

    pub fn set_state(&mut self, state: UnitState) {
        self.ctx.memory.set_state(self.unit.id, state);
    }

    pub fn clear_previous_task(&mut self) {
        self.ctx.memory.clear_task(self.unit.id);
    }

    /// Drop this unit's harvest and attack claims.
    pub fn clear_dibs(&mut self) {
        let ledger = &mut self.ctx.memory.ledger;
        ledger.release_target(self.unit.class, self.unit.id);
        ledger.release_attack(self.unit.id);
    }

    /// Start a fresh plan: new state, no task, no claims.
    fn begin(&mut self, state: UnitState) {
        self.set_state(state);
        self.clear_dibs();
        self.clear_previous_task();
    }

    fn record_task(&mut self, task: Task) {
        let (unit, class) = (self.unit.id, self.unit.class);
        self.ctx
            .factory_memory(self.factory.id)
            .tasks_mut(class)
            .insert(unit, task);
    }

    /// Reserved tiles, minus whatever this unit itself holds.
    fn occupied(&self) -> FnvHashSet<Location> {
        let mut occupied = self.ctx.memory.ledger.occupied();
        if let Some(own) = self.ctx.memory.ledger.next_tile(self.unit.id) {
            occupied.remove(&own);
        }
        occupied
    }

    /// Soft obstacles for this unit's searches. Lights also give opponent
    /// heavies and the tiles around them a wide berth.
    fn excluded_tiles(&self, avoid: Option<&FnvHashSet<Location>>) -> FnvHashSet<Location> {
        let mut excluded = match avoid {
            Some(tiles) => tiles.clone(),
            None => self.occupied(),
        };

        if self.class() == UnitClass::Light {
            for opp in self.ctx.snapshot.opp_units.iter().filter(|u| u.is_heavy()) {
                excluded.extend(cardinal_tiles(opp.pos));
            }
        }

        excluded
    }

    pub fn path_to(
        &self,
        start: Location,
        goal: Location,
        avoid: Option<&FnvHashSet<Location>>,
    ) -> Vec<Location> {
        let excluded = self.excluded_tiles(avoid);
        let threshold = self.tuning().pathing.rubble_threshold(self.class());

        self.ctx.grid().find_path(
            start,
            goal,
            &excluded,
            self.ctx.memory.ledger.opp_factory_tiles(),
            threshold,
        )
    }

    pub fn path_cost(&self, path: &[Location]) -> u32 {
        path_cost(self.class(), path, &self.board().rubble)
    }

    /// Positions of our other heavies, which get first call on facility tiles.
    fn other_heavies(&self) -> FnvHashSet<Location> {
        self.ctx
            .snapshot
            .heavies()
            .filter(|u| u.id != self.unit.id)
            .map(|u| u.pos)
            .collect()
    }

    /// Facility tile to come home to from `from`.
    pub fn return_tile(&self, from: Location) -> Location {
        closest_factory_tile(self.factory.pos, from, &self.other_heavies())
    }

    /// Affordable dig repeats, capped by what the tile holds and, for
    /// resource tiles, by the room left in cargo.
    pub fn number_of_digs(
        &self,
        power: u32,
        movement_cost: u32,
        tile_amount: Option<u32>,
        carried: u32,
    ) -> u32 {
        let class = self.class();
        let mut digs = power.saturating_sub(movement_cost) / class.dig_cost();

        match tile_amount {
            Some(amount) => {
                let rate = class.dig_rubble_removed();
                digs = digs.min((amount + rate - 1) / rate);
            }
            None => {
                let room = class.cargo_capacity().saturating_sub(carried);
                digs = digs.min(room / class.dig_resource_gain());
            }
        }

        digs
    }

    /// Direction to hand cargo to the home facility from `pos`, if the unit
    /// stands on or next to it, carries ice or ore, and its tile is not
    /// spoken for.
    pub fn transfer_ready(&self, pos: Location) -> Option<Direction> {
        if self.unit.cargo.raw_total() == 0 {
            return None;
        }
        if self.ctx.memory.ledger.is_reserved_by_other(pos, self.unit.id) {
            return None;
        }

        let tile = self.return_tile(pos);
        if pos == tile {
            Some(Direction::Center)
        } else if pos.is_adjacent(tile) {
            Some(pos.direction_to(tile))
        } else {
            None
        }
    }

    /// Cargo handed over on arrival. Lights empty out; heavies keep ice and
    /// ore back unless the facility is short or they are nearly full.
    pub fn transfer_actions(&self, direction: Direction) -> ActionQueue {
        let cargo = self.unit.cargo;
        let stock = self.factory.cargo;
        let mut queue = ActionQueue::new();

        let (give_ice, give_ore) = match self.class() {
            UnitClass::Light => (cargo.ice > 0, cargo.ore > 0),
            UnitClass::Heavy => (
                (cargo.ice > 200 && stock.water < 200) || cargo.ice > 900,
                (cargo.ore > 0 && stock.metal < 100) || cargo.ore > 500,
            ),
        };

        if give_ice {
            queue.push(Action::transfer(direction, CargoSlot::Ice, cargo.ice));
        }
        if give_ore {
            queue.push(Action::transfer(direction, CargoSlot::Ore, cargo.ore));
        }
        queue
    }

    /// Power to take from the home facility without draining it.
    pub fn pickup_amount(&self) -> u32 {
        let power = &self.tuning().power;
        let room = self
            .class()
            .battery_capacity()
            .saturating_sub(self.unit.power);
        let available = self.factory.power;

        match self.class() {
            UnitClass::Light => {
                if available > self.class().battery_capacity() {
                    room
                } else {
                    room.min(available.saturating_sub(power.light_pickup_floor))
                }
            }
            UnitClass::Heavy => power
                .heavy_pickup_floors
                .iter()
                .find(|tier| available <= tier.ceiling)
                .map_or(room, |tier| {
                    room.min(available.saturating_sub(tier.floor))
                }),
        }
    }

    /// Power to reach the nearest free facility tile, cached per unit for
    /// the rest of the turn. Unreachable homes cost everything.
    pub fn cost_home(&mut self) -> u32 {
        if let Some(&cost) = self.ctx.cost_home.get(&self.unit.id) {
            return cost;
        }

        let tile = self.return_tile(self.unit.pos);
        let path = self.path_to(self.unit.pos, tile, None);
        let cost = if path.is_empty() {
            u32::MAX
        } else {
            self.path_cost(&path)
        };

        self.ctx.cost_home.insert(self.unit.id, cost);
        cost
    }

    /// Whether the unit should head home before doing anything else.
    /// Units mining next to their facility run down to the adjacent reserve.
    pub fn need_recharge(&mut self) -> bool {
        let reserve = match self.ctx.memory.state(self.unit.id) {
            UnitState::MiningAdjacent => self.tuning().reserve.adjacent(self.class()),
            _ => self.tuning().reserve.low(self.class()),
        };
        self.unit.power <= self.cost_home().saturating_add(reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn light_pickup_never_drains_a_poor_facility() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 120, 500)
            .light(1, loc(10, 11), 40)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.pickup_amount(), 70);
    }

    #[test]
    fn heavy_pickup_follows_the_floor_ladder() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 2000, 500)
            .heavy(1, loc(10, 11), 100)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.pickup_amount(), 1500);
    }

    #[test]
    fn adjacent_miners_keep_working_on_a_thin_reserve() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 12), 80)
            .build();
        let tuning = Tuning::default();
        let unit = &snapshot.units[0];

        // One step home costs 20: 80 is under 20 + 100 but above 20 + 25.
        let mut memory = Memory::default();
        memory.set_state(unit.id, UnitState::Mining);
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
        assert!(builder.need_recharge());

        let mut memory = Memory::default();
        memory.set_state(unit.id, UnitState::MiningAdjacent);
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
        assert!(!builder.need_recharge());
    }

    #[test]
    fn digs_are_capped_by_rubble_and_cargo() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 1000, 500)
            .light(1, loc(10, 14), 150)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.number_of_digs(150, 25, None, 0), 25);
        assert_eq!(builder.number_of_digs(150, 25, Some(7), 0), 4);
        assert_eq!(builder.number_of_digs(150, 25, None, 90), 5);
        assert_eq!(builder.number_of_digs(20, 25, None, 0), 0);
    }

    #[test]
    fn heavies_hold_cargo_unless_the_facility_is_short() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 1000, 500)
            .heavy_with_cargo(1, loc(10, 12), 1000, 300, 40)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.transfer_ready(loc(10, 12)), Some(Direction::Up));
        let queue = builder.transfer_actions(Direction::Up);
        assert_eq!(
            queue.actions(),
            &[Action::transfer(Direction::Up, CargoSlot::Ore, 40)]
        );
    }
}
