//! Harvesting ice and ore, and clearing rubble.

use super::*;
use crate::lichen::*;
use log::*;

/// What a mining trip digs.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MiningTarget {
    /// Nearest unclaimed tile of the resource.
    Resource(Resource),
    /// A specific rubble tile.
    Rubble(Location),
}

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Walk to a harvest tile and dig as long as the round trip home stays
    /// affordable. Falls back to a recharge when the unit is too drained to
    /// make the trip worthwhile.
    pub fn build_mining_queue(&mut self, target: MiningTarget, task: Task) -> BuildResult {
        self.begin(UnitState::Mining);

        let class = self.class();
        let pos = self.unit.pos;

        if self.unit.cargo.raw_total() >= class.cargo_capacity() {
            let fullest = if self.unit.cargo.ice >= self.unit.cargo.ore {
                Resource::Ice
            } else {
                Resource::Ore
            };
            return self.build_delivery_queue(fullest);
        }

        let mut queue = ActionQueue::new();
        let mut carried = self.unit.cargo.raw_total();
        if let Some(direction) = self.transfer_ready(pos) {
            let handover = self.transfer_actions(direction);
            for action in handover.actions() {
                if let ActionKind::Transfer { amount, .. } = action.kind {
                    carried = carried.saturating_sub(amount);
                }
            }
            queue.extend(handover);
        }

        let claimed = self.ctx.memory.ledger.claimed_tiles(class);
        let (tile, tile_amount) = match target {
            MiningTarget::Resource(resource) => {
                let tile = closest_resource_tile(self.board(), resource, pos, &claimed)
                    .ok_or(Infeasible::NoTarget)?;
                (tile, None)
            }
            MiningTarget::Rubble(tile) => {
                if claimed.contains(&tile) {
                    return Err(Infeasible::NoTarget);
                }
                (tile, Some(self.board().rubble_at(tile)))
            }
        };

        let path_to = self.path_to(pos, tile, None);
        if path_to.is_empty() {
            return Err(Infeasible::NoPath);
        }

        if path_to.len() <= 1 && self.ctx.memory.ledger.is_reserved_by_other(pos, self.unit.id) {
            let direction = move_toward(pos, tile, &self.occupied(), None);
            if direction == Direction::Center {
                return Err(Infeasible::Blocked);
            }
            return Ok(ActionQueue::single(Action::move_to(direction)));
        }

        let return_tile = self.return_tile(tile);
        let adjacent = tile.is_adjacent(return_tile) || tile == return_tile;
        let path_back = self.path_to(tile, return_tile, None);
        if path_back.is_empty() {
            return Err(Infeasible::NoPath);
        }

        let reserve = if adjacent {
            self.tuning().reserve.adjacent(class)
        } else {
            self.tuning().reserve.moderate(class)
        };
        let pathing_cost = self.path_cost(&path_to) + self.path_cost(&path_back) + reserve;

        let mut allowance = self.tuning().reserve.dig_allowance(class);
        if let Some(amount) = tile_amount {
            let to_clear = (amount / class.dig_rubble_removed() + 1) * class.dig_cost();
            allowance = allowance.min(to_clear);
        }

        if self.unit.power < pathing_cost + allowance {
            trace!(
                "{} cannot afford {:?} at {:?} ({} < {})",
                self.unit.id,
                target,
                tile,
                self.unit.power,
                pathing_cost + allowance
            );
            return self.build_recharge_queue(None);
        }

        let digs = self.number_of_digs(self.unit.power, pathing_cost, tile_amount, carried);
        if digs == 0 {
            return Err(Infeasible::InsufficientPower);
        }

        queue.extend(ActionQueue::from_path(&path_to));
        queue.push(Action::dig(digs));

        if adjacent {
            self.set_state(UnitState::MiningAdjacent);
            if let MiningTarget::Resource(resource) = target {
                let mined = digs * class.dig_resource_gain();
                let direction = tile.direction_to(return_tile);
                queue.push(Action::transfer(direction, resource.into(), carried + mined));
            }
        }

        if !self.ctx.memory.ledger.claim_target(class, self.unit.id, tile) {
            return Err(Infeasible::NoTarget);
        }
        self.record_task(task);

        trace!("{} mining {:?} at {:?} x{}", self.unit.id, target, tile, digs);
        queue.truncate_to_limit();
        Ok(queue)
    }

    /// Rubble tile that most helps the facility's lichen spread: its own
    /// border ring first, then the lichen's edge, then any rubble nearby.
    pub fn excavation_target(&self) -> Option<Location> {
        let board = self.board();
        let ledger = &self.ctx.memory.ledger;
        let center = self.factory.pos;
        let dibbed = ledger.claimed_tiles(UnitClass::Light);

        let zone = orthogonal_positions(board, center, 1, ledger.my_factory_tiles());
        if total_rubble(board, &zone) > 0 {
            return lowest_rubble_position(board, &zone, &dibbed, center)
                .or_else(|| closest_rubble_tile(board, center, &dibbed));
        }

        let mut off_limits = ledger.occupied();
        off_limits.extend(dibbed.iter().copied());
        let edge = next_positions_to_clear(board, self.factory.strain_id, &off_limits);
        if !edge.is_empty() {
            return lowest_rubble_position(board, &edge, &dibbed, center)
                .or_else(|| closest_rubble_tile(board, center, &dibbed));
        }

        closest_rubble_tile(board, center, &dibbed)
    }

    /// First rubble tile along the facility's cached lane to `resource`.
    pub fn blaze_target(&self, lane: LaneKind) -> Option<Location> {
        let dibbed = self.ctx.memory.ledger.claimed_tiles(UnitClass::Light);
        self.ctx
            .memory
            .factories
            .get(&self.factory.id)?
            .lanes
            .first_rubble(lane, self.board(), &dibbed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn light_mines_nearest_ice_and_claims_it() {
        let mut board = Board::empty();
        board.flags.set_at(loc(5, 8), TileFlags::ICE);
        let snapshot = SnapshotBuilder::new(board)
            .factory(0, loc(5, 0), 1000, 500)
            .light(1, loc(5, 5), 150)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);

        let unit = &snapshot.units[0];
        let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
        let queue = builder
            .build_mining_queue(MiningTarget::Resource(Resource::Ice), Task::Mine(Resource::Ice))
            .unwrap();

        assert_eq!(
            queue.actions(),
            &[
                Action::new(ActionKind::Move(Direction::Down), 3),
                Action::dig(25)
            ]
        );
        assert_eq!(
            ctx.memory.ledger.target_of(UnitClass::Light, unit.id),
            Some(loc(5, 8))
        );
        assert_eq!(ctx.memory.state(unit.id), UnitState::Mining);
        assert_eq!(
            ctx.memory.factories[&FactoryId(0)].tasks_light.get(&unit.id),
            Some(&Task::Mine(Resource::Ice))
        );
    }

    #[test]
    fn drained_miner_heads_home_instead() {
        let mut board = Board::empty();
        board.flags.set_at(loc(5, 20), TileFlags::ICE);
        let snapshot = SnapshotBuilder::new(board)
            .factory(0, loc(5, 2), 1000, 500)
            .light(1, loc(5, 10), 40)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);

        let unit = &snapshot.units[0];
        let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
        let queue = builder
            .build_mining_queue(MiningTarget::Resource(Resource::Ice), Task::Mine(Resource::Ice))
            .unwrap();

        assert_eq!(ctx.memory.state(unit.id), UnitState::Recharging);
        assert_eq!(ctx.memory.ledger.target_of(UnitClass::Light, unit.id), None);
        assert_eq!(queue.head().map(|a| a.movement()), Some(Direction::Up));
        assert!(matches!(
            queue.actions().last().map(|a| a.kind),
            Some(ActionKind::Pickup { slot: CargoSlot::Power, .. })
        ));
    }

    #[test]
    fn adjacent_miner_hands_its_haul_straight_over() {
        let mut board = Board::empty();
        board.flags.set_at(loc(10, 12), TileFlags::ORE);
        let snapshot = SnapshotBuilder::new(board)
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 11), 1000)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);

        let unit = &snapshot.units[0];
        let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
        let queue = builder
            .build_mining_queue(MiningTarget::Resource(Resource::Ore), Task::Mine(Resource::Ore))
            .unwrap();

        // 20 to step out, 20 back, 25 reserve: (1000 - 65) / 60 = 15 digs.
        assert_eq!(
            queue.actions(),
            &[
                Action::move_to(Direction::Down),
                Action::dig(15),
                Action::transfer(Direction::Up, CargoSlot::Ore, 300),
            ]
        );
        assert_eq!(ctx.memory.state(unit.id), UnitState::MiningAdjacent);
    }

    #[test]
    fn trip_spends_no_more_than_power_above_the_reserve() {
        let mut board = Board::empty();
        board.flags.set_at(loc(10, 25), TileFlags::ICE);
        let tuning = Tuning::default();
        let plan = |power: u32| {
            let snapshot = SnapshotBuilder::new(board.clone())
                .factory(0, loc(10, 10), 1000, 500)
                .heavy(1, loc(10, 20), power)
                .build();
            let mut memory = Memory::default();
            let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
            let unit = &snapshot.units[0];
            let mut builder = QueueBuilder::new(&mut ctx, unit, &snapshot.factories[0]);
            let target = MiningTarget::Resource(Resource::Ice);
            let queue = builder.build_mining_queue(target, Task::Mine(Resource::Ice)).unwrap();
            (queue, ctx.memory.state(unit.id))
        };

        // 5 steps out, 14 back to (10, 11), 150 reserve, 600 dig allowance.
        let (queue, state) = plan(1130);
        assert_eq!(state, UnitState::Mining);
        assert_eq!(
            queue.actions(),
            &[
                Action::new(ActionKind::Move(Direction::Down), 5),
                Action::dig(10)
            ]
        );
        let spent = 5 * 20 + 10 * UnitClass::Heavy.dig_cost();
        assert_eq!(spent, 1130 - 14 * 20 - tuning.reserve.moderate(UnitClass::Heavy));

        let (queue, state) = plan(1129);
        assert_eq!(state, UnitState::Recharging);
        assert!(!queue.actions().iter().any(|a| a.is_dig()));
    }

    #[test]
    fn ring_rubble_is_cleared_first() {
        let mut board = Board::empty();
        board.rubble.set_at(loc(10, 12), 15);
        board.rubble.set_at(loc(14, 14), 5);
        let snapshot = SnapshotBuilder::new(board)
            .factory(0, loc(10, 10), 1000, 500)
            .light(1, loc(12, 12), 150)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.excavation_target(), Some(loc(10, 12)));
    }
}
