//! Going home for power, and sitting tight when even that is out of reach.

use super::*;
use log::*;

/// Turns starting at `turn` a unit must wait for daylight charge of
/// `charge` per turn to cover `deficit`.
pub fn daylight_turns_needed(turn: u32, deficit: u32, charge: u32) -> u32 {
    if deficit == 0 || charge == 0 {
        return 0;
    }

    let mut gained = 0;
    let mut waited = 0;
    while gained < deficit {
        if is_day(turn + waited) {
            gained += charge;
        }
        waited += 1;
    }
    waited
}

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Walk to the nearest free facility tile and pick up power there.
    ///
    /// `avoid` replaces the usual reservation set when routing, so an
    /// evading unit can steer clear of threats. Under evasion a unit that
    /// cannot afford the whole trip advances as far as it can.
    pub fn build_recharge_queue(&mut self, avoid: Option<&FnvHashSet<Location>>) -> BuildResult {
        let evading = self.state() == UnitState::EvasionRecharge;
        if evading {
            self.clear_dibs();
            self.clear_previous_task();
        } else {
            self.begin(UnitState::Recharging);
        }

        let pos = self.unit.pos;
        let return_tile = self.return_tile(pos);
        let pickup = self.pickup_amount();

        if pos == return_tile {
            if self.ctx.memory.ledger.is_reserved_by_other(pos, self.unit.id) {
                let direction = move_toward(pos, return_tile, &self.occupied(), None);
                if direction == Direction::Center {
                    return Err(Infeasible::Blocked);
                }
                return Ok(ActionQueue::single(Action::move_to(direction)));
            }
            return Ok(self.pickup_actions(pickup));
        }

        let path = self.path_to(pos, return_tile, avoid);
        if path.is_empty() {
            return Err(Infeasible::NoPath);
        }

        let cost_home = self.path_cost(&path);
        if self.unit.power < cost_home {
            let deficit = cost_home - self.unit.power;
            if !evading {
                return Ok(self.build_low_battery_queue(deficit));
            }

            let reach = self.affordable_prefix(&path);
            if reach.len() <= 1 {
                return Ok(self.build_low_battery_queue(deficit));
            }
            debug!("{} trekking {} tiles toward home", self.unit.id, reach.len() - 1);
            return Ok(ActionQueue::from_path(reach));
        }

        let mut queue = ActionQueue::from_path(&path);
        queue.push(Action::pickup(CargoSlot::Power, pickup, 1));
        queue.truncate_to_limit();
        Ok(queue)
    }

    /// The longest leading stretch of `path` this unit can pay for.
    fn affordable_prefix<'p>(&self, path: &'p [Location]) -> &'p [Location] {
        let rubble = &self.board().rubble;
        let mut spent = 0;
        let mut end = 1;

        for &tile in path.iter().skip(1) {
            spent += self.class().step_cost(rubble.at(tile));
            if spent > self.unit.power {
                break;
            }
            end += 1;
        }

        &path[..end.min(path.len())]
    }

    /// Pickup once home. A facility short on power is drained slowly over
    /// several turns instead.
    fn pickup_actions(&mut self, amount: u32) -> ActionQueue {
        let low_power = self
            .ctx
            .memory
            .factories
            .get(&self.factory.id)
            .map_or(false, |m| m.low_power);

        if amount == 0 {
            self.set_state(UnitState::Waiting);
            return ActionQueue::single(Action::wait(1));
        }

        if low_power {
            let trickle = self.tuning().power.slow_charge(self.class());
            if trickle > 0 && amount > trickle {
                self.set_state(UnitState::SlowCharging);
                let repeats = (amount + trickle - 1) / trickle;
                return ActionQueue::single(Action::pickup(CargoSlot::Power, trickle, repeats));
            }
        }

        ActionQueue::single(Action::pickup(CargoSlot::Power, amount, 1))
    }

    /// Park in place until daylight has paid back `deficit` power.
    pub fn build_low_battery_queue(&mut self, deficit: u32) -> ActionQueue {
        self.begin(UnitState::LowBattery);

        let turns = daylight_turns_needed(self.ctx.turn(), deficit, self.class().charge());
        debug!(
            "{} low on battery, waiting {} turns for {} power",
            self.unit.id, turns, deficit
        );
        ActionQueue::single(Action::wait(turns))
    }
}
