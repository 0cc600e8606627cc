use super::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Park beside the facility and feed it whatever power the unit does
    /// not need for itself.
    pub fn build_solar_queue(&mut self) -> BuildResult {
        self.begin(UnitState::SolarPanel);

        let pos = self.unit.pos;
        let center = self.factory.pos;
        let board = self.board();
        let ledger = &self.ctx.memory.ledger;

        let spot = factory_tiles(center)
            .into_iter()
            .flat_map(|tile| tile.cardinal_neighbors())
            .filter(|&tile| !ledger.is_home_tile(tile) && !ledger.is_opp_factory_tile(tile))
            .filter(|&tile| !board.is_resource_tile(tile))
            .filter(|&tile| !ledger.is_reserved_by_other(tile, self.unit.id))
            .min_by_key(|&tile| (pos.distance_to(tile), tile))
            .ok_or(Infeasible::Blocked)?;

        let keep = self.tuning().power.solar_panel_min_power(self.class());

        if pos == spot {
            let surplus = self.unit.power.saturating_sub(keep);
            if surplus == 0 {
                return Ok(ActionQueue::single(Action::wait(1)));
            }
            let footprint = closest_factory_tile(center, pos, &FnvHashSet::default());
            return Ok(ActionQueue::single(Action::transfer(
                pos.direction_to(footprint),
                CargoSlot::Power,
                surplus,
            )));
        }

        let path = self.path_to(pos, spot, None);
        if path.is_empty() {
            return Err(Infeasible::NoPath);
        }
        if self.unit.power < self.path_cost(&path) + keep {
            return Err(Infeasible::InsufficientPower);
        }

        let mut queue = ActionQueue::from_path(&path);
        queue.truncate_to_limit();
        Ok(queue)
    }
}
