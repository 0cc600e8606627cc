use super::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Carry everything of `resource` home and hand it over.
    pub fn build_delivery_queue(&mut self, resource: Resource) -> BuildResult {
        self.begin(UnitState::Transferring);

        let amount = self.unit.cargo.amount(resource);
        if amount == 0 {
            return Err(Infeasible::NoTarget);
        }

        let pos = self.unit.pos;
        let tile = self.return_tile(pos);
        let slot = CargoSlot::from(resource);

        if pos == tile || pos.is_adjacent(tile) {
            let direction = if pos == tile {
                Direction::Center
            } else {
                pos.direction_to(tile)
            };
            return Ok(ActionQueue::single(Action::transfer(direction, slot, amount)));
        }

        let path = self.path_to(pos, tile, None);
        if path.is_empty() {
            return Err(Infeasible::NoPath);
        }
        let reserve = self.tuning().reserve.low(self.class());
        if self.unit.power < self.path_cost(&path) + reserve {
            return Err(Infeasible::InsufficientPower);
        }

        let mut queue = ActionQueue::from_path(&path);
        queue.push(Action::transfer(Direction::Center, slot, amount));
        queue.truncate_to_limit();
        Ok(queue)
    }
}
