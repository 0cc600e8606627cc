use super::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Join a far-flung homer and hand it spare power, keeping enough back
    /// to make it home again.
    pub fn build_helper_queue(&mut self, homer: UnitId) -> BuildResult {
        self.begin(UnitState::Helping);

        let homer = self
            .ctx
            .snapshot
            .unit(homer)
            .filter(|h| h.id != self.unit.id)
            .ok_or(Infeasible::NoTarget)?;
        let reserve = self.tuning().reserve.moderate(self.class());
        let pos = self.unit.pos;

        if pos.is_adjacent(homer.pos) {
            let keep = self.cost_home().saturating_add(reserve);
            let surplus = self.unit.power.saturating_sub(keep);
            if surplus == 0 {
                return Err(Infeasible::InsufficientPower);
            }

            self.record_task(Task::Help(homer.id));
            return Ok(ActionQueue::single(Action::transfer(
                pos.direction_to(homer.pos),
                CargoSlot::Power,
                surplus,
            )));
        }

        let ledger = &self.ctx.memory.ledger;
        let spot = homer
            .pos
            .cardinal_neighbors()
            .filter(|&tile| !ledger.is_reserved_by_other(tile, self.unit.id))
            .filter(|&tile| !self.board().is_resource_tile(tile))
            .min_by_key(|&tile| (pos.distance_to(tile), tile))
            .ok_or(Infeasible::Blocked)?;

        let path = self.path_to(pos, spot, None);
        if path.is_empty() {
            return Err(Infeasible::NoPath);
        }
        let path_back = self.path_to(spot, self.return_tile(spot), None);
        if path_back.is_empty() {
            return Err(Infeasible::NoPath);
        }

        let spend = self.path_cost(&path) + self.path_cost(&path_back) + reserve;
        let surplus = self.unit.power.saturating_sub(spend);
        if surplus == 0 {
            return Err(Infeasible::InsufficientPower);
        }

        let mut queue = ActionQueue::from_path(&path);
        queue.push(Action::transfer(
            spot.direction_to(homer.pos),
            CargoSlot::Power,
            surplus,
        ));
        queue.truncate_to_limit();

        self.record_task(Task::Help(homer.id));
        Ok(queue)
    }
}
