use super::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Idle for `turns`, first stepping off a resource tile or a tile
    /// someone else needs.
    pub fn build_waiting_queue(&mut self, turns: u32) -> ActionQueue {
        self.begin(UnitState::Waiting);

        let pos = self.unit.pos;
        let mut queue = ActionQueue::new();

        let in_the_way = self.board().is_resource_tile(pos)
            || self.ctx.memory.ledger.is_reserved_by_other(pos, self.unit.id);
        if in_the_way {
            let direction = move_toward(pos, self.factory.pos, &self.occupied(), None);
            if direction != Direction::Center {
                queue.push(Action::move_to(direction));
            }
        }

        queue.push(Action::wait(turns));
        queue
    }
}
