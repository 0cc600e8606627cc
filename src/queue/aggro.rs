use super::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Run down an opponent loitering near the facility. Only heavies give
    /// chase, and only after units they can beat.
    pub fn build_aggro_queue(&mut self) -> BuildResult {
        if !self.unit.is_heavy() {
            return Err(Infeasible::NoTarget);
        }
        self.begin(UnitState::Aggro);

        let pos = self.unit.pos;
        let radius = self.tuning().combat.aggro_radius;
        let target = self
            .ctx
            .snapshot
            .opp_units
            .iter()
            .filter(|opp| opp.pos.distance_to(self.factory.pos) <= radius)
            .filter(|opp| !opp.is_heavy() || opp.power < self.unit.power)
            .min_by_key(|opp| (pos.distance_to(opp.pos), opp.id))
            .ok_or(Infeasible::NoTarget)?;

        let path = self.path_to(pos, target.pos, None);
        if path.len() < 2 {
            return Err(Infeasible::NoPath);
        }
        let path_back = self.path_to(target.pos, self.return_tile(target.pos), None);
        if path_back.is_empty() {
            return Err(Infeasible::NoPath);
        }

        let reserve = self.tuning().reserve.moderate(self.class());
        let needed = self.path_cost(&path) + self.path_cost(&path_back) + reserve;
        if self.unit.power < needed {
            return Err(Infeasible::InsufficientPower);
        }

        self.record_task(Task::Aggro);
        let mut queue = ActionQueue::from_path(&path);
        queue.truncate_to_limit();
        Ok(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn heavy_chases_a_light_near_home() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 12), 1000)
            .opp_light(9, loc(13, 12), 100)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let mut builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        let queue = builder.build_aggro_queue().unwrap();
        assert_eq!(
            queue.actions(),
            &[Action::new(ActionKind::Move(Direction::Right), 3)]
        );
    }

    #[test]
    fn stronger_heavies_are_left_alone() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 12), 1000)
            .opp_heavy(9, loc(13, 12), 2500)
            .build();
        let tuning = Tuning::default();
        let mut memory = Memory::default();
        let mut ctx = TurnContext::begin(&snapshot, &tuning, &mut memory);
        let mut builder = QueueBuilder::new(&mut ctx, &snapshot.units[0], &snapshot.factories[0]);

        assert_eq!(builder.build_aggro_queue(), Err(Infeasible::NoTarget));
    }
}
