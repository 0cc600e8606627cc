use super::*;
use log::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Get out of a threat's reach. A unit without the power to run home
    /// recharges along a route around `avoid`; one far from home, facing a
    /// heavier opponent, or with no opponent in sight retreats a step; any
    /// other unit feints toward the threat and straight back.
    pub fn build_evasion_dance(
        &mut self,
        avoid: &FnvHashSet<Location>,
        opp: Option<&Unit>,
    ) -> BuildResult {
        self.clear_previous_task();

        let pos = self.unit.pos;
        let home = self.factory.pos;
        let reserve = self.tuning().reserve.low(self.class());

        let path_home = self.path_to(pos, home, Some(avoid));
        let cost_home = if path_home.is_empty() {
            u32::MAX
        } else {
            self.path_cost(&path_home)
        };

        if self.unit.power < cost_home.saturating_add(reserve) {
            self.set_state(UnitState::EvasionRecharge);
            return self.build_recharge_queue(Some(avoid)).or_else(|_| {
                debug!("{} has no recharge route around threats", self.unit.id);
                let occupied = self.occupied();
                self.build_recharge_queue(Some(&occupied))
            });
        }

        self.set_state(UnitState::Evading);
        let occupied = self.occupied();
        let retreat_distance = self.tuning().combat.retreat_distance;

        let feint_at = opp.filter(|opp| {
            let outgunned = self.class() == UnitClass::Light && opp.is_heavy();
            !outgunned && pos.distance_to(home) <= retreat_distance
        });

        match feint_at {
            None => {
                let mut direction = move_toward(pos, home, avoid, None);
                if direction == Direction::Center {
                    direction = move_toward(pos, home, &occupied, None);
                }
                if direction == Direction::Center {
                    return Err(Infeasible::Blocked);
                }
                Ok(ActionQueue::single(Action::move_to(direction)))
            }
            Some(opp) => {
                let direction = [
                    move_toward(pos, opp.pos, avoid, None),
                    move_toward(pos, home, avoid, None),
                    move_toward(pos, home, &occupied, None),
                ]
                .into_iter()
                .find(|&d| d != Direction::Center)
                .ok_or(Infeasible::Blocked)?;

                let mut queue = ActionQueue::single(Action::move_to(direction));
                queue.push(Action::move_to(direction.opposite()));
                Ok(queue)
            }
        }
    }
}
