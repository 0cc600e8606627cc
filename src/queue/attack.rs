use super::*;
use log::*;

impl<'c, 'a> QueueBuilder<'c, 'a> {
    /// Chain digs across opponent lichen, nearest tile first, for as long
    /// as power covers each hop plus the reserve and the trip home.
    ///
    /// The trip home is costed once from where the unit stands rather than
    /// re-pathed after every hop.
    pub fn build_attack_queue(&mut self) -> BuildResult {
        self.begin(UnitState::Attacking);

        let class = self.class();
        let board = self.board();
        let opp_strains = self.ctx.memory.opp_strains.clone();
        if opp_strains.is_empty() {
            return Err(Infeasible::NoTarget);
        }

        let combat = &self.tuning().combat;
        let keep_back = self
            .cost_home()
            .saturating_add(self.tuning().reserve.moderate(class));
        let mut off_limits = self.ctx.memory.ledger.all_attack_tiles();

        let mut power = self.unit.power;
        let mut pos = self.unit.pos;
        let mut queue = ActionQueue::new();
        let mut tiles = Vec::new();
        let mut failure = Infeasible::NoTarget;

        for _ in 0..combat.attack_max_hops {
            let target = match closest_opp_lichen(
                board,
                &opp_strains,
                pos,
                &off_limits,
                Some(combat.priority_strain_min_tiles),
            ) {
                Some(target) => target,
                None => break,
            };
            off_limits.insert(target);

            let path = self.path_to(pos, target, None);
            if path.is_empty() {
                failure = Infeasible::NoPath;
                continue;
            }

            let move_cost = self.path_cost(&path);
            let lichen = board.lichen.at(target).max(1);
            let needed = (lichen + class.dig_lichen_removed() - 1) / class.dig_lichen_removed();
            let spare = power.saturating_sub(move_cost.saturating_add(keep_back));
            let digs = needed.min(spare / class.dig_cost());
            if digs == 0 {
                failure = Infeasible::InsufficientPower;
                break;
            }

            let mut hop = ActionQueue::from_path(&path);
            hop.push(Action::dig(digs));
            if queue.len() + hop.len() > MAX_QUEUE_LENGTH {
                break;
            }

            queue.extend(hop);
            power -= move_cost + digs * class.dig_cost();
            pos = target;
            tiles.push(target);
        }

        if tiles.is_empty() {
            return Err(failure);
        }

        debug!("{} attack run over {} tiles", self.unit.id, tiles.len());
        self.ctx
            .memory
            .ledger
            .claim_attack_tiles(self.unit.id, tiles);
        self.record_task(Task::Attack);
        Ok(queue)
    }
}
