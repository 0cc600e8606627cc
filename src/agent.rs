//! Turn orchestration.

use crate::action::*;
use crate::config::*;
use crate::context::*;
use crate::dispatch::*;
use crate::factory::*;
use crate::needs::*;
use crate::snapshot::*;
use itertools::Itertools;
use log::*;
use std::collections::BTreeMap;

/// Output of one turn, keyed by the game's entity id strings.
pub type TurnActions = BTreeMap<String, EntityActions>;

/// The decision engine and everything it remembers between turns.
pub struct Agent {
    pub tuning: Tuning,
    pub memory: Memory,
}

impl Default for Agent {
    fn default() -> Self {
        Agent::new(Tuning::builtin())
    }
}

impl Agent {
    pub fn new(tuning: Tuning) -> Self {
        Agent {
            tuning,
            memory: Memory::default(),
        }
    }

    /// Plan one turn. Only entities whose plan changed appear in the
    /// result; everyone else carries on with what they were given before.
    pub fn act(&mut self, snapshot: &Snapshot) -> TurnActions {
        self.memory.pop_action_queues();
        self.memory.prune_dead(snapshot);

        let mut ctx = TurnContext::begin(snapshot, &self.tuning, &mut self.memory);
        refresh_factories(&mut ctx);

        for unit in unit_order(&ctx) {
            dispatch_unit(&mut ctx, unit);
        }

        let mut actions = TurnActions::new();

        for factory in &snapshot.factories {
            if let Some(action) = factory_turn(&mut ctx, factory) {
                actions.insert(factory.id.to_string(), EntityActions::Factory(action));
            }
        }

        for (id, queue) in ctx.submitted.drain() {
            if !queue.is_empty() {
                actions.insert(id.to_string(), EntityActions::Unit(queue));
            }
        }

        debug!(
            "turn {}: {} units, {} factories, {} new plans",
            snapshot.turn,
            snapshot.units.len(),
            snapshot.factories.len(),
            actions.len()
        );

        actions
    }
}

/// Specialists first, then units midway through a cycle, then everyone
/// else. Heavies go before lights within each group.
fn unit_order<'a>(ctx: &TurnContext<'a>) -> Vec<&'a Unit> {
    ctx.snapshot
        .units
        .iter()
        .sorted_by_key(|unit| {
            let rank = if ctx.memory.specialist_factory(unit.id).is_some() {
                0
            } else if ctx.memory.state(unit.id).is_continuing() {
                1
            } else {
                2
            };
            (rank, !unit.is_heavy(), unit.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::*;
    use crate::test_support::*;

    #[test]
    fn empty_facility_builds_a_heavy() {
        let snapshot = SnapshotBuilder::new(Board::empty())
            .turn(1)
            .factory_with_metal(0, loc(10, 10), 1000, 0, 150)
            .build();
        let mut agent = Agent::default();

        let actions = agent.act(&snapshot);
        assert_eq!(
            actions.get("factory_0"),
            Some(&EntityActions::Factory(FactoryAction::BuildHeavy))
        );
    }

    #[test]
    fn first_heavy_becomes_homer_and_keeps_its_plan() {
        let mut board = Board::empty();
        board.flags.set_at(loc(10, 14), TileFlags::ICE);
        let turn_one = SnapshotBuilder::new(board.clone())
            .turn(1)
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 12), 1000)
            .build();
        let mut agent = Agent::default();

        let actions = agent.act(&turn_one);
        assert!(actions.contains_key("unit_1"));
        assert_eq!(agent.memory.factories[&FactoryId(0)].homer, Some(UnitId(1)));

        let turn_two = SnapshotBuilder::new(board)
            .turn(2)
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 13), 980)
            .build();
        let actions = agent.act(&turn_two);
        assert!(!actions.contains_key("unit_1"));
        assert_eq!(
            agent.memory.queues[&UnitId(1)].head(),
            Some(&Action::move_to(crate::location::Direction::Down))
        );
    }

    #[test]
    fn dead_homer_is_forgotten() {
        let mut board = Board::empty();
        board.flags.set_at(loc(10, 14), TileFlags::ICE);
        let alive = SnapshotBuilder::new(board.clone())
            .turn(1)
            .factory(0, loc(10, 10), 1000, 500)
            .heavy(1, loc(10, 12), 1000)
            .build();
        let mut agent = Agent::default();
        agent.act(&alive);

        let gone = SnapshotBuilder::new(board)
            .turn(2)
            .factory(0, loc(10, 10), 1000, 500)
            .build();
        agent.act(&gone);
        assert_eq!(agent.memory.factories[&FactoryId(0)].homer, None);
        assert!(agent.memory.queues.is_empty());
    }
}
