//! Threat assessment ahead of each unit's turn.
//!
//! An opponent counts as a threat when it could win a collision: any heavy,
//! or anything at all when we are light. Threats on a cardinal tile are
//! close; threats two moves out are far. Close threats trigger the evasion
//! dance, far ones a pause or a sidestep.

use crate::action::*;
use crate::context::*;
use crate::geometry::*;
use crate::location::*;
use crate::queue::*;
use crate::snapshot::*;
use fnv::FnvHashSet;
use log::*;

/// What the evasion check decided about a unit's current plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvasionOutcome {
    /// No threat worth reacting to; carry on.
    Continue,
    /// The stored queue was shortened or cleared in place.
    Amended,
    /// Replace the plan with this queue.
    Evade(ActionQueue),
}

fn threats<'a>(unit: &Unit, opp_units: &'a [Unit], tiles: &[Location]) -> Vec<&'a Unit> {
    opp_units
        .iter()
        .filter(|opp| tiles.contains(&opp.pos))
        .filter(|opp| opp.is_heavy() || !unit.is_heavy())
        .collect()
}

/// Tiles `unit` should not step onto given the threats around it. Tiles of
/// our own facilities are always safe.
pub fn tiles_to_avoid(
    ctx: &TurnContext,
    unit: &Unit,
    close: &[&Unit],
    far: &[&Unit],
) -> FnvHashSet<Location> {
    let mut avoid = FnvHashSet::default();

    for opp in far {
        let light_vs_heavy = !unit.is_heavy() && opp.is_heavy();
        if unit.power <= opp.power || light_vs_heavy {
            avoid.extend(
                cardinal_tiles_toward(unit.pos, opp.pos)
                    .into_iter()
                    .filter(|&tile| !ctx.memory.ledger.is_home_tile(tile)),
            );
        }
    }

    for opp in close {
        if !unit.is_heavy() && opp.is_heavy() {
            avoid.insert(opp.pos);
        }
    }

    avoid
}

pub fn evasion_check<'a>(
    ctx: &mut TurnContext<'a>,
    unit: &'a Unit,
    home: &'a Factory,
) -> EvasionOutcome {
    let snapshot = ctx.snapshot;
    let close = threats(unit, &snapshot.opp_units, &cardinal_tiles(unit.pos));
    let far = threats(unit, &snapshot.opp_units, &second_level_tiles(unit.pos));
    let danger_close = !close.is_empty();
    let danger_far = !far.is_empty();

    let avoid_these = tiles_to_avoid(ctx, unit, &close, &far);
    let mut avoid = ctx.memory.ledger.occupied();
    if let Some(own) = ctx.memory.ledger.next_tile(unit.id) {
        avoid.remove(&own);
    }
    avoid.extend(avoid_these.iter().copied());

    let state = ctx.memory.state(unit.id);
    let mut outcome = EvasionOutcome::Continue;

    if state == UnitState::Evading {
        let threshold = ctx.tuning.reserve.low(unit.class);
        let mut builder = QueueBuilder::new(ctx, unit, home);
        let path = builder.path_to(unit.pos, home.pos, Some(&avoid));
        let cost_home = if path.is_empty() {
            u32::MAX
        } else {
            builder.path_cost(&path)
        };
        if unit.power <= cost_home.saturating_add(threshold) {
            debug!("{} too drained to keep evading", unit.id);
            ctx.memory.queues.remove(&unit.id);
            outcome = EvasionOutcome::Amended;
        }
    }

    let head = ctx
        .memory
        .queues
        .get(&unit.id)
        .and_then(|q| q.head().copied());

    if let Some(head) = head {
        let direction = head.movement();
        let is_move = matches!(head.kind, ActionKind::Move(_));

        if is_move {
            let next = unit.pos.step_or_stay(direction);
            if !avoid_these.contains(&next) {
                if state == UnitState::Evading && direction != Direction::Center {
                    if danger_close {
                        if let Some(queue) = ctx.memory.queues.get_mut(&unit.id) {
                            queue.keep_next_only();
                        }
                    } else {
                        ctx.memory.set_state(unit.id, UnitState::Idle);
                        ctx.memory.queues.remove(&unit.id);
                    }
                    return EvasionOutcome::Amended;
                } else if !danger_close {
                    return outcome;
                }
            }
        } else if !danger_close {
            return outcome;
        }
    }

    if danger_close {
        ctx.memory.set_state(unit.id, UnitState::Evading);

        let next = ctx
            .memory
            .queues
            .get(&unit.id)
            .filter(|q| !q.is_empty())
            .map_or(unit.pos, |q| q.next_position(unit.pos));
        let not_moving = next == unit.pos;
        let on_my_factory = ctx.memory.ledger.is_home_tile(next);

        if (avoid_these.contains(&next) || not_moving) && !on_my_factory {
            debug!("{} evading close threat {}", unit.id, close[0].id);
            let mut builder = QueueBuilder::new(ctx, unit, home);
            return match builder.build_evasion_dance(&avoid, Some(close[0])) {
                Ok(queue) => EvasionOutcome::Evade(queue),
                Err(reason) => {
                    trace!("{} has no evasion: {}", unit.id, reason);
                    outcome
                }
            };
        }
        return outcome;
    }

    if danger_far {
        debug!("{} pausing for far threat {}", unit.id, far[0].id);
        ctx.memory.set_state(unit.id, UnitState::Evading);

        let mut occupied = ctx.memory.ledger.occupied();
        if let Some(own) = ctx.memory.ledger.next_tile(unit.id) {
            occupied.remove(&own);
        }

        let direction = if can_stay(unit.pos, &occupied) {
            Direction::Center
        } else {
            match move_toward(unit.pos, home.pos, &avoid, None) {
                Direction::Center => move_toward(unit.pos, home.pos, &occupied, None),
                d => d,
            }
        };

        let next = unit.pos.step_or_stay(direction);
        let cost = if direction == Direction::Center {
            0
        } else {
            unit.class.step_cost(ctx.board().rubble_at(next))
        };

        if unit.power < cost {
            let charges = (cost - unit.power) / unit.class.charge() + 1;
            return EvasionOutcome::Evade(ActionQueue::single(Action::wait(charges + 1)));
        }

        let action = match direction {
            Direction::Center => Action::wait(1),
            d => Action::move_to(d),
        };
        return EvasionOutcome::Evade(ActionQueue::single(action));
    }

    outcome
}
