//! Facility turn: build a unit or water the lichen.

use crate::action::*;
use crate::config::*;
use crate::constants::*;
use crate::context::*;
use crate::ledger::*;
use crate::needs::*;
use crate::snapshot::*;
use log::*;

/// Whether a facility holding `water` should irrigate on `turn`.
///
/// Early on water is spent only when there is a comfortable margin. Mid
/// game a power-rich facility holds back; otherwise it waters on a ladder
/// of thresholds that thin out to every other or every third turn. Toward
/// the end stock is spent down against the turns that remain.
pub fn irrigation_due(turn: u32, water: u32, power: u32, cfg: &IrrigationConfig) -> bool {
    let two_of_three = turn % 3 != 0;
    let even = turn % 2 == 0;

    if turn <= cfg.early_end {
        water > cfg.early_min && (water >= cfg.early_always || two_of_three)
    } else if turn < cfg.mid_end {
        if water <= cfg.mid_even || power > cfg.mid_power_ceiling {
            return false;
        }
        water > cfg.mid_always
            || (water > cfg.mid_two_of_three && two_of_three)
            || even
    } else if turn < cfg.late_end {
        let steps_remaining = MAX_TURNS.saturating_sub(turn);
        water > steps_remaining * cfg.late_per_step
            || water > cfg.late_always
            || (water > cfg.late_two_of_three && two_of_three)
            || (water > cfg.late_even && even)
    } else if turn < cfg.final_end {
        water > cfg.final_min
    } else {
        water > cfg.last_min
    }
}

/// Class of unit `factory` should build this turn, if any. Outstanding
/// needs or an unmet staffing target justify a build; lights wait while the
/// facility is saving for a heavy it is short of.
pub fn production_choice(ctx: &TurnContext, factory: &Factory) -> Option<UnitClass> {
    let cfg = &ctx.tuning.needs;
    let heavies = homed_units(ctx.snapshot, factory.id, UnitClass::Heavy);
    let lights = homed_units(ctx.snapshot, factory.id, UnitClass::Light);

    let heavy_wanted =
        ctx.needs.has(factory.id, UnitClass::Heavy) || heavies < cfg.heavy_staff_target;
    if heavy_wanted && factory.can_build(UnitClass::Heavy) {
        return Some(UnitClass::Heavy);
    }

    let saving_for_heavy = heavy_wanted && heavies < cfg.heavy_staff_target;
    let light_wanted =
        ctx.needs.has(factory.id, UnitClass::Light) || lights < cfg.light_staff_target;
    if light_wanted && !saving_for_heavy && factory.can_build(UnitClass::Light) {
        return Some(UnitClass::Light);
    }

    None
}

/// Decide this facility's action. A build reserves the center tile so no
/// unit plans to stand where the new one appears.
pub fn factory_turn(ctx: &mut TurnContext, factory: &Factory) -> Option<FactoryAction> {
    if !ctx.memory.ledger.is_reserved(factory.pos) {
        if let Some(class) = production_choice(ctx, factory) {
            ctx.memory.ledger.reserve(factory.pos, Holder::Facility);
            debug!("{} building {:?}", factory.id, class);
            return Some(match class {
                UnitClass::Light => FactoryAction::BuildLight,
                UnitClass::Heavy => FactoryAction::BuildHeavy,
            });
        }
    }

    let irrigation = &ctx.tuning.irrigation;
    if irrigation_due(ctx.turn(), factory.cargo.water, factory.power, irrigation) {
        trace!("{} watering with {} water", factory.id, factory.cargo.water);
        return Some(FactoryAction::Water);
    }

    None
}
