//! Event → trigger matching.
//!
//! Every trigger whose predicates all hold is returned, in snapshot order.
//! One event can fire many triggers.

use std::sync::Arc;

use crate::event::HotcueEvent;
use crate::snapshot::TriggerSnapshot;
use crate::trigger::Trigger;

/// True when the hotcue type, color, deck and cue-name predicates all hold.
pub fn matches(trigger: &Trigger, event: &HotcueEvent) -> bool {
    trigger.accepts_type(event.hot_cue_type)
        && trigger.accepts_color(event.cue_color)
        && trigger.accepts_deck(event.deck)
        && trigger.accepts_cue_name(&event.cue_name)
}

/// Triggers in `snapshot` that fire for `event`.
pub fn match_event(event: &HotcueEvent, snapshot: &TriggerSnapshot) -> Vec<Arc<Trigger>> {
    snapshot
        .triggers()
        .iter()
        .filter(|t| matches(t, event))
        .cloned()
        .collect()
}

/// Positions of the matching triggers within `snapshot`.
pub fn match_positions(event: &HotcueEvent, snapshot: &TriggerSnapshot) -> Vec<usize> {
    snapshot
        .triggers()
        .iter()
        .enumerate()
        .filter(|(_, t)| matches(t, event))
        .map(|(i, _)| i)
        .collect()
}
