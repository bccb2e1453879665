//! Splits a matched trigger's actions into local and networked work.
//!
//! Networked actions are grouped per destination so each destination named
//! in a trigger gets exactly one send. Grouping never spans triggers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::trigger::{ActionRef, Trigger};
use crate::types::AppId;

/// Networked actions bound for one destination, all owned by the same trigger.
#[derive(Debug, Clone)]
pub struct DestinationBatch {
    pub destination: AppId,
    pub actions: Vec<ActionRef>,
}

impl DestinationBatch {
    /// The trigger every action in the batch belongs to.
    pub fn trigger(&self) -> Option<&Arc<Trigger>> {
        self.actions.first().map(ActionRef::trigger)
    }
}

/// Result of dispatching one matched trigger.
#[derive(Debug, Clone, Default)]
pub struct Dispatch {
    /// Actions handled in-process by an external collaborator.
    pub local: Vec<ActionRef>,
    /// One batch per distinct destination, in order of first appearance.
    pub networked: Vec<DestinationBatch>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    networked: BTreeSet<AppId>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            networked: AppId::builtin_networked().into_iter().collect(),
        }
    }
}

impl Dispatcher {
    /// Builtin networked apps plus `extra`.
    pub fn new(extra: impl IntoIterator<Item = AppId>) -> Self {
        let mut dispatcher = Self::default();
        dispatcher.networked.extend(extra);
        dispatcher
    }

    pub fn is_networked(&self, app_id: &AppId) -> bool {
        self.networked.contains(app_id)
    }

    pub fn networked_apps(&self) -> impl Iterator<Item = &AppId> {
        self.networked.iter()
    }

    pub fn dispatch(&self, trigger: &Arc<Trigger>) -> Dispatch {
        let mut out = Dispatch::default();
        for action in trigger.action_refs() {
            if !self.is_networked(action.app_id()) {
                out.local.push(action);
                continue;
            }
            match out
                .networked
                .iter_mut()
                .find(|b| &b.destination == action.app_id())
            {
                Some(batch) => batch.actions.push(action),
                None => out.networked.push(DestinationBatch {
                    destination: action.app_id().clone(),
                    actions: vec![action],
                }),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerAction;

    fn trigger_with(apps: &[&str]) -> Arc<Trigger> {
        let mut trigger = Trigger::default();
        for (i, app) in apps.iter().enumerate() {
            trigger = trigger
                .with_action(TriggerAction::new(*app, "SendRequest").with_arg("n", i.to_string()));
        }
        Arc::new(trigger)
    }

    #[test]
    fn two_destinations_make_two_batches() {
        let trigger = trigger_with(&[AppId::HTTP_ENDPOINT, AppId::UDP_ENDPOINT]);
        let dispatch = Dispatcher::default().dispatch(&trigger);
        assert!(dispatch.local.is_empty());
        assert_eq!(dispatch.networked.len(), 2);
        assert_eq!(dispatch.networked[0].destination, "HttpEndpoint");
        assert_eq!(dispatch.networked[1].destination, "UdpEndpoint");
    }

    #[test]
    fn same_destination_actions_share_one_batch() {
        let trigger = trigger_with(&[
            AppId::HTTP_ENDPOINT,
            AppId::OBS,
            AppId::HTTP_ENDPOINT,
            AppId::HTTP_ENDPOINT,
        ]);
        let dispatch = Dispatcher::default().dispatch(&trigger);
        assert_eq!(dispatch.networked.len(), 1);
        let batch = &dispatch.networked[0];
        let indices: Vec<usize> = batch.actions.iter().map(ActionRef::index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert!(Arc::ptr_eq(batch.trigger().unwrap(), &trigger));
    }

    #[test]
    fn local_apps_are_surfaced_not_batched() {
        let trigger = trigger_with(&[AppId::OBS, AppId::LIGHTING_CONTROLLER, "SomethingElse"]);
        let dispatch = Dispatcher::default().dispatch(&trigger);
        assert!(dispatch.networked.is_empty());
        assert_eq!(dispatch.local.len(), 3);
        assert_eq!(dispatch.local[1].app_id(), "LightingController");
    }

    #[test]
    fn extra_networked_apps_are_honoured() {
        let dispatcher = Dispatcher::new([AppId::new("Resolume")]);
        assert!(dispatcher.is_networked(&AppId::new("Resolume")));
        assert!(dispatcher.is_networked(&AppId::new(AppId::OSC_ENDPOINT)));

        let dispatch = dispatcher.dispatch(&trigger_with(&["Resolume", AppId::OBS]));
        assert_eq!(dispatch.networked.len(), 1);
        assert_eq!(dispatch.local.len(), 1);
    }

    #[test]
    fn trigger_without_actions_dispatches_nothing() {
        let dispatch = Dispatcher::default().dispatch(&Arc::new(Trigger::default()));
        assert!(dispatch.local.is_empty());
        assert!(dispatch.networked.is_empty());
    }
}
