use crate::{
    roles::{ASSIGNABLE_ROLE_COUNT, TrackerRole},
    runtime::TrackerRuntime,
};
use openxr::{self as xr, sys};
use tracker_common::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoseAction {
    pub action: sys::Action,
    pub space: sys::Space,
}

// Creates a pose action and its action space anchored at the identity pose. If the space cannot
// be created the action is destroyed again, so a failure never leaves anything behind.
pub fn create_pose_action<R: TrackerRuntime + ?Sized>(
    runtime: &mut R,
    action_set: sys::ActionSet,
    session: sys::Session,
    name: &str,
) -> Option<PoseAction> {
    let action = match runtime.create_pose_action(action_set, name, name) {
        Ok(action) => action,
        Err(e) => {
            error!(
                "Unable to create action {name}. Runtime returned error {e} ({})",
                e.into_raw()
            );
            return None;
        }
    };

    match runtime.create_action_space(session, action, xr::Posef::IDENTITY) {
        Ok(space) => {
            info!("Created tracker pose action [{name}]");
            Some(PoseAction { action, space })
        }
        Err(e) => {
            error!(
                "Unable to create an action space for action {name}. Runtime returned error {e} ({})",
                e.into_raw()
            );
            show_err(runtime.destroy_action(action));
            None
        }
    }
}

pub fn destroy_pose_action<R: TrackerRuntime + ?Sized>(runtime: &mut R, pose_action: PoseAction) {
    show_err(runtime.destroy_space(pose_action.space));
    show_err(runtime.destroy_action(pose_action.action));
}

/// One entry per bound role, holding the role's action and space.
///
/// Storage is indexed by role, so a role can never own two actions, and insertion refuses an
/// action that already belongs to another role.
#[derive(Default)]
pub struct TrackerActions {
    entries: [Option<PoseAction>; ASSIGNABLE_ROLE_COUNT],
    // Roles in binding order
    order: Vec<TrackerRole>,
}

impl TrackerActions {
    pub fn insert(&mut self, role: TrackerRole, pose_action: PoseAction) -> bool {
        let Some(idx) = role.index() else {
            return false;
        };

        if self.entries[idx].is_some() || self.role_of(pose_action.action).is_some() {
            return false;
        }

        self.entries[idx] = Some(pose_action);
        self.order.push(role);

        true
    }

    pub fn remove(&mut self, role: TrackerRole) -> Option<PoseAction> {
        let pose_action = self.entries[role.index()?].take()?;
        self.order.retain(|r| *r != role);

        Some(pose_action)
    }

    pub fn get(&self, role: TrackerRole) -> Option<PoseAction> {
        self.entries[role.index()?]
    }

    pub fn role_of(&self, action: sys::Action) -> Option<TrackerRole> {
        self.iter()
            .find(|(_, pose_action)| pose_action.action == action)
            .map(|(role, _)| role)
    }

    pub fn space_of(&self, action: sys::Action) -> Option<sys::Space> {
        self.iter()
            .find(|(_, pose_action)| pose_action.action == action)
            .map(|(_, pose_action)| pose_action.space)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackerRole, PoseAction)> + '_ {
        self.order
            .iter()
            .filter_map(|role| self.get(*role).map(|pose_action| (*role, pose_action)))
    }

    pub fn actions(&self) -> Vec<sys::Action> {
        self.iter().map(|(_, pose_action)| pose_action.action).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn take_all(&mut self) -> Vec<(TrackerRole, PoseAction)> {
        let entries = self.iter().collect();
        *self = Self::default();

        entries
    }

    // Action spaces belong to the session that created them: give every bound action a space in
    // `session`. A role whose space cannot be recreated loses its action for good.
    pub fn rebuild_spaces<R: TrackerRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        session: sys::Session,
    ) -> usize {
        let mut rebuilt = 0;

        for role in self.order.clone() {
            let Some(idx) = role.index() else {
                continue;
            };
            let Some(pose_action) = self.entries[idx] else {
                continue;
            };

            show_err(runtime.destroy_space(pose_action.space));

            match runtime.create_action_space(session, pose_action.action, xr::Posef::IDENTITY) {
                Ok(space) => {
                    self.entries[idx] = Some(PoseAction {
                        action: pose_action.action,
                        space,
                    });
                    rebuilt += 1;
                }
                Err(e) => {
                    error!(
                        "Unable to recreate the action space of {}. Runtime returned error {e} ({})",
                        role.display_name(),
                        e.into_raw()
                    );
                    self.remove(role);
                    show_err(runtime.destroy_action(pose_action.action));
                }
            }
        }

        rebuilt
    }
}
