use crate::{
    actions::{self, PoseAction, TrackerActions},
    roles::TrackerRole,
    runtime::{SuggestedBinding, TrackerRuntime},
};
use openxr::sys;
use tracker_common::*;

// Binds `pose_action` to the grip pose of `role`. On success the action joins `actions` and its
// binding is queued in `pending`; otherwise the action and its space are destroyed.
pub fn create_tracker_binding<R: TrackerRuntime + ?Sized>(
    runtime: &mut R,
    instance: sys::Instance,
    role: TrackerRole,
    pose_action: PoseAction,
    actions: &mut TrackerActions,
    pending: &mut Vec<SuggestedBinding>,
) -> bool {
    let Some(input_path) = role.input_path() else {
        error!("Cannot bind a tracker action without a role");
        actions::destroy_pose_action(runtime, pose_action);
        return false;
    };

    let binding = match runtime.string_to_path(instance, input_path) {
        Ok(path) => path,
        Err(e) => {
            error!(
                "Unable to create path {input_path}. Runtime returned error {e} ({})",
                e.into_raw()
            );
            actions::destroy_pose_action(runtime, pose_action);
            return false;
        }
    };

    if !actions.insert(role, pose_action) {
        warn!("{} already has a bound action", role.display_name());
        actions::destroy_pose_action(runtime, pose_action);
        return false;
    }

    pending.push(SuggestedBinding {
        action: pose_action.action,
        binding,
        role,
    });
    info!("... bound to [{input_path}]");

    true
}

// Submits every queued binding in a single call for `interaction_profile`. Runtimes accept only
// one suggestion per profile, so this runs at most once per instance.
pub fn suggest_bindings<R: TrackerRuntime + ?Sized>(
    runtime: &mut R,
    instance: sys::Instance,
    interaction_profile: &str,
    bindings: &[SuggestedBinding],
) -> bool {
    if bindings.is_empty() {
        return false;
    }

    let result = runtime
        .string_to_path(instance, interaction_profile)
        .and_then(|profile| {
            runtime.suggest_interaction_profile_bindings(instance, profile, bindings)
        });

    match result {
        Ok(()) => {
            info!(
                "Suggested {} tracker bindings for {interaction_profile}",
                bindings.len()
            );
            true
        }
        Err(e) => {
            error!(
                "Unable to suggest vive tracker interaction profile bindings to runtime {e} ({})",
                e.into_raw()
            );
            false
        }
    }
}
