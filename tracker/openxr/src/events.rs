use crate::{
    roles::TrackerRole,
    runtime::{self, TrackerPathEnumerator, TrackerPaths, TrackerRuntime},
};
use openxr::{self as xr, sys};
use serde::Serialize;
use tracker_common::*;

/// Runtime event, reduced to what the tracker module reacts to.
#[derive(Clone, Copy, Debug)]
pub enum TrackerEvent {
    SessionStateChanged(xr::SessionState),
    ViveTrackerConnected(TrackerPaths),
    Other(xr::StructureType),
}

/// A tracker reported by the runtime, with its paths resolved to strings.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedTracker {
    pub persistent_path: String,
    pub role_path: Option<String>,
    pub role: Option<TrackerRole>,
}

pub fn describe_tracker<R: TrackerRuntime + ?Sized>(
    runtime: &R,
    instance: sys::Instance,
    paths: TrackerPaths,
) -> ConnectedTracker {
    let persistent_path = runtime
        .path_to_string(instance, paths.persistent_path)
        .unwrap_or_else(|e| {
            warn!("Unable to resolve tracker persistent path: {e}");
            String::new()
        });

    // A null role path means the tracker is connected but has no role yet
    let role_path = (paths.role_path != xr::Path::NULL)
        .then(|| show_warn(runtime.path_to_string(instance, paths.role_path)))
        .flatten();
    let role = role_path.as_deref().and_then(TrackerRole::from_role_path);

    ConnectedTracker {
        persistent_path,
        role_path,
        role,
    }
}

// Lists every tracker the runtime currently knows about. Purely diagnostic: nothing in the
// module depends on the result.
pub fn enumerate_connected_trackers<R: TrackerRuntime + ?Sized>(
    runtime: &R,
    instance: sys::Instance,
    enumerator: Option<&dyn TrackerPathEnumerator>,
) -> Option<Vec<ConnectedTracker>> {
    let Some(enumerator) = enumerator else {
        warn!("xrEnumerateViveTrackerPathsHTCX is not available, active trackers cannot be listed");
        return None;
    };

    match runtime::enumerate_tracker_paths(enumerator) {
        Ok(all_paths) => {
            info!("Number of tracker paths now active is {}", all_paths.len());

            Some(
                all_paths
                    .into_iter()
                    .map(|paths| describe_tracker(runtime, instance, paths))
                    .collect(),
            )
        }
        Err(e) => {
            error!(
                "Unable to enumerate tracker paths. Runtime returned error {e} ({})",
                e.into_raw()
            );
            None
        }
    }
}
