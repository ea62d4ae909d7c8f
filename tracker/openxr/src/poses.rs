use crate::{
    actions::TrackerActions,
    roles::PoseTable,
    runtime::{SpaceLocation, TrackerRuntime},
    to_pose,
};
use openxr::{self as xr, sys};
use tracker_common::*;

// None unless the runtime vouches for both position and orientation
pub fn convert_location(location: &SpaceLocation, world_to_meters: f32) -> Option<Transform> {
    location
        .is_fully_tracked()
        .then(|| Transform::from_pose(to_pose(location.pose), world_to_meters))
}

/// Locates every bound action space against `base_space` and publishes the fully tracked ones.
/// Returns the number of table entries written.
///
/// Entries of roles that are not tracked this frame, or whose location fails, keep their last
/// value.
pub fn resolve_poses<R: TrackerRuntime + ?Sized>(
    runtime: &R,
    actions: &TrackerActions,
    pose_table: &PoseTable,
    base_space: sys::Space,
    time: xr::Time,
    world_to_meters: f32,
) -> usize {
    if base_space == sys::Space::NULL && !actions.is_empty() {
        return 0;
    }

    let mut updated = 0;
    for (role, pose_action) in actions.iter() {
        match runtime.locate_space(pose_action.space, base_space, time) {
            Ok(location) => {
                if let Some(transform) = convert_location(&location, world_to_meters)
                    && pose_table.update(role, transform)
                {
                    updated += 1;
                }
            }
            Err(e) => error!(
                "Unable to get tracker pose for role ({}). Runtime returned error {e} ({})",
                role.display_name(),
                e.into_raw()
            ),
        }
    }

    updated
}
