mod actions;
mod bindings;
mod events;
mod module;
mod poses;
mod roles;
mod runtime;
mod xr_runtime;

pub mod c_api;
pub mod logging_backend;

#[cfg(test)]
mod test_utils;

pub use actions::{PoseAction, TrackerActions};
pub use events::{ConnectedTracker, TrackerEvent};
pub use module::{TrackerModule, TrackerPhase};
pub use poses::convert_location;
pub use roles::{ASSIGNABLE_ROLE_COUNT, PoseTable, PoseTableReader, TrackerRole};
pub use runtime::{
    SpaceLocation, SuggestedBinding, TrackerPathEnumerator, TrackerPaths, TrackerRuntime,
    enumerate_tracker_paths,
};
pub use xr_runtime::{OpenXrRuntime, enable_required_extensions, tracker_event_from_raw};

use openxr as xr;
use tracker_common::{
    Pose,
    glam::{Quat, Vec3},
};

pub const VIVE_TRACKER_EXTENSION_NAME: &str = "XR_HTCX_vive_tracker_interaction";

// Name the host uses to tell tracker motion sources apart from controllers
pub const DEVICE_TYPE_NAME: &str = "ViveTracker";

fn to_vec3(v: xr::Vector3f) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_quat(q: xr::Quaternionf) -> Quat {
    Quat::from_xyzw(q.x, q.y, q.z, q.w)
}

fn to_pose(p: xr::Posef) -> Pose {
    Pose {
        orientation: to_quat(p.orientation),
        position: to_vec3(p.position),
    }
}
