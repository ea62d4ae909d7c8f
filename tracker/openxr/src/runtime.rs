use crate::roles::TrackerRole;
use openxr::{self as xr, sys};

#[derive(Clone, Copy, Debug)]
pub struct SpaceLocation {
    pub location_flags: xr::SpaceLocationFlags,
    pub pose: xr::Posef,
}

impl SpaceLocation {
    pub fn is_fully_tracked(&self) -> bool {
        self.location_flags.contains(
            xr::SpaceLocationFlags::ORIENTATION_VALID | xr::SpaceLocationFlags::POSITION_VALID,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuggestedBinding {
    pub action: sys::Action,
    pub binding: xr::Path,
    pub role: TrackerRole,
}

/// Paths of one tracker known to the runtime: its stable identity and the role it is currently
/// assigned to. The role path is null while the tracker has no role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerPaths {
    pub persistent_path: xr::Path,
    pub role_path: xr::Path,
}

/// Entry point exposed by the tracker extension to list the trackers currently known to the
/// runtime. Follows the OpenXR two-call idiom: with an empty buffer only the count is returned,
/// otherwise up to `paths.len()` entries are written and the number written is returned.
pub trait TrackerPathEnumerator {
    fn enumerate(&self, paths: &mut [TrackerPaths]) -> xr::Result<u32>;
}

/// Services of the host XR runtime used by the tracker module. Handles are the raw OpenXR handles
/// handed over by the host, so the module can work with an instance and session it does not own.
pub trait TrackerRuntime {
    fn create_action_set(
        &mut self,
        instance: sys::Instance,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<sys::ActionSet>;

    fn destroy_action_set(&mut self, action_set: sys::ActionSet) -> xr::Result<()>;

    fn create_pose_action(
        &mut self,
        action_set: sys::ActionSet,
        name: &str,
        localized_name: &str,
    ) -> xr::Result<sys::Action>;

    fn destroy_action(&mut self, action: sys::Action) -> xr::Result<()>;

    fn create_action_space(
        &mut self,
        session: sys::Session,
        action: sys::Action,
        pose_in_action_space: xr::Posef,
    ) -> xr::Result<sys::Space>;

    fn destroy_space(&mut self, space: sys::Space) -> xr::Result<()>;

    fn string_to_path(&self, instance: sys::Instance, path: &str) -> xr::Result<xr::Path>;

    fn path_to_string(&self, instance: sys::Instance, path: xr::Path) -> xr::Result<String>;

    fn suggest_interaction_profile_bindings(
        &mut self,
        instance: sys::Instance,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()>;

    fn locate_space(
        &self,
        space: sys::Space,
        base_space: sys::Space,
        time: xr::Time,
    ) -> xr::Result<SpaceLocation>;

    /// The enumeration entry point is an extension function looked up by name; runtimes that do
    /// not expose it return None.
    fn resolve_tracker_path_enumerator(
        &self,
        instance: sys::Instance,
    ) -> Option<Box<dyn TrackerPathEnumerator>>;
}

// Trackers connecting between the count and the fill call make the runtime report
// ERROR_SIZE_INSUFFICIENT, in which case the count is queried again
const MAX_ENUMERATION_ATTEMPTS: usize = 3;

pub fn enumerate_tracker_paths(
    enumerator: &dyn TrackerPathEnumerator,
) -> xr::Result<Vec<TrackerPaths>> {
    for _ in 0..MAX_ENUMERATION_ATTEMPTS {
        let count = enumerator.enumerate(&mut [])?;
        if count == 0 {
            return Ok(vec![]);
        }

        let mut paths = vec![TrackerPaths::default(); count as usize];
        match enumerator.enumerate(&mut paths) {
            Ok(written) => {
                paths.truncate(written as usize);

                return Ok(paths);
            }
            Err(sys::Result::ERROR_SIZE_INSUFFICIENT) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(sys::Result::ERROR_SIZE_INSUFFICIENT)
}
