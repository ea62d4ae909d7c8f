use crate::{
    events::TrackerEvent,
    runtime::{SpaceLocation, SuggestedBinding, TrackerPathEnumerator, TrackerPaths, TrackerRuntime},
};
use openxr::{self as xr, sys, sys::pfn::VoidFunction};
use std::{
    ffi::{CStr, CString, c_char},
    mem, ptr,
};

fn xr_res(result: sys::Result) -> xr::Result<()> {
    if result.into_raw() >= 0 {
        Ok(())
    } else {
        Err(result)
    }
}

// Fixed size, NUL terminated name fields of the create-info structs
fn write_cstr<const N: usize>(value: &str, out: &mut [c_char; N]) -> xr::Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() >= N || bytes.contains(&0) {
        return Err(sys::Result::ERROR_NAME_INVALID);
    }

    for (dst, src) in out.iter_mut().zip(bytes) {
        *dst = *src as c_char;
    }
    out[bytes.len()] = 0;

    Ok(())
}

pub fn enable_required_extensions(extensions: &mut xr::ExtensionSet) {
    extensions.htcx_vive_tracker_interaction = true;
}

/// Reduces a raw runtime event to a [`TrackerEvent`], looking only at its type tag.
///
/// # Safety
///
/// `header` must point to a valid event structure whose actual type matches its `ty` field.
pub unsafe fn tracker_event_from_raw(header: *const sys::EventDataBaseHeader) -> TrackerEvent {
    let ty = unsafe { (*header).ty };

    if ty == sys::StructureType::EVENT_DATA_SESSION_STATE_CHANGED {
        let event = unsafe { &*header.cast::<sys::EventDataSessionStateChanged>() };

        TrackerEvent::SessionStateChanged(event.state)
    } else if ty == sys::StructureType::EVENT_DATA_VIVE_TRACKER_CONNECTED_HTCX {
        let event = unsafe { &*header.cast::<sys::EventDataViveTrackerConnectedHTCX>() };

        match unsafe { event.paths.as_ref() } {
            Some(paths) => TrackerEvent::ViveTrackerConnected(TrackerPaths {
                persistent_path: paths.persistent_path,
                role_path: paths.role_path,
            }),
            None => TrackerEvent::Other(ty),
        }
    } else {
        TrackerEvent::Other(ty)
    }
}

struct ViveTrackerPathEnumerator {
    // Keeps the loader alive while the function pointer is in use
    _instance: xr::Instance,
    instance_handle: sys::Instance,
    enumerate_paths: sys::pfn::EnumerateViveTrackerPathsHTCX,
}

impl TrackerPathEnumerator for ViveTrackerPathEnumerator {
    fn enumerate(&self, paths: &mut [TrackerPaths]) -> xr::Result<u32> {
        let mut raw_paths = vec![
            sys::ViveTrackerPathsHTCX {
                ty: sys::ViveTrackerPathsHTCX::TYPE,
                next: ptr::null_mut(),
                persistent_path: xr::Path::NULL,
                role_path: xr::Path::NULL,
            };
            paths.len()
        ];

        let mut count = 0;
        unsafe {
            xr_res((self.enumerate_paths)(
                self.instance_handle,
                raw_paths.len() as u32,
                &mut count,
                if raw_paths.is_empty() {
                    ptr::null_mut()
                } else {
                    raw_paths.as_mut_ptr()
                },
            ))?;
        }

        for (dst, src) in paths.iter_mut().zip(&raw_paths) {
            *dst = TrackerPaths {
                persistent_path: src.persistent_path,
                role_path: src.role_path,
            };
        }

        Ok(count)
    }
}

/// [`TrackerRuntime`] backed by the OpenXR loader of the host instance.
pub struct OpenXrRuntime {
    instance: xr::Instance,
}

impl OpenXrRuntime {
    pub fn new(instance: xr::Instance) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &xr::Instance {
        &self.instance
    }

    fn get_instance_proc<T>(&self, instance: sys::Instance, name: &CStr) -> Option<T> {
        debug_assert_eq!(mem::size_of::<T>(), mem::size_of::<VoidFunction>());

        unsafe {
            let mut function = None;
            let result = (self.instance.fp().get_instance_proc_addr)(
                instance,
                name.as_ptr(),
                &mut function,
            );
            xr_res(result).ok()?;

            function.map(|pfn| mem::transmute_copy::<VoidFunction, T>(&pfn))
        }
    }
}

impl TrackerRuntime for OpenXrRuntime {
    fn create_action_set(
        &mut self,
        instance: sys::Instance,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<sys::ActionSet> {
        let mut info = sys::ActionSetCreateInfo {
            ty: sys::ActionSetCreateInfo::TYPE,
            next: ptr::null(),
            action_set_name: [0; sys::MAX_ACTION_SET_NAME_SIZE],
            localized_action_set_name: [0; sys::MAX_LOCALIZED_ACTION_SET_NAME_SIZE],
            priority,
        };
        write_cstr(name, &mut info.action_set_name)?;
        write_cstr(localized_name, &mut info.localized_action_set_name)?;

        let mut action_set = sys::ActionSet::NULL;
        unsafe {
            xr_res((self.instance.fp().create_action_set)(
                instance,
                &info,
                &mut action_set,
            ))?;
        }

        Ok(action_set)
    }

    fn destroy_action_set(&mut self, action_set: sys::ActionSet) -> xr::Result<()> {
        unsafe { xr_res((self.instance.fp().destroy_action_set)(action_set)) }
    }

    fn create_pose_action(
        &mut self,
        action_set: sys::ActionSet,
        name: &str,
        localized_name: &str,
    ) -> xr::Result<sys::Action> {
        let mut info = sys::ActionCreateInfo {
            ty: sys::ActionCreateInfo::TYPE,
            next: ptr::null(),
            action_name: [0; sys::MAX_ACTION_NAME_SIZE],
            action_type: xr::ActionType::POSE_INPUT,
            count_subaction_paths: 0,
            subaction_paths: ptr::null(),
            localized_action_name: [0; sys::MAX_LOCALIZED_ACTION_NAME_SIZE],
        };
        write_cstr(name, &mut info.action_name)?;
        write_cstr(localized_name, &mut info.localized_action_name)?;

        let mut action = sys::Action::NULL;
        unsafe {
            xr_res((self.instance.fp().create_action)(
                action_set,
                &info,
                &mut action,
            ))?;
        }

        Ok(action)
    }

    fn destroy_action(&mut self, action: sys::Action) -> xr::Result<()> {
        unsafe { xr_res((self.instance.fp().destroy_action)(action)) }
    }

    fn create_action_space(
        &mut self,
        session: sys::Session,
        action: sys::Action,
        pose_in_action_space: xr::Posef,
    ) -> xr::Result<sys::Space> {
        let info = sys::ActionSpaceCreateInfo {
            ty: sys::ActionSpaceCreateInfo::TYPE,
            next: ptr::null(),
            action,
            subaction_path: xr::Path::NULL,
            pose_in_action_space,
        };

        let mut space = sys::Space::NULL;
        unsafe {
            xr_res((self.instance.fp().create_action_space)(
                session, &info, &mut space,
            ))?;
        }

        Ok(space)
    }

    fn destroy_space(&mut self, space: sys::Space) -> xr::Result<()> {
        unsafe { xr_res((self.instance.fp().destroy_space)(space)) }
    }

    fn string_to_path(&self, instance: sys::Instance, path: &str) -> xr::Result<xr::Path> {
        let path_cstr = CString::new(path).map_err(|_| sys::Result::ERROR_PATH_FORMAT_INVALID)?;

        let mut xr_path = xr::Path::NULL;
        unsafe {
            xr_res((self.instance.fp().string_to_path)(
                instance,
                path_cstr.as_ptr(),
                &mut xr_path,
            ))?;
        }

        Ok(xr_path)
    }

    fn path_to_string(&self, instance: sys::Instance, path: xr::Path) -> xr::Result<String> {
        let mut buffer = vec![0 as c_char; sys::MAX_PATH_LENGTH];
        let mut count = 0;
        unsafe {
            xr_res((self.instance.fp().path_to_string)(
                instance,
                path,
                buffer.len() as u32,
                &mut count,
                buffer.as_mut_ptr(),
            ))?;
        }

        // `count` includes the NUL terminator
        let bytes = buffer[..(count as usize).saturating_sub(1)]
            .iter()
            .map(|c| *c as u8)
            .collect::<Vec<_>>();

        String::from_utf8(bytes).map_err(|_| sys::Result::ERROR_PATH_INVALID)
    }

    fn suggest_interaction_profile_bindings(
        &mut self,
        instance: sys::Instance,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()> {
        let suggested_bindings = bindings
            .iter()
            .map(|binding| sys::ActionSuggestedBinding {
                action: binding.action,
                binding: binding.binding,
            })
            .collect::<Vec<_>>();

        let info = sys::InteractionProfileSuggestedBinding {
            ty: sys::InteractionProfileSuggestedBinding::TYPE,
            next: ptr::null(),
            interaction_profile,
            count_suggested_bindings: suggested_bindings.len() as u32,
            suggested_bindings: suggested_bindings.as_ptr(),
        };

        unsafe {
            xr_res((self.instance.fp().suggest_interaction_profile_bindings)(
                instance, &info,
            ))
        }
    }

    fn locate_space(
        &self,
        space: sys::Space,
        base_space: sys::Space,
        time: xr::Time,
    ) -> xr::Result<SpaceLocation> {
        let mut location = sys::SpaceLocation {
            ty: sys::SpaceLocation::TYPE,
            next: ptr::null_mut(),
            location_flags: xr::SpaceLocationFlags::EMPTY,
            pose: xr::Posef::IDENTITY,
        };
        unsafe {
            xr_res((self.instance.fp().locate_space)(
                space,
                base_space,
                time,
                &mut location,
            ))?;
        }

        Ok(SpaceLocation {
            location_flags: location.location_flags,
            pose: location.pose,
        })
    }

    fn resolve_tracker_path_enumerator(
        &self,
        instance: sys::Instance,
    ) -> Option<Box<dyn TrackerPathEnumerator>> {
        let enumerate_paths = self.get_instance_proc::<sys::pfn::EnumerateViveTrackerPathsHTCX>(
            instance,
            c"xrEnumerateViveTrackerPathsHTCX",
        )?;

        Some(Box::new(ViveTrackerPathEnumerator {
            _instance: self.instance.clone(),
            instance_handle: instance,
            enumerate_paths,
        }))
    }
}
