use crate::{ASSIGNABLE_ROLE_COUNT, PoseTableReader, TrackerRole};
use std::ffi::c_char;
use tracker_common::{Transform, once_cell::sync::Lazy, parking_lot::Mutex};

static POSE_TABLE: Lazy<Mutex<Option<PoseTableReader>>> = Lazy::new(|| Mutex::new(None));

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VtQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}
impl Default for VtQuat {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VtTransform {
    pub rotation: VtQuat,
    /// Application units
    pub translation: [f32; 3],
    pub scale: [f32; 3],
}

impl From<Transform> for VtTransform {
    fn from(transform: Transform) -> Self {
        let [x, y, z, w] = transform.rotation.to_array();

        Self {
            rotation: VtQuat { x, y, z, w },
            translation: transform.translation.to_array(),
            scale: transform.scale.to_array(),
        }
    }
}

// Makes the transforms of a tracker module visible to C callers. Replaces any previous table.
pub fn register_pose_table(reader: PoseTableReader) {
    *POSE_TABLE.lock() = Some(reader);
}

pub fn unregister_pose_table() {
    *POSE_TABLE.lock() = None;
}

#[unsafe(no_mangle)]
pub extern "C" fn vt_tracker_role_count() -> u32 {
    ASSIGNABLE_ROLE_COUNT as u32
}

#[unsafe(no_mangle)]
pub extern "C" fn vt_device_type_name() -> *const c_char {
    c"ViveTracker".as_ptr()
}

/// Writes the last known transform of `role` (ordinal of the tracker role enum) into `out`.
/// Returns false, with `out` set to identity, for unknown roles or when no module registered its
/// pose table.
///
/// # Safety
///
/// `out` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vt_get_tracker_transform(role: u32, out: *mut VtTransform) -> bool {
    let Some(out) = (unsafe { out.as_mut() }) else {
        return false;
    };

    let transform = TrackerRole::from_ordinal(role).and_then(|role| {
        POSE_TABLE
            .lock()
            .as_ref()
            .map(|reader| reader.get_tracker_transform(role))
    });

    *out = transform.unwrap_or(Transform::IDENTITY).into();

    transform.is_some()
}
