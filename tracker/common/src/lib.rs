pub mod logging;
mod primitives;

pub use anyhow;
pub use glam;
pub use log::{debug, error, info, warn};
pub use logging::{ToAny, show_err, show_warn};
pub use once_cell;
pub use parking_lot;
pub use primitives::*;
