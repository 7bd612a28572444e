//! Icon handles and the process-wide icon cache

pub mod icon_cache;
pub mod icons;
