//! Application lifecycle: startup preparation, server mode, shutdown

pub mod lifetime;
pub mod modes;
