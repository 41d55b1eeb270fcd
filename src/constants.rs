// src/constants.rs

use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_ROOT_DIR: &str = "/srv/ftp";
pub const DEFAULT_WELCOME_BANNER: &str = "ferroftpd ready.";

pub const DEFAULT_DATA_BUFFER_BYTES: usize = 128 * 1024;
pub const DEFAULT_CONTROL_BUFFER_BYTES: usize = 4 * 1024;

pub const DEFAULT_PASSIVE_PORT_MIN: u16 = 49152;
pub const DEFAULT_PASSIVE_PORT_MAX: u16 = 65535;

pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 50;
pub const DEFAULT_CONTROL_IDLE_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_MAX_CLIENTS: u16 = 9;

/// Source port attempted for active-mode data connections.
pub const ACTIVE_SOURCE_PORT: u16 = 20;

pub const LISTEN_BACKLOG: u32 = 64;

/// Delay between attempts to recreate a dead control listener.
pub const LISTENER_REBIND_DELAY: Duration = Duration::from_secs(5);
