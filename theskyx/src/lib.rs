//! Client for TheSkyX's TCP scripting interface.
//!
//! TheSkyX accepts small JavaScript programs over a plain TCP socket and
//! answers each one with a single line of text. This crate wraps that
//! exchange in typed camera operations (connect, cooling, exposures,
//! temperature and cooler-power readout) plus the Wake-on-LAN utility used
//! to power the server host before a session.

pub mod client;
pub mod error;
pub mod wol;

pub use client::{ImageType, TheSkyXClient};
pub use error::{TheSkyXError, TheSkyXResult};
pub use wol::{magic_packet, parse_mac_address, send_wake_on_lan, WakeOnLanError};
