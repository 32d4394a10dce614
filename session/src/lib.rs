//! Calibration-frame acquisition sessions for TheSkyX.
//!
//! A [`Session`] takes a plan of bias and dark [`FrameSet`]s, a scheduling
//! [`SessionWindow`], and a [`CoolingPolicy`], then drives a TheSkyX server
//! through the whole unattended run: optional Wake-on-LAN, cooling with
//! retries, download-time calibration, frame acquisition against the
//! deadline, warm-up, and disconnect. Progress flows back over a broadcast
//! [`SessionEvent`] channel, and a shared [`SessionGuard`] cancels the run
//! from any task.

pub mod cooling;
pub mod events;
pub mod frame_set;
pub mod guard;
pub mod orchestrator;
pub mod timing;
pub mod window;

pub use cooling::CoolingPolicy;
pub use events::{SessionEvent, SessionOutcome};
pub use frame_set::{BiasFrameSet, DarkFrameSet, FrameSet, NUMBER_OF_DISPLAY_FIELDS};
pub use guard::SessionGuard;
pub use orchestrator::{
    spawn_cooler_power_poll, ServerConfig, Session, SessionTuning, SharedFrameSets,
    WakeOnLanConfig,
};
pub use timing::{casual_interval_format, DownloadTimeTable};
pub use window::SessionWindow;
