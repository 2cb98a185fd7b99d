#![warn(missing_docs)]

//! # To query terminal-services sessions (winstations)
//!
//! Lists the sessions of a local or remote host through the undocumented
//! `winsta.dll` API, and guesses the logged-on user of each one from the
//! reserved regions of its information block.
//!
//! The pass itself is written against [`WinStationApi`], so it runs the
//! same way over the real module ([`WinStation`], Windows only) and over
//! an in-memory table.

mod api;
mod error;
mod extract;
mod host;
mod layout;
mod loader;
#[cfg(windows)]
mod native;
mod session;

pub use api::{NativeCode, WinStationApi};
pub use error::{Error, QueryFailure, Resource, Result};
pub use extract::extract_embedded_strings;
pub use host::{HostName, MAX_HOST_NAME_LEN};
pub use layout::{
    SessionId, SessionState, WinStationInformation, WINSTATION_INFORMATION,
    WINSTATION_NAME_LENGTH,
};
pub use loader::ENTRY_POINTS;
#[cfg(windows)]
pub use native::{ServerHandle, SessionIdList, WinStation, WINSTA_DLL};
pub use session::{
    Identity, PassSummary, Server, SessionQuery, SessionRecord, SessionSink,
};
