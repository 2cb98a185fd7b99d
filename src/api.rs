use crate::host::HostName;
use crate::layout::{SessionId, WinStationInformation};
use std::fmt::Debug;
use std::ops::Deref;

/// Native error code as returned by `GetLastError`
pub type NativeCode = u32;

/// Table of winstation entry points a session pass runs against.
///
/// An implementation is only handed out once every entry point resolved,
/// and it owns the module they live in until [`unload`](Self::unload).
pub trait WinStationApi {
    /// Open connection to a server
    type Handle: Copy + Debug;
    /// Enumerated records, released back to the subsystem on drop
    type Sessions: Deref<Target = [SessionId]>;

    /// Connect to `host`. May block indefinitely if the host is unreachable.
    fn open_server(&self, host: &HostName) -> Result<Self::Handle, NativeCode>;

    /// Release a handle from [`open_server`](Self::open_server), `false` on failure
    fn close_server(&self, handle: Self::Handle) -> bool;

    /// List the sessions of the server behind `handle`
    fn enumerate(&self, handle: Self::Handle) -> Result<Self::Sessions, NativeCode>;

    /// Whether the query entry point can be called at all
    fn can_query(&self) -> bool {
        true
    }

    /// Fill `info` with the basic winstation block of `session_id`,
    /// returning the number of bytes written
    fn query_information(
        &self,
        handle: Self::Handle,
        session_id: u32,
        info: &mut WinStationInformation,
    ) -> Result<u32, NativeCode>;

    /// Release the module. Every entry point is invalid afterwards.
    fn unload(self) -> bool
    where
        Self: Sized;
}
