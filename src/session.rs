use crate::api::WinStationApi;
use crate::error::{Error, QueryFailure, Resource, Result};
use crate::extract::extract_embedded_strings;
use crate::host::HostName;
use crate::layout::{SessionId, SessionState, WinStationInformation};
use log::{error, info, trace, warn};
use std::fmt;

/// Identity decoded for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A user is logged on.
    ///
    /// `user_name` is the last string embedded in the second reserved
    /// region. That position is observed, not documented, so treat the
    /// value as a best guess.
    LoggedOn {
        /// Logon id from the information block
        logon_id: u32,
        /// Guessed user name, `None` if the region held no strings
        user_name: Option<String>,
    },
    /// Nothing could be decoded
    Unavailable(QueryFailure),
}

impl Identity {
    /// Decode the identity carried by a filled information block
    pub fn from_information(info: &WinStationInformation) -> Self {
        if info.logon_id == 0 {
            return Identity::Unavailable(QueryFailure::NoLogon);
        }
        trace!(
            "reserved region A strings: {:?}",
            extract_embedded_strings(&info.reserved_a)
        );
        let mut strings = extract_embedded_strings(&info.reserved_b);
        trace!("reserved region B strings: {:?}", strings);
        Identity::LoggedOn {
            logon_id: info.logon_id,
            user_name: strings.pop(),
        }
    }

    /// Decoded user name, if any
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Identity::LoggedOn { user_name, .. } => user_name.as_deref(),
            Identity::Unavailable(_) => None,
        }
    }
}

/// One enumerated session, ready to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Session id
    pub session_id: u32,
    /// Raw state ordinal
    pub state: u32,
    /// Station name
    pub station_name: String,
    /// Decoded identity
    pub identity: Identity,
}

impl SessionRecord {
    /// Decoded state, `None` for an unknown ordinal
    pub fn session_state(&self) -> Option<SessionState> {
        SessionState::from_ordinal(self.state)
    }
}

impl fmt::Display for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SessionID: {}", self.session_id)?;
        writeln!(f, "State: {}", self.state)?;
        write!(f, "SessionName: {}", self.station_name)?;
        match &self.identity {
            Identity::LoggedOn { user_name, .. } => write!(
                f,
                "\nUserName: {}",
                user_name.as_deref().unwrap_or_default()
            ),
            Identity::Unavailable(_) => write!(
                f,
                "\nFailed to query session info for SessionName: {}",
                self.station_name
            ),
        }
    }
}

/// Open connection to a server's session subsystem.
///
/// The handle is closed exactly once, by [`close`](Self::close) or on drop.
pub struct Server<'a, A: WinStationApi> {
    api: &'a A,
    handle: Option<A::Handle>,
}

impl<'a, A: WinStationApi> Server<'a, A> {
    /// Connect to `host`. There is no timeout: an unreachable host can
    /// block this call forever.
    pub fn open(api: &'a A, host: &HostName) -> Result<Self> {
        info!("Host-name: {}", host);
        let handle = api.open_server(host).map_err(|code| Error::ServerOpen {
            host: host.to_string(),
            code,
        })?;
        trace!("server handle: {:?}", handle);
        Ok(Self {
            api,
            handle: Some(handle),
        })
    }

    fn handle(&self) -> A::Handle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("server handle used after close"),
        }
    }

    /// Enumerate the server's sessions. The returned list is released on drop.
    pub fn enumerate(&self) -> Result<A::Sessions> {
        self.api.enumerate(self.handle()).map_err(Error::Enumeration)
    }

    /// Query the information block of `session_id`
    pub fn query(
        &self,
        session_id: u32,
    ) -> std::result::Result<WinStationInformation, QueryFailure> {
        if !self.api.can_query() {
            return Err(QueryFailure::Unsupported);
        }
        let mut info = WinStationInformation::zeroed();
        let returned = self
            .api
            .query_information(self.handle(), session_id, &mut info)
            .map_err(|code| QueryFailure::CallFailed { code })?;
        trace!(
            "session-id: {} returned {} bytes: {:?}",
            session_id,
            returned,
            info
        );
        Ok(info)
    }

    /// Turn an enumerated record into a printable one. Failures stay
    /// inside the record.
    pub fn decode(&self, record: &SessionId) -> SessionRecord {
        let station_name = record.station_name();
        let identity = match self.query(record.session_id) {
            Ok(info) => Identity::from_information(&info),
            Err(failure) => Identity::Unavailable(failure),
        };
        if let Identity::Unavailable(failure) = &identity {
            warn!(
                "couldn't query session info for {} (session-id {}): {}",
                station_name, record.session_id, failure
            );
        }
        SessionRecord {
            session_id: record.session_id,
            state: record.state,
            station_name,
            identity,
        }
    }

    /// Close the connection
    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => close_handle(self.api, handle),
            None => Ok(()),
        }
    }
}

impl<A: WinStationApi> Drop for Server<'_, A> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = close_handle(self.api, handle);
        }
    }
}

fn close_handle<A: WinStationApi>(api: &A, handle: A::Handle) -> Result<()> {
    if api.close_server(handle) {
        trace!("closed server handle: {:?}", handle);
        Ok(())
    } else {
        error!("failed to close server handle: {:?}", handle);
        Err(Error::ResourceRelease(Resource::ServerHandle))
    }
}

/// Outcome of a pass that got as far as cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Whether enumeration succeeded
    pub enumerated: bool,
    /// Number of records handed to the sink
    pub sessions_reported: usize,
}

/// Receives the results of a pass as they are produced
pub trait SessionSink {
    /// Enumeration succeeded and `count` sessions follow
    fn enumerated(&mut self, _count: usize) {}

    /// One decoded session
    fn session(&mut self, record: SessionRecord);
}

impl SessionSink for Vec<SessionRecord> {
    fn session(&mut self, record: SessionRecord) {
        self.push(record);
    }
}

/// A single enumeration pass over one host.
///
/// Owns the capability table and unloads it once the pass is over, after
/// the server handle and the enumerated records are gone.
pub struct SessionQuery<A: WinStationApi> {
    api: A,
}

impl<A: WinStationApi> SessionQuery<A> {
    /// Take ownership of a resolved capability table
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Enumerate `host`, handing every decoded session to `sink`.
    ///
    /// A failed enumeration is logged and the pass goes on to cleanup.
    /// Errors from open and from releasing native resources are returned,
    /// after everything acquired has been released. When both the handle
    /// and the module fail to release, the handle's error is returned.
    pub fn run<S: SessionSink>(self, host: &HostName, sink: &mut S) -> Result<PassSummary> {
        let pass = enumerate_pass(&self.api, host, sink);
        let unloaded = if self.api.unload() {
            trace!("unloaded capability module");
            Ok(())
        } else {
            error!("failed to unload capability module");
            Err(Error::ResourceRelease(Resource::Module))
        };
        let summary = pass?;
        unloaded?;
        Ok(summary)
    }
}

fn enumerate_pass<A, S>(api: &A, host: &HostName, sink: &mut S) -> Result<PassSummary>
where
    A: WinStationApi,
    S: SessionSink,
{
    let server = Server::open(api, host)?;
    let mut summary = PassSummary::default();
    match server.enumerate() {
        Ok(sessions) => {
            info!("session count is: {}", sessions.len());
            summary.enumerated = true;
            sink.enumerated(sessions.len());
            for record in sessions.iter() {
                sink.session(server.decode(record));
                summary.sessions_reported += 1;
            }
        }
        Err(e) => warn!("{}", e),
    }
    server.close()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(parts: &[&str]) -> Vec<u8> {
        parts
            .iter()
            .flat_map(|s| s.encode_utf16().chain(std::iter::once(0)))
            .flat_map(u16::to_le_bytes)
            .collect()
    }

    fn block(logon_id: u32, reserved_b: &[&str]) -> WinStationInformation {
        let mut info = WinStationInformation::zeroed();
        info.logon_id = logon_id;
        let bytes = wide(reserved_b);
        let start = info.reserved_b.len() - bytes.len() - 8;
        info.reserved_b[start..start + bytes.len()].copy_from_slice(&bytes);
        info
    }

    #[test]
    fn last_string_of_second_region_is_the_user() {
        let identity = Identity::from_information(&block(7, &["Domain\\Example", "jdoe"]));
        assert_eq!(
            identity,
            Identity::LoggedOn {
                logon_id: 7,
                user_name: Some("jdoe".to_string()),
            }
        );
    }

    #[test]
    fn zero_logon_id_suppresses_extraction() {
        let identity = Identity::from_information(&block(0, &["Domain\\Example", "jdoe"]));
        assert_eq!(identity, Identity::Unavailable(QueryFailure::NoLogon));
        assert_eq!(identity.user_name(), None);
    }

    #[test]
    fn logged_on_with_empty_region_has_no_name() {
        let identity = Identity::from_information(&block(3, &[]));
        assert_eq!(
            identity,
            Identity::LoggedOn {
                logon_id: 3,
                user_name: None,
            }
        );
    }

    #[test]
    fn display_with_user() {
        let record = SessionRecord {
            session_id: 2,
            state: 4,
            station_name: "RDP-Tcp#0".into(),
            identity: Identity::LoggedOn {
                logon_id: 7,
                user_name: Some("jdoe".into()),
            },
        };
        assert_eq!(
            record.to_string(),
            "SessionID: 2\nState: 4\nSessionName: RDP-Tcp#0\nUserName: jdoe"
        );
        assert_eq!(record.session_state(), Some(SessionState::Disconnected));
    }

    #[test]
    fn display_without_identity() {
        let record = SessionRecord {
            session_id: 1,
            state: 0,
            station_name: "Console".into(),
            identity: Identity::Unavailable(QueryFailure::NoLogon),
        };
        assert_eq!(
            record.to_string(),
            "SessionID: 1\nState: 0\nSessionName: Console\n\
             Failed to query session info for SessionName: Console"
        );
    }
}
