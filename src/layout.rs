//! Binary layouts exchanged with the winstation API.

/// Capacity of a station name, excluding the terminator.
pub const WINSTATION_NAME_LENGTH: usize = 32;

/// Information class for the basic winstation block.
pub const WINSTATION_INFORMATION: u32 = 8;

/// Session identity record as returned by enumeration.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SessionId {
    /// Session id, doubling as the logon id of the winstation
    pub session_id: u32,
    /// Null-padded station name
    pub win_station_name: [u16; WINSTATION_NAME_LENGTH + 1],
    /// State ordinal, see [`SessionState`]
    pub state: u32,
}

impl SessionId {
    /// Build a record, truncating `name` to the station name capacity
    pub fn new(session_id: u32, name: &str, state: u32) -> Self {
        let mut win_station_name = [0u16; WINSTATION_NAME_LENGTH + 1];
        for (slot, unit) in win_station_name[..WINSTATION_NAME_LENGTH]
            .iter_mut()
            .zip(name.encode_utf16())
        {
            *slot = unit;
        }
        Self {
            session_id,
            win_station_name,
            state,
        }
    }

    /// Station name up to the first null
    pub fn station_name(&self) -> String {
        let end = self
            .win_station_name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.win_station_name.len());
        String::from_utf16_lossy(&self.win_station_name[..end])
    }
}

/// Fixed-size block filled by the query-information call.
///
/// Only `logon_id` is documented. The reserved regions carry embedded
/// strings, see [`extract_embedded_strings`](crate::extract_embedded_strings).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct WinStationInformation {
    /// Undocumented, holds the station name among other things
    pub reserved_a: [u8; 70],
    /// Zero when no user is logged on
    pub logon_id: u32,
    /// Undocumented, holds domain and user name near its end
    pub reserved_b: [u8; 1140],
}

impl WinStationInformation {
    /// All-zero block
    pub fn zeroed() -> Self {
        Self {
            reserved_a: [0; 70],
            logon_id: 0,
            reserved_b: [0; 1140],
        }
    }

    /// Size passed to the native call
    pub const fn size() -> u32 {
        std::mem::size_of::<Self>() as u32
    }
}

impl std::fmt::Debug for WinStationInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinStationInformation")
            .field("logon_id", &self.logon_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Session state
pub enum SessionState {
    /// A user is logged on to the WinStation.
    Active,
    /// The WinStation is connected to the client.
    Connected,
    /// The WinStation is in the process of connecting to the client.
    ConnectQuery,
    /// The WinStation is shadowing another WinStation.
    Shadow,
    /// The WinStation is active but the client is disconnected.
    Disconnected,
    /// The WinStation is waiting for a client to connect.
    Idle,
    /// The WinStation is listening for a connection. No user is logged on a listener session.
    Listen,
    /// The WinStation is being reset.
    Reset,
    /// The WinStation is down due to an error.
    Down,
    /// The WinStation is initializing.
    Init,
}

impl SessionState {
    /// Decode a state ordinal, `None` when it is out of range
    pub fn from_ordinal(id: u32) -> Option<Self> {
        Some(match id {
            0 => Self::Active,
            1 => Self::Connected,
            2 => Self::ConnectQuery,
            3 => Self::Shadow,
            4 => Self::Disconnected,
            5 => Self::Idle,
            6 => Self::Listen,
            7 => Self::Reset,
            8 => Self::Down,
            9 => Self::Init,
            _ => return None,
        })
    }

    /// Ordinal as reported by the subsystem
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn session_id_layout() {
        assert_eq!(offset_of!(SessionId, win_station_name), 4);
        assert_eq!(offset_of!(SessionId, state), 72);
        assert_eq!(size_of::<SessionId>(), 76);
    }

    #[test]
    fn information_block_layout() {
        assert_eq!(offset_of!(WinStationInformation, logon_id), 72);
        assert_eq!(offset_of!(WinStationInformation, reserved_b), 76);
        assert_eq!(WinStationInformation::size(), 1216);
    }

    #[test]
    fn station_name_stops_at_null() {
        let record = SessionId::new(2, "RDP-Tcp#0", 4);
        assert_eq!(record.station_name(), "RDP-Tcp#0");
    }

    #[test]
    fn station_name_is_truncated_to_capacity() {
        let record = SessionId::new(0, &"x".repeat(40), 0);
        assert_eq!(record.station_name(), "x".repeat(32));
        assert_eq!(record.win_station_name[32], 0);
    }

    #[test]
    fn state_ordinals_round_trip() {
        for id in 0..10 {
            assert_eq!(SessionState::from_ordinal(id).unwrap().ordinal(), id);
        }
        assert_eq!(SessionState::from_ordinal(4), Some(SessionState::Disconnected));
        assert_eq!(SessionState::from_ordinal(10), None);
        assert_eq!(SessionState::from_ordinal(u32::MAX), None);
    }

    #[test]
    fn state_is_read_as_unsigned() {
        let mut bytes = [0u8; 76];
        bytes[72..76].copy_from_slice(&u32::MAX.to_le_bytes());
        let record: SessionId = unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast()) };
        assert_eq!(record.state, u32::MAX);
        assert_eq!(SessionState::from_ordinal(record.state), None);
    }
}
