use std::fmt;

/// Failures of a session query pass.
///
/// Per-session query failures are not in here, they travel with the
/// record they belong to as [`QueryFailure`](crate::QueryFailure).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Host name rejected before any native call.
    #[error("server name exceeds maximum length: {len} > {max}")]
    InvalidHostName {
        /// Length in UTF-16 units
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// The capability module could not be loaded.
    #[error("failed to load {module}. error-code: {code:?}")]
    ModuleLoad {
        /// Module path as requested
        module: String,
        /// Native error code
        code: u32,
    },

    /// A required entry point is absent from the capability module.
    #[error("failed to find function: {0}")]
    MissingCapability(&'static str),

    /// The open call returned a null handle.
    #[error("failed to open server {host}. error-code: {code:?}")]
    ServerOpen {
        /// Host the open was attempted on
        host: String,
        /// Native error code
        code: u32,
    },

    /// Session enumeration failed.
    #[error("failed to enumerate sessions. error-code: {0:?}")]
    Enumeration(u32),

    /// A native resource could not be released.
    #[error("failed to release {0}")]
    ResourceRelease(Resource),
}

/// Native resources held during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Connection to the target's session subsystem
    ServerHandle,
    /// The loaded capability module
    Module,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::ServerHandle => f.write_str("server handle"),
            Resource::Module => f.write_str("capability module"),
        }
    }
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a session's identity could not be decoded.
///
/// Never fatal, the pass moves on to the next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryFailure {
    /// The query entry point is not available
    #[error("query entry point unavailable")]
    Unsupported,
    /// The query call itself failed
    #[error("query failed. error-code: {code:?}")]
    CallFailed {
        /// Native error code
        code: u32,
    },
    /// The block reports no logged-on user
    #[error("no logon attached")]
    NoLogon,
}
