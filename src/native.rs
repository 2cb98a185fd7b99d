//! `winsta.dll` resolved at runtime.

use crate::api::{NativeCode, WinStationApi};
use crate::error::{Error, Result};
use crate::host::HostName;
use crate::layout::{SessionId, WinStationInformation, WINSTATION_INFORMATION};
use crate::loader::{load_module, resolve_entry_points};
use log::{error, info};
use std::{
    ffi::{c_void, CString},
    mem,
    ops::Deref,
    ptr, slice,
};
use windows::{
    core::{PCSTR, PCWSTR},
    Win32::{
        Foundation::{FreeLibrary, GetLastError, LocalFree, HLOCAL, HMODULE},
        System::LibraryLoader::{GetProcAddress, LoadLibraryW},
    },
};
use winsafe::WString;

/// Default capability module
pub const WINSTA_DLL: &str = "winsta.dll";

type RawProc = unsafe extern "system" fn() -> isize;
type OpenServerFn = unsafe extern "system" fn(*mut u16) -> *mut c_void;
type CloseServerFn = unsafe extern "system" fn(*mut c_void) -> u8;
type EnumerateFn = unsafe extern "system" fn(*mut c_void, *mut *mut SessionId, *mut u32) -> u8;
type QueryInformationFn =
    unsafe extern "system" fn(*mut c_void, u32, u32, *mut c_void, u32, *mut u32) -> u8;

struct CapabilityTable {
    open_server: OpenServerFn,
    close_server: CloseServerFn,
    enumerate: EnumerateFn,
    query_information: QueryInformationFn,
}

impl CapabilityTable {
    fn resolve(module: HMODULE) -> Result<Self> {
        let [open_server, close_server, enumerate, query_information] =
            resolve_entry_points(|name| {
                let symbol = CString::new(name).ok()?;
                unsafe { GetProcAddress(module, PCSTR(symbol.as_ptr().cast())) }
            })?;
        // SAFETY: each export has the signature of the field it lands in
        unsafe {
            Ok(Self {
                open_server: mem::transmute::<RawProc, OpenServerFn>(open_server),
                close_server: mem::transmute::<RawProc, CloseServerFn>(close_server),
                enumerate: mem::transmute::<RawProc, EnumerateFn>(enumerate),
                query_information: mem::transmute::<RawProc, QueryInformationFn>(
                    query_information,
                ),
            })
        }
    }
}

fn last_error() -> NativeCode {
    unsafe { GetLastError() }.0
}

/// Server handle returned by `WinStationOpenServerW`
#[derive(Debug, Clone, Copy)]
pub struct ServerHandle(*mut c_void);

/// Session array allocated by `WinStationEnumerateW`, freed on drop
pub struct SessionIdList {
    sessions: *mut SessionId,
    count: usize,
}

impl Deref for SessionIdList {
    type Target = [SessionId];

    fn deref(&self) -> &[SessionId] {
        if self.sessions.is_null() {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.sessions, self.count) }
    }
}

impl Drop for SessionIdList {
    fn drop(&mut self) {
        if self.sessions.is_null() {
            return;
        }
        let leftover = unsafe { LocalFree(HLOCAL(self.sessions.cast())) };
        if !leftover.0.is_null() {
            error!("failed to free session list. error-code: {:?}", last_error());
        }
    }
}

/// The loaded `winsta.dll` with all four entry points resolved.
///
/// The module is freed by [`unload`](WinStationApi::unload), or on drop if
/// the value is never unloaded.
pub struct WinStation {
    module: HMODULE,
    table: CapabilityTable,
}

impl WinStation {
    /// Load `path` and resolve every entry point. A missing entry point
    /// frees the module again before returning the error.
    pub fn load(path: &str) -> Result<Self> {
        let (module, table) = load_module(
            || {
                let mut wide_path = WString::from_str(path);
                unsafe { LoadLibraryW(PCWSTR(wide_path.as_mut_ptr().cast_const())) }.map_err(
                    |_| Error::ModuleLoad {
                        module: path.to_string(),
                        code: last_error(),
                    },
                )
            },
            |&module| CapabilityTable::resolve(module),
            |module| unsafe { FreeLibrary(module) }.is_ok(),
        )?;
        info!("loaded {}", path);
        Ok(Self { module, table })
    }
}

impl Drop for WinStation {
    fn drop(&mut self) {
        if let Err(e) = unsafe { FreeLibrary(self.module) } {
            error!("failed to free capability module: {}", e);
        }
    }
}

impl WinStationApi for WinStation {
    type Handle = ServerHandle;
    type Sessions = SessionIdList;

    fn open_server(&self, host: &HostName) -> std::result::Result<ServerHandle, NativeCode> {
        let mut server_name = WString::from_str(host.as_str());
        let handle = unsafe { (self.table.open_server)(server_name.as_mut_ptr()) };
        if handle.is_null() {
            Err(last_error())
        } else {
            Ok(ServerHandle(handle))
        }
    }

    fn close_server(&self, handle: ServerHandle) -> bool {
        unsafe { (self.table.close_server)(handle.0) != 0 }
    }

    fn enumerate(&self, handle: ServerHandle) -> std::result::Result<SessionIdList, NativeCode> {
        let mut sessions: *mut SessionId = ptr::null_mut();
        let mut count = 0u32;
        match unsafe { (self.table.enumerate)(handle.0, &mut sessions, &mut count) } {
            0 => Err(last_error()),
            _ => Ok(SessionIdList {
                sessions,
                count: count as usize,
            }),
        }
    }

    fn query_information(
        &self,
        handle: ServerHandle,
        session_id: u32,
        info: &mut WinStationInformation,
    ) -> std::result::Result<u32, NativeCode> {
        let mut returned = 0u32;
        let ok = unsafe {
            (self.table.query_information)(
                handle.0,
                session_id,
                WINSTATION_INFORMATION,
                (info as *mut WinStationInformation).cast(),
                WinStationInformation::size(),
                &mut returned,
            )
        };
        match ok {
            0 => Err(last_error()),
            _ => Ok(returned),
        }
    }

    fn unload(self) -> bool {
        let module = self.module;
        mem::forget(self);
        unsafe { FreeLibrary(module) }.is_ok()
    }
}
