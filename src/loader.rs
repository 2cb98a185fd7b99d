//! Capability module setup, independent of how symbols are looked up.

#![cfg_attr(not(windows), allow(dead_code))]

use crate::error::{Error, Resource, Result};
use log::{error, trace};

/// Entry points every capability module must export, in lookup order.
pub const ENTRY_POINTS: [&str; 4] = [
    "WinStationOpenServerW",
    "WinStationCloseServer",
    "WinStationEnumerateW",
    "WinStationQueryInformationW",
];

/// Look up every name in [`ENTRY_POINTS`], stopping at the first one
/// `lookup` cannot find.
pub(crate) fn resolve_entry_points<P>(
    mut lookup: impl FnMut(&'static str) -> Option<P>,
) -> Result<[P; 4]> {
    let [open, close, enumerate, query] = ENTRY_POINTS;
    let mut find = |name: &'static str| -> Result<P> {
        let proc = lookup(name).ok_or(Error::MissingCapability(name))?;
        trace!("resolved {}", name);
        Ok(proc)
    };
    Ok([find(open)?, find(close)?, find(enumerate)?, find(query)?])
}

/// Open a module and build its table.
///
/// If `build` fails the module is handed to `release` once before the
/// error is returned. A failed `open` releases nothing.
pub(crate) fn load_module<M, T>(
    open: impl FnOnce() -> Result<M>,
    build: impl FnOnce(&M) -> Result<T>,
    release: impl FnOnce(M) -> bool,
) -> Result<(M, T)> {
    let module = open()?;
    match build(&module) {
        Ok(table) => Ok((module, table)),
        Err(e) => {
            if !release(module) {
                error!("failed to release {} after: {}", Resource::Module, e);
            }
            Err(e)
        }
    }
}
