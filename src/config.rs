//! Process configuration

use crate::{regions, store::snapshot, Args, Region, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

/// Final process configuration
///
/// This is the result of digesting [`Args`]. Please refer to [`Args`] to know
/// more about the meaning of each field.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Subset of the configuration that affects which data is loaded
    pub input: InputConfig,

    /// Location of the dataset snapshot, if snapshots are enabled
    pub snapshot: Option<PathBuf>,

    /// Truth that results should be emitted as JSON
    pub json: bool,
}
//
impl Config {
    /// Determine process configuration from CLI arguments
    pub(crate) fn new(args: &Args) -> Result<Arc<Self>> {
        let regions = if args.regions.is_empty() {
            (regions::all().iter())
                .map(|region| Region::from(region.code))
                .collect()
        } else {
            let mut regions = (args.regions.iter())
                .map(|code| regions::get(code).map(|region| Region::from(region.code)))
                .collect::<Result<Vec<_>>>()?;
            regions.sort_unstable();
            regions.dedup();
            regions.into()
        };
        let snapshot =
            snapshot_path(args.no_cache, args.snapshot.as_ref(), snapshot::default_path);
        Ok(Arc::new(Self {
            input: InputConfig {
                data_dir: args.data_dir.clone(),
                regions,
            },
            snapshot,
            json: args.json,
        }))
    }
}

/// Pick the snapshot location, if snapshots are enabled
///
/// Failing to locate the default snapshot only disables snapshots, as the
/// dataset can still be loaded from the data files.
fn snapshot_path(
    no_cache: bool,
    requested: Option<&PathBuf>,
    default_path: impl FnOnce() -> Result<PathBuf>,
) -> Option<PathBuf> {
    if no_cache {
        return None;
    }
    if let Some(path) = requested {
        return Some(path.clone());
    }
    match default_path() {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Snapshots are disabled: {e:#}");
            None
        }
    }
}

/// Subset of the configuration that affects which data is loaded
///
/// Recorded into dataset snapshots, so that a snapshot built from other data
/// files is not mistaken for the requested dataset.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct InputConfig {
    /// Directory where the per-region data files are located
    pub data_dir: PathBuf,

    /// Regions whose data files are loaded, sorted by code
    pub regions: Box<[Region]>,
}
