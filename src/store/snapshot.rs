//! Disk snapshot of the record store
//!
//! Parsing every data file on each run is slow, so the validated observations
//! are saved as gzipped JSON after the first load, along with the input
//! configuration that they were loaded with. A snapshot is only reused if
//! that configuration is unchanged.

use super::{Observation, RecordStore};
use crate::{config::InputConfig, Result};
use anyhow::Context;
use async_compression::tokio::{bufread::GzipDecoder, write::GzipEncoder};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
};

/// Snapshot file contents, as written
#[derive(Serialize)]
struct SnapshotRef<'a> {
    input: &'a InputConfig,
    observations: &'a [Observation],
}

/// Snapshot file contents, as read back
#[derive(Deserialize)]
struct Snapshot {
    input: InputConfig,
    observations: Vec<Observation>,
}

/// Default snapshot location, within the user's cache directory
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
        .context("determining the snapshot's location")?;
    Ok(dirs.cache_dir().join("snapshot.json.gz"))
}

/// Save a record store, along with the input configuration it was loaded with
///
/// The snapshot is first written to a temporary file, then moved into place,
/// so that an interrupted save does not leave a truncated snapshot behind.
pub async fn save(path: &Path, input: &InputConfig, store: &RecordStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .context("setting up the snapshot directory")?;
    }
    let json = serde_json::to_vec(&SnapshotRef {
        input,
        observations: store.observations(),
    })
    .context("converting the record store to JSON")?;

    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path)
        .await
        .context("creating the temporary snapshot file")?;
    let mut encoder = GzipEncoder::new(file);
    encoder
        .write_all(&json)
        .await
        .context("writing down the snapshot")?;
    encoder
        .shutdown()
        .await
        .context("finishing the snapshot file")?;
    fs::rename(&temp_path, path)
        .await
        .context("moving the snapshot into place")?;
    log::info!(
        "Saved {} observations to snapshot {}",
        store.observations().len(),
        path.display()
    );
    Ok(())
}

/// Load a previously saved record store
///
/// Returns `None` if there is no snapshot at this location, or if it was
/// saved with a different input configuration.
pub async fn load(path: &Path, input: &InputConfig) -> Result<Option<RecordStore>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("No snapshot at {}, will load data files", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e).context("opening the snapshot file"),
    };
    let mut json = Vec::new();
    GzipDecoder::new(BufReader::new(file))
        .read_to_end(&mut json)
        .await
        .context("reading the snapshot file")?;
    let snapshot: Snapshot =
        serde_json::from_slice(&json).context("parsing the snapshot's JSON")?;
    if snapshot.input != *input {
        log::info!("Snapshot was taken with other data files, will load data files");
        log::debug!("Snapshot input configuration was {:?}", snapshot.input);
        return Ok(None);
    }
    let store = RecordStore::new(snapshot.observations).context("validating the snapshot")?;
    log::info!(
        "Loaded {} observations from snapshot {}",
        store.observations().len(),
        path.display()
    );
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::tests::store_from_rows, Gender};
    use pretty_assertions::assert_eq;

    fn input(data_dir: &str) -> InputConfig {
        InputConfig {
            data_dir: data_dir.into(),
            regions: vec!["AK".into(), "WA".into()].into(),
        }
    }

    #[tokio::test]
    async fn saved_store_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json.gz");
        let store = store_from_rows(&[
            ("WA", Gender::Male, 1993, "John", 120),
            ("AK", Gender::Female, 1990, "Mary", 95),
        ]);
        save(&path, &input("data"), &store).await.unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = load(&path, &input("data")).await.unwrap();
        assert_eq!(loaded, Some(store));
    }

    #[tokio::test]
    async fn snapshot_of_other_input_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json.gz");
        let store = store_from_rows(&[("WA", Gender::Male, 1993, "John", 120)]);
        save(&path, &input("data"), &store).await.unwrap();
        assert_eq!(load(&path, &input("elsewhere")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_snapshot_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json.gz");
        assert_eq!(load(&path, &input("data")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupted_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();
        assert!(load(&path, &input("data")).await.is_err());
    }
}
