//! Reading of the per-region data files
//!
//! Each region has a `<REGION>.TXT` file in the data directory, made of
//! comma-separated `region,gender,year,name,count` rows with no header.

use crate::{
    config::Config,
    progress::{ProgressReport, ProgressTracker, Work},
    regions,
    store::{builder::StoreBuilder, RawObservation, RecordStore},
    Region, Result,
};
use anyhow::Context;
use csv_async::AsyncReaderBuilder;
use futures::stream::StreamExt;
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tokio::{fs, task::JoinSet};
use tokio_util::io::InspectReader;

/// Read the data files of every configured region and collect their rows
/// into a record store
///
/// Regions whose data file is missing are skipped with a warning, but at
/// least one data file must be found.
pub async fn read_all(config: Arc<Config>, report: &ProgressReport) -> Result<RecordStore> {
    // Find out which data files are available, and how large they are
    let data_dir = &config.input.data_dir;
    let mut files = Vec::with_capacity(config.input.regions.len());
    let mut total_bytes = 0;
    for region in config.input.regions.iter() {
        let path = data_dir.join(regions::get(region)?.file_name());
        match fs::metadata(&path).await {
            Ok(metadata) => {
                total_bytes += metadata.len();
                files.push((region.clone(), path));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No data file for region {region} at {}, skipping it", path.display());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("probing data file {}", path.display()))
            }
        }
    }
    anyhow::ensure!(
        !files.is_empty(),
        "no data file found in directory {}",
        data_dir.display()
    );
    log::info!("Reading {} data files ({total_bytes} bytes)", files.len());

    // Track data file reads
    let loaded = report.add("Loading data files", Work::Steps(files.len()));
    let bytes = report.add("Reading data", Work::Bytes(total_bytes));

    // Start reading data files
    let mut data_files = JoinSet::new();
    for (region, path) in files {
        data_files.spawn(read_region_file(region, path, bytes.clone()));
    }

    // Collect rows from data files as reads finish
    let mut builder = StoreBuilder::new();
    while let Some(file_data) = data_files.join_next().await {
        let (region, rows) = file_data.context("collecting results from one data file")??;
        builder.add_file(region, rows);
        loaded.make_progress(1);
    }
    builder.finish().context("validating data file rows")
}

/// Read the rows of one region's data file
async fn read_region_file(
    region: Region,
    path: PathBuf,
    bytes: ProgressTracker,
) -> Result<(Region, Vec<RawObservation>)> {
    let file = fs::File::open(&path)
        .await
        .with_context(|| format!("opening data file {}", path.display()))?;

    // Track how many bytes have been read so far
    let file = InspectReader::new(file, move |chunk: &[u8]| {
        bytes.make_progress(chunk.len() as u64);
    });

    // Rows with missing fields are let through, to be reported by validation
    let mut entries = AsyncReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .create_deserializer(file)
        .into_deserialize::<RawObservation>();

    let mut rows = Vec::new();
    while let Some(entry) = entries.next().await {
        rows.push(entry.with_context(|| format!("parsing data file {}", path.display()))?);
    }
    Ok((region, rows))
}
