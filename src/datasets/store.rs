//! JSON artifacts for multiview datasets.
//!
//! Every write goes to a staging file created next to its destination and is
//! published with an atomic rename, so a failed write never leaves a partially
//! written artifact behind.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::MultiviewDataset;
use crate::error::Result;
use crate::Float;

pub const ARTIFACT_EXTENSION: &str = "json";

/// Path of the artifact named `stem` inside `dir`.
pub fn artifact_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, ARTIFACT_EXTENSION))
}

fn staging_file(dir: &Path) -> Result<NamedTempFile> {
    fs::create_dir_all(dir)?;
    Ok(tempfile::Builder::new()
        .prefix(".staging")
        .tempfile_in(dir)?)
}

/// This function writes `dataset` as `<dir>/<stem>.json`, replacing any
/// existing artifact, and returns the published path.
pub fn save<F: Float + Serialize>(dataset: &MultiviewDataset<F>, dir: &Path, stem: &str) -> Result<PathBuf> {
    let path = artifact_path(dir, stem);
    let mut staging = staging_file(dir)?;
    {
        let mut writer = BufWriter::new(staging.as_file_mut());
        serde_json::to_writer(&mut writer, dataset)?;
        writer.flush()?;
    }
    staging.as_file().sync_all()?;
    staging.persist(&path)?;
    info!("wrote dataset artifact {}", path.display());
    Ok(path)
}

/// This function reads a dataset artifact and checks its invariants.
pub fn load<F: Float + DeserializeOwned>(path: &Path) -> Result<MultiviewDataset<F>> {
    let reader = BufReader::new(File::open(path)?);
    let dataset: MultiviewDataset<F> = serde_json::from_reader(reader)?;
    dataset.validate()?;
    Ok(dataset)
}

pub fn delete(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    info!("removed dataset artifact {}", path.display());
    Ok(())
}

/// Whether the per-worker copies `<name>0` .. `<name><nb_cores - 1>` all exist.
pub fn datasets_already_exist(dir: &Path, name: &str, nb_cores: usize) -> bool {
    (0..nb_cores).all(|core| artifact_path(dir, &format!("{}{}", name, core)).is_file())
}

/// This function copies the artifact `<name>` once per worker as
/// `<name><core>` so that parallel benchmarks never share a file. Nothing is
/// copied for a single worker or when the copies already exist. It returns the
/// path each worker should read from.
pub fn init_multiple_datasets(dir: &Path, name: &str, nb_cores: usize) -> Result<Vec<PathBuf>> {
    let source = artifact_path(dir, name);
    if nb_cores <= 1 {
        return Ok(vec![source]);
    }
    let copies = (0..nb_cores)
        .map(|core| artifact_path(dir, &format!("{}{}", name, core)))
        .collect::<Vec<_>>();
    if datasets_already_exist(dir, name, nb_cores) {
        return Ok(copies);
    }
    for copy in copies.iter() {
        let mut staging = staging_file(dir)?;
        io::copy(&mut File::open(&source)?, staging.as_file_mut())?;
        staging.persist(copy)?;
    }
    info!("copied dataset {} for {} workers", name, nb_cores);
    Ok(copies)
}

/// This function removes the per-worker copies made by
/// [`init_multiple_datasets`].
pub fn delete_multiple_datasets(dir: &Path, name: &str, nb_cores: usize) -> Result<()> {
    if nb_cores <= 1 {
        return Ok(());
    }
    for core in 0..nb_cores {
        let path = artifact_path(dir, &format!("{}{}", name, core));
        if path.is_file() {
            delete(&path)?;
        }
    }
    Ok(())
}
