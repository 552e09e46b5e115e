use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{debug, info};

use crate::data::{SavedSnapshot, Snapshot};
use crate::flatten::{Table, flatten_listings};

/// Sortable and safe to use in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<SavedSnapshot>;
}

/// Writes each snapshot as a CSV/JSON pair into one directory.
pub struct FileSnapshotStore {
    output_dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn path_for(&self, stem: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.{extension}"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<SavedSnapshot> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Can't create output directory {}", self.output_dir.display())
        })?;

        let stem = snapshot_stem(&snapshot.captured_at, &snapshot.contract);
        let table = flatten_listings(&snapshot.listings);
        debug!(
            "Flattened {} listings into {} columns",
            table.rows.len(),
            table.columns.len()
        );

        let csv_path = self.path_for(&stem, "csv");
        write_csv(&csv_path, &table)?;
        info!("Saved CSV file: {}", csv_path.display());

        let json_path = self.path_for(&stem, "json");
        write_json(&json_path, snapshot)?;
        info!("Saved JSON file: {}", json_path.display());

        Ok(SavedSnapshot {
            csv_path,
            json_path,
            rows: table.rows.len(),
        })
    }
}

/// File name without extension shared by both artifacts of a snapshot.
pub fn snapshot_stem(captured_at: &DateTime<Local>, contract: &str) -> String {
    let timestamp = captured_at.format(TIMESTAMP_FORMAT);
    format!("active_listings_{timestamp}_{contract}")
}

fn write_csv(path: &Path, table: &Table) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Can't create {}", path.display()))?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let record = table
            .columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or_default());
        writer.write_record(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Can't write {}", path.display()))?;

    Ok(())
}

fn write_json(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Can't create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &snapshot.listings)
        .with_context(|| format!("Can't write {}", path.display()))?;
    writer.flush()?;

    Ok(())
}
