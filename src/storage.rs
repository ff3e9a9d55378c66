//! Flat-file persistence for the price series, plus the session-scoped
//! cached loader the dashboard reads through.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use crate::model::{PriceSample, PriceSeries};
use crate::{InsightsError, Result};

/// File name of the persisted series inside the storage directory.
pub const PRICE_FILE: &str = "btc_price_data.csv";

/// Default storage directory, relative to the working directory.
pub const DATA_DIR: &str = "data";

fn storage_err<E: std::fmt::Display>(e: E) -> InsightsError {
    InsightsError::Storage(e.to_string())
}

/// Reads and writes the `timestamp,price` CSV file under one base
/// directory.
pub struct PriceStore {
    base_dir: PathBuf,
}

impl PriceStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the CSV file this store owns.
    pub fn file_path(&self) -> PathBuf {
        self.base_dir.join(PRICE_FILE)
    }

    /// Serializes the series and replaces the data file.
    ///
    /// The bytes go to a `.tmp` sibling first and a rename publishes them,
    /// so a crash mid-write leaves the previous file intact. The base
    /// directory is created when absent.
    pub async fn save(&self, series: &[PriceSample]) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(storage_err)?;

        // Header row `timestamp,price` comes from the struct field names.
        let mut writer = csv::Writer::from_writer(Vec::new());
        for sample in series {
            writer.serialize(sample).map_err(storage_err)?;
        }
        let bytes = writer.into_inner().map_err(storage_err)?;

        let tmp_path = self.base_dir.join(format!("{PRICE_FILE}.tmp"));
        fs::write(&tmp_path, bytes).await.map_err(storage_err)?;
        fs::rename(&tmp_path, self.file_path())
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Reads the data file back into a series, in file order.
    pub async fn load(&self) -> Result<PriceSeries> {
        let path = self.file_path();
        let content = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InsightsError::DataFileMissing(path));
            }
            Err(e) => return Err(storage_err(e)),
        };

        let mut reader = csv::Reader::from_reader(content.as_slice());
        let mut series = PriceSeries::new();
        for record in reader.deserialize() {
            series.push(record.map_err(storage_err)?);
        }
        Ok(series)
    }

    /// Modification time of the data file; missing file maps to the same
    /// typed error as [`PriceStore::load`].
    pub async fn modified(&self) -> Result<SystemTime> {
        let path = self.file_path();
        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InsightsError::DataFileMissing(path));
            }
            Err(e) => return Err(storage_err(e)),
        };
        meta.modified().map_err(storage_err)
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new(DATA_DIR)
    }
}

/// Load-once memoization over [`PriceStore::load`], keyed on the data
/// file's modification time.
///
/// Mtime granularity is filesystem-dependent; [`CachedLoader::invalidate`]
/// forces the next load to re-read regardless of the observed key.
pub struct CachedLoader {
    store: PriceStore,
    cached: Option<(SystemTime, PriceSeries)>,
}

impl CachedLoader {
    pub fn new(store: PriceStore) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    /// The series as of the last observed file version; hits the disk only
    /// when the file changed since the cached copy.
    pub async fn load(&mut self) -> Result<&PriceSeries> {
        let modified = self.store.modified().await?;
        let fresh = matches!(&self.cached, Some((at, _)) if *at == modified);
        if !fresh {
            let series = self.store.load().await?;
            self.cached = Some((modified, series));
        }
        match &self.cached {
            Some((_, series)) => Ok(series),
            // Unreachable: one of the branches above filled the cache.
            None => Err(InsightsError::Storage("loader cache is empty".into())),
        }
    }

    /// Drops the cached copy; the next [`CachedLoader::load`] re-reads
    /// unconditionally.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl Default for CachedLoader {
    fn default() -> Self {
        Self::new(PriceStore::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn sample_series() -> PriceSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        [64123.5, 64124.01, 64120.99]
            .iter()
            .enumerate()
            .map(|(i, &price)| PriceSample {
                timestamp: t0 + Duration::minutes(i as i64),
                price,
            })
            .collect()
    }

    #[tokio::test]
    async fn round_trip_preserves_pairs() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path());
        let series = sample_series();

        store.save(&series).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, series);
    }

    #[tokio::test]
    async fn file_has_expected_header() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path());
        store.save(&sample_series()).await.unwrap();

        let text = std::fs::read_to_string(store.file_path()).unwrap();
        assert_eq!(text.lines().next(), Some("timestamp,price"));
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path().join("nested").join("data"));
        store.save(&sample_series()).await.unwrap();
        assert!(store.file_path().exists());
        // The staging file must not survive the rename.
        assert!(!store.file_path().with_extension("csv.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_is_a_typed_error() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, InsightsError::DataFileMissing(_)));

        let mut loader = CachedLoader::new(PriceStore::new(dir.path()));
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, InsightsError::DataFileMissing(_)));
    }

    #[tokio::test]
    async fn invalidate_forces_reread() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path());
        let first = sample_series();
        store.save(&first).await.unwrap();

        let mut loader = CachedLoader::new(PriceStore::new(dir.path()));
        assert_eq!(loader.load().await.unwrap(), &first);

        let mut second = first.clone();
        second[0].price = 70000.0;
        store.save(&second).await.unwrap();

        // Regardless of mtime resolution, an explicit invalidation must
        // surface the rewritten file.
        loader.invalidate();
        assert_eq!(loader.load().await.unwrap(), &second);
    }

    #[tokio::test]
    async fn cached_copy_is_stable_between_loads() {
        let dir = tempdir().unwrap();
        let store = PriceStore::new(dir.path());
        let series = sample_series();
        store.save(&series).await.unwrap();

        let mut loader = CachedLoader::new(PriceStore::new(dir.path()));
        let first = loader.load().await.unwrap().clone();
        let second = loader.load().await.unwrap().clone();
        assert_eq!(first, second);
    }
}
