use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::models::{DatasetId, VideoDataset, VideoExample, ViewMode};

const SIDEBAR_COLLAPSED_KEY: &str = "sidebar_collapsed";
const VIEW_MODE_KEY: &str = "view_mode";

/// Local persisted state: UI preferences and video fine-tune datasets.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open catalog database {}", path.display()))?;
        let catalog = Self { conn };
        catalog.migrate()?;
        Ok(catalog)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.migrate()?;
        Ok(catalog)
    }

    fn migrate(&self) -> Result<()> {
        info!("running catalog migrations");
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS video_datasets (
                id         INTEGER PRIMARY KEY,
                name       TEXT NOT NULL,
                examples   TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    fn preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        debug!(key, value, "set preference");
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn sidebar_collapsed(&self) -> Result<bool> {
        Ok(self.preference(SIDEBAR_COLLAPSED_KEY)?.as_deref() == Some("true"))
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.set_preference(SIDEBAR_COLLAPSED_KEY, if collapsed { "true" } else { "false" })
    }

    /// Stored view mode. Unknown stored values fall back to the default.
    pub fn view_mode(&self) -> Result<ViewMode> {
        Ok(self
            .preference(VIEW_MODE_KEY)?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default())
    }

    pub fn set_view_mode(&self, mode: ViewMode) -> Result<()> {
        self.set_preference(VIEW_MODE_KEY, mode.as_str())
    }

    pub fn create_dataset(&self, name: &str) -> Result<DatasetId> {
        self.conn.execute(
            "INSERT INTO video_datasets (name) VALUES (?1)",
            params![name],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, name, "created video dataset");
        Ok(id)
    }

    pub fn list_datasets(&self) -> Result<Vec<VideoDataset>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, examples, created_at, updated_at
             FROM video_datasets ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_raw_dataset)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawDataset::decode).collect()
    }

    pub fn get_dataset(&self, id: DatasetId) -> Result<Option<VideoDataset>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, name, examples, created_at, updated_at
                 FROM video_datasets WHERE id = ?1",
                params![id],
                row_to_raw_dataset,
            )
            .optional()?;
        raw.map(RawDataset::decode).transpose()
    }

    /// Append examples to a dataset. Returns `false` if the dataset does not
    /// exist.
    pub fn add_examples(&self, id: DatasetId, examples: &[VideoExample]) -> Result<bool> {
        let Some(mut dataset) = self.get_dataset(id)? else {
            return Ok(false);
        };
        dataset.examples.extend_from_slice(examples);
        self.store_examples(id, &dataset.examples)?;
        info!(id, added = examples.len(), total = dataset.examples.len(), "examples added");
        Ok(true)
    }

    /// Remove one example by id. Returns `false` if nothing was removed.
    pub fn remove_example(&self, id: DatasetId, example_id: &str) -> Result<bool> {
        let Some(mut dataset) = self.get_dataset(id)? else {
            return Ok(false);
        };
        let before = dataset.examples.len();
        dataset.examples.retain(|e| e.id != example_id);
        if dataset.examples.len() == before {
            return Ok(false);
        }
        self.store_examples(id, &dataset.examples)?;
        Ok(true)
    }

    fn store_examples(&self, id: DatasetId, examples: &[VideoExample]) -> Result<()> {
        let json = serde_json::to_string(examples).context("serialize dataset examples")?;
        self.conn.execute(
            "UPDATE video_datasets SET examples = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![json, id],
        )?;
        Ok(())
    }

    pub fn rename_dataset(&self, id: DatasetId, name: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE video_datasets SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![name, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_dataset(&self, id: DatasetId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM video_datasets WHERE id = ?1", params![id])?;
        if changed > 0 {
            info!(id, "deleted video dataset");
        }
        Ok(changed > 0)
    }

    pub fn dataset_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM video_datasets", [], |row| row.get(0))?)
    }
}

struct RawDataset {
    id: DatasetId,
    name: String,
    examples: String,
    created_at: String,
    updated_at: String,
}

impl RawDataset {
    fn decode(self) -> Result<VideoDataset> {
        let examples = serde_json::from_str(&self.examples)
            .with_context(|| format!("corrupt examples in dataset {}", self.id))?;
        Ok(VideoDataset {
            id: self.id,
            name: self.name,
            examples,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn row_to_raw_dataset(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDataset> {
    Ok(RawDataset {
        id: row.get(0)?,
        name: row.get(1)?,
        examples: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
