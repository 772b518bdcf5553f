use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::world::store::TileStore;
use crate::world::tile::{Colour, Tile, TileError, TileKind};

/// One placed tile in a saved layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub position: [f64; 2],
    pub colour: String,
}

/// Metadata about a layout file on disk.
#[derive(Debug, Clone)]
pub struct LayoutMetadata {
    pub path: PathBuf,
    pub tile_count: usize,
    pub timestamp: u64,
    pub file_size: u64,
}

#[derive(Debug)]
pub enum LayoutError {
    Io(io::Error),
    Parse(String),
    Serialize(String),
    InvalidRecord { index: usize, source: TileError },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Io(e) => write!(f, "I/O error: {}", e),
            LayoutError::Parse(e) => write!(f, "Invalid layout file: {}", e),
            LayoutError::Serialize(e) => write!(f, "Serialization error: {}", e),
            LayoutError::InvalidRecord { index, source } => {
                write!(f, "Layout record {}: {}", index, source)
            }
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Io(e) => Some(e),
            LayoutError::InvalidRecord { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for LayoutError {
    fn from(e: io::Error) -> Self {
        LayoutError::Io(e)
    }
}

/// Name of a saved layout: `layout-{tiles}tiles-{timestamp}-{seq}.json`.
///
/// `seq` separates layouts of the same size saved within the same second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LayoutName {
    timestamp: u64,
    seq: u32,
    tile_count: usize,
}

impl LayoutName {
    fn file_name(&self) -> String {
        format!(
            "layout-{}tiles-{}-{}.json",
            self.tile_count, self.timestamp, self.seq
        )
    }

    fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix("layout-")?.strip_suffix(".json")?;
        let (count, stamp) = rest.split_once("tiles-")?;
        let (timestamp, seq) = stamp.split_once('-')?;
        Some(Self {
            timestamp: timestamp.parse().ok()?,
            seq: seq.parse().ok()?,
            tile_count: count.parse().ok()?,
        })
    }
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Normal tiles of `store` as layout records, ordered by tile id.
pub fn layout_from_store(store: &TileStore) -> Vec<LayoutRecord> {
    store
        .tiles_of_kind(TileKind::Normal)
        .into_iter()
        .map(|t| LayoutRecord {
            position: [t.position.x, t.position.y],
            colour: t.colour.as_str().to_string(),
        })
        .collect()
}

/// Validate records into tiles sized and aligned for `store`.
pub fn records_to_tiles(
    records: &[LayoutRecord],
    store: &TileStore,
) -> Result<Vec<Tile>, LayoutError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let [x, y] = record.position;
            store
                .make_tile(DVec2::new(x, y), TileKind::Normal, Colour::new(&record.colour))
                .map_err(|source| LayoutError::InvalidRecord { index, source })
        })
        .collect()
}

pub fn parse_layout(content: &str) -> Result<Vec<LayoutRecord>, LayoutError> {
    serde_json::from_str(content).map_err(|e| LayoutError::Parse(e.to_string()))
}

pub fn load_layout(path: &Path) -> Result<Vec<LayoutRecord>, LayoutError> {
    let content = fs::read_to_string(path)?;
    parse_layout(&content)
}

/// Save the normal tiles of `store` as a new file in `layout_dir`.
///
/// The encoded records go to a hidden staging file which is then hard-linked
/// under the first free name, so an existing layout is never replaced and a
/// reader never sees a half-written file.
pub fn save_layout(store: &TileStore, layout_dir: &Path) -> Result<PathBuf, LayoutError> {
    let records = layout_from_store(store);
    let encoded =
        serde_json::to_vec_pretty(&records).map_err(|e| LayoutError::Serialize(e.to_string()))?;

    fs::create_dir_all(layout_dir)?;
    let mut name = LayoutName {
        timestamp: unix_timestamp_now(),
        seq: 0,
        tile_count: records.len(),
    };
    let staging = layout_dir.join(format!(".{}.tmp", name.file_name()));
    fs::write(&staging, &encoded).inspect_err(|_| {
        let _ = fs::remove_file(&staging);
    })?;

    let linked = loop {
        let target = layout_dir.join(name.file_name());
        match fs::hard_link(&staging, &target) {
            Ok(()) => break Ok(target),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => name.seq += 1,
            Err(e) => break Err(e),
        }
    };
    let _ = fs::remove_file(&staging);
    linked.map_err(LayoutError::Io)
}

/// Layout files in `layout_dir`, newest first. A missing directory holds no
/// layouts; hidden staging files and unrelated names are skipped.
pub fn list_layouts(layout_dir: &Path) -> Result<Vec<LayoutMetadata>, LayoutError> {
    let entries = match fs::read_dir(layout_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found: Vec<(LayoutName, LayoutMetadata)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().and_then(LayoutName::parse) else {
            continue;
        };
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        found.push((
            name,
            LayoutMetadata {
                path: entry.path(),
                tile_count: name.tile_count,
                timestamp: name.timestamp,
                file_size: meta.len(),
            },
        ));
    }

    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found.into_iter().map(|(_, meta)| meta).collect())
}
