//! Identity resolution
//!
//! Expands every input, reads each matched file once, and assigns symbol ids.
//! Files are read concurrently but inserted in input order and sorted path
//! order, so the resulting map is deterministic.

use futures::future::try_join_all;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ResolvedInput;
use crate::discovery::Discovery;
use crate::error::{Result, SpriteError};
use crate::runtime::{Runtime, RuntimeError};

/// Symbol id → entry, in insertion order
pub type SymbolMap = IndexMap<String, ResolvedEntry>;

/// One discovered icon
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub symbol_id: String,
    /// Path relative to the input's base dir
    pub match_path: String,
    pub file_path: PathBuf,
    /// Content captured at discovery time
    pub content: Arc<str>,
    pub input: Arc<ResolvedInput>,
}

/// A file dropped because an earlier file already claimed its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSymbol {
    pub symbol_id: String,
    pub kept: PathBuf,
    pub dropped: PathBuf,
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub map: SymbolMap,
    pub duplicates: Vec<DuplicateSymbol>,
}

struct LoadedFile {
    match_path: String,
    file_path: PathBuf,
    content: String,
}

/// Walk one input on the blocking pool
async fn discover_input(
    input: &Arc<ResolvedInput>,
    discovery: &Arc<dyn Discovery>,
) -> Result<Vec<String>> {
    let input = Arc::clone(input);
    let discovery = Arc::clone(discovery);
    tokio::task::spawn_blocking(move || discovery.discover(&input.pattern, &input.base_dir))
        .await
        .map_err(|e| SpriteError::Runtime(RuntimeError::Other(format!("Task join error: {}", e))))?
}

async fn load_input(
    input: &Arc<ResolvedInput>,
    discovery: &Arc<dyn Discovery>,
    runtime: &dyn Runtime,
) -> Result<Vec<LoadedFile>> {
    let mut matches = discover_input(input, discovery).await?;
    matches.sort();

    try_join_all(matches.into_iter().map(|match_path| async move {
        let file_path = input.base_dir.join(&match_path);
        let content = runtime.read_to_string(&file_path).await?;
        Ok::<_, SpriteError>(LoadedFile {
            match_path,
            file_path,
            content,
        })
    }))
    .await
}

/// Build the full symbol map for `inputs`
///
/// Directory walks run on tokio's blocking pool; file reads go through
/// `runtime`.
pub async fn resolve(
    inputs: &[Arc<ResolvedInput>],
    discovery: &Arc<dyn Discovery>,
    runtime: &dyn Runtime,
) -> Result<Resolution> {
    let loaded = try_join_all(
        inputs
            .iter()
            .map(|input| load_input(input, discovery, runtime)),
    )
    .await?;

    let mut resolution = Resolution::default();

    for (input, files) in inputs.iter().zip(loaded) {
        for file in files {
            let symbol_id = input.symbol_id_for(&file.match_path, &file.file_path, &file.content);

            if let Some(existing) = resolution.map.get(&symbol_id) {
                tracing::warn!(
                    "[fob-sprite] Duplicate symbol id '{}': keeping {}, ignoring {}",
                    symbol_id,
                    existing.file_path.display(),
                    file.file_path.display()
                );
                resolution.duplicates.push(DuplicateSymbol {
                    symbol_id,
                    kept: existing.file_path.clone(),
                    dropped: file.file_path,
                });
                continue;
            }

            resolution.map.insert(
                symbol_id.clone(),
                ResolvedEntry {
                    symbol_id,
                    match_path: file.match_path,
                    file_path: file.file_path,
                    content: Arc::from(file.content),
                    input: Arc::clone(input),
                },
            );
        }
    }

    tracing::debug!(
        "[fob-sprite] Resolved {} symbol(s) from {} input(s)",
        resolution.map.len(),
        inputs.len()
    );

    Ok(resolution)
}
