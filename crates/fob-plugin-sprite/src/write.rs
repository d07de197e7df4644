//! Generated artifact writes
//!
//! Every write here is change-detected: a file whose current content already
//! matches is left untouched, so watchers and incremental tooling never see
//! spurious modifications.

use std::path::Path;

use crate::error::Result;
use crate::resolve::SymbolMap;
use crate::runtime::{Runtime, RuntimeError};

/// Header line of the block appended to `.gitignore`
pub const GITIGNORE_MARKER: &str = "# svg spritegen";

/// What a write call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl WriteOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}

async fn create(runtime: &dyn Runtime, path: &Path, content: &str) -> Result<WriteOutcome> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !runtime.exists(parent) {
            runtime.create_dir_all(parent).await?;
        }
    }
    runtime.write_file(path, content.as_bytes()).await?;
    Ok(WriteOutcome::Created)
}

/// Write `content` unless the file already holds exactly that
pub async fn write_if_changed(
    runtime: &dyn Runtime,
    path: &Path,
    content: &str,
) -> Result<WriteOutcome> {
    match runtime.read_to_string(path).await {
        Ok(current) if current == content => Ok(WriteOutcome::Unchanged),
        Ok(_) | Err(RuntimeError::InvalidUtf8(_)) => {
            runtime.write_file(path, content.as_bytes()).await?;
            Ok(WriteOutcome::Updated)
        }
        Err(RuntimeError::FileNotFound(_)) => create(runtime, path, content).await,
        Err(e) => Err(e.into()),
    }
}

/// Create an empty file when none exists
pub async fn ensure_file(runtime: &dyn Runtime, path: &Path) -> Result<WriteOutcome> {
    if runtime.exists(path) {
        return Ok(WriteOutcome::Unchanged);
    }
    create(runtime, path, "").await
}

/// Append the ignore block for the generated files, once
pub async fn write_gitignore(
    runtime: &dyn Runtime,
    path: &Path,
    sprite_file_name: &str,
    types_file_name: &str,
) -> Result<WriteOutcome> {
    let block = [GITIGNORE_MARKER, sprite_file_name, types_file_name].join("\n");

    match runtime.read_to_string(path).await {
        Ok(current) if current.contains(&block) => Ok(WriteOutcome::Unchanged),
        Ok(current) => {
            let content = format!("{}\n{}", current, block);
            runtime.write_file(path, content.as_bytes()).await?;
            Ok(WriteOutcome::Updated)
        }
        Err(RuntimeError::FileNotFound(_)) => create(runtime, path, &block).await,
        Err(e) => Err(e.into()),
    }
}

fn quote_ts(id: &str) -> String {
    format!("'{}'", id.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render the types listing for `ids`
///
/// `.json` files get a plain array; anything else a TypeScript module
/// exporting `iconNames` and the `IconName` union.
pub fn render_types(file_name: &str, ids: &[&str]) -> String {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();

    if file_name.ends_with(".json") {
        let mut json = serde_json::to_string_pretty(&sorted).unwrap_or_else(|_| "[]".to_string());
        json.push('\n');
        return json;
    }

    let mut lines = vec![
        "/* eslint-disable */".to_string(),
        String::new(),
        "// This file is autogenerated. Do not commit to source control.".to_string(),
        String::new(),
        "export type IconName = (typeof iconNames)[number];".to_string(),
        String::new(),
        "export const iconNames = [".to_string(),
    ];
    lines.extend(sorted.iter().map(|id| format!("  {},", quote_ts(id))));
    lines.push("] as const;".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// Write the types listing for every id in `map`
pub async fn write_types(
    runtime: &dyn Runtime,
    path: &Path,
    map: &SymbolMap,
) -> Result<WriteOutcome> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ids: Vec<&str> = map.keys().map(String::as_str).collect();
    write_if_changed(runtime, path, &render_types(&file_name, &ids)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::MemoryRuntime;

    #[tokio::test]
    async fn test_write_if_changed_lifecycle() {
        let runtime = MemoryRuntime::new();
        let path = Path::new("/out/sprite.svg");

        assert_eq!(
            write_if_changed(&runtime, path, "a").await.unwrap(),
            WriteOutcome::Created
        );
        assert_eq!(
            write_if_changed(&runtime, path, "a").await.unwrap(),
            WriteOutcome::Unchanged
        );
        assert_eq!(
            write_if_changed(&runtime, path, "b").await.unwrap(),
            WriteOutcome::Updated
        );
        assert_eq!(runtime.write_count(path), 2);
        assert_eq!(runtime.content(path).as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_ensure_file_never_truncates() {
        let runtime = MemoryRuntime::new();
        let path = Path::new("/out/sprite.svg");
        runtime.seed(path, "<svg>old</svg>");

        assert_eq!(
            ensure_file(&runtime, path).await.unwrap(),
            WriteOutcome::Unchanged
        );
        assert_eq!(runtime.content(path).as_deref(), Some("<svg>old</svg>"));

        let fresh = Path::new("/out/other.svg");
        assert_eq!(ensure_file(&runtime, fresh).await.unwrap(), WriteOutcome::Created);
        assert_eq!(runtime.content(fresh).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_gitignore_appended_once() {
        let runtime = MemoryRuntime::new();
        let path = Path::new("/out/.gitignore");
        runtime.seed(path, "node_modules");

        write_gitignore(&runtime, path, "sprite.svg", "types.ts")
            .await
            .unwrap();
        let outcome = write_gitignore(&runtime, path, "sprite.svg", "types.ts")
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(
            runtime.content(path).as_deref(),
            Some("node_modules\n# svg spritegen\nsprite.svg\ntypes.ts")
        );
    }

    #[tokio::test]
    async fn test_gitignore_created() {
        let runtime = MemoryRuntime::new();
        let path = Path::new("/out/.gitignore");

        let outcome = write_gitignore(&runtime, path, "icons.svg", "icons.d.ts")
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(
            runtime.content(path).as_deref(),
            Some("# svg spritegen\nicons.svg\nicons.d.ts")
        );
    }

    #[test]
    fn test_render_ts_types_sorted() {
        let content = render_types("types.ts", &["b", "a"]);
        assert_eq!(
            content,
            "/* eslint-disable */\n\n// This file is autogenerated. Do not commit to source control.\n\nexport type IconName = (typeof iconNames)[number];\n\nexport const iconNames = [\n  'a',\n  'b',\n] as const;\n"
        );
    }

    #[test]
    fn test_render_empty_ts_types() {
        let content = render_types("types.ts", &[]);
        assert!(content.ends_with("export const iconNames = [\n] as const;\n"));
    }

    #[test]
    fn test_render_json_types() {
        assert_eq!(render_types("icons.json", &["b", "a"]), "[\n  \"a\",\n  \"b\"\n]\n");
    }

    #[test]
    fn test_ids_are_quoted() {
        let content = render_types("types.ts", &["it's"]);
        assert!(content.contains(r"  'it\'s',"));
    }
}
