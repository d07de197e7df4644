//! Rolldown plugin that bundles SVG icons into a single sprite
//!
//! Icons matched by one or more input globs become `<symbol>` elements of one
//! sprite document. A types file listing every symbol id is generated next to
//! it. In production builds the plugin scans processed modules for icon
//! references and emits a sprite holding only the symbols actually used.
//!
//! ## Architecture
//!
//! ```text
//! input globs → resolve() → SymbolMap ──────────────┬─▶ compose() → sprite.svg
//!                                │                   │
//! module_parsed() → ReferenceTracker::scan() → used ─┘   (production + stripUnused)
//!                                │
//!                                └─▶ types.ts / .gitignore
//! ```
//!
//! The [`SpriteCoordinator`] owns the session state; [`FobSpritePlugin`] is
//! the thin Rolldown adapter driving it: `build_start` discovers icons,
//! `module_parsed` scans each module, `generate_bundle` places the sprite in
//! every output, and `close_bundle`/`close_watcher` end the session.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_sprite::{BuildMode, FobSpritePlugin, InputConfig, SpritePluginConfig};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SpritePluginConfig::new("src/icons")
//!     .with_input(InputConfig::new("assets/icons").with_prefix("icon-"));
//!
//! // Use with your Rolldown bundler configuration
//! let plugin = Arc::new(FobSpritePlugin::new(&config, BuildMode::Production)?);
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use rolldown_common::{ModuleInfo, NormalModule, Output, OutputAsset};
use rolldown_plugin::{
    HookBuildStartArgs, HookGenerateBundleArgs, HookNoopReturn, HookUsage, Plugin, PluginContext,
    PluginHookMeta, PluginOrder,
};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

mod compose;
mod config;
mod coordinator;
mod discovery;
mod error;
mod filter;
mod fingerprint;
mod matcher;
mod optimize;
mod resolve;
pub mod runtime;
mod tracker;
mod watch;
mod write;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
pub mod logging;

pub use compose::compose;
pub use config::{
    default_symbol_id, InputConfig, Inputs, OptimizeOption, ResolvedConfig, ResolvedInput,
    ResolvedStripUnused, SpritePluginConfig, StripUnusedConfig, StripUnusedOption, SymbolIdFn,
    SymbolIdInput, DEFAULT_CONFIG_FILE,
};
pub use coordinator::{BuildMode, FinalSprite, Phase, SpriteCoordinator};
pub use discovery::{Discovery, GlobDiscovery};
pub use error::{Result, SpriteError};
pub use filter::SourceFilter;
pub use fingerprint::{content_hash, hashed_file_name, short_hash};
pub use matcher::{ReferenceMatcher, RegexMatcher, DEFAULT_REFERENCE_PATTERN};
pub use optimize::{BuiltinOptimizer, OptimizeConfig, OptimizeError, OptimizeStep, SvgOptimizer};
pub use resolve::{resolve, DuplicateSymbol, Resolution, ResolvedEntry, SymbolMap};
pub use runtime::{NativeRuntime, Runtime, RuntimeError};
pub use tracker::ReferenceTracker;
pub use watch::{FileChange, SpriteWatcher};
pub use write::{
    ensure_file, render_types, write_gitignore, write_if_changed, write_types, WriteOutcome,
};

/// Rolldown plugin that builds the SVG sprite
///
/// Each build starts a fresh session in `build_start`. Parsed modules are
/// forwarded to the coordinator's tracker; `generate_bundle` composes the
/// pruned sprite once and places it in the bundle of every output.
#[derive(Clone, Debug)]
pub struct FobSpritePlugin {
    coordinator: Arc<SpriteCoordinator>,
}

impl FobSpritePlugin {
    /// Create the plugin for a build in `mode`
    pub fn new(config: &SpritePluginConfig, mode: BuildMode) -> Result<Self> {
        let coordinator = SpriteCoordinator::new(config)?;
        coordinator.config_resolved(mode);
        Ok(Self::with_coordinator(Arc::new(coordinator)))
    }

    /// Drive an existing coordinator (custom runtime, discovery or optimizer)
    pub fn with_coordinator(coordinator: Arc<SpriteCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<SpriteCoordinator> {
        &self.coordinator
    }

    /// Stop the dev-mode watcher, if any
    pub fn close(&self) {
        self.coordinator.close();
    }
}

async fn start_session(coordinator: &SpriteCoordinator) -> anyhow::Result<()> {
    coordinator
        .build_start()
        .await
        .context("Failed to start sprite session")
}

fn scan_module(coordinator: &SpriteCoordinator, module: &ModuleInfo) {
    if let Some(code) = &module.code {
        coordinator.module_processed(module.id.as_ref(), code.as_str());
    }
}

async fn finalize_bundle(
    coordinator: &SpriteCoordinator,
    bundle: &mut Vec<Output>,
) -> anyhow::Result<()> {
    coordinator
        .render_start()
        .await
        .context("Failed to compose sprite")?;

    if let Some(sprite) = coordinator.final_sprite() {
        let sprite_file_name = &coordinator.config().sprite_file_name;
        let replaced = substitute_sprite(bundle, sprite_file_name, &sprite);
        debug!(
            "[fob-sprite] {} sprite asset {} ({} bytes)",
            if replaced { "Replaced" } else { "Added" },
            sprite.file_name,
            sprite.content.len()
        );
    }

    Ok(())
}

fn is_sprite_asset(asset: &OutputAsset, sprite_file_name: &str) -> bool {
    asset.names.iter().any(|name| name.as_str() == sprite_file_name)
        || Path::new(asset.filename.as_str()).file_name() == Some(OsStr::new(sprite_file_name))
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Replace whole-name occurrences of `from` in `code`; `None` when there are none
///
/// An occurrence counts only when it is not part of a longer file name, so
/// `mysprite.svg` is left alone when renaming `sprite.svg`.
fn rewrite_reference(code: &str, from: &str, to: &str) -> Option<String> {
    let in_name = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_');

    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    for (at, _) in code.match_indices(from) {
        let before = code[..at].chars().next_back();
        let after = code[at + from.len()..].chars().next();
        if before.is_some_and(|c| in_name(c) || c == '.') || after.is_some_and(in_name) {
            continue;
        }
        out.push_str(&code[last..at]);
        out.push_str(to);
        last = at + from.len();
    }

    if last == 0 {
        return None;
    }
    out.push_str(&code[last..]);
    Some(out)
}

/// Put `sprite` into the bundle
///
/// A reserved asset (matched by name or file name) has its content replaced.
/// When the sprite file name is hashed the asset is renamed and chunks
/// referencing the reserved file name are rewritten to the new one. Without
/// a reserved asset, a new asset is added. Returns `true` when an existing
/// asset was replaced.
fn substitute_sprite(
    bundle: &mut Vec<Output>,
    sprite_file_name: &str,
    sprite: &FinalSprite,
) -> bool {
    let mut replaced = false;
    let mut renames = Vec::new();

    for output in bundle.iter_mut() {
        let Output::Asset(asset) = output else {
            continue;
        };
        if !is_sprite_asset(asset, sprite_file_name) {
            continue;
        }

        let filename = if sprite.file_name == sprite_file_name {
            asset.filename.clone()
        } else {
            let reserved = asset.filename.as_str();
            let previous = file_name_of(reserved);
            if !previous.is_empty() && previous != sprite.file_name {
                renames.push(previous.to_string());
            }
            let prefix = &reserved[..reserved.len() - previous.len()];
            format!("{}{}", prefix, sprite.file_name).into()
        };

        *asset = Arc::new(OutputAsset {
            names: asset.names.clone(),
            original_file_names: asset.original_file_names.clone(),
            filename,
            source: sprite.content.clone().into(),
        });
        replaced = true;
    }

    if !replaced {
        bundle.push(Output::Asset(Arc::new(OutputAsset {
            names: vec![sprite_file_name.to_string()],
            original_file_names: vec![],
            filename: sprite.file_name.clone().into(),
            source: sprite.content.clone().into(),
        })));
        return false;
    }

    for output in bundle.iter_mut() {
        let Output::Chunk(chunk) = output else {
            continue;
        };
        for previous in &renames {
            if let Some(code) = rewrite_reference(&chunk.code, previous, &sprite.file_name) {
                debug!(
                    "[fob-sprite] Rewrote {} to {} in {}",
                    previous, sprite.file_name, chunk.filename
                );
                Arc::make_mut(chunk).code = code;
            }
        }
    }

    true
}

impl Plugin for FobSpritePlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-sprite".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::BuildStart
            | HookUsage::ModuleParsed
            | HookUsage::GenerateBundle
            | HookUsage::CloseBundle
            | HookUsage::CloseWatcher
    }

    fn build_start(
        &self,
        _ctx: &PluginContext,
        _args: &HookBuildStartArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let coordinator = Arc::clone(&self.coordinator);
        async move { start_session(&coordinator).await }
    }

    /// Scan each parsed module for icon references
    fn module_parsed(
        &self,
        _ctx: &PluginContext,
        module_info: Arc<ModuleInfo>,
        _normal_module: &NormalModule,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        scan_module(&self.coordinator, &module_info);
        async { Ok(()) }
    }

    /// Scan after every other plugin has seen the module
    fn module_parsed_meta(&self) -> Option<PluginHookMeta> {
        Some(PluginHookMeta {
            order: Some(PluginOrder::Post),
        })
    }

    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let coordinator = Arc::clone(&self.coordinator);
        async move { finalize_bundle(&coordinator, args.bundle).await }
    }

    fn close_bundle(
        &self,
        _ctx: &PluginContext,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        self.coordinator.close();
        async { Ok(()) }
    }

    fn close_watcher(
        &self,
        _ctx: &PluginContext,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        self.coordinator.close();
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::MemoryRuntime;
    use rolldown_common::{ModuleId, Modules, OutputChunk};

    #[derive(Debug)]
    struct FixedDiscovery(Vec<String>);

    impl Discovery for FixedDiscovery {
        fn discover(&self, _pattern: &str, _base_dir: &Path) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn asset(name: &str, filename: &str, source: &str) -> Output {
        Output::Asset(Arc::new(OutputAsset {
            names: vec![name.to_string()],
            original_file_names: vec![],
            filename: filename.to_string().into(),
            source: source.to_string().into(),
        }))
    }

    fn chunk(filename: &str, code: &str) -> Output {
        Output::Chunk(Arc::new(OutputChunk {
            name: "main".into(),
            is_entry: true,
            is_dynamic_entry: false,
            facade_module_id: None,
            module_ids: vec![],
            exports: vec![],
            filename: filename.into(),
            modules: Modules {
                keys: vec![],
                values: vec![],
            },
            imports: vec![],
            dynamic_imports: vec![],
            code: code.to_string(),
            map: None,
            sourcemap_filename: None,
            preliminary_filename: filename.to_string(),
        }))
    }

    fn module(id: &str, code: &str) -> ModuleInfo {
        ModuleInfo {
            code: Some(code.into()),
            id: ModuleId::from(id),
            is_entry: false,
            importers: Default::default(),
            dynamic_importers: Default::default(),
            imported_ids: Default::default(),
            dynamically_imported_ids: Default::default(),
            exports: vec![],
        }
    }

    fn sprite(file_name: &str) -> FinalSprite {
        FinalSprite {
            content: "<svg>pruned</svg>".to_string(),
            hash: "abcd1234".to_string(),
            file_name: file_name.to_string(),
        }
    }

    fn assets(bundle: &[Output]) -> Vec<(String, Vec<u8>)> {
        bundle
            .iter()
            .filter_map(|output| match output {
                Output::Asset(asset) => Some((
                    asset.filename.to_string(),
                    asset.source.as_bytes().to_vec(),
                )),
                _ => None,
            })
            .collect()
    }

    fn chunk_code(bundle: &[Output]) -> Vec<String> {
        bundle
            .iter()
            .filter_map(|output| match output {
                Output::Chunk(chunk) => Some(chunk.code.clone()),
                _ => None,
            })
            .collect()
    }

    fn production_coordinator(config: SpritePluginConfig) -> SpriteCoordinator {
        let runtime = MemoryRuntime::new();
        runtime.seed("/p/icons/a.svg", r#"<svg viewBox="0 0 1 1"><path d="a"/></svg>"#);
        runtime.seed("/p/icons/b.svg", r#"<svg viewBox="0 0 1 1"><path d="b"/></svg>"#);

        let resolved = config
            .with_input(InputConfig::new("icons"))
            .with_root("/p")
            .with_watch(false)
            .resolve()
            .unwrap();
        let coordinator = SpriteCoordinator::from_resolved(resolved, Arc::new(runtime))
            .with_discovery(Arc::new(FixedDiscovery(vec![
                "a.svg".to_string(),
                "b.svg".to_string(),
            ])));
        coordinator.config_resolved(BuildMode::Production);
        coordinator
    }

    #[test]
    fn test_plugin_name_and_hooks() {
        let config = SpritePluginConfig::new("out").with_root("/tmp/fob-sprite");
        let plugin = FobSpritePlugin::new(&config, BuildMode::Production).unwrap();
        assert_eq!(plugin.name(), "fob-sprite");
        assert_eq!(
            plugin.register_hook_usage(),
            HookUsage::BuildStart
                | HookUsage::ModuleParsed
                | HookUsage::GenerateBundle
                | HookUsage::CloseBundle
                | HookUsage::CloseWatcher
        );
        assert!(matches!(
            plugin.module_parsed_meta(),
            Some(PluginHookMeta {
                order: Some(PluginOrder::Post)
            })
        ));
        assert_eq!(plugin.coordinator().mode(), BuildMode::Production);
    }

    #[tokio::test]
    async fn test_every_output_receives_sprite() {
        let coordinator = production_coordinator(SpritePluginConfig::new("out"));

        start_session(&coordinator).await.unwrap();
        scan_module(&coordinator, &module("/p/src/App.tsx", r#"icon: "b""#));

        let mut esm = vec![asset("sprite.svg", "sprite.svg", "")];
        let mut cjs = vec![chunk("main.cjs", "module.exports = 1;")];
        finalize_bundle(&coordinator, &mut esm).await.unwrap();
        finalize_bundle(&coordinator, &mut cjs).await.unwrap();

        let esm_assets = assets(&esm);
        let cjs_assets = assets(&cjs);
        assert_eq!(esm_assets[0].1, cjs_assets[0].1);
        assert_eq!(cjs_assets[0].0, "sprite.svg");

        let content = String::from_utf8(esm_assets[0].1.clone()).unwrap();
        assert!(content.contains(r#"<symbol id="b""#));
        assert!(!content.contains(r#"<symbol id="a""#));

        coordinator.close();
        assert_eq!(coordinator.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_rebuild_starts_fresh_session() {
        let coordinator = production_coordinator(SpritePluginConfig::new("out"));

        start_session(&coordinator).await.unwrap();
        scan_module(&coordinator, &module("/p/src/App.tsx", r#"icon: "a""#));
        finalize_bundle(&coordinator, &mut vec![]).await.unwrap();
        coordinator.close();

        start_session(&coordinator).await.unwrap();
        scan_module(&coordinator, &module("/p/src/App.tsx", r#"icon: "b""#));
        let mut bundle = vec![];
        finalize_bundle(&coordinator, &mut bundle).await.unwrap();

        let content = String::from_utf8(assets(&bundle)[0].1.clone()).unwrap();
        assert!(content.contains(r#"<symbol id="b""#));
        assert!(!content.contains(r#"<symbol id="a""#));
    }

    #[tokio::test]
    async fn test_development_bundle_untouched() {
        let coordinator = production_coordinator(SpritePluginConfig::new("out"));
        coordinator.config_resolved(BuildMode::Development);

        start_session(&coordinator).await.unwrap();
        let mut bundle = vec![chunk("main.js", "export {};")];
        finalize_bundle(&coordinator, &mut bundle).await.unwrap();
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_reserved_asset_replaced_in_place() {
        let mut bundle = vec![
            asset("other.png", "assets/other.png", "png"),
            asset("sprite.svg", "assets/sprite.svg", ""),
        ];

        assert!(substitute_sprite(&mut bundle, "sprite.svg", &sprite("sprite.svg")));
        assert_eq!(
            assets(&bundle),
            vec![
                ("assets/other.png".to_string(), b"png".to_vec()),
                ("assets/sprite.svg".to_string(), b"<svg>pruned</svg>".to_vec()),
            ]
        );
    }

    #[test]
    fn test_reserved_asset_renamed_when_hashed() {
        let mut bundle = vec![asset("sprite.svg", "assets/sprite.svg", "")];

        substitute_sprite(&mut bundle, "sprite.svg", &sprite("sprite-abcd1234.svg"));
        assert_eq!(assets(&bundle)[0].0, "assets/sprite-abcd1234.svg");
    }

    #[test]
    fn test_hashed_rename_rewrites_chunk_references() {
        let mut bundle = vec![
            chunk(
                "main.js",
                r#"const a = new URL("./assets/sprite.svg", import.meta.url); const b = "mysprite.svg";"#,
            ),
            chunk("other.js", "export const x = 1;"),
            asset("sprite.svg", "assets/sprite.svg", ""),
        ];

        substitute_sprite(&mut bundle, "sprite.svg", &sprite("sprite-abcd1234.svg"));
        assert_eq!(
            chunk_code(&bundle),
            vec![
                r#"const a = new URL("./assets/sprite-abcd1234.svg", import.meta.url); const b = "mysprite.svg";"#
                    .to_string(),
                "export const x = 1;".to_string(),
            ]
        );
    }

    #[test]
    fn test_chunks_untouched_without_hashing() {
        let code = r#"import url from "./sprite.svg";"#;
        let mut bundle = vec![chunk("main.js", code), asset("sprite.svg", "sprite.svg", "")];

        substitute_sprite(&mut bundle, "sprite.svg", &sprite("sprite.svg"));
        assert_eq!(chunk_code(&bundle), vec![code.to_string()]);
    }

    #[test]
    fn test_rewrite_reference_whole_names_only() {
        assert_eq!(
            rewrite_reference("a/sprite.svg sprite.svg", "sprite.svg", "s-1.svg").as_deref(),
            Some("a/s-1.svg s-1.svg")
        );
        assert_eq!(rewrite_reference("my-sprite.svg", "sprite.svg", "s-1.svg"), None);
        assert_eq!(rewrite_reference("sprite.svgz", "sprite.svg", "s-1.svg"), None);
        assert_eq!(rewrite_reference("old.sprite.svg", "sprite.svg", "s-1.svg"), None);
    }

    #[test]
    fn test_asset_added_when_not_reserved() {
        let mut bundle = vec![asset("other.png", "other.png", "png")];

        assert!(!substitute_sprite(&mut bundle, "sprite.svg", &sprite("sprite.svg")));
        assert_eq!(bundle.len(), 2);
        assert_eq!(
            assets(&bundle)[1],
            ("sprite.svg".to_string(), b"<svg>pruned</svg>".to_vec())
        );
    }
}
