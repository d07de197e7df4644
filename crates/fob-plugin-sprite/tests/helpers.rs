//! Shared test utilities for sprite plugin tests

#![allow(dead_code)]

use fob_plugin_sprite::{BuildMode, InputConfig, SpriteCoordinator, SpritePluginConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ICON_A: &str = r#"<svg><path d="M0 0"/></svg>"#;
pub const ICON_B: &str = r#"<svg><defs><linearGradient id="g"/></defs><rect/></svg>"#;

/// Temporary project with an `icons/` directory and an `out/` output dir
pub struct IconProject {
    pub dir: TempDir,
}

impl IconProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    /// Project with `icons/a.svg` and `icons/b.svg`
    pub fn with_two_icons() -> Self {
        let project = Self::new();
        project.write("icons/a.svg", ICON_A);
        project.write("icons/b.svg", ICON_B);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, content).expect("write file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read file")
    }

    /// Base dir = project root, default pattern, output in `out/`
    pub fn config(&self) -> SpritePluginConfig {
        SpritePluginConfig::new("out")
            .with_root(self.root())
            .with_input(InputConfig::default())
            .with_watch(false)
    }

    /// Inputs limited to `icons/`, so written artifacts are never rediscovered
    pub fn icons_config(&self) -> SpritePluginConfig {
        self.config().with_input(InputConfig::new("icons"))
    }

    pub fn coordinator(&self, config: SpritePluginConfig, mode: BuildMode) -> SpriteCoordinator {
        let coordinator = SpriteCoordinator::new(&config).expect("coordinator");
        coordinator.config_resolved(mode);
        coordinator
    }
}

/// Ids of every `<symbol>` in a sprite, in document order
pub fn symbol_ids(sprite: &str) -> Vec<String> {
    sprite
        .lines()
        .filter_map(|line| line.trim().strip_prefix(r#"<symbol id=""#))
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}
