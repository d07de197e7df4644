//! Sprite session coordinator
//!
//! Owns the lifecycle of one build session and decides when each artifact is
//! written:
//!
//! ```text
//! Idle ──build_start──▶ Discovering ──┬─ development ─▶ DevServing ──close──▶ Closed
//!                                     └─ production ──▶ ProductionEmitting ──close──▶ Closed
//! ```
//!
//! In development the full sprite is written up front and kept current by a
//! watch loop. In production with pruning enabled, modules are scanned as the
//! bundler processes them and the sprite is composed once, from the used
//! symbols only, when output naming starts.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::compose::compose;
use crate::config::{ResolvedConfig, SpritePluginConfig};
use crate::discovery::{Discovery, GlobDiscovery};
use crate::error::{Result, SpriteError};
use crate::fingerprint::{hashed_file_name, short_hash};
use crate::optimize::{BuiltinOptimizer, SvgOptimizer};
use crate::resolve::{resolve, Resolution, SymbolMap};
use crate::runtime::{NativeRuntime, Runtime, RuntimeError};
use crate::tracker::ReferenceTracker;
use crate::watch::{SpriteWatcher, DEFAULT_DEBOUNCE};
use crate::write::{ensure_file, write_gitignore, write_if_changed, write_types, WriteOutcome};

/// How the host is building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Discovering,
    DevServing,
    ProductionEmitting,
    Closed,
}

/// The pruned sprite handed to the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSprite {
    pub content: String,
    /// First eight hex characters of the content's SHA-256
    pub hash: String,
    /// Asset file name, hashed when `hashFileName` is set
    pub file_name: String,
}

impl FinalSprite {
    fn new(content: String, sprite_file_name: &str, hash_file_name: bool) -> Self {
        let hash = short_hash(content.as_bytes());
        let file_name = if hash_file_name {
            hashed_file_name(sprite_file_name, &hash)
        } else {
            sprite_file_name.to_string()
        };
        Self {
            content,
            hash,
            file_name,
        }
    }
}

/// Shared, immutable part of a session
#[derive(Debug)]
struct Inner {
    config: ResolvedConfig,
    runtime: Arc<dyn Runtime>,
    discovery: Arc<dyn Discovery>,
    optimizer: Arc<dyn SvgOptimizer>,
}

impl Inner {
    /// Resolve inputs and refresh the types listing
    async fn discover(&self) -> Result<Resolution> {
        let resolution = resolve(
            &self.config.inputs,
            &self.discovery,
            self.runtime.as_ref(),
        )
        .await?;

        let outcome = write_types(self.runtime.as_ref(), &self.config.types_path, &resolution.map).await?;
        log_write(&self.config.types_path, outcome);

        Ok(resolution)
    }

    /// Compose off the async executor
    async fn compose_sprite(self: &Arc<Self>, map: SymbolMap) -> Result<String> {
        let inner = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            compose(&map, &inner.config.sprite_path, inner.optimizer.as_ref())
        })
        .await
        .map_err(|e| SpriteError::Runtime(RuntimeError::Other(format!("Task join error: {}", e))))?
    }

    async fn write_sprite(self: &Arc<Self>, map: SymbolMap) -> Result<(String, WriteOutcome)> {
        let content = self.compose_sprite(map).await?;
        let outcome = write_if_changed(self.runtime.as_ref(), &self.config.sprite_path, &content).await?;
        log_write(&self.config.sprite_path, outcome);
        Ok((content, outcome))
    }

    /// One development rebuild triggered by a change to `path`
    async fn rebuild(self: &Arc<Self>, path: &Path) -> Result<Option<WriteOutcome>> {
        if path == self.config.sprite_path {
            return Ok(None);
        }

        tracing::debug!("[fob-sprite] Change detected: {}", path.display());
        let resolution = self.discover().await?;
        let (_, outcome) = self.write_sprite(resolution.map).await?;
        Ok(Some(outcome))
    }
}

fn log_write(path: &Path, outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Created => tracing::info!("[fob-sprite] Created {}", path.display()),
        WriteOutcome::Updated => tracing::info!("[fob-sprite] Updated {}", path.display()),
        WriteOutcome::Unchanged => tracing::debug!("[fob-sprite] {} is up to date", path.display()),
    }
}

/// Running dev-mode watcher and the task draining its events
struct WatchHandle {
    watcher: SpriteWatcher,
    task: JoinHandle<()>,
}

impl WatchHandle {
    fn stop(self) {
        self.task.abort();
        drop(self.watcher);
    }
}

/// Mutable session state
struct Session {
    mode: BuildMode,
    phase: Phase,
    tracker: Option<ReferenceTracker>,
    final_sprite: Option<FinalSprite>,
    watch: Option<WatchHandle>,
}

/// Coordinates discovery, tracking, composition and writes for one session
pub struct SpriteCoordinator {
    inner: Arc<Inner>,
    session: Mutex<Session>,
}

impl std::fmt::Debug for SpriteCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("SpriteCoordinator")
            .field("config", &self.inner.config)
            .field("mode", &session.mode)
            .field("phase", &session.phase)
            .finish_non_exhaustive()
    }
}

impl SpriteCoordinator {
    /// Coordinator over the native filesystem with the built-in optimizer
    pub fn new(config: &SpritePluginConfig) -> Result<Self> {
        Ok(Self::from_resolved(
            config.resolve()?,
            Arc::new(NativeRuntime::new()),
        ))
    }

    pub fn from_resolved(config: ResolvedConfig, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                runtime,
                discovery: Arc::new(GlobDiscovery::new()),
                optimizer: Arc::new(BuiltinOptimizer::new()),
            }),
            session: Mutex::new(Session {
                mode: BuildMode::default(),
                phase: Phase::Idle,
                tracker: None,
                final_sprite: None,
                watch: None,
            }),
        }
    }

    /// Replace the icon discovery strategy. Only valid before the session starts.
    pub fn with_discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.discovery = discovery;
        }
        self
    }

    /// Replace the SVG optimizer. Only valid before the session starts.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn SvgOptimizer>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.optimizer = optimizer;
        }
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> Phase {
        self.session.lock().phase
    }

    pub fn mode(&self) -> BuildMode {
        self.session.lock().mode
    }

    fn prunes(&self, mode: BuildMode) -> bool {
        mode == BuildMode::Production && self.inner.config.strip_unused.enabled
    }

    /// Record the host's build mode
    pub fn config_resolved(&self, mode: BuildMode) {
        self.session.lock().mode = mode;
    }

    /// Discover icons and write the artifacts due at session start
    ///
    /// Called again for every rebuild of a watching host: state from the
    /// previous build is discarded and a running watcher is kept.
    pub async fn build_start(&self) -> Result<()> {
        let (mode, watching) = {
            let mut session = self.session.lock();
            session.phase = Phase::Discovering;
            session.tracker = None;
            session.final_sprite = None;
            (session.mode, session.watch.is_some())
        };

        let resolution = self.inner.discover().await?;
        let runtime = self.inner.runtime.as_ref();
        let config = &self.inner.config;

        if config.gitignore {
            let outcome = write_gitignore(
                runtime,
                &config.gitignore_path,
                &config.sprite_file_name,
                &config.types_file_name,
            )
            .await?;
            log_write(&config.gitignore_path, outcome);
        }

        match mode {
            BuildMode::Development => {
                self.inner.write_sprite(resolution.map).await?;
                let watch = if config.watch && !watching {
                    Some(self.start_watching()?)
                } else {
                    None
                };

                let mut session = self.session.lock();
                if watch.is_some() {
                    session.watch = watch;
                }
                session.phase = Phase::DevServing;
            }
            BuildMode::Production if self.prunes(mode) => {
                ensure_file(runtime, &config.sprite_path).await?;

                let strip = &config.strip_unused;
                let tracker = ReferenceTracker::new(
                    Arc::new(resolution.map),
                    Arc::clone(&strip.filter),
                    Arc::clone(&strip.matcher),
                    &strip.whitelist,
                );

                let mut session = self.session.lock();
                session.tracker = Some(tracker);
                session.phase = Phase::ProductionEmitting;
            }
            BuildMode::Production => {
                self.inner.write_sprite(resolution.map).await?;
                self.session.lock().phase = Phase::ProductionEmitting;
            }
        }

        Ok(())
    }

    fn start_watching(&self) -> Result<WatchHandle> {
        let roots: Vec<_> = self
            .inner
            .config
            .inputs
            .iter()
            .map(|input| input.base_dir.clone())
            .collect();
        let (watcher, mut rx) = SpriteWatcher::new(&roots, DEFAULT_DEBOUNCE)?;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                if let Err(e) = inner.rebuild(change.path()).await {
                    tracing::error!("[fob-sprite] Failed to rebuild sprite: {}", e);
                }
            }
        });

        Ok(WatchHandle { watcher, task })
    }

    /// Rebuild after a change to `path`, as the watch loop does
    ///
    /// Returns `None` when the change was ignored: outside a development
    /// session, or a change to the sprite itself.
    pub async fn handle_change(&self, path: &Path) -> Result<Option<WriteOutcome>> {
        if self.phase() != Phase::DevServing {
            return Ok(None);
        }
        self.inner.rebuild(path).await
    }

    /// Scan a processed module; returns the symbol ids it newly referenced
    pub fn module_processed(&self, path: &str, code: &str) -> Vec<String> {
        let mut session = self.session.lock();
        match session.tracker.as_mut() {
            Some(tracker) => tracker.scan(path, code),
            None => Vec::new(),
        }
    }

    /// Compose and write the pruned sprite, once per build
    ///
    /// Later calls return the held sprite; the tracker is released after
    /// composing. Returns `None` unless this is a production session with
    /// pruning.
    pub async fn render_start(&self) -> Result<Option<FinalSprite>> {
        let used = {
            let session = self.session.lock();
            if !self.prunes(session.mode) {
                return Ok(None);
            }
            if let Some(sprite) = &session.final_sprite {
                return Ok(Some(sprite.clone()));
            }
            match &session.tracker {
                Some(tracker) => tracker.used().clone(),
                None => return Ok(None),
            }
        };

        let (content, _) = self.inner.write_sprite(used).await?;
        let config = &self.inner.config;
        let sprite = FinalSprite::new(content, &config.sprite_file_name, config.hash_file_name);

        let mut session = self.session.lock();
        session.tracker = None;
        Ok(Some(session.final_sprite.get_or_insert(sprite).clone()))
    }

    /// The composed pruned sprite, for every output of the current build
    pub fn final_sprite(&self) -> Option<FinalSprite> {
        self.session.lock().final_sprite.clone()
    }

    /// Stop watching and end the session; safe to call repeatedly
    pub fn close(&self) {
        let watch = {
            let mut session = self.session.lock();
            session.phase = Phase::Closed;
            session.watch.take()
        };
        if let Some(watch) = watch {
            watch.stop();
            tracing::debug!("[fob-sprite] Stopped watching icon directories");
        }
    }
}

impl Drop for SpriteCoordinator {
    fn drop(&mut self) {
        if let Some(watch) = self.session.get_mut().watch.take() {
            watch.stop();
        }
    }
}
