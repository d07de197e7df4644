//! Sprite plugin configuration
//!
//! [`SpritePluginConfig`] is the user-facing, serde-friendly shape (camelCase
//! keys, one-or-many inputs, `true`/`false` shorthands). [`resolve`] turns it
//! into a [`ResolvedConfig`] with every default filled in, absolute paths,
//! and compiled patterns. Nothing downstream reads the user-facing shape.
//!
//! [`resolve`]: SpritePluginConfig::resolve

use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, SpriteError};
use crate::filter::{SourceFilter, DEFAULT_INCLUDE};
use crate::matcher::{
    ReferenceMatcher, RegexMatcher, DEFAULT_REFERENCE_GROUP, DEFAULT_REFERENCE_PATTERN,
};
use crate::optimize::{compile_attr_pattern, OptimizeConfig, OptimizeStep};

/// Config file picked up by [`SpritePluginConfig::load`] when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "fob.sprite.json";

/// Everything an identity function may look at
#[derive(Debug, Clone, Copy)]
pub struct SymbolIdInput<'a> {
    pub prefix: &'a str,
    pub separator: &'a str,
    pub base_dir: &'a Path,
    /// Path relative to the base dir, `/`-separated
    pub match_path: &'a str,
    pub file_path: &'a Path,
    pub content: &'a str,
}

/// Computes the symbol id of a discovered icon
pub type SymbolIdFn = Arc<dyn Fn(&SymbolIdInput<'_>) -> String + Send + Sync>;

/// Prefix + lowercased match path without extension, separators replaced
/// by the input's separator.
pub fn default_symbol_id(input: &SymbolIdInput<'_>) -> String {
    let path = input.match_path;
    let file_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let stem_end = match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => file_start + dot,
        _ => path.len(),
    };

    let joined = path[..stem_end].replace(['/', '\\'], input.separator);
    format!("{}{}", input.prefix, joined.to_lowercase())
}

fn default_pattern() -> String {
    "**/*.svg".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./")
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_types_file_name() -> String {
    "types.ts".to_string()
}

fn default_sprite_file_name() -> String {
    "sprite.svg".to_string()
}

fn default_true() -> bool {
    true
}

/// `optimize: true | false | { steps }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizeOption {
    Enabled(bool),
    Custom(OptimizeConfig),
}

impl Default for OptimizeOption {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// One icon source
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    /// Glob evaluated below `base_dir`
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Relative directories are resolved against the project root
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_separator")]
    pub id_separator: String,

    /// Attribute names (regex alternatives) stripped after the built-in steps
    #[serde(default)]
    pub remove_attrs: Vec<String>,

    #[serde(default)]
    pub optimize: OptimizeOption,

    /// Steps appended after the attribute-stripping step
    #[serde(default)]
    pub extra_steps: Vec<OptimizeStep>,

    /// Custom identity function; [`default_symbol_id`] when unset
    #[serde(skip)]
    pub symbol_id: Option<SymbolIdFn>,
}

impl fmt::Debug for InputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputConfig")
            .field("pattern", &self.pattern)
            .field("base_dir", &self.base_dir)
            .field("prefix", &self.prefix)
            .field("id_separator", &self.id_separator)
            .field("remove_attrs", &self.remove_attrs)
            .field("optimize", &self.optimize)
            .field("extra_steps", &self.extra_steps)
            .field("symbol_id", &self.symbol_id.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            base_dir: default_base_dir(),
            prefix: String::new(),
            id_separator: default_separator(),
            remove_attrs: Vec::new(),
            optimize: OptimizeOption::default(),
            extra_steps: Vec::new(),
            symbol_id: None,
        }
    }
}

impl InputConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.id_separator = separator.into();
        self
    }

    pub fn with_remove_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_optimize(mut self, optimize: OptimizeOption) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_extra_step(mut self, step: OptimizeStep) -> Self {
        self.extra_steps.push(step);
        self
    }

    pub fn with_symbol_id<F>(mut self, f: F) -> Self
    where
        F: Fn(&SymbolIdInput<'_>) -> String + Send + Sync + 'static,
    {
        self.symbol_id = Some(Arc::new(f));
        self
    }

    /// Fill in defaults against `root`
    pub fn resolve(&self, root: &Path) -> Result<ResolvedInput> {
        let optimize = match &self.optimize {
            OptimizeOption::Enabled(false) => None,
            OptimizeOption::Enabled(true) => Some(OptimizeConfig::default()),
            OptimizeOption::Custom(config) => Some(config.clone()),
        }
        .map(|mut config| {
            if !self.remove_attrs.is_empty() {
                config.steps.push(OptimizeStep::RemoveAttrs {
                    pattern: self.remove_attrs.join("|"),
                });
            }
            config.steps.extend(self.extra_steps.iter().cloned());
            config
        });

        if let Some(config) = &optimize {
            for step in &config.steps {
                if let OptimizeStep::RemoveAttrs { pattern } = step {
                    compile_attr_pattern(pattern)
                        .map_err(|e| SpriteError::invalid_pattern("removeAttrs", pattern, e))?;
                }
            }
        }

        let symbol_id = self
            .symbol_id
            .clone()
            .unwrap_or_else(|| Arc::new(default_symbol_id));

        Ok(ResolvedInput {
            pattern: self.pattern.clone(),
            base_dir: absolutize(root, &self.base_dir),
            prefix: self.prefix.clone(),
            separator: self.id_separator.clone(),
            optimize,
            symbol_id,
        })
    }
}

/// `input: { ... } | [{ ... }, ...]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inputs {
    Single(InputConfig),
    Multiple(Vec<InputConfig>),
}

impl Default for Inputs {
    fn default() -> Self {
        Self::Single(InputConfig::default())
    }
}

impl Inputs {
    pub fn as_slice(&self) -> &[InputConfig] {
        match self {
            Inputs::Single(input) => std::slice::from_ref(input),
            Inputs::Multiple(inputs) => inputs,
        }
    }
}

/// Reference-pruning options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripUnusedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Regex locating references; `group` names the id capture
    #[serde(default = "default_reference_pattern")]
    pub pattern: String,

    #[serde(default = "default_reference_group")]
    pub group: String,

    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// `**/node_modules/**` is excluded in addition to these
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Ids kept whether or not they are referenced
    #[serde(default, alias = "whiteList")]
    pub whitelist: Vec<String>,

    /// Replaces the regex matcher when set
    #[serde(skip)]
    pub matcher: Option<Arc<dyn ReferenceMatcher>>,
}

fn default_reference_pattern() -> String {
    DEFAULT_REFERENCE_PATTERN.to_string()
}

fn default_reference_group() -> String {
    DEFAULT_REFERENCE_GROUP.to_string()
}

fn default_include() -> Vec<String> {
    vec![DEFAULT_INCLUDE.to_string()]
}

impl Default for StripUnusedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: default_reference_pattern(),
            group: default_reference_group(),
            include: default_include(),
            exclude: Vec::new(),
            whitelist: Vec::new(),
            matcher: None,
        }
    }
}

impl StripUnusedConfig {
    pub fn with_whitelist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn ReferenceMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

/// `stripUnused: true | false | { ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StripUnusedOption {
    Enabled(bool),
    Custom(StripUnusedConfig),
}

impl Default for StripUnusedOption {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// User-facing plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpritePluginConfig {
    /// Directory receiving the sprite and types file (required)
    #[serde(default)]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub input: Inputs,

    #[serde(default)]
    pub strip_unused: StripUnusedOption,

    #[serde(default = "default_types_file_name")]
    pub types_file_name: String,

    #[serde(default = "default_sprite_file_name")]
    pub sprite_file_name: String,

    #[serde(default = "default_true")]
    pub gitignore: bool,

    /// Rename the emitted asset to `<stem>-<hash8>.<ext>`
    #[serde(default)]
    pub hash_file_name: bool,

    /// Watch input directories in development
    #[serde(default = "default_true")]
    pub watch: bool,

    /// Project root; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl Default for SpritePluginConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            input: Inputs::default(),
            strip_unused: StripUnusedOption::default(),
            types_file_name: default_types_file_name(),
            sprite_file_name: default_sprite_file_name(),
            gitignore: true,
            hash_file_name: false,
            watch: true,
            root: None,
        }
    }
}

impl SpritePluginConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, input: InputConfig) -> Self {
        self.input = Inputs::Single(input);
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<InputConfig>) -> Self {
        self.input = Inputs::Multiple(inputs);
        self
    }

    pub fn with_strip_unused(mut self, enabled: bool) -> Self {
        self.strip_unused = StripUnusedOption::Enabled(enabled);
        self
    }

    pub fn with_strip_unused_config(mut self, config: StripUnusedConfig) -> Self {
        self.strip_unused = StripUnusedOption::Custom(config);
        self
    }

    pub fn with_types_file_name(mut self, name: impl Into<String>) -> Self {
        self.types_file_name = name.into();
        self
    }

    pub fn with_sprite_file_name(mut self, name: impl Into<String>) -> Self {
        self.sprite_file_name = name.into();
        self
    }

    pub fn with_gitignore(mut self, gitignore: bool) -> Self {
        self.gitignore = gitignore;
        self
    }

    pub fn with_hash_file_name(mut self, hash: bool) -> Self {
        self.hash_file_name = hash;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(|p| p.to_path_buf()).or_else(|| {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        });

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        // FOB_SPRITE_OUTPUT_DIR -> outputDir, FOB_SPRITE_HASH_FILE_NAME -> hashFileName
        figment = figment.merge(
            Env::prefixed("FOB_SPRITE_")
                .lowercase(false)
                .map(|key| camel_case(key.as_str()).into()),
        );

        figment
            .extract()
            .map_err(|e| SpriteError::config(e.to_string()))
    }

    /// Produce the fully populated configuration
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(SpriteError::config("outputDir is required"));
        }

        let root = match &self.root {
            Some(root) if root.is_absolute() => root.clean(),
            root => {
                let cwd = std::env::current_dir().map_err(|e| {
                    SpriteError::config(format!("cannot determine project root: {}", e))
                })?;
                match root {
                    Some(relative) => cwd.join(relative).clean(),
                    None => cwd,
                }
            }
        };

        let output_dir = absolutize(&root, &self.output_dir);
        let inputs = self
            .input
            .as_slice()
            .iter()
            .map(|input| input.resolve(&root).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let strip_unused = match &self.strip_unused {
            StripUnusedOption::Enabled(false) => ResolvedStripUnused::disabled(&root)?,
            StripUnusedOption::Enabled(true) => {
                ResolvedStripUnused::from_config(&root, &StripUnusedConfig::default())?
            }
            StripUnusedOption::Custom(config) if !config.enabled => {
                ResolvedStripUnused::disabled(&root)?
            }
            StripUnusedOption::Custom(config) => ResolvedStripUnused::from_config(&root, config)?,
        };

        Ok(ResolvedConfig {
            sprite_path: output_dir.join(&self.sprite_file_name),
            types_path: output_dir.join(&self.types_file_name),
            gitignore_path: output_dir.join(".gitignore"),
            sprite_file_name: self.sprite_file_name.clone(),
            types_file_name: self.types_file_name.clone(),
            gitignore: self.gitignore,
            hash_file_name: self.hash_file_name,
            watch: self.watch,
            root,
            output_dir,
            inputs,
            strip_unused,
        })
    }
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        root.join(path).clean()
    }
}

/// Fully populated form of an [`InputConfig`]
#[derive(Clone)]
pub struct ResolvedInput {
    pub pattern: String,
    /// Absolute, normalized
    pub base_dir: PathBuf,
    pub prefix: String,
    pub separator: String,
    /// `None` disables optimization
    pub optimize: Option<OptimizeConfig>,
    pub symbol_id: SymbolIdFn,
}

impl fmt::Debug for ResolvedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedInput")
            .field("pattern", &self.pattern)
            .field("base_dir", &self.base_dir)
            .field("prefix", &self.prefix)
            .field("separator", &self.separator)
            .field("optimize", &self.optimize)
            .finish_non_exhaustive()
    }
}

impl ResolvedInput {
    /// Symbol id for one discovered file
    pub fn symbol_id_for(&self, match_path: &str, file_path: &Path, content: &str) -> String {
        (self.symbol_id)(&SymbolIdInput {
            prefix: &self.prefix,
            separator: &self.separator,
            base_dir: &self.base_dir,
            match_path,
            file_path,
            content,
        })
    }
}

/// Pruning settings with compiled filter and matcher
#[derive(Debug, Clone)]
pub struct ResolvedStripUnused {
    pub enabled: bool,
    pub filter: Arc<SourceFilter>,
    pub matcher: Arc<dyn ReferenceMatcher>,
    pub whitelist: Vec<String>,
}

impl ResolvedStripUnused {
    fn disabled(root: &Path) -> Result<Self> {
        Ok(Self {
            enabled: false,
            filter: Arc::new(SourceFilter::new(root, &default_include(), &[])?),
            matcher: Arc::new(RegexMatcher::default()),
            whitelist: Vec::new(),
        })
    }

    fn from_config(root: &Path, config: &StripUnusedConfig) -> Result<Self> {
        let matcher: Arc<dyn ReferenceMatcher> = match &config.matcher {
            Some(matcher) => Arc::clone(matcher),
            None => Arc::new(RegexMatcher::new(&config.pattern, config.group.as_str())?),
        };

        Ok(Self {
            enabled: true,
            filter: Arc::new(SourceFilter::new(root, &config.include, &config.exclude)?),
            matcher,
            whitelist: config.whitelist.clone(),
        })
    }
}

/// Plugin configuration with every default applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub sprite_path: PathBuf,
    pub types_path: PathBuf,
    pub gitignore_path: PathBuf,
    pub sprite_file_name: String,
    pub types_file_name: String,
    pub gitignore: bool,
    pub hash_file_name: bool,
    pub watch: bool,
    pub inputs: Vec<Arc<ResolvedInput>>,
    pub strip_unused: ResolvedStripUnused,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(match_path: &str, prefix: &str, separator: &str) -> String {
        default_symbol_id(&SymbolIdInput {
            prefix,
            separator,
            base_dir: Path::new("/root"),
            match_path,
            file_path: Path::new("/root/x.svg"),
            content: "<svg/>",
        })
    }

    #[test]
    fn test_default_symbol_id() {
        assert_eq!(id("icons/Arrow-Left.svg", "", "-"), "icons-arrow-left");
        assert_eq!(id("a.svg", "ui-", "-"), "ui-a");
        assert_eq!(id("nested/deep/b.svg", "", "_"), "nested_deep_b");
        assert_eq!(id("windows\\style.svg", "", "-"), "windows-style");
    }

    #[test]
    fn test_symbol_id_keeps_prefix_case() {
        assert_eq!(id("A.svg", "UI-", "-"), "UI-a");
    }

    #[test]
    fn test_symbol_id_strips_only_last_extension() {
        assert_eq!(id("dir.v2/icon.min.svg", "", "-"), "dir.v2-icon.min");
        assert_eq!(id("noext", "", "-"), "noext");
    }

    #[test]
    fn test_env_keys_to_camel_case() {
        assert_eq!(camel_case("OUTPUT_DIR"), "outputDir");
        assert_eq!(camel_case("hash_file_name"), "hashFileName");
        assert_eq!(camel_case("GITIGNORE"), "gitignore");
    }

    #[test]
    fn test_output_dir_required() {
        let err = SpritePluginConfig::default().resolve().unwrap_err();
        assert!(matches!(err, SpriteError::Config { .. }));
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = SpritePluginConfig::new("src/icons")
            .with_root("/project")
            .resolve()
            .unwrap();

        assert_eq!(resolved.output_dir, PathBuf::from("/project/src/icons"));
        assert_eq!(resolved.sprite_path, PathBuf::from("/project/src/icons/sprite.svg"));
        assert_eq!(resolved.types_path, PathBuf::from("/project/src/icons/types.ts"));
        assert_eq!(resolved.inputs.len(), 1);
        assert_eq!(resolved.inputs[0].base_dir, PathBuf::from("/project"));
        assert_eq!(resolved.inputs[0].optimize, Some(OptimizeConfig::default()));
        assert!(resolved.strip_unused.enabled);
        assert!(resolved.gitignore);
        assert!(!resolved.hash_file_name);
    }

    #[test]
    fn test_remove_attrs_and_extra_steps_folded_in_order() {
        let input = InputConfig::new("icons")
            .with_remove_attrs(["fill", "stroke"])
            .with_extra_step(OptimizeStep::RemoveComments)
            .resolve(Path::new("/project"))
            .unwrap();

        let steps = input.optimize.unwrap().steps;
        let n = steps.len();
        assert_eq!(
            steps[n - 2],
            OptimizeStep::RemoveAttrs {
                pattern: "fill|stroke".to_string()
            }
        );
        assert_eq!(steps[n - 1], OptimizeStep::RemoveComments);
    }

    #[test]
    fn test_optimize_disabled() {
        let input = InputConfig::default()
            .with_optimize(OptimizeOption::Enabled(false))
            .with_remove_attrs(["fill"])
            .resolve(Path::new("/project"))
            .unwrap();
        assert!(input.optimize.is_none());
    }

    #[test]
    fn test_invalid_remove_attrs_rejected() {
        let err = InputConfig::default()
            .with_remove_attrs(["(fill"])
            .resolve(Path::new("/project"))
            .unwrap_err();
        assert!(matches!(err, SpriteError::InvalidPattern { kind: "removeAttrs", .. }));
    }

    #[test]
    fn test_custom_symbol_id() {
        let input = InputConfig::default()
            .with_symbol_id(|i| format!("x-{}", i.match_path.len()))
            .resolve(Path::new("/p"))
            .unwrap();
        assert_eq!(input.symbol_id_for("ab.svg", Path::new("/p/ab.svg"), ""), "x-6");
    }

    #[test]
    fn test_deserialize_camel_case_shorthands() {
        let config: SpritePluginConfig = serde_json::from_str(
            r#"{
                "outputDir": "src/sprite",
                "input": [{ "baseDir": "icons", "prefix": "ui-", "optimize": false }],
                "stripUnused": { "whitelist": ["ui-close"] },
                "hashFileName": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("src/sprite"));
        assert_eq!(config.input.as_slice().len(), 1);
        assert_eq!(config.input.as_slice()[0].optimize, OptimizeOption::Enabled(false));
        assert!(config.hash_file_name);
        match config.strip_unused {
            StripUnusedOption::Custom(custom) => {
                assert!(custom.enabled);
                assert_eq!(custom.whitelist, vec!["ui-close"]);
                assert_eq!(custom.group, "icon");
            }
            other => panic!("unexpected strip_unused: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_single_input_and_bool_strip() {
        let config: SpritePluginConfig = serde_json::from_str(
            r#"{ "outputDir": "out", "input": { "pattern": "*.svg" }, "stripUnused": false }"#,
        )
        .unwrap();
        assert_eq!(config.input.as_slice()[0].pattern, "*.svg");
        assert!(matches!(config.strip_unused, StripUnusedOption::Enabled(false)));

        let resolved = config.with_root("/p").resolve().unwrap();
        assert!(!resolved.strip_unused.enabled);
    }

    #[test]
    fn test_load_file_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"{ "outputDir": "src/icons", "spriteFileName": "icons.svg" }"#,
            )?;
            jail.set_env("FOB_SPRITE_HASH_FILE_NAME", "true");

            let config = SpritePluginConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.output_dir, PathBuf::from("src/icons"));
            assert_eq!(config.sprite_file_name, "icons.svg");
            assert_eq!(config.types_file_name, "types.ts");
            assert!(config.hash_file_name);
            Ok(())
        });
    }
}
