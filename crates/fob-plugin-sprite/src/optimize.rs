//! SVG optimization
//!
//! The compositor hands every icon to an [`SvgOptimizer`] before turning it
//! into a `<symbol>`. The built-in optimizer is a streaming quick-xml pass
//! that applies a small, ordered list of [`OptimizeStep`]s; hosts that want a
//! full optimizer can plug in their own implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attributes stripped by the default configuration
pub const DEFAULT_REMOVE_ATTRS: &str = "stroke-width|stroke-linecap|stroke-linejoin|class";

/// Errors reported by an optimizer
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The markup could not be parsed
    #[error("malformed SVG at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// A `removeAttrs` step carries a pattern that is not a valid regex
    #[error("invalid removeAttrs pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Any other optimizer failure
    #[error("{0}")]
    Other(String),
}

/// One transformation applied by the built-in optimizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum OptimizeStep {
    /// Drop the XML declaration, processing instructions and doctype
    RemoveProlog,
    /// Drop comments
    RemoveComments,
    /// Drop `<metadata>` elements and their content
    RemoveMetadata,
    /// Drop text nodes that only contain whitespace
    CollapseWhitespace,
    /// Drop `width`/`height` on the root `<svg>`, keeping the aspect ratio
    /// in a synthesized `viewBox` when none is present
    RemoveDimensions,
    /// Drop every attribute whose name fully matches `pattern`
    RemoveAttrs { pattern: String },
}

/// Ordered list of steps for one optimizer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeConfig {
    #[serde(default)]
    pub steps: Vec<OptimizeStep>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            steps: vec![
                OptimizeStep::RemoveProlog,
                OptimizeStep::RemoveComments,
                OptimizeStep::RemoveMetadata,
                OptimizeStep::CollapseWhitespace,
                OptimizeStep::RemoveDimensions,
                OptimizeStep::RemoveAttrs {
                    pattern: DEFAULT_REMOVE_ATTRS.to_string(),
                },
            ],
        }
    }
}

impl OptimizeConfig {
    /// A configuration with no steps (markup passes through re-serialized)
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step after the existing ones
    pub fn with_step(mut self, step: OptimizeStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Optimizer seam used by the compositor
pub trait SvgOptimizer: Send + Sync + std::fmt::Debug {
    /// Optimize `svg` with `config`, returning the new markup
    fn optimize(&self, svg: &str, config: &OptimizeConfig) -> Result<String, OptimizeError>;
}

/// Streaming optimizer built on quick-xml
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinOptimizer;

impl BuiltinOptimizer {
    pub fn new() -> Self {
        Self
    }
}

/// Compile a `removeAttrs` pattern into an anchored regex
pub fn compile_attr_pattern(pattern: &str) -> Result<Regex, OptimizeError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| OptimizeError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// What one pass over the markup does
#[derive(Default)]
struct Plan {
    remove_prolog: bool,
    remove_comments: bool,
    remove_metadata: bool,
    collapse_whitespace: bool,
    remove_dimensions: bool,
    remove_attrs: Option<Regex>,
}

impl Plan {
    fn for_step(step: &OptimizeStep) -> Result<Self, OptimizeError> {
        let mut plan = Plan::default();
        match step {
            OptimizeStep::RemoveProlog => plan.remove_prolog = true,
            OptimizeStep::RemoveComments => plan.remove_comments = true,
            OptimizeStep::RemoveMetadata => plan.remove_metadata = true,
            OptimizeStep::CollapseWhitespace => plan.collapse_whitespace = true,
            OptimizeStep::RemoveDimensions => plan.remove_dimensions = true,
            OptimizeStep::RemoveAttrs { pattern } => {
                plan.remove_attrs = Some(compile_attr_pattern(pattern)?)
            }
        }
        Ok(plan)
    }

    fn strips_attr(&self, name: &str) -> bool {
        self.remove_attrs.as_ref().is_some_and(|re| re.is_match(name))
    }

    fn rewrite_element(
        &self,
        elem: &BytesStart<'_>,
        is_root: bool,
        reader: &Reader<&[u8]>,
    ) -> Result<BytesStart<'static>, OptimizeError> {
        let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        let mut attrs: Vec<(String, Vec<u8>)> = Vec::new();

        for attr in elem.attributes() {
            let attr = attr.map_err(|e| malformed(reader, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if self.strips_attr(&key) {
                continue;
            }
            attrs.push((key, attr.value.into_owned()));
        }

        if is_root && self.remove_dimensions {
            remove_dimensions(&mut attrs);
        }

        let mut out = BytesStart::new(name);
        for (key, value) in &attrs {
            out.push_attribute((key.as_bytes(), value.as_slice()));
        }
        Ok(out)
    }
}

fn remove_dimensions(attrs: &mut Vec<(String, Vec<u8>)>) {
    let dimension = |name: &str| {
        attrs
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| parse_length(value))
    };
    let width = dimension("width");
    let height = dimension("height");
    let has_view_box = attrs.iter().any(|(key, _)| key == "viewBox");

    if !has_view_box {
        match (width, height) {
            (Some(w), Some(h)) => {
                attrs.push(("viewBox".to_string(), format!("0 0 {} {}", w, h).into_bytes()))
            }
            // Without a viewBox the dimensions are the only sizing information left
            _ => return,
        }
    }

    attrs.retain(|(key, _)| key != "width" && key != "height");
}

fn parse_length(value: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(value).ok()?.trim();
    let number = text.strip_suffix("px").unwrap_or(text);
    number.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> OptimizeError {
    OptimizeError::Malformed {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), OptimizeError> {
    writer
        .write_event(event)
        .map_err(|e| OptimizeError::Other(e.to_string()))
}

impl SvgOptimizer for BuiltinOptimizer {
    /// Run one pass per step, in list order; later steps see earlier output
    fn optimize(&self, svg: &str, config: &OptimizeConfig) -> Result<String, OptimizeError> {
        let plans = config
            .steps
            .iter()
            .map(Plan::for_step)
            .collect::<Result<Vec<_>, _>>()?;

        if plans.is_empty() {
            return run_pass(svg, &Plan::default());
        }
        plans
            .iter()
            .try_fold(svg.to_string(), |text, plan| run_pass(&text, plan))
    }
}

fn run_pass(svg: &str, plan: &Plan) -> Result<String, OptimizeError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));

    let mut depth = 0usize;
    // Depth at which a skipped subtree started
    let mut skipping: Option<usize> = None;
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Eof => break,
            Event::Start(elem) => {
                depth += 1;
                if skipping.is_some() {
                    continue;
                }
                if plan.remove_metadata && elem.name().as_ref() == b"metadata" {
                    skipping = Some(depth);
                    continue;
                }
                let is_root = !root_seen && elem.name().as_ref() == b"svg";
                root_seen |= is_root;
                let rewritten = plan.rewrite_element(&elem, is_root, &reader)?;
                write(&mut writer, Event::Start(rewritten))?;
            }
            Event::End(elem) => {
                if depth == 0 {
                    return Err(malformed(&reader, "closing tag without matching opening tag"));
                }
                if let Some(start) = skipping {
                    if start == depth {
                        skipping = None;
                    }
                    depth -= 1;
                    continue;
                }
                depth -= 1;
                write(&mut writer, Event::End(elem))?;
            }
            Event::Empty(elem) => {
                if skipping.is_some()
                    || (plan.remove_metadata && elem.name().as_ref() == b"metadata")
                {
                    continue;
                }
                let is_root = !root_seen && elem.name().as_ref() == b"svg";
                root_seen |= is_root;
                let rewritten = plan.rewrite_element(&elem, is_root, &reader)?;
                write(&mut writer, Event::Empty(rewritten))?;
            }
            Event::Text(text) => {
                if skipping.is_some() {
                    continue;
                }
                if plan.collapse_whitespace && text.iter().all(|b| b.is_ascii_whitespace()) {
                    continue;
                }
                write(&mut writer, Event::Text(text))?;
            }
            Event::Comment(_) if plan.remove_comments => continue,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) if plan.remove_prolog => continue,
            other => {
                if skipping.is_none() {
                    write(&mut writer, other)?;
                }
            }
        }
    }

    if depth != 0 {
        return Err(malformed(&reader, format!("{} unclosed element(s)", depth)));
    }

    String::from_utf8(writer.into_inner()).map_err(|e| OptimizeError::Other(e.to_string()))
}
