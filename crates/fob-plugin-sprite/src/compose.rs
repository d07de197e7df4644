//! Sprite composition
//!
//! Turns a symbol map into one sprite document: every icon's root `<svg>`
//! becomes a `<symbol>` carrying its symbol id, and the children of each
//! icon's first `<defs>` are pooled into a single shared `<defs>` block.
//!
//! Output is a pure function of the map: entries are sorted by symbol id and
//! the per-entry work, although fanned out on rayon, is collected back in
//! that order.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use rayon::prelude::*;
use std::path::Path;

use crate::error::{Result, SpriteError};
use crate::optimize::SvgOptimizer;
use crate::resolve::{ResolvedEntry, SymbolMap};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const SPRITE_ROOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="0" height="0">"#;

/// Root attributes never carried over to a symbol
const DROPPED_ROOT_ATTRS: &[&[u8]] = &[b"id", b"xmlns", b"xmlns:xlink", b"version"];

/// One icon rendered as a symbol plus its pooled definitions
#[derive(Debug, Clone, PartialEq, Eq)]
struct SymbolFragment {
    markup: String,
    defs: Vec<String>,
}

/// Compose the sprite document for `map`
///
/// An entry whose file is the sprite itself is skipped, so an output
/// directory inside an input's base directory never feeds the sprite back
/// into itself.
pub fn compose(map: &SymbolMap, sprite_path: &Path, optimizer: &dyn SvgOptimizer) -> Result<String> {
    let mut entries: Vec<&ResolvedEntry> = map
        .values()
        .filter(|entry| entry.file_path != sprite_path)
        .collect();
    entries.sort_by(|a, b| a.symbol_id.cmp(&b.symbol_id));

    let fragments = entries
        .par_iter()
        .map(|entry| render_entry(entry, optimizer))
        .collect::<Result<Vec<_>>>()?;

    let mut lines = vec![XML_DECLARATION.to_string(), SPRITE_ROOT.to_string()];

    let defs: Vec<&String> = fragments.iter().flat_map(|f| &f.defs).collect();
    if !defs.is_empty() {
        lines.push("  <defs>".to_string());
        lines.extend(defs.into_iter().map(|def| format!("    {}", def)));
        lines.push("  </defs>".to_string());
    }

    lines.extend(fragments.iter().map(|f| format!("  {}", f.markup)));
    lines.push("</svg>".to_string());

    Ok(lines.join("\n"))
}

fn render_entry(entry: &ResolvedEntry, optimizer: &dyn SvgOptimizer) -> Result<SymbolFragment> {
    match &entry.input.optimize {
        Some(config) => {
            let optimized = optimizer
                .optimize(&entry.content, config)
                .map_err(|e| SpriteError::optimize(entry.file_path.clone(), e))?;
            build_symbol(&entry.symbol_id, &optimized, &entry.file_path)
        }
        None => build_symbol(&entry.symbol_id, &entry.content, &entry.file_path),
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>, path: &Path) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| SpriteError::markup(path, e))
}

fn into_string(writer: Writer<Vec<u8>>, path: &Path) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(|e| SpriteError::markup(path, e))
}

fn build_symbol(symbol_id: &str, content: &str, path: &Path) -> Result<SymbolFragment> {
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event().map_err(|e| SpriteError::markup(path, e))? {
            Event::Start(svg) if svg.name().as_ref() == b"svg" => {
                let start = symbol_start(symbol_id, &svg, path)?;
                return read_symbol_body(start, &mut reader, path);
            }
            Event::Empty(svg) if svg.name().as_ref() == b"svg" => {
                let mut writer = Writer::new(Vec::new());
                write_event(&mut writer, Event::Start(symbol_start(symbol_id, &svg, path)?), path)?;
                write_event(&mut writer, Event::End(BytesEnd::new("symbol")), path)?;
                return Ok(SymbolFragment {
                    markup: into_string(writer, path)?,
                    defs: Vec::new(),
                });
            }
            Event::Eof => return Err(SpriteError::missing_svg_root(path)),
            _ => {}
        }
    }
}

fn symbol_start(symbol_id: &str, svg: &BytesStart<'_>, path: &Path) -> Result<BytesStart<'static>> {
    let mut start = BytesStart::new("symbol");
    start.push_attribute(("id", symbol_id));

    for attr in svg.attributes() {
        let attr = attr.map_err(|e| SpriteError::markup(path, e))?;
        if DROPPED_ROOT_ATTRS.contains(&attr.key.as_ref()) {
            continue;
        }
        start.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
    }

    Ok(start)
}

/// Copy everything up to the closing `</svg>`, detaching the first `<defs>`
fn read_symbol_body(
    start: BytesStart<'static>,
    reader: &mut Reader<&[u8]>,
    path: &Path,
) -> Result<SymbolFragment> {
    let mut writer = Writer::new(Vec::new());
    write_event(&mut writer, Event::Start(start), path)?;

    let mut defs = Vec::new();
    let mut defs_taken = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| SpriteError::markup(path, e))? {
            Event::Start(elem) if !defs_taken && elem.name().as_ref() == b"defs" => {
                defs_taken = true;
                defs = read_defs_children(reader, path)?;
            }
            Event::Empty(elem) if !defs_taken && elem.name().as_ref() == b"defs" => {
                defs_taken = true;
            }
            Event::Start(elem) => {
                depth += 1;
                write_event(&mut writer, Event::Start(elem), path)?;
            }
            Event::End(elem) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                write_event(&mut writer, Event::End(elem), path)?;
            }
            Event::Eof => {
                return Err(SpriteError::markup(path, "unexpected end of file inside <svg>"))
            }
            other => write_event(&mut writer, other, path)?,
        }
    }

    write_event(&mut writer, Event::End(BytesEnd::new("symbol")), path)?;

    Ok(SymbolFragment {
        markup: into_string(writer, path)?,
        defs,
    })
}

/// Serialize each child node of a `<defs>` element, consuming its end tag
fn read_defs_children(reader: &mut Reader<&[u8]>, path: &Path) -> Result<Vec<String>> {
    let mut children = Vec::new();
    let mut current: Option<Writer<Vec<u8>>> = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| SpriteError::markup(path, e))?;
        let closes_child = match &event {
            Event::Eof => {
                return Err(SpriteError::markup(path, "unexpected end of file inside <defs>"))
            }
            Event::End(_) if depth == 0 => break,
            Event::Text(text) if depth == 0 && text.iter().all(|b| b.is_ascii_whitespace()) => {
                continue
            }
            Event::Start(_) => {
                depth += 1;
                false
            }
            Event::End(_) => {
                depth -= 1;
                depth == 0
            }
            _ => depth == 0,
        };

        let writer = current.get_or_insert_with(|| Writer::new(Vec::new()));
        write_event(writer, event, path)?;

        if closes_child {
            if let Some(writer) = current.take() {
                children.push(into_string(writer, path)?);
            }
        }
    }

    Ok(children)
}
