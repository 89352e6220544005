//! SVG artifact inspection.
//!
//! Two things are read from a rendered diagram:
//!
//! - its intrinsic size, used by the viewport for fit and center
//! - the identifiable nodes (elements with an `id` and text content) with
//!   their bounding boxes, used for cursor correlation
//!
//! Node bounds are resolved from ancestor `translate(..)` transforms plus the
//! node's own `<rect>` or `<circle>`. Rotations and scales are not followed;
//! the highlight is approximate anyway.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use regex::Regex;

use super::ArtifactNode;
use super::geometry::{Rect, Size};
use crate::core::{StudioError, StudioResult};

/// Size used when the artifact declares none.
pub const FALLBACK_SIZE: Size = Size::new(800.0, 600.0);

static TRANSLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"translate\([ \t\r\n]*(-?[0-9.]+(?:e-?[0-9]+)?)(?:[ \t\r\n,]+(-?[0-9.]+(?:e-?[0-9]+)?))?[ \t\r\n]*\)",
    )
        .unwrap()
});

// ============================================================================
// Geometry
// ============================================================================

/// Intrinsic size of an SVG document.
///
/// Order: numeric `width`/`height` attributes, then the `viewBox`, then what
/// `usvg` makes of the document, then [`FALLBACK_SIZE`].
pub fn artifact_size(svg: &str) -> Size {
    root_attribute_size(svg)
        .or_else(|| usvg_size(svg))
        .unwrap_or(FALLBACK_SIZE)
}

fn root_attribute_size(svg: &str) -> Option<Size> {
    let mut reader = Reader::from_str(svg);
    loop {
        match reader.read_event() {
            Ok(Event::Start(elem) | Event::Empty(elem)) if elem.local_name().as_ref() == b"svg" => {
                let sized = match (attr(&elem, b"width"), attr(&elem, b"height")) {
                    (Some(w), Some(h)) => parse_length(&w)
                        .zip(parse_length(&h))
                        .map(|(w, h)| Size::new(w, h)),
                    _ => None,
                };
                return sized
                    .filter(Size::is_usable)
                    .or_else(|| attr(&elem, b"viewBox").and_then(|vb| parse_view_box(&vb)));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn usvg_size(svg: &str) -> Option<Size> {
    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default()).ok()?;
    let size = tree.size();
    Some(Size::new(f64::from(size.width()), f64::from(size.height()))).filter(Size::is_usable)
}

/// Parse a plain or `px` length. Percentages and other units yield `None`.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    number.trim().parse::<f64>().ok()
}

/// `viewBox="min-x min-y width height"`, comma or space separated.
fn parse_view_box(value: &str) -> Option<Size> {
    let parts: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, w, h] => Some(Size::new(*w, *h)).filter(Size::is_usable),
        _ => None,
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// One open element while walking the document.
struct Frame {
    id: Option<String>,
    /// Cumulative translation including this element's own transform.
    dx: f64,
    dy: f64,
    bounds: Option<Rect>,
    text: String,
    /// Pre-order position, to report nodes in document order.
    order: usize,
    /// Text inside `<style>` is not content.
    is_style: bool,
}

/// Extract identifiable nodes in document order.
///
/// The root `<svg>` is never a node: its text is the text of the whole
/// diagram and would match everything.
pub fn extract_nodes(svg: &str) -> StudioResult<Vec<ArtifactNode>> {
    let mut reader = Reader::from_str(svg);
    let mut stack: Vec<Frame> = Vec::new();
    let mut found: Vec<(usize, ArtifactNode)> = Vec::new();
    let mut order = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let frame = open_frame(&elem, stack.last(), order);
                order += 1;
                // `<rect ...></rect>` carries its geometry like the empty form
                if let Some(shape) = shape_bounds(&elem) {
                    assign_bounds(&mut stack, shape.translate(frame.dx, frame.dy));
                }
                stack.push(frame);
            }
            Ok(Event::Empty(elem)) => {
                if let Some(parent) = stack.last() {
                    let (dx, dy) = own_translate(&elem, parent.dx, parent.dy);
                    if let Some(shape) = shape_bounds(&elem) {
                        assign_bounds(&mut stack, shape.translate(dx, dy));
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(top) = stack.last_mut()
                    && !top.is_style
                {
                    top.text.push_str(&String::from_utf8_lossy(&text));
                }
            }
            Ok(Event::GeneralRef(reference)) => {
                if let Some(top) = stack.last_mut()
                    && !top.is_style
                    && let Some(resolved) = resolve_reference(&reference)
                {
                    top.text.push_str(&resolved);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(top) = stack.last_mut()
                    && !top.is_style
                {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else { continue };
                let is_root = stack.is_empty();
                if let Some(parent) = stack.last_mut()
                    && !frame.is_style
                {
                    parent.text.push_str(&frame.text);
                }
                if is_root {
                    continue;
                }
                if let (Some(id), Some(bounds)) = (frame.id, frame.bounds) {
                    let text = frame.text.trim();
                    if !text.is_empty() {
                        found.push((
                            frame.order,
                            ArtifactNode {
                                id,
                                text: text.to_string(),
                                bounds,
                            },
                        ));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StudioError::Render(format!(
                    "malformed SVG at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    found.sort_by_key(|(order, _)| *order);
    Ok(found.into_iter().map(|(_, node)| node).collect())
}

fn open_frame(elem: &BytesStart, parent: Option<&Frame>, order: usize) -> Frame {
    let (base_x, base_y) = parent.map_or((0.0, 0.0), |p| (p.dx, p.dy));
    let (dx, dy) = own_translate(elem, base_x, base_y);
    Frame {
        id: attr(elem, b"id").filter(|id| !id.is_empty()),
        dx,
        dy,
        bounds: None,
        text: String::new(),
        order,
        is_style: elem.local_name().as_ref() == b"style",
    }
}

/// Give a shape's bounds to the innermost identified ancestor still without.
fn assign_bounds(stack: &mut [Frame], shape: Rect) {
    if let Some(frame) = stack
        .iter_mut()
        .rev()
        .find(|f| f.id.is_some() && f.bounds.is_none())
    {
        frame.bounds = Some(shape);
    }
}

fn own_translate(elem: &BytesStart, base_x: f64, base_y: f64) -> (f64, f64) {
    match attr(elem, b"transform").and_then(|t| parse_translate(&t)) {
        Some((x, y)) => (base_x + x, base_y + y),
        None => (base_x, base_y),
    }
}

fn parse_translate(transform: &str) -> Option<(f64, f64)> {
    let caps = TRANSLATE.captures(transform)?;
    let x = caps.get(1)?.as_str().parse().ok()?;
    let y = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    Some((x, y))
}

/// Local bounds of a `<rect>` or `<circle>`.
fn shape_bounds(elem: &BytesStart) -> Option<Rect> {
    let num = |name: &[u8]| attr(elem, name).and_then(|v| parse_length(&v));
    match elem.local_name().as_ref() {
        b"rect" => {
            let (w, h) = (num(b"width")?, num(b"height")?);
            Some(Rect::new(
                num(b"x").unwrap_or(0.0),
                num(b"y").unwrap_or(0.0),
                w,
                h,
            ))
        }
        b"circle" => {
            let r = num(b"r")?;
            let (cx, cy) = (num(b"cx").unwrap_or(0.0), num(b"cy").unwrap_or(0.0));
            Some(Rect::new(cx - r, cy - r, 2.0 * r, 2.0 * r))
        }
        _ => None,
    }
}

/// `&#49;`, `&#x31;` or one of the predefined XML entities.
fn resolve_reference(reference: &BytesRef) -> Option<String> {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        return Some(ch.to_string());
    }
    let name = reference.decode().ok()?;
    resolve_predefined_entity(&name).map(str::to_string)
}

fn attr(elem: &BytesStart, name: &[u8]) -> Option<String> {
    elem.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}
