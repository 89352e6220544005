//! `render`: render once and print what the preview would show.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::StudioConfig;
use crate::protocol::ThemeKind;
use crate::render::{DiagramRenderer, MermaidCli, RenderedDiagram, Size};
use crate::sandbox::viewport::Viewport;
use crate::{debug, log};

pub fn run_render(file: &Path, container: Size, config: &StudioConfig) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let theme = config.render.theme.resolve(ThemeKind::default());

    let diagram = MermaidCli::new(&config.render)
        .render(&source, theme)
        .with_context(|| format!("failed to render {}", file.display()))?;

    for line in summarize(&diagram, container, config) {
        log!("render"; "{}", line);
    }
    for node in &diagram.nodes {
        debug!("render"; "{} {:?} {:?}", node.id, node.bounds, node.text);
    }
    Ok(())
}

/// Artifact size, fitted view and node count.
fn summarize(diagram: &RenderedDiagram, container: Size, config: &StudioConfig) -> Vec<String> {
    let mut viewport = Viewport::new(config.viewport.clone(), container);
    viewport.artifact_rendered(diagram.size, true);

    vec![
        format!(
            "artifact {}x{}, container {}x{}",
            diagram.size.width, diagram.size.height, container.width, container.height
        ),
        format!("zoom {} ({})", viewport.zoom_label(), viewport.transform()),
        format!("{} node(s)", diagram.nodes.len()),
    ]
}
