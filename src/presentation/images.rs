//! Text overlays on the frame base images.
//!
//! Output is an SVG document, rendered from `templates/overlay.svg`, that
//! embeds the base image as a data URI and draws the text with `<text>`
//! elements at fixed coordinates.

use askama::Template;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Characters per roast line.
pub const ROAST_WRAP_WIDTH: usize = 90;
const ROAST_ORIGIN: (u32, u32) = (18, 68);
const ROAST_LINE_HEIGHT: u32 = 20;
const SCORE_ORIGIN: (u32, u32) = (280, 120);

pub const SVG_MIME: &str = "image/svg+xml";

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("base image could not be measured: {0}")]
    Measure(String),
    #[error("overlay could not be rendered: {0}")]
    Render(#[source] askama::Error),
}

/// A base image loaded from disk.
#[derive(Debug, Clone)]
pub struct BaseImage<'a> {
    pub bytes: &'a [u8],
    pub content_type: &'a str,
}

/// Greedy word wrap. Lines hold at most `width` characters unless a single
/// word is longer; runs of spaces collapse.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Roast text wrapped onto the roast base image.
pub fn roast_overlay(base: &BaseImage<'_>, roast: &str, width: usize) -> Result<String, OverlayError> {
    let lines = wrap_lines(roast, width);
    let texts = lines
        .iter()
        .enumerate()
        .map(|(row, line)| TextRun {
            x: ROAST_ORIGIN.0,
            y: ROAST_ORIGIN.1 + row as u32 * ROAST_LINE_HEIGHT,
            size: 16,
            fill: "#ffffff",
            text: line,
        })
        .collect::<Vec<_>>();
    compose(base, &texts)
}

pub fn score_overlay(base: &BaseImage<'_>, score: &str) -> Result<String, OverlayError> {
    compose(
        base,
        &[TextRun {
            x: SCORE_ORIGIN.0,
            y: SCORE_ORIGIN.1,
            size: 32,
            fill: "#000000",
            text: score,
        }],
    )
}

/// `data:` URI for inlining an overlay in frame markup.
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:{SVG_MIME};base64,{}", STANDARD.encode(svg))
}

struct TextRun<'a> {
    x: u32,
    y: u32,
    size: u32,
    fill: &'static str,
    text: &'a str,
}

/// Text coordinates are the top edge; the template anchors with `dominant-baseline="hanging"`.
#[derive(Template)]
#[template(path = "overlay.svg", escape = "html")]
struct OverlayTemplate<'a> {
    width: usize,
    height: usize,
    content_type: &'a str,
    encoded: String,
    texts: &'a [TextRun<'a>],
}

fn compose(base: &BaseImage<'_>, texts: &[TextRun<'_>]) -> Result<String, OverlayError> {
    let size = imagesize::blob_size(base.bytes).map_err(|err| OverlayError::Measure(err.to_string()))?;

    OverlayTemplate {
        width: size.width,
        height: size.height,
        content_type: base.content_type,
        encoded: STANDARD.encode(base.bytes),
        texts,
    }
    .render()
    .map_err(OverlayError::Render)
}
