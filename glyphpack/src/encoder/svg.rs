//! SVG font assembly.
//!
//! [`SvgFontAssembler`] builds an SVG `<font>` document from individual SVG
//! icons. It reads each icon's dimensions (`viewBox`, or `width`/`height`)
//! and the `d` attribute of its `<path>` elements. Path data is embedded
//! as-is apart from uniform scaling under `normalize`: sources are expected to be single-path icons already drawn in
//! font orientation. Icons that need outline conversion should go through an
//! external encoder instead.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{BoxFuture, EncodeResult, SvgFontEncoder};
use crate::error::EncodeError;
use crate::glyph::Glyph;
use crate::request::ShapingOptions;

/// Font height used when neither the options nor any glyph provide one.
const FALLBACK_FONT_HEIGHT: f64 = 1000.0;

/// Assembles glyph sources into an SVG font.
#[derive(Debug, Clone, Default)]
pub struct SvgFontAssembler;

impl SvgFontAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assembles already loaded icon sources, in order.
    pub fn assemble(
        &self,
        glyphs: &[Glyph],
        sources: &[String],
        font_name: &str,
        shaping: &ShapingOptions,
    ) -> EncodeResult {
        let icons = glyphs
            .iter()
            .zip(sources)
            .map(|(glyph, source)| {
                IconSource::parse(source).map_err(|e| {
                    EncodeError::Invalid(format!("{}: {}", glyph.source_file.display(), e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let font_height = shaping.font_height.map(f64::from).unwrap_or_else(|| {
            icons
                .iter()
                .map(|icon| icon.height)
                .fold(None, |max: Option<f64>, h| Some(max.map_or(h, |m| m.max(h))))
                .unwrap_or(FALLBACK_FONT_HEIGHT)
        });
        let descent = f64::from(shaping.descent.unwrap_or(0));
        let ascent = shaping
            .ascent
            .map(f64::from)
            .unwrap_or(font_height - descent);

        // Normalizing scales outline and advance together
        let scales: Vec<f64> = icons
            .iter()
            .map(|icon| {
                if shaping.normalize && icon.height > 0.0 {
                    font_height / icon.height
                } else {
                    1.0
                }
            })
            .collect();
        let widths: Vec<f64> = icons
            .iter()
            .zip(&scales)
            .map(|(icon, scale)| icon.width * scale)
            .collect();
        let outlines = glyphs
            .iter()
            .zip(&icons)
            .zip(&scales)
            .map(|((glyph, icon), &scale)| {
                if scale == 1.0 {
                    return Ok(icon.path_data.clone());
                }
                scale_path(&icon.path_data, scale).map_err(|e| {
                    EncodeError::Invalid(format!("{}: {}", glyph.source_file.display(), e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let max_width = widths.iter().copied().fold(0.0, f64::max);

        let name = escape_attr(font_name);
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" standalone=\"no\"?>\n");
        out.push_str(
            "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \
             \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n",
        );
        out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\">\n<defs>\n");
        let _ = writeln!(
            out,
            "  <font id=\"{}\" horiz-adv-x=\"{}\">",
            name,
            number(max_width)
        );
        let _ = writeln!(
            out,
            "    <font-face font-family=\"{}\" units-per-em=\"{}\" ascent=\"{}\" descent=\"{}\" />",
            name,
            number(font_height),
            number(ascent),
            number(-descent)
        );
        out.push_str("    <missing-glyph horiz-adv-x=\"0\" />\n");

        for ((glyph, outline), width) in glyphs.iter().zip(&outlines).zip(&widths) {
            let advance = if shaping.fixed_width { max_width } else { *width };
            let _ = writeln!(
                out,
                "    <glyph glyph-name=\"{}\" unicode=\"&#x{:X};\" horiz-adv-x=\"{}\" d=\"{}\" />",
                escape_attr(&glyph.name),
                glyph.codepoint,
                number(advance),
                escape_attr(outline)
            );
        }

        out.push_str("  </font>\n</defs>\n</svg>\n");
        Ok(out.into_bytes())
    }
}

impl SvgFontEncoder for SvgFontAssembler {
    fn encode<'a>(
        &'a self,
        glyphs: &'a [Glyph],
        font_name: &'a str,
        shaping: &'a ShapingOptions,
    ) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async move {
            let mut sources = Vec::with_capacity(glyphs.len());
            for glyph in glyphs {
                sources.push(tokio::fs::read_to_string(&glyph.source_file).await?);
            }
            debug!(glyphs = glyphs.len(), font = font_name, "Assembling SVG font");
            self.assemble(glyphs, &sources, font_name, shaping)
        })
    }
}

/// The parts of an icon file the assembler uses.
#[derive(Debug, Clone, PartialEq)]
struct IconSource {
    width: f64,
    height: f64,
    path_data: String,
}

impl IconSource {
    fn parse(source: &str) -> Result<Self, String> {
        let root = svg_root_re()
            .find(source)
            .ok_or_else(|| "no <svg> element".to_string())?
            .as_str();

        let (width, height) = match attr(root, RootAttr::ViewBox) {
            Some(view_box) => {
                let numbers: Vec<f64> = view_box
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<f64>().map_err(|_| format!("bad viewBox '{}'", view_box)))
                    .collect::<Result<_, _>>()?;
                match numbers.as_slice() {
                    [_, _, w, h] => (*w, *h),
                    _ => return Err(format!("bad viewBox '{}'", view_box)),
                }
            }
            None => (
                attr(root, RootAttr::Width).and_then(length).unwrap_or(0.0),
                attr(root, RootAttr::Height).and_then(length).unwrap_or(0.0),
            ),
        };

        let path_data = path_re()
            .captures_iter(source)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            width,
            height,
            path_data,
        })
    }
}

fn svg_root_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("valid regex"))
}

fn path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<path\b[^>]*?\sd\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

/// Root attributes the assembler reads.
#[derive(Debug, Clone, Copy)]
enum RootAttr {
    ViewBox,
    Width,
    Height,
}

fn view_box_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\sviewBox\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn width_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\swidth\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn height_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\sheight\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

/// Value of a root attribute inside the `<svg>` start tag.
fn attr(tag: &str, name: RootAttr) -> Option<&str> {
    let re = match name {
        RootAttr::ViewBox => view_box_re(),
        RootAttr::Width => width_re(),
        RootAttr::Height => height_re(),
    };
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Multiplies every coordinate in SVG path data by `factor`.
///
/// Arc rotation angles and flags are copied through untouched.
fn scale_path(d: &str, factor: f64) -> Result<String, String> {
    let mut out = String::with_capacity(d.len());
    let mut rest = d;
    let mut arc = false;
    let mut param = 0usize;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(c) = rest.chars().next() else {
            break;
        };

        if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            out.push(c);
            arc = c == 'A' || c == 'a';
            param = 0;
            rest = &rest[1..];
            continue;
        }

        let slot = param % 7;
        param += 1;
        if !out.is_empty() && !out.ends_with(|c: char| c.is_ascii_alphabetic()) {
            out.push(' ');
        }

        // Flags may be written without separators: "a1 1 0 011 1"
        if arc && (slot == 3 || slot == 4) {
            match c {
                '0' | '1' => {
                    out.push(c);
                    rest = &rest[1..];
                    continue;
                }
                _ => return Err(format!("bad arc flag in path data near '{}'", rest)),
            }
        }

        let len = number_len(rest);
        if len == 0 {
            return Err(format!("unexpected '{}' in path data", c));
        }
        let value: f64 = rest[..len]
            .parse()
            .map_err(|_| format!("bad number '{}' in path data", &rest[..len]))?;
        rest = &rest[len..];

        if arc && slot == 2 {
            out.push_str(&number(value));
        } else {
            out.push_str(&number(value * factor));
        }
    }
    Ok(out)
}

/// Byte length of the number at the start of `s`, as path data spells it.
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if j > frac_start || digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Parses a length such as `24`, `24px` or `24.5`.
fn length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

/// Formats a number without a trailing `.0` and with at most 3 decimals.
fn number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.3}", rounded);
        s.trim_end_matches('0').to_string()
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
