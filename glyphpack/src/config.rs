//! INI configuration file.
//!
//! ```ini
//! [font]
//! name = icons
//! formats = svg,woff,woff2
//! start_codepoint = 0xEA01
//! prepend = false
//!
//! [shape]
//! font_height = 1000
//! descent = 150
//! normalize = true
//!
//! [paths]
//! output = dist/fonts
//! cache = .fontcache.json
//!
//! [cachebuster]
//! mode = hash
//!
//! [encoders]
//! ttf = svg2ttf {input} {output}
//! woff2 = woff2_compress {input}
//! ```
//!
//! Missing keys keep their defaults. `cache = none` turns incremental builds
//! off. `[encoders]` entries register external command transcoders on top
//! of the built-in encoders.

use std::fmt::Display;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use ini::Ini;
use thiserror::Error;

use crate::codepoint::DEFAULT_START_CODEPOINT;
use crate::encoder::{CommandTranscoder, EncoderSet};
use crate::error::EncodeError;
use crate::format::{FontFormat, FormatSet};
use crate::request::{
    BuildRequest, Cachebuster, ShapingOptions, DEFAULT_CACHE_FILE, DEFAULT_FONT_NAME,
};
use crate::source::SourceSpec;

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "glyphpack.ini";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "fonts";

const SECTION_FONT: &str = "font";
const SECTION_SHAPE: &str = "shape";
const SECTION_PATHS: &str = "paths";
const SECTION_CACHEBUSTER: &str = "cachebuster";
const SECTION_ENCODERS: &str = "encoders";

const ENCODER_TEMPLATE: &str = "
[encoders]
; SVG to TTF has no built-in encoder; uncomment and adjust to build ttf,
; woff, woff2 or eot.
; ttf = svg2ttf {input} {output}
; woff2 = woff2_compress {input}
";

const CACHE_DISABLED: &str = "none";

/// Errors loading or interpreting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: ini::Error },

    #[error("failed to write config {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid {format} encoder command: {source}")]
    Encoder {
        format: FontFormat,
        source: EncodeError,
    },
}

/// `[font]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSettings {
    pub name: String,
    pub formats: FormatSet,
    pub start_codepoint: u32,
    pub prepend: bool,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            formats: FormatSet::default(),
            start_codepoint: DEFAULT_START_CODEPOINT,
            prepend: false,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSettings {
    pub output: PathBuf,
    /// `None` disables the cache store.
    pub cache: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cache: Some(PathBuf::from(DEFAULT_CACHE_FILE)),
        }
    }
}

/// `[encoders]` section: command templates for external transcoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderCommands {
    pub ttf: Option<String>,
    pub woff: Option<String>,
    pub woff2: Option<String>,
    pub eot: Option<String>,
}

impl EncoderCommands {
    fn entries(&self) -> [(FontFormat, &Option<String>); 4] {
        [
            (FontFormat::Ttf, &self.ttf),
            (FontFormat::Woff, &self.woff),
            (FontFormat::Woff2, &self.woff2),
            (FontFormat::Eot, &self.eot),
        ]
    }

    fn slot(&mut self, format: FontFormat) -> Option<&mut Option<String>> {
        match format {
            FontFormat::Ttf => Some(&mut self.ttf),
            FontFormat::Woff => Some(&mut self.woff),
            FontFormat::Woff2 => Some(&mut self.woff2),
            FontFormat::Eot => Some(&mut self.eot),
            FontFormat::Svg => None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub font: FontSettings,
    pub shape: ShapingOptions,
    pub paths: PathSettings,
    pub cachebuster: Cachebuster,
    pub encoders: EncoderCommands,
}

impl ConfigFile {
    /// Loads the file at the default location, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads and validates the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Interprets an already parsed INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |section: &str, key: &str| {
            ini.get_from(Some(section), key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(name) = get(SECTION_FONT, "name") {
            config.font.name = name.to_string();
        }
        if let Some(value) = get(SECTION_FONT, "formats") {
            config.font.formats = parse_value(SECTION_FONT, "formats", value)?;
        }
        if let Some(value) = get(SECTION_FONT, "start_codepoint") {
            config.font.start_codepoint = parse_codepoint(value)?;
        }
        if let Some(value) = get(SECTION_FONT, "prepend") {
            config.font.prepend = parse_bool(SECTION_FONT, "prepend", value)?;
        }

        if let Some(value) = get(SECTION_SHAPE, "font_height") {
            config.shape.font_height = Some(parse_value(SECTION_SHAPE, "font_height", value)?);
        }
        if let Some(value) = get(SECTION_SHAPE, "ascent") {
            config.shape.ascent = Some(parse_value(SECTION_SHAPE, "ascent", value)?);
        }
        if let Some(value) = get(SECTION_SHAPE, "descent") {
            config.shape.descent = Some(parse_value(SECTION_SHAPE, "descent", value)?);
        }
        if let Some(value) = get(SECTION_SHAPE, "normalize") {
            config.shape.normalize = parse_bool(SECTION_SHAPE, "normalize", value)?;
        }
        if let Some(value) = get(SECTION_SHAPE, "center_horizontally") {
            config.shape.center_horizontally =
                parse_bool(SECTION_SHAPE, "center_horizontally", value)?;
        }
        if let Some(value) = get(SECTION_SHAPE, "fixed_width") {
            config.shape.fixed_width = parse_bool(SECTION_SHAPE, "fixed_width", value)?;
        }

        if let Some(value) = get(SECTION_PATHS, "output") {
            config.paths.output = PathBuf::from(value);
        }
        if let Some(value) = get(SECTION_PATHS, "cache") {
            config.paths.cache =
                (!value.eq_ignore_ascii_case(CACHE_DISABLED)).then(|| PathBuf::from(value));
        }

        config.cachebuster = match get(SECTION_CACHEBUSTER, "mode") {
            None | Some("hash") => Cachebuster::Hash,
            Some("none") => Cachebuster::Disabled,
            Some("fixed") => match get(SECTION_CACHEBUSTER, "fixed") {
                Some(token) => Cachebuster::Fixed(token.to_string()),
                None => {
                    return Err(ConfigError::InvalidValue {
                        section: SECTION_CACHEBUSTER,
                        key: "fixed",
                        value: String::new(),
                        reason: "mode = fixed requires a token".to_string(),
                    })
                }
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    section: SECTION_CACHEBUSTER,
                    key: "mode",
                    value: other.to_string(),
                    reason: "expected hash, fixed or none".to_string(),
                })
            }
        };

        for format in [
            FontFormat::Ttf,
            FontFormat::Woff,
            FontFormat::Woff2,
            FontFormat::Eot,
        ] {
            if let (Some(command), Some(slot)) = (
                get(SECTION_ENCODERS, format.extension()),
                config.encoders.slot(format),
            ) {
                *slot = Some(command.to_string());
            }
        }

        Ok(config)
    }

    /// Renders the configuration as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some(SECTION_FONT))
            .set("name", self.font.name.as_str())
            .set("formats", self.font.formats.to_string())
            .set("start_codepoint", format!("{:#X}", self.font.start_codepoint))
            .set("prepend", self.font.prepend.to_string());

        {
            let mut shape = ini.with_section(Some(SECTION_SHAPE));
            if let Some(height) = self.shape.font_height {
                shape.set("font_height", height.to_string());
            }
            if let Some(ascent) = self.shape.ascent {
                shape.set("ascent", ascent.to_string());
            }
            if let Some(descent) = self.shape.descent {
                shape.set("descent", descent.to_string());
            }
            shape
                .set("normalize", self.shape.normalize.to_string())
                .set(
                    "center_horizontally",
                    self.shape.center_horizontally.to_string(),
                )
                .set("fixed_width", self.shape.fixed_width.to_string());
        }

        let cache = match &self.paths.cache {
            Some(path) => path.display().to_string(),
            None => CACHE_DISABLED.to_string(),
        };
        ini.with_section(Some(SECTION_PATHS))
            .set("output", self.paths.output.display().to_string())
            .set("cache", cache);

        match &self.cachebuster {
            Cachebuster::Hash => {
                ini.with_section(Some(SECTION_CACHEBUSTER)).set("mode", "hash");
            }
            Cachebuster::Fixed(token) => {
                ini.with_section(Some(SECTION_CACHEBUSTER))
                    .set("mode", "fixed")
                    .set("fixed", token.as_str());
            }
            Cachebuster::Disabled => {
                ini.with_section(Some(SECTION_CACHEBUSTER)).set("mode", "none");
            }
        }

        for (format, command) in self.encoders.entries() {
            if let Some(command) = command {
                ini.with_section(Some(SECTION_ENCODERS))
                    .set(format.extension(), command.as_str());
            }
        }

        ini
    }

    /// Writes the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Writes these settings plus a commented `[encoders]` template when no
    /// encoder command is configured yet.
    pub fn save_template_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.save_to(path)?;
        if self.encoders.entries().iter().any(|(_, cmd)| cmd.is_some()) {
            return Ok(());
        }

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        file.write_all(ENCODER_TEMPLATE.as_bytes())
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Requested formats (and TTF when a derived format needs it) that no
    /// built-in or configured encoder can produce.
    pub fn unsupported_formats(&self) -> Result<Vec<FontFormat>, ConfigError> {
        let encoders = self.encoder_set()?;
        let mut needed = self.font.formats.clone();
        if needed.needs_ttf() {
            needed.insert(FontFormat::Ttf);
        }
        Ok(needed
            .iter()
            .filter(|&format| format != FontFormat::Svg && !encoders.supports(format))
            .collect())
    }

    /// A build request for `sources` using these settings.
    pub fn to_request(&self, sources: impl Into<SourceSpec>) -> BuildRequest {
        let mut request = BuildRequest::new(sources, &self.paths.output)
            .with_font_name(self.font.name.clone())
            .with_formats(self.font.formats.iter())
            .with_start_codepoint(self.font.start_codepoint, self.font.prepend)
            .with_shaping(self.shape.clone())
            .with_cachebuster(self.cachebuster.clone());
        request.cache = self.paths.cache.clone();
        request
    }

    /// Built-in encoders plus a [`CommandTranscoder`] for every configured
    /// command. Configured commands replace built-in encoders.
    pub fn encoder_set(&self) -> Result<EncoderSet, ConfigError> {
        let mut encoders = EncoderSet::builtin();
        for (format, command) in self.encoders.entries() {
            let Some(command) = command else {
                continue;
            };
            let input = if format == FontFormat::Ttf {
                FontFormat::Svg
            } else {
                FontFormat::Ttf
            };
            let transcoder = CommandTranscoder::new(command, input, format)
                .map_err(|source| ConfigError::Encoder { format, source })?;
            encoders = encoders.with_transcoder(format, Arc::new(transcoder));
        }
        Ok(encoders)
    }
}

/// Default configuration file location:
/// `<config dir>/glyphpack/glyphpack.ini`, or the working directory when
/// the platform has no config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("glyphpack"))
        .unwrap_or_default()
        .join(CONFIG_FILE_NAME)
}

fn parse_value<T>(section: &'static str, key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(section: &'static str, key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            section,
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Parses `0xEA01`, `U+EA01` or a decimal number.
pub fn parse_codepoint(value: &str) -> Result<u32, ConfigError> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .or_else(|| value.strip_prefix("U+"))
        .or_else(|| value.strip_prefix("u+"));
    let parsed = match hex {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| ConfigError::InvalidValue {
        section: SECTION_FONT,
        key: "start_codepoint",
        value: value.to_string(),
        reason: e.to_string(),
    })
}
