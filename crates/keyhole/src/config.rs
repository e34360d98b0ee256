#![forbid(unsafe_code)]

//! Application configuration: defaults, JSON file, environment, CLI.
//!
//! Precedence, lowest to highest: built-in defaults, the JSON config file
//! (`--config` or `KEYHOLE_CONFIG`), environment variables, command-line
//! flags. [`AppConfig::validate`] runs once before anything touches the
//! terminal; every error it reports is fatal.
//!
//! JSON objects are read in file order and keep duplicate keys, so region
//! order and pin order are exactly what the file says and a repeated key is
//! reported instead of silently winning.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::hash::BuildHasher;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use keyhole_style::{ColorPair, ColorParseError, ColorProfile, PaletteError, Theme, build_palette};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use tracing::level_filters::LevelFilter;

use crate::buttons::ButtonBindings;
use crate::cli::{Opts, parse_color_depth};
use crate::clock::{ClockError, ClockTicker};
use crate::logging::parse_level;

/// Foreground and background color specs, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpec {
    pub fg: String,
    pub bg: String,
}

impl ColorSpec {
    pub fn new(fg: impl Into<String>, bg: impl Into<String>) -> Self {
        Self {
            fg: fg.into(),
            bg: bg.into(),
        }
    }

    fn parse(&self, context: impl FnOnce() -> String) -> Result<ColorPair, ConfigError> {
        ColorPair::parse(&self.fg, &self.bg).map_err(|source| ConfigError::InvalidColor {
            context: context(),
            source,
        })
    }
}

/// A theme before its colors are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSpec {
    pub name: String,
    pub regions: Vec<(String, ColorSpec)>,
}

/// The fully merged configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub clock_format: String,
    pub clock_timezone: String,
    pub title: String,
    pub subtitle: String,
    /// Theme active at start-up.
    pub theme: String,
    pub splash_secs: u64,
    pub colors: ColorProfile,
    pub themes: Vec<ThemeSpec>,
    /// GPIO pin → button legend colors, in button order.
    pub pin_color_map: Vec<(u32, ColorSpec)>,
    pub app_version: String,
}

fn theme(name: &str, regions: &[(&str, &str, &str)]) -> ThemeSpec {
    ThemeSpec {
        name: name.to_string(),
        regions: regions
            .iter()
            .map(|(region, fg, bg)| (region.to_string(), ColorSpec::new(*fg, *bg)))
            .collect(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warning".into(),
            log_file: None,
            clock_format: "%Y-%m-%d %H:%M:%S %Z".into(),
            clock_timezone: "utc".into(),
            title: "KeyHole".into(),
            subtitle: "Stand-alone Certificate Authority".into(),
            theme: "main".into(),
            splash_secs: 5,
            colors: ColorProfile::Ansi256,
            themes: vec![
                theme(
                    "main",
                    &[
                        ("background", "white", "light gray"),
                        ("logo", "dark blue", "light gray"),
                        ("header", "white", "light blue"),
                        ("app_name", "white", "light blue"),
                        ("screen_name", "white", "dark blue"),
                        ("footer", "white", "dark blue"),
                        ("clock", "white", "dark blue"),
                        ("status", "white", "dark blue"),
                        ("button", "white", "dark blue"),
                    ],
                ),
                theme(
                    "space",
                    &[
                        ("background", "black", "black"),
                        ("logo", "white", "black"),
                        ("header", "black", "black"),
                        ("app_name", "black", "black"),
                        ("screen_name", "black", "black"),
                        ("footer", "black", "black"),
                        ("clock", "dark gray", "black"),
                        ("status", "dark gray", "black"),
                    ],
                ),
            ],
            pin_color_map: vec![
                (17, ColorSpec::new("#000", "#0d0")),
                (22, ColorSpec::new("#000", "#33f")),
                (23, ColorSpec::new("#000", "#dd0")),
                (27, ColorSpec::new("#000", "#f00")),
            ],
            app_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Configuration failure. Always fatal at start-up.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The config file is not valid JSON of the expected shape.
    Parse { path: Option<PathBuf>, message: String },
    InvalidLogLevel(String),
    InvalidColor { context: String, source: ColorParseError },
    DuplicateRegion { theme: String, region: String },
    DuplicatePin(u32),
    /// A `pin_color_map` key that is not a pin number.
    InvalidPin(String),
    TooManyPins { count: usize, max: usize },
    UnknownTheme(String),
    Clock(ClockError),
    Palette(PaletteError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config file {}: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {message}"),
            Self::InvalidLogLevel(level) => write!(
                f,
                "unknown log level {level:?} (expected error, warning, info, debug, trace or off)"
            ),
            Self::InvalidColor { context, source } => write!(f, "{context}: {source}"),
            Self::DuplicateRegion { theme, region } => {
                write!(f, "theme {theme:?} declares region {region:?} twice")
            }
            Self::DuplicatePin(pin) => write!(f, "pin {pin} appears twice in pin_color_map"),
            Self::InvalidPin(key) => write!(f, "pin_color_map key {key:?} is not a pin number"),
            Self::TooManyPins { count, max } => {
                write!(f, "{count} button pins configured, at most {max} are supported")
            }
            Self::UnknownTheme(name) => write!(f, "theme {name:?} is not defined"),
            Self::Clock(err) => write!(f, "clock: {err}"),
            Self::Palette(err) => write!(f, "palette: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidColor { source, .. } => Some(source),
            Self::Clock(err) => Some(err),
            Self::Palette(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClockError> for ConfigError {
    fn from(err: ClockError) -> Self {
        Self::Clock(err)
    }
}

impl From<PaletteError> for ConfigError {
    fn from(err: PaletteError) -> Self {
        Self::Palette(err)
    }
}

/// A JSON object read in file order, duplicate keys included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl<V> OrderedMap<V> {
    fn first_duplicate(&self) -> Option<&str> {
        self.0.iter().enumerate().find_map(|(i, (key, _))| {
            self.0[..i]
                .iter()
                .any(|(earlier, _)| earlier == key)
                .then_some(key.as_str())
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColorDepth {
    Depth(u32),
    Name(String),
}

/// The config file: every field optional, unknown fields rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    clock_format: Option<String>,
    clock_timezone: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    theme: Option<String>,
    splash_secs: Option<u64>,
    colors: Option<ColorDepth>,
    themes: Option<OrderedMap<OrderedMap<(String, String)>>>,
    pin_color_map: Option<OrderedMap<(String, String)>>,
}

/// Load the configuration from every source.
///
/// The file comes from `--config` or, failing that, `KEYHOLE_CONFIG`. A file
/// that was named but cannot be read is an error.
pub fn load_from_sources<S: BuildHasher>(
    cli: &Opts,
    env: &HashMap<String, String, S>,
) -> Result<AppConfig, ConfigError> {
    let path = cli
        .config
        .clone()
        .or_else(|| env.get("KEYHOLE_CONFIG").map(PathBuf::from));
    let contents = match &path {
        Some(path) => Some(fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?),
        None => None,
    };
    load_from_str(contents.as_deref(), path.as_deref(), cli, env)
}

/// Load from already-read file contents. Does not validate.
pub fn load_from_str<S: BuildHasher>(
    json: Option<&str>,
    path: Option<&Path>,
    cli: &Opts,
    env: &HashMap<String, String, S>,
) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    if let Some(json) = json {
        let patch: ConfigPatch = serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            path: path.map(Path::to_path_buf),
            message: err.to_string(),
        })?;
        apply_patch(&mut config, patch)?;
    }
    apply_env_overrides(&mut config, env);
    apply_cli_overrides(&mut config, cli);
    Ok(config)
}

fn apply_patch(config: &mut AppConfig, patch: ConfigPatch) -> Result<(), ConfigError> {
    if let Some(log_level) = patch.log_level {
        config.log_level = log_level;
    }
    if let Some(log_file) = patch.log_file {
        config.log_file = Some(log_file);
    }
    if let Some(clock_format) = patch.clock_format {
        config.clock_format = clock_format;
    }
    if let Some(clock_timezone) = patch.clock_timezone {
        config.clock_timezone = clock_timezone;
    }
    if let Some(title) = patch.title {
        config.title = title;
    }
    if let Some(subtitle) = patch.subtitle {
        config.subtitle = subtitle;
    }
    if let Some(theme) = patch.theme {
        config.theme = theme;
    }
    if let Some(splash_secs) = patch.splash_secs {
        config.splash_secs = splash_secs;
    }
    if let Some(colors) = patch.colors {
        let profile = match &colors {
            ColorDepth::Depth(depth) => ColorProfile::from_depth(*depth),
            ColorDepth::Name(name) => parse_color_depth(name),
        };
        config.colors = profile.ok_or_else(|| ConfigError::Parse {
            path: None,
            message: format!("unsupported color depth {colors:?}"),
        })?;
    }
    if let Some(themes) = patch.themes {
        if let Some(name) = themes.first_duplicate() {
            return Err(PaletteError::DuplicateTheme(name.to_string()).into());
        }
        for (name, regions) in themes.0 {
            overlay_theme(config, name, regions)?;
        }
    }
    if let Some(pins) = patch.pin_color_map {
        config.pin_color_map = pins
            .0
            .into_iter()
            .map(|(key, (fg, bg))| {
                let pin = key
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidPin(key.clone()))?;
                Ok((pin, ColorSpec { fg, bg }))
            })
            .collect::<Result<_, ConfigError>>()?;
    }
    Ok(())
}

/// Merge file regions into the theme of the same name, or append a new theme.
fn overlay_theme(
    config: &mut AppConfig,
    name: String,
    regions: OrderedMap<(String, String)>,
) -> Result<(), ConfigError> {
    if let Some(region) = regions.first_duplicate() {
        return Err(ConfigError::DuplicateRegion {
            theme: name,
            region: region.to_string(),
        });
    }
    let index = match config.themes.iter().position(|t| t.name == name) {
        Some(index) => index,
        None => {
            config.themes.push(ThemeSpec {
                name,
                regions: Vec::new(),
            });
            config.themes.len() - 1
        }
    };
    let target = &mut config.themes[index].regions;
    for (region, (fg, bg)) in regions.0 {
        let spec = ColorSpec { fg, bg };
        match target.iter_mut().find(|(existing, _)| *existing == region) {
            Some((_, slot)) => *slot = spec,
            None => target.push((region, spec)),
        }
    }
    Ok(())
}

fn apply_env_overrides<S: BuildHasher>(config: &mut AppConfig, env: &HashMap<String, String, S>) {
    if let Some(value) = env.get("KEYHOLE_LOG_LEVEL") {
        config.log_level.clone_from(value);
    }
    if let Some(value) = env.get("KEYHOLE_LOG_FILE") {
        config.log_file = Some(PathBuf::from(value));
    }
    if let Some(value) = env.get("KEYHOLE_THEME") {
        config.theme.clone_from(value);
    }
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Opts) {
    if let Some(log_level) = &cli.log_level {
        config.log_level.clone_from(log_level);
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = Some(log_file.clone());
    }
    if let Some(theme) = &cli.theme {
        config.theme.clone_from(theme);
    }
    if let Some(splash_secs) = cli.splash_secs {
        config.splash_secs = splash_secs;
    }
    if let Some(colors) = cli.colors {
        config.colors = colors;
    }
}

impl AppConfig {
    /// Check everything that could otherwise fail after start-up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level_filter()?;
        self.clock_ticker()?;
        let themes = self.theme_set()?;
        if !themes.iter().any(|t| t.name == self.theme) {
            return Err(ConfigError::UnknownTheme(self.theme.clone()));
        }
        let buttons = ButtonBindings::from_pins(&self.button_pins()?)?;
        build_palette(&themes, &buttons.palette_entries())?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        parse_level(&self.log_level).ok_or_else(|| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn clock_ticker(&self) -> Result<ClockTicker, ConfigError> {
        Ok(ClockTicker::new(&self.clock_format, &self.clock_timezone)?)
    }

    /// Themes with parsed colors, in declaration order.
    pub fn theme_set(&self) -> Result<Vec<Theme>, ConfigError> {
        self.themes
            .iter()
            .map(|spec| {
                let mut theme = Theme::new(spec.name.as_str());
                for (region, colors) in &spec.regions {
                    if theme.get(region).is_some() {
                        return Err(ConfigError::DuplicateRegion {
                            theme: spec.name.clone(),
                            region: region.clone(),
                        });
                    }
                    let pair = colors.parse(|| format!("themes.{}.{region}", spec.name))?;
                    theme = theme.region(region.as_str(), pair);
                }
                Ok(theme)
            })
            .collect()
    }

    /// Button pins with parsed colors, in declaration order.
    ///
    /// Pin count and uniqueness are checked by [`ButtonBindings::from_pins`].
    pub fn button_pins(&self) -> Result<Vec<(u32, ColorPair)>, ConfigError> {
        self.pin_color_map
            .iter()
            .map(|(pin, colors)| Ok((*pin, colors.parse(|| format!("pin_color_map.{pin}"))?)))
            .collect()
    }
}
