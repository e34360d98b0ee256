#![forbid(unsafe_code)]

//! Palette compositor.
//!
//! Flattens each [`Theme`] into a render-ready [`PaletteTable`] and appends
//! the button legend colors discovered at start-up to every table. The
//! button entries are appended in declaration order; the input side assigns
//! key symbols in the same order, so entry `n` of the button block always
//! belongs to the `n`-th bound pin.

use std::fmt;

use crate::style::Style;
use crate::theme::{ColorPair, Theme};

/// One `(region, colors)` row of a palette table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub region: String,
    pub colors: ColorPair,
}

/// The flattened palette of one theme.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaletteTable {
    name: String,
    entries: Vec<PaletteEntry>,
}

impl PaletteTable {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a region to its cell style.
    #[must_use]
    pub fn lookup(&self, region: &str) -> Option<Style> {
        self.entries
            .iter()
            .find(|entry| entry.region == region)
            .map(|entry| entry.colors.style())
    }
}

/// All flattened themes, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaletteSet {
    tables: Vec<PaletteTable>,
}

impl PaletteSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteTable> {
        self.tables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(PaletteTable::name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PaletteTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Name of the theme after `current`, wrapping around.
    ///
    /// An unknown `current` yields the first theme.
    #[must_use]
    pub fn next_after(&self, current: &str) -> Option<&str> {
        let next = match self.tables.iter().position(|t| t.name == current) {
            Some(idx) => (idx + 1) % self.tables.len(),
            None => 0,
        };
        self.tables.get(next).map(PaletteTable::name)
    }
}

/// Palette construction failure. Always a start-up configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    /// Two themes share a name.
    DuplicateTheme(String),
    /// A theme declares the same region twice.
    DuplicateRegion { theme: String, region: String },
    /// A button region shadows a region the theme already declares.
    RegionCollision { theme: String, region: String },
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTheme(name) => write!(f, "theme {name:?} is defined twice"),
            Self::DuplicateRegion { theme, region } => {
                write!(f, "theme {theme:?} declares region {region:?} twice")
            }
            Self::RegionCollision { theme, region } => write!(
                f,
                "button region {region:?} collides with a region of theme {theme:?}"
            ),
        }
    }
}

impl std::error::Error for PaletteError {}

/// Build one flattened table per theme, each followed by the button entries.
///
/// # Errors
///
/// Fails on duplicate theme names, duplicate regions within a theme, and
/// button regions that collide with theme regions or with each other.
pub fn build_palette(
    themes: &[Theme],
    buttons: &[(String, ColorPair)],
) -> Result<PaletteSet, PaletteError> {
    let mut tables: Vec<PaletteTable> = Vec::with_capacity(themes.len());

    for theme in themes {
        if tables.iter().any(|t| t.name == theme.name) {
            return Err(PaletteError::DuplicateTheme(theme.name.clone()));
        }

        let mut entries: Vec<PaletteEntry> =
            Vec::with_capacity(theme.regions.len() + buttons.len());
        for (region, colors) in &theme.regions {
            if entries.iter().any(|e| &e.region == region) {
                return Err(PaletteError::DuplicateRegion {
                    theme: theme.name.clone(),
                    region: region.clone(),
                });
            }
            entries.push(PaletteEntry {
                region: region.clone(),
                colors: *colors,
            });
        }

        let declared = entries.len();
        for (region, colors) in buttons {
            if entries[..declared].iter().any(|e| &e.region == region) {
                return Err(PaletteError::RegionCollision {
                    theme: theme.name.clone(),
                    region: region.clone(),
                });
            }
            if entries[declared..].iter().any(|e| &e.region == region) {
                return Err(PaletteError::DuplicateRegion {
                    theme: theme.name.clone(),
                    region: region.clone(),
                });
            }
            entries.push(PaletteEntry {
                region: region.clone(),
                colors: *colors,
            });
        }

        tables.push(PaletteTable {
            name: theme.name.clone(),
            entries,
        });
    }

    Ok(PaletteSet { tables })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::style::StyleFlags;

    fn pair(fg: &str, bg: &str) -> ColorPair {
        ColorPair::parse(fg, bg).unwrap()
    }

    fn main_theme() -> Theme {
        Theme::new("main")
            .region("header", pair("white", "dark blue"))
            .region("footer", pair("black", "light gray"))
    }

    #[test]
    fn preserves_region_order() {
        let set = build_palette(&[main_theme()], &[]).unwrap();
        let table = set.get("main").unwrap();
        let regions: Vec<&str> = table.entries().iter().map(|e| e.region.as_str()).collect();
        assert_eq!(regions, ["header", "footer"]);
    }

    #[test]
    fn buttons_are_appended_to_every_theme() {
        let other = Theme::new("space").region("header", pair("yellow", "black"));
        let buttons = vec![
            ("f13".to_string(), pair("#000", "#0d0")),
            ("f14".to_string(), pair("#000", "#33f")),
        ];
        let set = build_palette(&[main_theme(), other], &buttons).unwrap();
        assert_eq!(set.get("main").unwrap().len(), 4);
        assert_eq!(set.get("space").unwrap().len(), 3);
        for table in set.iter() {
            let tail: Vec<&str> = table.entries()[table.len() - 2..]
                .iter()
                .map(|e| e.region.as_str())
                .collect();
            assert_eq!(tail, ["f13", "f14"]);
        }
    }

    #[test]
    fn duplicate_theme_is_rejected() {
        let err = build_palette(&[main_theme(), main_theme()], &[]).unwrap_err();
        assert_eq!(err, PaletteError::DuplicateTheme("main".into()));
    }

    #[test]
    fn duplicate_region_is_rejected() {
        let theme = main_theme().region("header", ColorPair::default());
        let err = build_palette(&[theme], &[]).unwrap_err();
        assert_eq!(
            err,
            PaletteError::DuplicateRegion {
                theme: "main".into(),
                region: "header".into()
            }
        );
    }

    #[test]
    fn button_region_collision_is_rejected() {
        let buttons = vec![("footer".to_string(), ColorPair::default())];
        let err = build_palette(&[main_theme()], &buttons).unwrap_err();
        assert!(matches!(err, PaletteError::RegionCollision { .. }));
    }

    #[test]
    fn lookup_resolves_style() {
        let theme = Theme::new("main").region("status", pair("yellow,bold", "black"));
        let set = build_palette(&[theme], &[]).unwrap();
        let style = set.get("main").unwrap().lookup("status").unwrap();
        assert_eq!(style.bg, "black".parse::<Color>().unwrap());
        assert!(style.attrs.contains(StyleFlags::BOLD));
        assert!(set.get("main").unwrap().lookup("missing").is_none());
    }

    #[test]
    fn next_after_wraps() {
        let set = build_palette(
            &[Theme::new("main"), Theme::new("space"), Theme::new("dusk")],
            &[],
        )
        .unwrap();
        assert_eq!(set.next_after("main"), Some("space"));
        assert_eq!(set.next_after("dusk"), Some("main"));
        assert_eq!(set.next_after("nope"), Some("main"));
        assert_eq!(PaletteSet::default().next_after("main"), None);
    }

    #[test]
    fn error_messages_name_the_culprit() {
        let err = PaletteError::RegionCollision {
            theme: "main".into(),
            region: "f13".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("f13") && msg.contains("main"));
    }
}
