use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,

    /// Geometry of the document host
    #[serde(default)]
    pub document: DocumentConfig,

    /// Mindmap layout and interaction options
    #[serde(default)]
    pub diagram: DiagramOptions,

    /// Change detection
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Width of the mindmap pane as a percentage of the terminal
    #[serde(default = "default_diagram_width")]
    pub diagram_width: u16,

    /// Show the mindmap when the TUI starts
    #[serde(default = "default_true")]
    pub show_diagram: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            diagram_width: default_diagram_width(),
            show_diagram: true,
        }
    }
}

fn default_diagram_width() -> u16 {
    50
}

fn default_true() -> bool {
    true
}

/// Document geometry, in document units (pixel-like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Height of one source line
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    /// Base paragraph font size, used to pick the zoom when focusing a node
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            font_size: default_font_size(),
        }
    }
}

fn default_line_height() -> f64 {
    24.0
}

fn default_font_size() -> f64 {
    16.0
}

/// Options handed to the diagram on creation and on every data replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramOptions {
    /// Nodes deeper than this are folded when the diagram is created (1-6)
    #[serde(default = "default_initial_expand_level")]
    pub initial_expand_level: usize,

    /// Relative scale change of one zoom step (0.1-1.0)
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    #[serde(default = "default_spacing_horizontal")]
    pub spacing_horizontal: f64,

    #[serde(default = "default_spacing_vertical")]
    pub spacing_vertical: f64,

    #[serde(default = "default_padding_x")]
    pub padding_x: f64,

    /// Height of a node at zoom 1
    #[serde(default = "default_node_height")]
    pub node_height: f64,

    /// Width of one character of node text at zoom 1
    #[serde(default = "default_char_width")]
    pub char_width: f64,

    /// Share of the surface the diagram fills after a fit
    #[serde(default = "default_fit_ratio")]
    pub fit_ratio: f64,

    /// Upper bound on the scale chosen by a fit
    #[serde(default = "default_max_fit_scale")]
    pub max_fit_scale: f64,

    /// Branch colors, cycled per branch
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    /// Nodes at or below this depth inherit their ancestor's color
    #[serde(default = "default_color_freeze_level")]
    pub color_freeze_level: usize,

    /// Duration of fit transitions in milliseconds
    #[serde(default = "default_animation_ms")]
    pub duration_ms: u64,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            initial_expand_level: default_initial_expand_level(),
            zoom_step: default_zoom_step(),
            spacing_horizontal: default_spacing_horizontal(),
            spacing_vertical: default_spacing_vertical(),
            padding_x: default_padding_x(),
            node_height: default_node_height(),
            char_width: default_char_width(),
            fit_ratio: default_fit_ratio(),
            max_fit_scale: default_max_fit_scale(),
            colors: default_colors(),
            color_freeze_level: default_color_freeze_level(),
            duration_ms: default_animation_ms(),
        }
    }
}

impl DiagramOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

fn default_initial_expand_level() -> usize {
    3
}

fn default_zoom_step() -> f64 {
    0.2
}

fn default_spacing_horizontal() -> f64 {
    80.0
}

fn default_spacing_vertical() -> f64 {
    20.0
}

fn default_padding_x() -> f64 {
    20.0
}

fn default_node_height() -> f64 {
    20.0
}

fn default_char_width() -> f64 {
    8.0
}

fn default_fit_ratio() -> f64 {
    0.95
}

fn default_max_fit_scale() -> f64 {
    2.0
}

fn default_colors() -> Vec<String> {
    ["#4CAF50", "#2196F3", "#FF9800", "#9C27B0", "#F44336", "#00BCD4"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_color_freeze_level() -> usize {
    2
}

fn default_animation_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Rebuild the mindmap automatically while the document is edited
    #[serde(default = "default_true")]
    pub realtime: bool,

    /// Quiet interval before a rebuild starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            realtime: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Wait after expanding folded ancestors before re-measuring
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Duration of pan/zoom transitions
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,

    /// Headings up to this far above the viewport still count as visible
    #[serde(default = "default_viewport_margin")]
    pub viewport_margin: f64,

    /// Space left above a heading scrolled into view
    #[serde(default = "default_scroll_offset")]
    pub scroll_offset: f64,

    /// Time for a heading scroll to settle before its styling is removed
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Zoom used when the optimal scale cannot be measured
    #[serde(default = "default_scale")]
    pub default_scale: f64,

    /// Focus the current heading's node whenever the document scrolls
    #[serde(default)]
    pub follow_scroll: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            animation_ms: default_animation_ms(),
            viewport_margin: default_viewport_margin(),
            scroll_offset: default_scroll_offset(),
            scroll_settle_ms: default_scroll_settle_ms(),
            default_scale: default_scale(),
            follow_scroll: false,
        }
    }
}

impl NavigationConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

fn default_settle_ms() -> u64 {
    100
}

fn default_viewport_margin() -> f64 {
    100.0
}

fn default_scroll_offset() -> f64 {
    48.0
}

fn default_scroll_settle_ms() -> u64 {
    1000
}

fn default_scale() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Pulse color for focused mindmap nodes
    #[serde(default = "default_node_color")]
    pub node_color: String,

    /// Pulse color for headings reached from the mindmap
    #[serde(default = "default_heading_color")]
    pub heading_color: String,

    #[serde(default = "default_highlight_ms")]
    pub duration_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            node_color: default_node_color(),
            heading_color: default_heading_color(),
            duration_ms: default_highlight_ms(),
        }
    }
}

impl HighlightConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

fn default_node_color() -> String {
    "#FFEB3B".to_string()
}

fn default_heading_color() -> String {
    "#FFF59D".to_string()
}

fn default_highlight_ms() -> u64 {
    1500
}

/// Partial option overrides, applied on top of a [`Config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_expand_level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_scroll: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_duration_ms: Option<u64>,
}

/// Valid range for the initial expand level
pub const EXPAND_LEVEL_RANGE: std::ops::RangeInclusive<usize> = 1..=6;

/// Valid range for the zoom step
pub const ZOOM_STEP_RANGE: std::ops::RangeInclusive<f64> = 0.1..=1.0;

impl Config {
    /// Get the XDG-style config file path (~/.config/tocmap/config.toml)
    /// This is preferred on macOS for CLI tools and cross-platform dotfiles
    #[cfg(target_os = "macos")]
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("tocmap").join("config.toml"))
    }

    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/tocmap/config.toml
    /// - Linux: ~/.config/tocmap/config.toml
    /// - Windows: %APPDATA%/tocmap/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tocmap").join("config.toml"))
    }

    /// Load config from file, or return default if file doesn't exist
    /// On macOS, checks ~/.config/tocmap first, then falls back to ~/Library/Application Support
    pub fn load() -> Self {
        #[cfg(target_os = "macos")]
        {
            if let Some(xdg_path) = Self::xdg_config_path() {
                if let Ok(config) = Self::load_from(&xdg_path) {
                    return config;
                }
            }
        }

        Self::config_path()
            .and_then(|path| match Self::load_from(&path) {
                Ok(config) => Some(config),
                Err(Error::Read { .. }) => None,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring unreadable config");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save config to the platform config file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(Error::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save config atomically: write a temp file next to `path`, then rename it.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;

        let contents = toml::to_string_pretty(self)?;
        let mut file = tempfile::NamedTempFile::new_in(parent)?;
        file.write_all(contents.as_bytes())?;
        file.persist(path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// Apply partial overrides. Out-of-range values are ignored.
    ///
    /// Returns true if an option that affects the diagram's data changed.
    pub fn apply(&mut self, patch: &OptionsPatch) -> bool {
        let mut diagram_changed = false;

        if let Some(level) = patch.initial_expand_level {
            if EXPAND_LEVEL_RANGE.contains(&level) {
                diagram_changed |= self.diagram.initial_expand_level != level;
                self.diagram.initial_expand_level = level;
            } else {
                tracing::warn!(level, "initial expand level out of range, ignored");
            }
        }
        if let Some(step) = patch.zoom_step {
            if ZOOM_STEP_RANGE.contains(&step) {
                self.diagram.zoom_step = step;
            } else {
                tracing::warn!(step, "zoom step out of range, ignored");
            }
        }
        if let Some(realtime) = patch.realtime {
            self.sync.realtime = realtime;
        }
        if let Some(ms) = patch.debounce_ms {
            self.sync.debounce_ms = ms;
        }
        if let Some(ms) = patch.settle_ms {
            self.navigation.settle_ms = ms;
        }
        if let Some(ms) = patch.animation_ms {
            self.navigation.animation_ms = ms;
        }
        if let Some(margin) = patch.viewport_margin {
            self.navigation.viewport_margin = margin;
        }
        if let Some(offset) = patch.scroll_offset {
            self.navigation.scroll_offset = offset;
        }
        if let Some(follow) = patch.follow_scroll {
            self.navigation.follow_scroll = follow;
        }
        if let Some(color) = &patch.node_highlight_color {
            self.highlight.node_color = color.clone();
        }
        if let Some(color) = &patch.heading_highlight_color {
            self.highlight.heading_color = color.clone();
        }
        if let Some(ms) = patch.highlight_duration_ms {
            self.highlight.duration_ms = ms;
        }

        diagram_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.diagram.initial_expand_level, 3);
        assert_eq!(config.sync.debounce(), Duration::from_millis(200));
        assert_eq!(config.navigation.viewport_margin, 100.0);
        assert_eq!(config.navigation.default_scale, 2.0);
        assert!(config.sync.realtime);
        assert!(!config.navigation.follow_scroll);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[sync]
debounce_ms = 350

[diagram]
initial_expand_level = 2
"#,
        )
        .unwrap();
        assert_eq!(config.sync.debounce_ms, 350);
        assert!(config.sync.realtime);
        assert_eq!(config.diagram.initial_expand_level, 2);
        assert_eq!(config.diagram.zoom_step, 0.2);
        assert_eq!(config.highlight.duration_ms, 1500);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.navigation.follow_scroll = true;
        config.diagram.initial_expand_level = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.navigation.follow_scroll);
        assert_eq!(loaded.diagram.initial_expand_level, 5);
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[sync\nrealtime = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_apply_patch() {
        let mut config = Config::default();
        let patch = OptionsPatch {
            initial_expand_level: Some(4),
            debounce_ms: Some(50),
            follow_scroll: Some(true),
            ..Default::default()
        };
        assert!(config.apply(&patch));
        assert_eq!(config.diagram.initial_expand_level, 4);
        assert_eq!(config.sync.debounce_ms, 50);
        assert!(config.navigation.follow_scroll);

        // Same value again is not a diagram change
        assert!(!config.apply(&patch));
    }

    #[test]
    fn test_apply_ignores_out_of_range() {
        let mut config = Config::default();
        let patch = OptionsPatch {
            initial_expand_level: Some(9),
            zoom_step: Some(3.0),
            ..Default::default()
        };
        assert!(!config.apply(&patch));
        assert_eq!(config.diagram.initial_expand_level, 3);
        assert_eq!(config.diagram.zoom_step, 0.2);
    }
}
