use serde::{Deserialize, Serialize};

use crate::core::{CountScaleMode, TimeScale};
use crate::error::{TimelineError, TimelineResult};
use crate::render::Color;

use super::Visibility;

/// Query and cache tuning for the fetch gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_limit")]
    pub limit: u32,
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    #[serde(default = "default_fallback_seed")]
    pub fallback_seed: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            limit: default_fetch_limit(),
            cache_ttl_ms: default_cache_ttl_ms(),
            cache_max_entries: default_cache_max_entries(),
            fallback_seed: default_fallback_seed(),
        }
    }
}

/// Year range coarse scales may pan within before resetting to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationBounds {
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default = "default_max_year")]
    pub max_year: i32,
}

impl Default for NavigationBounds {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

impl NavigationBounds {
    #[must_use]
    pub fn contains_year(self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VirtualListConfig {
    #[serde(default = "default_viewport_height_px")]
    pub viewport_height_px: f64,
    #[serde(default = "default_estimated_row_height_px")]
    pub estimated_row_height_px: f64,
    #[serde(default = "default_overscan")]
    pub overscan: usize,
}

impl Default for VirtualListConfig {
    fn default() -> Self {
        Self {
            viewport_height_px: default_viewport_height_px(),
            estimated_row_height_px: default_estimated_row_height_px(),
            overscan: default_overscan(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for ChartMargins {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 40.0,
            bottom: 60.0,
            left: 60.0,
        }
    }
}

/// Visual tuning for the bucket chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    #[serde(default)]
    pub margins: ChartMargins,
    #[serde(default = "default_min_point_radius_px")]
    pub min_point_radius_px: f64,
    #[serde(default = "default_max_point_radius_px")]
    pub max_point_radius_px: f64,
    #[serde(default)]
    pub count_scale_mode: CountScaleMode,
    #[serde(default = "default_point_color")]
    pub point_color: Color,
    #[serde(default = "default_starred_point_color")]
    pub starred_point_color: Color,
    #[serde(default = "default_point_outline_color")]
    pub point_outline_color: Color,
    #[serde(default = "default_axis_color")]
    pub axis_color: Color,
    #[serde(default = "default_label_color")]
    pub label_color: Color,
    #[serde(default = "default_today_color")]
    pub today_color: Color,
    #[serde(default = "default_label_font_size_px")]
    pub label_font_size_px: f64,
    #[serde(default = "default_y_tick_count")]
    pub y_tick_count: usize,
    #[serde(default = "default_show_today")]
    pub show_today: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            margins: ChartMargins::default(),
            min_point_radius_px: default_min_point_radius_px(),
            max_point_radius_px: default_max_point_radius_px(),
            count_scale_mode: CountScaleMode::default(),
            point_color: default_point_color(),
            starred_point_color: default_starred_point_color(),
            point_outline_color: default_point_outline_color(),
            axis_color: default_axis_color(),
            label_color: default_label_color(),
            today_color: default_today_color(),
            label_font_size_px: default_label_font_size_px(),
            y_tick_count: default_y_tick_count(),
            show_today: default_show_today(),
        }
    }
}

/// Top-level timeline configuration.
///
/// Serializable so host applications can persist and load setup without
/// inventing their own format. Every field has a default, so partial JSON
/// documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default)]
    pub default_scale: TimeScale,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub navigation: NavigationBounds,
    #[serde(default)]
    pub virtual_list: VirtualListConfig,
    #[serde(default)]
    pub chart: ChartStyle,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_scale: TimeScale::Day,
            fetch: FetchConfig::default(),
            navigation: NavigationBounds::default(),
            virtual_list: VirtualListConfig::default(),
            chart: ChartStyle::default(),
            visibility: Visibility::default(),
        }
    }
}

impl TimelineConfig {
    #[must_use]
    pub fn with_default_scale(mut self, scale: TimeScale) -> Self {
        self.default_scale = scale;
        self
    }

    #[must_use]
    pub fn with_fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    #[must_use]
    pub fn with_navigation_bounds(mut self, navigation: NavigationBounds) -> Self {
        self.navigation = navigation;
        self
    }

    #[must_use]
    pub fn with_virtual_list_config(mut self, virtual_list: VirtualListConfig) -> Self {
        self.virtual_list = virtual_list;
        self
    }

    #[must_use]
    pub fn with_chart_style(mut self, chart: ChartStyle) -> Self {
        self.chart = chart;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn validate(&self) -> TimelineResult<()> {
        validate_fetch_config(self.fetch)?;
        validate_navigation_bounds(self.navigation)?;
        validate_virtual_list_config(self.virtual_list)?;
        validate_chart_style(&self.chart)
    }

    pub fn from_json_str(input: &str) -> TimelineResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            TimelineError::InvalidData(format!("failed to parse timeline config json: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> TimelineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            TimelineError::InvalidData(format!("failed to serialize timeline config: {e}"))
        })
    }
}

pub(crate) fn validate_fetch_config(fetch: FetchConfig) -> TimelineResult<()> {
    if fetch.limit == 0 {
        return Err(TimelineError::InvalidData(
            "fetch limit must be > 0".to_owned(),
        ));
    }
    if fetch.cache_max_entries == 0 {
        return Err(TimelineError::InvalidData(
            "cache max entries must be > 0".to_owned(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_navigation_bounds(bounds: NavigationBounds) -> TimelineResult<()> {
    if bounds.min_year > bounds.max_year {
        return Err(TimelineError::InvalidData(format!(
            "navigation min year {} must be <= max year {}",
            bounds.min_year, bounds.max_year
        )));
    }
    Ok(())
}

pub(crate) fn validate_virtual_list_config(config: VirtualListConfig) -> TimelineResult<()> {
    if !config.viewport_height_px.is_finite() || config.viewport_height_px < 0.0 {
        return Err(TimelineError::InvalidData(
            "viewport height must be finite and >= 0".to_owned(),
        ));
    }
    if !config.estimated_row_height_px.is_finite() || config.estimated_row_height_px <= 0.0 {
        return Err(TimelineError::InvalidData(
            "estimated row height must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_chart_style(style: &ChartStyle) -> TimelineResult<()> {
    let margins = style.margins;
    for (name, value) in [
        ("top", margins.top),
        ("right", margins.right),
        ("bottom", margins.bottom),
        ("left", margins.left),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(TimelineError::InvalidData(format!(
                "chart margin `{name}` must be finite and >= 0"
            )));
        }
    }
    if !style.min_point_radius_px.is_finite()
        || !style.max_point_radius_px.is_finite()
        || style.min_point_radius_px <= 0.0
        || style.min_point_radius_px > style.max_point_radius_px
    {
        return Err(TimelineError::InvalidData(
            "point radius range must be finite with 0 < min <= max".to_owned(),
        ));
    }
    if !style.label_font_size_px.is_finite() || style.label_font_size_px <= 0.0 {
        return Err(TimelineError::InvalidData(
            "label font size must be finite and > 0".to_owned(),
        ));
    }
    for color in [
        style.point_color,
        style.starred_point_color,
        style.point_outline_color,
        style.axis_color,
        style.label_color,
        style.today_color,
    ] {
        color.validate()?;
    }
    Ok(())
}

fn default_fetch_limit() -> u32 {
    2_000
}

fn default_cache_ttl_ms() -> u64 {
    30_000
}

fn default_cache_max_entries() -> usize {
    256
}

fn default_fallback_seed() -> u64 {
    0x5EED_7111
}

fn default_min_year() -> i32 {
    1900
}

fn default_max_year() -> i32 {
    2100
}

fn default_viewport_height_px() -> f64 {
    600.0
}

fn default_estimated_row_height_px() -> f64 {
    96.0
}

fn default_overscan() -> usize {
    3
}

fn default_min_point_radius_px() -> f64 {
    4.0
}

fn default_max_point_radius_px() -> f64 {
    12.0
}

fn default_point_color() -> Color {
    Color::rgb(0.545, 0.361, 0.965)
}

fn default_starred_point_color() -> Color {
    Color::rgb(0.984, 0.749, 0.141)
}

fn default_point_outline_color() -> Color {
    Color::rgb(0.118, 0.161, 0.231)
}

fn default_axis_color() -> Color {
    Color::rgba(0.2, 0.255, 0.333, 0.6)
}

fn default_label_color() -> Color {
    Color::rgb(0.58, 0.639, 0.722)
}

fn default_today_color() -> Color {
    Color::rgb(0.937, 0.267, 0.267)
}

fn default_label_font_size_px() -> f64 {
    12.0
}

fn default_y_tick_count() -> usize {
    5
}

fn default_show_today() -> bool {
    true
}
