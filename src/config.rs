//! Configuration - tunables and selectors with site defaults.
//!
//! Every field has a default, so an empty JSON object (or no configuration
//! at all) yields the stock behavior. The web host reads overrides from a
//! `data-pagesync` attribute on the document element.
//!
//! ```ignore
//! let config = Config::from_json(r#"{ "scroll": { "probe_offset": 80 } }"#)?;
//! assert_eq!(config.scroll.debounce_ms, 10);
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};

// =============================================================================
// DEFAULTS
// =============================================================================

/// Trailing-edge debounce window for scroll handling.
pub const DEFAULT_DEBOUNCE_MS: u64 = 10;

/// Forward look-ahead added to `scroll_y` when probing for the current section.
pub const DEFAULT_PROBE_OFFSET: f64 = 100.0;

/// Header switches to its scrolled look strictly past this `scroll_y`.
pub const DEFAULT_HEADER_THRESHOLD: f64 = 50.0;

/// Fraction of an element that must be visible before it is revealed.
pub const DEFAULT_REVEAL_THRESHOLD: f64 = 0.1;

/// Pixels trimmed from the bottom of the viewport for reveal checks.
pub const DEFAULT_REVEAL_BOTTOM_MARGIN: f64 = 50.0;

/// Delay between typed characters of the hero subtitle.
pub const DEFAULT_TYPING_INTERVAL_MS: u64 = 50;

// =============================================================================
// CONFIG
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scroll: ScrollConfig,
    pub reveal: RevealConfig,
    pub header: HeaderStyle,
    pub typing: TypingConfig,
    pub selectors: Selectors,
}

/// Scroll tracking tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    pub debounce_ms: u64,
    pub probe_offset: f64,
    pub header_threshold: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            probe_offset: DEFAULT_PROBE_OFFSET,
            header_threshold: DEFAULT_HEADER_THRESHOLD,
        }
    }
}

/// How visibility is detected for reveal-on-scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealStrategy {
    /// The host delivers intersection notifications.
    #[default]
    Observer,
    /// Intersection ratios are computed from live rects on every scroll tick.
    Poll,
}

/// Reveal-on-scroll tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    pub threshold: f64,
    pub bottom_margin: f64,
    pub strategy: RevealStrategy,
    /// Downward offset (px) of not-yet-revealed elements.
    pub hidden_offset: f64,
    pub transition: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REVEAL_THRESHOLD,
            bottom_margin: DEFAULT_REVEAL_BOTTOM_MARGIN,
            strategy: RevealStrategy::Observer,
            hidden_offset: 30.0,
            transition: "opacity 0.6s ease, transform 0.6s ease".to_string(),
        }
    }
}

/// Inline styles written to the header in each state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderStyle {
    pub scrolled_background: String,
    pub scrolled_shadow: String,
    pub resting_background: String,
    pub resting_shadow: String,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            scrolled_background: "rgba(255, 255, 255, 0.98)".to_string(),
            scrolled_shadow: "0 2px 20px rgba(0, 0, 0, 0.1)".to_string(),
            resting_background: "rgba(255, 255, 255, 0.95)".to_string(),
            resting_shadow: "none".to_string(),
        }
    }
}

/// Typewriter tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypingConfig {
    pub interval_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TYPING_INTERVAL_MS,
        }
    }
}

/// Selectors locating the page's collaborators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selectors {
    /// Fixed header whose height offsets anchor scrolling.
    pub header: String,
    pub nav_links: String,
    pub sections: String,
    /// In-page anchors handled by smooth scrolling.
    pub anchors: String,
    /// Elements revealed on scroll.
    pub animatable: String,
    pub menu_toggle: String,
    pub menu_panel: String,
    pub resume_toggle: String,
    pub resume_panel: String,
    pub subtitle: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            header: ".navbar".to_string(),
            nav_links: ".nav-link".to_string(),
            sections: "section[id]".to_string(),
            anchors: "a[href^=\"#\"]".to_string(),
            animatable: ".project-card, section".to_string(),
            menu_toggle: ".hamburger".to_string(),
            menu_panel: ".nav-menu".to_string(),
            resume_toggle: "#resume-toggle".to_string(),
            resume_panel: "#resume-content".to_string(),
            subtitle: ".hero-subtitle".to_string(),
        }
    }
}

impl Selectors {
    fn all(&self) -> [(&'static str, &str); 10] {
        [
            ("selectors.header", self.header.as_str()),
            ("selectors.nav_links", self.nav_links.as_str()),
            ("selectors.sections", self.sections.as_str()),
            ("selectors.anchors", self.anchors.as_str()),
            ("selectors.animatable", self.animatable.as_str()),
            ("selectors.menu_toggle", self.menu_toggle.as_str()),
            ("selectors.menu_panel", self.menu_panel.as_str()),
            ("selectors.resume_toggle", self.resume_toggle.as_str()),
            ("selectors.resume_panel", self.resume_panel.as_str()),
            ("selectors.subtitle", self.subtitle.as_str()),
        ]
    }
}

// =============================================================================
// LOADING & VALIDATION
// =============================================================================

impl Config {
    /// Parse a JSON object of overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed JSON or unknown fields and
    /// [`Error::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        finite("scroll.probe_offset", self.scroll.probe_offset)?;
        finite("scroll.header_threshold", self.scroll.header_threshold)?;

        let threshold = self.reveal.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(invalid(
                "reveal.threshold",
                format!("must be in (0, 1], got {threshold}"),
            ));
        }

        let margin = self.reveal.bottom_margin;
        finite("reveal.bottom_margin", margin)?;
        if margin < 0.0 {
            return Err(invalid(
                "reveal.bottom_margin",
                format!("must not be negative, got {margin}"),
            ));
        }
        finite("reveal.hidden_offset", self.reveal.hidden_offset)?;

        if self.typing.interval_ms == 0 {
            return Err(invalid("typing.interval_ms", "must be at least 1".to_string()));
        }

        for (field, selector) in self.selectors.all() {
            if selector.trim().is_empty() {
                return Err(invalid(field, "must not be empty".to_string()));
            }
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

fn invalid(field: &'static str, reason: String) -> Error {
    Error::InvalidConfig { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scroll.debounce_ms, 10);
        assert_eq!(config.scroll.probe_offset, 100.0);
        assert_eq!(config.reveal.bottom_margin, 50.0);
        assert_eq!(config.reveal.strategy, RevealStrategy::Observer);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config =
            Config::from_json(r#"{ "scroll": { "probe_offset": 80 }, "reveal": { "strategy": "poll" } }"#)
                .unwrap();
        assert_eq!(config.scroll.probe_offset, 80.0);
        assert_eq!(config.scroll.header_threshold, 50.0);
        assert_eq!(config.reveal.strategy, RevealStrategy::Poll);
        assert_eq!(config.reveal.threshold, 0.1);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_json(r#"{ "scroll": { "probe": 80 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = Config::from_json(r#"{ "reveal": { "threshold": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig { field: "reveal.threshold", .. }
        ));

        let err = Config::from_json(r#"{ "reveal": { "threshold": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_negative_margin_rejected() {
        let err = Config::from_json(r#"{ "reveal": { "bottom_margin": -5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig { field: "reveal.bottom_margin", .. }
        ));
    }

    #[test]
    fn test_empty_selector_rejected() {
        let mut config = Config::default();
        config.selectors.menu_panel = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig { field: "selectors.menu_panel", .. }
        ));
    }
}
