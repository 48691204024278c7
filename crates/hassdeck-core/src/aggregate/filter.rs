// ── Noise filter ──
//
// Secondary filter for read-only entities: registry diagnostic/config
// entities and user `*`-wildcard patterns.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::model::{Entity, Registry, Settings};

#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    patterns: Vec<Regex>,
    registry_categories: bool,
}

impl NoiseFilter {
    /// Filter nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| !p.trim().is_empty())
            .filter_map(|p| match wildcard(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = p, error = %e, "skipping filter pattern");
                    None
                }
            })
            .collect();
        Self {
            patterns,
            registry_categories: true,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.filter_patterns)
    }

    /// `true` if the entity is a sensor that should not be shown by default.
    pub fn is_noise(&self, entity: &Entity, registry: &Registry) -> bool {
        if !entity.category().is_some_and(|c| c.is_sensor_like()) {
            return false;
        }
        if self.registry_categories && registry.entity_category(&entity.entity_id).is_some() {
            return true;
        }
        let id = entity.entity_id.as_str();
        self.patterns.iter().any(|re| re.is_match(id))
    }
}

/// Compile a `*`-wildcard pattern into an anchored, case-insensitive regex.
fn wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .trim()
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityCategory, EntityId, EntityLink};

    #[test]
    fn wildcard_matches_suffix() {
        let filter = NoiseFilter::new(&["*_linkquality"]);
        let reg = Registry::default();
        assert!(filter.is_noise(&Entity::new("sensor.plug_linkquality", "80"), &reg));
        assert!(!filter.is_noise(&Entity::new("sensor.plug_power", "80"), &reg));
    }

    #[test]
    fn dots_are_literal() {
        let filter = NoiseFilter::new(&["sensor.a*"]);
        let reg = Registry::default();
        assert!(filter.is_noise(&Entity::new("sensor.abc", "1"), &reg));
        assert!(!filter.is_noise(&Entity::new("sensorXabc", "1"), &reg));
    }

    #[test]
    fn controls_are_never_noise() {
        let filter = NoiseFilter::new(&["*"]);
        let reg = Registry::default();
        assert!(!filter.is_noise(&Entity::new("light.kitchen", "on"), &reg));
        assert!(filter.is_noise(&Entity::new("binary_sensor.door", "off"), &reg));
    }

    #[test]
    fn diagnostic_sensors_are_noise() {
        let reg = Registry::new(
            [],
            [],
            [(
                EntityId::from("sensor.plug_rssi"),
                EntityLink {
                    entity_category: Some(EntityCategory::Diagnostic),
                    ..EntityLink::default()
                },
            )],
        );
        let filter = NoiseFilter::new::<&str>(&[]);
        assert!(filter.is_noise(&Entity::new("sensor.plug_rssi", "-60"), &reg));
        assert!(!NoiseFilter::none().is_noise(&Entity::new("sensor.plug_rssi", "-60"), &reg));
    }
}
