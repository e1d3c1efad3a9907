/// Tunable sight parameters.
///
/// Fixed for the lifetime of a [`SightManager`](crate::SightManager) unless
/// replaced through `set_config`, which re-validates and forces a full
/// recompute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SightConfig {
    /// Radius (tiles) within which cells are marked visible and explored.
    pub base_sight_range: f32,
    /// Beyond this distance nothing is ever detected.
    pub max_sight_range: f32,
    /// Distance where the detection chance starts to fall off linearly.
    pub degradation_start: f32,
    /// Obstructions at or above this height block sight completely.
    pub height_threshold: f32,
    /// Obstruction used for a partial blocker whose cell reports none.
    pub partial_obstruction_factor: f32,
    /// Width (degrees) of the central cone; outside it the peripheral penalty applies.
    pub peripheral_angle: f32,
    pub peripheral_penalty: f32,
    pub darkness_penalty: f32,
    /// Light level below which the darkness penalty applies.
    pub darkness_threshold: f32,
    pub movement_bonus: f32,
    /// Highest ambient-occlusion level; levels run `0..=ambient_occlusion_levels`.
    pub ambient_occlusion_levels: u8,
    /// Miss chance per occlusion level, indexed by level (length `levels + 1`).
    pub ambient_occlusion_miss_chance: Vec<f32>,
    pub corner_peek_enabled: bool,
    /// Obstruction factor applied instead of a hard block when peeking a corner.
    pub corner_peek_dampening: f32,
    /// Width (degrees) of the directional field of view.
    pub field_of_view_angle: f32,
    pub directional_vision_enabled: bool,
    /// Walls farther than this from the observer cast no shadow.
    pub shadow_cast_radius: i32,
    pub shadow_max_length: i32,
    pub shadow_min_length: i32,
    /// How far the corner probes reach around each wall.
    pub corner_spread: i32,
    /// Radius of the post-cast clean-up pass.
    pub cleanup_radius: i32,
    /// Turns a cached detection stays valid; 0 means the same turn only.
    pub cache_lifetime: u64,
}

impl SightConfig {
    pub const DEFAULT_BASE_SIGHT_RANGE: f32 = 10.0;
    pub const DEFAULT_MAX_SIGHT_RANGE: f32 = 15.0;
    pub const DEFAULT_DEGRADATION_START: f32 = 8.0;
    pub const DEFAULT_HEIGHT_THRESHOLD: f32 = 1.5;
    pub const DEFAULT_PARTIAL_OBSTRUCTION_FACTOR: f32 = 0.5;
    pub const DEFAULT_PERIPHERAL_ANGLE: f32 = 120.0;
    pub const DEFAULT_PERIPHERAL_PENALTY: f32 = 0.5;
    pub const DEFAULT_DARKNESS_PENALTY: f32 = 0.3;
    pub const DEFAULT_DARKNESS_THRESHOLD: f32 = 0.7;
    pub const DEFAULT_MOVEMENT_BONUS: f32 = 0.2;
    pub const DEFAULT_AMBIENT_OCCLUSION_LEVELS: u8 = 3;
    pub const DEFAULT_AMBIENT_OCCLUSION_MISS_CHANCE: [f32; 4] = [0.0, 0.2, 0.45, 0.75];
    pub const DEFAULT_CORNER_PEEK_DAMPENING: f32 = 0.8;
    pub const DEFAULT_FIELD_OF_VIEW_ANGLE: f32 = 180.0;
    pub const DEFAULT_SHADOW_CAST_RADIUS: i32 = 12;
    pub const DEFAULT_SHADOW_MAX_LENGTH: i32 = 6;
    pub const DEFAULT_SHADOW_MIN_LENGTH: i32 = 2;
    pub const DEFAULT_CORNER_SPREAD: i32 = 2;
    pub const DEFAULT_CLEANUP_RADIUS: i32 = 3;
    pub const DEFAULT_CACHE_LIFETIME: u64 = 0;

    pub fn new() -> Self {
        Self {
            base_sight_range: Self::DEFAULT_BASE_SIGHT_RANGE,
            max_sight_range: Self::DEFAULT_MAX_SIGHT_RANGE,
            degradation_start: Self::DEFAULT_DEGRADATION_START,
            height_threshold: Self::DEFAULT_HEIGHT_THRESHOLD,
            partial_obstruction_factor: Self::DEFAULT_PARTIAL_OBSTRUCTION_FACTOR,
            peripheral_angle: Self::DEFAULT_PERIPHERAL_ANGLE,
            peripheral_penalty: Self::DEFAULT_PERIPHERAL_PENALTY,
            darkness_penalty: Self::DEFAULT_DARKNESS_PENALTY,
            darkness_threshold: Self::DEFAULT_DARKNESS_THRESHOLD,
            movement_bonus: Self::DEFAULT_MOVEMENT_BONUS,
            ambient_occlusion_levels: Self::DEFAULT_AMBIENT_OCCLUSION_LEVELS,
            ambient_occlusion_miss_chance: Self::DEFAULT_AMBIENT_OCCLUSION_MISS_CHANCE.to_vec(),
            corner_peek_enabled: true,
            corner_peek_dampening: Self::DEFAULT_CORNER_PEEK_DAMPENING,
            field_of_view_angle: Self::DEFAULT_FIELD_OF_VIEW_ANGLE,
            directional_vision_enabled: true,
            shadow_cast_radius: Self::DEFAULT_SHADOW_CAST_RADIUS,
            shadow_max_length: Self::DEFAULT_SHADOW_MAX_LENGTH,
            shadow_min_length: Self::DEFAULT_SHADOW_MIN_LENGTH,
            corner_spread: Self::DEFAULT_CORNER_SPREAD,
            cleanup_radius: Self::DEFAULT_CLEANUP_RADIUS,
            cache_lifetime: Self::DEFAULT_CACHE_LIFETIME,
        }
    }

    #[must_use]
    pub fn with_ranges(mut self, degradation_start: f32, max_sight_range: f32) -> Self {
        self.degradation_start = degradation_start;
        self.max_sight_range = max_sight_range;
        self
    }

    #[must_use]
    pub fn with_directional_vision(mut self, enabled: bool) -> Self {
        self.directional_vision_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_corner_peek(mut self, enabled: bool) -> Self {
        self.corner_peek_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_field_of_view(mut self, angle: f32) -> Self {
        self.field_of_view_angle = angle;
        self
    }

    #[must_use]
    pub fn with_occlusion_levels(mut self, miss_chance: Vec<f32>) -> Self {
        self.ambient_occlusion_levels = miss_chance.len().saturating_sub(1) as u8;
        self.ambient_occlusion_miss_chance = miss_chance;
        self
    }

    #[must_use]
    pub fn with_cache_lifetime(mut self, turns: u64) -> Self {
        self.cache_lifetime = turns;
        self
    }

    /// Highest ambient-occlusion level a cell can hold.
    pub fn max_occlusion(&self) -> u8 {
        self.ambient_occlusion_levels
    }

    /// Miss chance for a cell at `level`, saturating at the top level.
    pub fn miss_chance(&self, level: u8) -> f32 {
        let index = usize::from(level.min(self.ambient_occlusion_levels));
        self.ambient_occlusion_miss_chance
            .get(index)
            .copied()
            .unwrap_or(0.0)
    }

    /// Rejects configurations that would misbehave at lookup time.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("partial_obstruction_factor", self.partial_obstruction_factor),
            ("peripheral_penalty", self.peripheral_penalty),
            ("darkness_penalty", self.darkness_penalty),
            ("darkness_threshold", self.darkness_threshold),
            ("movement_bonus", self.movement_bonus),
            ("corner_peek_dampening", self.corner_peek_dampening),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }

        let positive_fields = [
            ("base_sight_range", self.base_sight_range),
            ("max_sight_range", self.max_sight_range),
            ("height_threshold", self.height_threshold),
        ];
        for (field, value) in positive_fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if !(self.degradation_start.is_finite() && self.degradation_start >= 0.0)
            || self.degradation_start > self.max_sight_range
        {
            return Err(ConfigError::DegradationBeyondRange {
                start: self.degradation_start,
                max: self.max_sight_range,
            });
        }

        let angle_fields = [
            ("peripheral_angle", self.peripheral_angle),
            ("field_of_view_angle", self.field_of_view_angle),
        ];
        for (field, value) in angle_fields {
            if !(value > 0.0 && value <= 360.0) {
                return Err(ConfigError::InvalidAngle { field, value });
            }
        }

        if self.ambient_occlusion_levels == 0 {
            return Err(ConfigError::NoOcclusionLevels);
        }
        let expected = usize::from(self.ambient_occlusion_levels) + 1;
        if self.ambient_occlusion_miss_chance.len() != expected {
            return Err(ConfigError::MissChanceLength {
                levels: self.ambient_occlusion_levels,
                expected,
                actual: self.ambient_occlusion_miss_chance.len(),
            });
        }
        for (level, value) in self.ambient_occlusion_miss_chance.iter().copied().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::MissChanceOutOfRange { level, value });
            }
        }

        let radius_fields = [
            ("shadow_cast_radius", self.shadow_cast_radius),
            ("shadow_min_length", self.shadow_min_length),
            ("corner_spread", self.corner_spread),
            ("cleanup_radius", self.cleanup_radius),
        ];
        for (field, value) in radius_fields {
            if value < 0 {
                return Err(ConfigError::NegativeRadius { field, value });
            }
        }
        if self.shadow_min_length < 1 || self.shadow_max_length < self.shadow_min_length {
            return Err(ConfigError::ShadowLengthInverted {
                min: self.shadow_min_length,
                max: self.shadow_max_length,
            });
        }

        Ok(())
    }
}

impl Default for SightConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Malformed [`SightConfig`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("degradation_start {start} must lie within [0, max_sight_range = {max}]")]
    DegradationBeyondRange { start: f32, max: f32 },

    #[error("{field} must be within (0, 360] degrees, got {value}")]
    InvalidAngle { field: &'static str, value: f32 },

    #[error("ambient_occlusion_levels must be at least 1")]
    NoOcclusionLevels,

    #[error(
        "ambient_occlusion_miss_chance has {actual} entries but {levels} levels need {expected}"
    )]
    MissChanceLength {
        levels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("miss chance for occlusion level {level} must be within [0, 1], got {value}")]
    MissChanceOutOfRange { level: usize, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    NegativeRadius { field: &'static str, value: i32 },

    #[error("shadow length bounds are inverted (min {min}, max {max})")]
    ShadowLengthInverted { min: i32, max: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SightConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_occlusion(), 3);
        assert_eq!(config.miss_chance(0), 0.0);
        assert_eq!(config.miss_chance(3), 0.75);
        // Saturates rather than indexing past the table.
        assert_eq!(config.miss_chance(200), 0.75);
    }

    #[test]
    fn rejects_miss_chance_table_of_wrong_length() {
        let mut config = SightConfig::default();
        config.ambient_occlusion_levels = 4;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissChanceLength {
                levels: 4,
                expected: 5,
                actual: 4,
            })
        );

        let config = SightConfig::default().with_occlusion_levels(vec![0.0, 0.5]);
        assert_eq!(config.ambient_occlusion_levels, 1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = SightConfig::default();
        config.peripheral_penalty = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                field: "peripheral_penalty",
                ..
            })
        ));

        let config = SightConfig::default().with_ranges(20.0, 15.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DegradationBeyondRange { .. })
        ));

        let mut config = SightConfig::default();
        config.max_sight_range = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));

        let config = SightConfig::default().with_field_of_view(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAngle { .. })
        ));

        let mut config = SightConfig::default();
        config.shadow_min_length = 5;
        config.shadow_max_length = 3;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ShadowLengthInverted { min: 5, max: 3 })
        );

        let config = SightConfig::default().with_occlusion_levels(vec![0.0, 1.2]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissChanceOutOfRange {
                level: 1,
                value: 1.2
            })
        );
    }
}
