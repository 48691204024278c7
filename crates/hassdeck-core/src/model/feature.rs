// ── Capability flags ──
//
// The hub advertises optional capabilities as a `supported_features`
// bitmask whose bit values differ per category. Everything above the
// deserialization boundary asks named questions instead.

use strum::{Display, EnumIter, IntoEnumIterator};

use super::Category;

/// A named capability of one entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    // Light
    LightEffect,
    LightFlash,
    LightTransition,

    // Cover
    CoverOpen,
    CoverClose,
    CoverSetPosition,
    CoverStop,
    CoverOpenTilt,
    CoverCloseTilt,
    CoverStopTilt,
    CoverSetTiltPosition,

    // Climate
    ClimateTargetTemperature,
    ClimateTargetTemperatureRange,
    ClimateTargetHumidity,
    ClimateFanMode,
    ClimatePresetMode,
    ClimateSwingMode,
    ClimateTurnOff,
    ClimateTurnOn,

    // Fan
    FanSetSpeed,
    FanOscillate,
    FanDirection,
    FanPresetMode,
    FanTurnOff,
    FanTurnOn,

    // Lock
    LockOpen,

    // Valve
    ValveOpen,
    ValveClose,
    ValveSetPosition,
    ValveStop,

    // Vacuum
    VacuumTurnOn,
    VacuumTurnOff,
    VacuumPause,
    VacuumStop,
    VacuumReturnHome,
    VacuumFanSpeed,
    VacuumBattery,
    VacuumStatus,
    VacuumSendCommand,
    VacuumLocate,
    VacuumCleanSpot,
    VacuumMap,
    VacuumState,
    VacuumStart,

    // Alarm control panel
    AlarmArmHome,
    AlarmArmAway,
    AlarmArmNight,
    AlarmTrigger,
    AlarmArmCustomBypass,
    AlarmArmVacation,

    // Camera
    CameraOnOff,
    CameraStream,
}

impl Feature {
    /// The category whose bitmask carries this flag.
    pub fn category(self) -> Category {
        match self {
            Self::LightEffect | Self::LightFlash | Self::LightTransition => Category::Light,
            Self::CoverOpen
            | Self::CoverClose
            | Self::CoverSetPosition
            | Self::CoverStop
            | Self::CoverOpenTilt
            | Self::CoverCloseTilt
            | Self::CoverStopTilt
            | Self::CoverSetTiltPosition => Category::Cover,
            Self::ClimateTargetTemperature
            | Self::ClimateTargetTemperatureRange
            | Self::ClimateTargetHumidity
            | Self::ClimateFanMode
            | Self::ClimatePresetMode
            | Self::ClimateSwingMode
            | Self::ClimateTurnOff
            | Self::ClimateTurnOn => Category::Climate,
            Self::FanSetSpeed
            | Self::FanOscillate
            | Self::FanDirection
            | Self::FanPresetMode
            | Self::FanTurnOff
            | Self::FanTurnOn => Category::Fan,
            Self::LockOpen => Category::Lock,
            Self::ValveOpen | Self::ValveClose | Self::ValveSetPosition | Self::ValveStop => {
                Category::Valve
            }
            Self::VacuumTurnOn
            | Self::VacuumTurnOff
            | Self::VacuumPause
            | Self::VacuumStop
            | Self::VacuumReturnHome
            | Self::VacuumFanSpeed
            | Self::VacuumBattery
            | Self::VacuumStatus
            | Self::VacuumSendCommand
            | Self::VacuumLocate
            | Self::VacuumCleanSpot
            | Self::VacuumMap
            | Self::VacuumState
            | Self::VacuumStart => Category::Vacuum,
            Self::AlarmArmHome
            | Self::AlarmArmAway
            | Self::AlarmArmNight
            | Self::AlarmTrigger
            | Self::AlarmArmCustomBypass
            | Self::AlarmArmVacation => Category::AlarmControlPanel,
            Self::CameraOnOff | Self::CameraStream => Category::Camera,
        }
    }

    /// Wire bit value within the category's bitmask.
    #[allow(clippy::match_same_arms)]
    pub fn bit(self) -> u32 {
        match self {
            Self::LightEffect => 4,
            Self::LightFlash => 8,
            Self::LightTransition => 32,

            Self::CoverOpen => 1,
            Self::CoverClose => 2,
            Self::CoverSetPosition => 4,
            Self::CoverStop => 8,
            Self::CoverOpenTilt => 16,
            Self::CoverCloseTilt => 32,
            Self::CoverStopTilt => 64,
            Self::CoverSetTiltPosition => 128,

            Self::ClimateTargetTemperature => 1,
            Self::ClimateTargetTemperatureRange => 2,
            Self::ClimateTargetHumidity => 4,
            Self::ClimateFanMode => 8,
            Self::ClimatePresetMode => 16,
            Self::ClimateSwingMode => 32,
            Self::ClimateTurnOff => 128,
            Self::ClimateTurnOn => 256,

            Self::FanSetSpeed => 1,
            Self::FanOscillate => 2,
            Self::FanDirection => 4,
            Self::FanPresetMode => 8,
            Self::FanTurnOff => 16,
            Self::FanTurnOn => 32,

            Self::LockOpen => 1,

            Self::ValveOpen => 1,
            Self::ValveClose => 2,
            Self::ValveSetPosition => 4,
            Self::ValveStop => 8,

            Self::VacuumTurnOn => 1,
            Self::VacuumTurnOff => 2,
            Self::VacuumPause => 4,
            Self::VacuumStop => 8,
            Self::VacuumReturnHome => 16,
            Self::VacuumFanSpeed => 32,
            Self::VacuumBattery => 64,
            Self::VacuumStatus => 128,
            Self::VacuumSendCommand => 256,
            Self::VacuumLocate => 512,
            Self::VacuumCleanSpot => 1024,
            Self::VacuumMap => 2048,
            Self::VacuumState => 4096,
            Self::VacuumStart => 8192,

            Self::AlarmArmHome => 1,
            Self::AlarmArmAway => 2,
            Self::AlarmArmNight => 4,
            Self::AlarmTrigger => 8,
            Self::AlarmArmCustomBypass => 16,
            Self::AlarmArmVacation => 32,

            Self::CameraOnOff => 1,
            Self::CameraStream => 2,
        }
    }
}

// ── FeatureSet ──────────────────────────────────────────────────────

/// The decoded capabilities of one entity.
///
/// `known` is false when the hub did not report a bitmask at all, which
/// is different from reporting zero capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    category: Option<Category>,
    bits: u32,
    known: bool,
}

impl FeatureSet {
    pub fn new(category: Option<Category>, bits: Option<u32>) -> Self {
        Self {
            category,
            bits: bits.unwrap_or(0),
            known: bits.is_some(),
        }
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.category == Some(feature.category()) && self.bits & feature.bit() != 0
    }

    /// Like [`supports`](Self::supports), but an unreported bitmask allows everything.
    pub fn permits(&self, feature: Feature) -> bool {
        !self.known || self.supports(feature)
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    /// Every named capability present in the bitmask.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::iter().filter(move |f| self.supports(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_bits_decode() {
        // open | close | set_position | stop
        let features = FeatureSet::new(Some(Category::Cover), Some(15));
        assert!(features.supports(Feature::CoverSetPosition));
        assert!(features.supports(Feature::CoverStop));
        assert!(!features.supports(Feature::CoverSetTiltPosition));
    }

    #[test]
    fn same_bit_in_other_category_does_not_leak() {
        let features = FeatureSet::new(Some(Category::Lock), Some(1));
        assert!(features.supports(Feature::LockOpen));
        assert!(!features.supports(Feature::CoverOpen));
        assert!(!features.supports(Feature::AlarmArmHome));
    }

    #[test]
    fn unreported_mask_permits_but_does_not_support() {
        let features = FeatureSet::new(Some(Category::AlarmControlPanel), None);
        assert!(!features.supports(Feature::AlarmArmAway));
        assert!(features.permits(Feature::AlarmArmAway));

        let zero = FeatureSet::new(Some(Category::AlarmControlPanel), Some(0));
        assert!(!zero.permits(Feature::AlarmArmAway));
    }

    #[test]
    fn iter_lists_alarm_modes() {
        let features = FeatureSet::new(Some(Category::AlarmControlPanel), Some(1 | 2 | 32));
        let names: Vec<String> = features.iter().map(|f| f.to_string()).collect();
        assert_eq!(names, ["alarm_arm_home", "alarm_arm_away", "alarm_arm_vacation"]);
    }

    #[test]
    fn bits_are_single_flags() {
        for feature in Feature::iter() {
            assert_eq!(feature.bit().count_ones(), 1, "{feature}");
        }
    }
}
