// ── Discrete action vocabulary ──
//
// Maps a user action on an entity to the hub service that performs it
// and the status the entity is expected to reach.

use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;
use crate::hub::ServiceCall;
use crate::model::{Category, Entity, Feature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EntityAction {
    TurnOn,
    TurnOff,
    Toggle,
    Lock,
    Unlock,
    Open,
    Close,
    Stop,
    ArmHome,
    ArmAway,
    ArmNight,
    ArmVacation,
    ArmCustomBypass,
    Disarm,
    Trigger,
    Start,
    Pause,
    ReturnToBase,
    Locate,
    Run,
}

/// What a discrete action does: the command, and the optimistic status.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub call: ServiceCall,
    /// `None` for actions that do not imply a status (e.g. running a script).
    pub expected_status: Option<String>,
}

/// Plan `action` against `entity`, or reject it before anything is written.
pub fn plan(entity: &Entity, action: EntityAction) -> Result<ActionPlan, CoreError> {
    use EntityAction as A;

    let unsupported = || CoreError::UnsupportedAction {
        action: action.to_string(),
        entity_id: entity.entity_id.clone(),
        category: entity.category(),
    };
    let require = |feature: Feature| {
        if entity.features().permits(feature) {
            Ok(())
        } else {
            Err(unsupported())
        }
    };

    let category = entity.category().ok_or_else(unsupported)?;
    let (service, expected): (&str, Option<&str>) = match (category, action) {
        // ── on / off ─────────────────────────────────────────────────
        (Category::Light | Category::Switch | Category::Fan | Category::Automation, A::TurnOn) => {
            ("turn_on", Some("on"))
        }
        (
            Category::Light | Category::Switch | Category::Fan | Category::Automation,
            A::TurnOff,
        ) => ("turn_off", Some("off")),
        (Category::Light | Category::Switch | Category::Fan | Category::Automation, A::Toggle) => {
            let next = if entity.status == "on" { "off" } else { "on" };
            ("toggle", Some(next))
        }
        (Category::Camera, A::TurnOn) => {
            require(Feature::CameraOnOff)?;
            ("turn_on", None)
        }
        (Category::Camera, A::TurnOff) => {
            require(Feature::CameraOnOff)?;
            ("turn_off", None)
        }

        // ── lock ─────────────────────────────────────────────────────
        (Category::Lock, A::Lock) => ("lock", Some("locked")),
        (Category::Lock, A::Unlock) => ("unlock", Some("unlocked")),
        (Category::Lock, A::Open) => {
            require(Feature::LockOpen)?;
            ("open", Some("open"))
        }

        // ── cover / valve ────────────────────────────────────────────
        (Category::Cover, A::Open) => {
            require(Feature::CoverOpen)?;
            ("open_cover", Some("opening"))
        }
        (Category::Cover, A::Close) => {
            require(Feature::CoverClose)?;
            ("close_cover", Some("closing"))
        }
        (Category::Cover, A::Stop) => {
            require(Feature::CoverStop)?;
            ("stop_cover", None)
        }
        (Category::Valve, A::Open) => {
            require(Feature::ValveOpen)?;
            ("open_valve", Some("opening"))
        }
        (Category::Valve, A::Close) => {
            require(Feature::ValveClose)?;
            ("close_valve", Some("closing"))
        }
        (Category::Valve, A::Stop) => {
            require(Feature::ValveStop)?;
            ("stop_valve", None)
        }

        // ── alarm panel ──────────────────────────────────────────────
        (Category::AlarmControlPanel, A::ArmHome) => {
            require(Feature::AlarmArmHome)?;
            ("alarm_arm_home", Some("armed_home"))
        }
        (Category::AlarmControlPanel, A::ArmAway) => {
            require(Feature::AlarmArmAway)?;
            ("alarm_arm_away", Some("armed_away"))
        }
        (Category::AlarmControlPanel, A::ArmNight) => {
            require(Feature::AlarmArmNight)?;
            ("alarm_arm_night", Some("armed_night"))
        }
        (Category::AlarmControlPanel, A::ArmVacation) => {
            require(Feature::AlarmArmVacation)?;
            ("alarm_arm_vacation", Some("armed_vacation"))
        }
        (Category::AlarmControlPanel, A::ArmCustomBypass) => {
            require(Feature::AlarmArmCustomBypass)?;
            ("alarm_arm_custom_bypass", Some("armed_custom_bypass"))
        }
        (Category::AlarmControlPanel, A::Disarm) => ("alarm_disarm", Some("disarmed")),
        (Category::AlarmControlPanel, A::Trigger) => {
            require(Feature::AlarmTrigger)?;
            ("alarm_trigger", Some("triggered"))
        }

        // ── vacuum ───────────────────────────────────────────────────
        (Category::Vacuum, A::Start) => {
            require(Feature::VacuumStart)?;
            ("start", Some("cleaning"))
        }
        (Category::Vacuum, A::Pause) => {
            require(Feature::VacuumPause)?;
            ("pause", Some("paused"))
        }
        (Category::Vacuum, A::Stop) => {
            require(Feature::VacuumStop)?;
            ("stop", None)
        }
        (Category::Vacuum, A::ReturnToBase) => {
            require(Feature::VacuumReturnHome)?;
            ("return_to_base", Some("returning"))
        }
        (Category::Vacuum, A::Locate) => {
            require(Feature::VacuumLocate)?;
            ("locate", None)
        }

        // ── script / automation ──────────────────────────────────────
        (Category::Script, A::Run) => ("turn_on", None),
        (Category::Automation, A::Trigger) => ("trigger", None),

        _ => return Err(unsupported()),
    };

    Ok(ActionPlan {
        call: ServiceCall::for_entity(&entity.entity_id, service),
        expected_status: expected.map(str::to_owned),
    })
}
