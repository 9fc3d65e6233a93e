//! Typed views over the raw vdata entries.
//!
//! Entries arrive as loosely typed JSON values. Each record type reads the
//! handful of fields the randomizer cares about once, here, so that the rest
//! of the crate never does dynamic field lookups. A field that is missing or
//! has an unexpected type reads as absent.

use serde::Serialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

/// `_base` value every playable hero derives from.
pub const HERO_BASE: &str = "hero_base";

/// Number of signature ability slots per hero.
pub const SIGNATURE_SLOT_COUNT: usize = 4;

const ABILITY_TYPE_KEY: &str = "m_eAbilityType";
const WEAPON_INFO_KEY: &str = "m_WeaponInfo";
const BULLETS_KEY: &str = "m_iBullets";
const BURST_SHOT_COUNT_KEY: &str = "m_iBurstShotCount";
const DISABLED_KEY: &str = "m_bDisabled";
const NEEDS_TESTING_KEY: &str = "m_bNeedsTesting";
const BASE_KEY: &str = "_base";

/// Key of the hero map that binds slots to ability identifiers.
pub const BOUND_ABILITIES_KEY: &str = "m_mapBoundAbilities";

/// One of the four signature ability slots (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SignatureSlot(u8);

impl SignatureSlot {
    pub const ALL: [SignatureSlot; SIGNATURE_SLOT_COUNT] = [
        SignatureSlot(1),
        SignatureSlot(2),
        SignatureSlot(3),
        SignatureSlot(4),
    ];

    pub fn new(number: u8) -> Option<Self> {
        (1..=SIGNATURE_SLOT_COUNT as u8)
            .contains(&number)
            .then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based row index in a slot table.
    pub fn row(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Key used in `m_mapBoundAbilities`, e.g. `ESlot_Signature_1`.
    pub fn key(self) -> String {
        format!("ESlot_Signature_{}", self.0)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        key.strip_prefix("ESlot_Signature_")?
            .parse()
            .ok()
            .and_then(Self::new)
    }
}

impl fmt::Display for SignatureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signature slot {}", self.0)
    }
}

/// Ability category tag (`m_eAbilityType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AbilityType {
    Weapon,
    Signature,
    Item,
    Other,
}

impl AbilityType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "EAbilityType_Weapon" => AbilityType::Weapon,
            "EAbilityType_Signature" => AbilityType::Signature,
            "EAbilityType_Item" => AbilityType::Item,
            _ => AbilityType::Other,
        }
    }
}

/// Fire pattern of a weapon ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeaponFire {
    pub bullets_per_shot: i64,
    pub burst_shot_count: i64,
}

impl WeaponFire {
    fn from_entry(entry: &Json) -> Option<Self> {
        let info = entry.get(WEAPON_INFO_KEY)?;
        Some(Self {
            bullets_per_shot: info.get(BULLETS_KEY)?.as_i64()?,
            burst_shot_count: info.get(BURST_SHOT_COUNT_KEY)?.as_i64()?,
        })
    }

    /// A single bullet per shot fired in bursts of more than one shot.
    pub fn is_burst(&self) -> bool {
        self.bullets_per_shot == 1 && self.burst_shot_count > 1
    }
}

/// Derived view of one entry of `abilities.vdata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbilityRecord {
    pub id: String,
    pub ability_type: AbilityType,
    pub weapon_fire: Option<WeaponFire>,
}

impl AbilityRecord {
    pub fn from_entry(id: &str, entry: &Json) -> Self {
        let ability_type = entry
            .get(ABILITY_TYPE_KEY)
            .and_then(Json::as_str)
            .map(AbilityType::from_tag)
            .unwrap_or(AbilityType::Other);

        let weapon_fire = match ability_type {
            AbilityType::Weapon => WeaponFire::from_entry(entry),
            _ => None,
        };

        Self {
            id: id.to_string(),
            ability_type,
            weapon_fire,
        }
    }
}

/// Derived view of one entry of `heroes.vdata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroRecord {
    pub id: String,
    pub disabled: bool,
    pub needs_testing: bool,
    pub base: Option<String>,
    pub slot_abilities: BTreeMap<SignatureSlot, String>,
}

impl HeroRecord {
    /// Read a hero entry. Returns `None` for entries that are not objects
    /// (e.g. the `_include` directive or scalar settings).
    pub fn from_entry(id: &str, entry: &Json) -> Option<Self> {
        let fields = entry.as_object()?;

        let slot_abilities = fields
            .get(BOUND_ABILITIES_KEY)
            .and_then(Json::as_object)
            .map(|bound| {
                bound
                    .iter()
                    .filter_map(|(key, ability)| {
                        Some((SignatureSlot::from_key(key)?, ability.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id: id.to_string(),
            disabled: fields.get(DISABLED_KEY).is_some_and(is_truthy),
            needs_testing: fields.get(NEEDS_TESTING_KEY).is_some_and(is_truthy),
            base: fields
                .get(BASE_KEY)
                .and_then(Json::as_str)
                .map(str::to_string),
            slot_abilities,
        })
    }

    /// Released, tested, and built on the standard hero template.
    pub fn is_eligible(&self) -> bool {
        !self.disabled && !self.needs_testing && self.base.as_deref() == Some(HERO_BASE)
    }

    pub fn slot_ability(&self, slot: SignatureSlot) -> Option<&str> {
        self.slot_abilities.get(&slot).map(String::as_str)
    }
}

/// Flags in vdata are normally booleans, but integer and string flags
/// occasionally appear; any non-empty, non-zero value counts as set.
fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}
