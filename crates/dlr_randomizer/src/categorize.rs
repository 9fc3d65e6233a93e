//! Pure filters over the flattened ability and hero documents.
//!
//! Nothing here mutates its input; calling any function twice on the same
//! mapping yields the same output. Entries that fail a classification are
//! left out of that classification only.

use crate::error::Result;
use crate::records::{AbilityRecord, AbilityType, HeroRecord};
use serde::Serialize;
use serde_json::{Map, Value as Json};

/// Ordered identifier → raw entry mapping.
pub type EntryMap = Map<String, Json>;

/// Abilities split by their `m_eAbilityType` tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbilityPartition {
    pub weapons: EntryMap,
    pub signatures: EntryMap,
    pub items: EntryMap,
}

/// Named weapon categories, serialized as `weaponsCategorized.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeaponCategories {
    pub burst: Vec<String>,
}

/// Entries sorted by identifier.
fn sorted_entries(map: &EntryMap) -> Vec<(&String, &Json)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

/// Split abilities into weapons, signature abilities and items in one pass.
///
/// Each output keeps identifiers in sorted order. Entries with any other tag
/// (or none) appear in none of the three.
pub fn partition_abilities_by_type(abilities: &EntryMap) -> AbilityPartition {
    let mut partition = AbilityPartition::default();
    for (id, entry) in sorted_entries(abilities) {
        let target = match AbilityRecord::from_entry(id, entry).ability_type {
            AbilityType::Weapon => &mut partition.weapons,
            AbilityType::Signature => &mut partition.signatures,
            AbilityType::Item => &mut partition.items,
            AbilityType::Other => continue,
        };
        target.insert(id.clone(), entry.clone());
    }
    tracing::debug!(
        weapons = partition.weapons.len(),
        signatures = partition.signatures.len(),
        items = partition.items.len(),
        skipped = abilities.len()
            - partition.weapons.len()
            - partition.signatures.len()
            - partition.items.len(),
        "partitioned abilities"
    );
    partition
}

/// Heroes eligible for randomization, sorted by identifier.
pub fn select_eligible_heroes(heroes: &EntryMap) -> Vec<HeroRecord> {
    sorted_entries(heroes)
        .into_iter()
        .filter_map(|(id, entry)| HeroRecord::from_entry(id, entry))
        .filter(|hero| {
            let eligible = hero.is_eligible();
            if !eligible {
                tracing::debug!(hero = %hero.id, "hero not eligible");
            }
            eligible
        })
        .collect()
}

/// Identifiers of weapons that fire one bullet per shot in bursts.
pub fn classify_burst_weapons(weapons: &EntryMap) -> Vec<String> {
    sorted_entries(weapons)
        .into_iter()
        .map(|(id, entry)| AbilityRecord::from_entry(id, entry))
        .filter(|record| record.weapon_fire.is_some_and(|fire| fire.is_burst()))
        .map(|record| record.id)
        .collect()
}

/// Every projection the pipeline exports, computed once from the two
/// flattened documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorized {
    pub abilities: EntryMap,
    pub partition: AbilityPartition,
    pub weapon_categories: WeaponCategories,
    pub heroes: EntryMap,
    pub eligible_heroes: Vec<HeroRecord>,
}

impl Categorized {
    pub fn from_documents(abilities: EntryMap, heroes: EntryMap) -> Self {
        let partition = partition_abilities_by_type(&abilities);
        let weapon_categories = WeaponCategories {
            burst: classify_burst_weapons(&partition.weapons),
        };
        let eligible_heroes = select_eligible_heroes(&heroes);

        Self {
            abilities,
            partition,
            weapon_categories,
            heroes,
            eligible_heroes,
        }
    }

    /// Released heroes as an identifier → raw entry mapping.
    pub fn released_heroes(&self) -> EntryMap {
        self.eligible_heroes
            .iter()
            .filter_map(|hero| {
                let entry = self.heroes.get(&hero.id)?;
                Some((hero.id.clone(), entry.clone()))
            })
            .collect()
    }

    /// Pretty-printed JSON snapshots keyed by their path relative to the
    /// JSON cache directory.
    pub fn snapshot_files(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("abilities/all.json", serde_json::to_string_pretty(&self.abilities)?),
            (
                "abilities/weapons.json",
                serde_json::to_string_pretty(&self.partition.weapons)?,
            ),
            (
                "abilities/abilities.json",
                serde_json::to_string_pretty(&self.partition.signatures)?,
            ),
            (
                "abilities/items.json",
                serde_json::to_string_pretty(&self.partition.items)?,
            ),
            (
                "abilities/weaponsCategorized.json",
                serde_json::to_string_pretty(&self.weapon_categories)?,
            ),
            ("heroes/all.json", serde_json::to_string_pretty(&self.heroes)?),
            (
                "heroes/released.json",
                serde_json::to_string_pretty(&self.released_heroes())?,
            ),
        ])
    }
}
