//! Signature ability permutation.
//!
//! The eligible heroes' four signature slots are laid out as a table with
//! one row per slot and one column per hero. Each row is deranged
//! independently, so an ability always stays in the slot it was bound to
//! but moves to a different hero.

use crate::records::{HeroRecord, SignatureSlot, BOUND_ABILITIES_KEY, SIGNATURE_SLOT_COUNT};
use dlr_kv::DocumentNode;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffles tried before giving up on a value-level derangement.
pub const MAX_SHUFFLE_ATTEMPTS: usize = 10_000;

/// Return a permutation of `row` in which no position keeps its value,
/// unless one value fills more than half the row.
///
/// When every value occupies at most half the row, uniform shuffles are
/// rejection-sampled until no position holds a value equal to the one it
/// started with. Otherwise (or if [`MAX_SHUFFLE_ATTEMPTS`] runs out) a
/// Sattolo cycle is used, which moves every element to another position but
/// may still land an equal value where a duplicate used to be.
///
/// Rows with fewer than two entries cannot be deranged and are returned
/// unchanged.
pub fn derange<T, R>(row: &[T], rng: &mut R) -> Vec<T>
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    if row.len() < 2 {
        return row.to_vec();
    }

    if admits_value_derangement(row) {
        let mut candidate = row.to_vec();
        for _ in 0..MAX_SHUFFLE_ATTEMPTS {
            candidate.shuffle(rng);
            if is_value_derangement(row, &candidate) {
                return candidate;
            }
        }
        tracing::warn!(
            len = row.len(),
            "no derangement found after {MAX_SHUFFLE_ATTEMPTS} shuffles, using a cyclic shift"
        );
    } else {
        tracing::debug!(len = row.len(), "row is dominated by one value, using a cyclic shift");
    }

    sattolo(row, rng)
}

/// No value may fill more than half the row.
fn admits_value_derangement<T: PartialEq>(row: &[T]) -> bool {
    row.iter()
        .all(|value| row.iter().filter(|other| *other == value).count() * 2 <= row.len())
}

fn is_value_derangement<T: PartialEq>(original: &[T], candidate: &[T]) -> bool {
    original.iter().zip(candidate).all(|(a, b)| a != b)
}

/// Uniform random single-cycle permutation.
fn sattolo<T: Clone, R: Rng + ?Sized>(row: &[T], rng: &mut R) -> Vec<T> {
    let mut out = row.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..i);
        out.swap(i, j);
    }
    out
}

/// Slot × hero table of bound signature abilities.
///
/// The hero order is fixed at construction and never changes; only the
/// contents of each row move. A hero that does not bind some slot has an
/// empty cell there, and empty cells stay where they are.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignmentTable {
    heroes: Vec<String>,
    rows: [Vec<Option<String>>; SIGNATURE_SLOT_COUNT],
}

impl SlotAssignmentTable {
    /// Build the table from eligible heroes in the order given, one column
    /// per hero.
    pub fn from_heroes(heroes: &[HeroRecord]) -> Self {
        let mut table = Self {
            heroes: Vec::with_capacity(heroes.len()),
            rows: Default::default(),
        };

        for hero in heroes {
            table.heroes.push(hero.id.clone());
            for slot in SignatureSlot::ALL {
                let ability = hero.slot_ability(slot).map(str::to_string);
                if ability.is_none() {
                    tracing::debug!(hero = %hero.id, %slot, "hero does not bind this slot");
                }
                table.rows[slot.row()].push(ability);
            }
        }

        table
    }

    /// Hero identifiers, one per column.
    pub fn heroes(&self) -> &[String] {
        &self.heroes
    }

    pub fn row(&self, slot: SignatureSlot) -> &[Option<String>] {
        &self.rows[slot.row()]
    }

    pub fn get(&self, slot: SignatureSlot, hero_index: usize) -> Option<&str> {
        self.rows[slot.row()].get(hero_index)?.as_deref()
    }

    /// Abilities currently assigned to each hero, in slot order.
    pub fn assignments(
        &self,
    ) -> impl Iterator<Item = (&str, [Option<&str>; SIGNATURE_SLOT_COUNT])> + '_ {
        self.heroes.iter().enumerate().map(|(index, hero)| {
            let abilities = SignatureSlot::ALL.map(|slot| self.get(slot, index));
            (hero.as_str(), abilities)
        })
    }

    /// Derange the bound cells of every row independently.
    pub fn permute<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.heroes.len() < 2 {
            tracing::warn!(
                heroes = self.heroes.len(),
                "not enough eligible heroes to shuffle, keeping original assignments"
            );
            return;
        }

        for row in &mut self.rows {
            let bound: Vec<usize> = (0..row.len()).filter(|&i| row[i].is_some()).collect();
            let values: Vec<String> = bound.iter().filter_map(|&i| row[i].clone()).collect();
            for (index, value) in bound.into_iter().zip(derange(&values, rng)) {
                row[index] = Some(value);
            }
        }
    }

    /// Write the table into a heroes document root.
    ///
    /// Every `<hero>.m_mapBoundAbilities.ESlot_Signature_<n>` present in the
    /// tree is overwritten in place; missing paths and empty cells are
    /// skipped. Returns the number of cells written.
    pub fn apply(&self, heroes_root: &mut DocumentNode) -> usize {
        let mut written = 0;
        for (index, hero) in self.heroes.iter().enumerate() {
            for slot in SignatureSlot::ALL {
                let Some(ability) = self.get(slot, index) else {
                    continue;
                };
                let key = slot.key();
                let Some(node) =
                    heroes_root.find_path_mut(&[hero.as_str(), BOUND_ABILITIES_KEY, key.as_str()])
                else {
                    tracing::debug!(hero = %hero, slot = %slot, "slot binding not found in document");
                    continue;
                };
                node.set_value(ability);
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn sorted<T: Ord + Clone>(values: &[T]) -> Vec<T> {
        let mut values = values.to_vec();
        values.sort();
        values
    }

    fn hero(id: &str, abilities: &[&str]) -> HeroRecord {
        HeroRecord {
            id: id.to_string(),
            disabled: false,
            needs_testing: false,
            base: Some("hero_base".to_string()),
            slot_abilities: SignatureSlot::ALL
                .iter()
                .zip(abilities)
                .map(|(slot, ability)| (*slot, ability.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    proptest! {
        #[test]
        fn distinct_rows_are_deranged(
            row in proptest::collection::btree_set(0u32..1000, 2..40),
            seed in any::<u64>(),
        ) {
            let row: Vec<u32> = row.into_iter().collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let out = derange(&row, &mut rng);

            prop_assert_eq!(sorted(&out), sorted(&row));
            for (before, after) in row.iter().zip(&out) {
                prop_assert_ne!(before, after);
            }
        }

        #[test]
        fn rows_with_duplicates_stay_bijective(
            row in proptest::collection::vec(0u8..4, 0..30),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = derange(&row, &mut rng);
            prop_assert_eq!(sorted(&out), sorted(&row));
        }
    }

    #[test]
    fn short_rows_are_unchanged() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(derange(&["only"], &mut rng), vec!["only"]);
        assert_eq!(derange::<u8, _>(&[], &mut rng), Vec::<u8>::new());
    }

    #[test]
    fn two_entries_swap() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(derange(&["a", "b"], &mut rng), vec!["b", "a"]);
    }

    #[test]
    fn dominated_row_still_moves_every_position() {
        let row = ["x", "x", "x", "y"];
        let mut rng = StdRng::seed_from_u64(3);
        let out = derange(&row, &mut rng);
        assert_eq!(sorted(&out), sorted(&row));
        // the lone "y" must leave its slot under a single-cycle permutation
        assert_ne!(out[3], "y");
    }

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn table_has_a_column_per_hero() {
        let heroes = vec![
            hero("hero_a", &["a1", "a2", "a3", "a4"]),
            hero("hero_b", &["b1", "b2"]),
            hero("hero_c", &["c1", "c2", "c3", "c4"]),
        ];
        let table = SlotAssignmentTable::from_heroes(&heroes);

        assert_eq!(table.heroes().len(), 3);
        assert_eq!(table.row(SignatureSlot::ALL[1]), cells(&["a2", "b2", "c2"]).as_slice());
        assert_eq!(
            table.row(SignatureSlot::ALL[2]),
            &[Some("a3".to_string()), None, Some("c3".to_string())]
        );
        assert_eq!(table.get(SignatureSlot::ALL[3], 2), Some("c4"));
        assert_eq!(table.get(SignatureSlot::ALL[3], 1), None);
        assert_eq!(table.get(SignatureSlot::ALL[3], 3), None);

        let assignments: Vec<_> = table.assignments().collect();
        assert_eq!(assignments[1], ("hero_b", [Some("b1"), Some("b2"), None, None]));
    }

    #[test]
    fn incomplete_hero_still_shuffles_bound_slots() {
        let heroes = vec![
            hero("hero_a", &["a1", "a2", "a3", "a4"]),
            hero("hero_b", &["b1", "b2"]),
            hero("hero_c", &["c1", "c2", "c3", "c4"]),
        ];
        let original = SlotAssignmentTable::from_heroes(&heroes);
        let mut table = original.clone();
        table.permute(&mut StdRng::seed_from_u64(9));

        for slot in SignatureSlot::ALL {
            assert_eq!(sorted(table.row(slot)), sorted(original.row(slot)));
            for (before, after) in original.row(slot).iter().zip(table.row(slot)) {
                // empty cells stay empty, bound cells move
                assert_eq!(before.is_none(), after.is_none());
                if before.is_some() {
                    assert_ne!(before, after);
                }
            }
        }
        assert_ne!(table.get(SignatureSlot::ALL[0], 1), Some("b1"));
        assert_eq!(table.get(SignatureSlot::ALL[3], 1), None);
    }

    #[test]
    fn permute_keeps_abilities_in_their_slot() {
        let heroes = vec![
            hero("hero_a", &["a1", "a2", "a3", "a4"]),
            hero("hero_b", &["b1", "b2", "b3", "b4"]),
            hero("hero_c", &["c1", "c2", "c3", "c4"]),
        ];
        let original = SlotAssignmentTable::from_heroes(&heroes);
        let mut table = original.clone();
        table.permute(&mut StdRng::seed_from_u64(42));

        assert_eq!(table.heroes(), original.heroes());
        for slot in SignatureSlot::ALL {
            assert_eq!(sorted(table.row(slot)), sorted(original.row(slot)));
            for (before, after) in original.row(slot).iter().zip(table.row(slot)) {
                assert_ne!(before, after);
            }
        }
    }

    #[test]
    fn single_hero_table_is_untouched() {
        let original = SlotAssignmentTable::from_heroes(&[hero("hero_a", &["a1", "a2", "a3", "a4"])]);
        let mut table = original.clone();
        table.permute(&mut StdRng::seed_from_u64(0));
        assert_eq!(table, original);
    }

    #[test]
    fn apply_writes_present_slots_only() {
        let mut root = dlr_kv::kv3::parse(
            r#"{
                hero_a = { m_mapBoundAbilities = {
                    ESlot_Signature_1 = "a1" ESlot_Signature_2 = "a2"
                    ESlot_Signature_3 = "a3" ESlot_Signature_4 = "a4"
                } }
                hero_b = { m_mapBoundAbilities = { ESlot_Signature_1 = "b1" } }
            }"#,
        )
        .unwrap()
        .root;

        let heroes = vec![
            hero("hero_a", &["x1", "x2", "x3", "x4"]),
            hero("hero_b", &["y1", "y2", "y3", "y4"]),
        ];
        let table = SlotAssignmentTable::from_heroes(&heroes);

        assert_eq!(table.apply(&mut root), 5);
        let slot = |hero: &str, key: &str| {
            root.find_path(&[hero, BOUND_ABILITIES_KEY, key])
                .and_then(|node| node.value.as_str())
                .map(str::to_string)
        };
        assert_eq!(slot("hero_a", "ESlot_Signature_4").as_deref(), Some("x4"));
        assert_eq!(slot("hero_b", "ESlot_Signature_1").as_deref(), Some("y1"));
        assert_eq!(slot("hero_b", "ESlot_Signature_2"), None);
    }
}
