//! Categorization and signature-ability randomization for Deadlock vdata.
//!
//! The entry point is [`randomize`], which takes the parsed abilities and
//! heroes documents, derives every categorized projection, shuffles the
//! signature slots of the eligible heroes and writes the result back into
//! the heroes document.
//!
//! ```
//! use dlr_kv::kv3;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut abilities = kv3::parse(r#"{ ability_a = { m_eAbilityType = "EAbilityType_Signature" } }"#)?;
//! let mut heroes = kv3::parse(r#"{ hero_base = { } }"#)?;
//!
//! let result = dlr_randomizer::randomize(&mut abilities, &mut heroes, &mut StdRng::seed_from_u64(1))?;
//! assert_eq!(result.categorized.partition.signatures.len(), 1);
//! assert_eq!(result.cells_written, 0);
//! # Ok(())
//! # }
//! ```

pub mod categorize;
pub mod error;
pub mod permute;
pub mod records;

pub use categorize::{Categorized, EntryMap};
pub use error::{Error, Result};
pub use permute::{derange, SlotAssignmentTable};
pub use records::{AbilityRecord, AbilityType, HeroRecord, SignatureSlot};

use dlr_kv::{to_flat_mapping, Kv3Document};
use rand::Rng;

/// Output of a randomization run.
#[derive(Debug, Clone)]
pub struct Randomized {
    pub categorized: Categorized,
    /// The table after permutation.
    pub table: SlotAssignmentTable,
    /// Number of slot bindings written into the heroes document.
    pub cells_written: usize,
}

/// Run the full core pipeline over two parsed documents.
///
/// Both documents have their `_include` directive cleared. The abilities
/// document is otherwise left alone; the heroes document receives the
/// shuffled slot bindings.
pub fn randomize<R: Rng + ?Sized>(
    abilities: &mut Kv3Document,
    heroes: &mut Kv3Document,
    rng: &mut R,
) -> Result<Randomized> {
    abilities.clear_includes();
    heroes.clear_includes();

    let ability_entries = to_flat_mapping(&abilities.root);
    if ability_entries.is_empty() {
        return Err(Error::EmptyDocument("abilities"));
    }
    let hero_entries = to_flat_mapping(&heroes.root);
    if hero_entries.is_empty() {
        return Err(Error::EmptyDocument("heroes"));
    }

    let categorized = Categorized::from_documents(ability_entries, hero_entries);
    tracing::info!(
        abilities = categorized.abilities.len(),
        heroes = categorized.heroes.len(),
        eligible = categorized.eligible_heroes.len(),
        burst = categorized.weapon_categories.burst.len(),
        "categorized vdata"
    );

    let mut table = SlotAssignmentTable::from_heroes(&categorized.eligible_heroes);
    table.permute(rng);
    let cells_written = table.apply(&mut heroes.root);
    tracing::info!(
        heroes = table.heroes().len(),
        cells = cells_written,
        "applied shuffled signature abilities"
    );

    Ok(Randomized {
        categorized,
        table,
        cells_written,
    })
}
