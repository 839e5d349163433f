pub mod catalog;
pub mod damage;
pub mod dice;
pub mod duel;
pub mod exciting;
pub mod rng;
pub mod scenario;
pub mod units;

pub use catalog::{StateCatalog, StateId};
pub use damage::{apply_hits_to_destroyer, apply_hits_to_rebels, apply_hits_to_tie_fighter, apply_hits_to_y_wing};
pub use dice::{
    destroyed_hit_distribution, hit_distribution_for, merge_hit_distributions, pool_distribution, roll_hits, Die,
    DieOutcomes, HitCategory, HitDistribution, Hits, DIE_SIDES,
};
pub use duel::{Duel, DuelDamage};
pub use exciting::{ExcitingBattle, ExcitingDamage, EXCITING_STATE_COUNT, EXCITING_TRANSIENT_COUNT};
pub use rng::Rng;
pub use scenario::{combine, reduce_to_states, Battle, StateDistribution};
pub use units::Unit;
