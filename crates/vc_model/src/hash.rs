//! Hash containers used by the definition store and dynamic maps.
//!
//! Built on *hashbrown* with a *foldhash* state seeded by a fixed value,
//! so iteration never depends on process-random seeds.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x5EED_0F_E4_71_7E_5C_A1);

/// Hash state whose results only depend on the input.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;
