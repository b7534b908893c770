//! Archetype registration: a fixed closed set of component-subsets, the
//! run-time analogue of the source's `EntityType<COMPONENTS...>` /
//! `EntityTypeMask`.

use smallvec::SmallVec;

use crate::component::ComponentId;

/// Bitset of registered `ComponentId`s present in an archetype; bit `i`
/// set means component id `i` is present. 64 component types max (see
/// [`crate::component::ComponentRegistry::register`]).
pub type ComponentMask = u64;

/// Index of a registered archetype (a specific component subset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ArchetypeId(pub u32);

pub struct ArchetypeDesc {
    pub components: SmallVec<[ComponentId; 8]>,
    pub mask: ComponentMask,
}

#[derive(Default)]
pub struct ArchetypeRegistry {
    archetypes: Vec<ArchetypeDesc>,
}

impl ArchetypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new archetype covering exactly `components`.
    pub fn register(&mut self, components: &[ComponentId]) -> ArchetypeId {
        let mask = components.iter().fold(0u64, |m, c| m | (1u64 << c.0));
        self.archetypes.push(ArchetypeDesc { components: components.iter().copied().collect(), mask });
        ArchetypeId(u32::try_from(self.archetypes.len() - 1).unwrap())
    }

    #[must_use]
    pub fn desc(&self, id: ArchetypeId) -> &ArchetypeDesc {
        &self.archetypes[id.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Every archetype whose mask contains all of `query_mask`'s bits,
    /// paired with its id — used by `process` to find matching
    /// archetypes without the caller needing to enumerate them.
    pub fn matching(&self, query_mask: ComponentMask) -> impl Iterator<Item = ArchetypeId> + '_ {
        self.archetypes.iter().enumerate().filter_map(move |(i, desc)| {
            (desc.mask & query_mask == query_mask).then(|| ArchetypeId(u32::try_from(i).unwrap()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_only_returns_archetypes_with_all_required_components() {
        let mut reg = ArchetypeRegistry::new();
        let only_a = reg.register(&[ComponentId(0)]);
        let a_and_b = reg.register(&[ComponentId(0), ComponentId(1)]);

        let query_mask = (1u64 << 0) | (1u64 << 1);
        let matches: Vec<_> = reg.matching(query_mask).collect();
        assert_eq!(matches, vec![a_and_b]);
        assert_ne!(matches[0], only_a);
    }
}
