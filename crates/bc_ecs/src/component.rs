//! Type-erased component columns and the component registry.
//!
//! Mirrors the source's `Component` descriptor — a captured set of
//! constructor/move/destructor function pointers per type
//! (`entity_component_system.h`'s `Component::Capture`) — but expressed
//! as a trait object instead of raw function pointers, since Rust's
//! vtables already give us that indirection safely.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

/// Marker for a type that can live in an entity store column. Needs
/// `Default` because `alloc` grows a column by appending a default value
/// before the caller writes real data into it.
pub trait Component: Any + Default + Send + 'static {}
impl<T: Any + Default + Send + 'static> Component for T {}

/// Object-safe operations every component column supports, independent
/// of the element type.
pub trait AnyColumn: Send {
    fn len(&self) -> usize;
    fn push_default(&mut self);
    /// Drops the value at `index`, moving the last element into its
    /// place (this is exactly `Vec::swap_remove`'s contract, which is
    /// also the dense-array hole-filling the entity store relies on).
    fn swap_remove_drop(&mut self, index: usize);
    /// Moves the value at `index` out of `self` and appends it to
    /// `dest`, filling the hole from the last element as above. Caller
    /// must ensure `dest` is backed by the same concrete element type.
    fn move_out_to(&mut self, index: usize, dest: &mut dyn AnyColumn);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct TypedColumn<T>(pub Vec<T>);

impl<T: Component> TypedColumn<T> {
    fn new() -> Self {
        Self(Vec::new())
    }
}

impl<T: Component> AnyColumn for TypedColumn<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn push_default(&mut self) {
        self.0.push(T::default());
    }

    fn swap_remove_drop(&mut self, index: usize) {
        self.0.swap_remove(index);
    }

    fn move_out_to(&mut self, index: usize, dest: &mut dyn AnyColumn) {
        let value = self.0.swap_remove(index);
        dest.as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
            .expect("move_out_to called with mismatched column types")
            .0
            .push(value);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Integer id assigned to a registered component type, used as the bit
/// index into an archetype's component mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

type ColumnFactory = fn() -> Box<dyn AnyColumn>;

/// Maps component types to stable ids and knows how to create a fresh,
/// empty column for each — the run-time analogue of the source's
/// compile-time `ComponentList` type list.
#[derive(Default)]
pub struct ComponentRegistry {
    ids: FxHashMap<TypeId, ComponentId>,
    factories: Vec<ColumnFactory>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, or returns its existing id if already registered.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.ids.get(&type_id) {
            return id;
        }
        assert!(
            self.factories.len() < 64,
            "archetype masks are 64 bits wide; more than 64 component types is not supported"
        );
        let id = ComponentId(u32::try_from(self.factories.len()).unwrap());
        self.factories.push(|| Box::new(TypedColumn::<T>::new()) as Box<dyn AnyColumn>);
        self.ids.insert(type_id, id);
        id
    }

    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    #[must_use]
    pub fn new_column(&self, id: ComponentId) -> Box<dyn AnyColumn> {
        (self.factories[id.0 as usize])()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Position(f32, f32, f32);

    #[test]
    fn registering_the_same_type_twice_returns_the_same_id() {
        let mut reg = ComponentRegistry::new();
        let a = reg.register::<Position>();
        let b = reg.register::<Position>();
        assert_eq!(a, b);
    }

    #[test]
    fn move_out_to_preserves_the_value_and_fills_the_hole() {
        let mut src: TypedColumn<u32> = TypedColumn::new();
        let mut dst: TypedColumn<u32> = TypedColumn::new();
        src.0.extend([1, 2, 3]);
        src.move_out_to(0, &mut dst);
        assert_eq!(dst.0, vec![1]);
        // index 0 was filled by the last element (3), per swap_remove.
        assert_eq!(src.0, vec![3, 2]);
    }
}
