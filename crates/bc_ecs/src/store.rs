//! The entity store (C4): archetype x zone component columns behind a
//! stable `InstanceRef` indirection, with per-worker deferred mutation
//! applied at `tick()`.
//!
//! Grounded on `entity_component_system.h`: `AllocInstance` /
//! `DeallocInstance` / `MoveZoneInstance` / `TickDatabase` / `Process` and
//! the transaction-callback hook. The source's compile-time
//! `ComponentList`/`EntityTypeList` type lists become a run-time
//! [`ComponentRegistry`]/[`ArchetypeRegistry`] pair here, since Rust has
//! no direct analogue of the source's variadic, compile-time archetype
//! declaration without a proc-macro this workspace doesn't carry.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::archetype::{ArchetypeDesc, ArchetypeId, ArchetypeRegistry, ComponentMask};
use crate::component::{AnyColumn, Component, ComponentId, ComponentRegistry, TypedColumn};
use crate::errors::{EcsError, Result};
use crate::instance_ref::{IndirectionWorkerTable, InstanceRef};
use crate::zone::{ZoneId, ZoneSet};
use bc_core::PerWorker;

/// Fired during `tick()` once a deferred dealloc or zone-move has been
/// applied, so downstream systems (e.g. the traffic manager's GPU
/// instance list) can react without polling the store every frame.
#[derive(Clone, Copy, Debug)]
pub enum Transaction {
    Dealloc { zone: ZoneId, archetype: ArchetypeId, index: u32 },
    Move {
        from_zone: ZoneId,
        from_archetype: ArchetypeId,
        from_index: u32,
        to_zone: ZoneId,
        to_archetype: ArchetypeId,
        to_index: u32,
    },
}

struct Cell {
    /// Live row count, visible to `process`; advances to `count_created`
    /// only at `tick()`.
    count: u32,
    count_created: u32,
    back_pointers: Vec<InstanceRef>,
    columns: FxHashMap<ComponentId, Box<dyn AnyColumn>>,
}

impl Cell {
    fn for_archetype(components: &ComponentRegistry, desc: &ArchetypeDesc) -> Self {
        let columns = desc
            .components
            .iter()
            .map(|&id| (id, components.new_column(id)))
            .collect();
        Self { count: 0, count_created: 0, back_pointers: Vec::new(), columns }
    }
}

/// A single visited entity during `process`. Exposes just enough to let
/// kernels enqueue dealloc/move without holding a raw `InstanceRef`
/// around — mirroring `InstanceIterator`.
pub struct EntityIter<'a> {
    store: &'a EntityStore,
    zone: ZoneId,
    archetype: ArchetypeId,
    instance_ref: InstanceRef,
}

impl<'a> EntityIter<'a> {
    #[must_use]
    pub fn instance_ref(&self) -> InstanceRef {
        self.instance_ref
    }

    #[must_use]
    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    #[must_use]
    pub fn archetype(&self) -> ArchetypeId {
        self.archetype
    }

    /// Enqueues this entity for deallocation at the next `tick()`.
    pub fn dealloc(&self) {
        self.store.dealloc(self.instance_ref);
    }

    /// Enqueues this entity for a zone move at the next `tick()`.
    /// No-op (at apply time) if `new_zone` equals its current zone.
    pub fn move_zone(&self, new_zone: ZoneId) {
        self.store.move_zone(self.instance_ref, new_zone);
    }
}

pub struct EntityStore {
    components: ComponentRegistry,
    archetypes: ArchetypeRegistry,
    cells: RwLock<FxHashMap<(ZoneId, ArchetypeId), Mutex<Cell>>>,
    num_zones: usize,
    indirection: PerWorker<Mutex<IndirectionWorkerTable>>,
    dealloc_queue: PerWorker<Mutex<Vec<InstanceRef>>>,
    move_queue: PerWorker<Mutex<Vec<(InstanceRef, ZoneId)>>>,
    transaction_callback: Mutex<Option<Box<dyn FnMut(Transaction) + Send>>>,
}

impl EntityStore {
    #[must_use]
    pub fn new(num_zones: usize, worker_count: usize) -> Self {
        Self {
            components: ComponentRegistry::new(),
            archetypes: ArchetypeRegistry::new(),
            cells: RwLock::new(FxHashMap::default()),
            num_zones,
            indirection: PerWorker::new(worker_count, |_| Mutex::new(IndirectionWorkerTable::new())),
            dealloc_queue: PerWorker::new(worker_count, |_| Mutex::new(Vec::new())),
            move_queue: PerWorker::new(worker_count, |_| Mutex::new(Vec::new())),
            transaction_callback: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn num_zones(&self) -> usize {
        self.num_zones
    }

    #[must_use]
    pub fn zone_set_all(&self) -> ZoneSet {
        ZoneSet::all(self.num_zones)
    }

    /// Live row count for `(zone, archetype)`, as of the last `tick()`.
    /// Zero if the cell has never been allocated into.
    #[must_use]
    pub fn live_count(&self, zone: ZoneId, archetype: ArchetypeId) -> u32 {
        self.cells.read().get(&(zone, archetype)).map_or(0, |cell| cell.lock().count)
    }

    /// Indexed read of a single component value, for callers that patch a
    /// known dense-array position instead of scanning with `process1`
    /// (e.g. the traffic manager refreshing one invalidated GPU block).
    #[must_use]
    pub fn component_at<T: Component + Copy>(&self, zone: ZoneId, archetype: ArchetypeId, index: u32) -> Option<T> {
        let id = self.components.id_of::<T>()?;
        let cells = self.cells.read();
        let cell = cells.get(&(zone, archetype))?.lock();
        let col = cell.columns.get(&id)?.as_any().downcast_ref::<TypedColumn<T>>()?;
        col.0.get(index as usize).copied()
    }

    /// Indexed write of a single component value. `index` may address a
    /// row `alloc` has just reserved (in `[count, count_created)`, not
    /// yet visible to `process`), which is exactly how a spawn call
    /// seeds real data into the default-initialized row `alloc` pushed.
    pub fn set_at<T: Component>(&self, zone: ZoneId, archetype: ArchetypeId, index: u32, value: T) -> bool {
        let Some(id) = self.components.id_of::<T>() else { return false };
        let cells = self.cells.read();
        let Some(cell_lock) = cells.get(&(zone, archetype)) else { return false };
        let mut cell = cell_lock.lock();
        let Some(col) = cell.columns.get_mut(&id).and_then(|c| c.as_any_mut().downcast_mut::<TypedColumn<T>>()) else { return false };
        let Some(slot) = col.0.get_mut(index as usize) else { return false };
        *slot = value;
        true
    }

    /// Resolves a stable handle back to its current (zone, archetype,
    /// dense index), or `None` if it has been deallocated since.
    #[must_use]
    pub fn resolve(&self, instance: InstanceRef) -> Option<(ZoneId, ArchetypeId, u32)> {
        self.indirection.get(instance.worker_id as usize).lock().resolve(instance.slot)
    }

    /// Reads a component off a stable handle directly, for visitors
    /// (e.g. a BVH query callback) that only hold an `InstanceRef` and
    /// never see the dense row it lives in.
    #[must_use]
    pub fn get<T: Component + Copy>(&self, instance: InstanceRef) -> Option<T> {
        let (zone, archetype, index) = self.resolve(instance)?;
        self.component_at(zone, archetype, index)
    }

    /// Registers a component type. Must be called before the store is
    /// shared across workers — it takes `&mut self` precisely so that
    /// registration is a single-threaded setup phase.
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        self.components.register::<T>()
    }

    /// Registers an archetype (a fixed component subset). Same
    /// single-threaded setup-phase restriction as `register_component`.
    pub fn register_archetype(&mut self, components: &[ComponentId]) -> ArchetypeId {
        self.archetypes.register(components)
    }

    /// Installs the transaction callback, replacing any previous one.
    pub fn set_transaction_callback(&self, callback: impl FnMut(Transaction) + Send + 'static) {
        *self.transaction_callback.lock() = Some(Box::new(callback));
    }

    /// Reserves a dense slot in (zone, archetype) and an indirection slot
    /// on `worker_id`. Safe to call from any worker concurrently;
    /// serialized per (zone, archetype) by the cell's own mutex.
    pub fn alloc(&self, worker_id: usize, zone: ZoneId, archetype: ArchetypeId) -> Result<InstanceRef> {
        if archetype.0 as usize >= self.archetypes.len() {
            return Err(EcsError::UnknownArchetype);
        }
        let key = (zone, archetype);

        if let Some(cell_lock) = self.cells.read().get(&key) {
            return Ok(self.alloc_in_cell(cell_lock, worker_id, zone, archetype));
        }

        let mut cells = self.cells.write();
        let cell_lock = cells
            .entry(key)
            .or_insert_with(|| Mutex::new(Cell::for_archetype(&self.components, self.archetypes.desc(archetype))));
        Ok(self.alloc_in_cell(cell_lock, worker_id, zone, archetype))
    }

    fn alloc_in_cell(&self, cell_lock: &Mutex<Cell>, worker_id: usize, zone: ZoneId, archetype: ArchetypeId) -> InstanceRef {
        let mut cell = cell_lock.lock();
        let index = cell.count_created;
        cell.count_created += 1;
        for col in cell.columns.values_mut() {
            col.push_default();
        }
        cell.back_pointers.push(InstanceRef::default());

        let slot = self.indirection.get(worker_id).lock().alloc(zone, archetype, index);
        let instance_ref = InstanceRef { worker_id: u32::try_from(worker_id).unwrap(), slot };
        cell.back_pointers[index as usize] = instance_ref;
        instance_ref
    }

    /// Enqueues `instance` for deallocation; applied at the next
    /// `tick()`. Double-free (an already-deallocated or stale ref) is a
    /// silent no-op at apply time.
    pub fn dealloc(&self, instance: InstanceRef) {
        self.dealloc_queue.get(instance.worker_id as usize).lock().push(instance);
    }

    /// Enqueues a zone move for `instance`; applied at the next
    /// `tick()`. No-op at apply time if already in `new_zone`.
    pub fn move_zone(&self, instance: InstanceRef, new_zone: ZoneId) {
        self.move_queue.get(instance.worker_id as usize).lock().push((instance, new_zone));
    }

    /// Visits every live entity of every archetype containing `C1`,
    /// restricted to the zones set in `zones`. Read-only: safe from
    /// parallel jobs, including jobs that themselves call `dealloc`/
    /// `move_zone` on entities they visit (those only touch per-worker
    /// queues).
    pub fn process1<C1: Component>(
        &self,
        zones: &ZoneSet,
        mut kernel: impl FnMut(&EntityIter, &mut C1),
    ) -> Result<()> {
        let id1 = self.components.id_of::<C1>().ok_or(EcsError::UnknownComponent)?;
        let mask: ComponentMask = 1u64 << id1.0;

        let cells = self.cells.read();
        for archetype in self.archetypes.matching(mask) {
            for zone_idx in 0..zones.len() {
                let zone = ZoneId(u32::try_from(zone_idx).unwrap());
                if !zones.test(zone) {
                    continue;
                }
                let Some(cell_lock) = cells.get(&(zone, archetype)) else { continue };
                let mut cell = cell_lock.lock();
                let count = cell.count as usize;
                let back_pointers = cell.back_pointers.clone();
                let col = cell
                    .columns
                    .get_mut(&id1)
                    .expect("matching archetype must own this column")
                    .as_any_mut()
                    .downcast_mut::<TypedColumn<C1>>()
                    .expect("component registry/column type mismatch");
                for index in 0..count {
                    let iter = EntityIter { store: self, zone, archetype, instance_ref: back_pointers[index] };
                    kernel(&iter, &mut col.0[index]);
                }
            }
        }
        Ok(())
    }

    /// Two-component variant of [`Self::process1`].
    pub fn process2<C1: Component, C2: Component>(
        &self,
        zones: &ZoneSet,
        mut kernel: impl FnMut(&EntityIter, &mut C1, &mut C2),
    ) -> Result<()> {
        let id1 = self.components.id_of::<C1>().ok_or(EcsError::UnknownComponent)?;
        let id2 = self.components.id_of::<C2>().ok_or(EcsError::UnknownComponent)?;
        let mask: ComponentMask = (1u64 << id1.0) | (1u64 << id2.0);

        let cells = self.cells.read();
        for archetype in self.archetypes.matching(mask) {
            for zone_idx in 0..zones.len() {
                let zone = ZoneId(u32::try_from(zone_idx).unwrap());
                if !zones.test(zone) {
                    continue;
                }
                let Some(cell_lock) = cells.get(&(zone, archetype)) else { continue };
                let mut cell = cell_lock.lock();
                let count = cell.count as usize;
                let back_pointers = cell.back_pointers.clone();

                let mut col1 = cell.columns.remove(&id1).expect("matching archetype must own this column");
                let mut col2 = cell.columns.remove(&id2).expect("matching archetype must own this column");
                {
                    let c1 = col1.as_any_mut().downcast_mut::<TypedColumn<C1>>().expect("column type mismatch");
                    let c2 = col2.as_any_mut().downcast_mut::<TypedColumn<C2>>().expect("column type mismatch");
                    for index in 0..count {
                        let iter = EntityIter { store: self, zone, archetype, instance_ref: back_pointers[index] };
                        kernel(&iter, &mut c1.0[index], &mut c2.0[index]);
                    }
                }
                cell.columns.insert(id1, col1);
                cell.columns.insert(id2, col2);
            }
        }
        Ok(())
    }

    /// Drains every worker's dealloc then move queue (in that order, per
    /// worker), applies them, repairs back-pointers for any dense-row
    /// shuffle, fires the transaction callback, and finally advances
    /// every cell's visible `count` to `count_created`.
    pub fn tick(&mut self) {
        let archetypes = &self.archetypes;
        let cells = self.cells.get_mut();
        let callback = self.transaction_callback.get_mut();
        let worker_count = self.indirection.worker_count();

        for worker in 0..worker_count {
            let deallocs = std::mem::take(self.dealloc_queue.get_mut(worker).get_mut());
            for instance in deallocs {
                apply_dealloc(cells, &mut self.indirection, callback, instance);
            }
            let moves = std::mem::take(self.move_queue.get_mut(worker).get_mut());
            for (instance, new_zone) in moves {
                apply_move(cells, &mut self.indirection, archetypes, &self.components, callback, instance, new_zone);
            }
        }

        for cell_lock in cells.values_mut() {
            let cell = cell_lock.get_mut();
            cell.count = cell.count_created;
        }
    }
}

fn apply_dealloc(
    cells: &mut FxHashMap<(ZoneId, ArchetypeId), Mutex<Cell>>,
    indirection: &mut PerWorker<Mutex<IndirectionWorkerTable>>,
    callback: &mut Option<Box<dyn FnMut(Transaction) + Send>>,
    instance: InstanceRef,
) {
    let Some((zone, archetype, index)) =
        indirection.get_mut(instance.worker_id as usize).get_mut().resolve(instance.slot)
    else {
        return;
    };
    indirection.get_mut(instance.worker_id as usize).get_mut().free(instance.slot);

    let cell = cells
        .get_mut(&(zone, archetype))
        .expect("resolved instance must have a backing cell")
        .get_mut();
    let last_index = cell.count_created - 1;

    if index != last_index {
        let moved = cell.back_pointers[last_index as usize];
        for col in cell.columns.values_mut() {
            col.swap_remove_drop(index as usize);
        }
        cell.back_pointers.swap_remove(index as usize);
        indirection.get_mut(moved.worker_id as usize).get_mut().retarget(moved.slot, zone, archetype, index);
    } else {
        for col in cell.columns.values_mut() {
            col.swap_remove_drop(index as usize);
        }
        cell.back_pointers.swap_remove(index as usize);
    }
    cell.count_created -= 1;

    if let Some(cb) = callback {
        cb(Transaction::Dealloc { zone, archetype, index });
    }
}

fn apply_move(
    cells: &mut FxHashMap<(ZoneId, ArchetypeId), Mutex<Cell>>,
    indirection: &mut PerWorker<Mutex<IndirectionWorkerTable>>,
    archetypes: &ArchetypeRegistry,
    components: &ComponentRegistry,
    callback: &mut Option<Box<dyn FnMut(Transaction) + Send>>,
    instance: InstanceRef,
    new_zone: ZoneId,
) {
    let Some((from_zone, archetype, from_index)) =
        indirection.get_mut(instance.worker_id as usize).get_mut().resolve(instance.slot)
    else {
        return;
    };
    if from_zone == new_zone {
        return;
    }

    // Pull the source cell out of the map so we can hold a second
    // mutable borrow into the (possibly just-created) destination cell
    // without aliasing the same `HashMap`.
    let source_key = (from_zone, archetype);
    let mut source_cell = cells
        .remove(&source_key)
        .expect("resolved instance must have a backing cell")
        .into_inner();
    let last_index = source_cell.count_created - 1;
    let displaced = (from_index != last_index).then(|| source_cell.back_pointers[last_index as usize]);

    let dest_key = (new_zone, archetype);
    let dest_cell = cells
        .entry(dest_key)
        .or_insert_with(|| Mutex::new(Cell::for_archetype(components, archetypes.desc(archetype))))
        .get_mut();

    let to_index = dest_cell.count_created;
    dest_cell.count_created += 1;
    for (id, src_col) in &mut source_cell.columns {
        let dest_col = dest_cell.columns.get_mut(id).expect("same archetype must have matching columns");
        src_col.move_out_to(from_index as usize, dest_col.as_mut());
    }
    source_cell.back_pointers.swap_remove(from_index as usize);
    dest_cell.back_pointers.push(instance);

    if let Some(moved) = displaced {
        indirection.get_mut(moved.worker_id as usize).get_mut().retarget(moved.slot, from_zone, archetype, from_index);
    }
    source_cell.count_created -= 1;
    cells.insert(source_key, Mutex::new(source_cell));

    indirection.get_mut(instance.worker_id as usize).get_mut().retarget(instance.slot, new_zone, archetype, to_index);

    if let Some(cb) = callback {
        cb(Transaction::Move {
            from_zone,
            from_archetype: archetype,
            from_index,
            to_zone: new_zone,
            to_archetype: archetype,
            to_index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone, Copy, Debug, PartialEq)]
    struct Position(f32, f32, f32);

    #[derive(Default, Clone, Copy)]
    struct Velocity(f32, f32, f32);

    fn store_with_position_archetype(num_zones: usize) -> (EntityStore, ArchetypeId) {
        let mut store = EntityStore::new(num_zones, 1);
        let pos = store.register_component::<Position>();
        let archetype = store.register_archetype(&[pos]);
        (store, archetype)
    }

    #[test]
    fn alloc_is_visible_for_writes_but_not_counted_until_tick() {
        let (store, archetype) = store_with_position_archetype(1);
        store.alloc(0, ZoneId(0), archetype).unwrap();

        let zones = store.zone_set_all();
        let mut visited = 0;
        store.process1::<Position>(&zones, |_, _| visited += 1).unwrap();
        assert_eq!(visited, 0, "not yet ticked, so not yet visible to process");
    }

    #[test]
    fn dealloc_of_non_last_row_repairs_back_pointer_of_last_row() {
        let (mut store, archetype) = store_with_position_archetype(1);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        let b = store.alloc(0, ZoneId(0), archetype).unwrap();
        let c = store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();

        store.dealloc(a);
        store.tick();

        // b and c survive; process should visit exactly 2 entities and
        // their instance refs should resolve back correctly.
        let zones = store.zone_set_all();
        let mut seen = Vec::new();
        store
            .process1::<Position>(&zones, |it, _| seen.push(it.instance_ref()))
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&b));
        assert!(seen.contains(&c));
    }

    #[test]
    fn double_free_is_a_quiet_no_op() {
        let (mut store, archetype) = store_with_position_archetype(1);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();
        store.dealloc(a);
        store.dealloc(a);
        store.tick(); // must not panic
    }

    #[test]
    fn move_zone_relocates_the_entity_and_fires_the_callback() {
        let (mut store, archetype) = store_with_position_archetype(2);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();

        let moves = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let moves_clone = moves.clone();
        store.set_transaction_callback(move |t| moves_clone.lock().unwrap().push(t));

        store.move_zone(a, ZoneId(1));
        store.tick();

        let mut zones = ZoneSet::none(2);
        zones.set(ZoneId(1), true);
        let mut seen = 0;
        store.process1::<Position>(&zones, |_, _| seen += 1).unwrap();
        assert_eq!(seen, 1);
        assert_eq!(moves.lock().unwrap().len(), 1);
    }

    #[test]
    fn move_zone_to_current_zone_is_a_no_op() {
        let (mut store, archetype) = store_with_position_archetype(1);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();
        store.move_zone(a, ZoneId(0));
        store.tick(); // must not panic or duplicate the row

        let zones = store.zone_set_all();
        let mut seen = 0;
        store.process1::<Position>(&zones, |_, _| seen += 1).unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn set_at_seeds_a_freshly_allocated_row_before_its_first_tick() {
        let (store, archetype) = store_with_position_archetype(1);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        let (zone, arch, index) = store.resolve(a).unwrap();
        assert!(store.set_at(zone, arch, index, Position(1.0, 2.0, 3.0)));
        assert_eq!(store.component_at::<Position>(zone, arch, index), Some(Position(1.0, 2.0, 3.0)));
    }

    #[test]
    fn s1_indirection_survives_dense_swap_delete() {
        let (mut store, archetype) = store_with_position_archetype(1);
        let a = store.alloc(0, ZoneId(0), archetype).unwrap();
        let b = store.alloc(0, ZoneId(0), archetype).unwrap();
        let c = store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();

        let (za, arch_a, ia) = store.resolve(a).unwrap();
        let (zb, arch_b, ib) = store.resolve(b).unwrap();
        let (zc, arch_c, ic) = store.resolve(c).unwrap();
        store.set_at(za, arch_a, ia, Position(1.0, 0.0, 0.0));
        store.set_at(zb, arch_b, ib, Position(2.0, 0.0, 0.0));
        store.set_at(zc, arch_c, ic, Position(3.0, 0.0, 0.0));

        store.dealloc(b);
        store.tick();

        assert_eq!(store.get::<Position>(a), Some(Position(1.0, 0.0, 0.0)));
        assert_eq!(store.get::<Position>(c), Some(Position(3.0, 0.0, 0.0)));
        assert!(store.resolve(a).is_some());
        assert!(store.resolve(c).is_some());
        assert!(store.resolve(b).is_none());
    }

    #[test]
    fn s2_zone_move_with_callback() {
        let (mut store, archetype) = store_with_position_archetype(6);
        let e = store.alloc(0, ZoneId(2), archetype).unwrap();
        store.tick();
        let (zone, arch, index) = store.resolve(e).unwrap();
        store.set_at(zone, arch, index, Position(9.0, 0.0, 0.0));

        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log_clone = log.clone();
        store.set_transaction_callback(move |t| log_clone.lock().unwrap().push(t));

        store.move_zone(e, ZoneId(5));
        store.tick();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        match log[0] {
            Transaction::Move { from_zone, to_zone, to_index, .. } => {
                assert_eq!(from_zone, ZoneId(2));
                assert_eq!(to_zone, ZoneId(5));
                assert_eq!(to_index, 0);
            }
            _ => panic!("expected a Move transaction"),
        }
        assert_eq!(store.get::<Position>(e), Some(Position(9.0, 0.0, 0.0)));
    }

    #[test]
    fn process2_visits_matching_archetype_with_both_components() {
        let mut store = EntityStore::new(1, 1);
        let pos = store.register_component::<Position>();
        let vel = store.register_component::<Velocity>();
        let archetype = store.register_archetype(&[pos, vel]);
        store.alloc(0, ZoneId(0), archetype).unwrap();
        store.tick();

        let zones = store.zone_set_all();
        let mut visited = 0;
        store
            .process2::<Position, Velocity>(&zones, |_, p, v| {
                p.0 += v.0;
                visited += 1;
            })
            .unwrap();
        assert_eq!(visited, 1);
    }
}
