//! # Stage Isolation
//!
//! Pending edits are visible through their own stage and nowhere else:
//!
//! 1. **Renames**: new name resolves in the stage, old name outside it
//! 2. **Deletes**: hidden from staged lookups only
//! 3. **New tables**: found through the stage-local fallback
//! 4. **Workers**: several stages over one shared world
//!
//! Run with: cargo test --package tessera_core --test stage_isolation

use std::thread;

use tessera_core::{Component, Entity, Stage, StagedLocation, StoreError, World};

#[derive(Clone, Debug, Default, PartialEq)]
#[allow(dead_code)]
struct Cargo(u32);
impl Component for Cargo {}

fn harbour() -> (World, Entity, Entity) {
    let mut world = World::new();
    let port = world.new_named(Entity::ROOT, "port").unwrap();
    let ship = world.new_named(port, "ship").unwrap();
    (world, port, ship)
}

#[test]
fn rename_is_seen_only_by_its_stage() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    stage.set_name(&world, ship, "boat").unwrap();

    let staged = stage.view(&world);
    assert_eq!(staged.lookup_child(port, "boat"), ship);
    assert_eq!(staged.lookup_child(port, "ship"), Entity::NULL);
    assert_eq!(staged.full_path(ship), "::port.boat");

    let canonical = world.view();
    assert_eq!(canonical.lookup_child(port, "ship"), ship);
    assert_eq!(canonical.lookup_child(port, "boat"), Entity::NULL);
    assert_eq!(canonical.full_path(ship), "::port.ship");
}

#[test]
fn staged_delete_hides_entity_in_stage_only() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    stage.delete(&world, ship).unwrap();

    assert_eq!(stage.location(ship), Some(StagedLocation::Deleted));
    assert_eq!(stage.view(&world).lookup_child(port, "ship"), Entity::NULL);
    assert_eq!(world.view().lookup_child(port, "ship"), ship);
    assert_eq!(stage.set(&world, ship, Cargo(1)), Err(StoreError::EntityDeleted(ship)));
}

#[test]
fn delete_after_edit_removes_overlay_row() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    stage.set_name(&world, ship, "boat").unwrap();
    stage.delete(&world, ship).unwrap();

    let table = world.record(ship).unwrap().table.unwrap();
    assert!(stage.overlay(table).unwrap().is_empty());
    assert_eq!(stage.view(&world).lookup_child(port, "boat"), Entity::NULL);
}

#[test]
fn new_signature_found_through_fallback() {
    let (world, port, _) = harbour();
    let mut stage = Stage::new(1);
    let crane = stage.new_named(&world, port, "crane").unwrap();
    stage.set(&world, crane, Cargo(40)).unwrap();

    assert_eq!(stage.local_tables().count(), 1);
    let view = stage.view(&world);
    assert_eq!(view.lookup_child(port, "crane"), crane);
    assert_eq!(view.lookup_full_path("::port.crane"), crane);
    assert_eq!(view.get::<Cargo>(crane), Some(&Cargo(40)));
    assert_eq!(world.view().lookup_child(port, "crane"), Entity::NULL);
    assert_eq!(world.tree_iter(port).count(), 1);
}

#[test]
fn staged_child_of_staged_parent() {
    let (world, _, _) = harbour();
    let mut stage = Stage::new(1);
    let island = stage.new_named(&world, Entity::ROOT, "island").unwrap();
    let hut = stage.new_named(&world, island, "hut").unwrap();

    let view = stage.view(&world);
    assert_eq!(view.lookup("island"), island);
    assert_eq!(view.lookup_full_path("::island.hut"), hut);
    assert_eq!(view.path_of(Entity::ROOT, hut, "/", Some("/")), "/island/hut");
}

#[test]
fn reparent_in_stage() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    let dock = stage.new_named(&world, port, "dock").unwrap();
    stage.add_child_of(&world, ship, dock).unwrap();

    let view = stage.view(&world);
    assert_eq!(view.lookup_child(port, "ship"), Entity::NULL);
    assert_eq!(view.lookup_full_path("::port.dock.ship"), ship);
    assert_eq!(world.view().lookup_full_path("::port.ship"), ship);
}

#[test]
fn duplicate_names_resolve_stably() {
    let (mut world, port, ship) = harbour();
    world.new_named(port, "ship").unwrap();

    let view = world.view();
    for _ in 0..3 {
        assert_eq!(view.lookup_child(port, "ship"), ship);
    }
}

#[test]
fn staged_rename_wins_within_its_table() {
    let (mut world, port, ship) = harbour();
    let tug = world.new_named(port, "tug").unwrap();
    assert_eq!(world.record(tug).unwrap().table, world.record(ship).unwrap().table);

    let mut stage = Stage::new(1);
    stage.set_name(&world, tug, "ship").unwrap();

    let view = stage.view(&world);
    for _ in 0..3 {
        assert_eq!(view.lookup_child(port, "ship"), tug);
    }
    assert_eq!(world.view().lookup_child(port, "ship"), ship);
}

#[test]
fn earlier_table_wins_over_later_overlay() {
    let (mut world, port, ship) = harbour();
    let barge = world.new_named(port, "barge").unwrap();
    world.set(barge, Cargo(7)).unwrap();
    let tables = world.child_tables(port);
    assert_eq!(tables.len(), 2);
    assert_eq!(world.record(ship).unwrap().table, Some(tables[0]));

    let mut stage = Stage::new(1);
    stage.set_name(&world, barge, "ship").unwrap();
    assert!(stage.overlay(tables[1]).is_some());

    let view = stage.view(&world);
    for _ in 0..3 {
        assert_eq!(view.lookup_child(port, "ship"), ship);
    }
    assert_eq!(view.lookup_child(port, "barge"), Entity::NULL);
}

#[test]
fn indexed_match_wins_over_stage_local() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    let twin = stage.new_named(&world, port, "ship").unwrap();
    stage.set(&world, twin, Cargo(3)).unwrap();
    assert!(matches!(stage.location(twin), Some(StagedLocation::Local { .. })));

    let view = stage.view(&world);
    for _ in 0..3 {
        assert_eq!(view.lookup_child(port, "ship"), ship);
    }
    assert_eq!(view.name_of(twin), Some("ship"));
}

#[test]
fn stages_on_worker_threads() {
    let (world, port, ship) = harbour();

    let stages: Vec<Stage> = thread::scope(|scope| {
        let workers: Vec<_> = (0..4u32)
            .map(|id| {
                let world = &world;
                scope.spawn(move || {
                    let mut stage = Stage::new(id);
                    let name = format!("boat{id}");
                    stage.set_name(world, ship, &name).unwrap();
                    stage.new_named(world, port, &format!("tug{id}")).unwrap();
                    assert_eq!(stage.view(world).lookup_child(port, &name), ship);
                    stage
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for stage in &stages {
        let view = stage.view(&world);
        for other in 0..4u32 {
            let found = view.lookup_child(port, &format!("boat{other}"));
            if other == stage.id() {
                assert_eq!(found, ship);
            } else {
                assert_eq!(found, Entity::NULL);
            }
        }
    }
    assert_eq!(world.view().lookup_child(port, "ship"), ship);
    assert_eq!(world.entity_count(), 2);
}

#[test]
fn clear_discards_edits() {
    let (world, port, ship) = harbour();
    let mut stage = Stage::new(1);
    stage.set_name(&world, ship, "boat").unwrap();
    stage.new_named(&world, port, "tug").unwrap();

    stage.clear();
    let view = stage.view(&world);
    assert_eq!(view.lookup_child(port, "ship"), ship);
    assert_eq!(view.lookup_child(port, "tug"), Entity::NULL);
}
