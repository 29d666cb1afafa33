//! Behavioural properties of the change log, checked against the in-memory
//! world.
//!
//! - **Round trip**: undo followed by redo restores the observable state
//! - **Coalescing**: a coalescing window yields exactly one transaction
//! - **Branch discard**: a new commit after undo clears redo
//! - **Re-entrancy**: side effects of a replay are never recorded
//! - **Bounded history**: evicted transactions are unreachable

mod common;

use common::Scene;
use sceneforge_core::math::vec3;
use sceneforge_core::{
    HistoryConfig, HistoryError, Phase, PropertyValue, Reconstruction, SceneWorld, ShapeKind,
    UNKNOWN_ACTION_LABEL,
};

// ============================================================================
// Round trip
// ============================================================================

/// Builds a history touching every change kind.
fn mixed_history(scene: &mut Scene) {
    let a = scene.create("Add cube", ShapeKind::Cube);
    let b = scene.create("Add sphere", ShapeKind::Sphere);
    scene.translate("Move cube", a, 1.0, 2.0, 3.0);

    scene.log.start_transaction("Style sphere").unwrap();
    scene.set(b, "color", PropertyValue::Color(0x00ff00));
    scene.set(b, "opacity", PropertyValue::Number(0.25));
    scene.set(b, "visible", PropertyValue::Bool(false));
    scene.log.commit_transaction();

    scene.log.start_transaction("Rotate and add").unwrap();
    scene.set(a, "rotation", PropertyValue::Vec3(vec3(0.0, 1.0, 0.0)));
    let c = scene.spawn(ShapeKind::Torus);
    scene.move_to(c, vec3(-4.0, 0.0, 0.0));
    scene.log.commit_transaction();

    scene.delete("Delete cube", a);
}

#[test]
fn undo_then_redo_restores_state_at_every_depth() {
    let mut scene = Scene::new();
    mixed_history(&mut scene);
    let depth = scene.log.undo_count();
    assert_eq!(depth, 6);

    for _ in 0..depth {
        let before = scene.state();
        let report = scene.log.undo(&mut scene.world).unwrap();
        assert!(report.is_clean(), "undo of '{}' had issues", report.label);
        let report = scene.log.redo(&mut scene.world).unwrap();
        assert!(report.is_clean(), "redo of '{}' had issues", report.label);
        assert_eq!(scene.state(), before);

        // Step one level deeper for the next round.
        scene.log.undo(&mut scene.world).unwrap();
    }
    assert!(scene.world.is_empty());
    assert_eq!(scene.log.redo_count(), depth);
}

#[test]
fn full_undo_then_full_redo_restores_final_state() {
    let mut scene = Scene::new();
    mixed_history(&mut scene);
    let final_state = scene.state();

    while scene.log.can_undo() {
        scene.log.undo(&mut scene.world).unwrap();
    }
    assert!(scene.world.is_empty());
    while scene.log.can_redo() {
        scene.log.redo(&mut scene.world).unwrap();
    }
    assert_eq!(scene.state(), final_state);
    assert!(scene.log.diagnostics().is_empty());
}

// ============================================================================
// Coalescing
// ============================================================================

#[test]
fn coalesced_property_edits_form_one_transaction() {
    let mut scene = Scene::new();
    let b = scene.create("Add sphere", ShapeKind::Sphere);
    let before = scene.state();

    scene.log.start_coalescing("Fade sphere").unwrap();
    for step in 1..=20 {
        let opacity = 1.0 - step as f64 * 0.04;
        scene.set(b, "opacity", PropertyValue::Number(opacity));
    }
    assert!(scene.log.stop_coalescing());

    assert_eq!(scene.log.undo_count(), 2);
    assert_eq!(scene.log.peek_undo().unwrap().len(), 1);

    let report = scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(report.label, "Fade sphere");
    assert_eq!(scene.state(), before);
}

#[test]
fn material_edit_on_bare_object_reverts_exactly() {
    let mut scene = Scene::new();
    let lamp = scene
        .world
        .spawn(Reconstruction::Description("a paper lamp".into()));
    scene.log.id_of(&mut scene.world, lamp).unwrap();
    let before = scene.state();

    scene.log.start_transaction("Tint lamp").unwrap();
    scene.set(lamp, "color", PropertyValue::Color(0xffcc00));
    scene.set(lamp, "opacity", PropertyValue::Number(0.5));
    scene.log.commit_transaction();
    let after = scene.state();

    scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(scene.state(), before);
    scene.log.redo(&mut scene.world).unwrap();
    assert_eq!(scene.state(), after);
}

#[test]
fn coalescing_keeps_distinct_targets_apart() {
    let mut scene = Scene::new();
    let a = scene.create("Add cube", ShapeKind::Cube);
    let b = scene.create("Add cone", ShapeKind::Cone);
    let before = scene.state();

    scene.log.start_coalescing("Drag both").unwrap();
    for step in 1..=5 {
        scene.move_to(a, vec3(step as f32, 0.0, 0.0));
        scene.move_to(b, vec3(0.0, step as f32, 0.0));
    }
    scene.log.stop_coalescing();

    // Interleaved targets never sit next to each other, so nothing folds.
    assert_eq!(scene.log.peek_undo().unwrap().len(), 10);
    scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(scene.state(), before);
}

// ============================================================================
// Branch discard
// ============================================================================

#[test]
fn commit_after_undo_discards_redo_branch() {
    let mut scene = Scene::new();
    let a = scene.create("Add cube", ShapeKind::Cube);
    scene.translate("Move 1", a, 1.0, 0.0, 0.0);
    scene.translate("Move 2", a, 2.0, 0.0, 0.0);

    scene.log.undo(&mut scene.world).unwrap();
    scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(scene.log.redo_count(), 2);

    scene.translate("Move elsewhere", a, 0.0, 0.0, 9.0);
    assert_eq!(scene.log.redo_count(), 0);
    assert_eq!(
        scene.log.redo(&mut scene.world),
        Err(HistoryError::NothingToRedo)
    );
    assert_eq!(
        scene.log.undo_labels().collect::<Vec<_>>(),
        vec!["Move elsewhere", "Add cube"]
    );
}

// ============================================================================
// Re-entrancy
// ============================================================================

#[test]
fn replay_side_effects_are_not_recorded() {
    let mut scene = Scene::new();
    let a = scene.create("Add cube", ShapeKind::Cube);
    scene.delete("Delete cube", a);
    assert_eq!((scene.log.undo_count(), scene.log.redo_count()), (2, 0));

    // Rebuilding the cube goes through the notifying factory.
    scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(scene.log.phase(), Phase::Idle);
    assert!(scene.queue.is_empty());
    assert_eq!(scene.log.process_notifications(&mut scene.world), 0);
    assert_eq!((scene.log.undo_count(), scene.log.redo_count()), (1, 1));

    scene.log.redo(&mut scene.world).unwrap();
    scene.log.undo(&mut scene.world).unwrap();
    scene.log.undo(&mut scene.world).unwrap();
    scene.log.redo(&mut scene.world).unwrap();
    assert_eq!((scene.log.undo_count(), scene.log.redo_count()), (1, 1));
    assert_eq!(scene.log.phase(), Phase::Idle);
}

#[test]
fn edits_pending_in_the_queue_survive_undo() {
    let mut scene = Scene::new();
    scene.create("Add cube", ShapeKind::Cube);
    let sphere = scene.spawn_unrecorded(ShapeKind::Sphere);
    assert_eq!(scene.queue.len(), 1);

    // The queued creation becomes history first, so undo reverts it.
    let report = scene.log.undo(&mut scene.world).unwrap();
    assert_eq!(report.label, UNKNOWN_ACTION_LABEL);
    assert!(!scene.world.contains(sphere));
    assert_eq!(scene.world.len(), 1);

    scene.log.redo(&mut scene.world).unwrap();
    assert_eq!(scene.world.len(), 2);
    assert_eq!(
        scene.log.undo_labels().collect::<Vec<_>>(),
        vec![UNKNOWN_ACTION_LABEL, "Add cube"]
    );
}

#[test]
fn multi_object_replay_is_not_rerecorded() {
    let mut scene = Scene::new();
    scene.log.start_transaction("Build row").unwrap();
    for i in 0..4 {
        let h = scene.spawn(ShapeKind::Cube);
        scene.move_to(h, vec3(i as f32 * 2.0, 0.0, 0.0));
    }
    scene.log.commit_transaction();

    for _ in 0..3 {
        scene.log.undo(&mut scene.world).unwrap();
        assert!(scene.world.is_empty());
        scene.log.redo(&mut scene.world).unwrap();
        assert_eq!(scene.world.len(), 4);
    }
    assert_eq!(scene.log.undo_count(), 1);
    assert_eq!(scene.log.peek_undo().unwrap().len(), 8);
}

// ============================================================================
// Bounded history
// ============================================================================

#[test]
fn oldest_transactions_are_evicted() {
    let mut scene = Scene::with_config(HistoryConfig::default().with_max_history_size(3));
    let a = scene.create("Add cube", ShapeKind::Cube);
    for i in 1..=5 {
        scene.translate(&format!("Move {i}"), a, i as f32, 0.0, 0.0);
    }
    assert_eq!(scene.log.undo_count(), 3);
    assert_eq!(
        scene.log.undo_labels().collect::<Vec<_>>(),
        vec!["Move 5", "Move 4", "Move 3"]
    );

    while scene.log.can_undo() {
        scene.log.undo(&mut scene.world).unwrap();
    }
    // "Move 2" and earlier are gone, so the cube stays where "Move 2" left it.
    assert_eq!(scene.position(a), vec3(2.0, 0.0, 0.0));
    assert_eq!(
        scene.log.undo(&mut scene.world),
        Err(HistoryError::NothingToUndo)
    );
}

#[test]
fn eviction_drops_unreachable_save_point() {
    let mut scene = Scene::with_config(HistoryConfig::default().with_max_history_size(2));
    let a = scene.create("Add cube", ShapeKind::Cube);
    scene.log.mark_saved();
    scene.translate("Move 1", a, 1.0, 0.0, 0.0);
    scene.translate("Move 2", a, 2.0, 0.0, 0.0);
    scene.translate("Move 3", a, 3.0, 0.0, 0.0);

    while scene.log.can_undo() {
        scene.log.undo(&mut scene.world).unwrap();
        assert!(scene.log.has_unsaved_changes());
    }
}
