//! Integration tests: undo/redo through the editor facade.
//!
//! Every committed edit must be reversible to an identical polygon set,
//! and redo must bring back exactly the post-edit state.

use kurbo::Vec2;
use pretty_assertions::{assert_eq, assert_ne};
use seg_core::id::PolygonId;
use seg_core::model::Point;
use seg_core::{EditorConfig, Viewport};
use seg_editor::{Editor, InputEvent, Modifiers};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn loaded_with(config: EditorConfig) -> Editor {
    init_logger();
    let mut editor = Editor::new(config, Viewport::default());
    let diagnostics = editor
        .load_json(include_str!("fixtures/two_cells.json"))
        .expect("fixture parses");
    assert!(diagnostics.is_empty(), "fixture is clean: {diagnostics:?}");
    editor
}

fn loaded() -> Editor {
    loaded_with(EditorConfig::default())
}

fn id(s: &str) -> PolygonId {
    PolygonId::intern(s)
}

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn cmd_key(key: &str, shift: bool) -> InputEvent {
    InputEvent::KeyDown {
        key: key.to_owned(),
        modifiers: Modifiers {
            ctrl: true,
            shift,
            ..Modifiers::NONE
        },
    }
}

// ─── Round trips ────────────────────────────────────────────────────────

#[test]
fn undo_restores_pre_slice_set_and_redo_reapplies() {
    let mut editor = loaded();
    let before = editor.polygons().snapshot();

    let pieces = editor
        .slice_polygon(id("cell_a"), p(5.0, -5.0), p(5.0, 15.0))
        .expect("vertical cut through the square");
    let after = editor.polygons().snapshot();
    assert_eq!(editor.polygons().len(), 4);

    assert_eq!(editor.undo().as_deref(), Some("Slice polygon"));
    assert_eq!(editor.polygons().snapshot(), before);
    assert!(editor.polygons().contains(id("cell_a")));

    assert_eq!(editor.redo().as_deref(), Some("Slice polygon"));
    assert_eq!(editor.polygons().snapshot(), after);
    assert!(pieces.iter().all(|piece| editor.polygons().contains(*piece)));
}

#[test]
fn every_mutation_kind_round_trips() {
    type Edit = Box<dyn Fn(&mut Editor)>;
    let edits: Vec<(&str, Edit)> = vec![
        (
            "Add vertex",
            Box::new(|e: &mut Editor| e.add_vertex(id("cell_a"), 0, p(5.0, -1.0)).unwrap()),
        ),
        (
            "Add points",
            Box::new(|e: &mut Editor| {
                e.add_points(id("cell_a"), 3, 2, &[p(3.0, 14.0), p(7.0, 14.0)])
                    .unwrap()
            }),
        ),
        (
            "Delete vertex",
            Box::new(|e: &mut Editor| e.delete_vertex(id("cell_a"), 1).unwrap()),
        ),
        (
            "Move vertex",
            Box::new(|e: &mut Editor| {
                e.drag_vertex(id("cell_b"), 0, Vec2::new(-2.0, -2.0)).unwrap();
                assert_eq!(e.commit_drag(), Ok(true));
            }),
        ),
        (
            "Create polygon",
            Box::new(|e: &mut Editor| {
                e.create_polygon(&[p(100.0, 100.0), p(110.0, 100.0), p(105.0, 110.0)])
                    .unwrap();
            }),
        ),
        (
            "Delete polygon",
            Box::new(|e: &mut Editor| e.delete_polygon(id("cell_b")).unwrap()),
        ),
    ];

    for (label, edit) in edits {
        let mut editor = loaded();
        let before = editor.polygons().snapshot();
        edit(&mut editor);
        let after = editor.polygons().snapshot();
        assert_ne!(before, after, "{label} changed nothing");

        assert_eq!(editor.undo().as_deref(), Some(label));
        assert_eq!(editor.polygons().snapshot(), before, "{label}: undo");
        assert_eq!(editor.redo().as_deref(), Some(label));
        assert_eq!(editor.polygons().snapshot(), after, "{label}: redo");
    }
}

#[test]
fn deleting_a_container_and_undoing_restores_the_hole_parent() {
    let mut editor = loaded();
    editor.delete_polygon(id("cell_b")).unwrap();
    let hole = editor.polygons().get(id("cell_b_hole")).unwrap();
    assert_eq!(hole.parent_id, None);

    editor.undo();
    let hole = editor.polygons().get(id("cell_b_hole")).unwrap();
    assert_eq!(hole.parent_id, Some(id("cell_b")));
}

#[test]
fn keyboard_undo_and_redo() {
    let mut editor = loaded();
    editor.delete_vertex(id("cell_a"), 0).unwrap();
    assert_eq!(editor.polygons().get(id("cell_a")).unwrap().len(), 3);

    editor.handle_event(&cmd_key("z", false));
    assert_eq!(editor.polygons().get(id("cell_a")).unwrap().len(), 4);

    editor.handle_event(&cmd_key("Z", true));
    assert_eq!(editor.polygons().get(id("cell_a")).unwrap().len(), 3);

    editor.handle_event(&cmd_key("z", false));
    editor.handle_event(&cmd_key("y", false));
    assert_eq!(editor.polygons().get(id("cell_a")).unwrap().len(), 3);
}

// ─── Empty stacks and rejections ────────────────────────────────────────

#[test]
fn undo_and_redo_on_empty_stacks_are_noops() {
    let mut editor = loaded();
    let before = editor.polygons().snapshot();
    assert_eq!(editor.undo(), None);
    assert_eq!(editor.redo(), None);
    assert_eq!(editor.polygons().snapshot(), before);
    assert!(editor.last_diagnostic().is_none(), "an empty stack is not an error");
}

#[test]
fn rejected_edits_record_nothing() {
    let mut editor = loaded();
    let before = editor.polygons().snapshot();

    // The hole already sits at the 3-point floor.
    assert!(editor.delete_vertex(id("cell_b_hole"), 0).is_err());
    assert!(editor.slice_polygon(id("cell_a"), p(20.0, 20.0), p(30.0, 20.0)).is_err());
    assert!(editor.create_polygon(&[p(0.0, 0.0), p(1.0, 1.0)]).is_err());
    assert!(editor.add_vertex(id("cell_a"), 0, p(5.0, 20.0)).is_err());

    assert!(!editor.can_undo());
    assert_eq!(editor.polygons().snapshot(), before);
}

#[test]
fn a_new_edit_clears_redo() {
    let mut editor = loaded();
    editor.delete_vertex(id("cell_a"), 0).unwrap();
    editor.undo();
    assert!(editor.can_redo());

    editor.delete_vertex(id("cell_b"), 0).unwrap();
    assert!(!editor.can_redo());
    assert_eq!(editor.redo(), None);
}

#[test]
fn history_depth_follows_config() {
    let mut editor = loaded_with(EditorConfig {
        history_depth: 2,
        ..EditorConfig::default()
    });
    for _ in 0..4 {
        editor.drag_vertex(id("cell_b"), 0, Vec2::new(1.0, 0.0)).unwrap();
        editor.commit_drag().unwrap();
    }
    let mut undone = 0;
    while editor.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 2);
    assert_eq!(editor.polygons().get(id("cell_b")).unwrap().point(0), Some(p(42.0, 0.0)));
}

// ─── Selection across history ───────────────────────────────────────────

#[test]
fn undo_drops_a_vanished_selection_without_fading() {
    let mut editor = loaded();
    editor.tick(1_000.0);
    let created = editor
        .create_polygon(&[p(100.0, 100.0), p(110.0, 100.0), p(105.0, 110.0)])
        .unwrap();
    assert_eq!(editor.selected(), Some(created));
    assert!(editor.selection_alpha() < 1.0, "a fresh selection fades in");

    editor.undo();
    assert_eq!(editor.selected(), None);
    assert_eq!(editor.selection_alpha(), 1.0);

    editor.redo();
    assert!(editor.polygons().contains(created));
}

#[test]
fn undo_keeps_a_surviving_selection_and_snaps_it() {
    let mut editor = loaded();
    editor.tick(500.0);
    editor.select_polygon(Some(id("cell_b"))).unwrap();
    editor.add_vertex(id("cell_b"), 0, p(50.0, -1.0)).unwrap();

    editor.undo();
    assert_eq!(editor.selected(), Some(id("cell_b")));
    assert_eq!(editor.selection_alpha(), 1.0);
}

#[test]
fn undo_discards_in_progress_gestures() {
    let mut editor = loaded();
    editor.delete_vertex(id("cell_a"), 0).unwrap();
    editor.drag_vertex(id("cell_b"), 1, Vec2::new(3.0, 3.0)).unwrap();
    assert!(!editor.interaction().is_idle());

    editor.undo();
    assert!(editor.interaction().is_idle());
    assert_eq!(editor.polygons().get(id("cell_b")).unwrap().point(1), Some(p(60.0, 0.0)));
}
