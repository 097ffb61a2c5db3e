use crossterm::event::{Event, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use term_popover::anchor::{Anchor, AnchorId};
use term_popover::overlay::{FloatRect, ManualOffset, OverlayNode};
use term_popover::placement::AnchoredPlacementEngine;
use term_popover::popover::{Authority, Popover, PopoverProps};
use term_popover::preference::{
    FilePreferenceStore, OverlayIdentity, PreferenceStore, StoredPosition,
};

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

fn props() -> PopoverProps {
    PopoverProps {
        is_open: true,
        anchor: Some(Anchor::new(AnchorId(3), FloatRect::new(10, 4, 12, 3)).with_depth(3)),
        manual_mode: true,
        ..PopoverProps::default()
    }
}

#[test]
fn dragged_position_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("popover.json");
    let viewport = Rect::new(0, 0, 120, 40);

    let dropped = {
        let store = FilePreferenceStore::open(&path).unwrap();
        let mut popover = Popover::new(
            OverlayIdentity::property_pane(),
            AnchoredPlacementEngine::default(),
            store,
        );
        let mut node = OverlayNode::new(24, 6);
        popover.sync(&props(), viewport, &mut node);
        popover.on_layout(&mut node);

        let rect = node.bounding_rect();
        let (column, row) = (rect.x as u16 + 1, rect.y as u16 + 1);
        let left = MouseButton::Left;
        popover.handle_event(&mouse(MouseEventKind::Down(left), column, row), &mut node);
        popover.handle_event(
            &mouse(MouseEventKind::Drag(left), column + 30, row + 10),
            &mut node,
        );
        popover.handle_event(
            &mouse(MouseEventKind::Up(left), column + 30, row + 10),
            &mut node,
        );
        node.bounding_rect().top_left()
    };
    assert!(path.exists());

    let store = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(
        store.stored_position(&OverlayIdentity::property_pane()),
        StoredPosition::Moved(dropped)
    );
    let mut popover = Popover::new(
        OverlayIdentity::property_pane(),
        AnchoredPlacementEngine::default(),
        store,
    );
    let mut node = OverlayNode::new(24, 6);
    popover.sync(&props(), viewport, &mut node);
    popover.on_layout(&mut node);
    assert_eq!(node.bounding_rect().top_left(), dropped);
    assert_eq!(popover.authority(), Authority::Manual(dropped));
}

#[test]
fn clearing_preference_returns_to_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("popover.json");
    std::fs::write(
        &path,
        r#"{"property_pane":{"isMoved":true,"position":{"x":70,"y":20}}}"#,
    )
    .unwrap();
    let viewport = Rect::new(0, 0, 120, 40);

    let store = FilePreferenceStore::open(&path).unwrap();
    let mut popover = Popover::new(
        OverlayIdentity::property_pane(),
        AnchoredPlacementEngine::default(),
        store,
    );
    let mut node = OverlayNode::new(24, 6);
    popover.sync(&props(), viewport, &mut node);
    assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(70, 20));

    let identity = OverlayIdentity::property_pane();
    popover
        .controller_mut()
        .store_mut()
        .clear_preference(&identity)
        .unwrap();
    assert!(popover.sync(&props(), viewport, &mut node));
    assert_eq!(popover.authority(), Authority::Placement);
    assert_ne!(node.bounding_rect().top_left(), ManualOffset::new(70, 20));

    let reopened = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(reopened.get_preference(&identity), None);
}
