//! Lazy loader driven by the rectangle-geometry viewport

use bridge_desktop::{GeometryViewport, Rect};
use bridge_traits::viewport::{ElementId, ObserverOptions};
use core_metadata::{ElementState, ImageEvent, LazyImageLoader};

const CARD_HEIGHT: f64 = 150.0;
const CARD_SPACING: f64 = 200.0;

/// A 400x600 root with `count` cards stacked vertically
fn shelf(count: u64) -> (GeometryViewport, LazyImageLoader) {
    let viewport = GeometryViewport::new(400.0, 600.0);
    for id in 0..count {
        viewport.set_element_rect(
            ElementId(id),
            Rect::new(0.0, id as f64 * CARD_SPACING, 100.0, CARD_HEIGHT),
        );
    }

    let mut loader = LazyImageLoader::for_viewport(&viewport).unwrap();
    for id in 0..count {
        loader
            .register(ElementId(id), format!("https://covers.example/{}.jpg", id))
            .unwrap();
    }
    (viewport, loader)
}

#[test]
fn test_initial_pass_reveals_only_visible_cards() {
    let (_viewport, mut loader) = shelf(10);
    let revealed = loader.poll();

    // cards 0-2 are fully visible; card 3 pokes 50px into the bottom margin
    assert_eq!(revealed.len(), 4);
    assert!(revealed.contains(&"https://covers.example/3.jpg".to_string()));
    assert_eq!(loader.state(ElementId(4)), ElementState::Observed);
    assert_eq!(loader.rendered_src(ElementId(9)), "");
}

#[test]
fn test_never_intersecting_card_is_never_revealed() {
    let (viewport, mut loader) = shelf(30);
    loader.poll();

    viewport.scroll_to(0.0, 1000.0);
    loader.poll();
    viewport.scroll_to(0.0, 0.0);
    loader.poll();

    assert_eq!(loader.state(ElementId(29)), ElementState::Observed);
    assert_eq!(loader.rendered_src(ElementId(29)), "");
    assert!(!loader.is_revealed("https://covers.example/29.jpg"));
}

#[test]
fn test_revealed_once_and_stays_revealed() {
    let (viewport, mut loader) = shelf(20);
    loader.poll();
    let target = ElementId(10);
    assert_eq!(loader.rendered_src(target), "");

    viewport.scroll_to(0.0, 1800.0);
    let revealed = loader.poll();
    assert_eq!(
        revealed
            .iter()
            .filter(|src| src.as_str() == "https://covers.example/10.jpg")
            .count(),
        1
    );
    assert_eq!(loader.rendered_src(target), "https://covers.example/10.jpg");

    viewport.scroll_to(0.0, 0.0);
    loader.poll();
    viewport.scroll_to(0.0, 1800.0);
    let again = loader.poll();

    assert!(!again.contains(&"https://covers.example/10.jpg".to_string()));
    assert_eq!(loader.state(target), ElementState::Revealed);
    assert_eq!(loader.rendered_src(target), "https://covers.example/10.jpg");
}

#[test]
fn test_bottom_margin_reveals_just_below_the_fold() {
    let viewport = GeometryViewport::new(400.0, 600.0);
    // top edge 40px below the fold, so only 10px reach into the margin
    viewport.set_element_rect(ElementId(1), Rect::new(0.0, 640.0, 100.0, 150.0));

    let mut loader = LazyImageLoader::new(&viewport, ObserverOptions::lazy_image()).unwrap();
    loader.register(ElementId(1), "near.jpg").unwrap();
    assert!(loader.poll().is_empty());

    viewport.scroll_to(0.0, 10.0);
    assert_eq!(loader.poll(), vec!["near.jpg"]);
}

#[test]
fn test_events_before_reveal_are_dropped() {
    let (viewport, mut loader) = shelf(20);
    loader.poll();
    let target = ElementId(15);

    assert_eq!(
        loader.on_image_event(target, "https://covers.example/15.jpg", ImageEvent::Load),
        None
    );

    viewport.scroll_to(0.0, 2800.0);
    loader.poll();
    assert_eq!(
        loader.on_image_event(target, "https://covers.example/15.jpg", ImageEvent::Load),
        Some(ImageEvent::Load)
    );
}

#[test]
fn test_teardown_stops_reveals() {
    let (viewport, mut loader) = shelf(20);
    loader.poll();
    loader.teardown();

    viewport.scroll_to(0.0, 2800.0);
    assert!(loader.poll().is_empty());
    assert!(!loader.is_revealed("https://covers.example/15.jpg"));
    assert!(loader.is_revealed("https://covers.example/0.jpg"));
}
