use super::*;
use crate::foundation::core::{Rect, Viewport};
use crate::test_support::{Call, RecordingSurface, frame_set};

fn surface(w: f64, h: f64) -> RecordingSurface {
    let mut s = RecordingSurface::default();
    s.resize(Viewport::new(w, h, 1.0).unwrap()).unwrap();
    s.calls.clear();
    s
}

#[test]
fn draw_clears_then_blits_cover_rect() {
    let frames = frame_set(1600, 900, &[true, true, true]);
    let mut s = surface(800.0, 600.0);
    let c = Compositor::new(0.75, [1, 2, 3, 255]);

    let out = c.draw(&mut s, &frames, 1.2).unwrap();
    assert_eq!(out, DrawOutcome::Drawn(FrameIndex(1)));
    assert_eq!(s.calls.len(), 2);
    assert_eq!(s.calls[0], Call::Clear([1, 2, 3, 255]));
    let Call::Draw(idx, dst) = s.calls[1] else {
        panic!("expected draw, got {:?}", s.calls[1]);
    };
    assert_eq!(idx, FrameIndex(1));
    assert!((dst.x0 - -200.0).abs() < 1e-3);
    assert_eq!(dst.y0, 0.0);
    assert!((dst.height() - 600.0).abs() < 1e-9);
}

#[test]
fn scrub_value_is_rounded_and_clamped() {
    let frames = frame_set(4, 4, &[true; 5]);
    let mut s = surface(10.0, 10.0);
    let c = Compositor::default();
    for (v, want) in [(-5.0, 0), (0.49, 0), (2.5, 3), (3.6, 4), (99.0, 4)] {
        assert_eq!(
            c.draw(&mut s, &frames, v).unwrap(),
            DrawOutcome::Drawn(FrameIndex(want))
        );
    }
}

#[test]
fn missing_frame_is_a_silent_no_op() {
    let frames = frame_set(4, 4, &[true, false, true]);
    let mut s = surface(10.0, 10.0);
    let c = Compositor::default();

    c.draw(&mut s, &frames, 0.0).unwrap();
    let before = s.calls.clone();
    let out = c.draw(&mut s, &frames, 1.0).unwrap();
    assert_eq!(
        out,
        DrawOutcome::Skipped(SkipReason::MissingFrame(FrameIndex(1)))
    );
    assert_eq!(s.calls, before);
}

#[test]
fn empty_set_and_unsized_surface_skip() {
    let c = Compositor::default();
    let mut s = surface(10.0, 10.0);
    assert_eq!(
        c.draw(&mut s, &FrameSet::default(), 0.0).unwrap(),
        DrawOutcome::Skipped(SkipReason::EmptySet)
    );

    let frames = frame_set(4, 4, &[true]);
    let mut unsized_surface = RecordingSurface::default();
    assert_eq!(
        c.draw(&mut unsized_surface, &frames, 0.0).unwrap(),
        DrawOutcome::Skipped(SkipReason::NoArea)
    );
    assert!(unsized_surface.calls.is_empty());
}

#[test]
fn draw_is_expressed_in_css_pixels() {
    let frames = frame_set(100, 100, &[true]);
    let mut s = RecordingSurface::default();
    s.resize(Viewport::new(50.0, 50.0, 3.0).unwrap()).unwrap();
    Compositor::default().draw(&mut s, &frames, 0.0).unwrap();
    assert_eq!(s.draws(), vec![FrameIndex(0)]);
    assert!(
        s.calls
            .contains(&Call::Draw(FrameIndex(0), Rect::new(0.0, 0.0, 50.0, 50.0)))
    );
    assert_eq!(s.backing_size(), Some((150, 150)));
}

#[test]
fn from_config_uses_bias() {
    let cfg = HeroConfig {
        bias_x: 0.25,
        ..HeroConfig::default()
    };
    assert_eq!(Compositor::from_config(&cfg).bias_x(), 0.25);
}
