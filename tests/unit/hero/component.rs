use super::*;
use crate::animation::scrub::Scrub;
use crate::foundation::core::FrameIndex;
use crate::render::compositor::SkipReason;
use crate::test_support::{Call, RecordingSurface, solid_frame};

fn manifest(frames: u32) -> SequenceManifest {
    SequenceManifest {
        frame_count: frames,
        file_prefix: "hero_".to_string(),
        file_extension: "jpg".to_string(),
        start_frame: 0,
        digits: 3,
    }
}

fn instant_config() -> HeroConfig {
    HeroConfig {
        manifest_path: "seq/manifest.json".to_string(),
        scrub: Scrub::Instant,
        scrub_distance: 10.0,
        ..HeroConfig::default()
    }
}

fn viewport(w: f64, h: f64, dpr: f64) -> Viewport {
    Viewport::new(w, h, dpr).unwrap()
}

/// Hero with `frames` frames, all loaded except `missing`, activated at 800x600@1.
fn ready_hero(frames: u32, missing: &[usize]) -> (ScrollHero<RecordingSurface>, EventHub) {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    let reqs = hero.begin_loading(Ok(manifest(frames)));
    for r in reqs {
        let outcome = if missing.contains(&r.index) {
            Err(ScrubError::decode("missing"))
        } else {
            Ok(solid_frame(16, 9))
        };
        hero.on_frame_loaded(r.index, outcome).unwrap();
    }
    hero.activate(&hub, viewport(800.0, 600.0, 1.0)).unwrap();
    hero.surface_mut().calls.clear();
    (hero, hub)
}

#[test]
fn begin_loading_issues_one_request_per_frame() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    assert_eq!(hero.status(), HeroStatus::Idle);
    let reqs = hero.begin_loading(Ok(manifest(5)));
    assert_eq!(reqs.len(), 5);
    assert_eq!(reqs[4].locator, "seq/hero_004.jpg");
    assert_eq!(hero.status(), HeroStatus::Loading { loaded: 0, total: 5 });
    assert_eq!(hero.region().unwrap().scroll_length, 50.0);
}

#[test]
fn never_draws_before_ready() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    let reqs = hero.begin_loading(Ok(manifest(3)));
    hero.activate(&hub, viewport(100.0, 100.0, 1.0)).unwrap();

    hero.on_frame_loaded(reqs[0].index, Ok(solid_frame(4, 4))).unwrap();
    hero.on_scroll(20.0).unwrap();
    hero.on_resize(viewport(200.0, 100.0, 1.0)).unwrap();
    hero.tick(0.1).unwrap();
    assert_eq!(hero.redraw().unwrap(), None);
    assert_eq!(hero.draw_count(), 0);
    assert!(hero.surface().draws().is_empty());
    assert_eq!(hero.status(), HeroStatus::Loading { loaded: 1, total: 3 });

    hero.on_frame_loaded(reqs[1].index, Err(ScrubError::decode("x")))
        .unwrap();
    hero.on_frame_loaded(reqs[2].index, Ok(solid_frame(4, 4))).unwrap();
    assert_eq!(hero.status(), HeroStatus::Ready);
    // scroll 20 of 30 => progress 2/3 => value 4/3 => frame 1, which failed to load
    assert_eq!(hero.draw_count(), 1);
    assert!(hero.surface().draws().is_empty());
    assert_eq!(hero.scrub_value(), Some(4.0 / 3.0));
}

#[test]
fn ready_draws_current_scroll_position_when_active() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    let reqs = hero.begin_loading(Ok(manifest(11)));
    hero.activate(&hub, viewport(100.0, 100.0, 1.0)).unwrap();
    hero.on_scroll(55.0).unwrap();
    for r in reqs {
        hero.on_frame_loaded(r.index, Ok(solid_frame(4, 4))).unwrap();
    }
    assert_eq!(hero.surface().draws(), vec![FrameIndex(5)]);
}

#[test]
fn scroll_maps_progress_to_frames() {
    let (mut hero, _hub) = ready_hero(11, &[]);
    hero.on_scroll(0.0).unwrap();
    assert!(hero.surface().draws().is_empty());
    hero.on_scroll(110.0).unwrap();
    hero.on_scroll(44.0).unwrap();
    hero.on_scroll(-10.0).unwrap();
    hero.on_scroll(10_000.0).unwrap();
    assert_eq!(
        hero.surface().draws(),
        vec![FrameIndex(10), FrameIndex(4), FrameIndex(0), FrameIndex(10)]
    );
}

#[test]
fn resize_redraws_once_at_current_frame() {
    let (mut hero, _hub) = ready_hero(11, &[]);
    hero.on_scroll(70.0).unwrap();
    hero.surface_mut().calls.clear();
    let before = hero.draw_count();

    hero.on_resize(viewport(375.0, 812.0, 3.0)).unwrap();
    assert_eq!(hero.draw_count(), before + 1);
    assert_eq!(hero.surface().backing_size(), Some((1125, 2436)));
    assert_eq!(hero.surface().draws(), vec![FrameIndex(6)]);
    assert!(matches!(hero.surface().calls[0], Call::Resize(_)));
}

#[test]
fn missing_frame_leaves_surface_untouched() {
    let (mut hero, _hub) = ready_hero(5, &[2]);
    hero.on_scroll(10.0).unwrap();
    let before = hero.surface().calls.clone();
    hero.on_scroll(25.0).unwrap();
    assert_eq!(hero.surface().calls, before);
    assert_eq!(
        hero.redraw().unwrap(),
        Some(DrawOutcome::Skipped(SkipReason::MissingFrame(FrameIndex(2))))
    );
}

#[test]
fn manifest_failure_is_unavailable_and_inert() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    let reqs = hero.begin_loading(Err(ScrubError::manifest("fetch failed")));
    assert!(reqs.is_empty());
    assert!(matches!(hero.status(), HeroStatus::Unavailable(r) if r.contains("fetch failed")));

    hero.activate(&hub, viewport(100.0, 100.0, 1.0)).unwrap();
    hero.on_scroll(50.0).unwrap();
    hero.on_frame_loaded(0, Ok(solid_frame(4, 4))).unwrap();
    assert_eq!(hero.draw_count(), 0);
    assert!(matches!(hero.status(), HeroStatus::Unavailable(_)));
}

#[test]
fn zero_frame_manifest_is_unavailable() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    assert!(hero.begin_loading(Ok(manifest(0))).is_empty());
    assert!(matches!(hero.status(), HeroStatus::Unavailable(r) if r.contains("frameCount")));
    assert_eq!(hero.region(), None);
}

#[test]
fn activation_attaches_and_deactivation_releases_listeners() {
    let (mut hero, hub) = ready_hero(3, &[]);
    assert!(hero.is_active());
    assert!(hub.is_listening(EventKind::Scroll));
    assert!(hub.is_listening(EventKind::Resize));
    assert!(hero.activate(&hub, viewport(1.0, 1.0, 1.0)).is_err());

    hero.deactivate();
    assert!(!hero.is_active());
    assert_eq!(hub.listener_count(), 0);

    hero.handle(&HostEvent::Scroll { scroll_y: 30.0 }).unwrap();
    assert_eq!(hero.redraw().unwrap(), None);
    assert!(hero.surface().draws().is_empty());
}

#[test]
fn completions_after_teardown_have_no_effect() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    hero.begin_loading(Ok(manifest(1)));
    hero.activate(&hub, viewport(10.0, 10.0, 1.0)).unwrap();
    hero.deactivate();
    hero.on_frame_loaded(0, Ok(solid_frame(2, 2))).unwrap();
    assert_eq!(hero.status(), HeroStatus::Loading { loaded: 0, total: 1 });
    assert_eq!(hero.draw_count(), 0);
}

#[test]
fn torn_down_hero_refuses_a_second_mount() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    hero.begin_loading(Ok(manifest(2)));
    hero.activate(&hub, viewport(10.0, 10.0, 1.0)).unwrap();
    hero.on_frame_loaded(0, Ok(solid_frame(2, 2))).unwrap();
    hero.deactivate();

    let err = hero.activate(&hub, viewport(10.0, 10.0, 1.0)).unwrap_err();
    assert!(matches!(err, ScrubError::Validation(_)), "{err}");
    assert!(!hero.is_active());
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn failed_activation_attaches_nothing() {
    let mut hero = ScrollHero::new(instant_config(), RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    hero.begin_loading(Ok(manifest(2)));

    let bad = Viewport {
        css_width: 100.0,
        css_height: 100.0,
        dpr: 0.0,
    };
    assert!(hero.activate(&hub, bad).is_err());
    assert!(!hero.is_active());
    assert_eq!(hub.listener_count(), 0);

    hero.activate(&hub, viewport(100.0, 100.0, 1.0)).unwrap();
    assert!(hero.is_active());
    assert_eq!(hub.listener_count(), 2);
}

#[test]
fn handle_routes_attached_events() {
    let (mut hero, _hub) = ready_hero(11, &[]);
    hero.handle(&HostEvent::Scroll { scroll_y: 30.0 }).unwrap();
    hero.handle(&HostEvent::Resize(viewport(400.0, 300.0, 2.0)))
        .unwrap();
    assert_eq!(hero.surface().draws(), vec![FrameIndex(3), FrameIndex(3)]);
    assert_eq!(hero.surface().backing_size(), Some((800, 600)));
}

#[test]
fn smoothed_scrub_requests_frames_only_while_settling() {
    let cfg = HeroConfig {
        scrub: Scrub::Smoothed { lag_secs: 0.25 },
        ..instant_config()
    };
    let mut hero = ScrollHero::new(cfg, RecordingSurface::default()).unwrap();
    let hub = EventHub::new();
    for r in hero.begin_loading(Ok(manifest(21))) {
        hero.on_frame_loaded(r.index, Ok(solid_frame(4, 4))).unwrap();
    }
    hero.activate(&hub, viewport(100.0, 100.0, 1.0)).unwrap();
    assert!(!hub.is_listening(EventKind::AnimationFrame));

    hero.handle(&HostEvent::Scroll { scroll_y: 210.0 }).unwrap();
    assert!(hub.is_listening(EventKind::AnimationFrame));
    let draws_after_scroll = hero.draw_count();

    let mut ticks = 0;
    while hub.is_listening(EventKind::AnimationFrame) {
        hero.handle(&HostEvent::AnimationFrame { dt_secs: 1.0 / 60.0 })
            .unwrap();
        ticks += 1;
        assert!(ticks < 10_000);
    }
    assert_eq!(hero.scrub_value(), Some(20.0));
    assert_eq!(hero.draw_count(), draws_after_scroll + ticks);

    let draws = hero.surface().draws();
    assert!(draws.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(draws.last(), Some(&FrameIndex(20)));

    hero.handle(&HostEvent::AnimationFrame { dt_secs: 1.0 / 60.0 })
        .unwrap();
    assert_eq!(hero.draw_count(), draws_after_scroll + ticks);
}

#[test]
fn new_rejects_invalid_config() {
    let cfg = HeroConfig {
        bias_x: -0.1,
        ..HeroConfig::default()
    };
    assert!(ScrollHero::new(cfg, RecordingSurface::default()).is_err());
}
