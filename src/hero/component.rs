use crate::{
    animation::scrub::{PinnedRegion, Scrubber},
    foundation::{
        config::HeroConfig,
        core::Viewport,
        error::{ScrubError, ScrubResult},
    },
    hero::events::{EventHub, EventKind, HostEvent, Listener},
    render::{
        compositor::{Compositor, DrawOutcome},
        surface::Surface,
    },
    sequence::{
        decode::PreparedFrame,
        loader::{FrameRequest, FrameSet, LoadTracker, SequenceLoader, frame_requests},
        manifest::SequenceManifest,
        source::FrameSource,
    },
};

/// Externally visible state of the hero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeroStatus {
    /// No manifest has been supplied yet.
    Idle,
    /// Frames are still settling.
    Loading {
        /// Loads settled so far (success or failure).
        loaded: usize,
        /// Total frame loads issued.
        total: usize,
    },
    /// Every frame load has settled; scrolling draws frames.
    Ready,
    /// The manifest could not be used. Behaves like loading, but never advances.
    Unavailable(String),
}

enum Phase {
    Idle,
    Loading(LoadTracker),
    Ready(FrameSet),
    Unavailable(String),
}

struct Timeline {
    region: PinnedRegion,
    scrubber: Scrubber,
}

struct Attachment {
    hub: EventHub,
    listeners: Vec<Listener>,
    animation_frame: Option<Listener>,
}

/// Scroll-scrubbed image-sequence hero.
///
/// Owns the frame set, the scrub value (single writer), the compositor and the canvas
/// surface. All methods run on the host's UI thread.
pub struct ScrollHero<S> {
    config: HeroConfig,
    compositor: Compositor,
    surface: S,
    phase: Phase,
    timeline: Option<Timeline>,
    attachment: Option<Attachment>,
    torn_down: bool,
    scroll_y: f64,
    draws: usize,
}

impl<S: Surface> ScrollHero<S> {
    /// Create a hero drawing into `surface`.
    pub fn new(config: HeroConfig, surface: S) -> ScrubResult<Self> {
        config.validate()?;
        Ok(Self {
            compositor: Compositor::from_config(&config),
            config,
            surface,
            phase: Phase::Idle,
            timeline: None,
            attachment: None,
            torn_down: false,
            scroll_y: 0.0,
            draws: 0,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &HeroConfig {
        &self.config
    }

    /// Drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable drawing surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Current lifecycle status.
    pub fn status(&self) -> HeroStatus {
        match &self.phase {
            Phase::Idle => HeroStatus::Idle,
            Phase::Loading(tracker) => HeroStatus::Loading {
                loaded: tracker.completed(),
                total: tracker.expected(),
            },
            Phase::Ready(_) => HeroStatus::Ready,
            Phase::Unavailable(reason) => HeroStatus::Unavailable(reason.clone()),
        }
    }

    /// Loaded frames, once ready.
    pub fn frames(&self) -> Option<&FrameSet> {
        match &self.phase {
            Phase::Ready(frames) => Some(frames),
            _ => None,
        }
    }

    /// Pinned scroll region, once a manifest is known.
    pub fn region(&self) -> Option<PinnedRegion> {
        self.timeline.as_ref().map(|t| t.region)
    }

    /// Current scrub value, once a manifest is known.
    pub fn scrub_value(&self) -> Option<f64> {
        self.timeline.as_ref().map(|t| t.scrubber.value())
    }

    /// Number of compositor invocations so far.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Whether listeners are attached.
    pub fn is_active(&self) -> bool {
        self.attachment.is_some()
    }

    /// Start loading from a manifest fetch outcome; returns the frame loads to issue.
    ///
    /// A failed fetch or an unusable manifest is logged and leaves the hero
    /// [`HeroStatus::Unavailable`]; no requests are returned.
    pub fn begin_loading(
        &mut self,
        manifest: ScrubResult<SequenceManifest>,
    ) -> Vec<FrameRequest> {
        let manifest = match manifest.and_then(|m| m.validate().map(|()| m)) {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(
                    manifest = %self.config.manifest_path,
                    error = %err,
                    "sequence manifest unavailable"
                );
                self.phase = Phase::Unavailable(err.to_string());
                self.timeline = None;
                return Vec::new();
            }
        };

        let requests = frame_requests(&manifest, &self.config.manifest_path);
        self.timeline = Some(Timeline {
            region: PinnedRegion::for_frames(
                manifest.len(),
                self.config.scrub_distance,
                self.config.pin_top,
            ),
            scrubber: Scrubber::new(manifest.len(), self.config.scrub, self.config.ease),
        });
        self.phase = Phase::Loading(LoadTracker::new(requests.len()));
        tracing::info!(frames = requests.len(), "loading sequence");
        requests
    }

    /// Record a frame-load completion.
    ///
    /// Completions outside the loading phase, or after [`ScrollHero::deactivate`], are
    /// ignored. When the last load settles the hero becomes ready and, if active, draws
    /// the frame for the current scroll position.
    pub fn on_frame_loaded(
        &mut self,
        index: usize,
        outcome: ScrubResult<PreparedFrame>,
    ) -> ScrubResult<()> {
        if self.torn_down {
            return Ok(());
        }
        let Phase::Loading(tracker) = &mut self.phase else {
            return Ok(());
        };
        let Some(frames) = tracker.complete(index, outcome) else {
            return Ok(());
        };
        self.phase = Phase::Ready(frames);

        let progress = self.progress();
        if let Some(t) = self.timeline.as_mut() {
            t.scrubber.snap_to(progress);
        }
        if self.is_active() {
            self.redraw()?;
        }
        Ok(())
    }

    /// Fetch the configured manifest through `loader` and load every frame.
    ///
    /// Draw errors raised while completions are applied are logged and the first one
    /// is returned after loading finishes.
    pub fn load_with<F: FrameSource>(
        &mut self,
        loader: &SequenceLoader<F>,
    ) -> ScrubResult<HeroStatus> {
        let manifest = loader.fetch_manifest(&self.config.manifest_path);
        let requests = self.begin_loading(manifest);
        let mut first_err = None;
        loader.load(&requests, |index, outcome| {
            if let Err(err) = self.on_frame_loaded(index, outcome) {
                tracing::warn!(index, error = %err, "draw after load failed");
                first_err.get_or_insert(err);
            }
        });
        match first_err {
            Some(err) => Err(err),
            None => Ok(self.status()),
        }
    }

    /// Size the surface, attach scroll and resize listeners, and draw once.
    ///
    /// Listeners are attached only once the surface accepted `viewport`; on any error
    /// the hero is left inactive. A hero is mounted at most once: after
    /// [`ScrollHero::deactivate`] create a new hero for the next mount.
    pub fn activate(&mut self, hub: &EventHub, viewport: Viewport) -> ScrubResult<()> {
        if self.attachment.is_some() {
            return Err(ScrubError::validation("hero is already active"));
        }
        if self.torn_down {
            return Err(ScrubError::validation(
                "hero was torn down; create a new hero per mount",
            ));
        }
        self.surface.resize(viewport)?;
        self.attachment = Some(Attachment {
            hub: hub.clone(),
            listeners: vec![hub.listen(EventKind::Scroll), hub.listen(EventKind::Resize)],
            animation_frame: None,
        });
        self.sync_animation_frame();
        if let Err(err) = self.redraw() {
            self.attachment = None;
            return Err(err);
        }
        Ok(())
    }

    /// Detach every listener. Later events and load completions have no effect, and
    /// the hero cannot be activated again.
    pub fn deactivate(&mut self) {
        self.attachment = None;
        self.torn_down = true;
    }

    /// Route a host event, honouring which listeners are attached.
    pub fn handle(&mut self, event: &HostEvent) -> ScrubResult<()> {
        if !self.listens_for(event.kind()) {
            return Ok(());
        }
        match *event {
            HostEvent::Scroll { scroll_y } => self.on_scroll(scroll_y),
            HostEvent::Resize(viewport) => self.on_resize(viewport),
            HostEvent::AnimationFrame { dt_secs } => self.tick(dt_secs),
        }
    }

    /// Apply a new scroll offset.
    pub fn on_scroll(&mut self, scroll_y: f64) -> ScrubResult<()> {
        if scroll_y.is_finite() {
            self.scroll_y = scroll_y;
        }
        if !matches!(self.phase, Phase::Ready(_)) {
            return Ok(());
        }
        let progress = self.progress();
        let changed = self
            .timeline
            .as_mut()
            .and_then(|t| t.scrubber.set_progress(progress));
        self.sync_animation_frame();
        if changed.is_some() {
            self.redraw()?;
        }
        Ok(())
    }

    /// Advance scrub smoothing; draws only when the value moved.
    pub fn tick(&mut self, dt_secs: f64) -> ScrubResult<()> {
        if !matches!(self.phase, Phase::Ready(_)) {
            return Ok(());
        }
        let changed = self
            .timeline
            .as_mut()
            .and_then(|t| t.scrubber.tick(dt_secs));
        self.sync_animation_frame();
        if changed.is_some() {
            self.redraw()?;
        }
        Ok(())
    }

    /// Resize the surface and redraw the current frame at the new resolution.
    pub fn on_resize(&mut self, viewport: Viewport) -> ScrubResult<()> {
        self.surface.resize(viewport)?;
        if matches!(self.phase, Phase::Ready(_)) {
            self.redraw()?;
        }
        Ok(())
    }

    /// Invoke the compositor with the current scrub value. No-op until ready and after
    /// teardown.
    pub fn redraw(&mut self) -> ScrubResult<Option<DrawOutcome>> {
        if self.torn_down {
            return Ok(None);
        }
        let (Phase::Ready(frames), Some(t)) = (&self.phase, &self.timeline) else {
            return Ok(None);
        };
        self.draws += 1;
        let outcome = self
            .compositor
            .draw(&mut self.surface, frames, t.scrubber.value())?;
        Ok(Some(outcome))
    }

    fn progress(&self) -> f64 {
        self.timeline
            .as_ref()
            .map(|t| t.region.progress(self.scroll_y))
            .unwrap_or(0.0)
    }

    fn listens_for(&self, kind: EventKind) -> bool {
        let Some(a) = &self.attachment else {
            return false;
        };
        a.listeners.iter().any(|l| l.kind() == kind)
            || a.animation_frame.as_ref().is_some_and(|l| l.kind() == kind)
    }

    fn sync_animation_frame(&mut self) {
        let settling = self
            .timeline
            .as_ref()
            .is_some_and(|t| t.scrubber.is_settling());
        let Some(a) = self.attachment.as_mut() else {
            return;
        };
        match (settling, a.animation_frame.is_some()) {
            (true, false) => a.animation_frame = Some(a.hub.listen(EventKind::AnimationFrame)),
            (false, true) => a.animation_frame = None,
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/hero/component.rs"]
mod tests;
