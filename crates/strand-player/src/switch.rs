//! Renderer switch coordinator
//!
//! Owns the live backend and the transitions between "no working
//! backend" and "ready backend bound to the chosen source". Selection
//! walks sources-then-renderers, preferring the current backend so
//! routine source advancement never tears markup down. Teardown is
//! fully synchronous before the next backend is constructed; there is
//! never more than one in-flight backend per player.

use std::collections::HashSet;

use strand_backend::{
    Backend, BackendConfig, Notice, NoticeQueue, RendererId, RendererRegistry, ReplaceOutcome,
};
use strand_page::{NodeId, Page};

use crate::events::{kinds, EventHub};
use crate::source::Source;

/// Delay between script-availability retries (virtual milliseconds)
pub const SCRIPT_RETRY_MS: u64 = 200;

/// Retries before a missing backend script is reported
pub const SCRIPT_RETRY_LIMIT: u32 = 25;

/// Coordinator / facade lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    NoRenderer,
    Binding,
    Ready,
    Destroyed,
}

/// Outcome of a selection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The current backend still qualifies; only its src changed
    KeptCurrent { source: usize },
    /// A new backend was constructed for this pair
    Switched { source: usize, renderer: RendererId },
    /// No (source, renderer) pair works
    NoneAvailable,
}

struct ScriptWait {
    anchor: Option<NodeId>,
    attempts: u32,
    next_due_ms: u64,
}

/// The switch state machine
pub struct Coordinator {
    player_id: String,
    state: PlayerState,
    backend: Option<Box<dyn Backend>>,
    attached: HashSet<String>,
    waiting: Option<ScriptWait>,
    /// Bumped per switch; readiness notices from older backends carry
    /// a stale value and are discarded
    generation: u64,
}

impl Coordinator {
    pub fn new(player_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            state: PlayerState::NoRenderer,
            backend: None,
            attached: HashSet::new(),
            waiting: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn backend(&self) -> Option<&dyn Backend> {
        self.backend.as_deref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut dyn Backend> {
        self.backend.as_mut().map(|b| b.as_mut() as &mut dyn Backend)
    }

    pub fn current_renderer(&self) -> Option<RendererId> {
        self.backend.as_ref().map(|b| b.kind_id())
    }

    /// Select a (source, renderer) pair and bind it
    #[allow(clippy::too_many_arguments)]
    pub fn select_and_bind(
        &mut self,
        page: &mut Page,
        sources: &mut [Source],
        registry: &RendererRegistry,
        config: &BackendConfig,
        anchor: Option<NodeId>,
        hub: &mut EventHub,
        notices: &NoticeQueue,
        now_ms: u64,
    ) -> Selection {
        // Fast path: the current backend keeps serving if any source
        // still suits it. No teardown, no markup churn.
        if let Some(backend) = self.backend.as_mut() {
            let current = backend.kind_id();
            for (idx, source) in sources.iter_mut().enumerate() {
                let verdict = match source.cached(current) {
                    Some(v) => v,
                    None => match registry.find(current) {
                        Some(kind) => source.verdict_for(kind.as_ref()),
                        None => continue,
                    },
                };
                if verdict.is_playable() {
                    tracing::debug!(
                        player = %self.player_id,
                        renderer = %current,
                        src = %source.locator,
                        "current renderer kept, src updated"
                    );
                    let _ = backend.set("src", source.locator.as_str().into());
                    return Selection::KeptCurrent { source: idx };
                }
            }
        }

        // Walk sources then renderers; first non-empty verdict wins
        let current = self.current_renderer();
        let mut selected: Option<(usize, usize)> = None;
        'outer: for (s_idx, source) in sources.iter_mut().enumerate() {
            for (k_idx, kind) in registry.kinds().iter().enumerate() {
                if Some(kind.id()) == current {
                    continue; // already disqualified above
                }
                if source.verdict_for(kind.as_ref()).is_playable() {
                    selected = Some((s_idx, k_idx));
                    break 'outer;
                }
            }
        }

        let Some((s_idx, k_idx)) = selected else {
            tracing::warn!(player = %self.player_id, "no renderer available for any source");
            hub.trigger(kinds::NO_RENDERER, None);
            return Selection::NoneAvailable;
        };

        let kind = registry.kinds()[k_idx].clone();
        let renderer = kind.id();
        hub.trigger(kinds::RENDERER_CHANGING, None);

        // Synchronous teardown of the outgoing backend
        self.teardown(page);

        let mut merged = config.clone();
        merged.id = self.player_id.clone();
        merged.src = sources[s_idx].locator.clone();

        let mut backend = kind.build(merged, notices.clone());
        self.state = PlayerState::Binding;
        self.waiting = None;
        self.generation += 1;

        match backend.replace(page, anchor) {
            Ok(ReplaceOutcome::Mounted(_)) => {}
            Ok(ReplaceOutcome::WaitingForScript) => {
                tracing::debug!(player = %self.player_id, renderer = %renderer, "waiting for backend script");
                self.waiting = Some(ScriptWait {
                    anchor,
                    attempts: 0,
                    next_due_ms: now_ms + SCRIPT_RETRY_MS,
                });
            }
            Err(err) => {
                // The switch is abandoned, not left half-bound
                tracing::warn!(player = %self.player_id, error = %err, "backend mount failed");
                backend.destroy(page);
                self.state = PlayerState::NoRenderer;
                hub.trigger(kinds::NO_RENDERER, None);
                return Selection::NoneAvailable;
            }
        }

        // Registered after the mount so an immediately-ready backend
        // reports its real root
        let ready_notices = notices.clone();
        let ready_player = self.player_id.clone();
        let ready_generation = self.generation;
        backend.on_ready(Box::new(move |root| {
            ready_notices.push(Notice::Ready {
                player_id: ready_player,
                kind: renderer,
                generation: ready_generation,
                root,
            });
        }));
        self.backend = Some(backend);
        tracing::info!(
            player = %self.player_id,
            renderer = %renderer,
            src = %sources[s_idx].locator,
            "renderer switched"
        );
        Selection::Switched {
            source: s_idx,
            renderer,
        }
    }

    /// Drive the bounded script-availability retry loop
    pub fn tick(&mut self, page: &mut Page, now_ms: u64, hub: &mut EventHub) {
        let Some(wait) = self.waiting.as_mut() else {
            return;
        };
        if now_ms < wait.next_due_ms {
            return;
        }
        wait.attempts += 1;
        let anchor = wait.anchor;
        let attempts = wait.attempts;

        let outcome = self
            .backend
            .as_mut()
            .map(|b| b.replace(page, anchor));
        match outcome {
            Some(Ok(ReplaceOutcome::Mounted(_))) => {
                tracing::debug!(player = %self.player_id, attempts, "backend script arrived");
                self.waiting = None;
            }
            Some(Ok(ReplaceOutcome::WaitingForScript)) => {
                if attempts >= SCRIPT_RETRY_LIMIT {
                    tracing::warn!(player = %self.player_id, attempts, "backend script never loaded");
                    self.waiting = None;
                    self.teardown(page);
                    self.state = PlayerState::NoRenderer;
                    hub.trigger(kinds::SCRIPT_TIMEOUT, None);
                } else if let Some(wait) = self.waiting.as_mut() {
                    wait.next_due_ms = now_ms + SCRIPT_RETRY_MS;
                }
            }
            Some(Err(err)) => {
                tracing::warn!(player = %self.player_id, error = %err, "backend mount failed");
                self.waiting = None;
                self.teardown(page);
                self.state = PlayerState::NoRenderer;
                hub.trigger(kinds::NO_RENDERER, None);
            }
            None => {
                self.waiting = None;
            }
        }
    }

    /// Finish a readiness signal: re-attach every registered event
    /// type, then report ready. Handlers observe a fully wired backend.
    ///
    /// A notice stamped with an older generation comes from a backend
    /// that has since been torn down and must not mark its successor
    /// ready.
    pub fn complete_ready(
        &mut self,
        generation: u64,
        root: NodeId,
        hub: &mut EventHub,
    ) -> Option<NodeId> {
        if generation != self.generation {
            tracing::debug!(player = %self.player_id, "stale readiness notice discarded");
            return None;
        }
        let backend = self.backend.as_mut()?;
        for kind in hub.event_types() {
            backend.bind(&kind);
            self.attached.insert(kind);
        }
        self.state = PlayerState::Ready;
        hub.trigger(kinds::RENDERER_READY, None);
        root.is_valid().then_some(root)
    }

    /// Wire one event type through to the live backend
    pub fn attach_event(&mut self, kind: &str) {
        if let Some(backend) = self.backend.as_mut() {
            backend.bind(kind);
            self.attached.insert(kind.to_string());
        }
    }

    /// Unwire one event type
    pub fn detach_event(&mut self, kind: &str) {
        if let Some(backend) = self.backend.as_mut() {
            backend.unbind(kind);
        }
        self.attached.remove(kind);
    }

    /// Detach all listeners and destroy the backend (idempotent)
    pub fn teardown(&mut self, page: &mut Page) {
        if let Some(mut backend) = self.backend.take() {
            for kind in self.attached.drain() {
                backend.unbind(&kind);
            }
            backend.destroy(page);
            self.state = PlayerState::NoRenderer;
        }
        self.waiting = None;
    }

    /// Final teardown; the coordinator accepts no further work
    pub fn destroy(&mut self, page: &mut Page) {
        self.teardown(page);
        self.state = PlayerState::Destroyed;
    }
}
