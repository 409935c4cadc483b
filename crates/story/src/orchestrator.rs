use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::timers::Scope;

use crate::action::Action;
use crate::chapter::{ChapterHook, ChapterRegistry, HookContext, HookOutcome, LayerToggle};
use crate::choreography::{ChapterContext, Stage};
use crate::error::StoryError;
use crate::surface::MoveCompletion;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Transitioning,
}

/// What happened to a step-entered request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Started,
    /// Started after cutting short an in-flight transition (fast path).
    Preempted,
    AlreadyCurrent,
    /// A transition was in flight; the request was discarded, not queued.
    Dropped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    /// Exit hooks of the previous chapter are settling.
    Exiting,
    /// Waiting for the camera move to finish.
    Camera,
    /// Enter hooks of the target chapter are settling.
    Entering,
}

#[derive(Debug)]
struct Transition {
    generation: u64,
    target: ChapterId,
    phase: Phase,
    started: Millis,
    scope: Scope,
}

/// Serializes chapter changes.
///
/// Transition order is fixed: exit of the current chapter (awaited), then
/// captions and camera (awaited), then enter of the target (awaited), then
/// the chapter counts as settled. Continuations are tagged with the
/// transition generation, so a preempted or finished transition can never be
/// resumed by a late timer.
#[derive(Debug, Default)]
pub struct Orchestrator {
    active: Option<ChapterContext>,
    transition: Option<Transition>,
    next_generation: u64,
    next_epoch: u64,
    settled: Vec<ChapterId>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransitionState {
        if self.transition.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Idle
        }
    }

    pub fn current(&self) -> Option<&ChapterId> {
        self.active.as_ref().map(|a| &a.chapter)
    }

    /// Target of the transition in flight, if any.
    pub fn pending(&self) -> Option<&ChapterId> {
        self.transition.as_ref().map(|t| &t.target)
    }

    pub fn active(&self) -> Option<&ChapterContext> {
        self.active.as_ref()
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ChapterContext> {
        self.active.as_mut()
    }

    /// Chapters whose transitions completed since the last call.
    pub(crate) fn take_settled(&mut self) -> Vec<ChapterId> {
        std::mem::take(&mut self.settled)
    }

    pub(crate) fn request(
        &mut self,
        id: ChapterId,
        registry: &mut ChapterRegistry,
        stage: &mut Stage<'_>,
    ) -> Result<StepOutcome, StoryError> {
        let Some(chapter) = registry.get(&id) else {
            tracing::warn!(chapter = %id, "step entered for unregistered chapter");
            stage.metrics.inc("transitions.rejected");
            return Err(StoryError::UnknownChapter(id));
        };

        let mut preempted = false;
        if let Some(t) = &self.transition {
            let elapsed = stage.event_loop.now().since(t.started);
            let may_preempt = chapter.fast_path
                && t.target != id
                && elapsed >= stage.config.fast_path_guard_ms;
            if !may_preempt {
                tracing::debug!(chapter = %id, in_flight = %t.target, elapsed, "transition in flight; dropping step");
                stage.metrics.inc("transitions.dropped");
                return Ok(StepOutcome::Dropped);
            }
            tracing::info!(chapter = %id, in_flight = %t.target, elapsed, "fast path preempts transition");
            stage.metrics.inc("transitions.preempted");
            self.abort(stage);
            preempted = true;
        } else if self.current() == Some(&id) {
            stage.metrics.inc("transitions.ignored");
            return Ok(StepOutcome::AlreadyCurrent);
        }

        self.begin(id, registry, stage);
        Ok(if preempted {
            StepOutcome::Preempted
        } else {
            StepOutcome::Started
        })
    }

    /// Continues a transition after an awaited step settled.
    pub(crate) fn resume(
        &mut self,
        generation: u64,
        registry: &mut ChapterRegistry,
        stage: &mut Stage<'_>,
    ) {
        let Some(phase) = self.phase_of(generation) else {
            tracing::trace!(generation, "stale transition continuation");
            return;
        };
        match phase {
            Phase::Exiting => self.begin_enter(registry, stage, false),
            Phase::Camera => self.finish_enter(registry, stage, false),
            Phase::Entering => self.complete(stage),
        }
    }

    /// Forces a stuck transition through its remaining steps.
    pub(crate) fn timeout(
        &mut self,
        generation: u64,
        registry: &mut ChapterRegistry,
        stage: &mut Stage<'_>,
    ) {
        let Some(phase) = self.phase_of(generation) else {
            return;
        };
        tracing::error!(
            chapter = ?self.pending(),
            ?phase,
            timeout_ms = stage.config.transition_timeout_ms,
            "transition timed out; forcing completion"
        );
        stage.metrics.inc("transitions.timed_out");
        match phase {
            Phase::Exiting => self.begin_enter(registry, stage, true),
            Phase::Camera => self.finish_enter(registry, stage, true),
            Phase::Entering => self.complete(stage),
        }
    }

    /// The host reports that the camera move has finished.
    pub(crate) fn viewport_settled(&mut self, registry: &mut ChapterRegistry, stage: &mut Stage<'_>) {
        match self.transition.as_ref().map(|t| t.phase) {
            Some(Phase::Camera) => self.finish_enter(registry, stage, false),
            _ => tracing::trace!("viewport settled outside a camera wait"),
        }
    }

    fn phase_of(&self, generation: u64) -> Option<Phase> {
        self.transition
            .as_ref()
            .filter(|t| t.generation == generation)
            .map(|t| t.phase)
    }

    fn begin(&mut self, id: ChapterId, registry: &mut ChapterRegistry, stage: &mut Stage<'_>) {
        let generation = self.next_generation;
        self.next_generation += 1;
        let scope = stage.event_loop.new_scope();
        stage.event_loop.schedule(
            stage.config.transition_timeout_ms,
            scope,
            Action::TransitionTimeout { generation },
        );

        tracing::debug!(from = ?self.current(), to = %id, "transition started");
        stage.metrics.inc("transitions.started");
        self.transition = Some(Transition {
            generation,
            target: id,
            phase: Phase::Exiting,
            started: stage.event_loop.now(),
            scope,
        });

        let wait = self.run_exit(registry, stage);
        if wait > 0 {
            self.wait(wait, stage);
        } else {
            self.begin_enter(registry, stage, false);
        }
    }

    fn run_exit(&mut self, registry: &mut ChapterRegistry, stage: &mut Stage<'_>) -> u64 {
        let Some(active) = self.active.as_mut().filter(|a| !a.exited) else {
            return 0;
        };
        active.exited = true;
        active.clear(stage);
        let Some(chapter) = registry.get_mut(&active.chapter) else {
            return 0;
        };
        apply_toggles(&chapter.on_exit, &chapter.id, stage);
        run_hooks(&mut chapter.exit_hooks, &chapter.id, stage)
    }

    fn begin_enter(&mut self, registry: &mut ChapterRegistry, stage: &mut Stage<'_>, force: bool) {
        let Some(target) = self.transition.as_ref().map(|t| t.target.clone()) else {
            return;
        };
        let Some(chapter) = registry.get(&target) else {
            self.complete(stage);
            return;
        };

        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let scope = stage.event_loop.new_scope();
        self.active = Some(ChapterContext::new(target.clone(), epoch, scope));

        if let Err(e) = stage.map.set_captions(&chapter.legend, &chapter.date_range) {
            tracing::error!(chapter = %target, error = %e, "failed to update captions");
            stage.metrics.inc("surface.errors");
        }

        let completion = match stage.map.set_viewport(&chapter.camera, stage.config.camera_ms) {
            Ok(completion) => completion,
            Err(e) => {
                tracing::error!(chapter = %target, error = %e, "camera move failed");
                stage.metrics.inc("surface.errors");
                MoveCompletion::Immediate
            }
        };

        match completion {
            MoveCompletion::AfterMs(ms) if !force && ms > 0 => {
                self.set_phase(Phase::Camera);
                self.wait(ms, stage);
            }
            MoveCompletion::External if !force => self.set_phase(Phase::Camera),
            _ => self.finish_enter(registry, stage, force),
        }
    }

    fn finish_enter(&mut self, registry: &mut ChapterRegistry, stage: &mut Stage<'_>, force: bool) {
        self.set_phase(Phase::Entering);
        let wait = match (self.active.as_mut(), self.transition.as_ref()) {
            (Some(active), Some(t)) if active.chapter == t.target => {
                match registry.get_mut(&active.chapter) {
                    Some(chapter) => {
                        apply_toggles(&chapter.on_enter, &chapter.id, stage);
                        active.animate(&chapter.script, stage);
                        run_hooks(&mut chapter.enter_hooks, &chapter.id, stage)
                    }
                    None => 0,
                }
            }
            _ => 0,
        };

        if wait > 0 && !force {
            self.wait(wait, stage);
        } else {
            self.complete(stage);
        }
    }

    fn complete(&mut self, stage: &mut Stage<'_>) {
        let Some(t) = self.transition.take() else {
            return;
        };
        stage.event_loop.cancel_scope(t.scope);
        let elapsed = stage.event_loop.now().since(t.started);
        stage.metrics.inc("transitions.completed");
        stage.metrics.record("transition.duration_ms", elapsed);
        tracing::info!(chapter = %t.target, elapsed_ms = elapsed, "chapter entered");
        self.settled.push(t.target);
    }

    fn abort(&mut self, stage: &mut Stage<'_>) {
        if let Some(t) = self.transition.take() {
            stage.event_loop.cancel_scope(t.scope);
        }
    }

    fn wait(&mut self, ms: u64, stage: &mut Stage<'_>) {
        let Some(t) = self.transition.as_ref() else {
            return;
        };
        stage.event_loop.schedule(
            ms,
            t.scope,
            Action::ResumeTransition {
                generation: t.generation,
            },
        );
    }

    fn set_phase(&mut self, phase: Phase) {
        if let Some(t) = self.transition.as_mut() {
            t.phase = phase;
        }
    }
}

fn apply_toggles(toggles: &[LayerToggle], chapter: &ChapterId, stage: &mut Stage<'_>) {
    for toggle in toggles {
        if let Err(e) = stage.map.set_layer_visible(&toggle.layer, toggle.visible) {
            tracing::error!(%chapter, layer = %toggle.layer, error = %e, "layer toggle failed");
            stage.metrics.inc("hooks.failed");
        }
    }
}

/// Runs hooks in order and returns the longest wait any of them asked for.
/// A failing hook is logged and counted; the rest still run.
fn run_hooks(hooks: &mut [Box<dyn ChapterHook>], chapter: &ChapterId, stage: &mut Stage<'_>) -> u64 {
    let mut wait = 0;
    for hook in hooks {
        let mut ctx = HookContext {
            chapter,
            now: stage.event_loop.now(),
            map: &mut *stage.map,
        };
        match hook.run(&mut ctx) {
            Ok(HookOutcome::Done) => {}
            Ok(HookOutcome::Await(ms)) => wait = wait.max(ms),
            Err(e) => {
                tracing::error!(%chapter, ?hook, error = %e, "chapter hook failed");
                stage.metrics.inc("hooks.failed");
            }
        }
    }
    wait
}
