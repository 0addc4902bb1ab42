//! Session controller.
//!
//! The single authority over a session's transitions. View events (toggle a
//! set, navigate, extend or skip rest, exit) come in; the controller mutates
//! `SessionState`, drives the rest timer, and reports completion once.
//!
//! Every guard here is a logged no-op rather than an error. View events and
//! timer ticks arrive in whatever order the user produces them, and a stale
//! event must never put the session into a bad state.

use crate::{
    Clock, CompletionReport, CompletionSink, Error, Exercise, Prescription, RestSnapshot,
    Result, SessionSettings, SessionState, SetKey, TimerEvent, WorkoutPlan,
};
use chrono::Utc;
use uuid::Uuid;

/// Result of `toggle_set`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Set marked done; a rest countdown was started (or, for a zero-second
    /// rest, `rest_event` reports it already expired)
    Completed { rest_event: Option<TimerEvent> },
    /// Set un-marked; the timer was left alone
    Uncompleted,
    /// Not the current exercise, or set index out of range
    Ignored,
}

/// Result of `go_to_next`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextOutcome {
    /// Moved to the exercise at this index
    Advanced(usize),
    /// The last exercise is done; the view should show the completion screen
    SessionComplete,
    /// Current exercise not finished yet
    Blocked,
}

/// What the exit confirmation needs to show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitRequest {
    pub sets_completed: usize,
}

/// Returned once a session has been abandoned and its state discarded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbandonedSession {
    pub plan_id: String,
    pub sets_discarded: usize,
}

/// Everything the view needs to render the current moment
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub plan_name: String,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub exercise: Exercise,
    pub sets: Vec<bool>,
    pub exercise_complete: bool,
    pub is_last: bool,
    pub rest: Option<RestSnapshot>,
    pub sets_completed: usize,
}

pub struct SessionController<S: CompletionSink> {
    plan: WorkoutPlan,
    state: SessionState,
    settings: SessionSettings,
    clock: Box<dyn Clock>,
    sink: S,
}

impl<S: CompletionSink> SessionController<S> {
    /// Start a session over `plan`
    ///
    /// Fails for a plan with no exercises, a plan that does not validate, or
    /// a zero `duration_total_sets`; each would let an exercise count as
    /// complete before any set is done.
    pub fn new(
        plan: WorkoutPlan,
        settings: SessionSettings,
        clock: Box<dyn Clock>,
        sink: S,
    ) -> Result<Self> {
        if plan.exercises.is_empty() {
            return Err(Error::Session(format!(
                "Plan '{}' has no exercises",
                plan.id
            )));
        }

        if settings.duration_total_sets == 0 {
            return Err(Error::Session(
                "duration_total_sets must be at least 1".into(),
            ));
        }

        // A set count of zero would make an exercise complete with no work done
        let errors = plan.validate();
        if !errors.is_empty() {
            return Err(Error::PlanValidation(errors.join("; ")));
        }

        tracing::info!(
            "Starting session for plan '{}' ({} exercises)",
            plan.id,
            plan.exercises.len()
        );

        Ok(Self {
            plan,
            state: SessionState::new(Utc::now()),
            settings,
            clock,
            sink,
        })
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn current_exercise_index(&self) -> usize {
        self.state.current_exercise_index
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.plan.exercises[self.state.current_exercise_index]
    }

    fn is_last(&self) -> bool {
        self.state.current_exercise_index + 1 == self.plan.exercises.len()
    }

    /// Completable units for an exercise
    ///
    /// Duration-based exercises have no natural set count and fall back to
    /// `duration_total_sets`.
    pub fn compute_total_sets(&self, exercise: &Exercise) -> usize {
        match &exercise.prescription {
            Prescription::SetBased { set_count, .. } => *set_count as usize,
            Prescription::DurationBased { .. } => self.settings.duration_total_sets as usize,
        }
    }

    pub fn is_exercise_complete(&self, exercise_index: usize) -> bool {
        let Some(exercise) = self.plan.exercises.get(exercise_index) else {
            return false;
        };
        let total = self.compute_total_sets(exercise);
        self.state.completed_count(exercise_index, total) == total
    }

    /// Flip a set of the current exercise
    ///
    /// Marking a set done starts the rest countdown for the current
    /// exercise; un-marking never touches the timer.
    pub fn toggle_set(&mut self, exercise_index: usize, set_index: usize) -> ToggleOutcome {
        if exercise_index != self.state.current_exercise_index {
            tracing::debug!(
                "Ignoring toggle for exercise {} (current is {})",
                exercise_index,
                self.state.current_exercise_index
            );
            return ToggleOutcome::Ignored;
        }

        let exercise = self.current_exercise();
        let total = self.compute_total_sets(exercise);
        if set_index >= total {
            tracing::debug!(
                "Ignoring toggle for set {} of '{}' ({} sets)",
                set_index,
                exercise.id,
                total
            );
            return ToggleOutcome::Ignored;
        }
        let rest_seconds = exercise.prescription.rest_seconds();

        let completed = self.state.flip(SetKey::new(exercise_index, set_index));
        if !completed {
            tracing::debug!("Set {} of exercise {} un-marked", set_index, exercise_index);
            return ToggleOutcome::Uncompleted;
        }

        tracing::debug!("Set {} of exercise {} completed", set_index, exercise_index);
        let now = self.clock.now();
        let rest_event = self.state.rest_timer.start(rest_seconds, now);
        ToggleOutcome::Completed { rest_event }
    }

    /// Advance to the next exercise, or finish the session from the last one
    ///
    /// A rest countdown still running is left alone. Completion is reported
    /// at most once no matter how often this is called on the last exercise.
    pub fn go_to_next(&mut self) -> NextOutcome {
        let current = self.state.current_exercise_index;
        if !self.is_exercise_complete(current) {
            tracing::debug!("Ignoring next: exercise {} is incomplete", current);
            return NextOutcome::Blocked;
        }

        if !self.is_last() {
            self.state.current_exercise_index += 1;
            tracing::debug!("Advanced to exercise {}", self.state.current_exercise_index);
            return NextOutcome::Advanced(self.state.current_exercise_index);
        }

        if !self.state.completion_reported {
            self.state.completion_reported = true;
            let report = self.completion_report();
            tracing::info!(
                "Session for plan '{}' complete ({} sets)",
                report.plan_id,
                report.sets_completed
            );
            self.sink.send(report);
        }

        NextOutcome::SessionComplete
    }

    /// Step back one exercise; completed sets and rest are untouched
    pub fn go_to_previous(&mut self) -> bool {
        if self.state.current_exercise_index == 0 {
            tracing::debug!("Ignoring previous at first exercise");
            return false;
        }
        self.state.current_exercise_index -= 1;
        true
    }

    pub fn extend_rest(&mut self, seconds: u32) -> bool {
        self.state.rest_timer.extend(seconds)
    }

    /// Extend the rest by the configured step
    pub fn extend_rest_default(&mut self) -> bool {
        self.extend_rest(self.settings.extend_seconds)
    }

    pub fn skip_rest(&mut self) -> Option<TimerEvent> {
        self.state.rest_timer.skip()
    }

    /// Deliver any rest-timer ticks that have come due
    pub fn poll(&mut self) -> Option<TimerEvent> {
        let now = self.clock.now();
        self.state.rest_timer.poll(now)
    }

    /// The user asked to leave; nothing is discarded yet
    pub fn request_exit(&self) -> ExitRequest {
        ExitRequest {
            sets_completed: self.state.total_completed(),
        }
    }

    /// The user backed out of the exit dialog
    pub fn cancel_exit(&self) {
        tracing::debug!("Exit cancelled");
    }

    /// Abandon the session, dropping all progress
    pub fn confirm_exit(mut self) -> AbandonedSession {
        self.state.rest_timer.cancel();
        let abandoned = AbandonedSession {
            plan_id: self.plan.id.clone(),
            sets_discarded: self.state.total_completed(),
        };
        tracing::info!(
            "Session for plan '{}' abandoned ({} sets discarded)",
            abandoned.plan_id,
            abandoned.sets_discarded
        );
        abandoned
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let index = self.state.current_exercise_index;
        let exercise = self.current_exercise();
        let total = self.compute_total_sets(exercise);

        SessionSnapshot {
            plan_name: self.plan.name.clone(),
            exercise_index: index,
            exercise_count: self.plan.exercises.len(),
            exercise: exercise.clone(),
            sets: (0..total)
                .map(|set| self.state.is_set_completed(SetKey::new(index, set)))
                .collect(),
            exercise_complete: self.is_exercise_complete(index),
            is_last: self.is_last(),
            rest: self.state.rest_timer.snapshot(),
            sets_completed: self.state.total_completed(),
        }
    }

    fn completion_report(&self) -> CompletionReport {
        CompletionReport {
            id: Uuid::new_v4(),
            plan_id: self.plan.id.clone(),
            plan_name: self.plan.name.clone(),
            started_at: self.state.started_at,
            completed_at: Utc::now(),
            sets_completed: self.state.total_completed() as u32,
            exercise_count: self.plan.exercises.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn set_based(id: &str, set_count: u32, rest_seconds: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            instructions: String::new(),
            prescription: Prescription::SetBased {
                set_count,
                reps: "10".into(),
                load_kg: 20.0,
                rest_seconds,
                notes: None,
            },
        }
    }

    fn duration_based(id: &str) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            instructions: String::new(),
            prescription: Prescription::DurationBased {
                duration_minutes: 2.0,
                rest_seconds: 30,
                notes: None,
            },
        }
    }

    fn plan(exercises: Vec<Exercise>) -> WorkoutPlan {
        WorkoutPlan {
            id: "plan-1".into(),
            name: "Test Plan".into(),
            exercises,
        }
    }

    fn controller(
        exercises: Vec<Exercise>,
    ) -> (SessionController<Vec<CompletionReport>>, ManualClock) {
        let clock = ManualClock::new();
        let controller = SessionController::new(
            plan(exercises),
            SessionSettings::default(),
            Box::new(clock.clone()),
            Vec::new(),
        )
        .unwrap();
        (controller, clock)
    }

    fn complete_current(c: &mut SessionController<Vec<CompletionReport>>) {
        let index = c.current_exercise_index();
        let total = c.compute_total_sets(c.current_exercise());
        for set in 0..total {
            c.toggle_set(index, set);
        }
    }

    #[test]
    fn test_empty_plan_rejected() {
        let result = SessionController::new(
            plan(vec![]),
            SessionSettings::default(),
            Box::new(ManualClock::new()),
            Vec::<CompletionReport>::new(),
        );
        assert!(matches!(result, Err(Error::Session(_))));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let (mut c, _) = controller(vec![set_based("a", 3, 60), set_based("b", 2, 60)]);

        let before = c.state().completed_sets.clone();
        c.toggle_set(0, 1);
        c.toggle_set(0, 1);
        assert_eq!(c.state().completed_sets, before);

        c.toggle_set(0, 0);
        let before = c.state().completed_sets.clone();
        c.toggle_set(0, 2);
        c.toggle_set(0, 2);
        assert_eq!(c.state().completed_sets, before);
    }

    #[test]
    fn test_zero_duration_fallback_rejected() {
        let settings = SessionSettings {
            duration_total_sets: 0,
            ..SessionSettings::default()
        };
        let result = SessionController::new(
            plan(vec![duration_based("plank")]),
            settings,
            Box::new(ManualClock::new()),
            Vec::<CompletionReport>::new(),
        );
        assert!(matches!(result, Err(Error::Session(_))));
    }

    #[test]
    fn test_zero_set_count_rejected() {
        let result = SessionController::new(
            plan(vec![set_based("a", 0, 60)]),
            SessionSettings::default(),
            Box::new(ManualClock::new()),
            Vec::<CompletionReport>::new(),
        );
        assert!(matches!(result, Err(Error::PlanValidation(_))));
    }

    #[test]
    fn test_marking_starts_rest_with_exercise_rest_seconds() {
        let (mut c, _) = controller(vec![set_based("a", 3, 75)]);

        assert_eq!(
            c.toggle_set(0, 0),
            ToggleOutcome::Completed { rest_event: None }
        );
        let rest = c.snapshot().rest.unwrap();
        assert_eq!(rest.total, 75);
        assert_eq!(rest.remaining, 75);
    }

    #[test]
    fn test_unmarking_does_not_start_or_restart_rest() {
        let (mut c, clock) = controller(vec![set_based("a", 3, 60)]);

        c.toggle_set(0, 0);
        c.skip_rest();
        assert_eq!(c.toggle_set(0, 0), ToggleOutcome::Uncompleted);
        assert!(c.snapshot().rest.is_none());

        c.toggle_set(0, 1);
        clock.advance_secs(10);
        c.poll();
        assert_eq!(c.toggle_set(0, 1), ToggleOutcome::Uncompleted);
        assert_eq!(c.snapshot().rest.unwrap().remaining, 50);
    }

    #[test]
    fn test_toggle_non_current_exercise_ignored() {
        let (mut c, _) = controller(vec![set_based("a", 1, 60), set_based("b", 1, 60)]);

        assert_eq!(c.toggle_set(1, 0), ToggleOutcome::Ignored);
        assert!(!c.state().is_set_completed(SetKey::new(1, 0)));
        assert!(c.snapshot().rest.is_none());
    }

    #[test]
    fn test_toggle_out_of_range_set_ignored() {
        let (mut c, _) = controller(vec![set_based("a", 2, 60)]);

        assert_eq!(c.toggle_set(0, 2), ToggleOutcome::Ignored);
        assert_eq!(c.state().total_completed(), 0);
    }

    #[test]
    fn test_zero_rest_expires_immediately() {
        let (mut c, _) = controller(vec![set_based("a", 2, 0)]);

        assert_eq!(
            c.toggle_set(0, 0),
            ToggleOutcome::Completed {
                rest_event: Some(TimerEvent::Expired)
            }
        );
        assert!(c.snapshot().rest.is_none());
    }

    #[test]
    fn test_total_sets_for_each_prescription() {
        let (c, _) = controller(vec![set_based("a", 5, 60), duration_based("b")]);
        assert_eq!(c.compute_total_sets(&c.plan().exercises[0]), 5);
        assert_eq!(c.compute_total_sets(&c.plan().exercises[1]), 3);
    }

    #[test]
    fn test_duration_fallback_is_configurable() {
        let settings = SessionSettings {
            duration_total_sets: 1,
            ..SessionSettings::default()
        };
        let mut c = SessionController::new(
            plan(vec![duration_based("plank")]),
            settings,
            Box::new(ManualClock::new()),
            Vec::<CompletionReport>::new(),
        )
        .unwrap();

        c.toggle_set(0, 0);
        assert!(c.is_exercise_complete(0));
        assert_eq!(c.go_to_next(), NextOutcome::SessionComplete);
        assert_eq!(c.sink().len(), 1);
    }

    #[test]
    fn test_is_exercise_complete_requires_every_set() {
        let (mut c, _) = controller(vec![set_based("a", 3, 60)]);

        c.toggle_set(0, 0);
        c.toggle_set(0, 2);
        assert!(!c.is_exercise_complete(0));
        c.toggle_set(0, 1);
        assert!(c.is_exercise_complete(0));
        c.toggle_set(0, 1);
        assert!(!c.is_exercise_complete(0));
    }

    #[test]
    fn test_next_blocked_for_every_incomplete_exercise() {
        let (mut c, _) = controller(vec![
            set_based("a", 2, 60),
            duration_based("b"),
            set_based("c", 1, 60),
        ]);

        for index in 0..3 {
            assert_eq!(c.current_exercise_index(), index);
            assert_eq!(c.go_to_next(), NextOutcome::Blocked);
            assert_eq!(c.current_exercise_index(), index);
            complete_current(&mut c);
            c.go_to_next();
        }
        assert_eq!(c.sink().len(), 1);
    }

    #[test]
    fn test_two_exercise_scenario() {
        let (mut c, _) = controller(vec![set_based("a", 3, 60), set_based("b", 3, 60)]);

        c.toggle_set(0, 0);
        c.toggle_set(0, 1);
        c.toggle_set(0, 2);
        assert!(c.is_exercise_complete(0));

        assert_eq!(c.go_to_next(), NextOutcome::Advanced(1));
        assert_eq!(c.go_to_next(), NextOutcome::Blocked);
        assert_eq!(c.current_exercise_index(), 1);
        assert!(c.sink().is_empty());
    }

    #[test]
    fn test_completion_reported_once() {
        let (mut c, _) = controller(vec![set_based("only", 2, 60)]);
        complete_current(&mut c);

        assert_eq!(c.go_to_next(), NextOutcome::SessionComplete);
        assert_eq!(c.go_to_next(), NextOutcome::SessionComplete);

        assert_eq!(c.sink().len(), 1);
        let report = &c.sink()[0];
        assert_eq!(report.plan_id, "plan-1");
        assert_eq!(report.sets_completed, 2);
        assert_eq!(report.exercise_count, 1);
        assert!(c.state().completion_reported);
    }

    #[test]
    fn test_rest_survives_navigation() {
        let (mut c, clock) = controller(vec![set_based("a", 1, 90), set_based("b", 1, 60)]);

        c.toggle_set(0, 0);
        assert_eq!(c.go_to_next(), NextOutcome::Advanced(1));
        clock.advance_secs(5);
        c.poll();
        assert_eq!(c.snapshot().rest.unwrap().remaining, 85);

        assert!(c.go_to_previous());
        clock.advance_secs(5);
        c.poll();
        let snap = c.snapshot();
        assert_eq!(snap.rest.unwrap().remaining, 80);
        assert_eq!(snap.sets, vec![true]);
    }

    #[test]
    fn test_previous_at_first_exercise_is_noop() {
        let (mut c, _) = controller(vec![set_based("a", 1, 60), set_based("b", 1, 60)]);

        assert!(!c.go_to_previous());
        assert_eq!(c.current_exercise_index(), 0);
    }

    #[test]
    fn test_rest_expires_through_poll() {
        let (mut c, clock) = controller(vec![set_based("a", 2, 3)]);

        c.toggle_set(0, 0);
        clock.advance_secs(2);
        assert_eq!(c.poll(), None);
        clock.advance_secs(1);
        assert_eq!(c.poll(), Some(TimerEvent::Expired));
        assert!(c.snapshot().rest.is_none());
    }

    #[test]
    fn test_extend_and_skip_rest() {
        let (mut c, _) = controller(vec![set_based("a", 2, 60)]);

        assert!(!c.extend_rest_default());
        assert_eq!(c.skip_rest(), None);

        c.toggle_set(0, 0);
        assert!(c.extend_rest_default());
        assert_eq!(c.snapshot().rest.unwrap().total, 90);
        assert_eq!(c.skip_rest(), Some(TimerEvent::Skipped { remaining: 90 }));
    }

    #[test]
    fn test_new_completion_restarts_rest() {
        let (mut c, clock) = controller(vec![set_based("a", 3, 60)]);

        c.toggle_set(0, 0);
        clock.advance_secs(20);
        c.poll();
        c.toggle_set(0, 1);

        let rest = c.snapshot().rest.unwrap();
        assert_eq!(rest.remaining, 60);
        assert_eq!(rest.total, 60);
    }

    #[test]
    fn test_request_exit_keeps_state() {
        let (mut c, _) = controller(vec![set_based("a", 3, 60)]);
        c.toggle_set(0, 0);

        let request = c.request_exit();
        assert_eq!(request.sets_completed, 1);
        c.cancel_exit();

        assert!(c.state().is_set_completed(SetKey::new(0, 0)));
        assert!(c.snapshot().rest.is_some());
    }

    #[test]
    fn test_confirm_exit_discards_without_reporting() {
        let (mut c, _) = controller(vec![set_based("a", 2, 60), set_based("b", 1, 60)]);
        complete_current(&mut c);

        let abandoned = c.confirm_exit();
        assert_eq!(
            abandoned,
            AbandonedSession {
                plan_id: "plan-1".into(),
                sets_discarded: 2,
            }
        );
    }

    #[test]
    fn test_snapshot_reflects_progress() {
        let (mut c, _) = controller(vec![set_based("a", 3, 60), duration_based("b")]);
        c.toggle_set(0, 1);

        let snap = c.snapshot();
        assert_eq!(snap.plan_name, "Test Plan");
        assert_eq!(snap.exercise_index, 0);
        assert_eq!(snap.exercise_count, 2);
        assert_eq!(snap.sets, vec![false, true, false]);
        assert!(!snap.exercise_complete);
        assert!(!snap.is_last);
        assert_eq!(snap.sets_completed, 1);
    }
}
