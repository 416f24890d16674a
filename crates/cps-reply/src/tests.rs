//! Unit tests for cps-reply.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cps_core::{AgentId, CorrelationId, StepKind};

use crate::{
    AgentDirectory, ClearOutcome, CompletionNotice, CompletionRouter, ReplyError, ReplyTracker,
    RouteOutcome,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const CPS1: AgentId = AgentId(0);
const CPS2: AgentId = AgentId(1);

fn directory() -> AgentDirectory {
    [("cps1", CPS1), ("cps2", CPS2)].into_iter().collect()
}

fn router() -> CompletionRouter {
    CompletionRouter::new(Arc::new(ReplyTracker::new()), directory())
}

// ── Tracker ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tracker {
    use super::*;

    #[test]
    fn mark_then_clear() {
        let t = ReplyTracker::new();
        t.mark_pending(CPS1, StepKind::Step1, None);
        assert!(t.is_pending(CPS1, StepKind::Step1));
        assert!(!t.is_pending(CPS1, StepKind::Step2));
        assert_eq!(t.clear(CPS1, StepKind::Step1), ClearOutcome::Cleared);
        assert!(!t.is_pending(CPS1, StepKind::Step1));
    }

    #[test]
    fn clearing_absent_key_is_noop() {
        let t = ReplyTracker::new();
        assert_eq!(t.clear(CPS2, StepKind::Step2), ClearOutcome::Absent);
        let stats = t.stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.cleared, 0);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn correlation_ids_increase() {
        let t = ReplyTracker::new();
        let a = t.mark_pending(CPS1, StepKind::Step1, None);
        let b = t.mark_pending(CPS2, StepKind::Step1, None);
        assert!(b > a);
        assert_eq!(t.clear_correlated(CPS2, StepKind::Step1, a), ClearOutcome::Stale);
        assert_eq!(t.clear_correlated(CPS2, StepKind::Step1, b), ClearOutcome::Cleared);
    }

    #[test]
    fn stale_correlation_leaves_entry() {
        let t = ReplyTracker::new();
        let old = t.mark_pending(CPS1, StepKind::Step1, None);
        let new = t.mark_pending(CPS1, StepKind::Step1, None);
        assert_eq!(t.clear_correlated(CPS1, StepKind::Step1, old), ClearOutcome::Stale);
        assert!(t.is_pending(CPS1, StepKind::Step1));
        assert_eq!(t.clear_correlated(CPS1, StepKind::Step1, new), ClearOutcome::Cleared);
    }

    #[test]
    fn clear_active_step_prefers_step_1() {
        let t = ReplyTracker::new();
        t.mark_pending(CPS1, StepKind::Cycle, None);
        t.mark_pending(CPS1, StepKind::Step1, None);
        assert_eq!(t.clear_active_step(CPS1), Some(StepKind::Step1));
        t.mark_pending(CPS1, StepKind::Step2, None);
        assert_eq!(t.clear_active_step(CPS1), Some(StepKind::Step2));
        assert_eq!(t.clear_active_step(CPS1), None);
        // The cycle marker is never touched by step notices.
        assert!(t.is_pending(CPS1, StepKind::Cycle));
    }

    #[test]
    fn has_any_pending_respects_predicate() {
        let t = ReplyTracker::new();
        t.mark_pending(CPS1, StepKind::Cycle, None);
        assert!(t.has_any_pending(|_| true));
        assert!(!t.has_any_pending(|k| k.step.is_external()));
        t.mark_pending(CPS2, StepKind::Step2, None);
        assert!(t.has_any_pending(|k| k.step.is_external()));
    }

    #[test]
    fn abandon_drops_every_key_of_agent() {
        let t = ReplyTracker::new();
        t.mark_pending(CPS1, StepKind::Cycle, None);
        t.mark_pending(CPS1, StepKind::Step1, None);
        t.mark_pending(CPS2, StepKind::Step1, None);
        let dropped = t.abandon(CPS1);
        assert_eq!(dropped.len(), 2);
        assert_eq!(t.pending_keys(|_| true).len(), 1);
        assert_eq!(t.stats().abandoned, 2);
    }
}

// ── Blocking waits ────────────────────────────────────────────────────────────

#[cfg(test)]
mod waits {
    use super::*;

    #[test]
    fn wait_on_absent_key_returns_immediately() {
        let t = ReplyTracker::new();
        t.wait_cleared(CPS1, StepKind::Step1).unwrap();
    }

    #[test]
    fn wait_released_by_other_thread() {
        let t = Arc::new(ReplyTracker::new());
        t.mark_pending(CPS1, StepKind::Step1, Some(Duration::from_secs(10)));

        let clearer = {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                t.clear(CPS1, StepKind::Step1)
            })
        };

        t.wait_cleared(CPS1, StepKind::Step1).unwrap();
        assert_eq!(clearer.join().unwrap(), ClearOutcome::Cleared);
    }

    #[test]
    fn wait_times_out_and_keeps_entry() {
        let t = ReplyTracker::new();
        t.mark_pending(CPS2, StepKind::Step2, Some(Duration::from_millis(20)));
        let err = t.wait_cleared(CPS2, StepKind::Step2).unwrap_err();
        assert!(matches!(
            err,
            ReplyError::StepTimedOut { agent: CPS2, step: StepKind::Step2, .. }
        ));
        assert!(t.is_pending(CPS2, StepKind::Step2));
    }

    #[test]
    fn wait_idle_reports_quiet_table() {
        let t = Arc::new(ReplyTracker::new());
        t.mark_pending(CPS1, StepKind::Step1, None);
        assert!(!t.wait_idle(|k| k.step.is_external(), Duration::from_millis(10)));

        let clearer = {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                t.clear(CPS1, StepKind::Step1);
            })
        };
        assert!(t.wait_idle(|k| k.step.is_external(), Duration::from_secs(10)));
        clearer.join().unwrap();
    }
}

// ── Notices ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod notice {
    use super::*;
    use crate::NoticeError;

    #[test]
    fn structured_renders_all_fields() {
        let n = CompletionNotice::structured(
            "cps1",
            StepKind::Step1,
            CorrelationId(17),
            "image-analysis-step",
        );
        assert_eq!(
            n.to_string(),
            "result indication: agent=cps1, step=step_1, correlation=17, scenario=image-analysis-step."
        );
        assert_eq!(CompletionNotice::parse(&n.to_string()).unwrap(), n);
    }

    #[test]
    fn legacy_text_has_no_fields() {
        let n = CompletionNotice::parse("The result indication for cps2 is ready").unwrap();
        assert!(!n.is_structured());
        assert_eq!(n.step, None);
    }

    #[test]
    fn missing_marker() {
        assert_eq!(
            CompletionNotice::parse("The results of this timestep have been produced at cps1"),
            Err(NoticeError::MissingMarker)
        );
    }

    #[test]
    fn bad_correlation_is_malformed() {
        let err = CompletionNotice::parse("result indication: agent=cps1, correlation=x").unwrap_err();
        assert!(matches!(err, NoticeError::Malformed { field: "correlation", .. }));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let n = CompletionNotice::parse("result indication: agent=cps1, worker=w3, step=2").unwrap();
        assert_eq!(n.agent.as_deref(), Some("cps1"));
        assert_eq!(n.step, Some(StepKind::Step2));
    }
}

// ── Directory ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod directory {
    use super::*;

    #[test]
    fn whole_word_match_only() {
        let mut d = directory();
        d.insert("cps10", AgentId(9));
        assert_eq!(d.find_in_text("done for cps10."), Some(AgentId(9)));
        assert_eq!(d.find_in_text("done for cps1."), Some(CPS1));
        assert_eq!(d.find_in_text("done for cps3."), None);
    }

    #[test]
    fn first_name_in_text_wins() {
        let d = directory();
        assert_eq!(d.find_in_text("cps2 asked, cps1 answered"), Some(CPS2));
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod router {
    use super::*;

    #[test]
    fn notices_clear_only_their_agent() {
        let r = router();
        let t = r.tracker();
        t.mark_pending(CPS1, StepKind::Step1, None);
        t.mark_pending(CPS2, StepKind::Step1, None);

        let outcome = r.handle("result indication: agent=cps1, step=step_1.");
        assert_eq!(outcome, RouteOutcome::Cleared { agent: CPS1, step: StepKind::Step1 });
        assert!(!t.is_pending(CPS1, StepKind::Step1));
        assert!(t.is_pending(CPS2, StepKind::Step1));

        r.handle("result indication: agent=cps2, step=step_1.");
        assert!(!t.has_any_pending(|_| true));
    }

    #[test]
    fn duplicate_delivery_is_harmless() {
        let r = router();
        let t = r.tracker();
        let corr = t.mark_pending(CPS1, StepKind::Step2, None);
        let payload = CompletionNotice::structured("cps1", StepKind::Step2, corr, "x").to_string();

        assert!(matches!(r.handle(&payload), RouteOutcome::Cleared { .. }));
        assert_eq!(
            r.handle(&payload),
            RouteOutcome::Duplicate { agent: CPS1, step: Some(StepKind::Step2) }
        );
        assert_eq!(t.stats().cleared, 1);
    }

    #[test]
    fn late_reply_does_not_release_newer_request() {
        let r = router();
        let t = r.tracker();
        let old = t.mark_pending(CPS1, StepKind::Step1, None);
        t.abandon(CPS1);
        t.mark_pending(CPS1, StepKind::Step1, None);

        let late = CompletionNotice::structured("cps1", StepKind::Step1, old, "x").to_string();
        assert_eq!(r.handle(&late), RouteOutcome::Stale { agent: CPS1, step: StepKind::Step1 });
        assert!(t.is_pending(CPS1, StepKind::Step1));
    }

    #[test]
    fn legacy_notice_clears_active_step() {
        let r = router();
        let t = r.tracker();
        t.mark_pending(CPS2, StepKind::Step2, None);
        assert_eq!(
            r.handle("result indication received from cps2"),
            RouteOutcome::Cleared { agent: CPS2, step: StepKind::Step2 }
        );
    }

    #[test]
    fn unrelated_payloads_ignored_or_dropped() {
        let r = router();
        assert_eq!(r.handle("Please realize the following AI case: ..."), RouteOutcome::Ignored);
        assert!(matches!(r.handle("result indication: agent=robot7"), RouteOutcome::Dropped(_)));
        assert!(matches!(r.handle("result indication: nobody"), RouteOutcome::Dropped(_)));
        assert!(matches!(
            r.handle("result indication: agent=cps1, step=cycle"),
            RouteOutcome::Dropped(_)
        ));
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    fn step() -> impl Strategy<Value = StepKind> {
        prop_oneof![Just(StepKind::Step1), Just(StepKind::Step2)]
    }

    proptest! {
        #[test]
        fn repeated_delivery_equals_single_delivery(
            marked in proptest::collection::vec((0u32..4, step()), 0..8),
            agent in 0u32..4,
            step in step(),
            copies in 1usize..5,
        ) {
            let once = ReplyTracker::new();
            let many = ReplyTracker::new();
            for &(a, s) in &marked {
                once.mark_pending(AgentId(a), s, None);
                many.mark_pending(AgentId(a), s, None);
            }

            once.clear(AgentId(agent), step);
            for _ in 0..copies {
                many.clear(AgentId(agent), step);
            }

            prop_assert_eq!(once.pending_keys(|_| true), many.pending_keys(|_| true));
        }
    }
}
