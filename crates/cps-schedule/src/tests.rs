//! Unit tests for cps-schedule.

use cps_core::{AgentId, SimClock, Tick};

use crate::{Scheduler, WakeQueue};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scheduler() -> Scheduler {
    Scheduler::new(SimClock::new(1))
}

// ── WakeQueue ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod wake_queue {
    use super::*;

    #[test]
    fn pop_earliest_returns_all_agents_at_instant() {
        let mut q = WakeQueue::new();
        q.push(Tick(5), AgentId(0));
        q.push(Tick(3), AgentId(1));
        q.push(Tick(5), AgentId(2));
        assert_eq!(q.tick_count(), 2);
        assert_eq!(q.len(), 3);

        assert_eq!(q.pop_earliest(), Some((Tick(3), vec![AgentId(1)])));
        assert_eq!(q.pop_earliest(), Some((Tick(5), vec![AgentId(0), AgentId(2)])));
        assert!(q.is_empty());
        assert_eq!(q.pop_earliest(), None);
    }

    #[test]
    fn remove_agent_drops_empty_instants() {
        let mut q = WakeQueue::new();
        q.push(Tick(1), AgentId(0));
        q.push(Tick(2), AgentId(0));
        q.push(Tick(2), AgentId(1));
        assert_eq!(q.remove_agent(AgentId(0)), 2);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_tick(), Some(Tick(2)));
        assert_eq!(q.tick_count(), 1);
    }

    #[test]
    fn wake_of_finds_queued_agent() {
        let mut q = WakeQueue::new();
        q.push(Tick(9), AgentId(4));
        assert_eq!(q.wake_of(AgentId(4)), Some(Tick(9)));
        assert_eq!(q.wake_of(AgentId(5)), None);
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use super::*;
    use crate::ScheduleError;

    #[test]
    fn peek_does_not_mutate() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(4)).unwrap();
        assert_eq!(s.peek_next_time(), Some(Tick(4)));
        assert_eq!(s.peek_next_time(), Some(Tick(4)));
        assert_eq!(s.now(), Tick(0));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn fire_next_advances_clock_and_wakes_siblings_together() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(2)).unwrap();
        s.schedule_at(AgentId(1), Tick(2)).unwrap();
        s.schedule_at(AgentId(2), Tick(7)).unwrap();

        let firing = s.fire_next().unwrap();
        assert_eq!(firing.at, Tick(2));
        assert_eq!(firing.agents, vec![AgentId(0), AgentId(1)]);
        assert_eq!(s.now(), Tick(2));

        let firing = s.fire_next().unwrap();
        assert_eq!(firing.at, Tick(7));
        assert_eq!(firing.agents, vec![AgentId(2)]);
        assert!(s.fire_next().is_none());
    }

    #[test]
    fn wait_for_is_relative_to_now() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(10)).unwrap();
        s.fire_next().unwrap();
        assert_eq!(s.wait_for(AgentId(0), 5).unwrap(), Tick(15));
        assert_eq!(s.wake_of(AgentId(0)), Some(Tick(15)));
    }

    #[test]
    fn zero_duration_fails_fast() {
        let mut s = scheduler();
        let err = s.wait_for(AgentId(3), 0).unwrap_err();
        assert!(matches!(err, ScheduleError::NonPositiveDuration { agent: AgentId(3), .. }));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn wake_past_end_of_time_rejected() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(1)).unwrap();
        s.fire_next().unwrap();
        let err = s.wait_for(AgentId(0), u64::MAX).unwrap_err();
        assert!(matches!(err, ScheduleError::Overflow { agent: AgentId(0), at: Tick(1), ticks: u64::MAX }));
        assert_eq!(s.pending(), 0);
        assert_eq!(s.now(), Tick(1));
    }

    #[test]
    fn schedule_in_past_rejected() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(10)).unwrap();
        s.fire_next().unwrap();
        assert!(matches!(
            s.schedule_at(AgentId(1), Tick(3)),
            Err(ScheduleError::InPast { .. })
        ));
        // The current instant itself is fine (zero phase delay).
        s.schedule_at(AgentId(1), Tick(10)).unwrap();
    }

    #[test]
    fn cancel_removes_agent() {
        let mut s = scheduler();
        s.schedule_at(AgentId(0), Tick(1)).unwrap();
        assert!(s.cancel(AgentId(0)));
        assert!(!s.cancel(AgentId(0)));
        assert_eq!(s.peek_next_time(), None);
    }
}

// ── Roster ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod roster {
    use cps_core::{Ratio, StepKind};

    use crate::{AgentKind, AgentSpec};

    #[test]
    fn clock_inherits_default_labels() {
        let spec = AgentSpec::clock("system_clock", Ratio::ONE, Ratio::ZERO);
        assert_eq!(spec.kind, AgentKind::Clock);
        assert_eq!(spec.scenario(StepKind::Step2).as_str(), "transport-analysis-step");
    }

    #[test]
    fn with_scenarios_overrides_both() {
        let spec = AgentSpec::cps("cps1", Ratio::ONE, Ratio::ZERO).with_scenarios("a", "b");
        assert_eq!(spec.scenario(StepKind::Step1).as_str(), "a");
        assert_eq!(spec.scenario(StepKind::Step2).as_str(), "b");
    }
}

// ── CSV Loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use cps_core::Ratio;

    use crate::{load_roster_csv, load_roster_reader, AgentKind};

    const CSV: &[u8] = b"\
name,kind,cycle_period,phase_delay,step_1_scenario,step_2_scenario\n\
system_clock,clock,1,0,,\n\
cps1,cps,1,0,apply_annSolution,wire_annSolution\n\
cps2,,1/3,15,,\n\
";

    #[test]
    fn loads_three_agents() {
        let roster = load_roster_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].kind, AgentKind::Clock);
        assert_eq!(roster[1].step_1_scenario.as_str(), "apply_annSolution");
        assert_eq!(roster[2].kind, AgentKind::Cps);
    }

    #[test]
    fn ratios_and_defaults() {
        let roster = load_roster_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(roster[2].cycle_period, Ratio::new(1, 3).unwrap());
        assert_eq!(roster[2].phase_delay, Ratio::integer(15));
        assert_eq!(roster[2].step_2_scenario.as_str(), "transport-analysis-step");
    }

    #[test]
    fn zero_period_rejected() {
        let bad = b"name,kind,cycle_period,phase_delay,step_1_scenario,step_2_scenario\ncps1,cps,0,0,,\n";
        assert!(load_roster_reader(Cursor::new(bad.as_slice())).is_err());
    }

    #[test]
    fn bad_kind_rejected() {
        let bad = b"name,kind,cycle_period,phase_delay,step_1_scenario,step_2_scenario\ncps1,robot,1,0,,\n";
        let err = load_roster_reader(Cursor::new(bad.as_slice())).unwrap_err();
        assert!(err.to_string().contains("row 1"), "{err}");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV).unwrap();
        let roster = load_roster_csv(file.path()).unwrap();
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_roster_csv(std::path::Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, crate::ScheduleError::Io(_)));
    }
}
