//! Unit tests for cps-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, CorrelationId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(CorrelationId::INVALID.0, u64::MAX);
        assert_eq!(AgentId::default(), AgentId::INVALID);
    }

    #[test]
    fn correlation_next() {
        assert_eq!(CorrelationId(6).next(), CorrelationId(7));
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }
}

#[cfg(test)]
mod ratio {
    use crate::Ratio;

    #[test]
    fn parses_fraction_integer_and_decimal() {
        assert_eq!("1/3".parse::<Ratio>().unwrap(), Ratio::new(1, 3).unwrap());
        assert_eq!("15".parse::<Ratio>().unwrap(), Ratio::integer(15));
        assert_eq!("0.25".parse::<Ratio>().unwrap(), Ratio::new(1, 4).unwrap());
        assert_eq!(" 2/4 ".parse::<Ratio>().unwrap(), Ratio::new(1, 2).unwrap());
        assert_eq!(".5".parse::<Ratio>().unwrap(), Ratio::new(1, 2).unwrap());
    }

    #[test]
    fn rejects_garbage_and_negatives() {
        assert!("".parse::<Ratio>().is_err());
        assert!("-1".parse::<Ratio>().is_err());
        assert!("1/0".parse::<Ratio>().is_err());
        assert!("abc".parse::<Ratio>().is_err());
        assert!("1.".parse::<Ratio>().is_err());
    }

    #[test]
    fn stored_in_lowest_terms() {
        let r = Ratio::new(6, 9).unwrap();
        assert_eq!((r.numer(), r.denom()), (2, 3));
        assert_eq!(r.to_string(), "2/3");
        assert_eq!(Ratio::integer(5).to_string(), "5");
    }

    #[test]
    fn ordering_is_exact() {
        let third = Ratio::new(1, 3).unwrap();
        let point_three = "0.3".parse::<Ratio>().unwrap();
        assert!(point_three < third);
        assert!(Ratio::ZERO < third);
        assert_eq!(Ratio::new(2, 6).unwrap().cmp(&third), std::cmp::Ordering::Equal);
    }

    #[test]
    fn checked_mul_reduces() {
        let r = Ratio::integer(60).checked_mul(Ratio::new(1, 3).unwrap()).unwrap();
        assert_eq!(r, Ratio::integer(20));
        assert!(Ratio::integer(u64::MAX).checked_mul(Ratio::integer(2)).is_none());
    }

    #[test]
    fn to_ticks_rounds_up_and_never_to_zero() {
        assert_eq!(Ratio::new(1, 3).unwrap().to_ticks(3600), 1200);
        assert_eq!(Ratio::new(1, 7).unwrap().to_ticks(3600), 515); // 514.28…
        assert_eq!(Ratio::new(1, 1_000_000).unwrap().to_ticks(10), 1);
        assert_eq!(Ratio::ZERO.to_ticks(3600), 0);
    }
}

#[cfg(test)]
mod time {
    use crate::{Ratio, SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(10).checked_add(5), Some(Tick(15)));
        assert_eq!(Tick(1).checked_add(u64::MAX), None);
        assert_eq!(Tick::ZERO.checked_add(u64::MAX), Some(Tick(u64::MAX)));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut clock = SimClock::new(3600);
        clock.advance_to(Tick(7200));
        assert_eq!(clock.now_units(), 2.0);
        clock.advance_to(Tick(3600));
        assert_eq!(clock.current_tick, Tick(7200));
    }

    #[test]
    fn config_conversions() {
        let cfg = SimConfig {
            base_cycle_length: Ratio::integer(60),
            ..SimConfig::default()
        };
        assert_eq!(cfg.until_tick(), Tick(180 * 3600));
        assert_eq!(cfg.cycle_ticks(Ratio::ONE).unwrap(), 60 * 3600);
        assert_eq!(cfg.cycle_ticks(Ratio::new(1, 3).unwrap()).unwrap(), 20 * 3600);
        assert_eq!(cfg.delay_ticks(Ratio::integer(15)), 15 * 3600);
        assert_eq!(cfg.reply_timeout().unwrap().as_millis(), 60_000);
    }

    #[test]
    fn validate_rejects_degenerate_configs() {
        assert!(SimConfig::default().validate().is_ok());
        let zero_res = SimConfig { ticks_per_unit: 0, ..SimConfig::default() };
        assert!(zero_res.validate().is_err());
        let zero_base = SimConfig { base_cycle_length: Ratio::ZERO, ..SimConfig::default() };
        assert!(zero_base.validate().is_err());
        let zero_stalls = SimConfig { max_consecutive_stalls: Some(0), ..SimConfig::default() };
        assert!(zero_stalls.validate().is_err());
    }
}

#[cfg(test)]
mod step {
    use crate::{ScenarioLabel, StepKind};

    #[test]
    fn wire_names_roundtrip() {
        for step in [StepKind::Step1, StepKind::Step2, StepKind::Cycle] {
            assert_eq!(step.to_string().parse::<StepKind>().unwrap(), step);
        }
        assert!("step_3".parse::<StepKind>().is_err());
    }

    #[test]
    fn only_analysis_steps_are_external() {
        assert!(StepKind::Step1.is_external());
        assert!(StepKind::Step2.is_external());
        assert!(!StepKind::Cycle.is_external());
    }

    #[test]
    fn default_labels() {
        assert_eq!(ScenarioLabel::default_for(StepKind::Step1).as_str(), "image-analysis-step");
        assert_eq!(ScenarioLabel::default_for(StepKind::Step2).as_str(), "transport-analysis-step");
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            assert_eq!(r1.gen_range(0u64..1_000_000), r2.gen_range(0u64..1_000_000));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
        assert!(!rng.gen_bool(f64::NAN));
    }
}
