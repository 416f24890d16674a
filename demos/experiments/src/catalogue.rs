//! The beat experiments: two CPS twins plus a system clock, run against
//! one worker with different cycle periods, phase shifts and re-tunings.
//!
//! Periods are multipliers of [`BASE_CYCLE_LENGTH`].  Irrational periods
//! (the "off" beats) use `355/113` for π.

use cps_core::{CpsResult, Ratio};
use cps_schedule::AgentSpec;

/// Length of a cycle with period 1, in time units.
pub const BASE_CYCLE_LENGTH: Ratio = Ratio::integer(60);

/// Every experiment id in the catalogue.
pub const IDS: std::ops::RangeInclusive<u8> = 1..=14;

/// cps2's re-tuned periods in the chaotic experiments, as 60ths.
const CHAOTIC_CPS2: [u64; 7] = [19, 9, 26, 18, 24, 9, 88];

/// One `run_until` call.  `retune` is applied before the segment runs.
#[derive(Clone, Debug)]
pub struct Segment {
    pub until:  Ratio,
    pub retune: Vec<(&'static str, Ratio)>,
}

#[derive(Clone, Debug)]
pub struct Experiment {
    pub id:       u8,
    pub title:    &'static str,
    pub roster:   Vec<AgentSpec>,
    pub segments: Vec<Segment>,
}

impl Experiment {
    fn periodic(id: u8, title: &'static str, cps1: (Ratio, Ratio), cps2: (Ratio, Ratio), until: Ratio) -> Self {
        Self {
            id,
            title,
            roster: roster(cps1, cps2),
            segments: vec![Segment { until, retune: Vec::new() }],
        }
    }

    /// A single-segment run of a caller-supplied roster.
    pub fn custom(roster: Vec<AgentSpec>, until: Ratio) -> Self {
        Self {
            id: 0,
            title: "custom roster",
            roster,
            segments: vec![Segment { until, retune: Vec::new() }],
        }
    }

    /// Horizon of the last segment.
    pub fn until(&self) -> Ratio {
        self.segments.last().map_or(Ratio::ZERO, |s| s.until)
    }
}

fn roster(cps1: (Ratio, Ratio), cps2: (Ratio, Ratio)) -> Vec<AgentSpec> {
    vec![
        AgentSpec::clock("system_clock", Ratio::ONE, Ratio::ZERO),
        AgentSpec::cps("cps1", cps1.0, cps1.1),
        AgentSpec::cps("cps2", cps2.0, cps2.1),
    ]
}

fn sixtieths(n: u64) -> CpsResult<Ratio> {
    Ratio::new(n, 60)
}

/// The chaotic runs: cps2 is re-tuned before each of seven segments and
/// each segment lasts sixty of its cycles.  With `drift`, cps1 also
/// changes period (48, 58, then 50 sixtieths).
fn chaotic(id: u8, title: &'static str, cps2_delay: Ratio, drift: bool) -> CpsResult<Experiment> {
    let cps1_initial = if drift { sixtieths(48)? } else { Ratio::ONE };
    let mut segments = Vec::with_capacity(CHAOTIC_CPS2.len());
    let mut until = 0;

    for (i, &n) in CHAOTIC_CPS2.iter().enumerate() {
        // Sixty cycles at n/60 of the 60-unit base span n units.
        until += n;
        let mut retune = Vec::new();
        if i > 0 {
            retune.push(("cps2", sixtieths(n)?));
        }
        match (drift, i) {
            (true, 1) => retune.push(("cps1", sixtieths(58)?)),
            (true, 5) => retune.push(("cps1", sixtieths(50)?)),
            _ => {}
        }
        segments.push(Segment { until: Ratio::integer(until), retune });
    }

    Ok(Experiment {
        id,
        title,
        roster: roster((cps1_initial, Ratio::ZERO), (sixtieths(CHAOTIC_CPS2[0])?, cps2_delay)),
        segments,
    })
}

/// Look up experiment `id`.  `Ok(None)` for ids outside [`IDS`].
pub fn experiment(id: u8) -> CpsResult<Option<Experiment>> {
    let one = Ratio::ONE;
    let zero = Ratio::ZERO;
    let third = Ratio::new(1, 3)?;
    let pi = Ratio::new(355, 113)?;
    let inv_pi = Ratio::new(113, 355)?;
    let shift = Ratio::integer(15);
    let nudge = Ratio::integer(2);
    let u180 = Ratio::integer(180);
    let u540 = Ratio::integer(540);
    let u180_pi = Ratio::new(180 * 355, 113)?;

    let e = match id {
        1 => Experiment::periodic(1, "periodically (on the beat)", (one, zero), (one, zero), u180),
        2 => Experiment::periodic(2, "periodically (on the offbeat)", (one, zero), (one, shift), u180),
        3 => Experiment::periodic(3, "periodically (on the interval-beat)", (one, zero), (third, zero), u180),
        4 => Experiment::periodic(4, "periodically (on the manifold-beat)", (one, zero), (Ratio::integer(3), zero), u540),
        5 => Experiment::periodic(5, "periodically (of the interval-beat)", (one, zero), (inv_pi, zero), u180),
        6 => Experiment::periodic(6, "periodically (off the manifold-beat)", (one, zero), (pi, zero), u180_pi),
        7 => chaotic(7, "chaotic (off the beat)", zero, false)?,
        8 => chaotic(8, "chaotic (no beat)", zero, true)?,
        9 => Experiment::periodic(9, "periodically (on shifted interval-beat)", (one, zero), (third, shift), u180),
        10 => Experiment::periodic(10, "periodically (on shifted manifold-beat)", (one, shift), (Ratio::integer(3), zero), u540),
        11 => Experiment::periodic(11, "periodically (off shifted interval-beat)", (one, zero), (inv_pi, nudge), u180),
        12 => Experiment::periodic(12, "periodically (off shifted manifold-beat)", (one, nudge), (pi, zero), u180_pi),
        13 => chaotic(13, "chaotic (off the shifted beat)", nudge, false)?,
        14 => chaotic(14, "chaotic (shifted no beat)", nudge, true)?,
        _ => return Ok(None),
    };
    Ok(Some(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_resolves() {
        for id in IDS {
            let e = experiment(id).unwrap().unwrap();
            assert_eq!(e.id, id);
            assert_eq!(e.roster.len(), 3);
        }
        assert!(experiment(0).unwrap().is_none());
        assert!(experiment(15).unwrap().is_none());
    }

    #[test]
    fn chaotic_segments_accumulate() {
        let e = experiment(7).unwrap().unwrap();
        let ends: Vec<Ratio> = e.segments.iter().map(|s| s.until).collect();
        let expected: Vec<Ratio> = [19, 28, 54, 72, 96, 105, 193].into_iter().map(Ratio::integer).collect();
        assert_eq!(ends, expected);
        assert!(e.segments[0].retune.is_empty());
        assert_eq!(e.segments[1].retune, vec![("cps2", Ratio::new(9, 60).unwrap())]);
    }

    #[test]
    fn drifting_cps1_retuned_twice() {
        let e = experiment(14).unwrap().unwrap();
        let cps1: Vec<usize> = e
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.retune.iter().any(|(name, _)| *name == "cps1"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(cps1, vec![1, 5]);
        assert_eq!(e.roster[2].phase_delay, Ratio::integer(2));
    }
}
