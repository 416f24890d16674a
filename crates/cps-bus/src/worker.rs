//! `SimulatedWorker`: in-process stand-in for the external deployment unit.
//!
//! Subscribes to the request topic, and for every request it accepts,
//! sleeps a seeded random latency on its own thread and then publishes a
//! completion notice.  Knobs exist for the misbehaviour a real broker shows:
//! duplicate delivery and requests that are never answered.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use cps_core::SimRng;
use cps_reply::CompletionNotice;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{BusError, BusResult, DEFAULT_TOPIC, Envelope, MessageChannel, RequestMessage};

/// Behaviour of a [`SimulatedWorker`].
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Topic requests arrive on.
    pub request_topic:         String,
    /// Topic completion notices are published to.
    pub reply_topic:           String,
    /// Reply latency in milliseconds, drawn uniformly per request.
    pub latency_ms:            RangeInclusive<u64>,
    /// Probability of publishing each notice twice.
    pub duplicate_probability: f64,
    /// Senders whose requests are accepted but never answered.
    pub muted:                 HashSet<String>,
    pub seed:                  u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            request_topic:         DEFAULT_TOPIC.to_owned(),
            reply_topic:           DEFAULT_TOPIC.to_owned(),
            latency_ms:            0..=5,
            duplicate_probability: 0.0,
            muted:                 HashSet::new(),
            seed:                  42,
        }
    }
}

impl WorkerConfig {
    pub fn mute(mut self, sender: impl Into<String>) -> Self {
        self.muted.insert(sender.into());
        self
    }
}

/// Counters, readable while the worker runs.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct WorkerStats {
    pub received:   u64,
    pub answered:   u64,
    pub muted:      u64,
    pub duplicates: u64,
    pub malformed:  u64,
}

enum Job {
    Run(RequestMessage),
    Stop,
}

pub struct SimulatedWorker {
    jobs:   Sender<Job>,
    stats:  Arc<Mutex<WorkerStats>>,
    thread: Option<JoinHandle<()>>,
}

impl SimulatedWorker {
    /// Subscribe to `config.request_topic` on `channel` and start the
    /// worker thread.
    pub fn attach<C>(channel: Arc<C>, config: WorkerConfig) -> BusResult<SimulatedWorker>
    where
        C: MessageChannel + ?Sized + 'static,
    {
        if config.latency_ms.is_empty() {
            return Err(BusError::Core(cps_core::CpsError::Config(format!(
                "empty worker latency range {:?}",
                config.latency_ms
            ))));
        }
        if !(0.0..=1.0).contains(&config.duplicate_probability) {
            return Err(BusError::Core(cps_core::CpsError::Config(format!(
                "duplicate probability {} is not in [0, 1]",
                config.duplicate_probability
            ))));
        }
        let (jobs, rx) = crossbeam_channel::unbounded();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));

        let thread = thread::Builder::new().name("cps-sim-worker".into()).spawn({
            let channel = Arc::clone(&channel);
            let stats = Arc::clone(&stats);
            let config = config.clone();
            move || work_loop(rx, channel, config, stats)
        })?;

        let handler_jobs = jobs.clone();
        let handler_stats = Arc::clone(&stats);
        channel.subscribe(
            &config.request_topic,
            Arc::new(move |envelope: &Envelope| {
                if !RequestMessage::is_request(&envelope.payload) {
                    return;
                }
                match RequestMessage::parse(&envelope.payload) {
                    Ok(request) => {
                        handler_stats.lock().received += 1;
                        let _ = handler_jobs.send(Job::Run(request));
                    }
                    Err(e) => {
                        handler_stats.lock().malformed += 1;
                        warn!(error = %e, "worker dropped malformed request");
                    }
                }
            }),
        )?;

        Ok(SimulatedWorker { jobs, stats, thread: Some(thread) })
    }

    pub fn stats(&self) -> WorkerStats {
        *self.stats.lock()
    }

    /// Finish the queued jobs and stop the worker thread.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else { return };
        let _ = self.jobs.send(Job::Stop);
        let _ = thread.join();
    }
}

impl Drop for SimulatedWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn work_loop<C>(rx: Receiver<Job>, channel: Arc<C>, config: WorkerConfig, stats: Arc<Mutex<WorkerStats>>)
where
    C: MessageChannel + ?Sized,
{
    let mut rng = SimRng::new(config.seed);
    for job in rx {
        let request = match job {
            Job::Run(request) => request,
            Job::Stop => break,
        };
        if config.muted.contains(&request.sender) {
            debug!(sender = %request.sender, "worker ignoring muted sender");
            stats.lock().muted += 1;
            continue;
        }

        let latency = rng.gen_range(config.latency_ms.clone());
        if latency > 0 {
            thread::sleep(Duration::from_millis(latency));
        }

        let payload = notice_for(&request).to_string();
        let copies = if rng.gen_bool(config.duplicate_probability) { 2 } else { 1 };
        for _ in 0..copies {
            if let Err(e) = channel.publish(&config.reply_topic, payload.clone()) {
                warn!(error = %e, "worker could not publish completion");
                return;
            }
        }

        let mut stats = stats.lock();
        stats.answered += 1;
        stats.duplicates += copies - 1;
    }
}

/// The notice answering `request`.  Requests without a correlation get an
/// agent-only notice, which clears whichever step is pending.
fn notice_for(request: &RequestMessage) -> CompletionNotice {
    match (request.step, request.correlation) {
        (Some(step), Some(correlation)) => {
            CompletionNotice::structured(request.sender.as_str(), step, correlation, request.scenario.as_str())
        }
        _ => CompletionNotice {
            agent: Some(request.sender.clone()),
            scenario: Some(request.scenario.clone()),
            ..CompletionNotice::default()
        },
    }
}
