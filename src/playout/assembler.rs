//! Log assembly: many driver runs, one event log.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event_log::{Clock, ClockError, Event, EventLog, Trace};
use crate::playout::PlayoutError;
use crate::playout::driver::{Driver, PlayoutState, TraceRun};

/// Attribute keys stamped on generated traces and events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeKeys {
    pub case_id: String,
    pub activity: String,
    pub timestamp: String,
}

/// How the traces of one playout ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoutSummary {
    pub traces: usize,
    pub events: usize,
    pub firings: usize,
    pub stopped_by_choice: usize,
    pub stopped_by_deadlock: usize,
    pub stopped_by_length_limit: usize,
}

impl PlayoutSummary {
    fn record(&mut self, run: &TraceRun<'_>) {
        self.traces += 1;
        self.events += run.activities.len();
        self.firings += run.firings;
        match run.state {
            PlayoutState::StoppedByChoice => self.stopped_by_choice += 1,
            PlayoutState::StoppedByDeadlock => self.stopped_by_deadlock += 1,
            PlayoutState::StoppedByLengthLimit => self.stopped_by_length_limit += 1,
            PlayoutState::Running => {}
        }
    }
}

/// Random stream for case `case`; independent of how many cases run before it.
pub fn trace_rng(seed: u64, case: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(case as u64);
    rng
}

#[derive(Debug, Clone)]
pub struct LogAssembler<'a> {
    driver: Driver<'a>,
    keys: AttributeKeys,
    no_traces: usize,
    seed: u64,
    parallel: bool,
}

impl<'a> LogAssembler<'a> {
    pub fn new(driver: Driver<'a>, keys: AttributeKeys, no_traces: usize, seed: u64) -> Self {
        Self {
            driver,
            keys,
            no_traces,
            seed,
            parallel: false,
        }
    }

    /// Simulate cases on the rayon pool; the resulting log is the same as a sequential run.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every case and stamps events from `clock`, returning the log, its summary and
    /// the clock advanced past the last event.
    pub fn assemble(
        &self,
        clock: Clock,
    ) -> Result<(EventLog, PlayoutSummary, Clock), PlayoutError> {
        let mut log = EventLog::new();
        let mut summary = PlayoutSummary::default();
        let mut clock = clock;

        if self.parallel {
            let runs = (0..self.no_traces)
                .into_par_iter()
                .map(|case| self.driver.run(&mut trace_rng(self.seed, case)))
                .collect::<Result<Vec<_>, _>>()?;
            for (case, run) in runs.iter().enumerate() {
                summary.record(run);
                let (trace, next) = self.stamp(case, run, clock)?;
                log.push(trace);
                clock = next;
            }
        } else {
            for case in 0..self.no_traces {
                let run = self.driver.run(&mut trace_rng(self.seed, case))?;
                summary.record(&run);
                let (trace, next) = self.stamp(case, &run, clock)?;
                log.push(trace);
                clock = next;
            }
        }

        log::debug!(
            "assembled {} traces: {} by choice, {} by deadlock, {} by length limit",
            summary.traces,
            summary.stopped_by_choice,
            summary.stopped_by_deadlock,
            summary.stopped_by_length_limit
        );
        Ok((log, summary, clock))
    }

    fn stamp(
        &self,
        case: usize,
        run: &TraceRun<'_>,
        clock: Clock,
    ) -> Result<(Trace, Clock), ClockError> {
        let mut trace = Trace::new();
        trace
            .attributes
            .insert(self.keys.case_id.clone(), case.to_string().into());
        let mut clock = clock;
        for activity in &run.activities {
            let (timestamp, next) = clock.tick()?;
            clock = next;
            trace.push(
                Event::new()
                    .with(self.keys.activity.as_str(), *activity)
                    .with(self.keys.timestamp.as_str(), timestamp),
            );
        }
        Ok((trace, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{DEFAULT_NAME_KEY, DEFAULT_TIMESTAMP_KEY, DEFAULT_TRACEID_KEY};
    use crate::net::{Marking, Net, Place, Transition};
    use crate::playout::driver::TraceLimits;
    use crate::stochastic::StochasticMap;

    fn keys() -> AttributeKeys {
        AttributeKeys {
            case_id: DEFAULT_TRACEID_KEY.to_owned(),
            activity: DEFAULT_NAME_KEY.to_owned(),
            timestamp: DEFAULT_TIMESTAMP_KEY.to_owned(),
        }
    }

    /// Free choice between A and B, each looping back, stop allowed at the start place.
    fn choice_loop() -> Net {
        let mut net = Net::empty();
        let p = net.add_place(Place::new_with_tokens("p", 1));
        for (name, label) in [("a", "A"), ("b", "B")] {
            let t = net.add_transition(Transition::labelled(name, label));
            net.add_input_arc(p, t, 1);
            net.add_output_arc(p, t, 1);
        }
        net
    }

    fn assemble(net: &Net, seed: u64, parallel: bool) -> (EventLog, PlayoutSummary) {
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let limits = TraceLimits {
            max_trace_length: 8,
            max_silent_steps: 10,
        };
        let driver = Driver::new(net, &initial, &initial, &weights, limits);
        let (log, summary, _) = LogAssembler::new(driver, keys(), 40, seed)
            .parallel(parallel)
            .assemble(Clock::default())
            .unwrap();
        (log, summary)
    }

    #[test]
    fn timestamps_increase_across_traces() {
        let (log, summary) = assemble(&choice_loop(), 5, false);
        let stamps: Vec<_> = log
            .events()
            .filter_map(|event| event.get(DEFAULT_TIMESTAMP_KEY)?.as_timestamp())
            .collect();
        assert_eq!(stamps.len(), summary.events);
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
        if let Some(first) = stamps.first() {
            assert_eq!(first.as_secs(), Clock::DEFAULT_EPOCH_OFFSET);
        }
    }

    #[test]
    fn case_ids_follow_case_order() {
        let (log, summary) = assemble(&choice_loop(), 5, false);
        assert_eq!(log.len(), 40);
        assert_eq!(summary.traces, 40);
        assert_eq!(
            summary.stopped_by_choice + summary.stopped_by_length_limit,
            40
        );
        for (case, trace) in log.iter().enumerate() {
            assert_eq!(
                trace.attributes[DEFAULT_TRACEID_KEY].as_str(),
                Some(case.to_string().as_str())
            );
        }
    }

    #[test]
    fn parallel_and_sequential_logs_match() {
        let net = choice_loop();
        assert_eq!(assemble(&net, 77, false), assemble(&net, 77, true));
    }

    #[test]
    fn returned_clock_continues_after_the_last_event() {
        let net = choice_loop();
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let limits = TraceLimits {
            max_trace_length: 3,
            max_silent_steps: 10,
        };
        let nowhere = Marking::default();
        let driver = Driver::new(&net, &initial, &nowhere, &weights, limits);
        let (log, summary, clock) = LogAssembler::new(driver, keys(), 4, 1)
            .assemble(Clock::starting_at(100))
            .unwrap();
        assert_eq!(summary.events, 12);
        assert_eq!(log.events().count(), 12);
        assert_eq!(clock.peek(), 112);
    }

    #[test]
    fn clock_overflow_is_reported() {
        let net = choice_loop();
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let limits = TraceLimits {
            max_trace_length: 3,
            max_silent_steps: 10,
        };
        let nowhere = Marking::default();
        let driver = Driver::new(&net, &initial, &nowhere, &weights, limits);
        let err = LogAssembler::new(driver, keys(), 2, 1)
            .assemble(Clock::starting_at(u64::MAX - 1))
            .unwrap_err();
        assert!(matches!(err, PlayoutError::Clock(ClockError::OutOfRange(_))));
    }
}
