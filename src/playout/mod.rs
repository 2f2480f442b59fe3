//! Stochastic playout: simulate a net many times and collect the runs as an event log.
//!
//! ```rust
//! use pn_playout::net::*;
//! use pn_playout::playout::Playout;
//! use pn_playout::stochastic::{MissingWeight, StochasticMap};
//! use pn_playout::PlayoutConfig;
//!
//! let mut net = Net::empty();
//! let p0 = net.add_place(Place::new_with_tokens("p0", 1));
//! let p1 = net.add_place(Place::new("p1"));
//! let t1 = net.add_transition(Transition::labelled("t1", "A"));
//! net.add_input_arc(p0, t1, 1);
//! net.add_output_arc(p1, t1, 1);
//!
//! let initial = net.initial_marking();
//! let final_marking = Marking::from_pairs([(p1, 1)]);
//! let weights = StochasticMap::from_flat_weights([(t1, 1.0)], 0.0, MissingWeight::Reject).unwrap();
//! let config = PlayoutConfig::default().with_traces(5, 10).with_seed(1);
//!
//! let result = Playout::new(&net, &initial)
//!     .final_marking(&final_marking)
//!     .weights(&weights)
//!     .run(&config)
//!     .unwrap();
//! assert_eq!(result.log.len(), 5);
//! assert!(result.log.iter().all(|trace| trace.len() == 1));
//! ```

pub mod assembler;
pub mod driver;
pub mod selector;

use thiserror::Error;

use crate::config::PlayoutConfig;
use crate::event_log::{Clock, ClockError, EventLog};
use crate::net::{FinalMarkingDiscovery, FireError, Marking, Net, NetError, SinkPlaces};
use crate::stochastic::{FrequencyEstimator, StochasticMap, WeightError, WeightEstimator};

pub use assembler::{AttributeKeys, LogAssembler, PlayoutSummary, trace_rng};
pub use driver::{Driver, PlayoutState, TraceLimits, TraceRun};
pub use selector::Selector;

#[derive(Debug, Error)]
pub enum PlayoutError {
    #[error("please provide at least one of a stochastic map and a non-empty reference log")]
    MissingWeightSource,
    #[error("malformed net: {0}")]
    Net(#[from] NetError),
    #[error("firing failed: {0}")]
    Fire(#[from] FireError),
    #[error("weight model rejected: {0}")]
    Weights(#[from] WeightError),
    #[error("event clock overflow: {0}")]
    Clock(#[from] ClockError),
}

/// A generated log and what produced it.
#[derive(Debug, Clone)]
pub struct PlayoutResult {
    pub log: EventLog,
    pub summary: PlayoutSummary,
    /// Seed the per-case random streams were derived from.
    pub seed: u64,
    /// The final marking used, given or discovered.
    pub final_marking: Marking,
    /// The weight model used, given or estimated.
    pub weights: StochasticMap,
}

/// Playout of one net, with the optional inputs set through builder methods.
pub struct Playout<'a> {
    net: &'a Net,
    initial_marking: &'a Marking,
    final_marking: Option<&'a Marking>,
    weights: Option<&'a StochasticMap>,
    reference_log: Option<&'a EventLog>,
    discovery: Box<dyn FinalMarkingDiscovery + 'a>,
    /// Falls back to a [`FrequencyEstimator`] on the configured activity key.
    estimator: Option<Box<dyn WeightEstimator + 'a>>,
}

impl<'a> Playout<'a> {
    pub fn new(net: &'a Net, initial_marking: &'a Marking) -> Self {
        Self {
            net,
            initial_marking,
            final_marking: None,
            weights: None,
            reference_log: None,
            discovery: Box::new(SinkPlaces),
            estimator: None,
        }
    }

    pub fn final_marking(mut self, final_marking: &'a Marking) -> Self {
        self.final_marking = Some(final_marking);
        self
    }

    pub fn weights(mut self, weights: &'a StochasticMap) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn reference_log(mut self, log: &'a EventLog) -> Self {
        self.reference_log = Some(log);
        self
    }

    /// Replaces [`SinkPlaces`] as the source of a missing final marking.
    pub fn discovery(mut self, discovery: impl FinalMarkingDiscovery + 'a) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    /// Replaces [`FrequencyEstimator`] as the source of a missing weight model.
    pub fn estimator(mut self, estimator: impl WeightEstimator + 'a) -> Self {
        self.estimator = Some(Box::new(estimator));
        self
    }

    pub fn run(&self, config: &PlayoutConfig) -> Result<PlayoutResult, PlayoutError> {
        let net = self.net;
        let reference_log = self.reference_log.filter(|log| !log.is_empty());
        if self.weights.is_none() && reference_log.is_none() {
            return Err(PlayoutError::MissingWeightSource);
        }

        net.validate()?;
        net.check_marking(self.initial_marking)
            .map_err(NetError::from)?;

        let final_marking = match self.final_marking {
            Some(marking) => marking.clone(),
            None => {
                let marking = self.discovery.discover(net);
                log::info!("no final marking given, using {marking:?}");
                marking
            }
        };
        net.check_marking(&final_marking).map_err(NetError::from)?;

        let weights = match (self.weights, reference_log) {
            (Some(weights), _) => weights.clone(),
            (None, Some(log)) => {
                let estimated = match &self.estimator {
                    Some(estimator) => {
                        estimator.estimate(log, net, self.initial_marking, &final_marking)?
                    }
                    None => FrequencyEstimator {
                        activity_key: config.activity_key.clone(),
                    }
                    .estimate(log, net, self.initial_marking, &final_marking)?,
                };
                log::info!(
                    "estimated {} weights from {} reference traces",
                    estimated.len(),
                    log.len()
                );
                estimated
            }
            (None, None) => return Err(PlayoutError::MissingWeightSource),
        };
        weights.validate(net)?;
        net.log_diagnostics();

        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!(
            "playing out {} traces (max length {}) with seed {seed}",
            config.no_traces,
            config.max_trace_length
        );

        let limits = TraceLimits {
            max_trace_length: config.max_trace_length,
            max_silent_steps: config.max_silent_steps,
        };
        let keys = AttributeKeys {
            case_id: config.case_id_key.clone(),
            activity: config.activity_key.clone(),
            timestamp: config.timestamp_key.clone(),
        };
        let driver = Driver::new(net, self.initial_marking, &final_marking, &weights, limits);
        let (log, summary, _) = LogAssembler::new(driver, keys, config.no_traces, seed)
            .parallel(config.parallel)
            .assemble(Clock::starting_at(config.start_timestamp))?;

        log::info!(
            "generated {} traces with {} events",
            summary.traces,
            summary.events
        );
        Ok(PlayoutResult {
            log,
            summary,
            seed,
            final_marking,
            weights,
        })
    }
}

/// Function form of [`Playout`].
pub fn playout(
    net: &Net,
    initial_marking: &Marking,
    final_marking: Option<&Marking>,
    weights: Option<&StochasticMap>,
    reference_log: Option<&EventLog>,
    config: &PlayoutConfig,
) -> Result<PlayoutResult, PlayoutError> {
    let mut builder = Playout::new(net, initial_marking);
    builder.final_marking = final_marking;
    builder.weights = weights;
    builder.reference_log = reference_log;
    builder.run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::DEFAULT_NAME_KEY;
    use crate::net::{Incidence, Place, Transition};

    fn sequence() -> Net {
        let mut net = Net::empty();
        let p0 = net.add_place(Place::new_with_tokens("p0", 1));
        let p1 = net.add_place(Place::new("p1"));
        let t = net.add_transition(Transition::labelled("t1", "A"));
        net.add_input_arc(p0, t, 1);
        net.add_output_arc(p1, t, 1);
        net
    }

    #[test]
    fn no_weight_source_fails_before_simulating() {
        let net = sequence();
        let initial = net.initial_marking();
        let config = PlayoutConfig::default();
        let err = playout(&net, &initial, None, None, None, &config).unwrap_err();
        assert!(matches!(err, PlayoutError::MissingWeightSource));

        let empty = EventLog::new();
        let err = playout(&net, &initial, None, None, Some(&empty), &config).unwrap_err();
        assert!(matches!(err, PlayoutError::MissingWeightSource));
    }

    #[test]
    fn reference_log_and_discovered_final_marking_are_used() {
        let net = sequence();
        let initial = net.initial_marking();
        let reference = EventLog::from_activities([["A"], ["A"]], DEFAULT_NAME_KEY);
        let config = PlayoutConfig::default().with_traces(3, 5).with_seed(9);
        let result = playout(&net, &initial, None, None, Some(&reference), &config).unwrap();

        assert_eq!(result.final_marking, Marking::from(vec![0, 1]));
        assert_eq!(result.summary.stopped_by_choice, 3);
        assert_eq!(result.seed, 9);
        assert!(result.log.iter().all(|trace| trace.len() == 1));
    }

    #[test]
    fn custom_discovery_is_consulted() {
        let net = sequence();
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let config = PlayoutConfig::default().with_traces(2, 5).with_seed(1);
        let result = Playout::new(&net, &initial)
            .weights(&weights)
            .discovery(|_: &Net| Marking::from(vec![7]))
            .run(&config)
            .unwrap();
        assert_eq!(result.summary.stopped_by_deadlock, 2);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let mut net = sequence();
        let weights = StochasticMap::default();
        let config = PlayoutConfig::default().with_seed(0);

        let stray = Marking::from(vec![1, 0, 4]);
        let err = playout(&net, &stray, None, Some(&weights), None, &config).unwrap_err();
        assert!(matches!(err, PlayoutError::Net(NetError::Marking(_))));

        net.pre = Incidence::new(3, 1, 0);
        let initial = net.initial_marking();
        let err = playout(&net, &initial, None, Some(&weights), None, &config).unwrap_err();
        assert!(matches!(err, PlayoutError::Net(NetError::ShapeMismatch { .. })));
    }

    #[test]
    fn rejected_weight_models_fail_before_simulating() {
        let net = sequence();
        let initial = net.initial_marking();
        let weights = StochasticMap::new(crate::stochastic::MissingWeight::Reject);
        let err = playout(&net, &initial, None, Some(&weights), None, &PlayoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, PlayoutError::Weights(WeightError::Missing(_))));
    }

    #[test]
    fn start_timestamps_past_the_date_range_fail_instead_of_wrapping() {
        let net = sequence();
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let config = PlayoutConfig {
            start_timestamp: u64::MAX,
            ..PlayoutConfig::default().with_traces(1, 10).with_seed(0)
        };
        let err = playout(&net, &initial, None, Some(&weights), None, &config).unwrap_err();
        assert!(matches!(err, PlayoutError::Clock(ClockError::OutOfRange(_))));
    }
}
