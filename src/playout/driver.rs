//! Single-trace simulation.
//!
//! The driver is a small state machine over [`PlayoutState`]. Starting in `Running` at the
//! initial marking, each step recomputes the enabled set, asks the [`Selector`] for a
//! choice and fires it, until one of the three terminal states is reached. Every terminal
//! state yields a valid (possibly short) trace.
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::net::{FireError, Marking, Net, TransitionId};
use crate::playout::selector::Selector;
use crate::stochastic::{Choice, StochasticMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoutState {
    Running,
    /// `Stop` was drawn at the final marking.
    StoppedByChoice,
    /// Nothing enabled outside the final marking.
    StoppedByDeadlock,
    /// The event budget or the silent-step guard ran out.
    StoppedByLengthLimit,
}

impl PlayoutState {
    pub fn is_terminal(self) -> bool {
        self != PlayoutState::Running
    }
}

impl fmt::Display for PlayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlayoutState::Running => "running",
            PlayoutState::StoppedByChoice => "stopped by choice",
            PlayoutState::StoppedByDeadlock => "stopped by deadlock",
            PlayoutState::StoppedByLengthLimit => "stopped by length limit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLimits {
    /// Maximum number of events in one trace.
    pub max_trace_length: usize,
    /// Maximum number of consecutive silent firings.
    pub max_silent_steps: usize,
}

/// Outcome of one simulated case, before timestamps and case ids are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRun<'a> {
    /// Labels of the observable transitions fired, in order.
    pub activities: Vec<&'a str>,
    pub state: PlayoutState,
    /// All firings, silent ones included.
    pub firings: usize,
    pub final_marking: Marking,
}

struct RunState<'a> {
    marking: Marking,
    activities: Vec<&'a str>,
    firings: usize,
    silent_streak: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Driver<'a> {
    net: &'a Net,
    initial_marking: &'a Marking,
    final_marking: &'a Marking,
    selector: Selector<'a>,
    limits: TraceLimits,
}

impl<'a> Driver<'a> {
    pub fn new(
        net: &'a Net,
        initial_marking: &'a Marking,
        final_marking: &'a Marking,
        weights: &'a StochasticMap,
        limits: TraceLimits,
    ) -> Self {
        Self {
            net,
            initial_marking,
            final_marking,
            selector: Selector::new(weights),
            limits,
        }
    }

    /// Simulates one case from the initial marking until a terminal state.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<TraceRun<'a>, FireError> {
        let mut run = RunState {
            marking: self.initial_marking.clone(),
            activities: Vec::new(),
            firings: 0,
            silent_streak: 0,
        };
        let mut state = PlayoutState::Running;
        while !state.is_terminal() {
            state = self.step(&mut run, rng)?;
        }
        log::trace!(
            "trace ended {state} after {} firings, {} events",
            run.firings,
            run.activities.len()
        );
        Ok(TraceRun {
            activities: run.activities,
            state,
            firings: run.firings,
            final_marking: run.marking,
        })
    }

    fn step<R: Rng>(
        &self,
        run: &mut RunState<'a>,
        rng: &mut R,
    ) -> Result<PlayoutState, FireError> {
        if run.activities.len() >= self.limits.max_trace_length {
            return Ok(PlayoutState::StoppedByLengthLimit);
        }

        let enabled = self.net.enabled_transitions(&run.marking);
        let at_final_marking = run.marking == *self.final_marking;
        if enabled.is_empty() {
            // At the final marking stop is the only candidate left.
            return Ok(if at_final_marking {
                PlayoutState::StoppedByChoice
            } else {
                PlayoutState::StoppedByDeadlock
            });
        }

        let candidates = Selector::candidates(&enabled, at_final_marking);
        let transition = match self.selector.select(&candidates, rng) {
            Some(Choice::Transition(transition)) => transition,
            Some(Choice::Stop) => return Ok(PlayoutState::StoppedByChoice),
            None => return Ok(PlayoutState::StoppedByDeadlock),
        };
        self.fire(run, transition)
    }

    fn fire(
        &self,
        run: &mut RunState<'a>,
        transition: TransitionId,
    ) -> Result<PlayoutState, FireError> {
        let label = self
            .net
            .get_transition(transition)
            .ok_or(FireError::OutOfBounds(transition))?
            .label
            .as_deref();
        if label.is_none() && run.silent_streak >= self.limits.max_silent_steps {
            log::debug!(
                "{} consecutive silent firings, cutting the trace",
                run.silent_streak
            );
            return Ok(PlayoutState::StoppedByLengthLimit);
        }

        run.marking = self.net.fire_transition(&run.marking, transition)?;
        run.firings += 1;
        match label {
            Some(label) => {
                run.activities.push(label);
                run.silent_streak = 0;
            }
            None => run.silent_streak += 1,
        }
        Ok(PlayoutState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Place, PlaceId, Transition};
    use crate::stochastic::MissingWeight;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const LIMITS: TraceLimits = TraceLimits {
        max_trace_length: 10,
        max_silent_steps: 100,
    };

    /// p0 -A-> p1 -τ-> p2 -B-> p3
    fn sequence() -> Net {
        let mut net = Net::empty();
        let places: Vec<PlaceId> = (0..4)
            .map(|i| {
                let tokens = u64::from(i == 0);
                net.add_place(Place::new_with_tokens(format!("p{i}"), tokens))
            })
            .collect();
        let steps = [
            Transition::labelled("a", "A"),
            Transition::new("tau"),
            Transition::labelled("b", "B"),
        ];
        for (i, transition) in steps.into_iter().enumerate() {
            let t = net.add_transition(transition);
            net.add_input_arc(places[i], t, 1);
            net.add_output_arc(places[i + 1], t, 1);
        }
        net
    }

    /// A single place with a self-loop, silent when `label` is `None`.
    fn self_loop(label: Option<&str>) -> Net {
        let mut net = Net::empty();
        let p = net.add_place(Place::new_with_tokens("p", 1));
        let t = net.add_transition(match label {
            Some(label) => Transition::labelled("loop", label),
            None => Transition::new("loop"),
        });
        net.add_input_arc(p, t, 1);
        net.add_output_arc(p, t, 1);
        net
    }

    #[test]
    fn silent_transitions_fire_without_events() {
        let net = sequence();
        let initial = net.initial_marking();
        let final_marking = Marking::from_pairs([(PlaceId::new(3), 1)]);
        let weights = StochasticMap::default();
        let driver = Driver::new(&net, &initial, &final_marking, &weights, LIMITS);

        let run = driver.run(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(run.activities, vec!["A", "B"]);
        assert_eq!(run.firings, 3);
        assert_eq!(run.state, PlayoutState::StoppedByChoice);
        assert_eq!(run.final_marking, final_marking);
    }

    #[test]
    fn dead_end_outside_the_final_marking_is_a_deadlock() {
        let net = sequence();
        let initial = net.initial_marking();
        let unreachable = Marking::from_pairs([(PlaceId::new(0), 5)]);
        let weights = StochasticMap::default();
        let driver = Driver::new(&net, &initial, &unreachable, &weights, LIMITS);

        let run = driver.run(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(run.state, PlayoutState::StoppedByDeadlock);
        assert_eq!(run.activities.len(), 2);
    }

    #[test]
    fn immediate_deadlock_gives_an_empty_trace() {
        let net = sequence();
        let initial = Marking::empty(net.places_len());
        let final_marking = Marking::from_pairs([(PlaceId::new(3), 1)]);
        let weights = StochasticMap::default();
        let driver = Driver::new(&net, &initial, &final_marking, &weights, LIMITS);

        let run = driver.run(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert!(run.activities.is_empty());
        assert_eq!(run.firings, 0);
        assert_eq!(run.state, PlayoutState::StoppedByDeadlock);
    }

    #[test]
    fn loops_are_cut_at_the_length_limit() {
        let net = self_loop(Some("L"));
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let driver = Driver::new(&net, &initial, &initial, &weights, LIMITS);
        let never_stop = StochasticMap::from_flat_weights(
            [(TransitionId::new(0), 1.0)],
            0.0,
            MissingWeight::Reject,
        )
        .unwrap();
        let eager = Driver::new(&net, &initial, &initial, &never_stop, LIMITS);

        let run = eager.run(&mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(run.activities.len(), LIMITS.max_trace_length);
        assert_eq!(run.state, PlayoutState::StoppedByLengthLimit);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            let run = driver.run(&mut rng).unwrap();
            assert!(run.activities.len() <= LIMITS.max_trace_length);
        }
    }

    #[test]
    fn silent_loops_are_cut_by_the_silent_step_guard() {
        let net = self_loop(None);
        let initial = net.initial_marking();
        let elsewhere = Marking::default();
        let weights = StochasticMap::default();
        let limits = TraceLimits {
            max_trace_length: 10,
            max_silent_steps: 25,
        };
        let driver = Driver::new(&net, &initial, &elsewhere, &weights, limits);

        let run = driver.run(&mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert!(run.activities.is_empty());
        assert_eq!(run.firings, 25);
        assert_eq!(run.state, PlayoutState::StoppedByLengthLimit);
    }

    #[test]
    fn zero_length_limit_yields_empty_traces() {
        let net = sequence();
        let initial = net.initial_marking();
        let weights = StochasticMap::default();
        let limits = TraceLimits {
            max_trace_length: 0,
            max_silent_steps: 100,
        };
        let driver = Driver::new(&net, &initial, &initial, &weights, limits);
        let run = driver.run(&mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_eq!(run.firings, 0);
        assert_eq!(run.state, PlayoutState::StoppedByLengthLimit);
    }
}
