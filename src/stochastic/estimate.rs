//! Weight estimation from a reference log.
use itertools::Itertools;

use crate::event_log::{AttributeValue, DEFAULT_NAME_KEY, EventLog};
use crate::net::{Marking, Net};
use crate::stochastic::map::{Choice, MissingWeight, StochasticMap};
use crate::stochastic::WeightError;

/// Derives a [`StochasticMap`] for `net` from observed behaviour.
pub trait WeightEstimator {
    fn estimate(
        &self,
        log: &EventLog,
        net: &Net,
        initial_marking: &Marking,
        final_marking: &Marking,
    ) -> Result<StochasticMap, WeightError>;
}

/// Activity frequencies, without replaying the log on the net.
///
/// A labelled transition weighs the number of events carrying its label, split evenly
/// between transitions that share the label. Silent transitions weigh the mean of the
/// non-zero labelled weights (1 when there are none), and stopping weighs the number of
/// traces, one completion per case.
#[derive(Debug, Clone)]
pub struct FrequencyEstimator {
    pub activity_key: String,
}

impl Default for FrequencyEstimator {
    fn default() -> Self {
        Self {
            activity_key: DEFAULT_NAME_KEY.to_owned(),
        }
    }
}

impl WeightEstimator for FrequencyEstimator {
    fn estimate(
        &self,
        log: &EventLog,
        net: &Net,
        _initial_marking: &Marking,
        _final_marking: &Marking,
    ) -> Result<StochasticMap, WeightError> {
        if log.is_empty() {
            return Err(WeightError::EmptyReferenceLog);
        }

        let occurrences = log
            .events()
            .filter_map(|event| event.get(&self.activity_key).and_then(AttributeValue::as_str))
            .counts();
        let sharing = net
            .transitions
            .iter()
            .filter_map(|transition| transition.label.as_deref())
            .counts();

        let mut map = StochasticMap::new(MissingWeight::Reject);
        let mut observed = Vec::new();
        for (id, transition) in net.transitions.iter_enumerated() {
            let Some(label) = transition.label.as_deref() else {
                continue;
            };
            let seen = occurrences.get(label).copied().unwrap_or(0) as f64;
            let weight = seen / sharing[label] as f64;
            if weight > 0.0 {
                observed.push(weight);
            }
            map.insert(Choice::Transition(id), weight)?;
        }

        let silent_weight = if observed.is_empty() {
            1.0
        } else {
            observed.iter().sum::<f64>() / observed.len() as f64
        };
        for (id, transition) in net.transitions.iter_enumerated() {
            if transition.is_silent() {
                map.insert(Choice::Transition(id), silent_weight)?;
            }
        }
        map.insert(Choice::Stop, log.len() as f64)?;

        let unmatched = occurrences
            .keys()
            .filter(|label| !sharing.contains_key(*label))
            .sorted()
            .collect::<Vec<_>>();
        if !unmatched.is_empty() {
            log::warn!("reference log activities absent from the net: {unmatched:?}");
        }
        log::debug!(
            "estimated {} weights from {} traces",
            map.len(),
            log.len()
        );
        Ok(map)
    }
}
