use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::net::{Idx, Net, TransitionId};
use crate::stochastic::WeightError;
use crate::stochastic::weight::{Likelihood, WeightDescriptor};

/// One option offered to the selector: fire a transition or end the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Choice {
    Transition(TransitionId),
    Stop,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Transition(id) => write!(f, "{id}"),
            Choice::Stop => f.write_str("stop"),
        }
    }
}

/// What a [`StochasticMap`] answers for a choice it has no entry for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingWeight {
    /// Every choice must have an entry; [`StochasticMap::validate`] fails otherwise.
    Reject,
    /// Missing choices weigh this much.
    Constant(f64),
}

impl Default for MissingWeight {
    fn default() -> Self {
        MissingWeight::Constant(1.0)
    }
}

/// Relative likelihoods of transitions and of stopping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StochasticMap {
    entries: IndexMap<Choice, WeightDescriptor>,
    missing: MissingWeight,
}

impl StochasticMap {
    pub fn new(missing: MissingWeight) -> Self {
        Self {
            entries: IndexMap::new(),
            missing,
        }
    }

    /// Flat weights for the listed transitions plus a stop weight.
    pub fn from_flat_weights<I>(
        weights: I,
        stop: f64,
        missing: MissingWeight,
    ) -> Result<Self, WeightError>
    where
        I: IntoIterator<Item = (TransitionId, f64)>,
    {
        let mut map = Self::new(missing);
        for (transition, weight) in weights {
            map.insert(Choice::Transition(transition), weight)?;
        }
        map.insert(Choice::Stop, stop)?;
        Ok(map)
    }

    pub fn insert(
        &mut self,
        choice: Choice,
        descriptor: impl Into<WeightDescriptor>,
    ) -> Result<Option<WeightDescriptor>, WeightError> {
        let descriptor = descriptor.into();
        descriptor
            .validate()
            .map_err(|err| WeightError::Entry(choice, Box::new(err)))?;
        Ok(self.entries.insert(choice, descriptor))
    }

    pub fn get(&self, choice: Choice) -> Option<&WeightDescriptor> {
        self.entries.get(&choice)
    }

    pub fn missing_weight(&self) -> MissingWeight {
        self.missing
    }

    pub fn set_missing_weight(&mut self, missing: MissingWeight) -> Result<(), WeightError> {
        if let MissingWeight::Constant(weight) = missing {
            WeightDescriptor::flat(weight).validate()?;
        }
        self.missing = missing;
        Ok(())
    }

    /// Weight of `choice`, falling back to the missing-weight constant.
    ///
    /// Under [`MissingWeight::Reject`] a missing entry weighs 0; maps are validated
    /// against the net before playout, so that case is not reached during simulation.
    pub fn weight(&self, choice: Choice) -> f64 {
        match (self.entries.get(&choice), self.missing) {
            (Some(descriptor), _) => descriptor.relative_likelihood(),
            (None, MissingWeight::Constant(weight)) => weight,
            (None, MissingWeight::Reject) => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Choice, &WeightDescriptor)> + '_ {
        self.entries.iter().map(|(choice, descriptor)| (*choice, descriptor))
    }

    /// Checks the map against `net` before any simulation uses it.
    pub fn validate(&self, net: &Net) -> Result<(), WeightError> {
        if let MissingWeight::Constant(weight) = self.missing {
            WeightDescriptor::flat(weight).validate()?;
        }
        for choice in self.entries.keys() {
            if let Choice::Transition(id) = *choice {
                if id.index() >= net.transitions_len() {
                    return Err(WeightError::UnknownTransition(id));
                }
            }
        }
        if matches!(self.missing, MissingWeight::Reject) {
            let required = net
                .transitions
                .indices()
                .map(Choice::Transition)
                .chain(std::iter::once(Choice::Stop));
            for choice in required {
                if !self.entries.contains_key(&choice) {
                    return Err(WeightError::Missing(choice));
                }
            }
        }
        Ok(())
    }
}

/// Name-keyed form of a [`StochasticMap`] used in weight files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightFile {
    #[serde(default)]
    pub transitions: IndexMap<String, WeightDescriptor>,
    #[serde(default)]
    pub stop: Option<WeightDescriptor>,
    #[serde(default)]
    pub missing_weight: MissingWeight,
}

impl WeightFile {
    pub fn resolve(&self, net: &Net) -> Result<StochasticMap, WeightError> {
        let mut map = StochasticMap::new(MissingWeight::default());
        map.set_missing_weight(self.missing_weight)?;
        for (name, descriptor) in &self.transitions {
            let id = net
                .transition_by_name(name)
                .ok_or_else(|| WeightError::UnknownTransitionName(name.clone()))?;
            map.insert(Choice::Transition(id), *descriptor)?;
        }
        if let Some(stop) = self.stop {
            map.insert(Choice::Stop, stop)?;
        }
        map.validate(net)?;
        Ok(map)
    }

    pub fn from_map(map: &StochasticMap, net: &Net) -> Self {
        let mut file = WeightFile {
            missing_weight: map.missing_weight(),
            ..WeightFile::default()
        };
        for (choice, descriptor) in map.iter() {
            match choice {
                Choice::Transition(id) => {
                    if let Some(transition) = net.get_transition(id) {
                        file.transitions.insert(transition.name.clone(), *descriptor);
                    }
                }
                Choice::Stop => file.stop = Some(*descriptor),
            }
        }
        file
    }
}
