//! 运行时：可发生集、发生语义与结构诊断。
use std::fmt;

use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Marking, Place, Transition, Weight};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
    #[error("marking holds {tokens} token(s) on place {place:?}, which is not part of the net")]
    UnknownPlace { place: PlaceId, tokens: Weight },
    #[error("firing {transition:?} overflows the token count of place {place:?}")]
    Overflow {
        transition: TransitionId,
        place: PlaceId,
    },
}

/// Structural defects of a net, usually the result of deserialising a hand-written file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("{matrix} matrix is {rows}x{cols}, net has {places} places and {transitions} transitions")]
    ShapeMismatch {
        matrix: &'static str,
        rows: usize,
        cols: usize,
        places: usize,
        transitions: usize,
    },
    #[error(transparent)]
    Marking(#[from] FireError),
}

/// Connectivity report produced by [`Net::diagnose_connectivity`].
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    pub isolated_places: Vec<(PlaceId, String)>,
    pub isolated_transitions: Vec<(TransitionId, String)>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.warnings.is_empty()
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Net {
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    pub pre: Incidence<Weight>,
    pub post: Incidence<Weight>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

impl Net {
    pub fn empty() -> Self {
        Self {
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            pre: Incidence::new(0, 0, 0),
            post: Incidence::new(0, 0, 0),
        }
    }

    pub fn add_place(&mut self, place: Place) -> PlaceId {
        let place_id = self.places.push(place);
        self.pre.push_place_with_default(0);
        self.post.push_place_with_default(0);
        place_id
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionId {
        let transition_id = self.transitions.push(transition);
        self.pre.push_transition_with_default(0);
        self.post.push_transition_with_default(0);
        transition_id
    }

    /// 输入弧: place -> transition
    pub fn add_input_arc(&mut self, place: PlaceId, transition: TransitionId, weight: Weight) {
        if weight == 0 {
            return;
        }
        *self.pre.get_mut(place, transition) += weight;
    }

    /// 输出弧: transition -> place
    pub fn add_output_arc(&mut self, place: PlaceId, transition: TransitionId, weight: Weight) {
        if weight == 0 {
            return;
        }
        *self.post.get_mut(place, transition) += weight;
    }

    pub fn get_transition(&self, transition: TransitionId) -> Option<&Transition> {
        self.transitions.get(transition)
    }

    pub fn transition_by_name(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, transition)| transition.name == name)
            .map(|(id, _)| id)
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    /// Observable labels of the net, in transition order, without duplicates.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in self.transitions.iter().filter_map(|t| t.label.as_deref()) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// Marking given by the `tokens` field of each place.
    pub fn initial_marking(&self) -> Marking {
        self.places.iter().map(|p| p.tokens).collect::<Vec<_>>().into()
    }

    pub fn validate(&self) -> Result<(), NetError> {
        let places = self.places_len();
        let transitions = self.transitions_len();
        for (matrix, incidence) in [("pre", &self.pre), ("post", &self.post)] {
            if incidence.places() != places
                || incidence.transitions() != transitions
                || !incidence.is_rectangular()
            {
                return Err(NetError::ShapeMismatch {
                    matrix,
                    rows: incidence.places(),
                    cols: incidence.transitions(),
                    places,
                    transitions,
                });
            }
        }
        Ok(())
    }

    /// Rejects markings that put tokens on places the net does not have.
    pub fn check_marking(&self, marking: &Marking) -> Result<(), FireError> {
        match marking
            .support()
            .find(|(place, _)| place.index() >= self.places_len())
        {
            Some((place, tokens)) => Err(FireError::UnknownPlace { place, tokens }),
            None => Ok(()),
        }
    }

    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut isolated_places = Vec::new();
        let mut isolated_transitions = Vec::new();
        let mut warnings = Vec::new();

        for (place_id, place) in self.places.iter_enumerated() {
            let consumed = self.pre.row_is_connected(place_id);
            let produced = self.post.row_is_connected(place_id);
            if !consumed && !produced {
                isolated_places.push((place_id, place.name.clone()));
            } else if !produced && place.tokens == 0 {
                warnings.push(format!(
                    "place '{}' ({place_id}) has no incoming arc and no initial tokens",
                    place.name
                ));
            }
        }

        for (trans_id, trans) in self.transitions.iter_enumerated() {
            let has_preset = self.pre.column(trans_id).next().is_some();
            let has_postset = self.post.column(trans_id).next().is_some();
            if !has_preset && !has_postset {
                isolated_transitions.push((trans_id, trans.name.clone()));
            } else if !has_preset {
                warnings.push(format!(
                    "transition '{}' ({trans_id}) has an empty preset and is always enabled",
                    trans.name
                ));
            }
        }

        DiagnosticReport {
            isolated_places,
            isolated_transitions,
            warnings,
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
        }
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();
        if !report.has_issues() {
            log::debug!(
                "net connectivity ok: {} places, {} transitions",
                report.total_places,
                report.total_transitions
            );
            return;
        }
        for (id, name) in &report.isolated_places {
            log::warn!("isolated place {id} '{name}'");
        }
        for (id, name) in &report.isolated_transitions {
            log::warn!("isolated transition {id} '{name}'");
        }
        for warning in &report.warnings {
            log::warn!("{warning}");
        }
    }

    /// Transitions enabled under `marking`, in ascending id order.
    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transitions
            .indices()
            .filter(|&transition| self.is_transition_enabled(transition, marking))
            .collect()
    }

    /// Fires `transition` and returns the successor marking; `marking` is left untouched.
    pub fn fire_transition(
        &self,
        marking: &Marking,
        transition: TransitionId,
    ) -> Result<Marking, FireError> {
        if transition.index() >= self.transitions_len() {
            return Err(FireError::OutOfBounds(transition));
        }
        self.check_marking(marking)?;
        if !self.is_transition_enabled(transition, marking) {
            return Err(FireError::NotEnabled(transition));
        }

        let mut next = marking.clone();
        for (place, weight) in self.pre.column(transition) {
            let tokens = next.tokens_mut(place);
            *tokens = tokens
                .checked_sub(weight)
                .ok_or(FireError::NotEnabled(transition))?;
        }
        for (place, weight) in self.post.column(transition) {
            let tokens = next.tokens_mut(place);
            *tokens = tokens
                .checked_add(weight)
                .ok_or(FireError::Overflow { transition, place })?;
        }
        Ok(next)
    }

    fn is_transition_enabled(&self, transition: TransitionId, marking: &Marking) -> bool {
        transition.index() < self.transitions_len()
            && self
                .pre
                .column(transition)
                .all(|(place, weight)| marking.tokens(place) >= weight)
    }
}

impl Default for Net {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_net() -> (Net, PlaceId, PlaceId, TransitionId) {
        let mut net = Net::empty();
        let p0 = net.add_place(Place::new_with_tokens("p0", 1));
        let p1 = net.add_place(Place::new("p1"));
        let t0 = net.add_transition(Transition::labelled("t0", "A"));
        net.add_input_arc(p0, t0, 1);
        net.add_output_arc(p1, t0, 1);
        (net, p0, p1, t0)
    }

    #[test]
    fn add_place_and_transition_updates_incidence() {
        let mut net = Net::empty();
        let p = net.add_place(Place::new_with_tokens("p", 1));
        let t = net.add_transition(Transition::new("t"));

        net.add_input_arc(p, t, 1);
        net.add_output_arc(p, t, 1);

        assert_eq!(net.places_len(), 1);
        assert_eq!(net.transitions_len(), 1);
        assert_eq!(*net.pre.get(p, t), 1);
        assert_eq!(*net.post.get(p, t), 1);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn firing_moves_tokens_without_touching_the_source_marking() {
        let (net, p0, p1, t0) = sequence_net();
        let marking = net.initial_marking();
        assert_eq!(net.enabled_transitions(&marking), vec![t0]);

        let next = net.fire_transition(&marking, t0).unwrap();
        assert_eq!(next.tokens(p0), 0);
        assert_eq!(next.tokens(p1), 1);
        assert_eq!(marking.tokens(p0), 1);
        assert!(net.enabled_transitions(&next).is_empty());
    }

    #[test]
    fn firing_a_disabled_transition_is_rejected() {
        let (net, _, _, t0) = sequence_net();
        let empty = Marking::empty(net.places_len());
        assert_eq!(
            net.fire_transition(&empty, t0),
            Err(FireError::NotEnabled(t0))
        );
        assert_eq!(
            net.fire_transition(&empty, TransitionId::new(9)),
            Err(FireError::OutOfBounds(TransitionId::new(9)))
        );
    }

    #[test]
    fn arc_multiplicities_are_respected() {
        let mut net = Net::empty();
        let p = net.add_place(Place::new_with_tokens("p", 1));
        let q = net.add_place(Place::new("q"));
        let t = net.add_transition(Transition::new("t"));
        net.add_input_arc(p, t, 2);
        net.add_output_arc(q, t, 3);

        assert!(net.enabled_transitions(&net.initial_marking()).is_empty());
        let marking = Marking::from_pairs([(p, 2)]);
        let next = net.fire_transition(&marking, t).unwrap();
        assert_eq!(next, Marking::from_pairs([(q, 3)]));
    }

    #[test]
    fn tokens_on_unknown_places_are_structural_errors() {
        let (net, _, _, t0) = sequence_net();
        let stray = Marking::from_pairs([(PlaceId::new(0), 1), (PlaceId::new(5), 2)]);
        let err = net.fire_transition(&stray, t0).unwrap_err();
        assert_eq!(
            err,
            FireError::UnknownPlace {
                place: PlaceId::new(5),
                tokens: 2
            }
        );
    }

    #[test]
    fn validate_detects_mismatched_incidence() {
        let (mut net, _, _, _) = sequence_net();
        net.post = Incidence::new(1, 1, 0);
        assert!(matches!(
            net.validate(),
            Err(NetError::ShapeMismatch { matrix: "post", .. })
        ));
    }

    #[test]
    fn diagnostics_flag_isolated_nodes() {
        let (mut net, _, _, _) = sequence_net();
        net.add_place(Place::new("orphan"));
        let always = net.add_transition(Transition::new("source"));
        net.add_output_arc(PlaceId::new(0), always, 1);

        let report = net.diagnose_connectivity();
        assert_eq!(report.isolated_places.len(), 1);
        assert!(report.isolated_transitions.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.has_issues());
    }

    #[test]
    fn labels_are_deduplicated_in_transition_order() {
        let mut net = Net::empty();
        net.add_transition(Transition::labelled("a1", "A"));
        net.add_transition(Transition::new("tau"));
        net.add_transition(Transition::labelled("b", "B"));
        net.add_transition(Transition::labelled("a2", "A"));
        assert_eq!(net.labels(), vec!["A", "B"]);
        assert_eq!(net.transition_by_name("b"), Some(TransitionId::new(2)));
    }
}
