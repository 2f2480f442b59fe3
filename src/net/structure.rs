//! P/T 网静态结构元素：库所、迁移与标识。
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::net::ids::PlaceId;
use crate::net::index_vec::IndexVec;

pub type Weight = u64;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct Place {
    pub name: String,
    /// Tokens this place holds in the net's default initial marking.
    #[serde(default)]
    pub tokens: Weight,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_with_tokens(name, 0)
    }

    pub fn new_with_tokens(name: impl Into<String>, tokens: Weight) -> Self {
        Self {
            name: name.into(),
            tokens,
        }
    }
}

/// A transition; `label == None` marks a silent (invisible) step.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    pub fn labelled(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.label.is_none()
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "Transition({}: {:?})", self.name, label),
            None => write!(f, "Transition({}: τ)", self.name),
        }
    }
}

/// Token counts per place.
///
/// Places past the end of the vector hold zero tokens, so `[1]` and `[1, 0, 0]`
/// denote the same marking; `PartialEq` and `Hash` both follow that rule.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking(pub IndexVec<PlaceId, Weight>);

impl Marking {
    /// All-zero marking sized for `places` places.
    pub fn empty(places: usize) -> Self {
        Self(IndexVec::from_vec(vec![0; places]))
    }

    /// Builds a marking from `(place, tokens)` pairs; repeated places accumulate.
    pub fn from_pairs<It>(pairs: It) -> Self
    where
        It: IntoIterator<Item = (PlaceId, Weight)>,
    {
        let mut marking = Self::default();
        for (place, tokens) in pairs {
            *marking.tokens_mut(place) += tokens;
        }
        marking
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, &Weight)> + '_ {
        self.0.iter_enumerated()
    }

    /// Places holding at least one token.
    pub fn support(&self) -> impl Iterator<Item = (PlaceId, Weight)> + '_ {
        self.iter()
            .filter(|(_, tokens)| **tokens > 0)
            .map(|(place, tokens)| (place, *tokens))
    }

    pub fn tokens(&self, place: PlaceId) -> Weight {
        self.0.get(place).copied().unwrap_or(0)
    }

    pub fn tokens_mut(&mut self, place: PlaceId) -> &mut Weight {
        self.0.ensure_index(place, 0);
        &mut self.0[place]
    }

    fn significant(&self) -> &[Weight] {
        let data = self.0.as_slice();
        let end = data.iter().rposition(|tokens| *tokens > 0).map_or(0, |i| i + 1);
        &data[..end]
    }
}

impl PartialEq for Marking {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Marking {}

impl Hash for Marking {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.support() {
            map.entry(&place, &tokens);
        }
        map.finish()
    }
}

impl From<Vec<Weight>> for Marking {
    fn from(value: Vec<Weight>) -> Self {
        Self(IndexVec::from_vec(value))
    }
}
