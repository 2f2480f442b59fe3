//! 输入/输出弧权重矩阵：按库所分行、按迁移分列。
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};

type SmallRow<T> = SmallVec<[T; 4]>;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence<T> {
    rows: IndexVec<PlaceId, SmallRow<T>>,
    cols: usize,
}

impl<T> Incidence<T>
where
    T: Clone,
{
    pub fn new(places: usize, transitions: usize, default: T) -> Self {
        let rows = (0..places)
            .map(|_| SmallRow::from_elem(default.clone(), transitions))
            .collect();
        Self {
            rows,
            cols: transitions,
        }
    }

    pub fn push_place_with_default(&mut self, default: T) -> PlaceId {
        self.rows.push(SmallRow::from_elem(default, self.cols))
    }

    pub fn push_transition_with_default(&mut self, default: T) -> TransitionId {
        let next = self.cols;
        for row in self.rows.iter_mut() {
            row.push(default.clone());
        }
        self.cols += 1;
        TransitionId::from_usize(next)
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    /// True when every row carries exactly one entry per transition.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.cols)
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> &T {
        &self.rows[place][transition.index()]
    }

    pub fn get_mut(&mut self, place: PlaceId, transition: TransitionId) -> &mut T {
        &mut self.rows[place][transition.index()]
    }
}

impl Incidence<u64> {
    /// Non-zero entries of one transition's column, in place order.
    pub fn column(&self, transition: TransitionId) -> impl Iterator<Item = (PlaceId, u64)> + '_ {
        self.rows.iter_enumerated().filter_map(move |(place, row)| {
            row.get(transition.index())
                .copied()
                .filter(|weight| *weight > 0)
                .map(|weight| (place, weight))
        })
    }

    /// True when the place has a non-zero entry for any transition.
    pub fn row_is_connected(&self, place: PlaceId) -> bool {
        self.rows
            .get(place)
            .is_some_and(|row| row.iter().any(|weight| *weight > 0))
    }
}

impl<T> fmt::Debug for Incidence<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}
