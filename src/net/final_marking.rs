//! 终止标识推断。
use crate::net::core::Net;
use crate::net::structure::Marking;

/// Infers the marking a net should be in when a case is complete.
pub trait FinalMarkingDiscovery {
    fn discover(&self, net: &Net) -> Marking;
}

/// One token on every place no transition consumes from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkPlaces;

impl FinalMarkingDiscovery for SinkPlaces {
    fn discover(&self, net: &Net) -> Marking {
        let mut marking = Marking::empty(net.places_len());
        for place in net.places.indices() {
            if !net.pre.row_is_connected(place) {
                *marking.tokens_mut(place) = 1;
            }
        }
        marking
    }
}

impl<F> FinalMarkingDiscovery for F
where
    F: Fn(&Net) -> Marking,
{
    fn discover(&self, net: &Net) -> Marking {
        self(net)
    }
}
