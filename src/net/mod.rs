//! # Petri 网核心定义（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`，输入/输出映射 `Pre, Post ∈ ℕ^{|P|×|T|}`。
//! 对任意标识 `M ∈ ℕ^{|P|}`：
//!
//! * 迁移 `t` **可激发** 当且仅当 `∀p ∈ P: M[p] ≥ Pre[p, t]`；
//! * 迁移 **发射** 后得到新标识 `M' = M - Pre[:, t] + Post[:, t]`，原标识保持不变。
//!
//! 迁移可带可观察标签；无标签迁移为静默迁移（τ），回放时不产生事件。
//!
//! ## 示例
//!
//! ```rust
//! use pn_playout::net::*;
//!
//! let mut net = Net::empty();
//! let p0 = net.add_place(Place::new_with_tokens("p0", 1));
//! let p1 = net.add_place(Place::new("p1"));
//! let t0 = net.add_transition(Transition::labelled("t0", "A"));
//!
//! net.add_input_arc(p0, t0, 1);
//! net.add_output_arc(p1, t0, 1);
//!
//! let marking = net.initial_marking();
//! assert_eq!(net.enabled_transitions(&marking), vec![t0]);
//! let next = net.fire_transition(&marking, t0).unwrap();
//! assert_eq!(next.tokens(p0), 0);
//! assert_eq!(next.tokens(p1), 1);
//! ```

pub mod core;
pub mod final_marking;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use self::core::{DiagnosticReport, FireError, Net, NetError};
pub use final_marking::{FinalMarkingDiscovery, SinkPlaces};
pub use ids::{PlaceId, TransitionId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
pub use io::{AcceptingNet, IoError};
pub use structure::{Marking, Place, Transition, Weight};
