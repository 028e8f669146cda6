//! Event Taxonomy and Forward Topology Model
//!
//! Six discrete remodeling events act on a skeletonized network, each with
//! a fixed, known effect on the tip (degree-1) and junction (degree-3+)
//! node counts:
//!
//! | event             | Δtips | Δjunctions |
//! |-------------------|-------|------------|
//! | tip-edge fusion   |  −1   |    +1      |
//! | junction breakage |  +1   |    −1      |
//! | tip-tip fusion    |  −2   |     0      |
//! | tip-tip fission   |  +2   |     0      |
//! | extrusion         |  +1   |    +1      |
//! | retraction        |  −1   |    −1      |
//!
//! The forward model maps a vector of event counts to the topology change
//! it implies. It is used in both directions: forward to score a detected
//! event set against the observed change, and as the equality constraint
//! when inverting observed changes back into event counts.
//!
//! Tip-tip fusion/fission are modeled with zero junction effect. Real
//! networks can create or destroy junctions incidentally during these
//! events; the zero coefficient is a deliberate approximation of the event
//! taxonomy and must not be "corrected" here.

mod forward;

pub use forward::{
    apply, effect_matrix, EventCountVector, EventType, TopologyDelta, EVENT_TYPE_COUNT,
    TOPOLOGY_EFFECTS,
};
