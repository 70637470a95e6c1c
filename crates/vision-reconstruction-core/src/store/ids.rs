use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Position in the owning arena.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Stable identifier of a vertex in a [`ReconstructionStore`](super::ReconstructionStore).
    VertexId,
    "vertex"
);
arena_id!(
    /// Stable identifier of a shot (camera view).
    ShotId,
    "shot"
);
arena_id!(
    /// Stable identifier of a 2D observation.
    PointId,
    "point"
);
