//! Observation shapes declared by sensors.

use smallvec::SmallVec;
use std::fmt;

/// The per-agent shape of one sensor's observation.
///
/// Rank 1 is a flat vector (`[len]`); rank 3 is a spatial observation
/// laid out as `[height, width, channels]`. Batch dimensions are never
/// part of an observation shape, they are added by the tensor generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObservationShape {
    dims: SmallVec<[usize; 3]>,
}

impl ObservationShape {
    /// A flat vector observation of `len` values.
    pub fn vector(len: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[len]),
        }
    }

    /// A spatial observation of `height × width × channels` values.
    pub fn visual(height: usize, width: usize, channels: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[height, width, channels]),
        }
    }

    /// Build a shape from raw dimensions.
    ///
    /// Returns `None` unless `dims` has rank 1 or 3.
    pub fn from_dims(dims: &[usize]) -> Option<Self> {
        match dims.len() {
            1 | 3 => Some(Self {
                dims: SmallVec::from_slice(dims),
            }),
            _ => None,
        }
    }

    /// The dimensions, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions (1 or 3).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Whether this is a rank-1 vector observation.
    pub fn is_vector(&self) -> bool {
        self.dims.len() == 1
    }

    /// Whether this is a rank-3 spatial observation.
    pub fn is_visual(&self) -> bool {
        self.dims.len() == 3
    }

    /// Total number of values in one observation.
    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Height of a visual observation (1 for vectors).
    pub fn height(&self) -> usize {
        if self.is_visual() {
            self.dims[0]
        } else {
            1
        }
    }

    /// Width of a visual observation (1 for vectors).
    pub fn width(&self) -> usize {
        if self.is_visual() {
            self.dims[1]
        } else {
            1
        }
    }

    /// Channel count of a visual observation; the length of a vector.
    pub fn channels(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }
}

impl fmt::Display for ObservationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}
