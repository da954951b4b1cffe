//! The [`Tensor`] buffer and its [`TensorShape`].

use smallvec::SmallVec;
use std::error::Error;
use std::fmt;

/// Errors from constructing or reshaping a tensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensorError {
    /// Shape rank outside `1..=4`.
    InvalidRank {
        /// The rejected rank.
        rank: usize,
    },
    /// Data length does not match the shape's element count.
    LengthMismatch {
        /// Elements implied by the shape.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRank { rank } => write!(f, "tensor rank {rank} not in 1..=4"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "tensor data has {actual} elements, shape needs {expected}")
            }
        }
    }
}

impl Error for TensorError {}

/// Dimensions of a tensor, batch first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorShape {
    dims: SmallVec<[usize; 4]>,
}

impl TensorShape {
    /// A rank-2 `[batch, features]` shape.
    pub fn matrix(batch: usize, features: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[batch, features]),
        }
    }

    /// A rank-4 `[batch, height, width, channels]` shape.
    pub fn image(batch: usize, height: usize, width: usize, channels: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[batch, height, width, channels]),
        }
    }

    /// A rank-1 shape holding `len` values.
    pub fn scalar_list(len: usize) -> Self {
        Self {
            dims: SmallVec::from_slice(&[len]),
        }
    }

    /// Build a shape from raw dimensions of rank 1 to 4.
    pub fn from_dims(dims: &[usize]) -> Result<Self, TensorError> {
        if dims.is_empty() || dims.len() > 4 {
            return Err(TensorError::InvalidRank { rank: dims.len() });
        }
        Ok(Self {
            dims: SmallVec::from_slice(dims),
        })
    }

    /// The dimensions, batch first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of the leading (batch) dimension.
    pub fn batch(&self) -> usize {
        self.dims[0]
    }

    /// Values per batch row: the product of every non-batch dimension.
    pub fn row_len(&self) -> usize {
        self.dims[1..].iter().product()
    }

    /// Total number of values.
    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Height of a rank-4 shape.
    pub fn height(&self) -> Option<usize> {
        (self.rank() == 4).then(|| self.dims[1])
    }

    /// Width of a rank-4 shape.
    pub fn width(&self) -> Option<usize> {
        (self.rank() == 4).then(|| self.dims[2])
    }

    /// Channels of a rank-4 shape.
    pub fn channels(&self) -> Option<usize> {
        (self.rank() == 4).then(|| self.dims[3])
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// A named, shaped, row-major `f32` buffer.
///
/// Row `i` of every tensor exchanged with the backend belongs to the
/// `i`-th agent of the batch.
///
/// # Examples
///
/// ```
/// use cadre_tensor::{Tensor, TensorShape};
///
/// let t = Tensor::from_data("action", TensorShape::matrix(2, 3), vec![1., 2., 3., 4., 5., 6.])
///     .unwrap();
/// assert_eq!(t.row(1), &[4., 5., 6.]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    name: String,
    shape: TensorShape,
    data: Vec<f32>,
}

impl Tensor {
    /// A zero-filled tensor.
    pub fn zeros(name: impl Into<String>, shape: TensorShape) -> Self {
        let len = shape.element_count();
        Self {
            name: name.into(),
            shape,
            data: vec![0.0; len],
        }
    }

    /// An empty rank-1 tensor with `capacity` elements reserved.
    pub(crate) fn reserved(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            shape: TensorShape::scalar_list(0),
            data: Vec::with_capacity(capacity),
        }
    }

    /// Wrap existing data. `data.len()` must equal the shape's element count.
    pub fn from_data(
        name: impl Into<String>,
        shape: TensorShape,
        data: Vec<f32>,
    ) -> Result<Self, TensorError> {
        let expected = shape.element_count();
        if data.len() != expected {
            return Err(TensorError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            shape,
            data,
        })
    }

    /// Tensor name as known to the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tensor shape.
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// Number of batch rows.
    pub fn rows(&self) -> usize {
        self.shape.batch()
    }

    /// Values per row.
    pub fn row_len(&self) -> usize {
        self.shape.row_len()
    }

    /// The whole buffer in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the whole buffer.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the tensor and return its buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Values of batch row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row(&self, row: usize) -> &[f32] {
        let len = self.row_len();
        &self.data[row * len..(row + 1) * len]
    }

    /// Mutable values of batch row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let len = self.row_len();
        &mut self.data[row * len..(row + 1) * len]
    }

    /// Linear offset of `(batch, h, w, c)` in a rank-4 tensor.
    ///
    /// Returns `None` if the tensor is not rank 4 or any coordinate is out
    /// of range.
    pub fn offset4(&self, batch: usize, h: usize, w: usize, c: usize) -> Option<usize> {
        if self.shape.rank() != 4 {
            return None;
        }
        let d = self.shape.dims();
        if batch >= d[0] || h >= d[1] || w >= d[2] || c >= d[3] {
            return None;
        }
        Some(((batch * d[1] + h) * d[2] + w) * d[3] + c)
    }

    /// Re-target this buffer at a new shape, zero-filled.
    ///
    /// The backing allocation is kept; it only grows when the new shape
    /// needs more elements than the buffer has ever held.
    pub(crate) fn reshape_zeroed(&mut self, shape: TensorShape) {
        let len = shape.element_count();
        self.data.clear();
        self.data.resize(len, 0.0);
        self.shape = shape;
    }

    /// Capacity of the backing allocation in `f32` elements.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}
