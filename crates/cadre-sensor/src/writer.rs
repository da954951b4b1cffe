//! The [`ObservationWriter`] write target.
//!
//! A writer points at exactly one destination at a time:
//!
//! - **Buffer**: a flat `&mut [f32]` plus a start offset and the
//!   sensor's declared [`ObservationShape`].
//! - **Tensor row**: one batch row of a rank-2 or rank-4 [`Tensor`],
//!   plus a channel offset inside that row.
//!
//! Selecting one destination drops the other. Every write is
//! bounds-checked and reported as a [`WriteError`]; nothing is clamped
//! and no write allocates.

use cadre_core::{ObservationShape, WriteError};
use cadre_tensor::Tensor;

/// A rotation quaternion written as `x, y, z, w`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quaternion {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W (scalar) component.
    pub w: f32,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

enum Target<'a> {
    None,
    Buffer {
        data: &'a mut [f32],
        offset: usize,
        shape: ObservationShape,
    },
    Tensor {
        tensor: &'a mut Tensor,
        row: usize,
        offset: usize,
        /// Exclusive bound on linear positions within the row.
        end: usize,
    },
}

/// Write access for sensors, backed by a buffer or a tensor row.
///
/// # Examples
///
/// ```
/// use cadre_core::ObservationShape;
/// use cadre_sensor::ObservationWriter;
///
/// let mut buf = vec![0.0f32; 5];
/// let mut writer = ObservationWriter::new();
/// writer.set_buffer(&mut buf, ObservationShape::vector(3), 2);
/// writer.add_vec3([1.0, 2.0, 3.0], 0).unwrap();
/// drop(writer);
/// assert_eq!(buf, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
/// ```
pub struct ObservationWriter<'a> {
    target: Target<'a>,
}

impl<'a> ObservationWriter<'a> {
    /// A writer with no target. Every write fails with
    /// [`WriteError::NoTarget`] until a target is selected.
    pub fn new() -> Self {
        Self {
            target: Target::None,
        }
    }

    /// Target a flat buffer, starting at `offset`.
    ///
    /// `shape` is the observation shape of the sensor about to write; it
    /// bounds 3-D writes.
    pub fn set_buffer(&mut self, data: &'a mut [f32], shape: ObservationShape, offset: usize) {
        self.target = Target::Buffer {
            data,
            offset,
            shape,
        };
    }

    /// Target batch row `row` of `tensor`, starting at `channel_offset`.
    ///
    /// For rank-2 tensors the offset is a column; for rank-4 tensors it
    /// shifts the channel coordinate of 3-D writes and the linear
    /// position of 1-D writes within the row.
    pub fn set_tensor(&mut self, tensor: &'a mut Tensor, row: usize, channel_offset: usize) {
        let end = tensor.row_len();
        self.target = Target::Tensor {
            tensor,
            row,
            offset: channel_offset,
            end,
        };
    }

    /// Target the `len` columns of row `row` that start at `offset`.
    ///
    /// Linear writes past `offset + len` fail, so a sensor sharing a row
    /// with others cannot spill into its neighbour's columns.
    pub fn set_tensor_slot(
        &mut self,
        tensor: &'a mut Tensor,
        row: usize,
        offset: usize,
        len: usize,
    ) {
        let end = (offset + len).min(tensor.row_len());
        self.target = Target::Tensor {
            tensor,
            row,
            offset,
            end,
        };
    }

    /// Drop the current target.
    pub fn clear(&mut self) {
        self.target = Target::None;
    }

    /// Whether a target is selected.
    pub fn has_target(&self) -> bool {
        !matches!(self.target, Target::None)
    }

    /// Write `value` at linear `index` (relative to the target offset).
    pub fn set(&mut self, index: usize, value: f32) -> Result<(), WriteError> {
        let slot = self.slot_mut(index)?;
        *slot = value;
        Ok(())
    }

    /// Write `value` at `(h, w, ch)` of a spatial observation.
    ///
    /// Each coordinate is validated against the declared height, width,
    /// and channel count.
    pub fn set_3d(&mut self, h: usize, w: usize, ch: usize, value: f32) -> Result<(), WriteError> {
        match &mut self.target {
            Target::None => Err(WriteError::NoTarget),
            Target::Buffer {
                data,
                offset,
                shape,
            } => {
                if !shape.is_visual() {
                    return Err(WriteError::NotSpatial);
                }
                check_axis("height", h, shape.height())?;
                check_axis("width", w, shape.width())?;
                check_axis("channel", ch, shape.channels())?;
                let index = *offset + (h * shape.width() + w) * shape.channels() + ch;
                let len = data.len();
                let slot = data
                    .get_mut(index)
                    .ok_or(WriteError::IndexOutOfBounds { index, len })?;
                *slot = value;
                Ok(())
            }
            Target::Tensor {
                tensor,
                row,
                offset,
                ..
            } => {
                let dims = tensor.shape().dims();
                if dims.len() != 4 {
                    return Err(WriteError::NotSpatial);
                }
                let (height, width, channels) = (dims[1], dims[2], dims[3]);
                check_axis("height", h, height)?;
                check_axis("width", w, width)?;
                check_axis("channel", ch, channels.saturating_sub(*offset))?;
                let index = tensor
                    .offset4(*row, h, w, ch + *offset)
                    .ok_or(WriteError::IndexOutOfBounds {
                        index: *row,
                        len: tensor.rows(),
                    })?;
                tensor.data_mut()[index] = value;
                Ok(())
            }
        }
    }

    /// Write a run of values starting at `write_offset`.
    ///
    /// Returns the number of values written. Fails without writing
    /// anything past the first out-of-bounds position.
    pub fn add_range<I>(&mut self, values: I, write_offset: usize) -> Result<usize, WriteError>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut count = 0;
        for v in values {
            self.set(write_offset + count, v)?;
            count += 1;
        }
        Ok(count)
    }

    /// Write the three components of a vector.
    pub fn add_vec3(&mut self, v: [f32; 3], write_offset: usize) -> Result<(), WriteError> {
        self.add_range(v, write_offset).map(|_| ())
    }

    /// Write the four components of a vector.
    pub fn add_vec4(&mut self, v: [f32; 4], write_offset: usize) -> Result<(), WriteError> {
        self.add_range(v, write_offset).map(|_| ())
    }

    /// Write a quaternion as `x, y, z, w`.
    pub fn add_quaternion(&mut self, q: Quaternion, write_offset: usize) -> Result<(), WriteError> {
        self.add_range([q.x, q.y, q.z, q.w], write_offset)
            .map(|_| ())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut f32, WriteError> {
        match &mut self.target {
            Target::None => Err(WriteError::NoTarget),
            Target::Buffer { data, offset, .. } => {
                let at = *offset + index;
                let len = data.len();
                data.get_mut(at)
                    .ok_or(WriteError::IndexOutOfBounds { index: at, len })
            }
            Target::Tensor {
                tensor,
                row,
                offset,
                end,
            } => {
                let at = *offset + index;
                if *row >= tensor.rows() || at >= *end {
                    return Err(WriteError::IndexOutOfBounds {
                        index: at,
                        len: *end,
                    });
                }
                Ok(&mut tensor.row_mut(*row)[at])
            }
        }
    }
}

impl Default for ObservationWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_axis(axis: &'static str, value: usize, bound: usize) -> Result<(), WriteError> {
    if value >= bound {
        return Err(WriteError::OutOfRange { axis, value, bound });
    }
    Ok(())
}
