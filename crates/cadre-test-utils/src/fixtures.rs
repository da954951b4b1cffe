//! Reusable sensor fixtures.
//!
//! - [`vector`] wraps fixed values in a [`VectorSensor`] handle.
//! - [`ConstantImageSensor`] fills every cell of a spatial observation.
//! - [`PatternImageSensor`] writes `base + linear index`, so a misplaced
//!   value is visible.
//! - [`ResizableSensor`] changes its declared length on demand.
//! - [`OverflowingSensor`] writes past its declared shape.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadre_core::{ObservationShape, WriteError};
use cadre_sensor::{ObservationWriter, Sensor, SensorHandle, VectorSensor};

/// A vector sensor holding exactly `values`.
pub fn vector(values: &[f32]) -> SensorHandle {
    Arc::new(VectorSensor::from_values("vector", values.to_vec()))
}

/// Writes `value` into every cell of an `h × w × c` observation.
pub struct ConstantImageSensor {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub value: f32,
}

impl ConstantImageSensor {
    pub fn new(height: usize, width: usize, channels: usize, value: f32) -> Self {
        Self {
            height,
            width,
            channels,
            value,
        }
    }

    pub fn handle(height: usize, width: usize, channels: usize, value: f32) -> SensorHandle {
        Arc::new(Self::new(height, width, channels, value))
    }
}

impl Sensor for ConstantImageSensor {
    fn name(&self) -> &str {
        "constant-image"
    }

    fn observation_shape(&self) -> ObservationShape {
        ObservationShape::visual(self.height, self.width, self.channels)
    }

    fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
        for h in 0..self.height {
            for w in 0..self.width {
                for c in 0..self.channels {
                    writer.set_3d(h, w, c, self.value)?;
                }
            }
        }
        Ok(self.height * self.width * self.channels)
    }
}

/// Writes `base + (h * width + w) * channels + c` at every cell.
pub struct PatternImageSensor {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub base: f32,
}

impl PatternImageSensor {
    pub fn handle(height: usize, width: usize, channels: usize, base: f32) -> SensorHandle {
        Arc::new(Self {
            height,
            width,
            channels,
            base,
        })
    }
}

impl Sensor for PatternImageSensor {
    fn name(&self) -> &str {
        "pattern-image"
    }

    fn observation_shape(&self) -> ObservationShape {
        ObservationShape::visual(self.height, self.width, self.channels)
    }

    fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
        for h in 0..self.height {
            for w in 0..self.width {
                for c in 0..self.channels {
                    let idx = (h * self.width + w) * self.channels + c;
                    writer.set_3d(h, w, c, self.base + idx as f32)?;
                }
            }
        }
        Ok(self.height * self.width * self.channels)
    }
}

/// A zero-filled vector sensor whose length is read from a shared cell.
///
/// Changing the cell after submission makes the sensor report a new
/// shape at flush time.
pub struct ResizableSensor {
    len: Arc<AtomicUsize>,
}

impl ResizableSensor {
    /// A sensor of `len` values and the cell controlling it.
    pub fn new(len: usize) -> (SensorHandle, Arc<AtomicUsize>) {
        let cell = Arc::new(AtomicUsize::new(len));
        let sensor = Arc::new(Self {
            len: Arc::clone(&cell),
        });
        (sensor, cell)
    }
}

impl Sensor for ResizableSensor {
    fn name(&self) -> &str {
        "resizable"
    }

    fn observation_shape(&self) -> ObservationShape {
        ObservationShape::vector(self.len.load(Ordering::SeqCst))
    }

    fn write(&self, _writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
        Ok(0)
    }
}

/// Declares `len` values but writes `len + 1`.
pub struct OverflowingSensor {
    pub len: usize,
}

impl Sensor for OverflowingSensor {
    fn name(&self) -> &str {
        "overflowing"
    }

    fn observation_shape(&self) -> ObservationShape {
        ObservationShape::vector(self.len)
    }

    fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
        writer.add_range(std::iter::repeat_n(1.0, self.len + 1), 0)
    }
}
