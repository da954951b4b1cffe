//! A fixed-length vector sensor filled by the caller.

use cadre_core::{ObservationShape, WriteError};

use crate::sensor::Sensor;
use crate::writer::{ObservationWriter, Quaternion};

/// A rank-1 sensor whose values are pushed by agent code.
///
/// Values are appended with the `add_*` methods before the sensor is
/// handed to a decision request. At write time the buffer is padded
/// with zeros up to the declared size, or truncated with a warning if
/// more values were added than fit.
///
/// # Examples
///
/// ```
/// use cadre_sensor::{collect_observation, VectorSensor};
///
/// let mut s = VectorSensor::new("velocity", 4);
/// s.add_vec3([1.0, 2.0, 3.0]);
/// assert_eq!(collect_observation(&s).unwrap(), vec![1.0, 2.0, 3.0, 0.0]);
/// ```
#[derive(Clone, Debug)]
pub struct VectorSensor {
    name: String,
    size: usize,
    values: Vec<f32>,
}

impl VectorSensor {
    /// An empty sensor declaring `size` values.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            values: Vec::with_capacity(size),
        }
    }

    /// A sensor holding exactly `values`.
    pub fn from_values(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            size: values.len(),
            values,
        }
    }

    /// Append one value.
    pub fn add_observation(&mut self, value: f32) {
        self.values.push(value);
    }

    /// Append every value from `values`.
    pub fn add_observations(&mut self, values: impl IntoIterator<Item = f32>) {
        self.values.extend(values);
    }

    /// Append a 3-vector.
    pub fn add_vec3(&mut self, v: [f32; 3]) {
        self.values.extend_from_slice(&v);
    }

    /// Append a quaternion as `x, y, z, w`.
    pub fn add_quaternion(&mut self, q: Quaternion) {
        self.values.extend_from_slice(&[q.x, q.y, q.z, q.w]);
    }

    /// Append `1.0` for `true`, `0.0` for `false`.
    pub fn add_bool(&mut self, value: bool) {
        self.values.push(if value { 1.0 } else { 0.0 });
    }

    /// Append a one-hot encoding of `index` over `range` slots.
    ///
    /// An `index` outside `0..range` appends `range` zeros.
    pub fn add_one_hot(&mut self, index: usize, range: usize) {
        self.values
            .extend((0..range).map(|i| if i == index { 1.0 } else { 0.0 }));
    }

    /// Discard every pushed value.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Number of values pushed so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared observation length.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Sensor for VectorSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn observation_shape(&self) -> ObservationShape {
        ObservationShape::vector(self.size)
    }

    fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
        if self.values.len() > self.size {
            tracing::warn!(
                sensor = %self.name,
                added = self.values.len(),
                size = self.size,
                "more observations added than the sensor declares, truncating"
            );
        }
        let written = self.values.len().min(self.size);
        writer.add_range(self.values[..written].iter().copied(), 0)?;
        // The destination may hold stale values; pad explicitly.
        writer.add_range(std::iter::repeat_n(0.0, self.size - written), written)?;
        Ok(self.size)
    }
}
