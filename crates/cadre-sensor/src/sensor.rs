//! The [`Sensor`] trait.

use std::sync::Arc;

use cadre_core::{ObservationShape, WriteError};

use crate::writer::ObservationWriter;

/// A source of one observation per agent per decision.
///
/// Implementations must report a stable [`observation_shape`] for the
/// lifetime of the agent and write exactly that many values. Writing
/// fewer leaves the remainder zero; writing outside the shape is a
/// [`WriteError`].
///
/// `write` takes `&self`: sensors read agent state captured before the
/// request was submitted and never mutate during a flush.
///
/// [`observation_shape`]: Sensor::observation_shape
pub trait Sensor: Send + Sync {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// The per-agent shape this sensor writes.
    fn observation_shape(&self) -> ObservationShape;

    /// Write the current observation. Returns the number of values written.
    fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError>;
}

/// Shared ownership of a sensor, as carried by decision requests.
pub type SensorHandle = Arc<dyn Sensor>;

/// Read one sensor's observation into a fresh buffer.
///
/// This is the isolated read path: the same `write` implementation that
/// fills a batched tensor row here fills a standalone `Vec<f32>` sized
/// to the declared shape.
pub fn collect_observation(sensor: &dyn Sensor) -> Result<Vec<f32>, WriteError> {
    let shape = sensor.observation_shape();
    let mut buf = vec![0.0; shape.element_count()];
    let mut writer = ObservationWriter::new();
    writer.set_buffer(&mut buf, shape, 0);
    sensor.write(&mut writer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gradient {
        h: usize,
        w: usize,
    }

    impl Sensor for Gradient {
        fn name(&self) -> &str {
            "gradient"
        }

        fn observation_shape(&self) -> ObservationShape {
            ObservationShape::visual(self.h, self.w, 1)
        }

        fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
            for y in 0..self.h {
                for x in 0..self.w {
                    writer.set_3d(y, x, 0, (y * self.w + x) as f32)?;
                }
            }
            Ok(self.h * self.w)
        }
    }

    struct Overflowing;

    impl Sensor for Overflowing {
        fn name(&self) -> &str {
            "overflowing"
        }

        fn observation_shape(&self) -> ObservationShape {
            ObservationShape::vector(2)
        }

        fn write(&self, writer: &mut ObservationWriter<'_>) -> Result<usize, WriteError> {
            writer.add_range([1.0, 2.0, 3.0], 0)
        }
    }

    #[test]
    fn collect_fills_declared_shape() {
        let obs = collect_observation(&Gradient { h: 2, w: 3 }).unwrap();
        assert_eq!(obs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn collect_surfaces_write_errors() {
        let err = collect_observation(&Overflowing).unwrap_err();
        assert_eq!(err, WriteError::IndexOutOfBounds { index: 2, len: 2 });
    }

    #[test]
    fn handles_are_shareable() {
        let s: SensorHandle = Arc::new(Gradient { h: 1, w: 1 });
        let t = Arc::clone(&s);
        assert_eq!(s.name(), t.name());
        assert_eq!(collect_observation(t.as_ref()).unwrap(), vec![0.0]);
    }
}
