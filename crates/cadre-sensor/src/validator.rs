//! Consistency check of sensor shapes across agents.

use cadre_core::{ObservationShape, ShapeMismatch};

use crate::sensor::SensorHandle;

/// Remembers the sensor shapes of the first agent it sees and rejects
/// any later agent whose sensors differ.
///
/// The reference is fixed by the first successful call to
/// [`validate`](Self::validate) and never changes afterwards.
#[derive(Clone, Debug, Default)]
pub struct SensorShapeValidator {
    reference: Option<Vec<ObservationShape>>,
}

impl SensorShapeValidator {
    /// A validator with no reference yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `sensors` against the reference, fixing it on first use.
    ///
    /// Reports the first differing position. A sensor count mismatch
    /// is reported at the first index present on only one side.
    pub fn validate(&mut self, sensors: &[SensorHandle]) -> Result<(), ShapeMismatch> {
        let shapes: Vec<ObservationShape> =
            sensors.iter().map(|s| s.observation_shape()).collect();
        let Some(reference) = &self.reference else {
            self.reference = Some(shapes);
            return Ok(());
        };
        compare(reference, &shapes)
    }

    /// The reference shapes, once fixed.
    pub fn reference(&self) -> Option<&[ObservationShape]> {
        self.reference.as_deref()
    }
}

/// Report the first position where `actual` differs from `expected`.
pub fn compare(
    expected: &[ObservationShape],
    actual: &[ObservationShape],
) -> Result<(), ShapeMismatch> {
    let n = expected.len().max(actual.len());
    for i in 0..n {
        let (e, a) = (expected.get(i), actual.get(i));
        if e != a {
            return Err(ShapeMismatch {
                sensor_index: i,
                expected: e.cloned(),
                actual: a.cloned(),
            });
        }
    }
    Ok(())
}
