//! Sensor trait and observation writer.
//!
//! A [`Sensor`] declares the shape of its observation and writes values
//! through an [`ObservationWriter`]. The writer hides whether the values
//! land in a standalone buffer (tests, debugging, single-agent reads) or
//! in one row of a batched input tensor, so a single sensor
//! implementation serves both paths.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod sensor;
pub mod validator;
pub mod vector;
pub mod writer;

pub use sensor::{collect_observation, Sensor, SensorHandle};
pub use validator::{compare as compare_shapes, SensorShapeValidator};
pub use vector::VectorSensor;
pub use writer::{ObservationWriter, Quaternion};
