pub mod aggregate;
pub mod detectors;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod segmentation;
pub mod signal;

pub use error::{Result, SanaError};
pub use pipeline::{Pipeline, Views};
pub use signal::*;
