//! # btv-hist
//!
//! Fixed-binning histograms for discriminator profiling. Binning is chosen
//! once and never changes; every fill lands in a cell (in range, underflow
//! or overflow), mirroring ROOT's TH1/TH2 conventions so downstream macros
//! can reason about bin numbers the same way.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod axis;
pub mod hist1d;
pub mod hist2d;

pub use axis::Axis;
pub use hist1d::Hist1D;
pub use hist2d::Hist2D;
