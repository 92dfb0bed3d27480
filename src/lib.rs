//! chart-orders: order-annotation overlay engine for candlestick charts.
//!
//! This crate owns the annotation state machine and the pointer-driven
//! editing engine: normalizing heterogeneous input rows into canonical bars,
//! maintaining live orders with their price-line and marker handles,
//! hit-testing pointer coordinates against draggable levels, and running the
//! drag lifecycle with a viewport freeze so a drag never pans or zooms the
//! chart. Rendering itself stays behind the [`chart::ChartPort`] capability
//! trait implemented by the host's charting backend.

pub mod api;
pub mod chart;
pub mod core;
pub mod error;
pub mod interaction;
pub mod orders;
pub mod telemetry;

pub use api::{OverlayEngine, OverlayEngineConfig};
pub use error::{OverlayError, OverlayResult};
