//! Charts module - SVG rendering of the dashboard views

mod renderer;

pub use renderer::{ChartError, ChartRenderer, CHART_HEIGHT, CHART_WIDTH, PALETTE};
