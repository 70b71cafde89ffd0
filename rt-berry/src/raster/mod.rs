//! 二维光栅化: 扫描线多边形填充与边界跟踪.
//!
//! 这是临床轮廓世界与体素世界之间的桥梁: 填充把多边形变成二值切片,
//! 跟踪把二值切片还原为多边形.

mod fill;
mod trace;

pub use fill::fill_polygon;

pub use trace::{extract_outline, simplify_polyline, trace_boundary, TraceOutcome};
