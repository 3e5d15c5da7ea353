//! Guide rendering
//!
//! The path is drawn twice: a wide muted "lane" that shows the user how much
//! slack they have, then the thin real curve on top. The marker dot is drawn
//! last. The lane is purely visual; completion is decided geometrically.

use super::path::{PathSpec, Point};
use std::fmt::Write as _;

/// Stroke color and width
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
}

/// Drawing target for the challenge canvas
pub trait Surface {
    /// Clear the whole surface
    fn clear(&mut self, width: f64, height: f64);
    /// Stroke a cubic Bezier curve
    fn stroke_cubic(&mut self, path: &PathSpec, style: &StrokeStyle);
    /// Fill a circle
    fn fill_circle(&mut self, center: Point, radius: f64, color: &str);
}

/// Colors and sizes of the guide and the marker
#[derive(Debug, Clone, PartialEq)]
pub struct GuideStyle {
    pub lane: StrokeStyle,
    pub curve: StrokeStyle,
    pub marker_color: String,
    pub marker_radius: f64,
}

impl Default for GuideStyle {
    fn default() -> Self {
        Self {
            lane: StrokeStyle {
                color: "#334155".to_string(),
                width: 14.0,
            },
            curve: StrokeStyle {
                color: "#22d3ee".to_string(),
                width: 3.0,
            },
            marker_color: "#3b82f6".to_string(),
            marker_radius: 7.0,
        }
    }
}

impl GuideStyle {
    /// Draw the full challenge frame: lane, curve, then marker
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        canvas: (f64, f64),
        path: &PathSpec,
        marker: Point,
    ) {
        surface.clear(canvas.0, canvas.1);
        surface.stroke_cubic(path, &self.lane);
        surface.stroke_cubic(path, &self.curve);
        surface.fill_circle(marker, self.marker_radius, &self.marker_color);
    }
}

/// Surface that accumulates an SVG document
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the document
    pub fn finish(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

impl Surface for SvgSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.body.clear();
    }

    fn stroke_cubic(&mut self, path: &PathSpec, style: &StrokeStyle) {
        let PathSpec {
            start,
            end,
            control1: c1,
            control2: c2,
        } = path;
        let _ = writeln!(
            self.body,
            "  <path d=\"M {} {} C {} {}, {} {}, {} {}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\"/>",
            start.x, start.y, c1.x, c1.y, c2.x, c2.y, end.x, end.y, style.color, style.width
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
        let _ = writeln!(
            self.body,
            "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
            center.x, center.y, radius, color
        );
    }
}
