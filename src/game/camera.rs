//! Camera and view geometry
//!
//! The camera keeps the controlled boat at the center of the viewport. World
//! units are meters; view units are pixels.

use crate::util::vector::{floor_to_multiple, Vec2};

/// Closest zoom
pub const MAX_PIXELS_PER_METER: f64 = 35.0;
/// Furthest zoom
pub const MIN_PIXELS_PER_METER: f64 = 1.0;
/// Largest wheel delta honored from a single event
pub const WHEEL_DELTA_LIMIT: f64 = 100.0;
/// Wheel delta units per pixel-per-meter of zoom
pub const WHEEL_DELTA_PER_STEP: f64 = 100.0;

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Affine world-to-view mapping: `view = translate + world * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f64,
}

impl ViewTransform {
    pub fn world_to_view(&self, world: Vec2) -> Vec2 {
        self.translate + world * self.scale
    }
}

/// Regular lattice of sample points covering the visible world rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    /// Grid-aligned corner at or before the top-left of the view
    pub origin: Vec2,
    pub cell: f64,
    pub columns: usize,
    pub rows: usize,
}

impl SampleGrid {
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample points, row by row
    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.columns).map(move |col| {
                self.origin + Vec2::new(col as f64 * self.cell, row as f64 * self.cell)
            })
        })
    }
}

/// Zoom state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pixels_per_meter: f64,
}

impl Camera {
    pub fn new(pixels_per_meter: f64) -> Self {
        let mut camera = Self {
            pixels_per_meter: MIN_PIXELS_PER_METER,
        };
        camera.set_pixels_per_meter(pixels_per_meter);
        camera
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    fn set_pixels_per_meter(&mut self, value: f64) {
        if value.is_finite() {
            self.pixels_per_meter = value.clamp(MIN_PIXELS_PER_METER, MAX_PIXELS_PER_METER);
        }
    }

    /// Apply a mouse-wheel delta. The delta is bounded first, then the
    /// resulting scale is clamped to the valid range.
    pub fn zoom(&mut self, wheel_delta: f64) {
        if !wheel_delta.is_finite() {
            return;
        }
        let delta = wheel_delta.clamp(-WHEEL_DELTA_LIMIT, WHEEL_DELTA_LIMIT);
        self.set_pixels_per_meter(self.pixels_per_meter - delta / WHEEL_DELTA_PER_STEP);
    }

    /// Transform that puts `center` (world) at the middle of the viewport
    pub fn transform(&self, center: Vec2, viewport: Viewport) -> ViewTransform {
        let s = self.pixels_per_meter;
        ViewTransform {
            translate: viewport.center() - center * s,
            scale: s,
        }
    }

    /// Sample grid for overlay arrows around `center`. The origin is floored
    /// to a multiple of `cell` so points stay put while the camera pans.
    pub fn sample_grid(&self, center: Vec2, viewport: Viewport, cell: f64) -> SampleGrid {
        let s = self.pixels_per_meter;
        if !(cell.is_finite() && cell > 0.0) {
            return SampleGrid {
                origin: center,
                cell: 0.0,
                columns: 0,
                rows: 0,
            };
        }

        let half_extent = Vec2::new(viewport.width, viewport.height) / (2.0 * s);
        let corner = center - half_extent;
        let origin = Vec2::new(floor_to_multiple(corner.x, cell), floor_to_multiple(corner.y, cell));

        let span = |pixels: f64| (pixels / (s * cell)).ceil().max(0.0) as usize + 1;

        SampleGrid {
            origin,
            cell,
            columns: span(viewport.width),
            rows: span(viewport.height),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(10.0)
    }
}
