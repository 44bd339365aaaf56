// src/zone.rs
//
// Restricted-zone rasterization. The polygon is filled once at startup
// onto a frame-sized canvas; afterwards membership is an O(1) lookup.
//
// Fill rule: even-odd scanline fill sampled at integer rows, plus the
// polygon outline drawn with the same line rasterizer used for footprints,
// so boundary pixels always belong to the zone.

use crate::error::ConfigError;
use crate::types::Point2D;
use tracing::info;

/// Largest accepted frame side; bounds the canvas allocation for bad headers.
pub const MAX_FRAME_DIMENSION: u32 = 16_384;

/// Set of frame pixels covered by the zone polygon, boundary included.
#[derive(Debug, Clone)]
pub struct ZoneMask {
    width: u32,
    height: u32,
    covered: Vec<bool>,
    count: usize,
}

impl ZoneMask {
    fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            covered: vec![false; width as usize * height as usize],
            count: 0,
        }
    }

    fn index(&self, p: Point2D) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width as i32 || p.y >= self.height as i32 {
            return None;
        }
        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    fn insert(&mut self, p: Point2D) {
        if let Some(i) = self.index(p) {
            if !self.covered[i] {
                self.covered[i] = true;
                self.count += 1;
            }
        }
    }

    /// Points outside the frame are never contained.
    pub fn contains(&self, p: Point2D) -> bool {
        self.index(p).map(|i| self.covered[i]).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Covered points in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Point2D> + '_ {
        let w = self.width as usize;
        self.covered
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(move |(i, _)| Point2D::new((i % w) as i32, (i / w) as i32))
    }
}

pub struct ZoneModel;

impl ZoneModel {
    /// Rasterize `vertices` onto a `width x height` canvas.
    pub fn build(vertices: &[Point2D], width: u32, height: u32) -> Result<ZoneMask, ConfigError> {
        let oversized = width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION;
        if width == 0 || height == 0 || oversized {
            return Err(ConfigError::InvalidFrameSize { width, height });
        }
        if vertices.len() < 3 {
            return Err(ConfigError::TooFewVertices(vertices.len()));
        }
        if let Some(v) = vertices
            .iter()
            .find(|v| v.x < 0 || v.y < 0 || v.x >= width as i32 || v.y >= height as i32)
        {
            return Err(ConfigError::VertexOutOfFrame {
                vertex: *v,
                width,
                height,
            });
        }

        let mut mask = ZoneMask::empty(width, height);
        let edges: Vec<(Point2D, Point2D)> = vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .map(|(a, b)| (*a, *b))
            .collect();

        let y_min = vertices.iter().map(|v| v.y).min().unwrap_or(0);
        let y_max = vertices.iter().map(|v| v.y).max().unwrap_or(0);
        let mut crossings: Vec<f64> = Vec::with_capacity(edges.len());

        for y in y_min..=y_max {
            crossings.clear();
            for (a, b) in &edges {
                if a.y == b.y {
                    continue;
                }
                let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
                // half-open so shared vertices are counted once
                if y < lo.y || y >= hi.y {
                    continue;
                }
                let t = (y - lo.y) as f64 / (hi.y - lo.y) as f64;
                crossings.push(lo.x as f64 + t * (hi.x - lo.x) as f64);
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for pair in crossings.chunks_exact(2) {
                let start = pair[0].ceil() as i32;
                let end = pair[1].floor() as i32;
                for x in start..=end {
                    mask.insert(Point2D::new(x, y));
                }
            }
        }

        for (a, b) in &edges {
            for p in line_pixels(*a, *b) {
                mask.insert(p);
            }
        }

        info!(
            vertices = vertices.len(),
            pixels = mask.len(),
            "Zone rasterized on {}x{} canvas",
            width,
            height
        );
        Ok(mask)
    }
}

/// Discrete segment from `from` to `to`, both endpoints included (Bresenham).
/// Callers pass in-frame points only.
fn line_pixels(from: Point2D, to: Point2D) -> Vec<Point2D> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let (mut x, mut y) = (from.x, from.y);
    let mut err = dx + dy;

    loop {
        points.push(Point2D::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point2D> {
        raw.iter().map(|&(x, y)| Point2D::new(x, y)).collect()
    }

    #[test]
    fn test_square_includes_boundary() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let mask = ZoneModel::build(&square, 20, 20).unwrap();
        assert_eq!(mask.len(), 121);
        assert!(mask.contains(Point2D::new(0, 0)));
        assert!(mask.contains(Point2D::new(10, 10)));
        assert!(mask.contains(Point2D::new(5, 5)));
        assert!(!mask.contains(Point2D::new(11, 5)));
        assert!(!mask.contains(Point2D::new(-1, 5)));
    }

    #[test]
    fn test_mask_points_within_frame() {
        let quad = pts(&[(687, 648), (610, 738), (322, 666), (432, 638)]);
        let mask = ZoneModel::build(&quad, 1280, 740).unwrap();
        assert!(!mask.is_empty());
        assert_eq!(mask.iter().count(), mask.len());
        for p in mask.iter() {
            assert!(p.x >= 0 && p.x < 1280 && p.y >= 0 && p.y < 740);
        }
        // interior point of the quad
        assert!(mask.contains(Point2D::new(500, 680)));
        assert!(!mask.contains(Point2D::new(100, 100)));
    }

    #[test]
    fn test_triangle_interior_and_exterior() {
        let tri = pts(&[(10, 10), (90, 10), (50, 80)]);
        let mask = ZoneModel::build(&tri, 100, 100).unwrap();
        assert!(mask.contains(Point2D::new(50, 30)));
        assert!(mask.contains(Point2D::new(50, 80)));
        assert!(!mask.contains(Point2D::new(15, 70)));
        assert!(!mask.contains(Point2D::new(50, 81)));
    }

    #[test]
    fn test_degenerate_collinear_polygon_still_covers_outline() {
        let line = pts(&[(0, 0), (5, 5), (9, 9)]);
        let mask = ZoneModel::build(&line, 10, 10).unwrap();
        assert!(!mask.is_empty());
        assert!(mask.contains(Point2D::new(3, 3)));
    }

    #[test]
    fn test_rejects_oversized_canvas() {
        let tri = pts(&[(0, 0), (10, 0), (5, 5)]);
        assert_eq!(
            ZoneModel::build(&tri, 200_000, 200_000).unwrap_err(),
            ConfigError::InvalidFrameSize {
                width: 200_000,
                height: 200_000
            }
        );
        assert!(ZoneModel::build(&tri, MAX_FRAME_DIMENSION, 64).is_ok());
    }

    #[test]
    fn test_rejects_too_few_vertices() {
        let err = ZoneModel::build(&pts(&[(0, 0), (5, 5)]), 10, 10).unwrap_err();
        assert_eq!(err, ConfigError::TooFewVertices(2));
    }

    #[test]
    fn test_rejects_vertex_outside_frame() {
        let err = ZoneModel::build(&pts(&[(0, 0), (10, 0), (5, 5)]), 10, 10).unwrap_err();
        assert!(matches!(err, ConfigError::VertexOutOfFrame { vertex, .. } if vertex.x == 10));
    }

    #[test]
    fn test_line_pixels_endpoints_and_length() {
        let line = line_pixels(Point2D::new(0, 0), Point2D::new(4, 2));
        assert_eq!(line.first(), Some(&Point2D::new(0, 0)));
        assert_eq!(line.last(), Some(&Point2D::new(4, 2)));
        assert_eq!(line.len(), 5);

        let reversed = line_pixels(Point2D::new(5, 3), Point2D::new(-2, 3));
        assert_eq!(reversed.len(), 8);
        assert!(reversed.iter().all(|p| p.y == 3));

        assert_eq!(line_pixels(Point2D::new(2, 2), Point2D::new(2, 2)).len(), 1);
    }
}
