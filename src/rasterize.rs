//! Anti-aliased scanline rasterizer
//!
//! Lines are accumulated as signed difference of the covered area between adjacent
//! pixels, prefix sum of a row gives exact coverage of each pixel.
use crate::{ClipBox, EPSILON, FillRule, FlatPath, Line, Point, Scalar, Transform};
use std::cmp::min;

/// Horizontal run of pixels with the same coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First pixel of the span in screen coordinates
    pub x: i32,
    /// Number of pixels
    pub len: i32,
    /// Coverage in `0..=255` range
    pub cover: u8,
}

/// Coverage accumulator limited to a clip box
///
/// Geometry outside of the clip box is clipped: rows above and below are skipped, area
/// to the left is folded on the left edge, area to the right is dropped.
pub struct Rasterizer {
    clip: ClipBox,
    width: usize,
    height: usize,
    /// row stride, includes guard columns on the right
    stride: usize,
    /// signed area differences
    cells: Vec<Scalar>,
    /// range of rows with non-zero cells
    rows: Option<(usize, usize)>,
    spans: Vec<Span>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            clip: ClipBox::empty(),
            width: 0,
            height: 0,
            stride: 2,
            cells: Vec::new(),
            rows: None,
            spans: Vec::new(),
        }
    }

    /// Current clip box
    pub fn clip_box(&self) -> ClipBox {
        self.clip
    }

    /// Drop all accumulated coverage and set clip box
    pub fn reset(&mut self, clip: ClipBox) {
        self.clear_rows();
        if clip == self.clip {
            return;
        }
        self.clip = clip;
        self.width = clip.width();
        self.height = clip.height();
        self.stride = self.width + 2;
        self.cells.clear();
        self.cells.resize(self.stride * self.height, 0.0);
    }

    fn clear_rows(&mut self) {
        if let Some((start, end)) = self.rows.take() {
            self.cells[start * self.stride..end * self.stride].fill(0.0);
        }
    }

    /// Whether nothing was accumulated since the last reset or sweep
    pub fn is_empty(&self) -> bool {
        self.rows.is_none()
    }

    /// Add all polylines of the path transformed by `tr`
    ///
    /// Every polyline is treated as closed, open polylines are implicitly closed
    /// by the line from the last point to the first one.
    pub fn add_polylines(&mut self, path: &FlatPath, tr: Transform) {
        for polyline in path.polylines() {
            let points = polyline.points();
            let (Some(first), Some(last)) = (points.first(), points.last()) else {
                continue;
            };
            for pair in points.windows(2) {
                self.add_line(Line::new(tr.apply(pair[0]), tr.apply(pair[1])));
            }
            self.add_line(Line::new(tr.apply(*last), tr.apply(*first)));
        }
    }

    /// Add line given in screen coordinates
    pub fn add_line(&mut self, line: Line) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let Line([p0, p1]) = line;
        let origin = Point::new(self.clip.x1 as Scalar, self.clip.y1 as Scalar);
        let (p0, p1) = (p0 - origin, p1 - origin);
        if !(p0.x().is_finite() && p0.y().is_finite() && p1.x().is_finite() && p1.y().is_finite())
        {
            return;
        }
        let height = self.height as Scalar;
        if (p0.y() - p1.y()).abs() < EPSILON
            || (p0.y() <= 0.0 && p1.y() <= 0.0)
            || (p0.y() >= height && p1.y() >= height)
        {
            // line does not introduce any signed converage
            return;
        }

        // part of the line with `x > width` only affects guard columns
        let width = self.width as Scalar;
        let (p0, p1) = if p0.x() > width || p1.x() > width {
            if p0.x() >= width && p1.x() >= width {
                return;
            }
            let t = (p0.x() - width) / (p0.x() - p1.x());
            let mid = Point::new(width, (1.0 - t) * p0.y() + t * p1.y());
            if p0.x() < width { (p0, mid) } else { (mid, p1) }
        } else {
            (p0, p1)
        };

        // part of the line with `x < 0` is converted to a vertical line at `x == 0`
        if p0.x() < 0.0 || p1.x() < 0.0 {
            if p0.x() <= 0.0 && p1.x() <= 0.0 {
                self.add_cells(Point::new(0.0, p0.y()), Point::new(0.0, p1.y()));
            } else {
                let t = p0.x() / (p0.x() - p1.x());
                let mid = Point::new(0.0, (1.0 - t) * p0.y() + t * p1.y());
                if p0.x() < 0.0 {
                    self.add_cells(Point::new(0.0, p0.y()), mid);
                    self.add_cells(mid, p1);
                } else {
                    self.add_cells(p0, mid);
                    self.add_cells(mid, Point::new(0.0, p1.y()));
                }
            }
        } else {
            self.add_cells(p0, p1);
        }
    }

    /// Accumulate signed difference of the line that is inside `0 <= x <= width`
    fn add_cells(&mut self, p0: Point, p1: Point) {
        // y - is a row
        // x - is a column
        if (p0.y() - p1.y()).abs() < EPSILON {
            return;
        }
        // always iterate from the point with the smallest y coordinate
        let (dir, p0, p1) = if p0.y() < p1.y() {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };
        let stride = self.stride;
        let last_col = stride - 1;
        let data = &mut self.cells;
        let dxdy = (p1.x() - p0.x()) / (p1.y() - p0.y());
        // find first point to trace. since we are going to interate over y's
        // we should pick min(y , p0.y) as a starting y point, and adjust x
        // accordingly
        let y_start = p0.y().max(0.0) as usize;
        let y_end = min(self.height, p1.y().ceil().max(0.0) as usize);
        if y_start >= y_end {
            return;
        }
        let mut x = if p0.y() < 0.0 {
            p0.x() - p0.y() * dxdy
        } else {
            p0.x()
        };
        let mut x_next = x;
        let cell = |xi: i32| min(xi.max(0) as usize, last_col);
        for y in y_start..y_end {
            x = x_next;
            let row_offset = y * stride; // current line offset in the data array
            let dy = ((y + 1) as Scalar).min(p1.y()) - (y as Scalar).max(p0.y());
            // signed y difference
            let d = dir * dy;
            // find next x position
            x_next = x + dxdy * dy;
            // order (x, x_next) from smaller value x0 to bigger x1
            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
            // lower bound of effected x pixels
            let x0_floor = x0.floor().max(0.0);
            let x0i = x0_floor as i32;
            // upper bound of touched x pixels
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as i32;
            if x1i <= x0i + 1 {
                // single pixel crossed, coverage `d` is shared with its right neighbour
                let xmf = 0.5 * (x + x_next) - x0_floor; // effective height
                data[row_offset + cell(x0i)] += d * (1.0 - xmf);
                data[row_offset + cell(x0i + 1)] += d * xmf;
            } else {
                let s = (x1 - x0).recip();
                let x0f = x0 - x0_floor; // fractional part of x0
                let x1f = x1 - x1_ceil + 1.0; // fractional part of x1
                // partial areas of the leftmost and rightmost pixels
                let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
                let am = 0.5 * s * x1f * x1f;
                data[row_offset + cell(x0i)] += d * a0;
                if x1i == x0i + 2 {
                    // only two pixels are covered
                    data[row_offset + cell(x0i + 1)] += d * (1.0 - a0 - am);
                } else {
                    // second pixel
                    let a1 = s * (1.5 - x0f);
                    data[row_offset + cell(x0i + 1)] += d * (a1 - a0);
                    // (second, last) pixels
                    for xi in x0i + 2..x1i - 1 {
                        data[row_offset + cell(xi)] += d * s;
                    }
                    // last pixel
                    let a2 = a1 + (x1i - x0i - 3) as Scalar * s;
                    data[row_offset + cell(x1i - 1)] += d * (1.0 - a2 - am);
                }
                data[row_offset + cell(x1i)] += d * am
            }
        }
        self.rows = Some(match self.rows {
            None => (y_start, y_end),
            Some((start, end)) => (start.min(y_start), end.max(y_end)),
        });
    }

    /// Resolve accumulated coverage with the fill rule
    ///
    /// Calls `f` with screen `y` and non-empty list of spans for each row with non-zero
    /// coverage in increasing `y` order. Spans are sorted by `x` and do not overlap.
    /// Accumulated coverage is cleared.
    pub fn sweep(&mut self, fill_rule: FillRule, mut f: impl FnMut(i32, &[Span])) {
        let Some((start, end)) = self.rows else {
            return;
        };
        let mut spans_count = 0;
        for y in start..end {
            let row = &mut self.cells[y * self.stride..(y + 1) * self.stride];
            self.spans.clear();
            let mut acc = 0.0;
            for (x, value) in row[..self.width].iter().enumerate() {
                acc += *value;
                let cover = coverage(acc, fill_rule);
                if cover == 0 {
                    continue;
                }
                let x = self.clip.x1 + x as i32;
                match self.spans.last_mut() {
                    Some(span) if span.cover == cover && span.x + span.len == x => span.len += 1,
                    _ => self.spans.push(Span { x, len: 1, cover }),
                }
            }
            row.fill(0.0);
            if !self.spans.is_empty() {
                spans_count += self.spans.len();
                f(self.clip.y1 + y as i32, &self.spans);
            }
        }
        self.rows = None;
        tracing::trace!("[rasterizer:sweep] rows={} spans={}", end - start, spans_count);
    }
}

/// Convert accumulated winding value to coverage
fn coverage(acc: Scalar, fill_rule: FillRule) -> u8 {
    let value = match fill_rule {
        FillRule::NonZero => acc.abs().min(1.0),
        FillRule::EvenOdd => ((acc + 1.0).rem_euclid(2.0) - 1.0).abs(),
    };
    (value * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Path, assert_approx_eq};

    /// Coverage as dense array
    fn render(path: &Path, clip: ClipBox, fill_rule: FillRule, width: usize) -> Vec<u8> {
        let mut rasterizer = Rasterizer::new();
        rasterizer.reset(clip);
        rasterizer.add_polylines(&path.flatten(0.01), Transform::identity());
        let mut result = vec![0u8; width * width];
        let mut prev_y = None;
        rasterizer.sweep(fill_rule, |y, spans| {
            assert!(prev_y < Some(y));
            prev_y = Some(y);
            for span in spans {
                for x in span.x..span.x + span.len {
                    result[y as usize * width + x as usize] = span.cover;
                }
            }
        });
        assert!(rasterizer.is_empty());
        result
    }

    fn cell(rasterizer: &Rasterizer, y: usize, x: usize) -> Scalar {
        rasterizer.cells[y * rasterizer.stride + x]
    }

    fn cells_sum(rasterizer: &Rasterizer) -> Scalar {
        rasterizer.cells.iter().sum()
    }

    fn cells_clear(rasterizer: &mut Rasterizer) {
        rasterizer.cells.fill(0.0);
        rasterizer.rows = None;
    }

    #[test]
    fn test_add_line() {
        let mut rasterizer = Rasterizer::new();
        rasterizer.reset(ClipBox::from_size(5, 2));
        let r = &mut rasterizer;

        // line convers many columns but just one row
        r.add_line(Line::new((0.5, 1.0), (3.5, 0.0)));
        // covered areas per-pixel
        let a0 = (0.5 * (1.0 / 6.0)) / 2.0;
        let a1 = ((1.0 / 6.0) + (3.0 / 6.0)) / 2.0;
        let a2 = ((3.0 / 6.0) + (5.0 / 6.0)) / 2.0;
        assert_approx_eq!(cell(r, 0, 0), -a0);
        assert_approx_eq!(cell(r, 0, 1), a0 - a1);
        assert_approx_eq!(cell(r, 0, 2), a1 - a2);
        assert_approx_eq!(cell(r, 0, 3), a0 - a1);
        assert_approx_eq!(cell(r, 0, 4), -a0);
        // total difference
        assert_approx_eq!(cells_sum(r), -1.0);
        cells_clear(r);

        // out of bound line (intersects x = 0.0)
        r.add_line(Line::new((-1.0, 0.0), (1.0, 1.0)));
        assert_approx_eq!(cell(r, 0, 0), 3.0 / 4.0);
        assert_approx_eq!(cell(r, 0, 1), 1.0 / 4.0);
        cells_clear(r);

        // multiple rows diag
        r.add_line(Line::new((0.0, -0.5), (2.0, 1.5)));
        assert_approx_eq!(cell(r, 0, 0), 1.0 / 8.0);
        assert_approx_eq!(cell(r, 0, 1), 1.0 - 2.0 / 8.0);
        assert_approx_eq!(cell(r, 0, 2), 1.0 / 8.0);
        assert_approx_eq!(cell(r, 1, 1), 1.0 / 8.0);
        assert_approx_eq!(cell(r, 1, 2), 0.5 - 1.0 / 8.0);
        cells_clear(r);

        // only two pixels covered
        r.add_line(Line::new((0.1, 0.1), (1.9, 0.9)));
        assert_approx_eq!(cell(r, 0, 0), 0.18);
        assert_approx_eq!(cell(r, 0, 1), 0.44);
        assert_approx_eq!(cell(r, 0, 2), 0.18);
        cells_clear(r);

        // single pixel covered
        r.add_line(Line::new((0.1, 0.1), (0.9, 0.9)));
        assert_approx_eq!(cell(r, 0, 0), 0.4);
        assert_approx_eq!(cell(r, 0, 1), 0.8 - 0.4);
        cells_clear(r);

        // multiple rows vertical
        r.add_line(Line::new((0.5, 0.5), (0.5, 1.75)));
        assert_approx_eq!(cell(r, 0, 0), 1.0 / 4.0);
        assert_approx_eq!(cell(r, 0, 1), 1.0 / 4.0);
        assert_approx_eq!(cell(r, 1, 0), 3.0 / 8.0);
        assert_approx_eq!(cell(r, 1, 1), 3.0 / 8.0);
        cells_clear(r);

        // completely outside
        r.add_line(Line::new((7.0, 0.0), (9.0, 2.0)));
        r.add_line(Line::new((0.0, 3.0), (4.0, 5.0)));
        r.add_line(Line::new((0.0, -3.0), (4.0, -1.0)));
        assert_approx_eq!(cells_sum(r), 0.0);
        assert!(r.is_empty());
    }

    #[test]
    fn test_full_coverage() {
        let mut path = Path::new();
        path.rectangle((2.0, 3.0), (7.0, 5.0));
        let cover = render(&path, ClipBox::from_size(10, 10), FillRule::NonZero, 10);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..7).contains(&x) && (3..5).contains(&y);
                assert_eq!(cover[y * 10 + x], if inside { 255 } else { 0 });
            }
        }
    }

    #[test]
    fn test_partial_coverage() {
        let mut path = Path::new();
        path.rectangle((1.5, 1.0), (3.25, 2.0));
        let cover = render(&path, ClipBox::from_size(5, 5), FillRule::NonZero, 5);
        assert_eq!(cover[5 + 1], 128);
        assert_eq!(cover[5 + 2], 255);
        assert_eq!(cover[5 + 3], 64);
        assert_eq!(cover[5 + 4], 0);

        // coverage grows with covered area
        let mut prev = 0;
        for step in 1..=8 {
            let mut path = Path::new();
            path.rectangle((1.0, 1.0), (1.0 + step as Scalar / 8.0, 2.0));
            let cover = render(&path, ClipBox::from_size(5, 5), FillRule::NonZero, 5);
            assert!(cover[5 + 1] > prev);
            prev = cover[5 + 1];
        }
        assert_eq!(prev, 255);
    }

    #[test]
    fn test_fill_rule() {
        // box with a hole of the same orientation, and a star
        let mut path = Path::new();
        path.rectangle((0.0, 0.0), (20.0, 20.0))
            .rectangle((5.0, 5.0), (15.0, 15.0));
        let nonzero = render(&path, ClipBox::from_size(20, 20), FillRule::NonZero, 20);
        let evenodd = render(&path, ClipBox::from_size(20, 20), FillRule::EvenOdd, 20);
        assert_eq!(nonzero[10 * 20 + 10], 255);
        assert_eq!(evenodd[10 * 20 + 10], 0);
        assert_eq!(evenodd[2 * 20 + 2], 255);
        let area = evenodd.iter().map(|c| *c as u32).sum::<u32>() / 255;
        assert_eq!(area, 400 - 100);

        let mut star = Path::new();
        star.polygon(&[
            Point::new(50.0, 0.0),
            Point::new(21.0, 90.0),
            Point::new(98.0, 35.0),
            Point::new(2.0, 35.0),
            Point::new(79.0, 90.0),
        ]);
        let nonzero = render(&star, ClipBox::from_size(100, 100), FillRule::NonZero, 100);
        let evenodd = render(&star, ClipBox::from_size(100, 100), FillRule::EvenOdd, 100);
        assert_eq!(nonzero[50 * 100 + 50], 255);
        assert_eq!(evenodd[50 * 100 + 50], 0);
    }

    #[test]
    fn test_clip() {
        // shape larger than the clip box
        let mut path = Path::new();
        path.rectangle((-5.0, -5.0), (25.0, 25.0));
        let clip = ClipBox::new(3, 4, 6, 8);
        let cover = render(&path, clip, FillRule::NonZero, 20);
        for y in 0..20 {
            for x in 0..20 {
                let expected = if clip.contains(x, y) { 255 } else { 0 };
                assert_eq!(cover[y as usize * 20 + x as usize], expected, "x={} y={}", x, y);
            }
        }

        // diagonal edge crossing the left side of the clip box
        let mut path = Path::new();
        path.triangle((-10.0, 0.0), (10.0, 0.0), (10.0, 20.0));
        let cover = render(&path, ClipBox::new(0, 0, 9, 19), FillRule::NonZero, 20);
        assert_eq!(cover[9], 255);
        assert_eq!(cover[19 * 20 + 9], 128);
        assert_eq!(cover[19 * 20 + 8], 0);
    }

    #[test]
    fn test_sweep_spans() {
        let mut path = Path::new();
        path.rectangle((1.5, 0.0), (6.0, 1.0));
        let mut rasterizer = Rasterizer::new();
        rasterizer.reset(ClipBox::from_size(8, 2));
        rasterizer.add_polylines(&path.flatten(0.1), Transform::identity());
        let mut rows = Vec::new();
        rasterizer.sweep(FillRule::NonZero, |y, spans| rows.push((y, spans.to_vec())));
        assert_eq!(
            rows,
            vec![(
                0,
                vec![
                    Span {
                        x: 1,
                        len: 1,
                        cover: 128
                    },
                    Span {
                        x: 2,
                        len: 4,
                        cover: 255
                    }
                ]
            )]
        );

        // sweep drains accumulated coverage
        let mut called = false;
        rasterizer.sweep(FillRule::NonZero, |_, _| called = true);
        assert!(!called);
    }
}
