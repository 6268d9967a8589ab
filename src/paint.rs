use crate::{Gradient, Point, PremulRGBA, Scalar};

/// Source of colors for the covered pixels
pub trait Paint {
    /// Fill `span` with colors of consecutive pixels starting at `(x, y)`
    ///
    /// Colors are sampled at pixel centers.
    fn fill_span(&self, x: i32, y: i32, span: &mut [PremulRGBA]);

    /// Color of the paint if it does not depend on the position
    fn solid(&self) -> Option<PremulRGBA> {
        None
    }
}

impl Paint for PremulRGBA {
    fn fill_span(&self, _x: i32, _y: i32, span: &mut [PremulRGBA]) {
        span.fill(*self);
    }

    fn solid(&self) -> Option<PremulRGBA> {
        Some(*self)
    }
}

/// Style slot of the canvas (fill or line)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Style {
    /// Nothing is drawn
    #[default]
    None,
    Solid(PremulRGBA),
    Linear(Gradient),
    Radial(Gradient),
}

impl Style {
    pub fn is_none(&self) -> bool {
        matches!(self, Style::None)
    }
}

impl Paint for Style {
    fn fill_span(&self, x: i32, y: i32, span: &mut [PremulRGBA]) {
        let sample = |sampler: &dyn Fn(Point) -> PremulRGBA, span: &mut [PremulRGBA]| {
            let y = y as Scalar + 0.5;
            for (index, color) in span.iter_mut().enumerate() {
                *color = sampler(Point::new((x + index as i32) as Scalar + 0.5, y));
            }
        };
        match self {
            Style::None => span.fill(PremulRGBA::TRANSPARENT),
            Style::Solid(color) => span.fill(*color),
            Style::Linear(grad) => sample(&|point| grad.linear_at(point), span),
            Style::Radial(grad) => sample(&|point| grad.radial_at(point), span),
        }
    }

    fn solid(&self) -> Option<PremulRGBA> {
        match self {
            Style::None => Some(PremulRGBA::TRANSPARENT),
            Style::Solid(color) => Some(*color),
            Style::Linear(_) | Style::Radial(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GradientLut, Transform};

    #[test]
    fn test_style_span() {
        let red = PremulRGBA::new(255, 0, 0, 255);
        let mut span = [PremulRGBA::TRANSPARENT; 4];
        Style::Solid(red).fill_span(10, 10, &mut span);
        assert_eq!(span, [red; 4]);
        assert_eq!(Style::Solid(red).solid(), Some(red));
        Style::None.fill_span(0, 0, &mut span);
        assert_eq!(span, [PremulRGBA::TRANSPARENT; 4]);
        assert!(Style::None.is_none());
        assert!(Style::default().is_none());

        // horizontal gradient over 4 pixels, sampled at pixel centers
        let black = PremulRGBA::new(0, 0, 0, 255);
        let white = PremulRGBA::new(255, 255, 255, 255);
        let lut = GradientLut::with_profile(black, white, 1.0);
        let grad = Gradient::linear(
            lut,
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Transform::identity(),
        )
        .unwrap();
        let style = Style::Linear(grad.clone());
        assert_eq!(style.solid(), None);
        style.fill_span(0, 3, &mut span);
        for index in 0..4 {
            let point = Point::new(index as Scalar + 0.5, 3.5);
            assert_eq!(span[index], grad.linear_at(point));
        }
        for index in 1..4 {
            assert!(span[index].r > span[index - 1].r);
        }

        let style = Style::Radial(grad.clone());
        style.fill_span(-2, 0, &mut span);
        assert_eq!(span[0], grad.radial_at(Point::new(-1.5, 0.5)));
        assert_eq!(span[3], grad.radial_at(Point::new(1.5, 0.5)));
    }
}
