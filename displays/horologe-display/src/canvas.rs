//! [`Canvas`] over any binary embedded-graphics target

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{Dimensions, DrawTarget, DrawTargetExt, Point, Primitive, Size};
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::Drawable;
use heapless::{String, Vec};
use u8g2_fonts::types::{FontColor, HorizontalAlignment, VerticalPosition};
use u8g2_fonts::{fonts, FontRenderer};

use horologe_core::geometry::{self, Rect};
use horologe_core::traits::{Canvas, Color, TextAlign};

/// Label font; covers Latin-1 so the degree sign renders
pub const LABEL_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvB10_tf>();

/// Edge crossings kept per scanline
const MAX_CROSSINGS: usize = 16;

/// Drawn in place of characters the label font lacks
pub const REPLACEMENT_CHAR: char = '?';

/// Longest label that can be rewritten with replacement characters
const MAX_LABEL_LEN: usize = 64;

/// Distinct missing characters replaced per label
const MAX_SUBSTITUTIONS: usize = 8;

/// Canvas failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanvasError<E> {
    /// The draw target failed
    Target(E),
    /// The label font has no glyph for this character
    MissingGlyph(char),
}

/// Draws the face onto a borrowed target
pub struct EgCanvas<'a, D> {
    target: &'a mut D,
}

impl<'a, D> EgCanvas<'a, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(target: &'a mut D) -> Self {
        Self { target }
    }

    fn render_label(
        &mut self,
        text: &str,
        position: Point,
        horizontal: HorizontalAlignment,
        color: BinaryColor,
        area: &Rectangle,
    ) -> Result<(), u8g2_fonts::Error<D::Error>> {
        let mut clipped = self.target.clipped(area);
        LABEL_FONT
            .render_aligned(
                text,
                position,
                VerticalPosition::Top,
                horizontal,
                FontColor::Transparent(color),
                &mut clipped,
            )
            .map(|_| ())
    }

    fn span(&mut self, y: i32, from: i32, to: i32, color: BinaryColor) -> Result<(), D::Error> {
        let (left, right) = if from <= to { (from, to) } else { (to, from) };
        let width = (right - left + 1) as u32;
        let area = Rectangle::new(Point::new(left, y), Size::new(width, 1));
        self.target.fill_solid(&area, color)
    }
}

fn binary(color: Color) -> BinaryColor {
    match color {
        Color::Black => BinaryColor::Off,
        Color::White => BinaryColor::On,
    }
}

/// Copy of `text` with every `missing` replaced, truncated to `N` bytes
fn substitute<const N: usize>(text: &str, missing: char) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        let c = if c == missing { REPLACEMENT_CHAR } else { c };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn point(p: geometry::Point) -> Point {
    Point::new(p.x, p.y)
}

fn rectangle(rect: Rect) -> Rectangle {
    Rectangle::new(
        Point::new(rect.origin.x, rect.origin.y),
        Size::new(rect.size.width as u32, rect.size.height as u32),
    )
}

impl<D> Canvas for EgCanvas<'_, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    type Error = CanvasError<D::Error>;

    fn clear(&mut self, color: Color) -> Result<(), Self::Error> {
        self.target.clear(binary(color)).map_err(CanvasError::Target)
    }

    /// Even-odd scanline fill
    ///
    /// Rows are sampled at whole `y`; each edge includes its upper end only.
    fn fill_polygon(&mut self, points: &[geometry::Point], color: Color) -> Result<(), Self::Error> {
        if points.len() < 3 {
            return Ok(());
        }

        let bounds = self.target.bounding_box();
        let Some(bottom_right) = bounds.bottom_right() else {
            return Ok(());
        };

        let top = points.iter().map(|p| p.y).min().unwrap_or(0).max(bounds.top_left.y);
        let bottom = points.iter().map(|p| p.y).max().unwrap_or(0).min(bottom_right.y);
        let color = binary(color);

        for y in top..=bottom {
            let mut crossings: Vec<i32, MAX_CROSSINGS> = Vec::new();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= y && y < b.y) || (b.y <= y && y < a.y) {
                    let x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
                    if crossings.push(x).is_err() {
                        break;
                    }
                }
            }

            crossings.sort_unstable();
            for pair in crossings.chunks_exact(2) {
                self.span(y, pair[0], pair[1], color)
                    .map_err(CanvasError::Target)?;
            }
        }

        Ok(())
    }

    fn draw_line(
        &mut self,
        from: geometry::Point,
        to: geometry::Point,
        color: Color,
    ) -> Result<(), Self::Error> {
        Line::new(point(from), point(to))
            .into_styled(PrimitiveStyle::with_stroke(binary(color), 1))
            .draw(self.target)
            .map_err(CanvasError::Target)
    }

    /// Aligned text clipped to `frame`
    ///
    /// Characters missing from the font are drawn as [`REPLACEMENT_CHAR`].
    fn draw_text(
        &mut self,
        text: &str,
        frame: Rect,
        align: TextAlign,
        color: Color,
    ) -> Result<(), Self::Error> {
        let area = rectangle(frame);
        let (x, horizontal) = match align {
            TextAlign::Left => (frame.origin.x, HorizontalAlignment::Left),
            TextAlign::Center => (
                frame.origin.x + frame.size.width as i32 / 2,
                HorizontalAlignment::Center,
            ),
            TextAlign::Right => (frame.right(), HorizontalAlignment::Right),
        };

        let position = Point::new(x, frame.origin.y);
        let color = binary(color);

        let mut rendered = self.render_label(text, position, horizontal, color, &area);
        let mut substituted: Option<String<MAX_LABEL_LEN>> = None;
        for _ in 0..MAX_SUBSTITUTIONS {
            let Err(u8g2_fonts::Error::GlyphNotFound(missing)) = rendered else {
                break;
            };
            if missing == REPLACEMENT_CHAR {
                break;
            }
            let next = substitute(substituted.as_deref().unwrap_or(text), missing);
            rendered = self.render_label(&next, position, horizontal, color, &area);
            substituted = Some(next);
        }

        match rendered {
            Ok(_) => Ok(()),
            Err(u8g2_fonts::Error::DisplayError(e)) => Err(CanvasError::Target(e)),
            Err(u8g2_fonts::Error::GlyphNotFound(c)) => Err(CanvasError::MissingGlyph(c)),
            // Transparent text never needs a background color
            Err(u8g2_fonts::Error::BackgroundColorNotSupported) => Ok(()),
        }
    }
}
