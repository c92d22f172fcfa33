use kiss3d::text::Font;
use kiss3d::window::Window;
use nalgebra::{Point2, Point3};

use crate::model::picker::TooltipSink;

const TOOLTIP_FONT_SIZE: f32 = 40.0;
// Keeps the text clear of the cursor
const TOOLTIP_OFFSET: f32 = 24.0;

/// Text overlay that follows the pointer.
#[derive(Debug, Default)]
pub struct TextTooltip {
    current: Option<(String, f64, f64)>,
}

impl TextTooltip {
    pub fn render(&self, window: &mut Window) {
        if let Some((text, x, y)) = &self.current {
            window.draw_text(
                text,
                &Point2::new(*x as f32 + TOOLTIP_OFFSET, *y as f32 + TOOLTIP_OFFSET),
                TOOLTIP_FONT_SIZE,
                &Font::default(),
                &Point3::new(1.0, 1.0, 1.0),
            );
        }
    }
}

impl TooltipSink for TextTooltip {
    fn show(&mut self, text: &str, x: f64, y: f64) {
        self.current = Some((text.to_owned(), x, y));
    }

    fn hide(&mut self) {
        self.current = None;
    }
}
