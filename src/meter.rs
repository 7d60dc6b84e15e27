use {
    crate::{surface::Surface, window::palette},
    crossterm::style::Color,
    std::iter::repeat_n,
};

/// a labelled horizontal bar showing a fraction.
pub struct Meter<'a> {
    pub name: &'a str,
    /// the fraction shown, in `[0, 1]`.
    pub value: f64,
    /// the width of the bar, in cells.
    pub width: u16,
}

// === impl Meter ===

impl Meter<'_> {
    const ACTIVE: char = '█';
    const IDLE: char = '▒';

    /// draws the label and percentage on `row`, and the bar on the row below.
    pub fn draw(&self, surface: &mut impl Surface, col: u16, row: u16) {
        let Self { name, value, width } = *self;
        let value = value.clamp(0.0, 1.0);

        // print the label, and the percentage flush right.
        surface.put(col, row, name, palette::TEXT);
        let percent = format!("{:.1}%", value * 100.0);
        let offset = width.saturating_sub(percent.len() as u16);
        surface.put(col + offset, row, &percent, palette::TEXT);

        // print the bar.
        let filled = Self::filled(value, width);
        let idle = repeat_n(Self::IDLE, usize::from(width)).collect::<String>();
        surface.put(col, row + 1, &idle, palette::DIM);
        let active = repeat_n(Self::ACTIVE, usize::from(filled)).collect::<String>();
        surface.put(col, row + 1, &active, Self::color(value));
    }

    /// the number of cells filled for a given fraction.
    fn filled(value: f64, width: u16) -> u16 {
        (f64::from(width) * value) as u16
    }

    fn color(value: f64) -> Color {
        if value > 0.9 {
            palette::ALERT
        } else if value > 0.7 {
            palette::WARN
        } else {
            palette::HIGHLIGHT
        }
    }
}
