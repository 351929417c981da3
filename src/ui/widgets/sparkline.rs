//! Price sparkline widget for inline trend visualization

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Block characters for different price levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A sparkline widget showing prices over time
pub struct PriceSparkline<'a> {
    /// Price for each observation
    prices: &'a [f64],
    /// Lowest price, mapped to the bottom block
    min_price: f64,
    /// Highest price, mapped to the top block
    max_price: f64,
}

impl<'a> PriceSparkline<'a> {
    pub fn new(prices: &'a [f64]) -> Self {
        let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            prices,
            min_price,
            max_price,
        }
    }

    fn price_to_block(&self, price: f64) -> char {
        let range = self.max_price - self.min_price;
        // Flat series sit in the middle
        if !range.is_finite() || range <= 0.0 {
            return BLOCKS[3];
        }
        let normalized = ((price - self.min_price) / range).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }
}

impl<'a> Widget for PriceSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        // Keep the most recent prices when they don't all fit
        let skip = self.prices.len().saturating_sub(width);

        for (i, price) in self.prices.iter().enumerate().skip(skip) {
            let block = self.price_to_block(*price);
            let x = area.x + (i - skip) as u16;
            let y = area.y;

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block);
            }
        }
    }
}

/// Renders prices as a one-line sparkline string of at most `width` blocks
pub fn sparkline_line(prices: &[f64], width: u16) -> String {
    let width = width.min(u16::try_from(prices.len()).unwrap_or(u16::MAX));
    if width == 0 {
        return String::new();
    }

    let area = Rect::new(0, 0, width, 1);
    let mut buf = Buffer::empty(area);
    PriceSparkline::new(prices).render(area, &mut buf);

    buf.content.iter().map(|cell| cell.symbol()).collect()
}
