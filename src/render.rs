use crate::types::Placement;

const MAX_COLS: f64 = 80.0;
const MAX_ROWS: f64 = 40.0;

/// Draws the roll outline and every placement as ASCII boxes, scaled so the
/// drawing fits in `MAX_COLS` x `MAX_ROWS` characters.
pub fn render_roll(width: u32, length: u32, placements: &[Placement]) -> String {
    if width == 0 || length == 0 {
        return String::new();
    }
    let scale = f64::min(MAX_COLS / width as f64, MAX_ROWS / length as f64);
    let to_cells = |v: u32| (v as f64 * scale).round() as usize;

    let cols = to_cells(width).max(1);
    let rows = to_cells(length).max(1);
    let mut canvas = Canvas::new(cols + 1, rows + 1);
    canvas.frame(0, 0, cols, rows);

    for p in placements {
        let (x0, y0) = (to_cells(p.left()), to_cells(p.top()));
        let (x1, y1) = (to_cells(p.right()), to_cells(p.bottom()));
        if x1 <= x0 || y1 <= y0 {
            continue;
        }
        canvas.frame(x0, y0, x1 - x0, y1 - y0);
        canvas.label(x0, y0, x1, y1, &p.rect.to_string());
    }

    canvas.into_string()
}

struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols]; rows],
        }
    }

    fn put(&mut self, x: usize, y: usize, ch: char) {
        let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return;
        };
        *cell = match (*cell, ch) {
            (_, '+') | ('+', _) => '+',
            ('-', '|') | ('|', '-') => '+',
            _ => ch,
        };
    }

    fn frame(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for i in x..=x + w {
            self.put(i, y, '-');
            self.put(i, y + h, '-');
        }
        for j in y..=y + h {
            self.put(x, j, '|');
            self.put(x + w, j, '|');
        }
        for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
            self.put(cx, cy, '+');
        }
    }

    /// Centres `text` inside the box interior, dropping characters that would
    /// touch the border.
    fn label(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, text: &str) {
        if x1 - x0 <= 2 || y1 - y0 < 2 {
            return;
        }
        let cy = (y0 + y1) / 2;
        let start = ((x0 + x1) / 2).saturating_sub(text.chars().count() / 2);
        for (i, ch) in text.chars().enumerate() {
            let x = start + i;
            if x > x0
                && x < x1
                && let Some(cell) = self.cells.get_mut(cy).and_then(|row| row.get_mut(x))
            {
                *cell = ch;
            }
        }
    }

    fn into_string(self) -> String {
        let mut out = String::new();
        for row in self.cells {
            let line: String = row.into_iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}
