//! the display surface the dashboard draws onto.

use {
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        style::{self, Color},
        terminal::{self, ClearType},
    },
    std::{
        collections::VecDeque,
        io::{self, BufWriter, Stdout, Write},
        time::Duration,
    },
};

/// something a frame can be drawn onto.
///
/// cell writes go to a back buffer. [`Surface::flush()`] makes the back buffer visible.
pub trait Surface {
    /// returns the size of the surface, as `(columns, rows)`.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// blanks the back buffer, resizing it to `(cols, rows)`.
    fn clear(&mut self, cols: u16, rows: u16);

    /// writes text into the back buffer, starting at the given cell.
    ///
    /// text running past the right edge, and rows past the bottom, are dropped.
    fn put(&mut self, col: u16, row: u16, text: &str, color: Color);

    /// makes the back buffer visible.
    fn flush(&mut self) -> io::Result<()>;

    /// returns the pending input, without blocking.
    fn poll(&mut self) -> io::Result<Option<Input>>;

    /// returns the display to its original state.
    fn release(&mut self) -> io::Result<()>;
}

/// input, as far as the dashboard is concerned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Input {
    /// the user asked to leave.
    Quit,
    Other,
}

/// a grid of character cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

/// a terminal, driven through [`crossterm`].
pub struct Terminal {
    out: BufWriter<Stdout>,
    /// what is currently on screen.
    front: Grid,
    /// what is being drawn.
    back: Grid,
    /// whether the terminal is still in raw mode on the alternate screen.
    active: bool,
}

/// a recording surface.
#[derive(Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockSurface {
    pub cols: u16,
    pub rows: u16,
    /// the last flushed frame.
    pub screen: Grid,
    back: Grid,
    /// inputs handed out by [`Surface::poll()`], one per call. `None` once exhausted.
    pub inputs: VecDeque<Input>,
    /// the number of frames flushed.
    pub frames: usize,
    pub released: bool,
}

// === impl Grid ===

impl Grid {
    const BLANK: Cell = Cell {
        ch: ' ',
        color: Color::Reset,
    };

    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Self::BLANK; usize::from(cols) * usize::from(rows)],
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn put(&mut self, col: u16, row: u16, text: &str, color: Color) {
        if row >= self.rows {
            return;
        }

        let start = usize::from(row) * usize::from(self.cols);
        for (offset, ch) in text.chars().enumerate() {
            let col = usize::from(col) + offset;
            if col >= usize::from(self.cols) {
                break;
            }
            self.cells[start + col] = Cell { ch, color };
        }
    }

    pub fn cell(&self, col: u16, row: u16) -> Option<Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }

        self.cells
            .get(usize::from(row) * usize::from(self.cols) + usize::from(col))
            .copied()
    }

    /// returns the text of one row, with trailing blanks removed.
    pub fn line(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(col, row))
            .map(|cell| cell.ch)
            .collect::<String>()
            .trim_end()
            .to_owned()
    }
}

// === impl Terminal ===

impl Terminal {
    /// takes over the terminal: raw mode, alternate screen, hidden cursor.
    pub fn new() -> io::Result<Self> {
        let mut term = Self {
            out: BufWriter::new(io::stdout()),
            front: Grid::default(),
            back: Grid::default(),
            active: false,
        };

        terminal::enable_raw_mode()?;
        term.active = true;
        term.out
            .execute(terminal::EnterAlternateScreen)?
            .execute(cursor::Hide)?
            .execute(style::SetBackgroundColor(Color::Black))?
            .execute(terminal::Clear(ClearType::All))?;

        Ok(term)
    }

    fn is_quit(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }: KeyEvent) -> bool {
        if kind != KeyEventKind::Press {
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        }
    }
}

impl Surface for Terminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn clear(&mut self, cols: u16, rows: u16) {
        self.back = Grid::new(cols, rows);
    }

    fn put(&mut self, col: u16, row: u16, text: &str, color: Color) {
        self.back.put(col, row, text, color);
    }

    fn flush(&mut self) -> io::Result<()> {
        let Self {
            out, front, back, ..
        } = self;

        // a resized screen is redrawn from scratch.
        let resized = front.size() != back.size();
        if resized {
            out.queue(style::SetBackgroundColor(Color::Black))?
                .queue(terminal::Clear(ClearType::All))?;
        }

        let (cols, rows) = back.size();
        let mut pen: Option<(u16, u16, Color)> = None;
        for row in 0..rows {
            for col in 0..cols {
                let Some(cell) = back.cell(col, row) else {
                    continue;
                };
                if !resized && front.cell(col, row) == Some(cell) {
                    continue;
                }

                // only move the cursor or change color when the previous write did not
                // leave things as needed.
                if !matches!(pen, Some((c, r, _)) if c == col && r == row) {
                    out.queue(cursor::MoveTo(col, row))?;
                }
                if !matches!(pen, Some((_, _, color)) if color == cell.color) {
                    out.queue(style::SetForegroundColor(cell.color))?;
                }
                out.queue(style::Print(cell.ch))?;
                pen = Some((col + 1, row, cell.color));
            }
        }

        out.flush()?;
        std::mem::swap(front, back);

        Ok(())
    }

    fn poll(&mut self) -> io::Result<Option<Input>> {
        let mut input = None;

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if Self::is_quit(key) => return Ok(Some(Input::Quit)),
                _ => input = Some(Input::Other),
            }
        }

        Ok(input)
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        self.out
            .execute(style::ResetColor)?
            .execute(cursor::Show)?
            .execute(terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

// === impl MockSurface ===

#[allow(dead_code, reason = "this is a testing utility.")]
impl MockSurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            ..Self::default()
        }
    }

    /// queues input to be handed out by later polls.
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Input>) -> Self {
        self.inputs.extend(inputs);
        self
    }
}

impl Surface for MockSurface {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.cols, self.rows))
    }

    fn clear(&mut self, cols: u16, rows: u16) {
        self.back = Grid::new(cols, rows);
    }

    fn put(&mut self, col: u16, row: u16, text: &str, color: Color) {
        self.back.put(col, row, text, color);
    }

    fn flush(&mut self) -> io::Result<()> {
        self.screen = self.back.clone();
        self.frames += 1;
        Ok(())
    }

    fn poll(&mut self) -> io::Result<Option<Input>> {
        Ok(self.inputs.pop_front())
    }

    fn release(&mut self) -> io::Result<()> {
        self.released = true;
        Ok(())
    }
}
