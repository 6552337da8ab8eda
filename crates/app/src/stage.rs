use std::io::{self, Write};

use metronome_core::Surface;

/// Width of one terminal cell in stage units. Keeps the configured inset
/// (expressed in pixels) meaningful on a character grid.
pub const CELL_PX: f64 = 10.0;

const DOT: char = '●';
const TRACK: char = '·';

/// One-line stage drawn with text.
#[derive(Debug, Clone)]
pub struct TerminalStage {
    columns: u16,
    dot_column: usize,
}

impl TerminalStage {
    pub fn new(columns: u16) -> Self {
        Self {
            columns: columns.max(3),
            dot_column: 0,
        }
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn resize(&mut self, columns: u16) {
        self.columns = columns.max(3);
    }

    pub fn dot_column(&self) -> usize {
        self.dot_column
    }

    /// The track with the dot on it, without decorations.
    pub fn track(&self) -> String {
        (0..usize::from(self.columns))
            .map(|column| if column == self.dot_column { DOT } else { TRACK })
            .collect()
    }

    /// Redraws the stage line in place, followed by a short status.
    pub fn draw(&self, out: &mut impl Write, status: &str) -> io::Result<()> {
        write!(out, "\r\x1b[2K{} {status}", self.track())?;
        out.flush()
    }
}

impl Surface for TerminalStage {
    fn stage_width(&self) -> f64 {
        f64::from(self.columns) * CELL_PX
    }

    fn indicator_width(&self) -> f64 {
        CELL_PX
    }

    fn place_indicator(&mut self, x: f64) {
        let last = usize::from(self.columns) - 1;
        let column = (x / CELL_PX).round().max(0.0) as usize;
        self.dot_column = column.min(last);
    }
}
