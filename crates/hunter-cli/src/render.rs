//! Painting frames of text rows onto a terminal or into a file.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::{OwoColorize, Style};

/// Text attributes a brush may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Bold,
    Dim,
    Reverse,
    Blue,
    Green,
    Yellow,
    Red,
}

/// A target that frames are painted on, row by row.
pub trait Brush {
    /// Start a new frame, discarding the previous one.
    fn begin_frame(&mut self) -> io::Result<()>;

    /// Append text to the current row.
    fn draw_text(&mut self, text: &str, attrs: &[Attr]) -> io::Result<()>;

    /// Finish the current row.
    fn next_row(&mut self) -> io::Result<()>;

    /// Make the frame visible.
    fn end_frame(&mut self) -> io::Result<()>;
}

fn style_for(attrs: &[Attr]) -> Style {
    attrs.iter().fold(Style::new(), |style, attr| match attr {
        Attr::Bold => style.bold(),
        Attr::Dim => style.dimmed(),
        Attr::Reverse => style.reversed(),
        Attr::Blue => style.blue(),
        Attr::Green => style.green(),
        Attr::Yellow => style.yellow(),
        Attr::Red => style.red(),
    })
}

/// Colored output on a terminal, redrawn in place.
pub struct TerminalBrush<W: Write> {
    out: W,
}

impl<W: Write> TerminalBrush<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Brush for TerminalBrush<W> {
    fn begin_frame(&mut self) -> io::Result<()> {
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn draw_text(&mut self, text: &str, attrs: &[Attr]) -> io::Result<()> {
        write!(self.out, "{}", text.style(style_for(attrs)))
    }

    fn next_row(&mut self) -> io::Result<()> {
        // Raw mode: no implicit carriage return
        write!(self.out, "\r\n")
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Plain text frames written to a file, replacing its content each time.
pub struct FileBrush {
    path: PathBuf,
    frame: String,
}

impl FileBrush {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: String::new(),
        }
    }
}

impl Brush for FileBrush {
    fn begin_frame(&mut self) -> io::Result<()> {
        self.frame.clear();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, _attrs: &[Attr]) -> io::Result<()> {
        self.frame.push_str(text);
        Ok(())
    }

    fn next_row(&mut self) -> io::Result<()> {
        self.frame.push('\n');
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        fs::write(&self.path, &self.frame)
    }
}
