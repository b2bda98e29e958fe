//! Interactive selection of a crawl and of an index record.
//!
//! The page arithmetic lives in [Pager], which every command consumes and returns,
//! so the prompts below only read lines and render.
use std::{
    fmt,
    io::{self, BufRead, Write},
    ops::Range,
};

use crate::{
    commoncrawl::{CrawlDescriptor, IndexRecord},
    table::crawl_table,
};

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Quit,
    /// A number as typed, i.e. 1-based.
    Select(usize),
    Invalid,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.to_ascii_lowercase().as_str() {
            "n" => Command::Next,
            "p" => Command::Previous,
            "q" => Command::Quit,
            _ => input
                .parse()
                .map(Command::Select)
                .unwrap_or(Command::Invalid),
        }
    }
}

/// Why a command left the pager where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LastPage,
    FirstPage,
    InvalidSelection,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Notice::LastPage => "Already on the last page.",
            Notice::FirstPage => "Already on the first page.",
            Notice::InvalidSelection => "Invalid selection.",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(Pager),
    Stayed(Pager, Notice),
    /// 0-based index into the full list.
    Selected(usize),
    Quit,
}

/// Page `page` of `total` items shown `per_page` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    per_page: usize,
    total: usize,
}

impl Pager {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            page: 0,
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Indices of the items on the current page.
    pub fn window(&self) -> Range<usize> {
        let start = (self.page * self.per_page).min(self.total);
        let end = (start + self.per_page).min(self.total);
        start..end
    }

    pub fn is_last_page(&self) -> bool {
        self.window().end >= self.total
    }

    pub fn apply(self, command: Command) -> Step {
        match command {
            Command::Next if self.is_last_page() => Step::Stayed(self, Notice::LastPage),
            Command::Next => Step::Moved(Self {
                page: self.page + 1,
                ..self
            }),
            Command::Previous if self.page == 0 => Step::Stayed(self, Notice::FirstPage),
            Command::Previous => Step::Moved(Self {
                page: self.page - 1,
                ..self
            }),
            Command::Quit => Step::Quit,
            Command::Select(number) => match selection_index(number, self.total) {
                Some(index) => Step::Selected(index),
                None => Step::Stayed(self, Notice::InvalidSelection),
            },
            Command::Invalid => Step::Stayed(self, Notice::InvalidSelection),
        }
    }
}

/// Maps a 1-based choice onto `0..len`.
pub fn selection_index(number: usize, len: usize) -> Option<usize> {
    (1..=len).contains(&number).then(|| number - 1)
}

/// Reads one line; none at end of input.
fn read_choice<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Pages through `crawls` until a crawl is picked (its id is returned) or the operator quits.
/// End of input counts as quitting.
pub fn select_crawl_id<R: BufRead, W: Write>(
    crawls: &[CrawlDescriptor],
    per_page: usize,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<String>> {
    let mut pager = Pager::new(crawls.len(), per_page);
    loop {
        writeln!(out, "\nAvailable Crawl IDs:")?;
        writeln!(out, "{}", crawl_table(crawls, pager.window()))?;
        writeln!(out, "\n(n) Next Page | (p) Previous Page | (q) Quit")?;

        let command = match read_choice(
            "\nSelect a crawl ID (enter number) or navigate pages: ",
            input,
            out,
        )? {
            Some(choice) => Command::parse(&choice),
            None => Command::Quit,
        };
        match pager.apply(command) {
            Step::Moved(next) => pager = next,
            Step::Stayed(same, notice) => {
                writeln!(out, "{notice}")?;
                pager = same;
            }
            Step::Selected(index) => {
                tracing::debug!("Selected crawl {}", crawls[index].id);
                return Ok(Some(crawls[index].id.clone()));
            }
            Step::Quit => {
                writeln!(out, "Exiting crawl selection.")?;
                return Ok(None);
            }
        }
    }
}

/// Asks for a record number until a valid one is entered. None only at end of input.
pub fn select_record<'a, R: BufRead, W: Write>(
    records: &'a [IndexRecord],
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<&'a IndexRecord>> {
    loop {
        let Some(choice) =
            read_choice("\nSelect an entry to download (enter number): ", input, out)?
        else {
            return Ok(None);
        };
        let index = choice
            .parse()
            .ok()
            .and_then(|number| selection_index(number, records.len()));
        match index {
            Some(index) => return Ok(Some(&records[index])),
            None => writeln!(out, "Invalid selection. Try again.")?,
        }
    }
}
