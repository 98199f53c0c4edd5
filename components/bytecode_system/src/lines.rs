//! Run-length encoded source-line table.

/// One run of consecutive instruction bytes that share a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    /// Source line
    pub line: u32,
    /// Number of bytes covered, never zero and at most [`LineTable::MAX_RUN`]
    pub count: u8,
}

/// Maps instruction offsets to source lines.
///
/// Each appended byte either extends the last run or opens a new one. A run
/// is capped at 255 bytes, after which the same line starts a fresh run.
///
/// # Examples
///
/// ```
/// use bytecode_system::LineTable;
///
/// let mut lines = LineTable::new();
/// lines.push(1);
/// lines.push(1);
/// lines.push(3);
///
/// assert_eq!(lines.line_at(1), Some(1));
/// assert_eq!(lines.line_at(2), Some(3));
/// assert_eq!(lines.line_at(3), None);
/// assert_eq!(lines.runs().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    runs: Vec<LineRun>,
    len: usize,
}

impl LineTable {
    /// Longest run a single record may describe.
    pub const MAX_RUN: u8 = 255;

    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the line of the next instruction byte.
    ///
    /// A line lower than the previous one is accepted and simply opens a new
    /// run.
    pub fn push(&mut self, line: u32) {
        match self.runs.last_mut() {
            Some(run) if run.line == line && run.count < Self::MAX_RUN => run.count += 1,
            _ => self.runs.push(LineRun { line, count: 1 }),
        }
        self.len += 1;
    }

    /// Returns the line recorded for `offset`, or None if no byte was ever
    /// recorded there.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        if offset >= self.len {
            return None;
        }
        let mut end = 0usize;
        for run in &self.runs {
            end += run.count as usize;
            if offset < end {
                return Some(run.line);
            }
        }
        None
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no byte has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The underlying run records.
    pub fn runs(&self) -> &[LineRun] {
        &self.runs
    }
}
