//! In-memory replay trace.

/// Ordered sequence of serialized session states, one per advanced tick.
///
/// The trace length equals the number of ticks advanced by the run that
/// produced it; record `i` is the state right after tick `i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayTrace {
    records: Vec<String>,
}

impl ReplayTrace {
    /// An empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty trace with room for `ticks` records.
    pub fn with_capacity(ticks: usize) -> Self {
        Self {
            records: Vec::with_capacity(ticks),
        }
    }

    /// Append the state after the next tick.
    pub fn push(&mut self, record: impl Into<String>) {
        self.records.push(record.into());
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in chronological order.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Iterate records in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.records.iter()
    }

    /// The state after the final recorded tick.
    pub fn last(&self) -> Option<&str> {
        self.records.last().map(String::as_str)
    }

    /// The newline-joined text form (one record per line, trailing newline).
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.records.iter().map(|r| r.len() + 1).sum());
        for record in &self.records {
            out.push_str(record);
            out.push('\n');
        }
        out
    }
}

impl From<Vec<String>> for ReplayTrace {
    fn from(records: Vec<String>) -> Self {
        Self { records }
    }
}

impl FromIterator<String> for ReplayTrace {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ReplayTrace {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for ReplayTrace {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut trace = ReplayTrace::new();
        trace.push("a");
        trace.push(String::from("b"));
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.records(), &["a".to_string(), "b".to_string()]);
        assert_eq!(trace.last(), Some("b"));
    }

    #[test]
    fn text_form_is_newline_terminated() {
        let trace: ReplayTrace = vec!["1".to_string(), "2".to_string()].into();
        assert_eq!(trace.to_text(), "1\n2\n");
        assert_eq!(ReplayTrace::new().to_text(), "");
    }
}
