//! Dataset listings.
//!
//! A dataset is an ordered list of entries, each naming one mesh by id. It
//! is usually read from a CSV listing with a header row; one column holds
//! the id and every other named column is kept as metadata.

use std::collections::BTreeMap;
use std::path::{Component, Path};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Default id column of dataset listings.
pub const DEFAULT_ID_COLUMN: &str = "CellId";

/// One mesh of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetEntry {
    /// Identifier; also the mesh file stem for directory sources.
    pub id: String,
    /// Remaining columns of the listing row.
    pub metadata: BTreeMap<String, String>,
}

impl DatasetEntry {
    /// Entry without metadata.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata value for `key`.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Why the id cannot be used as a file stem, if it cannot.
    ///
    /// Ids name per-entry files inside the mesh and cache directories, so
    /// they must be a single plain path component: no separators, no
    /// `.`/`..`, no root or drive prefix.
    ///
    /// ```
    /// use mesh_average::DatasetEntry;
    ///
    /// assert!(DatasetEntry::new("c17").file_stem_problem().is_none());
    /// assert!(DatasetEntry::new("../c17").file_stem_problem().is_some());
    /// ```
    #[must_use]
    pub fn file_stem_problem(&self) -> Option<&'static str> {
        let id = self.id.as_str();
        if id.is_empty() {
            return Some("id is empty");
        }
        if id.contains(['/', '\\']) {
            return Some("id contains a path separator");
        }
        if id.contains('\0') {
            return Some("id contains a NUL byte");
        }
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(stem)), None) if stem == id => None,
            (Some(Component::CurDir | Component::ParentDir), None) => {
                Some("id is a relative directory")
            }
            _ => Some("id is not a plain file name"),
        }
    }
}

/// Ordered dataset entries.
///
/// Ids may repeat; the pipeline processes each id once.
///
/// # Example
///
/// ```
/// use mesh_average::Dataset;
///
/// let listing = "CellId,Stage\nc1,M1\n\"c,2\",M2\n";
/// let dataset = Dataset::parse_csv(listing, "CellId").unwrap();
///
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.entries()[1].id, "c,2");
/// assert_eq!(dataset.entries()[0].metadata("Stage"), Some("M1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    /// Dataset from prepared entries.
    #[must_use]
    pub const fn new(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    /// Dataset of bare ids.
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(DatasetEntry::new).collect())
    }

    /// Read a CSV listing from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read, otherwise as
    /// [`Dataset::parse_csv`].
    pub fn from_csv<P: AsRef<Path>>(path: P, id_column: &str) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_csv(&text, id_column)
    }

    /// Parse a CSV listing.
    ///
    /// Fields may be quoted; quoted fields can contain commas, newlines
    /// and doubled quotes. Blank lines are ignored. Columns with an empty
    /// header (such as an exported row index) are dropped.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::EmptyListing`] without a header row
    /// - [`DatasetError::MissingColumn`] if `id_column` is not in the header
    /// - [`DatasetError::MalformedRow`] for a wrong field count, an empty
    ///   id or an unterminated quote
    pub fn parse_csv(text: &str, id_column: &str) -> Result<Self, DatasetError> {
        let mut records = parse_records(text)?.into_iter();
        let (_, header) = records.next().ok_or(DatasetError::EmptyListing)?;
        let id_index = header
            .iter()
            .position(|name| name.trim() == id_column)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: id_column.to_string(),
            })?;

        let mut entries = Vec::new();
        for (line, fields) in records {
            if fields.len() != header.len() {
                return Err(DatasetError::malformed_row(
                    line,
                    format!("expected {} fields, found {}", header.len(), fields.len()),
                ));
            }
            let id = fields[id_index].trim();
            if id.is_empty() {
                return Err(DatasetError::malformed_row(line, "empty id"));
            }
            let mut entry = DatasetEntry::new(id);
            for (i, (name, value)) in header.iter().zip(&fields).enumerate() {
                if i != id_index && !name.trim().is_empty() {
                    entry.metadata.insert(name.trim().to_string(), value.clone());
                }
            }
            entries.push(entry);
        }
        Ok(Self::new(entries))
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in listing order.
    #[must_use]
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Iterate over entries in listing order.
    pub fn iter(&self) -> std::slice::Iter<'_, DatasetEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DatasetEntry;
    type IntoIter = std::slice::Iter<'a, DatasetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<DatasetEntry> for Dataset {
    fn from_iter<T: IntoIterator<Item = DatasetEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Split CSV text into records of fields, each tagged with its start line.
fn parse_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, DatasetError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            '\n' if in_quotes => {
                line += 1;
                field.push('\n');
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                if !(fields.len() == 1 && fields[0].trim().is_empty()) {
                    records.push((record_line, std::mem::take(&mut fields)));
                }
                fields.clear();
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DatasetError::malformed_row(record_line, "unterminated quote"));
    }
    if !fields.is_empty() || !field.trim().is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}
