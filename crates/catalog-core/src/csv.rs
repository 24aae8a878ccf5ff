//! Line-oriented CSV interchange.
//!
//! One record per line: `id,type,category,subcategory,tag1;tag2;...`.
//! The tags field is optional and may also use commas between tags.

use std::io::{BufRead, Write};

use crate::error::{CatalogError, CatalogResult};
use crate::record::{Record, RecordType};
use crate::store::RecordStore;
use crate::validation::{normalize_tags, split_tags};

/// What to do when an import hits a malformed line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Stop at the first malformed line and return its error.
    #[default]
    Abort,
    /// Record the failure in the report and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub policy: ImportPolicy,
    /// Upper-case every imported tag. Off by default, so an export imports
    /// back unchanged.
    pub uppercase_tags: bool,
}

impl From<ImportPolicy> for ImportOptions {
    fn from(policy: ImportPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// Lines whose id was already in the store.
    pub duplicates: Vec<String>,
    pub failures: Vec<CatalogError>,
}

/// Parse one line. Tags keep the case they were written in.
pub fn parse_line(line: &str, line_no: usize) -> CatalogResult<Record> {
    let fields: Vec<&str> = line.splitn(5, ',').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(parse_error(
            line_no,
            format!("expected at least 4 fields, found {}", fields.len()),
        ));
    }

    for (name, value) in ["id", "type", "category", "subcategory"].iter().zip(&fields) {
        if value.is_empty() {
            return Err(parse_error(line_no, format!("{name} is blank")));
        }
    }

    let kind: RecordType = fields[1]
        .parse()
        .map_err(|e: String| parse_error(line_no, e))?;
    let tags = fields.get(4).map(|t| split_tags(t)).unwrap_or_default();

    Ok(Record::new(fields[0], kind, fields[2], fields[3], tags))
}

pub fn format_line(record: &Record) -> String {
    let tags: Vec<&str> = record.tags().iter().map(String::as_str).collect();
    format!(
        "{},{},{},{},{}",
        record.id(),
        record.kind(),
        record.category(),
        record.subcategory(),
        tags.join(";")
    )
}

/// Add every line of `reader` to `store`, registering the category and
/// subcategory of each inserted record. A malformed line, including one that
/// is not valid UTF-8, never mutates the store. Read errors always abort.
pub fn import<R: BufRead>(
    store: &mut RecordStore,
    reader: R,
    options: impl Into<ImportOptions>,
) -> CatalogResult<ImportReport> {
    let options = options.into();
    let mut report = ImportReport::default();

    for (idx, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let line_no = idx + 1;

        let parsed = match decode_line(&bytes, line_no) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => parse_line(line, line_no),
            Err(e) => Err(e),
        };
        let record = match parsed {
            Ok(record) if options.uppercase_tags => uppercase_tags(record)?,
            Ok(record) => record,
            Err(e) => match options.policy {
                ImportPolicy::Abort => return Err(e),
                ImportPolicy::Skip => {
                    report.failures.push(e);
                    continue;
                }
            },
        };

        let category = record.category().to_string();
        let subcategory = record.subcategory().to_string();
        let id = record.id().to_string();
        if store.add_record(record) {
            store.add_category(&category);
            store.add_subcategory(&category, &subcategory);
            report.imported += 1;
        } else {
            report.duplicates.push(id);
        }
    }

    Ok(report)
}

fn decode_line(bytes: &[u8], line_no: usize) -> CatalogResult<&str> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| parse_error(line_no, format!("invalid UTF-8: {e}")))
}

fn uppercase_tags(record: Record) -> CatalogResult<Record> {
    let joined: Vec<&str> = record.tags().iter().map(String::as_str).collect();
    let tags = normalize_tags(&joined.join(";"));
    record.to_builder().tags(tags).build()
}

/// Write every record, ordered by id. Returns the number of lines written.
pub fn export<W: Write>(store: &RecordStore, mut writer: W) -> CatalogResult<usize> {
    let mut count = 0;
    for record in store.records() {
        writeln!(writer, "{}", format_line(record))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn parse_error(line: usize, message: String) -> CatalogError {
    CatalogError::Parse { line, message }
}
