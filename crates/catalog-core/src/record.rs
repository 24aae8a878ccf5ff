use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CatalogError, CatalogResult};

// ---------------------------------------------------------------------------
// RecordType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Photo,
    Article,
    Document,
    Object,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [Self::Photo, Self::Article, Self::Document, Self::Object];
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => write!(f, "PHOTO"),
            Self::Article => write!(f, "ARTICLE"),
            Self::Document => write!(f, "DOCUMENT"),
            Self::Object => write!(f, "OBJECT"),
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "photo" => Ok(Self::Photo),
            "article" => Ok(Self::Article),
            "document" => Ok(Self::Document),
            "object" => Ok(Self::Object),
            _ => Err(format!("invalid record type: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One catalogued item.
///
/// Records are immutable value objects: editing a record means building a
/// new one and handing it to [`RecordStore::edit_record`](crate::RecordStore::edit_record).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    id: String,
    #[serde(rename = "type")]
    kind: RecordType,
    category: String,
    subcategory: String,
    tags: BTreeSet<String>,
}

impl Record {
    pub fn new<I, T>(
        id: impl Into<String>,
        kind: RecordType,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        tags: I,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            id: id.into(),
            kind,
            category: category.into(),
            subcategory: subcategory.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Start a builder pre-filled with this record's fields.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            id: Some(self.id.clone()),
            kind: Some(self.kind),
            category: Some(self.category.clone()),
            subcategory: Some(self.subcategory.clone()),
            tags: self.tags.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_category(&self, category: &str) -> bool {
        eq_ignore_case(&self.category, category)
    }

    pub fn has_subcategory(&self, subcategory: &str) -> bool {
        eq_ignore_case(&self.subcategory, subcategory)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_uppercase();
        self.tags.iter().any(|t| t.to_uppercase() == wanted)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}/{}",
            self.id, self.kind, self.category, self.subcategory
        )?;
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            write!(f, " {{{}}}", tags.join(", "))?;
        }
        Ok(())
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    id: Option<String>,
    kind: Option<RecordType>,
    category: Option<String>,
    subcategory: Option<String>,
    tags: BTreeSet<String>,
}

impl RecordBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: RecordType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Replace the whole tag set.
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Fails with `InvalidArgument` if any required field was never set.
    pub fn build(self) -> CatalogResult<Record> {
        Ok(Record {
            id: required(self.id, "id")?,
            kind: required(self.kind, "type")?,
            category: required(self.category, "category")?,
            subcategory: required(self.subcategory, "subcategory")?,
            tags: self.tags,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> CatalogResult<T> {
    value.ok_or_else(|| CatalogError::InvalidArgument(format!("record {field} is required")))
}
