use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Semantic role of a document node, as reported by the upstream parser
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Top-level node holding the whole document; carries no visual content
    Root,

    // Text
    Title,
    Paragraph,
    SectionHeader,
    Footnote,

    // Lists
    List,
    ListItem,
    ReferenceList,
    ReferenceItem,

    // Figures and tables
    Caption,
    Figure,
    Table,
    DocIndex,
    /// Row whose content already repeats the text of its cells
    TableRow,
    TableCell,

    // Miscellaneous
    PageFooter,
    KeyValue,
    PageHeader,
    KeyValueArea,
    FormArea,
    Formula,
    Watermark,

    // Fallbacks
    Unknown,
    Missing,
    /// Type name not known to this crate, kept verbatim for round-tripping
    Other(String),
}

impl NodeType {
    /// Serialized name of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "__root__",
            Self::Title => "title",
            Self::Paragraph => "text",
            Self::SectionHeader => "section_header",
            Self::Footnote => "footnote",
            Self::List => "list",
            Self::ListItem => "list_item",
            Self::ReferenceList => "ref_list",
            Self::ReferenceItem => "ref_item",
            Self::Caption => "caption",
            Self::Figure => "image",
            Self::Table => "table",
            Self::DocIndex => "doc_index",
            Self::TableRow => "table_row",
            Self::TableCell => "table_cell",
            Self::PageFooter => "page_footer",
            Self::KeyValue => "key_value",
            Self::PageHeader => "page_header",
            Self::KeyValueArea => "key_value_area",
            Self::FormArea => "form_area",
            Self::Formula => "formula",
            Self::Watermark => "watermark",
            Self::Unknown => "unknown",
            Self::Missing => "missing",
            Self::Other(name) => name,
        }
    }

    /// Parse a serialized type name; unrecognized names become `Other`
    pub fn from_name(name: &str) -> Self {
        match name {
            "__root__" => Self::Root,
            "title" => Self::Title,
            "text" => Self::Paragraph,
            "section_header" => Self::SectionHeader,
            "footnote" => Self::Footnote,
            "list" => Self::List,
            "list_item" => Self::ListItem,
            "ref_list" => Self::ReferenceList,
            "ref_item" => Self::ReferenceItem,
            "caption" => Self::Caption,
            "image" => Self::Figure,
            "table" => Self::Table,
            "doc_index" => Self::DocIndex,
            "table_row" => Self::TableRow,
            "table_cell" => Self::TableCell,
            "page_footer" => Self::PageFooter,
            "key_value" => Self::KeyValue,
            "page_header" => Self::PageHeader,
            "key_value_area" => Self::KeyValueArea,
            "form_area" => Self::FormArea,
            "formula" => Self::Formula,
            "watermark" => Self::Watermark,
            "unknown" => Self::Unknown,
            "missing" => Self::Missing,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}
