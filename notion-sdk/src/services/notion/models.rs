//! Notion API data models
//!
//! Type definitions for the database, page and query resources.
//!
//! See <https://developers.notion.com/reference>

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Style information which applies to the whole rich text object
///
/// See <https://developers.notion.com/reference/rich-text#annotations>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

/// Link attached to a piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// Content of a `text` rich text object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

/// Text content combined with style information
///
/// See <https://developers.notion.com/reference/rich-text>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub plain_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
}

/// Join the plain text of a rich text sequence
pub fn plain_text(parts: &[RichText]) -> String {
    parts.iter().map(|part| part.plain_text.as_str()).collect()
}

/// Cursor-based pagination parameters
///
/// See <https://developers.notion.com/reference/pagination>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Pagination {
    /// First page with the given size
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            start_cursor: None,
            page_size: Some(page_size),
        }
    }

    /// Same page size, continuing from `cursor`
    pub fn next(&self, cursor: impl Into<String>) -> Self {
        Self {
            start_cursor: Some(cursor.into()),
            page_size: self.page_size,
        }
    }

    /// Query parameters for GET endpoints; unset fields are omitted
    pub fn query(&self) -> HashMap<String, String> {
        let mut query = HashMap::new();
        if let Some(ref cursor) = self.start_cursor {
            query.insert("start_cursor".to_string(), cursor.clone());
        }
        if let Some(size) = self.page_size {
            query.insert("page_size".to_string(), size.to_string());
        }
        query
    }
}

/// Option of a select or multi-select property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Options available to a select or multi-select property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    pub options: Vec<SelectOption>,
}

/// Type-specific configuration of a database property
///
/// See <https://developers.notion.com/reference/database#database-properties>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyConfig {
    Title {},
    RichText {},
    Number {},
    Select { select: SelectOptions },
    MultiSelect { multi_select: SelectOptions },
    Date {},
    Checkbox {},
    Url {},
    Email {},
    CreatedTime {},
    LastEditedTime {},
    /// A property type this client does not model
    #[serde(other)]
    Unsupported,
}

/// Schema of one database column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub config: PropertyConfig,
}

/// A Notion database
///
/// See <https://developers.notion.com/reference/database>
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub object: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub title: Vec<RichText>,

    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

impl Database {
    pub fn title_text(&self) -> String {
        plain_text(&self.title)
    }
}

/// One page of the list databases endpoint
///
/// See <https://developers.notion.com/reference/get-databases>
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseList {
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub results: Vec<Database>,
}

/// Where a page lives
///
/// See <https://developers.notion.com/reference/page#parent>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: String },
    PageId { page_id: String },
    Workspace { workspace: bool },
}

/// Value of a select property on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectPropertyValue {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Value of one option of a multi-select property on a page
pub type MultiSelectPropertyValue = SelectPropertyValue;

/// Typed value of a page property
///
/// See <https://developers.notion.com/reference/page#all-property-values>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValueKind {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Number {
        number: Option<f64>,
    },
    Select {
        select: Option<SelectPropertyValue>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<MultiSelectPropertyValue>,
    },
    Checkbox {
        checkbox: bool,
    },
    Url {
        url: Option<String>,
    },
    Email {
        email: Option<String>,
    },
    CreatedTime {
        created_time: DateTime<Utc>,
    },
    LastEditedTime {
        last_edited_time: DateTime<Utc>,
    },
    /// A property type this client does not model
    #[serde(other)]
    Unsupported,
}

/// Identifier, type and value of a page property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    #[serde(default)]
    pub id: String,

    #[serde(flatten)]
    pub value: PropertyValueKind,
}

/// A Notion page
///
/// See <https://developers.notion.com/reference/page>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub object: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<DateTime<Utc>>,

    pub parent: Parent,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

/// One page of database query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageList {
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub results: Vec<Page>,
}

/// Direction of a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort criterion of a database query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    pub direction: SortDirection,
}

impl Sort {
    pub fn by_property(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: Some(property.into()),
            timestamp: None,
            direction,
        }
    }
}

/// Body of the query database endpoint
///
/// The filter is passed through as raw JSON.
/// See <https://developers.notion.com/reference/post-database-query>
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,

    #[serde(flatten)]
    pub page: Pagination,
}
