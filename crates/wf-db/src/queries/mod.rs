//! Query modules, one per table.

pub mod covers;
pub mod episodes;
pub mod movies;
pub mod shows;

use serde::Deserialize;

/// Ordering accepted by the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Insertion order.
    #[default]
    Default,
    /// Newest upload first.
    UploadDate,
}

impl ListOrder {
    fn order_clause(&self) -> &'static str {
        match self {
            ListOrder::Default => "ORDER BY rowid",
            ListOrder::UploadDate => "ORDER BY upload_date DESC",
        }
    }
}

/// Partial update of the editable metadata of a show or movie. `None`
/// leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub hidden: Option<bool>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.hidden.is_none()
    }
}
