// 🏷️ Category Entity
//
// Categories are an open catalog: the table is seeded with the defaults
// below, and any free-text category used by a transaction counts as well.

use crate::db::{Record, RecordExt};
use serde::{Deserialize, Serialize};

/// Seeded into the catalog on first initialization
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Food",
    "Rent",
    "Salary",
    "Entertainment",
    "Transport",
    "Shopping",
    "Utilities",
    "Health",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category {
            id: super::new_id(),
            name: name.into(),
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Category {
            id: record.text("id").unwrap_or_default().to_string(),
            name: record.text("name").unwrap_or_default().to_string(),
        }
    }

    /// Part of the seeded default set
    pub fn is_default(&self) -> bool {
        DEFAULT_CATEGORIES.contains(&self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_unique() {
        let mut names = DEFAULT_CATEGORIES.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_is_default() {
        assert!(Category::new("Food").is_default());
        assert!(!Category::new("Gym").is_default());
        // Catalog names are case-sensitive
        assert!(!Category::new("food").is_default());
    }

    #[test]
    fn test_from_record() {
        let record = json!({ "id": "c1", "name": "Rent" }).as_object().cloned().unwrap();
        let category = Category::from_record(&record);
        assert_eq!(category.id, "c1");
        assert_eq!(category.name, "Rent");
    }
}
