use serde::{Deserialize, Serialize};

/// Configuration for the books module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BooksConfig {
    #[serde(default = "default_max_review_length")]
    pub max_review_length: usize,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            max_review_length: default_max_review_length(),
        }
    }
}

fn default_max_review_length() -> usize {
    255
}
