use serde::{Deserialize, Serialize};

use crate::generate_doc_id;

/// One loaded source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub text: String,
    pub source: String,
}

impl DocumentRecord {
    pub fn new(text: String, source: String) -> Self {
        Self {
            doc_id: generate_doc_id(&source),
            text,
            source,
        }
    }
}
