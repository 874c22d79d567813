use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    /// Byte range in the source text, when the chunk occurs there verbatim.
    pub offset: Option<(usize, usize)>,
    /// 1-based inclusive line range, same condition as `offset`.
    pub lines: Option<(usize, usize)>,
}

impl Chunk {
    pub fn new(
        doc_id: String,
        text: String,
        source: String,
        offset: Option<(usize, usize)>,
        lines: Option<(usize, usize)>,
    ) -> Self {
        // Generate stable chunk_id from content
        let chunk_id = Self::generate_chunk_id(&doc_id, &text, offset);

        Self {
            doc_id,
            chunk_id,
            text,
            source,
            offset,
            lines,
        }
    }

    fn generate_chunk_id(doc_id: &str, text: &str, offset: Option<(usize, usize)>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(text.as_bytes());
        if let Some((start, end)) = offset {
            hasher.update(start.to_string().as_bytes());
            hasher.update(end.to_string().as_bytes());
        }
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }
}
