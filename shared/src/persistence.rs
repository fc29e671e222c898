//! Product-form draft storage. The draft is CBOR under a versioned key so a
//! future layout change can simply start from a fresh key.

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{AppError, ErrorKind};
use crate::products::ProductsDraft;

pub const MAX_DRAFT_BYTES: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("draft encoding failed: {0}")]
    Encode(String),

    #[error("draft decoding failed: {0}")]
    Decode(String),

    #[error("draft is {size} bytes, max {max}")]
    TooLarge { size: usize, max: usize },
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        let kind = match e {
            PersistenceError::Encode(_) => ErrorKind::Serialization,
            PersistenceError::Decode(_) => ErrorKind::Deserialization,
            PersistenceError::TooLarge { .. } => ErrorKind::Storage,
        };
        AppError::new(kind, "Draft could not be stored").with_internal(e.to_string())
    }
}

pub fn encode_draft(draft: &ProductsDraft) -> Result<Vec<u8>, PersistenceError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(draft, &mut buf)
        .map_err(|e| PersistenceError::Encode(e.to_string()))?;
    if buf.len() > MAX_DRAFT_BYTES {
        return Err(PersistenceError::TooLarge {
            size: buf.len(),
            max: MAX_DRAFT_BYTES,
        });
    }
    Ok(buf)
}

pub fn decode_draft(bytes: &[u8]) -> Result<ProductsDraft, PersistenceError> {
    if bytes.len() > MAX_DRAFT_BYTES {
        return Err(PersistenceError::TooLarge {
            size: bytes.len(),
            max: MAX_DRAFT_BYTES,
        });
    }
    let draft: ProductsDraft =
        ciborium::de::from_reader(bytes).map_err(|e| PersistenceError::Decode(e.to_string()))?;
    if draft.rows.is_empty() {
        return Err(PersistenceError::Decode("draft has no rows".into()));
    }
    Ok(draft)
}

/// Folds a key-value read into the draft to restore, if any.
#[must_use]
pub fn restore(value: Option<&[u8]>) -> Option<ProductsDraft> {
    let Some(bytes) = value else {
        debug!("no stored draft");
        return None;
    };
    match decode_draft(bytes) {
        Ok(draft) => {
            debug!(rows = draft.rows.len(), "draft restored");
            Some(draft)
        }
        Err(e) => {
            warn!(error = %e, "ignoring stored draft");
            None
        }
    }
}
