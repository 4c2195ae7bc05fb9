//! Opaque page cursors.
//!
//! A cursor is URL-safe base64 over a small JSON object: the sort key of the
//! last item handed out plus the search scope it was produced under. Callers
//! never look inside it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::db::SortKey;

/// Search and filter terms a page sequence runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub search: Option<String>,
    pub filter: Option<String>,
}

impl Scope {
    /// Terms are trimmed; blank terms count as absent.
    pub fn new(search: Option<&str>, filter: Option<&str>) -> Self {
        let clean = |term: Option<&str>| {
            term.map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };
        Self {
            search: clean(search),
            filter: clean(filter),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.filter.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorToken {
    name: String,
    id: String,
    scope: Scope,
}

pub fn encode_cursor(key: &SortKey, scope: &Scope) -> String {
    let token = CursorToken {
        name: key.name.clone(),
        id: key.id.clone(),
        scope: scope.clone(),
    };
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_vec(&token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Position encoded in `token`, or `None` when the token is malformed or was
/// produced under a different scope. `None` restarts the sequence.
pub fn decode_cursor(token: &str, scope: &Scope) -> Option<SortKey> {
    let bytes = match URL_SAFE_NO_PAD.decode(token.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Ignoring cursor, base64 decode failed: {}", e);
            return None;
        }
    };
    let decoded: CursorToken = match serde_json::from_slice(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Ignoring cursor, JSON parse failed: {}", e);
            return None;
        }
    };
    if &decoded.scope != scope {
        tracing::debug!("Ignoring cursor produced under a different search or filter");
        return None;
    }
    Some(SortKey::new(decoded.name, decoded.id))
}
