//! JSON state resource.
//!
//! Request handlers over a guarded state document, working on JSON text:
//!
//! | Method | Effect | Returns |
//! |--------|--------|---------|
//! | GET | read | rendered document |
//! | POST | merge body into document | rendered document |
//! | PUT | replace document with body | rendered document |
//! | DELETE | clear document | nothing |
//!
//! Bodies must be JSON objects. A malformed or non-object body is rejected
//! before any lock is taken, leaving the document unchanged.

use crate::error::Result;
use cellar_primitives::{into_object, DocumentCell};
use serde_json::Value;
use tracing::debug;

/// Media types the resource can produce.
pub const MEDIA_TYPES: &[&str] = &["application/json", "text/plain"];

/// GET/POST/PUT/DELETE handlers for one state document.
#[derive(Debug, Clone)]
pub struct StateResource {
    state: DocumentCell,
}

impl StateResource {
    /// Serve the document in `state`.
    pub fn new(state: DocumentCell) -> Self {
        Self { state }
    }

    /// The backing document cell.
    pub fn state(&self) -> &DocumentCell {
        &self.state
    }

    /// Media types this resource produces.
    pub fn media_types(&self) -> &'static [&'static str] {
        MEDIA_TYPES
    }

    /// Render the current document.
    pub fn handle_get(&self) -> Result<String> {
        Ok(self.state.render()?)
    }

    /// Merge the body's fields into the document and render the result.
    pub fn handle_post(&self, body: &str) -> Result<String> {
        let patch = parse_object(body)?;
        debug!(key = %self.state.key(), fields = patch.len(), "merging state");
        self.state.merge(patch)?;
        self.handle_get()
    }

    /// Replace the document with the body and render the result.
    pub fn handle_put(&self, body: &str) -> Result<String> {
        let payload = parse_object(body)?;
        debug!(key = %self.state.key(), "replacing state");
        self.state.replace(payload)?;
        self.handle_get()
    }

    /// Empty the document.
    pub fn handle_delete(&self) -> Result<()> {
        debug!(key = %self.state.key(), "clearing state");
        Ok(self.state.clear()?)
    }
}

fn parse_object(body: &str) -> Result<cellar_primitives::Document> {
    let value: Value = serde_json::from_str(body)?;
    Ok(into_object(value)?)
}
