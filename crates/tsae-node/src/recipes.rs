//! Recipe book replicated through the operation log.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tsae_anti_entropy::OperationHandler;
use tsae_core::Operation;

/// Payload of every replicated operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeCommand {
    /// Insert or replace a recipe
    Add { title: String, body: String },
    /// Delete a recipe if present
    Remove { title: String },
}

impl fmt::Display for RecipeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeCommand::Add { title, body } => write!(f, "add {title}: {body}"),
            RecipeCommand::Remove { title } => write!(f, "remove {title}"),
        }
    }
}

/// In-memory recipe book, the business state behind the log.
#[derive(Debug, Default)]
pub struct Recipes {
    book: Mutex<BTreeMap<String, String>>,
}

impl Recipes {
    pub fn contains(&self, title: &str) -> bool {
        self.book.lock().contains_key(title)
    }

    /// All recipes ordered by title.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.book
            .lock()
            .iter()
            .map(|(title, body)| (title.clone(), body.clone()))
            .collect()
    }
}

impl OperationHandler<RecipeCommand> for Recipes {
    fn apply(&self, operation: &Operation<RecipeCommand>) {
        let mut book = self.book.lock();
        match &operation.payload {
            RecipeCommand::Add { title, body } => {
                book.insert(title.clone(), body.clone());
            }
            RecipeCommand::Remove { title } => {
                book.remove(title);
            }
        }
        tracing::debug!(timestamp = %operation.timestamp, command = %operation.payload, "applied recipe command");
    }
}
