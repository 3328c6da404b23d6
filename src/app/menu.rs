// SPDX-License-Identifier: GPL-3.0-only

//! Camera selection menu
//!
//! One entry per selectable camera, labelled `"Camera ID <id>"`. Selecting an
//! entry maps the label back to the bare identifier.

use crate::constants::messages::CAMERA_LABEL_PREFIX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraMenu {
    ids: Vec<String>,
}

impl CameraMenu {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Menu label for a camera identifier
    pub fn label_for(id: &str) -> String {
        format!("{}{}", CAMERA_LABEL_PREFIX, id)
    }

    pub fn labels(&self) -> Vec<String> {
        self.ids.iter().map(|id| Self::label_for(id)).collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Map a selection to a camera identifier
    ///
    /// Accepts a full label, a bare identifier, or a 1-based menu position.
    /// Identifiers win over positions when both would match.
    pub fn resolve(&self, selection: &str) -> Option<&str> {
        let selection = selection.trim();
        let id = selection
            .strip_prefix(CAMERA_LABEL_PREFIX)
            .unwrap_or(selection);

        if let Some(found) = self.ids.iter().find(|candidate| *candidate == id) {
            return Some(found.as_str());
        }

        selection
            .parse::<usize>()
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| self.ids.get(index))
            .map(String::as_str)
    }
}
