// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::workflow::IdentityWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<IdentityWorkflow>,
    /// Request body limit for evidence uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(workflow: IdentityWorkflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
