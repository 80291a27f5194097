//! Completion polling for picker sessions.

pub mod backend_client;
pub mod controller;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    models::{picker_session::PickerSession, user::Credentials},
    picker::PickerError,
    services::picker_session::PickerSessionService,
};

pub use backend_client::BackendClient;
pub use controller::{PollConfig, PollState, PollWatcher, PollingController};

/// Something that can report the authoritative state of the caller's session.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn refresh_status(&self) -> Result<PickerSession, PickerError>;
}

/// Polls the in-process session service on behalf of one user.
pub struct ManagedStatusSource {
    service: Arc<PickerSessionService>,
    credentials: Credentials,
}

impl ManagedStatusSource {
    pub fn new(service: Arc<PickerSessionService>, credentials: Credentials) -> Self {
        Self {
            service,
            credentials,
        }
    }
}

#[async_trait]
impl StatusSource for ManagedStatusSource {
    async fn refresh_status(&self) -> Result<PickerSession, PickerError> {
        self.service.refresh_status(&self.credentials).await
    }
}
