//! RegisterIntentHandler - Command handler for recording a user's intent to pay.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{Email, PendingIntent};
use crate::ports::PendingIntentRepository;

/// Command to register a pending intent.
#[derive(Debug, Clone)]
pub struct RegisterIntentCommand {
    pub email: String,
}

/// Result of successful registration.
#[derive(Debug, Clone)]
pub struct RegisterIntentResult {
    pub intent: PendingIntent,
}

/// Handler for registering pending intents.
///
/// The returned intent id is meant to travel as the payment's external
/// reference so the webhook can match the payment to this intent.
pub struct RegisterIntentHandler {
    repository: Arc<dyn PendingIntentRepository>,
}

impl RegisterIntentHandler {
    pub fn new(repository: Arc<dyn PendingIntentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: RegisterIntentCommand) -> Result<RegisterIntentResult, DomainError> {
        let email = Email::new(cmd.email)?;
        let intent = PendingIntent::new(email);

        self.repository.save(&intent).await?;

        tracing::info!(intent_id = %intent.id, "Pending intent registered");

        Ok(RegisterIntentResult { intent })
    }
}
