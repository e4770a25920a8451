//! Domain services. Each depends only on repository and provider ports.

mod accounts;
mod payments;
mod surveys;

pub use accounts::AccountService;
pub use payments::{to_minor_units, PaymentService};
pub use surveys::{plan_update, SurveyService};

use uuid::Uuid;

use crate::domain::error::DomainError;

/// Parse a path identifier, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::invalid_id(raw))
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid_and_rejects_object_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_id("65f1c0ffee0ddba11deadbee"),
            Err(DomainError::InvalidId { .. })
        ));
    }
}
