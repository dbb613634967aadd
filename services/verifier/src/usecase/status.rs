use crate::domain::repository::IdentityRepository;
use crate::domain::validation::EmailAddress;
use crate::error::VerifierError;

/// Whether an address has ever been verified. Read-only; unknown and
/// malformed addresses report `false`.
pub struct GetStatusUseCase<R: IdentityRepository> {
    pub repo: R,
}

impl<R: IdentityRepository> GetStatusUseCase<R> {
    pub async fn execute(&self, email: &str) -> Result<bool, VerifierError> {
        let Ok(address) = EmailAddress::parse(email) else {
            return Ok(false);
        };
        Ok(self
            .repo
            .find(&address)
            .await?
            .is_some_and(|identity| identity.verified))
    }
}
