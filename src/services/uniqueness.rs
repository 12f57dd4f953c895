use crate::database::UserStore;
use crate::models::UserIdentity;
use crate::utils::AppError;

/// Fails with `Conflict` when a record with the same (name, age,
/// dateOfBirth) already exists.
///
/// This is an early exit only: the check and the following insert are not
/// atomic, so the store's own uniqueness rule is what finally decides.
pub async fn ensure_identity_available(
    store: &dyn UserStore,
    identity: &UserIdentity,
) -> Result<(), AppError> {
    match store.find_by_identity(identity).await? {
        Some(existing) => {
            log::debug!(
                "Identity collision with {:?} for name={}",
                existing.id,
                identity.name
            );
            Err(AppError::conflict())
        }
        None => Ok(()),
    }
}
