use crate::{
    models::usermodel::{Actor, UserRole},
    service::error::ServiceError,
};

/// Checked at the top of every engine operation that is role-restricted.
pub fn authorize(actor: &Actor, allowed: &[UserRole]) -> Result<(), ServiceError> {
    if allowed.contains(&actor.role) {
        return Ok(());
    }

    let roles: Vec<&str> = allowed.iter().map(|r| r.to_str()).collect();
    Err(ServiceError::permission(format!(
        "This action requires one of the roles: {}",
        roles.join(", ")
    )))
}

/// Ownership check shared by the engines.
pub fn ensure_owner(actor: &Actor, owner_id: uuid::Uuid, what: &str) -> Result<(), ServiceError> {
    if actor.id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::permission(format!("You do not own this {}", what)))
    }
}
