//! User role constants.
//!
//! Roles are stored as plain strings on the `users` row and embedded in JWT
//! claims. Keep the constants here so the api and db crates never spell them
//! out by hand.

/// The studio owner: assigns jobs, owns comics, approves and archives work.
pub const ROLE_EMPLOYER: &str = "employer";

/// A roster member: completes assigned jobs and chats with the employer.
pub const ROLE_EMPLOYEE: &str = "employee";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_EMPLOYER, ROLE_EMPLOYEE];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_accepted() {
        assert!(validate_role(ROLE_EMPLOYER).is_ok());
        assert!(validate_role(ROLE_EMPLOYEE).is_ok());
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(validate_role("admin").is_err());
        assert!(validate_role("").is_err());
    }
}
