//! Repository for the `employees` table.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use crate::models::employee::Employee;

const COLUMNS: &str = "id, employer_id, user_id, name, telegram_chat_id, created_at";

/// Provides read operations for employee profiles.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Find an employee profile by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the employee profile linked to a login user, if any.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE user_id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
