//! Customer mirror model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use super::MirrorRecord;

/// A customer known to the local store.
///
/// `remote_id` is null until the customer has been provisioned on the
/// remote platform (or pulled from it); once set it is unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub remote_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organization_number: Option<String>,
    pub phone_number: Option<String>,
    /// Single-line rendering of the postal address.
    pub postal_address: Option<String>,
    pub address_line1: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    /// Local-only; sync never writes it.
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Whether the customer has a remote identity the saga can reference.
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Find a customer by local id.
    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a customer by remote id.
    pub async fn get_by_remote_id<'e, E>(
        executor: E,
        remote_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM customers WHERE remote_id = $1")
            .bind(remote_id)
            .fetch_optional(executor)
            .await
    }

    /// List all customers ordered by local id.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM customers ORDER BY id")
            .fetch_all(executor)
            .await
    }

    /// Insert a new customer; the local id is assigned by the database.
    pub async fn insert<'e, E>(executor: E, data: &Self) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO customers
                (remote_id, name, email, organization_number, phone_number,
                 postal_address, address_line1, postal_code, city, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(data.remote_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.organization_number)
        .bind(&data.phone_number)
        .bind(&data.postal_address)
        .bind(&data.address_line1)
        .bind(&data.postal_code)
        .bind(&data.city)
        .bind(&data.country)
        .fetch_one(executor)
        .await
    }

    /// Overwrite all mutable columns of an existing customer.
    pub async fn update<'e, E>(executor: E, data: &Self) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            UPDATE customers
            SET remote_id = $2,
                name = $3,
                email = $4,
                organization_number = $5,
                phone_number = $6,
                postal_address = $7,
                address_line1 = $8,
                postal_code = $9,
                city = $10,
                country = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(data.id)
        .bind(data.remote_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.organization_number)
        .bind(&data.phone_number)
        .bind(&data.postal_address)
        .bind(&data.address_line1)
        .bind(&data.postal_code)
        .bind(&data.city)
        .bind(&data.country)
        .fetch_optional(executor)
        .await
    }
}

impl MirrorRecord for Customer {
    const ENTITY: &'static str = "customer";

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_id(&self) -> Option<i64> {
        self.remote_id
    }

    fn merge_remote(&mut self, incoming: &Self) -> bool {
        let before = self.clone();
        self.name.clone_from(&incoming.name);
        self.email.clone_from(&incoming.email);
        self.organization_number
            .clone_from(&incoming.organization_number);
        self.phone_number.clone_from(&incoming.phone_number);
        self.postal_address.clone_from(&incoming.postal_address);
        self.address_line1.clone_from(&incoming.address_line1);
        self.postal_code.clone_from(&incoming.postal_code);
        self.city.clone_from(&incoming.city);
        *self != before
    }

    fn assign_identity(&mut self, id: i64, at: DateTime<Utc>) {
        self.id = id;
        self.created_at = at;
        self.updated_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(name: &str, email: &str) -> Customer {
        Customer {
            remote_id: Some(80_389_576),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Customer::default()
        }
    }

    #[test]
    fn test_merge_overwrites_remote_fields_only() {
        let mut local = remote("Old Name", "old@example.com");
        local.id = 42;

        let changed = local.merge_remote(&remote("Acme AS", "post@acme.no"));

        assert!(changed);
        assert_eq!(local.id, 42);
        assert_eq!(local.name.as_deref(), Some("Acme AS"));
        assert_eq!(local.email.as_deref(), Some("post@acme.no"));
    }

    #[test]
    fn test_merge_keeps_local_country() {
        let mut local = remote("Acme AS", "post@acme.no");
        local.country = Some("Norway".to_string());

        let changed = local.merge_remote(&remote("Acme Norge AS", "post@acme.no"));

        assert!(changed);
        assert_eq!(local.country.as_deref(), Some("Norway"));
    }

    #[test]
    fn test_merge_identical_reports_no_change() {
        let mut local = remote("Acme AS", "post@acme.no");
        local.id = 7;
        assert!(!local.merge_remote(&remote("Acme AS", "post@acme.no")));
    }

    #[test]
    fn test_is_provisioned() {
        assert!(remote("a", "b").is_provisioned());
        assert!(!Customer::default().is_provisioned());
    }
}
