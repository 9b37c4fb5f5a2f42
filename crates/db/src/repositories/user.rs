//! User repository for database operations.
//!
//! Carries the persistence half of the account lockout state machine; the
//! pure decision logic lives in `vantra_core::lockout`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use vantra_core::lockout::{self, FailureOutcome, LockoutPolicy};
use vantra_shared::pagination::PageRequest;

use crate::entities::users::{self, UserStatus};

/// Optional field changes applied by the admin user-update endpoint.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New account status.
    pub status: Option<UserStatus>,
    /// New role assignment (`Some(None)` clears the role).
    pub role_id: Option<Option<Uuid>>,
}

/// Filters for the paginated user listing.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    /// Substring match against email and names.
    pub search: Option<String>,
    /// Filter by account status.
    pub status: Option<UserStatus>,
    /// Filter by assigned role.
    pub role_id: Option<Uuid>,
}

/// User repository for CRUD and lockout operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        role_id: Option<Uuid>,
    ) -> Result<users::Model, DbErr> {
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            phone: Set(phone.map(String::from)),
            status: Set(UserStatus::Active),
            role_id: Set(role_id),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            password_changed_at: Set(None),
            last_login_at: Set(None),
            last_login_ip: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Registers a failed login attempt.
    ///
    /// Persists the incremented counter; on reaching the policy threshold
    /// the account is suspended with `locked_until` set, and the returned
    /// outcome reports `locked()` so the caller can emit a security audit
    /// event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn record_failed_login(
        &self,
        user: &users::Model,
        policy: &LockoutPolicy,
    ) -> Result<FailureOutcome, DbErr> {
        let now = Utc::now();
        let outcome = lockout::register_failure(user.failed_login_attempts, policy, now);

        let mut active = users::ActiveModel {
            id: Set(user.id),
            failed_login_attempts: Set(outcome.attempts),
            updated_at: Set(now),
            ..Default::default()
        };
        if let Some(until) = outcome.locked_until {
            active.status = Set(UserStatus::Suspended);
            active.locked_until = Set(Some(until));
        }
        active.update(&self.db).await?;

        Ok(outcome)
    }

    /// Clears the lockout state: failure counter, `locked_until`, and
    /// restores status to active.
    ///
    /// Called when an elapsed lockout heals, after every successful login,
    /// and after every password change.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn reset_lockout(&self, user_id: Uuid) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            status: Set(UserStatus::Active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Records a successful login: clears lockout state and stamps
    /// `last_login_at` / `last_login_ip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn record_successful_login(
        &self,
        user_id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<(), DbErr> {
        let now = Utc::now();
        users::ActiveModel {
            id: Set(user_id),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            status: Set(UserStatus::Active),
            last_login_at: Set(Some(now)),
            last_login_ip: Set(ip_address.map(String::from)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Updates the password hash, stamps `password_changed_at`, and clears
    /// any lockout state.
    ///
    /// Outstanding access tokens issued before this instant are rejected by
    /// the authorization gate's password-change check.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        let now = Utc::now();
        users::ActiveModel {
            id: Set(user_id),
            password_hash: Set(password_hash.to_string()),
            password_changed_at: Set(Some(now)),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Applies admin-side field changes to a user.
    ///
    /// Admin suspension goes through here and never sets `locked_until`,
    /// so it is not auto-healed by the lockout check.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(&self, user_id: Uuid, changes: UserChanges) -> Result<users::Model, DbErr> {
        let mut active = users::ActiveModel {
            id: Set(user_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(role_id) = changes.role_id {
            active.role_id = Set(role_id);
        }

        active.update(&self.db).await
    }

    /// Lists users with filters and pagination, newest first.
    ///
    /// Returns the page of users plus the total matching count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &UserListFilter,
        page: &PageRequest,
    ) -> Result<(Vec<users::Model>, u64), DbErr> {
        let mut query = users::Entity::find();

        if let Some(search) = &filter.search {
            query = query.filter(
                users::Column::Email
                    .contains(search)
                    .or(users::Column::FirstName.contains(search))
                    .or(users::Column::LastName.contains(search)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(users::Column::Status.eq(status));
        }
        if let Some(role_id) = filter.role_id {
            query = query.filter(users::Column::RoleId.eq(role_id));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(users::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }
}
