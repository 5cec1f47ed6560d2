//! User administration table.
//!
//! [`UsersPage`] pairs a [`TableController`] of [`UserRecord`]s with the
//! backend. Every successful mutation is followed by a refresh. The table is
//! never patched locally, so what it shows is always what the backend
//! returned last.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::{info, instrument, warn};

use techshack_core::{NewUser, UserId, UserRecord};

use crate::backend::PosBackend;
use crate::error::{StateError, UsersError};
use crate::table::{TableController, TableRecord};

/// Sortable columns of the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserColumn {
    #[default]
    Id,
    Username,
    Position,
}

impl UserColumn {
    /// Every column, in display order.
    pub const ALL: [Self; 3] = [Self::Id, Self::Username, Self::Position];

    /// Field name as it appears in the API.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "user_id",
            Self::Username => "username",
            Self::Position => "position",
        }
    }

    /// Header label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "User ID",
            Self::Username => "Username",
            Self::Position => "Position",
        }
    }
}

impl fmt::Display for UserColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error for an unknown column name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column {0:?} (expected user_id, username or position)")]
pub struct UnknownColumn(pub String);

impl FromStr for UserColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_id" | "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "position" => Ok(Self::Position),
            other => Err(UnknownColumn(other.to_string())),
        }
    }
}

impl TableRecord for UserRecord {
    type Id = UserId;
    type Column = UserColumn;

    fn id(&self) -> UserId {
        self.id
    }

    fn compare(&self, other: &Self, column: UserColumn) -> Ordering {
        match column {
            UserColumn::Id => self.id.cmp(&other.id),
            UserColumn::Username => self.username.cmp(&other.username),
            UserColumn::Position => self.position.cmp(&other.position),
        }
    }
}

/// Users table bound to a backend.
#[derive(Debug)]
pub struct UsersPage<B> {
    backend: B,
    table: TableController<UserRecord>,
}

impl<B: PosBackend> UsersPage<B> {
    /// Empty page sorted by user id. Call [`UsersPage::refresh`] to load.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            table: TableController::new(UserColumn::Id),
        }
    }

    /// The table and its view state.
    pub const fn table(&self) -> &TableController<UserRecord> {
        &self.table
    }

    /// Mutable access for sorting, selection and paging.
    pub const fn table_mut(&mut self) -> &mut TableController<UserRecord> {
        &mut self.table
    }

    /// Fetch all users and replace the table contents. Clears the selection.
    ///
    /// # Errors
    ///
    /// Backend failures; the table keeps its previous contents.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), UsersError> {
        let users = self.backend.fetch_users().await?;
        info!(count = users.len(), "Users loaded");
        self.table.replace_records(users);
        Ok(())
    }

    /// Delete every selected user, then refresh. Returns how many were deleted.
    ///
    /// Deletion stops at the first failure. The table is refreshed anyway so
    /// it reflects whichever deletes went through, and the failure is returned.
    /// A failed refresh is logged, never reported as a failed delete.
    ///
    /// # Errors
    ///
    /// The first delete failure.
    #[instrument(skip(self))]
    pub async fn delete_selected(&mut self) -> Result<usize, UsersError> {
        let ids = self.table.selected_ids();
        if ids.is_empty() {
            return Ok(0);
        }

        if let Err(err) = self.backend.delete_users(&ids).await {
            self.refresh_after("delete").await;
            return Err(err.into());
        }

        info!(count = ids.len(), "Users deleted");
        self.refresh_after("delete").await;
        Ok(ids.len())
    }

    /// Create a user, then refresh. Once the backend has created the user the
    /// record is returned even if the refresh fails.
    ///
    /// # Errors
    ///
    /// Backend failures from the create itself.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&mut self, user: NewUser) -> Result<UserRecord, UsersError> {
        let created = self.backend.create_user(&user).await?;
        info!(user_id = %created.id, "User created");
        self.refresh_after("create").await;
        Ok(created)
    }

    /// Save changes to a user currently in the table, then refresh.
    ///
    /// # Errors
    ///
    /// `UnknownUser` if the id is not in the table, otherwise failures of the
    /// update itself. A failed refresh is only logged.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_user(&mut self, user: UserRecord) -> Result<UserRecord, UsersError> {
        if self.table.find(&user.id).is_none() {
            return Err(StateError::UnknownUser(user.id).into());
        }
        let updated = self.backend.update_user(&user).await?;
        info!(user_id = %updated.id, "User updated");
        self.refresh_after("update").await;
        Ok(updated)
    }

    /// Refresh after a mutation the backend already applied. A failure here
    /// must not turn that mutation into an error, so it is only logged and
    /// the table keeps its previous rows until the next refresh.
    async fn refresh_after(&mut self, action: &str) {
        if let Err(err) = self.refresh().await {
            warn!(action, error = %err, "Refresh after user change failed");
        }
    }
}
