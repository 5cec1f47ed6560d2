//! User administration.

use tracing::info;

use techshack_client::error::StateError;
use techshack_client::{HttpBackend, UserColumn, UsersPage};
use techshack_core::{NewUser, UserId, UserRecord};

use super::CliError;

/// How to show the users table.
#[derive(Debug)]
pub struct ListArgs {
    pub sort: UserColumn,
    pub descending: bool,
    /// 0-based.
    pub page: usize,
    pub page_size: usize,
}

/// Print one page of the users table.
#[allow(clippy::print_stdout)]
pub async fn list(backend: HttpBackend, args: ListArgs) -> Result<(), CliError> {
    let mut page = UsersPage::new(backend);
    page.refresh().await?;

    let table = page.table_mut();
    if table.sort_key() != args.sort {
        table.request_sort(args.sort);
    }
    if args.descending {
        table.request_sort(args.sort);
    }
    table.set_page_size(args.page_size)?;
    table.set_page(args.page);

    let visible = table.visible_page();
    println!(
        "{:>8}  {:<20} {:<20}",
        UserColumn::Id.label(),
        UserColumn::Username.label(),
        UserColumn::Position.label()
    );
    for user in &visible.rows {
        println!("{:>8}  {:<20} {:<20}", user.id, user.username, user.position);
    }
    println!(
        "page {} of {} ({} users, sorted by {} {})",
        table.page_index() + 1,
        table.page_count().max(1),
        table.records().len(),
        table.sort_key(),
        table.sort_direction().as_str()
    );
    Ok(())
}

pub async fn create(
    backend: HttpBackend,
    username: String,
    position: String,
) -> Result<(), CliError> {
    let mut page = UsersPage::new(backend);
    let created = page.create_user(NewUser { username, position }).await?;
    info!(user_id = %created.id, username = %created.username, "User created");
    Ok(())
}

pub async fn update(
    backend: HttpBackend,
    id: i32,
    username: String,
    position: String,
) -> Result<(), CliError> {
    let mut page = UsersPage::new(backend);
    page.refresh().await?;
    let updated = page
        .update_user(UserRecord {
            id: UserId::new(id),
            username,
            position,
        })
        .await?;
    info!(user_id = %updated.id, "User updated");
    Ok(())
}

/// Delete users by id. Every id must exist before anything is deleted.
pub async fn delete(backend: HttpBackend, ids: Vec<i32>) -> Result<(), CliError> {
    let mut page = UsersPage::new(backend);
    page.refresh().await?;

    let table = page.table_mut();
    for id in ids.into_iter().map(UserId::new) {
        if table.find(&id).is_none() {
            return Err(CliError::Users(StateError::UnknownUser(id).into()));
        }
        if !table.is_selected(&id) {
            table.toggle_select(id);
        }
    }

    let deleted = page.delete_selected().await?;
    info!(count = deleted, "Users deleted");
    Ok(())
}
