//! User database queries.
//!
//! This module provides CRUD operations for user records. Mutating functions
//! leave their changes pending in the session; callers decide when to commit.

use userstore_common::{Error, Result};

use crate::models::User;
use crate::session::Session;

/// Insert a new user, letting the store assign `id` and `signup_date`.
///
/// # Arguments
///
/// * `session` - Open session
/// * `name` - Display name
/// * `email` - Email address, unique across all users
///
/// # Returns
///
/// * `Ok(i64)` - The assigned id
/// * `Err(Error::Constraint)` - If the email is already taken
pub fn insert_user(session: &mut Session, name: &str, email: &str) -> Result<i64> {
    session
        .mutate(
            "INSERT INTO users (name, email) VALUES (:name, :email)",
            rusqlite::named_params! {
                ":name": name,
                ":email": email,
            },
        )
        .map_err(|e| match e {
            Error::Constraint(msg) if msg.contains("users.email") => {
                Error::constraint(format!("Email '{}' already exists ({})", email, msg))
            }
            other => other,
        })?;

    session.last_insert_rowid()
}

/// Insert several users in order, stopping at the first failure.
///
/// # Returns
///
/// * `Ok(Vec<i64>)` - Assigned ids, in input order
/// * `Err(Error)` - The first insert error; earlier inserts stay pending
pub fn insert_users(session: &mut Session, users: &[(&str, &str)]) -> Result<Vec<i64>> {
    users
        .iter()
        .map(|(name, email)| insert_user(session, name, email))
        .collect()
}

/// Get a user by email.
///
/// # Returns
///
/// * `Ok(Some(User))` - The user if found
/// * `Ok(None)` - If no user has that email
/// * `Err(Error)` - If a database error occurs
pub fn get_user_by_email(session: &Session, email: &str) -> Result<Option<User>> {
    let mut users = session.query_map(
        "SELECT * FROM users WHERE email = :email",
        rusqlite::named_params! { ":email": email },
        User::from_row,
    )?;

    Ok(users.pop())
}

/// Find every user with the given name, ordered by id.
pub fn find_users_by_name(session: &Session, name: &str) -> Result<Vec<User>> {
    session.query_map(
        "SELECT * FROM users WHERE name = :name ORDER BY id",
        rusqlite::named_params! { ":name": name },
        User::from_row,
    )
}

/// List all users ordered by id.
pub fn list_users(session: &Session) -> Result<Vec<User>> {
    session.query_map("SELECT * FROM users ORDER BY id", [], User::from_row)
}

/// Count all users.
pub fn count_users(session: &Session) -> Result<i64> {
    let counts: Vec<i64> = session.query_map("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(counts.first().copied().unwrap_or(0))
}

/// Replace an email address.
///
/// # Returns
///
/// * `Ok(usize)` - Number of users changed (0 if `old_email` is unknown)
/// * `Err(Error::Constraint)` - If `new_email` is already taken
pub fn update_email(session: &mut Session, old_email: &str, new_email: &str) -> Result<usize> {
    session.mutate(
        "UPDATE users SET email = :new_email WHERE email = :old_email",
        rusqlite::named_params! {
            ":old_email": old_email,
            ":new_email": new_email,
        },
    )
}

/// Set or clear a user's phone number.
///
/// Requires the `phone_number` column.
///
/// # Returns
///
/// * `Ok(())` - If the update succeeded
/// * `Err(Error::InvalidInput)` - If the user does not exist
pub fn set_phone_number(session: &mut Session, id: i64, phone_number: Option<&str>) -> Result<()> {
    let rows_affected = session.mutate(
        "UPDATE users SET phone_number = :phone_number WHERE id = :id",
        rusqlite::named_params! {
            ":id": id,
            ":phone_number": phone_number,
        },
    )?;

    if rows_affected == 0 {
        return Err(Error::invalid_input(format!("User {} does not exist", id)));
    }

    Ok(())
}

/// Delete every user with the given name.
///
/// # Returns
///
/// * `Ok(usize)` - Number of users deleted
pub fn delete_users_by_name(session: &mut Session, name: &str) -> Result<usize> {
    session.mutate(
        "DELETE FROM users WHERE name = :name",
        rusqlite::named_params! { ":name": name },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use assert_matches::assert_matches;
    use tempfile::tempdir;
    use userstore_common::UncommittedPolicy;

    fn session() -> Session {
        let mut session = Session::open_in_memory(UncommittedPolicy::Rollback).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session
    }

    #[test]
    fn test_insert_increments_count() {
        let mut session = session();

        let emails = ["a@example.com", "b@example.com", "c@example.com"];
        for (i, email) in emails.iter().enumerate() {
            insert_user(&mut session, "Someone", email).unwrap();
            assert_eq!(count_users(&session).unwrap(), i as i64 + 1);
        }
    }

    #[test]
    fn test_insert_assigns_ids_and_signup_date() {
        let mut session = session();
        let ids = insert_users(
            &mut session,
            &[
                ("Sofia Ramirez", "sofia.ramirez@example.com"),
                ("Devon Blake", "devon.blake@example.com"),
            ],
        )
        .unwrap();
        assert_eq!(ids, vec![1, 2]);

        let sofia = get_user_by_email(&session, "sofia.ramirez@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(sofia.id, 1);
        assert_eq!(sofia.name, "Sofia Ramirez");
        assert!(sofia.signup_date.is_some());
        assert_eq!(sofia.phone_number, None);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut session = session();
        insert_user(&mut session, "Sofia Ramirez", "sofia.ramirez@example.com").unwrap();

        let result = insert_user(&mut session, "Sofia Impostor", "sofia.ramirez@example.com");
        assert_matches!(result, Err(Error::Constraint(msg)) if msg.contains("already exists"));
        assert_eq!(count_users(&session).unwrap(), 1);
    }

    #[test]
    fn test_update_email_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        schema::create_users_table(&mut session).unwrap();
        insert_users(
            &mut session,
            &[
                ("Sofia Ramirez", "sofia.ramirez@example.com"),
                ("Devon Blake", "devon.blake@example.com"),
            ],
        )
        .unwrap();
        session.commit().unwrap();

        let changed = update_email(
            &mut session,
            "devon.blake@example.com",
            "devon.blake@newdomain.com",
        )
        .unwrap();
        assert_eq!(changed, 1);
        session.commit().unwrap();
        session.close().unwrap();

        let session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        let matches = session
            .query_map(
                "SELECT name FROM users WHERE email = 'devon.blake@newdomain.com'",
                [],
                |row| row.get::<_, String>(0),
            )
            .unwrap();
        assert_eq!(matches, vec!["Devon Blake"]);
        assert!(get_user_by_email(&session, "devon.blake@example.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_unknown_email_changes_nothing() {
        let mut session = session();
        let changed = update_email(&mut session, "nobody@example.com", "x@example.com").unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_delete_test_user() {
        let mut session = session();
        insert_user(&mut session, "Sofia Ramirez", "sofia.ramirez@example.com").unwrap();
        insert_user(&mut session, "Test User", "test@test.com").unwrap();
        session.commit().unwrap();

        assert_eq!(find_users_by_name(&session, "Test User").unwrap().len(), 1);
        let deleted = delete_users_by_name(&mut session, "Test User").unwrap();
        assert_eq!(deleted, 1);
        session.commit().unwrap();

        assert!(find_users_by_name(&session, "Test User").unwrap().is_empty());
        assert_eq!(count_users(&session).unwrap(), 1);
    }

    #[test]
    fn test_phone_number_after_schema_change() {
        let mut session = session();
        let id = insert_user(&mut session, "Devon Blake", "devon.blake@example.com").unwrap();
        session.commit().unwrap();

        schema::add_phone_number_column(&mut session).unwrap();
        set_phone_number(&mut session, id, Some("555-0100")).unwrap();
        session.commit().unwrap();

        let users = list_users(&session).unwrap();
        assert_eq!(users[0].phone_number.as_deref(), Some("555-0100"));

        assert_matches!(
            set_phone_number(&mut session, 99, None),
            Err(Error::InvalidInput(_))
        );
    }

    #[test]
    fn test_list_users_on_dropped_table() {
        let mut session = session();
        schema::drop_users_table(&mut session).unwrap();
        assert_matches!(list_users(&session), Err(Error::MissingTable(_)));
    }
}
