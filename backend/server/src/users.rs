use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::info;
use uuid::Uuid;

use crate::{
    database::{Store, StoreError, load, save},
    error::AppError,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

fn user_key(id: &str) -> String {
    format!("user:{id}")
}

fn email_key(email: &str) -> String {
    format!("userEmail:{}", email.trim().to_lowercase())
}

fn internal<E: std::error::Error + Send + Sync + 'static>(error: E) -> AppError {
    AppError::InternalError(Box::new(error))
}

/// Claims the email before anything else so concurrent sign-ups cannot share it.
pub async fn create_user(
    store: &dyn Store,
    email: &str,
    password: &str,
    cost: u32,
) -> Result<User, AppError> {
    let id = Uuid::new_v4().to_string();
    let index = email_key(email);

    if !store.set_if_absent(&index, id.clone(), None).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    match store_user(store, id, email, password, cost).await {
        Ok(user) => Ok(user),
        Err(e) => {
            store.delete(&index).await?;
            Err(e)
        }
    }
}

async fn store_user(
    store: &dyn Store,
    id: String,
    email: &str,
    password: &str,
    cost: u32,
) -> Result<User, AppError> {
    let password = password.to_string();
    let password_hash = spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(internal)?
        .map_err(internal)?;

    let user = User {
        id,
        email: email.trim().to_string(),
        password_hash,
    };

    save(store, &user_key(&user.id), &user, None).await?;
    info!("User saved: {}", user.id);

    Ok(user)
}

pub async fn get_user(store: &dyn Store, id: &str) -> Result<Option<User>, StoreError> {
    load(store, &user_key(id)).await
}

pub async fn find_user_by_email(store: &dyn Store, email: &str) -> Result<Option<User>, StoreError> {
    match store.get(&email_key(email)).await? {
        Some(id) => get_user(store, &id).await,
        None => Ok(None),
    }
}

pub async fn is_password_valid(user: &User, password: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = user.password_hash.clone();

    spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(internal)?
        .map_err(internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let store = MemoryStore::new();

        let user = create_user(&store, " Ada@Example.com ", "pw", 4).await.unwrap();
        let found = find_user_by_email(&store, "ada@example.com").await.unwrap().unwrap();

        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "Ada@Example.com");
        assert_ne!(found.password_hash, "pw");
        assert!(find_user_by_email(&store, "bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_signups_share_no_email() {
        let store = MemoryStore::new();

        let (first, second) = tokio::join!(
            create_user(&store, "ada@example.com", "pw", 4),
            create_user(&store, "ADA@example.com", "pw", 4),
        );

        let winner = match (first, second) {
            (Ok(user), Err(AppError::Conflict(_))) | (Err(AppError::Conflict(_)), Ok(user)) => user,
            other => panic!("expected exactly one signup to win, got {other:?}"),
        };
        let indexed = find_user_by_email(&store, "ada@example.com").await.unwrap().unwrap();

        assert_eq!(indexed.id, winner.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_password_check() {
        let store = MemoryStore::new();
        let user = create_user(&store, "ada@example.com", "correct horse", 4).await.unwrap();

        assert!(is_password_valid(&user, "correct horse").await.unwrap());
        assert!(!is_password_valid(&user, "battery staple").await.unwrap());
    }
}
