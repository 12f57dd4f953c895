use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::database::UserStore;
use crate::models::{User, UserIdentity, UserPatch};
use crate::utils::AppError;

/// In-process store used for local runs (`USER_STORE=memory`) and tests.
/// Records keep insertion order.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

fn position_of(users: &[User], id: &str) -> Option<usize> {
    let object_id = ObjectId::parse_str(id).ok()?;
    users.iter().position(|u| u.id == Some(object_id))
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| &u.identity() == identity).cloned())
    }

    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        let identity = user.identity();
        if users.iter().any(|u| u.identity() == identity) {
            return Err(AppError::conflict());
        }

        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn update_by_id(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        let Some(index) = position_of(&users, id) else {
            return Ok(None);
        };

        let mut updated = users[index].clone();
        patch.apply_to(&mut updated);

        let identity = updated.identity();
        let collides = users
            .iter()
            .enumerate()
            .any(|(i, u)| i != index && u.identity() == identity);
        if collides {
            return Err(AppError::conflict());
        }

        users[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(position_of(&users, id).map(|index| users.remove(index)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
