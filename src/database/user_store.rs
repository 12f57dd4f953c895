use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::database::MongoDB;
use crate::models::{User, UserIdentity, UserPatch, USERS_COLLECTION};
use crate::utils::AppError;

const DUPLICATE_KEY: i32 = 11000;
const IDENTITY_INDEX: &str = "name_age_dateOfBirth_unique";

/// Persistence boundary for user records.
///
/// Implementations must reject an insert or update that would give two
/// records the same (name, age, dateOfBirth) triple with `AppError::Conflict`.
/// Ids that cannot be parsed are treated as absent.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<User>, AppError>;

    /// Persists a new record and returns it with its assigned id.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    /// Applies `patch` and returns the updated record, or `None` if no record has `id`.
    async fn update_by_id(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, AppError>;

    /// Removes the record and returns it, or `None` if no record has `id`.
    async fn delete_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    fn kind(&self) -> &'static str;
}

pub struct MongoUserStore {
    db: MongoDB,
    collection: Collection<User>,
}

impl MongoUserStore {
    pub async fn new(db: MongoDB) -> Self {
        Self::with_collection(db, USERS_COLLECTION).await
    }

    pub async fn with_collection(db: MongoDB, name: &str) -> Self {
        let collection = db.collection::<User>(name);
        let store = Self { db, collection };
        store.ensure_indexes().await;
        store
    }

    /// Creates the unique compound index on the identity triple. Failure is
    /// logged and tolerated; inserts are checked by the service and updates
    /// by `update_by_id` before writing.
    async fn ensure_indexes(&self) {
        log::info!("🔧 Creating database indexes...");

        let identity_index = IndexModel::builder()
            .keys(doc! { "name": 1, "age": 1, "dateOfBirth": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(IDENTITY_INDEX.to_string())
                    .build(),
            )
            .build();

        match self.collection.create_index(identity_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(name, age, dateOfBirth) unique"),
            Err(e) => log::warn!("   ⚠️  Could not create identity index: {}", e),
        }
    }
}

/// Matches any other record carrying `identity`.
fn identity_conflict_filter(id: ObjectId, identity: &UserIdentity) -> Document {
    doc! {
        "name": &identity.name,
        "age": identity.age,
        "dateOfBirth": identity.date_of_birth,
        "_id": { "$ne": id },
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_error(err: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&err) {
        AppError::conflict()
    } else {
        AppError::from(err)
    }
}

fn set_document(patch: &UserPatch) -> Document {
    let mut set = Document::new();

    if let Some(name) = &patch.name {
        set.insert("name", name.as_str());
    }
    if let Some(age) = patch.age {
        set.insert("age", age);
    }
    if let Some(date_of_birth) = patch.date_of_birth {
        set.insert("dateOfBirth", date_of_birth);
    }
    if let Some(password) = &patch.password {
        set.insert("password", password.as_str());
    }
    if let Some(gender) = patch.gender {
        set.insert("gender", gender.as_str());
    }
    if let Some(about) = &patch.about {
        set.insert("about", about.as_str());
    }

    set
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let cursor = self.collection.find(doc! {}).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users)
    }

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<User>, AppError> {
        let filter = doc! {
            "name": &identity.name,
            "age": identity.age,
            "dateOfBirth": identity.date_of_birth,
        };

        Ok(self.collection.find_one(filter).await?)
    }

    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        let result = self
            .collection
            .insert_one(&user)
            .await
            .map_err(map_write_error)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Internal("Inserted id is not an ObjectId".to_string()))?;
        user.id = Some(id);

        Ok(user)
    }

    async fn update_by_id(&self, id: &str, patch: &UserPatch) -> Result<Option<User>, AppError> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(self.collection.find_one(doc! { "_id": object_id }).await?);
        }

        if patch.touches_identity() {
            let Some(mut merged) = self.collection.find_one(doc! { "_id": object_id }).await? else {
                return Ok(None);
            };
            patch.apply_to(&mut merged);

            let filter = identity_conflict_filter(object_id, &merged.identity());
            if self.collection.find_one(filter).await?.is_some() {
                return Err(AppError::conflict());
            }
        }

        self.collection
            .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": set_document(patch) })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Ok(self
            .collection
            .find_one_and_delete(doc! { "_id": object_id })
            .await?)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.db.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mongodb"
    }
}
