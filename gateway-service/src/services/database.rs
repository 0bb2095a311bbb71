//! MongoDB storage backend.
//!
//! Collections: `org`, `user`, `role`, `svc` and `admin`, all keyed by `_id`.
//! User password digests live on the user document but are never part of the
//! `User` model.

use async_trait::async_trait;
use futures::{future, stream, StreamExt, TryStreamExt};
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{FindOptions, IndexOptions, ReplaceOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::BTreeSet;

use super::repository::{
    AdminUserRepository, EntityStream, HealthCheck, OrgRepository, RoleRepository, SvcRepository,
    UserRepository,
};
use crate::models::{AdminUser, Organization, Resource, Role, Service, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrgDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    org_id: String,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pwd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    svcs: BTreeSet<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SvcDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    resources: BTreeSet<Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminDocument {
    #[serde(rename = "_id")]
    id: String,
    pwd: String,
}

impl From<OrgDocument> for Organization {
    fn from(d: OrgDocument) -> Self {
        Organization::new(d.id, d.name)
    }
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        User::new(d.id, d.org_id, d.roles)
    }
}

impl From<RoleDocument> for Role {
    fn from(d: RoleDocument) -> Self {
        Role::new(d.id, d.svcs)
    }
}

impl From<SvcDocument> for Service {
    fn from(d: SvcDocument) -> Self {
        Service::new(d.id, d.resources)
    }
}

fn database_error(context: &'static str) -> impl Fn(mongodb::error::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {}", context, e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    }
}

/// Cuts an id-ordered listing that starts at `prefix` once ids stop
/// sharing it.
fn within_prefix(orgs: EntityStream<Organization>, prefix: &str) -> EntityStream<Organization> {
    let prefix = prefix.to_string();
    orgs.try_take_while(move |org| future::ready(Ok(org.id.starts_with(&prefix))))
        .boxed()
}

/// Streams every document matching `filter`, sorted by `_id`.
fn find_sorted<D, T>(
    collection: Collection<D>,
    filter: Document,
    context: &'static str,
) -> EntityStream<T>
where
    D: DeserializeOwned + Unpin + Send + Sync + 'static,
    T: From<D> + Send + 'static,
{
    let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
    stream::once(async move { collection.find(filter, options).await })
        .try_flatten()
        .map_err(database_error(context))
        .map_ok(T::from)
        .boxed()
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for gateway-service");

        // Users are listed per organization and removed with it
        let org_id_index = IndexModel::builder()
            .keys(doc! { "org_id": 1 })
            .options(IndexOptions::builder().name("org_id_idx".to_string()).build())
            .build();

        self.users()
            .create_index(org_id_index, None)
            .await
            .map_err(database_error("Failed to create org_id index"))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn orgs(&self) -> Collection<OrgDocument> {
        self.db.collection("org")
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection("user")
    }

    fn roles(&self) -> Collection<RoleDocument> {
        self.db.collection("role")
    }

    fn svcs(&self) -> Collection<SvcDocument> {
        self.db.collection("svc")
    }

    fn admins(&self) -> Collection<AdminDocument> {
        self.db.collection("admin")
    }

    async fn replace<D>(
        &self,
        collection: Collection<D>,
        id: &str,
        document: D,
    ) -> Result<(), AppError>
    where
        D: Serialize + Send + Sync,
    {
        let options = ReplaceOptions::builder().upsert(true).build();
        collection
            .replace_one(doc! { "_id": id }, document, options)
            .await
            .map_err(database_error("Failed to save document"))?;
        Ok(())
    }

    async fn exists<D>(&self, collection: Collection<D>, id: &str) -> Result<bool, AppError>
    where
        D: Send + Sync,
    {
        let count = collection
            .count_documents(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to count documents"))?;
        Ok(count > 0)
    }

    async fn delete<D>(&self, collection: Collection<D>, filter: Document) -> Result<(), AppError>
    where
        D: Send + Sync,
    {
        collection
            .delete_many(filter, None)
            .await
            .map_err(database_error("Failed to delete documents"))?;
        Ok(())
    }
}

#[async_trait]
impl OrgRepository for MongoDb {
    fn find_by_id_prefix(&self, prefix: &str) -> EntityStream<Organization> {
        let filter = doc! { "_id": { "$gte": prefix } };
        within_prefix(
            find_sorted(self.orgs(), filter, "Failed to list organizations"),
            prefix,
        )
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, AppError> {
        let found = self
            .orgs()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to find organization"))?;
        Ok(found.map(Organization::from))
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        self.exists(self.orgs(), id).await
    }

    async fn save(&self, org: Organization) -> Result<Organization, AppError> {
        let document = OrgDocument {
            id: org.id.clone(),
            name: org.name.clone(),
        };
        self.replace(self.orgs(), &org.id, document).await?;
        Ok(org)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.delete(self.orgs(), doc! { "_id": id }).await
    }
}

#[async_trait]
impl UserRepository for MongoDb {
    fn find_all(&self) -> EntityStream<User> {
        find_sorted(self.users(), doc! {}, "Failed to list users")
    }

    fn find_by_org_id(&self, org_id: &str) -> EntityStream<User> {
        find_sorted(self.users(), doc! { "org_id": org_id }, "Failed to list users")
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let found = self
            .users()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to find user"))?;
        Ok(found.map(User::from))
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        self.exists(self.users(), id).await
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        let roles = to_bson(&user.roles)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?;
        let options = UpdateOptions::builder().upsert(true).build();
        self.users()
            .update_one(
                doc! { "_id": user.id.as_str() },
                doc! { "$set": { "org_id": user.org_id.as_str(), "roles": roles } },
                options,
            )
            .await
            .map_err(database_error("Failed to save user"))?;
        Ok(user)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.delete(self.users(), doc! { "_id": id }).await
    }

    async fn delete_by_org_id(&self, org_id: &str) -> Result<(), AppError> {
        self.delete(self.users(), doc! { "org_id": org_id }).await
    }

    async fn find_pwd(&self, id: &str) -> Result<Option<String>, AppError> {
        let found = self
            .users()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to find user"))?;
        Ok(found.and_then(|d| d.pwd))
    }

    async fn change_pwd(&self, id: &str, pwd: &str) -> Result<(), AppError> {
        let result = self
            .users()
            .update_one(doc! { "_id": id }, doc! { "$set": { "pwd": pwd } }, None)
            .await
            .map_err(database_error("Failed to change user password"))?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MongoDb {
    fn find_all(&self) -> EntityStream<Role> {
        find_sorted(self.roles(), doc! {}, "Failed to list roles")
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Role>, AppError> {
        let found = self
            .roles()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to find role"))?;
        Ok(found.map(Role::from))
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        self.exists(self.roles(), id).await
    }

    async fn save(&self, role: Role) -> Result<Role, AppError> {
        let document = RoleDocument {
            id: role.id.clone(),
            svcs: role.svcs.clone(),
        };
        self.replace(self.roles(), &role.id, document).await?;
        Ok(role)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.delete(self.roles(), doc! { "_id": id }).await
    }
}

#[async_trait]
impl SvcRepository for MongoDb {
    fn find_all(&self) -> EntityStream<Service> {
        find_sorted(self.svcs(), doc! {}, "Failed to list services")
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        let found = self
            .svcs()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(database_error("Failed to find service"))?;
        Ok(found.map(Service::from))
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        self.exists(self.svcs(), id).await
    }

    async fn save(&self, svc: Service) -> Result<Service, AppError> {
        let document = SvcDocument {
            id: svc.id.clone(),
            resources: svc.resources.clone(),
        };
        self.replace(self.svcs(), &svc.id, document).await?;
        Ok(svc)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.delete(self.svcs(), doc! { "_id": id }).await
    }
}

#[async_trait]
impl AdminUserRepository for MongoDb {
    async fn get_admin_user(&self) -> Result<Option<AdminUser>, AppError> {
        let found = self
            .admins()
            .find_one(doc! { "_id": AdminUser::ID }, None)
            .await
            .map_err(database_error("Failed to find admin user"))?;
        Ok(found.map(|d| AdminUser::new(d.pwd)))
    }

    async fn change_pwd(&self, pwd: &str) -> Result<(), AppError> {
        let document = AdminDocument {
            id: AdminUser::ID.to_string(),
            pwd: pwd.to_string(),
        };
        self.replace(self.admins(), AdminUser::ID, document).await
    }
}

#[async_trait]
impl HealthCheck for MongoDb {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(database_error("MongoDB health check failed"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_prefix_stops_after_prefix() {
        let listing = stream::iter(
            ["01.", "01.x", "010", "02", "01.y"]
                .into_iter()
                .map(|id| Ok::<_, AppError>(Organization::new(id, id))),
        )
        .boxed();

        let ids: Vec<String> = within_prefix(listing, "01.")
            .map_ok(|org| org.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec!["01.", "01.x"]);
    }

    #[test]
    fn test_user_document_hides_password() {
        let user: User = UserDocument {
            id: "u1".to_string(),
            org_id: "o1".to_string(),
            roles: ["r1".to_string()].into_iter().collect(),
            pwd: Some("digest".to_string()),
        }
        .into();
        assert_eq!(user, User::new("u1", "o1", ["r1"]));
    }
}
