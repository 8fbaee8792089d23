//! MongoDB document store.
//!
//! Documents are the camelCase serde form of the models. Properties carry
//! one extra field, `createdAtMicros`, because timestamps serialize as
//! RFC 3339 strings that do not sort chronologically. Ties fall back to
//! `_id`, which grows with insertion order.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use super::{FavoriteStore, PropertyStore, RecommendationStore, StoreError, UserStore};
use crate::listing::{
    Equality, ListField, ListingFilter, NumericField, Page, Predicate, TextField,
};
use crate::models::{
    Favorite, Property, PropertyId, PropertyPatch, Recommendation, RecommendationId, User,
    UserId,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DUPLICATE_KEY: i32 = 11000;
const SORT_KEY: &str = "createdAtMicros";
const PASSWORD_KEY: &str = "passwordHash";

#[derive(Debug, Clone)]
pub struct MongoStore {
    properties: Collection<Document>,
    users: Collection<Document>,
    favorites: Collection<Document>,
    recommendations: Collection<Document>,
}

impl MongoStore {
    /// Connects to `uri`, pings `database` and ensures its indexes.
    ///
    /// Timeouts default to five seconds unless the URI sets them. Index creation failures are logged and do not fail startup.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(unavailable)?;
        options.connect_timeout.get_or_insert(CONNECT_TIMEOUT);
        options.server_selection_timeout.get_or_insert(CONNECT_TIMEOUT);
        let client = Client::with_options(options).map_err(unavailable)?;

        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(unavailable)?;
        info!(database = database.name(), "connected to MongoDB");

        let store = Self::from_database(&database);
        if let Err(err) = store.create_indexes().await {
            warn!(error = %err, "failed to create MongoDB indexes");
        }
        Ok(store)
    }

    fn from_database(database: &Database) -> Self {
        Self {
            properties: database.collection("properties"),
            users: database.collection("users"),
            favorites: database.collection("favorites"),
            recommendations: database.collection("recommendations"),
        }
    }

    async fn create_indexes(&self) -> Result<(), MongoError> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.properties
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.properties
            .create_index(IndexModel::builder().keys(newest_first()).build())
            .await?;
        self.favorites
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "propertyId": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.recommendations
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "toUserId": 1, "isRead": 1 })
                    .build(),
            )
            .await?;
        Ok(())
    }

    async fn find_properties(
        &self,
        filter: Document,
        page: Option<Page>,
    ) -> Result<Vec<Property>, StoreError> {
        let mut find = self
            .properties
            .find(filter)
            .sort(newest_first());
        if let Some(page) = page {
            find = find
                .skip(u64::try_from(page.skip()).unwrap_or(u64::MAX))
                .limit(i64::try_from(page.limit()).unwrap_or(i64::MAX));
        }
        let documents: Vec<Document> = find
            .await
            .map_err(unavailable)?
            .try_collect()
            .await
            .map_err(unavailable)?;
        documents.into_iter().map(decode).collect()
    }

    async fn replace_property(&self, property: &Property) -> Result<(), StoreError> {
        self.properties
            .replace_one(doc! { "id": property.id.to_string() }, property_document(property)?)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

/// Creation time descending, then insertion order descending.
fn newest_first() -> Document {
    let mut sort = clause(SORT_KEY, -1);
    sort.insert("_id", -1);
    sort
}

#[async_trait]
impl PropertyStore for MongoStore {
    async fn find(&self, filter: &ListingFilter, page: Page) -> Result<Vec<Property>, StoreError> {
        self.find_properties(filter_document(filter), Some(page)).await
    }

    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        self.properties
            .find_one(doc! { "id": id.to_string() })
            .await
            .map_err(unavailable)?
            .map(decode)
            .transpose()
    }

    async fn find_owned(
        &self,
        id: PropertyId,
        owner: UserId,
    ) -> Result<Option<Property>, StoreError> {
        self.properties
            .find_one(doc! { "id": id.to_string(), "createdBy": owner.to_string() })
            .await
            .map_err(unavailable)?
            .map(decode)
            .transpose()
    }

    async fn insert(&self, property: Property) -> Result<(), StoreError> {
        self.properties
            .insert_one(property_document(&property)?)
            .await
            .map_err(|err| write_failure(err, "property id"))?;
        Ok(())
    }

    async fn update(
        &self,
        id: PropertyId,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Property>, StoreError> {
        let Some(mut property) = PropertyStore::find_by_id(self, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut property);
        property.touch(now);
        self.replace_property(&property).await?;
        Ok(Some(property))
    }

    async fn delete(&self, id: PropertyId) -> Result<bool, StoreError> {
        let result = self
            .properties
            .delete_one(doc! { "id": id.to_string() })
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count > 0)
    }

    async fn update_many(
        &self,
        filter: &ListingFilter,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let matched = self.find_properties(filter_document(filter), None).await?;
        let updated = matched.len();
        for mut property in matched {
            patch.apply(&mut property);
            property.touch(now);
            self.replace_property(&property).await?;
        }
        Ok(updated)
    }

    async fn delete_many(&self, filter: &ListingFilter) -> Result<usize, StoreError> {
        let result = self
            .properties
            .delete_many(filter_document(filter))
            .await
            .map_err(unavailable)?;
        Ok(usize::try_from(result.deleted_count).unwrap_or(usize::MAX))
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.users
            .find_one(doc! { "id": id.to_string() })
            .await
            .map_err(unavailable)?
            .map(decode_user)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users
            .find_one(doc! { "email": email })
            .await
            .map_err(unavailable)?
            .map(decode_user)
            .transpose()
    }

    async fn insert(&self, user: User) -> Result<(), StoreError> {
        self.users
            .insert_one(user_document(&user)?)
            .await
            .map_err(|err| write_failure(err, "email"))?;
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MongoStore {
    async fn insert(&self, favorite: Favorite) -> Result<(), StoreError> {
        self.favorites
            .insert_one(encode(&favorite)?)
            .await
            .map_err(|err| write_failure(err, "favorite"))?;
        Ok(())
    }

    async fn delete(&self, user: UserId, property: PropertyId) -> Result<bool, StoreError> {
        let result = self
            .favorites
            .delete_one(doc! { "userId": user.to_string(), "propertyId": property.to_string() })
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count > 0)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Favorite>, StoreError> {
        let documents: Vec<Document> = self
            .favorites
            .find(doc! { "userId": user.to_string() })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(unavailable)?
            .try_collect()
            .await
            .map_err(unavailable)?;
        documents.into_iter().map(decode).collect()
    }
}

#[async_trait]
impl RecommendationStore for MongoStore {
    async fn insert(&self, recommendation: Recommendation) -> Result<(), StoreError> {
        self.recommendations
            .insert_one(encode(&recommendation)?)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let documents: Vec<Document> = self
            .recommendations
            .find(doc! { "toUserId": recipient.to_string() })
            .sort(doc! { "_id": -1 })
            .await
            .map_err(unavailable)?
            .try_collect()
            .await
            .map_err(unavailable)?;
        let mut addressed = documents
            .into_iter()
            .map(decode::<Recommendation>)
            .collect::<Result<Vec<_>, _>>()?;
        addressed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(addressed)
    }

    async fn mark_read(
        &self,
        id: RecommendationId,
        recipient: UserId,
    ) -> Result<bool, StoreError> {
        let result = self
            .recommendations
            .update_one(
                doc! { "id": id.to_string(), "toUserId": recipient.to_string() },
                doc! { "$set": { "isRead": true } },
            )
            .await
            .map_err(unavailable)?;
        Ok(result.matched_count > 0)
    }
}

// == Documents ==
fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|err| StoreError::Malformed(err.to_string()))
}

fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    bson::from_document(document).map_err(|err| StoreError::Malformed(err.to_string()))
}

fn property_document(property: &Property) -> Result<Document, StoreError> {
    let mut document = encode(property)?;
    document.insert(SORT_KEY, property.created_at.timestamp_micros());
    Ok(document)
}

/// `User` never serializes its hash, so the stored form adds it back.
fn user_document(user: &User) -> Result<Document, StoreError> {
    let mut document = encode(user)?;
    document.insert(PASSWORD_KEY, user.password_hash.as_str());
    Ok(document)
}

fn decode_user(document: Document) -> Result<User, StoreError> {
    let password_hash = document
        .get_str(PASSWORD_KEY)
        .map_err(|err| StoreError::Malformed(err.to_string()))?
        .to_string();
    let mut user: User = decode(document)?;
    user.password_hash = password_hash;
    Ok(user)
}

// == Filters ==
/// Query document for a listing filter. The empty filter matches everything.
pub(crate) fn filter_document(filter: &ListingFilter) -> Document {
    let clauses: Vec<Document> = filter.predicates().iter().map(predicate_clause).collect();
    if clauses.is_empty() {
        Document::new()
    } else {
        doc! { "$and": clauses }
    }
}

fn predicate_clause(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::Range { field, min, max } => {
            let mut bounds = Document::new();
            if let Some(min) = min {
                bounds.insert("$gte", *min);
            }
            if let Some(max) = max {
                bounds.insert("$lte", *max);
            }
            clause(numeric_key(*field), bounds)
        }
        Predicate::Equals(Equality::Text(field, value)) => clause(text_key(*field), value.as_str()),
        Predicate::Equals(Equality::Bedrooms(bedrooms)) => {
            clause("bedrooms", i64::from(*bedrooms))
        }
        Predicate::Equals(Equality::Verified(flag)) => clause("isVerified", *flag),
        Predicate::Contains { field, needle } => clause(
            text_key(*field),
            doc! { "$regex": escape_regex(needle), "$options": "i" },
        ),
        Predicate::AnyOf { field, values } => {
            clause(list_key(*field), doc! { "$in": values.clone() })
        }
        Predicate::AllOf { field, values } => {
            clause(list_key(*field), doc! { "$all": values.clone() })
        }
    }
}

fn clause(key: &str, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(key, value);
    document
}

fn numeric_key(field: NumericField) -> &'static str {
    match field {
        NumericField::Price => "price",
        NumericField::AreaSqFt => "areaSqFt",
        NumericField::Rating => "rating",
    }
}

fn text_key(field: TextField) -> &'static str {
    match field {
        TextField::Type => "type",
        TextField::Status => "status",
        TextField::State => "state",
        TextField::City => "city",
        TextField::Location => "location",
        TextField::Furnished => "furnished",
        TextField::AvailableFrom => "availableFrom",
        TextField::ListedBy => "listedBy",
        TextField::ColorTheme => "colorTheme",
        TextField::ListingType => "listingType",
    }
}

fn list_key(field: ListField) -> &'static str {
    match field {
        ListField::Tags => "tags",
        ListField::Amenities => "amenities",
    }
}

/// Escapes regex metacharacters so a location needle matches literally.
fn escape_regex(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// == Errors ==
fn unavailable(err: MongoError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Maps a unique index violation to `Duplicate(what)`.
fn write_failure(err: MongoError, what: &'static str) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            StoreError::Duplicate(what)
        }
        _ => unavailable(err),
    }
}
