use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{event, Level};
use crate::domain::Product;
use std::{collections::BTreeMap, sync::Arc};

pub static COUNTER_COLLECTION_NAME: &str = "counters";

#[derive(Debug, Clone)]
pub struct MongoDbInitializationInfo {
    pub uri: String,
    pub database: String,
    pub collection: String
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("MongoDB operation failed: {0}")]
    MongoDb(#[from] mongodb::error::Error),

    #[error("identifier sequence {0} could not be advanced")]
    Sequence(String),

    #[error("stored product has no identifier")]
    MissingIdentifier,

    #[error("no stored product with id {0} to overwrite")]
    Missing(i64),
}

/// Storage collaborator for products.
///
/// `save` inserts and assigns an identifier when the product has none, otherwise it
/// overwrites the record with that identifier and fails with `StorageError::Missing`
/// if there is none. `delete_by_id` is a no-op for an absent identifier, so callers
/// that care must check `exists_by_id` first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Product>, StorageError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StorageError>;
    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError>;
    async fn save(&self, product: Product) -> Result<Product, StorageError>;
    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    products: BTreeMap<i64, Product>,
    last_id: i64,
}

#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        InMemoryProductRepository::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, StorageError> {
        let lock = self.state.lock().await;
        Ok(lock.products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StorageError> {
        let lock = self.state.lock().await;
        Ok(lock.products.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError> {
        let lock = self.state.lock().await;
        Ok(lock.products.contains_key(&id))
    }

    async fn save(&self, product: Product) -> Result<Product, StorageError> {
        let mut lock = self.state.lock().await;
        match product.id {
            Some(id) => match lock.products.get_mut(&id) {
                Some(stored) => {
                    *stored = product.clone();
                    Ok(product)
                }
                None => Err(StorageError::Missing(id)),
            },
            None => {
                lock.last_id += 1;
                let id = lock.last_id;
                let product = product.with_id(id);
                lock.products.insert(id, product.clone());
                Ok(product)
            }
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        let mut lock = self.state.lock().await;
        lock.products.remove(&id);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoDbProductRepository {
    product_collection: Collection<Product>,
    counter_collection: Collection<Document>,
    sequence_name: String,
}

impl MongoDbProductRepository {
    pub async fn new(info: &MongoDbInitializationInfo, client: &Client) -> Result<Self, StorageError> {
        let database = client.database(&info.database);
        let product_collection: Collection<Product> = database.collection(&info.collection);

        let unique_id = IndexModel::builder()
            .keys(doc! {"id": 1})
            .options(IndexOptions::builder().unique(true).build())
            .build();
        product_collection.create_index(unique_id).await?;

        event!(Level::INFO, "Using MongoDB collection {}.{}", info.database, info.collection);

        Ok(MongoDbProductRepository {
            product_collection,
            counter_collection: database.collection(COUNTER_COLLECTION_NAME),
            sequence_name: info.collection.clone(),
        })
    }

    async fn next_id(&self) -> Result<i64, StorageError> {
        let counter = self
            .counter_collection
            .find_one_and_update(
                doc! {"_id": self.sequence_name.as_str()},
                doc! {"$inc": {"seq": 1_i64}},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        match counter {
            Some(document) => document
                .get_i64("seq")
                .map_err(|e| StorageError::Sequence(format!("{}: {}", self.sequence_name, e))),
            None => Err(StorageError::Sequence(self.sequence_name.clone())),
        }
    }
}

#[async_trait]
impl ProductStore for MongoDbProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, StorageError> {
        let products: Vec<Product> = self
            .product_collection
            .find(doc! {})
            .sort(doc! {"id": 1})
            .await?
            .try_collect()
            .await?;

        Ok(products)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StorageError> {
        Ok(self.product_collection.find_one(doc! {"id": id}).await?)
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError> {
        let count = self
            .product_collection
            .count_documents(doc! {"id": id})
            .limit(1)
            .await?;

        Ok(count > 0)
    }

    async fn save(&self, product: Product) -> Result<Product, StorageError> {
        match product.id {
            Some(id) => {
                let result = self
                    .product_collection
                    .replace_one(doc! {"id": id}, &product)
                    .upsert(false)
                    .await?;

                if result.matched_count == 0 {
                    return Err(StorageError::Missing(id));
                }
                Ok(product)
            }
            None => {
                let id = self.next_id().await?;
                event!(Level::DEBUG, "Assigned id {} from sequence {}", id, self.sequence_name);

                let product = product.with_id(id);
                self.product_collection.insert_one(&product).await?;
                Ok(product)
            }
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        self.product_collection.delete_one(doc! {"id": id}).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product::new(name.into(), "maker".into(), 1_000, "https://http.cat/200".into())
    }

    #[tokio::test]
    async fn save_assigns_increasing_identifiers() {
        let repository = InMemoryProductRepository::new();

        let first = repository.save(product("first")).await.unwrap();
        let second = repository.save(product("second")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn save_with_identifier_overwrites() {
        let repository = InMemoryProductRepository::new();
        let mut stored = repository.save(product("before")).await.unwrap();

        stored.name = "after".into();
        repository.save(stored.clone()).await.unwrap();

        let all = repository.find_all().await.unwrap();
        assert_eq!(all, vec![stored]);
    }

    #[tokio::test]
    async fn save_with_unknown_identifier_does_not_insert() {
        let repository = InMemoryProductRepository::new();

        let result = repository.save(product("ghost").with_id(10)).await;

        assert!(matches!(result, Err(StorageError::Missing(10))));
        assert!(!repository.exists_by_id(10).await.unwrap());
    }

    #[tokio::test]
    async fn save_after_delete_does_not_resurrect() {
        let repository = InMemoryProductRepository::new();
        let stored = repository.save(product("deleted")).await.unwrap();
        let id = stored.id.unwrap();

        repository.delete_by_id(id).await.unwrap();
        let result = repository.save(stored).await;

        assert!(matches!(result, Err(StorageError::Missing(missing)) if missing == id));
        assert_eq!(repository.find_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_identifier_is_never_reissued() {
        let repository = InMemoryProductRepository::new();
        let first = repository.save(product("first")).await.unwrap();
        repository.delete_by_id(first.id.unwrap()).await.unwrap();

        let next = repository.save(product("next")).await.unwrap();

        assert_eq!(next.id, Some(2));
    }

    #[tokio::test]
    async fn find_all_is_ordered_by_identifier() {
        let repository = InMemoryProductRepository::new();
        repository.save(product("a")).await.unwrap();
        repository.save(product("b")).await.unwrap();
        repository.save(product("c")).await.unwrap();

        let ids: Vec<_> = repository
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn delete_of_absent_identifier_is_a_no_op() {
        let repository = InMemoryProductRepository::new();
        let stored = repository.save(product("kept")).await.unwrap();

        repository.delete_by_id(-1).await.unwrap();

        assert!(repository.exists_by_id(stored.id.unwrap()).await.unwrap());
        assert!(!repository.exists_by_id(-1).await.unwrap());
        assert_eq!(repository.find_by_id(-1).await.unwrap(), None);
    }
}
