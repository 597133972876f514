use std::sync::Arc;

use tracing::{event, Level};

use crate::{
    domain::Product,
    dtos::{CreateProductRequest, ProductResponse, UpdateProductRequest},
    errors::ProductError,
    repositories::{ProductStore, StorageError},
};

/// Mediates between the HTTP handlers and the product store.
///
/// Update and delete look the product up before mutating, since deleting a missing
/// identifier is a silent no-op in the store.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        ProductService { store }
    }

    pub async fn list_products(&self) -> Result<Vec<ProductResponse>, ProductError> {
        let products = self.store.find_all().await.map_err(storage_failure)?;
        event!(Level::DEBUG, "Listing {} products", products.len());

        products
            .into_iter()
            .map(|product| ProductResponse::try_from(product).map_err(storage_failure))
            .collect()
    }

    pub async fn get_product(&self, id: i64) -> Result<ProductResponse, ProductError> {
        let product = self.find_existing(id).await?;
        event!(Level::DEBUG, "Found product {}", id);

        ProductResponse::try_from(product).map_err(storage_failure)
    }

    pub async fn create_product(&self, request: CreateProductRequest) -> Result<ProductResponse, ProductError> {
        let created = self
            .store
            .save(Product::from(request))
            .await
            .map_err(storage_failure)?;
        let response = ProductResponse::try_from(created).map_err(storage_failure)?;

        event!(Level::INFO, "Created product {}", response.id);
        Ok(response)
    }

    pub async fn update_product(&self, id: i64, request: UpdateProductRequest) -> Result<ProductResponse, ProductError> {
        let mut product = self.find_existing(id).await?;
        product.replace_details(request.name, request.maker, request.price, request.image_url);

        // Overwrite-only: a delete that lands after the lookup surfaces as NotFound.
        let updated = match self.store.save(product).await {
            Ok(updated) => updated,
            Err(StorageError::Missing(missing)) => {
                event!(Level::WARN, "Product {} disappeared before update", missing);
                return Err(ProductError::NotFound(missing));
            }
            Err(e) => return Err(storage_failure(e)),
        };

        event!(Level::INFO, "Updated product {}", id);
        ProductResponse::try_from(updated).map_err(storage_failure)
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ProductError> {
        if !self.store.exists_by_id(id).await.map_err(storage_failure)? {
            event!(Level::WARN, "Cannot delete product {}: not found", id);
            return Err(ProductError::NotFound(id));
        }

        self.store.delete_by_id(id).await.map_err(storage_failure)?;

        event!(Level::INFO, "Deleted product {}", id);
        Ok(())
    }

    async fn find_existing(&self, id: i64) -> Result<Product, ProductError> {
        match self.store.find_by_id(id).await.map_err(storage_failure)? {
            Some(product) => Ok(product),
            None => {
                event!(Level::WARN, "Product {} not found", id);
                Err(ProductError::NotFound(id))
            }
        }
    }
}

fn storage_failure(e: StorageError) -> ProductError {
    event!(Level::ERROR, "Product store failed: {}", e);
    ProductError::Storage(e)
}
