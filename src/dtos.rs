use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::{domain::Product, repositories::StorageError};

/// MongoDB stores integers as signed 64-bit, so prices are capped at `i64::MAX`.
pub const MAX_PRICE: u64 = i64::MAX as u64;

fn storable_price<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = u64::deserialize(deserializer)?;
    if price > MAX_PRICE {
        return Err(D::Error::custom(format!("price {} exceeds {}", price, MAX_PRICE)));
    }
    Ok(price)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub maker: String,
    #[serde(deserialize_with = "storable_price")]
    pub price: u64,
    #[serde(alias = "image")]
    pub image_url: String,
}

impl From<CreateProductRequest> for Product {
    fn from(request: CreateProductRequest) -> Self {
        Product::new(request.name, request.maker, request.price, request.image_url)
    }
}

// Full replace: every field is required, nothing is carried over from the stored product.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: String,
    pub maker: String,
    #[serde(deserialize_with = "storable_price")]
    pub price: u64,
    #[serde(alias = "image")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub maker: String,
    pub price: u64,
    pub image_url: String,
}

impl TryFrom<Product> for ProductResponse {
    type Error = StorageError;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        let id = product.id.ok_or(StorageError::MissingIdentifier)?;

        Ok(ProductResponse {
            id,
            name: product.name,
            maker: product.maker,
            price: product.price,
            image_url: product.image_url,
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub timestamp: String,
}

impl ApiError {
    pub fn new(error: String) -> Self {
        ApiError {
            error,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_request_accepts_image_alias() {
        let request: CreateProductRequest = serde_json::from_value(json!({
            "name": "product1",
            "maker": "maker1",
            "price": 10000,
            "image": "https://http.cat/599"
        }))
        .unwrap();

        assert_eq!(request.image_url, "https://http.cat/599");
    }

    #[test]
    fn update_request_rejects_missing_fields() {
        let result = serde_json::from_value::<UpdateProductRequest>(json!({
            "name": "only a name"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let result = serde_json::from_value::<CreateProductRequest>(json!({
            "name": "product1",
            "maker": "maker1",
            "price": -1,
            "imageUrl": "https://http.cat/599"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn price_is_capped_at_signed_64_bit() {
        let at_cap = serde_json::from_value::<UpdateProductRequest>(json!({
            "name": "n",
            "maker": "m",
            "price": MAX_PRICE,
            "imageUrl": "i"
        }))
        .unwrap();
        assert_eq!(at_cap.price, MAX_PRICE);

        let over_cap = serde_json::from_value::<CreateProductRequest>(json!({
            "name": "n",
            "maker": "m",
            "price": MAX_PRICE + 1,
            "imageUrl": "i"
        }));
        assert!(over_cap.is_err());
    }

    #[test]
    fn response_uses_camel_case() {
        let response = ProductResponse {
            id: 1,
            name: "product1".into(),
            maker: "maker1".into(),
            price: 10_000,
            image_url: "https://http.cat/599".into(),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "id": 1,
                "name": "product1",
                "maker": "maker1",
                "price": 10000,
                "imageUrl": "https://http.cat/599"
            })
        );
    }

    #[test]
    fn unsaved_product_has_no_response_shape() {
        let product = Product::new("a".into(), "b".into(), 1, "c".into());

        assert!(matches!(
            ProductResponse::try_from(product),
            Err(StorageError::MissingIdentifier)
        ));
    }
}
