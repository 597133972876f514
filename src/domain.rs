use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub maker: String,
    pub price: u64,
    pub image_url: String,
}

impl Product {
    /// A product that has not been stored yet; the store assigns its id on save.
    pub fn new(name: String, maker: String, price: u64, image_url: String) -> Self {
        Product {
            id: None,
            name,
            maker,
            price,
            image_url,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Overwrites every field except the identifier.
    pub fn replace_details(&mut self, name: String, maker: String, price: u64, image_url: String) {
        self.name = name;
        self.maker = maker;
        self.price = price;
        self.image_url = image_url;
    }
}
