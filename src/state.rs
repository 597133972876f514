use std::sync::Arc;

use crate::service::ProductService;

#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<ProductService>,
}
