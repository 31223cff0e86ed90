pub mod overview;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

/// 项目查询
pub struct ProjectService {
    storage: Arc<dyn Storage>,
}

impl ProjectService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // 当前用户参与的项目
    pub async fn list_mine(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        overview::handle_my_projects(self, request).await
    }
}
