//! Root greeting.

use axum::Json;
use serde_json::{json, Value};

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_handler() {
        let Json(body) = root_handler().await;
        assert_eq!(body["message"], "Hello World");
    }
}
