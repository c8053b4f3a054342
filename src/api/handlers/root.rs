use axum::Json;
use serde_json::{Value, json};

// axum handler for `/`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Bem-vindo à API de Empresas" }))
}
