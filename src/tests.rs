//! Integration tests for the catalog backend.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, StoreKind};
use crate::db::{init_database, SqliteStore};
use crate::{create_router, AppState};

const ADMIN_KEY: &str = "test-admin-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    data_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_key(Some(ADMIN_KEY.to_string())).await
    }

    async fn with_key(admin_key: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let data_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = Arc::new(SqliteStore::new(pool));

        // Create config
        let config = Config {
            admin_key: admin_key.clone(),
            store: StoreKind::Sqlite,
            db_path,
            data_dir: data_dir.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            page_size: 20,
            error_sample: 10,
        };

        let app = create_router(AppState::new(store, config));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = admin_key {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            data_dir,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn write_bucket(&self, category: &str, subcategory: &str, records: Value) {
        let dir = self.data_dir.join(category).join(subcategory);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("products.json"), records.to_string()).unwrap();
    }

    async fn get_json(&self, path: &str) -> Value {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "GET {}", path);
        resp.json().await.unwrap()
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn create_product(&self, name: &str, brand: &str) -> Value {
        let (status, body) = self
            .post_json("/api/products", json!({ "name": name, "brand": brand }))
            .await;
        assert_eq!(status, 200);
        body["data"].clone()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_key() {
    let fixture = TestFixture::new().await;

    // Request without admin key
    let resp = Client::new()
        .get(fixture.url("/api/products"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_key() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/products"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_bearer_key() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/products"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_dev_mode_without_key() {
    let fixture = TestFixture::with_key(None).await;

    let body = fixture.get_json("/api/categories").await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_sanitize_endpoint() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/products/sanitize",
            json!({
                "\u{feff}name": "Cola",
                "brand": "ACME",
                "ingredients": [["Water", "sugar"], "caffeine"],
                "net_weight": 330
            }),
        )
        .await;

    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["name"], "Cola");
    assert_eq!(data["ingredients"], json!(["water", "sugar", "caffeine"]));
    assert_eq!(data["net_weight"], "330");
    assert_eq!(data["barcode"], "");
    assert_eq!(data["alergen_warning"], json!([]));
}

#[tokio::test]
async fn test_product_crud() {
    let fixture = TestFixture::new().await;

    // Create product
    let created = fixture.create_product("Cola", "ACME").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["barcode"].as_str().unwrap().starts_with("MANUAL_"));

    // Get product
    let body = fixture.get_json(&format!("/api/products/{}", id)).await;
    assert_eq!(body["data"]["name"], "Cola");

    // Update product (full replace)
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/products/{}", id)))
        .json(&json!({
            "name": "Cola Zero",
            "brand": "ACME",
            "barcode": "123",
            "category": "drinks"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Cola Zero");
    assert_eq!(body["data"]["barcode"], "123");
    assert_eq!(body["data"]["category"], "drinks");

    // Delete product
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Verify deleted
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/products/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_product_validation_errors() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json("/api/products", json!({ "name": "", "brand": "X" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post_json("/api/products", json!({ "name": "Only name" }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture.post_json("/api/products", json!(["a"])).await;
    assert_eq!(status, 400);

    let resp = fixture
        .client
        .put(fixture.url("/api/products/nonexistent"))
        .json(&json!({ "name": "A", "brand": "B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_product_pagination_covers_everything_once() {
    let fixture = TestFixture::new().await;

    let names = ["Delta", "alpha", "Charlie", "Bravo", "Echo", "Bravo", "Foxtrot"];
    for name in names {
        fixture.create_product(name, "Brand").await;
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut first = true;
    loop {
        let mut path = "/api/products?pageSize=3".to_string();
        if let Some(c) = &cursor {
            path.push_str(&format!("&cursor={}", c));
        }
        let body = fixture.get_json(&path).await;
        let data = &body["data"];

        if first {
            assert_eq!(data["total"], 7);
            first = false;
        } else {
            assert!(data.get("total").is_none());
        }

        for item in data["items"].as_array().unwrap() {
            seen.push((
                item["name"].as_str().unwrap().to_string(),
                item["id"].as_str().unwrap().to_string(),
            ));
        }

        if data["hasMore"] == true {
            cursor = Some(data["nextCursor"].as_str().unwrap().to_string());
        } else {
            assert!(data["nextCursor"].is_null());
            break;
        }
    }

    assert_eq!(seen.len(), 7);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
    let ids: HashSet<&str> = seen.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(ids.len(), 7);
}

#[tokio::test]
async fn test_product_search_and_brand_filter() {
    let fixture = TestFixture::new().await;

    fixture.create_product("Cola", "ACME").await;
    fixture.create_product("Cola Light", "Fizz").await;
    fixture.create_product("Water", "ACME").await;

    let body = fixture.get_json("/api/products?search=cOLa").await;
    assert_eq!(body["data"]["total"], 2);

    let body = fixture.get_json("/api/products?search=cola&brand=ACME").await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Cola");

    let body = fixture.get_json("/api/products?brand=acme").await;
    assert_eq!(body["data"]["total"], 0);

    let body = fixture.get_json("/api/products/brands").await;
    assert_eq!(body["data"], json!(["ACME", "Fizz"]));
}

#[tokio::test]
async fn test_cursor_from_other_search_restarts() {
    let fixture = TestFixture::new().await;

    for name in ["Apple", "Apricot", "Banana"] {
        fixture.create_product(name, "Fruit").await;
    }

    let body = fixture.get_json("/api/products?pageSize=1&search=ap").await;
    let cursor = body["data"]["nextCursor"].as_str().unwrap().to_string();

    let body = fixture
        .get_json(&format!("/api/products?pageSize=1&search=an&cursor={}", cursor))
        .await;
    assert_eq!(body["data"]["items"][0]["name"], "Banana");

    let body = fixture
        .get_json("/api/products?pageSize=1&cursor=garbage")
        .await;
    assert_eq!(body["data"]["items"][0]["name"], "Apple");
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn test_preference_crud_and_filter() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/preferences",
            json!({ "name": "Gluten Free", "type": "diet", "ingredients": ["wheat", " ", "barley "] }),
        )
        .await;
    assert_eq!(status, 200);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["typeId"], "gluten_free");
    assert_eq!(body["data"]["ingredients"], json!(["wheat", "barley"]));

    fixture
        .post_json(
            "/api/preferences",
            json!({ "name": "Peanut", "type": "allergy", "typeId": "peanut_allergy" }),
        )
        .await;

    let body = fixture.get_json("/api/preferences?type=diet").await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Gluten Free");

    let body = fixture.get_json("/api/preferences?search=ALLERGY").await;
    assert_eq!(body["data"]["items"][0]["name"], "Peanut");

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/preferences/{}", id)))
        .json(&json!({ "name": "Coeliac", "type": "diet" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["typeId"], "coeliac");
    assert_eq!(body["data"]["ingredients"], json!([]));

    let (status, body) = fixture
        .post_json("/api/preferences", json!({ "type": "diet" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/preferences/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = fixture.get_json("/api/preferences").await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_category_crud_and_overview() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json("/api/categories", json!({ "name": "drinks", "level": "category" }))
        .await;
    assert_eq!(status, 200);
    let drinks_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"].get("parentId").is_none());

    let (status, body) = fixture
        .post_json(
            "/api/categories",
            json!({ "name": "soda", "level": "subcategory", "parentId": drinks_id }),
        )
        .await;
    assert_eq!(status, 200);
    let soda_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = fixture
        .post_json("/api/categories", json!({ "name": "juice", "level": "subcategory" }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post_json(
            "/api/categories",
            json!({ "name": "frozen", "level": "category", "parentId": drinks_id }),
        )
        .await;
    assert_eq!(status, 400);

    let body = fixture.get_json("/api/categories").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Deleting a category with subcategories conflicts
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/categories/{}", drinks_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Rename the subcategory
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/categories/{}", soda_id)))
        .json(&json!({ "name": "fizzy", "level": "subcategory", "parentId": drinks_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = fixture
        .post_json(
            "/api/products",
            json!({ "name": "Crisps", "brand": "Crunch", "category": "snacks" }),
        )
        .await;
    assert_eq!(status, 200);

    let body = fixture.get_json("/api/categories/overview").await;
    assert_eq!(
        body["data"],
        json!([
            { "name": "snacks", "productCount": 1, "subcategories": ["General"] },
            { "name": "drinks", "productCount": 0, "subcategories": ["fizzy"] }
        ])
    );
}

#[tokio::test]
async fn test_import_dry_run_then_live() {
    let fixture = TestFixture::new().await;

    fixture.write_bucket(
        "drinks",
        "soda",
        json!([
            { "\u{feff}name": "Cola", "brand": "ACME", "ingredients": [["water", "sugar"], "caffeine"] },
            { "name": "", "brand": "X" }
        ]),
    );
    fixture.write_bucket(
        "snacks",
        "bar",
        json!([{ "name": "Granola", "brand": "Oat Co", "barcode": "42" }]),
    );

    let (status, body) = fixture
        .post_json("/api/import/all", json!({ "dryRun": true }))
        .await;
    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["dryRun"], true);
    assert_eq!(data["totalFound"], 3);
    assert_eq!(data["totalSucceeded"], 2);
    assert_eq!(data["totalFailed"], 1);
    assert_eq!(data["successRate"], 67);
    assert_eq!(
        data["buckets"]["drinks/soda"]["errors"],
        json!(["Invalid product: missing name or brand"])
    );

    let body = fixture.get_json("/api/products").await;
    assert_eq!(body["data"]["total"], 0);

    let (status, body) = fixture.post_json("/api/import/all", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["dryRun"], false);
    assert_eq!(body["data"]["totalSucceeded"], 2);

    let body = fixture.get_json("/api/products").await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Cola");
    assert_eq!(items[0]["category"], "drinks");
    assert!(items[0]["barcode"].as_str().unwrap().starts_with("IMPORT_"));
    assert_eq!(items[1]["barcode"], "42");
}

#[tokio::test]
async fn test_import_all_without_body_runs_live() {
    let fixture = TestFixture::new().await;
    fixture.write_bucket(
        "snacks",
        "bar",
        json!([{ "name": "Granola", "brand": "Oat Co" }]),
    );

    let resp = fixture
        .client
        .post(fixture.url("/api/import/all"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["dryRun"], false);
    assert_eq!(body["data"]["totalSucceeded"], 1);

    let body = fixture.get_json("/api/products").await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_import_test_variant() {
    let fixture = TestFixture::new().await;

    let records: Vec<Value> = (0..8)
        .map(|i| json!({ "name": format!("Bar {}", i), "brand": "Choco" }))
        .collect();
    fixture.write_bucket("snacks", "bar", Value::Array(records));

    let (status, body) = fixture
        .post_json(
            "/api/import/test",
            json!({ "category": "snacks", "subcategory": "bar" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalSucceeded"], 5);

    let (status, body) = fixture
        .post_json(
            "/api/import/test",
            json!({ "category": "snacks", "subcategory": "missing", "limit": 2 }),
        )
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "SOURCE_READ_ERROR");

    let (status, _) = fixture
        .post_json(
            "/api/import/test",
            json!({ "category": "..", "subcategory": "bar" }),
        )
        .await;
    assert_eq!(status, 400);
}
