use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

use bookstore_api::configuration::{get_configuration, DatabaseSettings};
use bookstore_api::email_client::{EmailClient, SenderEmail};
use bookstore_api::startup::run;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let sender = SenderEmail::parse(configuration.email.sender.clone())
        .expect("Invalid sender email in configuration");
    let email_client = EmailClient::new(
        configuration.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    let server = run(
        listener,
        connection_pool.clone(),
        configuration.application.clone(),
        configuration.jwt.clone(),
        email_client,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

/// Sign up and sign in a user, optionally promoting them to admin first.
async fn access_token_for(
    app: &TestApp,
    client: &reqwest::Client,
    email: &str,
    admin: bool,
) -> String {
    let signup = client
        .post(&format!("{}/auth/signup", &app.address))
        .json(&json!({
            "name": "Catalog Tester",
            "email": email,
            "password": "Ab1!secure"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, signup.status().as_u16());

    if admin {
        sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
            .bind(email)
            .execute(&app.db_pool)
            .await
            .expect("Failed to promote user");
    }

    let signin = client
        .post(&format!("{}/auth/signin", &app.address))
        .json(&json!({ "email": email, "password": "Ab1!secure" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, signin.status().as_u16());

    let body: Value = signin.json().await.expect("Failed to parse response");
    body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn catalog_requires_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/books", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn non_admin_cannot_mutate_the_catalog() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = access_token_for(&app, &client, "reader@example.com", false).await;

    let response = client
        .post(&format!("{}/books", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "The Rust Programming Language",
            "author": "Klabnik & Nichols",
            "priceCents": 3999
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn admin_can_create_and_everyone_signed_in_can_read() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, &client, "admin@example.com", true).await;
    let reader_token = access_token_for(&app, &client, "reader@example.com", false).await;

    let created = client
        .post(&format!("{}/books", &app.address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "The Rust Programming Language",
            "author": "Klabnik & Nichols",
            "priceCents": 3999
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, created.status().as_u16());

    let created_body: Value = created.json().await.unwrap();
    let book_id = created_body["id"].as_str().unwrap();

    let list = client
        .get(&format!("{}/books", &app.address))
        .header("Authorization", format!("Bearer {}", reader_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, list.status().as_u16());

    let books: Value = list.json().await.unwrap();
    assert_eq!(books.as_array().unwrap().len(), 1);
    assert_eq!(books[0]["id"], *book_id);
    assert_eq!(books[0]["priceCents"], 3999);
}

#[tokio::test]
async fn admin_can_update_and_delete() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, &client, "admin@example.com", true).await;

    let created = client
        .post(&format!("{}/books", &app.address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "Draft Title",
            "author": "Anonymous",
            "priceCents": 1000
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    let created_body: Value = created.json().await.unwrap();
    let book_id = created_body["id"].as_str().unwrap().to_string();

    let updated = client
        .put(&format!("{}/books/{}", &app.address, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "Final Title",
            "author": "Known Author",
            "priceCents": 1500
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, updated.status().as_u16());

    let fetched = client
        .get(&format!("{}/books/{}", &app.address, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to execute request.");
    let fetched_body: Value = fetched.json().await.unwrap();
    assert_eq!(fetched_body["title"], "Final Title");

    let deleted = client
        .delete(&format!("{}/books/{}", &app.address, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, deleted.status().as_u16());

    let gone = client
        .get(&format!("{}/books/{}", &app.address, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, gone.status().as_u16());
}

#[tokio::test]
async fn book_validation_rejects_bad_input() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, &client, "admin@example.com", true).await;

    let cases = vec![
        (json!({ "title": "", "author": "A", "priceCents": 100 }), "empty title"),
        (json!({ "title": "T", "author": "  ", "priceCents": 100 }), "blank author"),
        (json!({ "title": "T", "author": "A", "priceCents": -1 }), "negative price"),
    ];

    for (body, reason) in cases {
        let response = client
            .post(&format!("{}/books", &app.address))
            .header("Authorization", format!("Bearer {}", admin_token))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
    }
}
