//! End-to-end runs against a mock API and image host.

use reqwest::Client;
use serde_json::json;
use tempfile::TempDir;
use unsplash_dl::error::AppError;
use unsplash_dl::models::{ListingQuery, Order, Source};
use unsplash_dl::pipeline::{RunOptions, run_download};
use unsplash_dl::services::PhotoClient;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve `pages` of photo ids on `/users/jdoe/photos` plus one image per id.
async fn mount_user(server: &MockServer, pages: &[&[&str]]) {
    for (i, ids) in pages.iter().enumerate() {
        let number = i + 1;
        let body: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "width": 6000,
                    "height": 4000,
                    "user": { "username": "jdoe" },
                    "links": { "download": format!("{}/img/{id}", server.uri()) }
                })
            })
            .collect();

        let mut template = ResponseTemplate::new(200).set_body_json(body);
        if number < pages.len() {
            template = template.insert_header(
                "Link",
                format!(
                    "<{}/users/jdoe/photos?page={}>; rel=\"last\", <{}/users/jdoe/photos?page={}>; rel=\"next\"",
                    server.uri(),
                    pages.len(),
                    server.uri(),
                    number + 1
                ),
            );
        }
        let mock = Mock::given(method("GET")).and(path("/users/jdoe/photos"));
        let mock = if number == 1 {
            mock.and(query_param("order_by", "latest"))
        } else {
            mock.and(query_param("page", number.to_string()))
        };
        mock.respond_with(template).mount(server).await;

        for id in ids.iter() {
            Mock::given(method("GET"))
                .and(path(format!("/img/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!("image {id}")))
                .mount(server)
                .await;
        }
    }
}

fn photo_client(server: &MockServer) -> PhotoClient {
    PhotoClient::new(Client::new(), Url::parse(&server.uri()).unwrap())
}

fn options(dir: &TempDir, parallel: usize, limit: i64) -> RunOptions {
    RunOptions {
        query: ListingQuery::new(Source::User("jdoe".into()), Order::Latest),
        target_dir: dir.path().join("photos"),
        parallel,
        limit,
    }
}

fn saved_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path().join("photos"))
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn downloads_every_listed_photo() {
    let server = MockServer::start().await;
    mount_user(&server, &[&["a", "b", "c"], &["d", "e"], &["f"]]).await;
    let dir = TempDir::new().unwrap();

    let result = run_download(photo_client(&server), Client::new(), options(&dir, 3, -1)).await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.count, 6);
    assert_eq!(result.listed, 6);
    assert_eq!(
        saved_files(&dir),
        vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"]
    );
    let body = std::fs::read_to_string(dir.path().join("photos/e.jpg")).unwrap();
    assert_eq!(body, "image e");
}

#[tokio::test]
async fn limit_caps_listing_and_downloads() {
    let server = MockServer::start().await;
    mount_user(&server, &[&["a", "b", "c"], &["d", "e", "f"], &["g"]]).await;
    let dir = TempDir::new().unwrap();

    let result = run_download(photo_client(&server), Client::new(), options(&dir, 2, 4)).await;

    assert!(result.is_success());
    assert_eq!(result.count, 4);
    assert_eq!(result.listed, 4);
    assert_eq!(saved_files(&dir), vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);

    let page_three_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.query() == Some("page=3"))
        .count();
    assert_eq!(page_three_requests, 0);
}

#[tokio::test]
async fn zero_limit_downloads_nothing() {
    let server = MockServer::start().await;
    mount_user(&server, &[&["a", "b"]]).await;
    let dir = TempDir::new().unwrap();

    let result = run_download(photo_client(&server), Client::new(), options(&dir, 4, 0)).await;

    assert!(result.is_success());
    assert_eq!(result.count, 0);
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn empty_listing_is_a_successful_run() {
    let server = MockServer::start().await;
    mount_user(&server, &[&[]]).await;
    let dir = TempDir::new().unwrap();

    let result = run_download(photo_client(&server), Client::new(), options(&dir, 4, -1)).await;

    assert!(result.is_success());
    assert_eq!(result.into_result().unwrap(), 0);
}

#[tokio::test]
async fn listing_failure_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(path("/users/jdoe/photos"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "errors": ["OAuth error: invalid token"] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let err = run_download(photo_client(&server), Client::new(), options(&dir, 4, -1))
        .await
        .into_result()
        .unwrap_err();

    match err {
        AppError::Api { status, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(message, "OAuth error: invalid token");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn download_failure_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(path("/img/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_user(&server, &[&["broken"]]).await;
    let dir = TempDir::new().unwrap();

    let result = run_download(photo_client(&server), Client::new(), options(&dir, 1, -1)).await;

    assert_eq!(result.count, 0);
    assert_eq!(result.listed, 1);
    assert!(matches!(result.error, Some(AppError::Api { status: 500, .. })));
}
