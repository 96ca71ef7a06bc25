//! End-to-end catalogue behaviour through the session surface.

mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use backend::domain::ports::CatalogueRepository;
use rstest::rstest;
use serde_json::{Value, json};

use support::{Harness, login, titles};

fn book(title: &str, author: &str, year: i32) -> Value {
    json!({ "title": title, "author": author, "publicationYear": year })
}

#[rstest]
#[actix_web::test]
async fn author_query_returns_only_that_authors_books() {
    let harness = Harness::provisioned().await;
    harness.superuser("curator").await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "curator").await;

    for payload in [
        book("1984", "George Orwell", 1949),
        book("Brave New World", "Aldous Huxley", 1932),
    ] {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/books")
                .cookie(cookie.clone())
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/books?author=George%20Orwell")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(titles(&body), vec!["1984"]);
}

#[rstest]
#[actix_web::test]
async fn viewers_can_list_but_not_create() {
    let harness = Harness::provisioned().await;
    harness.member("reader", Some("Viewers")).await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "reader").await;

    let list = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/books")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(list.status(), StatusCode::OK);

    let create = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie)
            .set_json(book("Animal Farm", "George Orwell", 1945))
            .to_request(),
    )
    .await;
    assert_eq!(create.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(create).await;
    assert_eq!(body["code"], "forbidden");
}

#[rstest]
#[actix_web::test]
async fn editors_cannot_delete_and_the_book_survives() {
    let harness = Harness::provisioned().await;
    harness.member("editor", Some("Editors")).await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "editor").await;

    let created: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie.clone())
            .set_json(book("Homage to Catalonia", "George Orwell", 1938))
            .to_request(),
    )
    .await;
    let id = created["id"].as_i64().expect("book id");
    let before = harness.store.count_books().await.expect("count");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.store.count_books().await.expect("count"), before);
}

#[rstest]
#[actix_web::test]
async fn admins_group_members_can_delete() {
    let harness = Harness::provisioned().await;
    harness.member("head", Some("Admins")).await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "head").await;

    let created: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie.clone())
            .set_json(book("Burmese Days", "George Orwell", 1934))
            .to_request(),
    )
    .await;
    let id = created["id"].as_i64().expect("book id");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(harness.store.count_books().await.expect("count"), 0);
}

#[rstest]
#[case(999, StatusCode::BAD_REQUEST)]
#[case(1000, StatusCode::CREATED)]
#[actix_web::test]
async fn publication_year_floor_is_enforced(#[case] year: i32, #[case] expected: StatusCode) {
    let harness = Harness::provisioned().await;
    harness.superuser("curator").await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "curator").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie)
            .set_json(book("Beowulf", "Unknown", year))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), expected);
}

#[rstest]
#[case::viewer(Some("reader"), StatusCode::FORBIDDEN)]
#[case::anonymous(None, StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn malformed_creates_are_gated_before_parsing(
    #[case] caller: Option<&str>,
    #[case] expected: StatusCode,
) {
    let harness = Harness::provisioned().await;
    harness.member("reader", Some("Viewers")).await;
    let app = actix_test::init_service(harness.app()).await;
    let mut request = actix_test::TestRequest::post()
        .uri("/api/v1/books")
        .set_json(json!({ "title": 5 }));
    if let Some(username) = caller {
        request = request.cookie(login(&app, username).await);
    }

    let res = actix_test::call_service(&app, request.to_request()).await;

    assert_eq!(res.status(), expected);
    assert_eq!(harness.store.count_books().await.expect("count"), 0);
}

#[rstest]
#[actix_web::test]
async fn malformed_creates_from_editors_are_400() {
    let harness = Harness::provisioned().await;
    harness.member("editor", Some("Editors")).await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "editor").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie)
            .set_json(json!({ "title": 5 }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn anonymous_catalogue_reads_need_a_login() {
    let harness = Harness::provisioned().await;
    let app = actix_test::init_service(harness.app()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/books").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn libraries_hold_books_and_a_single_librarian() {
    let harness = Harness::provisioned().await;
    harness.superuser("curator").await;
    let app = actix_test::init_service(harness.app()).await;
    let cookie = login(&app, "curator").await;

    let created_book: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie.clone())
            .set_json(book("1984", "George Orwell", 1949))
            .to_request(),
    )
    .await;
    let library: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/libraries")
            .cookie(cookie.clone())
            .set_json(json!({ "name": "Central" }))
            .to_request(),
    )
    .await;
    let library_id = library["id"].as_i64().expect("library id");

    let detail: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/libraries/{library_id}/books"))
            .cookie(cookie.clone())
            .set_json(json!({ "bookId": created_book["id"] }))
            .to_request(),
    )
    .await;
    assert_eq!(titles(&detail["books"]), vec!["1984"]);

    let first = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/libraries/{library_id}/librarian"))
            .cookie(cookie.clone())
            .set_json(json!({ "name": "Ada" }))
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/libraries/{library_id}/librarian"))
            .cookie(cookie)
            .set_json(json!({ "name": "Grace" }))
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}
