//! Response headers applied across the whole application.

mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use backend::domain::TRACE_ID_HEADER;
use backend::middleware::security_headers::CONTENT_SECURITY_POLICY_VALUE;
use rstest::rstest;

use support::Harness;

fn header<'a>(res: &'a actix_web::dev::ServiceResponse, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|value| value.to_str().ok())
}

#[rstest]
#[case("/health/ready", StatusCode::OK)]
#[case("/api/v1/books", StatusCode::UNAUTHORIZED)]
#[case("/api/books_all/", StatusCode::UNAUTHORIZED)]
#[case("/nowhere", StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn every_response_carries_the_security_headers(
    #[case] path: &str,
    #[case] status: StatusCode,
) {
    let harness = Harness::provisioned().await;
    let app = actix_test::init_service(harness.app()).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(path).to_request()).await;

    assert_eq!(res.status(), status);
    assert_eq!(
        header(&res, "content-security-policy"),
        Some(CONTENT_SECURITY_POLICY_VALUE)
    );
    assert_eq!(header(&res, "x-content-type-options"), Some("nosniff"));
    assert_eq!(header(&res, "x-frame-options"), Some("DENY"));
    assert_eq!(header(&res, "x-xss-protection"), Some("1; mode=block"));
    assert!(header(&res, TRACE_ID_HEADER).is_some());
}

#[rstest]
fn policy_forbids_framing_and_foreign_sources() {
    assert!(CONTENT_SECURITY_POLICY_VALUE.contains("default-src 'self';"));
    assert!(CONTENT_SECURITY_POLICY_VALUE.contains("img-src 'self' data:;"));
    assert!(CONTENT_SECURITY_POLICY_VALUE.ends_with("frame-ancestors 'none';"));
}
