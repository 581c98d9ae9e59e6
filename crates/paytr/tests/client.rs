//! Drives `PaytrClient` against a loopback server that behaves like the
//! vendor API: it recomputes nothing, but checks the pinned signatures and
//! answers with the documented response shapes.

use std::collections::HashMap;
use std::net::TcpListener;

use actix_web::{web, App, HttpResponse, HttpServer};

use paytr::{
    Endpoints, MerchantCredentials, OrderRequest, PaytrClient, PaytrError, RefundRequest,
};

const TOKEN_SIG: &str = "+gXbpwhRrwmIQH5xvUopm+2mHbUqtxKOZK6athRYi1E=";
const STATUS_SIG: &str = "W60CRQ9zkqfVOv8oYQM1wGoUKVCybLYXWWmJ3u5G9Kk=";
const REFUND_SIG: &str = "nNCgCjXWfPCdONV+6CJGgWqZX4MYcUjfgV04vev0XMA=";

const TOKEN_FAILED_BODY: &str = r#"{"status":"failed","reason":"paytr_token gecersiz"}"#;

type Form = web::Form<HashMap<String, String>>;

fn field<'a>(form: &'a Form, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or("")
}

async fn get_token(form: Form) -> HttpResponse {
    if form.contains_key("merchant_key") || form.contains_key("merchant_salt") {
        return HttpResponse::BadRequest().body("secrets must not be posted");
    }
    if field(&form, "paytr_token") == TOKEN_SIG {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "token": format!("tok-{}", field(&form, "merchant_oid")),
        }))
    } else {
        HttpResponse::Ok()
            .content_type("application/json")
            .body(TOKEN_FAILED_BODY)
    }
}

async fn status_query(form: Form) -> HttpResponse {
    if field(&form, "merchant_oid") == "ORD1" && field(&form, "paytr_token") == STATUS_SIG {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "payment_amount": "9.99",
            "payment_total": "9.99",
            "currency": "TL",
            "returns": [{"return_amount": "1.00", "return_date": "2024-05-01 12:00:00",
                         "return_type": "iade", "reference_no": "R1"}],
        }))
    } else {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "failed",
            "err_no": "9",
            "err_msg": "Not found",
        }))
    }
}

async fn refund(form: Form) -> HttpResponse {
    if field(&form, "merchant_oid") == "BROKEN" {
        return HttpResponse::InternalServerError().body("upstream exploded");
    }
    if field(&form, "paytr_token") != REFUND_SIG {
        return HttpResponse::Ok().json(serde_json::json!({
            "status": "error",
            "err_no": "002",
            "err_msg": "paytr_token gecersiz",
        }));
    }
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "is_test": "1",
        "merchant_oid": field(&form, "merchant_oid"),
        "return_amount": field(&form, "return_amount"),
    }))
}

fn spawn_vendor() -> Endpoints {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(|| {
        App::new()
            .route("/odeme/api/get-token", web::post().to(get_token))
            .route("/odeme/durum-sorgu", web::post().to(status_query))
            .route("/odeme/iade", web::post().to(refund))
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();
    actix_rt::spawn(server);

    Endpoints::new(format!("http://127.0.0.1:{port}"))
}

fn client(endpoints: Endpoints) -> PaytrClient {
    PaytrClient::new(MerchantCredentials::new(
        "M1",
        "test-merchant-key",
        "test-merchant-salt",
    ))
    .unwrap()
    .with_endpoints(endpoints)
}

fn order(amount: &str) -> OrderRequest {
    OrderRequest::builder("ORD1", "a@b.com", amount)
        .basket("W10=")
        .user_ip("1.2.3.4")
        .test_mode(true)
        .redirect_urls("https://shop.example/ok", "https://shop.example/fail")
        .build()
        .unwrap()
}

#[actix_rt::test]
async fn token_request_returns_iframe_token() {
    let endpoints = spawn_vendor();
    let client = client(endpoints.clone());

    let token = client.request_token(&order("999")).await.unwrap();
    assert_eq!(token.as_str(), "tok-ORD1");
    assert_eq!(
        token.iframe_url(client.endpoints()),
        format!("{}/odeme/guvenli/tok-ORD1", endpoints.base_url)
    );
}

#[actix_rt::test]
async fn token_rejection_carries_body_verbatim() {
    let client = client(spawn_vendor());

    match client.request_token(&order("1000")).await {
        Err(PaytrError::Rejected(body)) => assert_eq!(body, TOKEN_FAILED_BODY),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[actix_rt::test]
async fn status_query_returns_report() {
    let client = client(spawn_vendor());

    let report = client.query_status("ORD1").await.unwrap();
    assert_eq!(report.payment_amount, "9.99");
    assert_eq!(report.currency, "TL");
    assert_eq!(report.returns.len(), 1);
    assert_eq!(report.returns[0].reference_no, "R1");
}

#[actix_rt::test]
async fn status_query_surfaces_vendor_error() {
    let client = client(spawn_vendor());

    let err = client.query_status("ORD404").await.unwrap_err();
    assert_eq!(err.to_string(), "9 Not found");
}

#[actix_rt::test]
async fn refund_is_accepted() {
    let client = client(spawn_vendor());

    let receipt = client
        .refund(&RefundRequest::new("ORD1", "11.97").with_reference("REF1"))
        .await
        .unwrap();
    assert!(receipt.is_test());
    assert_eq!(receipt.merchant_oid, "ORD1");
    assert_eq!(receipt.return_amount, "11.97");
}

#[actix_rt::test]
async fn http_failure_is_not_retried_and_reports_status() {
    let client = client(spawn_vendor());

    match client.refund(&RefundRequest::new("BROKEN", "1.00")).await {
        Err(PaytrError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected HTTP failure, got {other:?}"),
    }
}

#[actix_rt::test]
async fn unreachable_host_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client(Endpoints::new(format!("http://127.0.0.1:{port}")));

    let err = client.query_status("ORD1").await.unwrap_err();
    assert!(matches!(err, PaytrError::Transport(_)));
}
