use actix_web::{get, web, HttpRequest, HttpResponse};
use paytr::{Acknowledgment, CallbackNotification};

use crate::ledger::Claim;
use crate::metrics;
use crate::state::AppState;

/// Mount the notification endpoint. Any method reaches a handler so that
/// non-POST probes get the empty reply instead of a 404/405.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/paytr/callback")
            .route(web::post().to(callback))
            .default_service(web::to(ignored)),
    );
}

fn reply(ack: Acknowledgment) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(ack.as_str())
}

async fn ignored(req: HttpRequest) -> HttpResponse {
    tracing::debug!(method = %req.method(), "non-POST request to callback endpoint");
    metrics::CALLBACKS.with_label_values(&["ignored"]).inc();
    reply(Acknowledgment::Ignored)
}

/// Payment notification from PayTR.
///
/// Authenticate, claim the order in the ledger, then run the business
/// handler. `OK` is only sent once the handler has succeeded or the order
/// is recorded as processed. A delivery that arrives while another one is
/// still running gets a 500 so the vendor tries again later.
pub async fn callback(
    state: web::Data<AppState>,
    form: Result<web::Form<CallbackNotification>, actix_web::Error>,
) -> HttpResponse {
    let notification = match form {
        Ok(form) => form.into_inner(),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable payment notification");
            metrics::CALLBACKS.with_label_values(&["bad_hash"]).inc();
            return reply(Acknowledgment::BadHash);
        }
    };

    match state.verifier.acknowledge(true, Some(&notification)) {
        Acknowledgment::Ok => {}
        other => {
            tracing::warn!(
                merchant_oid = %notification.merchant_oid,
                status = %notification.status,
                "payment notification hash mismatch"
            );
            metrics::CALLBACKS.with_label_values(&["bad_hash"]).inc();
            return reply(other);
        }
    }

    let oid = notification.merchant_oid.as_str();

    match state.ledger.try_claim(oid) {
        Ok(Claim::Acquired) => {}
        Ok(Claim::Processed) => {
            tracing::info!(merchant_oid = %oid, "duplicate payment notification acknowledged");
            metrics::CALLBACKS.with_label_values(&["duplicate"]).inc();
            return reply(Acknowledgment::Ok);
        }
        Ok(Claim::InProgress) => {
            // Not OK yet: the running attempt may still fail.
            tracing::info!(merchant_oid = %oid, "payment notification already being processed");
            metrics::CALLBACKS.with_label_values(&["in_progress"]).inc();
            return HttpResponse::InternalServerError().finish();
        }
        Err(e) => {
            tracing::error!(merchant_oid = %oid, error = %e, "ledger claim failed");
            metrics::CALLBACKS.with_label_values(&["ledger_error"]).inc();
            return HttpResponse::InternalServerError().finish();
        }
    }

    let result = if notification.is_success() {
        state.handler.on_success(&notification).await
    } else {
        state.handler.on_failure(&notification).await
    };

    if let Err(e) = result {
        state.ledger.release(oid);
        metrics::CALLBACKS.with_label_values(&["handler_error"]).inc();
        tracing::error!(
            merchant_oid = %oid,
            error = %e,
            "payment handler failed; awaiting redelivery"
        );
        return HttpResponse::InternalServerError().finish();
    }

    // The event is applied; acknowledge even if recording that fails.
    if let Err(e) = state.ledger.complete(oid) {
        tracing::error!(
            merchant_oid = %oid,
            error = %e,
            "failed to mark notification processed"
        );
    }

    let status = if notification.is_success() {
        "success"
    } else {
        "failed"
    };
    metrics::PAYMENT_EVENTS.with_label_values(&[status]).inc();
    metrics::CALLBACKS.with_label_values(&["ok"]).inc();
    tracing::info!(
        merchant_oid = %oid,
        status = %notification.status,
        "payment notification processed"
    );
    reply(Acknowledgment::Ok)
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "paytr-callback",
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| paytr::security::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            if !state.public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or PAYTR_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
