//! Delivery receipt handler
//!
//! The carrier posts delivery receipts as small XML documents. The receipt
//! names a message sid and its new status; an unknown sid is a 404 so the
//! carrier's retry machinery redelivers once the message lands.

use crate::dto::{ApiResponse, MessageResponse};
use actix_web::{
    web::{self, Data},
    HttpResponse,
};
use chibi_carrier::xml;
use chibi_core::error::AppError;
use chibi_core::models::message;
use chibi_core::traits::MessageRepository;
use chibi_db::repositories::PgMessageRepository;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

/// Statuses a receipt may carry
const ACCEPTED_STATUSES: &[&str] = &[
    message::status::SENT,
    message::status::DELIVERED,
    message::status::FAILED,
];

/// Parsed receipt fields
#[derive(Debug)]
struct Receipt {
    sid: String,
    status: String,
}

fn parse_receipt(payload: &str) -> Result<Receipt, AppError> {
    let document = xml::parse(payload)?;
    let receipt = document
        .get("receipt")
        .ok_or_else(|| AppError::MissingField("receipt".to_string()))?;

    let sid = receipt
        .text_of("sid")
        .ok_or_else(|| AppError::MissingField("sid".to_string()))?
        .to_string();
    let status = receipt
        .text_of("status")
        .ok_or_else(|| AppError::MissingField("status".to_string()))?
        .to_string();

    if !ACCEPTED_STATUSES.contains(&status.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Unknown receipt status: {}",
            status
        )));
    }

    Ok(Receipt { sid, status })
}

/// Apply a delivery receipt to its message
///
/// POST /api/v1/delivery-receipts
#[instrument(skip(pool, payload))]
pub async fn apply_receipt(
    pool: Data<PgPool>,
    payload: String,
) -> Result<HttpResponse, AppError> {
    let receipt = parse_receipt(&payload)?;

    let repo = PgMessageRepository::new(pool.get_ref().clone());
    let updated = repo
        .update_status(&receipt.sid, &receipt.status)
        .await?
        .ok_or_else(|| {
            warn!("Receipt for unknown message sid {}", receipt.sid);
            AppError::MessageNotFound(receipt.sid.clone())
        })?;

    info!("Message {} is now {}", updated.sid, updated.status);
    Ok(HttpResponse::Ok().json(ApiResponse::success(MessageResponse::from(updated))))
}

/// Configure delivery receipt routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/delivery-receipts").route(web::post().to(apply_receipt)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_receipt_from_attributes() {
        let receipt = parse_receipt(r#"<receipt sid="SM1" status="delivered"/>"#).unwrap();
        assert_eq!(receipt.sid, "SM1");
        assert_eq!(receipt.status, "delivered");
    }

    #[test]
    fn test_parse_receipt_from_elements() {
        let receipt = parse_receipt(
            "<receipt><sid>SM2</sid><status>failed</status></receipt>",
        )
        .unwrap();
        assert_eq!(receipt.sid, "SM2");
        assert_eq!(receipt.status, "failed");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = parse_receipt(r#"<receipt sid="SM1" status="teleported"/>"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_sid_rejected() {
        let err = parse_receipt(r#"<receipt status="delivered"/>"#).unwrap_err();
        assert!(matches!(err, AppError::MissingField(_)));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let err = parse_receipt("<receipt sid=").unwrap_err();
        assert!(matches!(err, AppError::XmlParse(_)));
    }
}
