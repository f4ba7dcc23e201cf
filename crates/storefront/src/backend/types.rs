//! Wire types for backend requests and responses.

use serde::{Deserialize, Serialize};

use hfc_core::menu::Pricing;
use hfc_core::{CartLine, ItemId, UserId, UserRole};

/// A cart line as submitted to the order-creation endpoint.
///
/// The full line (id, name, quantity, captured price tier) is sent, not just
/// totals: the backend recomputes the amount and validates availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    #[serde(rename = "_id")]
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub pricing: Vec<Pricing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&CartLine> for CheckoutLine {
    fn from(line: &CartLine) -> Self {
        Self {
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            pricing: vec![line.pricing()],
            image_url: line.image_url.clone(),
        }
    }
}

/// Response of `POST /payments/initiate-payment`.
///
/// Both fields are optional on the wire so a success response lacking the
/// redirect can be reported instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
}

/// Body of `POST /owner/sync-user`.
#[derive(Debug, Serialize)]
pub struct SyncUserRequest<'a> {
    pub token: &'a str,
}

/// The backend's user record for a signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub firebase_uid: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Body of `POST /chats/contact-owner`.
#[derive(Debug, Serialize)]
pub struct ContactOwnerRequest<'a> {
    pub message: &'a str,
}

/// Acknowledgement of a message sent to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOwnerReceipt {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checkout_line_shape() {
        let line = CartLine {
            item_id: ItemId::new("item-1"),
            name: "Dal Makhani".into(),
            unit_price: dec!(320),
            quantity: 2,
            size: Some("Full".into()),
            image_url: None,
        };
        let json = serde_json::to_value(CheckoutLine::from(&line)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "_id": "item-1",
                "name": "Dal Makhani",
                "quantity": 2,
                "pricing": [{"size": "Full", "price": 320.0}]
            })
        );
    }

    #[test]
    fn test_initiate_response_tolerates_missing_fields() {
        let response: InitiatePaymentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.redirect_url.is_none());

        let response: InitiatePaymentResponse =
            serde_json::from_str(r#"{"redirectUrl": "https://gateway/pay/xyz"}"#).unwrap();
        assert_eq!(response.redirect_url.as_deref(), Some("https://gateway/pay/xyz"));
    }

    #[test]
    fn test_backend_user_accepts_id_or_underscore_id() {
        let user: BackendUser = serde_json::from_str(
            r#"{"id": "u1", "firebase_uid": "fb1", "email": "a@b.in", "role": "customer"}"#,
        )
        .unwrap();
        assert_eq!(user.id.as_str(), "u1");

        let user: BackendUser =
            serde_json::from_str(r#"{"_id": "u2", "firebase_uid": "fb2", "email": "c@d.in"}"#)
                .unwrap();
        assert_eq!(user.role, UserRole::Customer);
    }
}
