//! Order payload parsing
//!
//! Normalizes the partner's raw order documents into domain [`Order`]s.
//! Certification requires the scheduled time for SCHEDULED orders and
//! the pickup time for TAKEOUT orders to survive parsing; the order
//! total is recomputed from item totals rather than trusted.

use chrono::{DateTime, Utc};
use prato_domain::{
    Address, Coupon, Customer, Order, OrderItem, OrderMetadata, OrderTiming, OrderType, Payment,
    PaymentMethod, PratoError, Result,
};
use prato_domain::types::order::Coordinates;
use serde_json::Value;

use super::CONNECTOR;

/// Parse one raw order document.
pub fn parse_order(raw: &Value) -> Result<Order> {
    let id = require_str(raw, "id")?;
    let status = require_str(raw, "status")?;
    let created_at = require_datetime(raw, "createdAt")?;

    let order_type = match raw.get("type").and_then(Value::as_str) {
        Some("TAKEOUT") => OrderType::Takeout,
        _ => OrderType::Delivery,
    };
    let timing = match raw.get("timing").and_then(Value::as_str) {
        Some("SCHEDULED") => OrderTiming::Scheduled,
        _ => OrderTiming::Immediate,
    };

    let scheduled_at = if timing == OrderTiming::Scheduled {
        Some(require_datetime(raw, "scheduledDateTime").map_err(|_| {
            PratoError::InvalidInput(format!("scheduled order {id} missing scheduledDateTime"))
        })?)
    } else {
        None
    };

    let pickup_time = if order_type == OrderType::Takeout {
        optional_datetime(raw, "pickupDateTime")
    } else {
        None
    };

    let customer = parse_customer(raw.get("customer"));
    let delivery_address = raw.get("deliveryAddress").map(parse_address);

    let mut items = Vec::new();
    for item_raw in raw.get("items").and_then(Value::as_array).into_iter().flatten() {
        items.push(parse_item(item_raw)?);
    }
    let total: f64 = items.iter().map(|i| i.total_price).sum();

    let mut payments = Vec::new();
    for payment_raw in raw.get("payments").and_then(Value::as_array).into_iter().flatten() {
        payments.push(parse_payment(payment_raw)?);
    }

    let coupons = raw
        .get("coupons")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|c| Coupon {
            code: optional_str(c, "code"),
            discount: c.get("discount").and_then(Value::as_f64),
            sponsor: optional_str(c, "sponsor"),
        })
        .collect();

    Ok(Order {
        id,
        status,
        total,
        customer: customer.name.clone(),
        items,
        created_at,
        connector: CONNECTOR.to_string(),
        metadata: OrderMetadata {
            order_type,
            timing,
            scheduled_at,
            pickup_time,
            customer,
            delivery_address,
            delivery_observations: optional_str(raw, "deliveryObservations"),
            pickup_code: optional_str(raw, "pickupCode"),
            payments,
            coupons,
        },
    })
}

fn parse_customer(raw: Option<&Value>) -> Customer {
    let raw = raw.unwrap_or(&Value::Null);
    Customer {
        id: optional_str(raw, "id").unwrap_or_default(),
        name: optional_str(raw, "name").unwrap_or_else(|| "Cliente".to_string()),
        phone: optional_str(raw, "phone"),
        document: optional_str(raw, "document"),
        document_type: optional_str(raw, "documentType"),
    }
}

fn parse_address(raw: &Value) -> Address {
    let coordinates = raw.get("coordinates").and_then(|c| {
        Some(Coordinates {
            latitude: c.get("latitude")?.as_f64()?,
            longitude: c.get("longitude")?.as_f64()?,
        })
    });
    Address {
        street: optional_str(raw, "street").unwrap_or_default(),
        number: optional_str(raw, "number").unwrap_or_default(),
        complement: optional_str(raw, "complement"),
        neighborhood: optional_str(raw, "neighborhood").unwrap_or_default(),
        city: optional_str(raw, "city").unwrap_or_default(),
        state: optional_str(raw, "state").unwrap_or_default(),
        postal_code: optional_str(raw, "postalCode").unwrap_or_default(),
        coordinates,
    }
}

fn parse_item(raw: &Value) -> Result<OrderItem> {
    Ok(OrderItem {
        id: require_str(raw, "id")?,
        name: require_str(raw, "name")?,
        quantity: raw
            .get("quantity")
            .and_then(Value::as_i64)
            .ok_or_else(|| PratoError::InvalidInput("item missing quantity".to_string()))?,
        unit_price: require_f64(raw, "unitPrice")?,
        total_price: require_f64(raw, "totalPrice")?,
        observations: optional_str(raw, "observations"),
        options: raw
            .get("options")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Parse one payment entry, picking up the method-specific fields.
pub fn parse_payment(raw: &Value) -> Result<Payment> {
    let method = PaymentMethod::from_wire(&require_str(raw, "method")?);
    let value = require_f64(raw, "value")?;
    let currency = optional_str(raw, "currency").unwrap_or_else(|| "BRL".to_string());

    let mut payment = Payment::generic(method, value, currency);
    match &payment.method {
        m if m.is_card() => {
            payment.brand = optional_str(raw, "brand");
            payment.authorization_code = optional_str(raw, "authorizationCode");
            payment.intermediator_cnpj = optional_str(raw, "intermediatorCnpj");
        }
        PaymentMethod::Cash => {
            payment.change_for = raw.get("changeFor").and_then(Value::as_f64);
        }
        PaymentMethod::Voucher => {
            payment.voucher_type = optional_str(raw, "voucherType");
        }
        _ => {}
    }
    Ok(payment)
}

fn optional_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn require_str(raw: &Value, key: &str) -> Result<String> {
    optional_str(raw, key)
        .ok_or_else(|| PratoError::InvalidInput(format!("order payload missing field: {key}")))
}

fn require_f64(raw: &Value, key: &str) -> Result<f64> {
    raw.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| PratoError::InvalidInput(format!("order payload missing field: {key}")))
}

fn optional_datetime(raw: &Value, key: &str) -> Option<DateTime<Utc>> {
    raw.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn require_datetime(raw: &Value, key: &str) -> Result<DateTime<Utc>> {
    optional_datetime(raw, key)
        .ok_or_else(|| PratoError::InvalidInput(format!("order payload missing field: {key}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base_order() -> Value {
        json!({
            "id": "order-1",
            "status": "PLACED",
            "createdAt": "2026-08-26T12:00:00Z",
            "type": "DELIVERY",
            "timing": "IMMEDIATE",
            "customer": {
                "id": "c-1",
                "name": "Ana",
                "phone": "+55 11 99999-0000",
                "document": "12345678900",
                "documentType": "CPF"
            },
            "deliveryAddress": {
                "street": "Rua Azul",
                "number": "42",
                "neighborhood": "Centro",
                "city": "São Paulo",
                "state": "SP",
                "postalCode": "01000-000",
                "coordinates": {"latitude": -23.55, "longitude": -46.63}
            },
            "items": [
                {"id": "i-1", "name": "Marmita", "quantity": 2, "unitPrice": 25.0, "totalPrice": 50.0},
                {"id": "i-2", "name": "Suco", "quantity": 1, "unitPrice": 8.5, "totalPrice": 8.5,
                 "observations": "sem açúcar"}
            ],
            "payments": [
                {"method": "PIX", "value": 58.5}
            ]
        })
    }

    #[test]
    fn parses_immediate_delivery_order() {
        let order = parse_order(&base_order()).expect("order");
        assert_eq!(order.id, "order-1");
        assert_eq!(order.customer, "Ana");
        assert_eq!(order.total, 58.5);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.metadata.order_type, OrderType::Delivery);
        assert_eq!(order.metadata.timing, OrderTiming::Immediate);
        assert!(order.metadata.scheduled_at.is_none());
        let address = order.metadata.delivery_address.expect("address");
        assert_eq!(address.city, "São Paulo");
        assert!(address.coordinates.is_some());
    }

    #[test]
    fn total_is_recomputed_from_items() {
        let mut raw = base_order();
        raw["total"] = json!(999.99);
        let order = parse_order(&raw).expect("order");
        assert_eq!(order.total, 58.5);
    }

    #[test]
    fn scheduled_order_requires_scheduled_datetime() {
        let mut raw = base_order();
        raw["timing"] = json!("SCHEDULED");
        assert!(matches!(parse_order(&raw), Err(PratoError::InvalidInput(_))));

        raw["scheduledDateTime"] = json!("2026-08-27T19:30:00Z");
        let order = parse_order(&raw).expect("order");
        assert_eq!(order.metadata.timing, OrderTiming::Scheduled);
        assert!(order.metadata.scheduled_at.is_some());
    }

    #[test]
    fn takeout_order_carries_pickup_details() {
        let mut raw = base_order();
        raw["type"] = json!("TAKEOUT");
        raw["pickupDateTime"] = json!("2026-08-26T13:00:00Z");
        raw["pickupCode"] = json!("4821");

        let order = parse_order(&raw).expect("order");
        assert_eq!(order.metadata.order_type, OrderType::Takeout);
        assert!(order.metadata.pickup_time.is_some());
        assert_eq!(order.metadata.pickup_code.as_deref(), Some("4821"));
    }

    #[test]
    fn card_payment_keeps_brand_and_authorization() {
        let raw = json!({
            "method": "CREDIT_CARD",
            "value": 58.5,
            "brand": "Visa",
            "authorizationCode": "A1B2",
            "intermediatorCnpj": "00000000000191",
            "changeFor": 100.0
        });
        let payment = parse_payment(&raw).expect("payment");
        assert_eq!(payment.method, PaymentMethod::CreditCard);
        assert_eq!(payment.brand.as_deref(), Some("Visa"));
        assert_eq!(payment.authorization_code.as_deref(), Some("A1B2"));
        assert_eq!(payment.intermediator_cnpj.as_deref(), Some("00000000000191"));
        // Cash-only field is not picked up for cards.
        assert!(payment.change_for.is_none());
    }

    #[test]
    fn cash_payment_keeps_change_amount() {
        let raw = json!({"method": "CASH", "value": 58.5, "changeFor": 100.0});
        let payment = parse_payment(&raw).expect("payment");
        assert_eq!(payment.method, PaymentMethod::Cash);
        assert_eq!(payment.change_for, Some(100.0));
    }

    #[test]
    fn voucher_payment_keeps_voucher_type() {
        let raw = json!({"method": "VOUCHER", "value": 30.0, "voucherType": "MEAL"});
        let payment = parse_payment(&raw).expect("payment");
        assert_eq!(payment.voucher_type.as_deref(), Some("MEAL"));
    }

    #[test]
    fn unknown_payment_method_is_preserved() {
        let raw = json!({"method": "CRYPTO", "value": 10.0});
        let payment = parse_payment(&raw).expect("payment");
        assert_eq!(payment.method, PaymentMethod::Other("CRYPTO".to_string()));
    }

    #[test]
    fn coupon_sponsor_is_preserved_verbatim() {
        let mut raw = base_order();
        raw["coupons"] = json!([
            {"code": "PROMO10", "discount": 10.0, "sponsor": "iFood"}
        ]);
        let order = parse_order(&raw).expect("order");
        assert_eq!(order.metadata.coupons.len(), 1);
        assert_eq!(order.metadata.coupons[0].sponsor.as_deref(), Some("iFood"));
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut raw = base_order();
        raw.as_object_mut().expect("object").remove("id");
        assert!(matches!(parse_order(&raw), Err(PratoError::InvalidInput(_))));
    }

    #[test]
    fn missing_customer_falls_back_to_default_name() {
        let mut raw = base_order();
        raw.as_object_mut().expect("object").remove("customer");
        let order = parse_order(&raw).expect("order");
        assert_eq!(order.customer, "Cliente");
    }
}
