//! Guest-safe projections.
//!
//! Read endpoints open to guests return these instead of the stored records.
//! An admin caller gets every field; a guest loses contact details, identity
//! numbers, the KPR price block and payment references.
//!
//! | Record  | Hidden from guests                 |
//! |---------|------------------------------------|
//! | Booking | `customer_phone`, `customer_email` |
//! | KPR     | `customer.nik`, `customer.address`, `price` |
//! | Payment | `reference`                        |

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::time::rfc3339;
use crate::types::{Booking, BookingStatus, KprApplication, KprPrice, KprStatus, Payment, PaymentType};

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BookingView {
    pub id: String,
    pub site_id: String,
    pub subsite_id: String,
    pub zone_id: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub price: Money,
    pub notes: String,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BookingView {
    pub fn new(b: &Booking, is_admin: bool) -> Self {
        BookingView {
            id: b.id.clone(),
            site_id: b.site_id.clone(),
            subsite_id: b.subsite_id.clone(),
            zone_id: b.zone_id.clone(),
            customer_name: b.customer_name.clone(),
            customer_phone: is_admin.then(|| b.customer_phone.clone()),
            customer_email: is_admin.then(|| b.customer_email.clone()),
            status: b.status,
            start_date: b.start_date,
            end_date: b.end_date,
            price: b.price,
            notes: b.notes.clone(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CustomerView {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nik: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct KprView {
    pub id: String,
    pub booking_id: String,
    pub site_id: String,
    pub subsite_id: String,
    pub zone_id: String,
    pub status: KprStatus,
    pub notes: String,
    pub customer: CustomerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<KprPrice>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CustomerView {
    pub fn new(kpr: &KprApplication, is_admin: bool) -> Self {
        let c = &kpr.customer;
        CustomerView {
            name: c.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
            nik: is_admin.then(|| c.nik.clone()),
            address: is_admin.then(|| c.address.clone()),
        }
    }
}

impl KprView {
    pub fn new(kpr: &KprApplication, is_admin: bool) -> Self {
        KprView {
            id: kpr.id.clone(),
            booking_id: kpr.booking_id.clone(),
            site_id: kpr.site_id.clone(),
            subsite_id: kpr.subsite_id.clone(),
            zone_id: kpr.zone_id.clone(),
            status: kpr.status,
            notes: kpr.notes.clone(),
            customer: CustomerView::new(kpr, is_admin),
            price: is_admin.then(|| kpr.price.clone()),
            created_at: kpr.created_at,
            updated_at: kpr.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PaymentView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub installment_no: u32,
    pub amount: Money,
    #[ts(as = "String")]
    pub paid_at: NaiveDate,
    pub method: String,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PaymentView {
    pub fn new(p: &Payment, is_admin: bool) -> Self {
        PaymentView {
            id: p.id.clone(),
            kind: p.kind,
            installment_no: p.installment_no,
            amount: p.amount,
            paid_at: p.paid_at,
            method: p.method.clone(),
            notes: p.notes.clone(),
            reference: (is_admin && !p.reference.is_empty()).then(|| p.reference.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KprCustomer;
    use chrono::TimeZone;

    fn kpr() -> KprApplication {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        KprApplication {
            id: "kpr_1".into(),
            booking_id: "bk_1".into(),
            site_id: "s".into(),
            subsite_id: "ss".into(),
            zone_id: "z".into(),
            customer: KprCustomer {
                name: "Budi".into(),
                phone: "0812".into(),
                email: "b@x.id".into(),
                nik: "3201".into(),
                address: "Jl. Mawar".into(),
            },
            price: KprPrice::default(),
            status: KprStatus::Draft,
            notes: String::new(),
            created_at: at,
            updated_at: at,
            approved_at: None,
        }
    }

    #[test]
    fn test_guest_kpr_hides_identity_and_price() {
        let guest = serde_json::to_value(KprView::new(&kpr(), false)).unwrap();
        assert_eq!(guest["customer"]["name"], "Budi");
        assert_eq!(guest["customer"]["phone"], "0812");
        assert!(guest["customer"].get("nik").is_none());
        assert!(guest["customer"].get("address").is_none());
        assert!(guest.get("price").is_none());

        let admin = serde_json::to_value(KprView::new(&kpr(), true)).unwrap();
        assert_eq!(admin["customer"]["nik"], "3201");
        assert!(admin.get("price").is_some());
    }

    #[test]
    fn test_guest_booking_hides_contact() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let b = Booking {
            id: "bk_1".into(),
            site_id: "s".into(),
            subsite_id: "ss".into(),
            zone_id: "z".into(),
            customer_name: "Ani".into(),
            customer_phone: "0813".into(),
            customer_email: "a@x.id".into(),
            status: BookingStatus::Pending,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            price: Money::zero(),
            notes: String::new(),
            created_at: at,
            updated_at: at,
        };
        let guest = serde_json::to_value(BookingView::new(&b, false)).unwrap();
        assert!(guest.get("customer_phone").is_none());
        assert!(guest.get("customer_email").is_none());
        assert_eq!(guest["start_date"], "2025-01-10");

        let admin = serde_json::to_value(BookingView::new(&b, true)).unwrap();
        assert_eq!(admin["customer_email"], "a@x.id");
    }
}
