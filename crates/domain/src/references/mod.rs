use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::vocabulary::{closed_vocabulary, PaymentProvider};

/// Best-effort hydration of an order's relations
pub mod resolver;

pub use resolver::{LoadConfig, ReferenceResolver};

closed_vocabulary! {
    /// Foreign relations an order or a prescription points at.
    pub enum Relation as "relation" {
        Address => "deliveryAddress",
        Payment => "paymentInfo",
        OriginPharmacy => "originPharmacy",
        PartnerPharmacy => "partnerPharmacy",
        CurrentOrder => "currentOrder",
        Insurance => "insurance",
    }
}

impl Relation {
    /// Relations held by an order.
    pub const ORDER: &'static [Relation] = &[
        Relation::Address,
        Relation::Payment,
        Relation::OriginPharmacy,
        Relation::PartnerPharmacy,
    ];

    pub fn is_order_relation(&self) -> bool {
        Self::ORDER.contains(self)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    #[serde(default)]
    pub street1: String,
    #[serde(default)]
    pub street2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub zip_code_addon: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub patient_id: String,
}

/// Stored payment method. Card secrets never leave the payment provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub card_name: String,
    #[serde(default, rename = "last4Digit")]
    pub last4_digit: String,
    #[serde(default)]
    pub expiry_month: u32,
    #[serde(default)]
    pub expiry_year: u32,
    #[serde(default)]
    pub payment_token: String,
    #[serde(default, rename = "providerCustomerID")]
    pub provider_customer_id: String,
    #[serde(default)]
    pub provider: Option<PaymentProvider>,
    #[serde(default)]
    pub fsa_hsa_card: bool,
    #[serde(default)]
    pub test_card: bool,
    #[serde(default)]
    pub patient_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub fax_number: String,
    #[serde(default)]
    pub store_number: String,
    #[serde(default)]
    pub street1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub npi: String,
    #[serde(default)]
    pub partner: bool,
    #[serde(default)]
    pub inactive_partner: bool,
}

/// Lookup-by-identifier port over the document store.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn find_address(&self, id: &str) -> Result<Address, StoreError>;

    async fn find_payment(&self, id: &str) -> Result<Payment, StoreError>;

    async fn find_pharmacy(&self, id: &str) -> Result<Pharmacy, StoreError>;
}
