use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, StoreError};

const LENGTH: usize = 14;
const HYPHENS: [usize; 2] = [4, 9];

/// Human-readable order identifier, `dddd-dddd-dddd`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let well_formed = value.len() == LENGTH
            && value.bytes().enumerate().all(|(i, byte)| {
                if HYPHENS.contains(&i) {
                    byte == b'-'
                } else {
                    byte.is_ascii_digit()
                }
            });

        if !well_formed {
            return Err(Error::Validation {
                message: format!("order number {value:?} is not of the form dddd-dddd-dddd"),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let value = (0..LENGTH)
            .map(|i| {
                if HYPHENS.contains(&i) {
                    '-'
                } else {
                    char::from(b'0' + rng.gen_range(0..10u8))
                }
            })
            .collect();
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

/// Answers whether an order number is already taken.
#[async_trait]
pub trait OrderNumberLookup: Send + Sync {
    async fn is_taken(&self, number: &OrderNumber) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: OrderNumberLookup + ?Sized> OrderNumberLookup for Arc<T> {
    async fn is_taken(&self, number: &OrderNumber) -> Result<bool, StoreError> {
        (**self).is_taken(number).await
    }
}

/// Records an order number once an order owns it. Registering a number twice
/// fails with [`StoreError::AlreadyExists`].
#[async_trait]
pub trait OrderNumberRegistry: Send + Sync {
    async fn register(&self, number: &OrderNumber, order_id: &str) -> Result<(), StoreError>;
}

/// Draws random order numbers until one is unused.
pub struct OrderNumberGenerator<L> {
    lookup: L,
}

impl<L: OrderNumberLookup> OrderNumberGenerator<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub async fn generate(&self) -> Result<OrderNumber, StoreError> {
        self.generate_with(&mut StdRng::from_entropy()).await
    }

    pub async fn generate_with<R: Rng + Send>(
        &self,
        rng: &mut R,
    ) -> Result<OrderNumber, StoreError> {
        loop {
            let candidate = OrderNumber::random(rng);
            if !self.lookup.is_taken(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!("Order number {} already taken, retrying", candidate);
        }
    }
}
