//! Wire format types for payment contract reads.
//!
//! Orders come back from the contract as ABI values. These types give them a
//! stable JSON shape: addresses in EIP-55 checksum form, 256-bit integers as
//! decimal strings.

use alloy_primitives::{Address, U256, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An address that displays and serializes with EIP-55 checksum encoding.
///
/// ```
/// use hive_payment_eip155::chain::ChecksummedAddress;
///
/// let addr: ChecksummedAddress = "0x81897263ec51a2314d256703b2b9f57664b772a9".parse().unwrap();
/// assert_eq!(addr.to_string(), "0x81897263EC51A2314d256703b2B9f57664B772a9");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChecksummedAddress(pub Address);

impl FromStr for ChecksummedAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_str(s).map(Self)
    }
}

impl Display for ChecksummedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

/// Serde helpers for a [`U256`] written as a decimal string.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}

/// A payment order as recorded by the contract.
///
/// Also used for `OrderPay` events, which carry the same fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(with = "decimal_u256")]
    pub order_id: U256,
    pub payer: ChecksummedAddress,
    pub payee: ChecksummedAddress,
    /// Proof returned by the hive node when the order was placed.
    pub memo: String,
    /// Paid amount in wei.
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

/// Fee the platform takes from each payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFee {
    pub platform_address: ChecksummedAddress,
    #[serde(with = "decimal_u256")]
    pub platform_fee_rate: U256,
}
