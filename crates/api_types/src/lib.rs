use serde::{Deserialize, Serialize};

/// Error body returned by the order service on non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod money {
    //! Money on the wire.
    //!
    //! The order service speaks decimal major units (`3.33`); everything on
    //! our side of the boundary is integer minor units. Use with
    //! `#[serde(with = "api_types::money::major_units")]` on `i64` fields.

    pub mod major_units {
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_f64(*minor as f64 / 100.0)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
            let major = f64::deserialize(deserializer)?;
            let minor = (major * 100.0).round();
            if !minor.is_finite() || minor.abs() > 9.0e15 {
                return Err(D::Error::custom(format!("amount out of range: {major}")));
            }
            Ok(minor as i64)
        }
    }
}

pub mod split {
    use std::fmt;

    use super::*;
    use crate::money::major_units;

    /// Whole-item assignment of the `split-tickets` request.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItemAssignment {
        pub item_id: String,
        pub check_id: u32,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClaimView {
        pub check_id: u32,
        #[serde(rename = "amount", with = "major_units")]
        pub amount_minor: i64,
    }

    /// Claims of one fragmented item.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SplitItemClaims {
        pub item_id: String,
        pub claims: Vec<ClaimView>,
    }

    /// Body of `POST /orders/{id}/split-tickets`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SplitTicketsRequest {
        pub assignments: Vec<ItemAssignment>,
        /// Omitted when no item is fragmented.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub split_items: Option<Vec<SplitItemClaims>>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SplitType {
        Even,
    }

    /// Body of `POST /orders/{id}/split`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EvenSplitRequest {
        #[serde(rename = "type")]
        pub split_type: SplitType,
        pub num_ways: u32,
    }

    impl EvenSplitRequest {
        pub fn new(num_ways: u32) -> Self {
            Self {
                split_type: SplitType::Even,
                num_ways,
            }
        }
    }

    /// Human-facing number of a split order. Some backends send it as a
    /// number, others as a string such as `"1042-2"`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum DisplayNumber {
        Number(u64),
        Text(String),
    }

    impl fmt::Display for DisplayNumber {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Number(n) => write!(f, "{n}"),
                Self::Text(s) => f.write_str(s),
            }
        }
    }

    /// One persisted child order.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SplitOrderView {
        pub id: String,
        pub split_index: u32,
        pub display_number: DisplayNumber,
        pub status: String,
        #[serde(rename = "total", with = "major_units")]
        pub total_minor: i64,
        pub item_count: u32,
    }

    /// Success body of both split endpoints.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SplitResponse {
        pub parent_order_id: String,
        pub split_orders: Vec<SplitOrderView>,
    }
}
