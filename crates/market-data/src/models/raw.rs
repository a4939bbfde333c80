use serde::Serialize;

use crate::errors::ProtocolErrorKind;

/// Number of tilde-delimited fields in one quote payload.
pub const RAW_FIELD_COUNT: usize = 11;

/// The eleven positional fields of one protocol line, named once at parse time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RawFieldSet {
    pub market_status: String,
    pub name: String,
    pub code: String,
    pub price: String,
    pub change_points: String,
    pub change_percent: String,
    pub volume: String,
    pub amount: String,
    pub reserved: String,
    pub market_cap: String,
    pub security_type: String,
}

impl RawFieldSet {
    /// Build from split payload fields.
    ///
    /// Rejects fewer than [`RAW_FIELD_COUNT`] fields; trailing extras are ignored.
    pub fn from_fields(fields: &[&str]) -> Result<Self, ProtocolErrorKind> {
        match fields {
            [market_status, name, code, price, change_points, change_percent, volume, amount, reserved, market_cap, security_type, ..] => {
                Ok(Self {
                    market_status: market_status.to_string(),
                    name: name.to_string(),
                    code: code.to_string(),
                    price: price.to_string(),
                    change_points: change_points.to_string(),
                    change_percent: change_percent.to_string(),
                    volume: volume.to_string(),
                    amount: amount.to_string(),
                    reserved: reserved.to_string(),
                    market_cap: market_cap.to_string(),
                    security_type: security_type.to_string(),
                })
            }
            _ => Err(ProtocolErrorKind::InsufficientFields {
                expected: RAW_FIELD_COUNT,
                found: fields.len(),
            }),
        }
    }
}
