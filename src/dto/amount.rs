use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

/// Whole, non-negative money amount. Accepts `20`, `20.0` or `"20"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Amount(pub i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

fn whole(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(v) => Some(v),
            RawAmount::Float(v) => whole(v),
            RawAmount::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
        };
        match value {
            Some(v) if v >= 0 => Ok(Amount(v)),
            Some(_) => Err(de::Error::custom("amount must not be negative")),
            None => Err(de::Error::custom("amount must be a whole number")),
        }
    }
}
