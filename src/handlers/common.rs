use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{de, Deserialize, Deserializer};

/// A JSON value that should hold a number but may arrive as a string from
/// form-driven clients. Coerced before it reaches the service layer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericField {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumericField {
    fn into_i32<E: de::Error>(self) -> Result<i32, E> {
        match self {
            NumericField::Int(v) => i32::try_from(v)
                .map_err(|_| E::custom(format!("number {} is out of range", v))),
            NumericField::Float(v) => Ok(v as i32),
            NumericField::Text(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| E::custom(format!("cannot parse {:?} as an integer", s))),
        }
    }

    fn into_decimal<E: de::Error>(self) -> Result<Decimal, E> {
        match self {
            NumericField::Int(v) => Ok(Decimal::from(v)),
            NumericField::Float(v) => Decimal::from_f64(v)
                .ok_or_else(|| E::custom(format!("cannot represent {} as a decimal", v))),
            NumericField::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|_| E::custom(format!("cannot parse {:?} as a decimal", s))),
        }
    }
}

pub fn de_i32_lenient<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    NumericField::deserialize(deserializer)?.into_i32()
}

pub fn de_opt_i32_lenient<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericField>::deserialize(deserializer)?
        .map(NumericField::into_i32)
        .transpose()
}

pub fn de_decimal_lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    NumericField::deserialize(deserializer)?.into_decimal()
}

pub fn de_opt_decimal_lenient<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericField>::deserialize(deserializer)?
        .map(NumericField::into_decimal)
        .transpose()
}
