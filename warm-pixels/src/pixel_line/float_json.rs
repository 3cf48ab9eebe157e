//! JSON encoding for `f64` fields that may hold NaN or infinities.
//!
//! JSON has no literal for non-finite numbers and serde_json writes them as
//! `null`, which then fails to read back into an `f64`. Finite values are
//! kept as plain numbers; non-finite ones are written as the strings
//! `"NaN"`, `"inf"` and `"-inf"`. Inside a pixel array a `null` element
//! reads back as NaN, so files written before this encoding still load.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum JsonFloat {
    Number(f64),
    Text(String),
}

impl From<f64> for JsonFloat {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            JsonFloat::Number(value)
        } else if value.is_nan() {
            JsonFloat::Text("NaN".to_string())
        } else if value > 0.0 {
            JsonFloat::Text("inf".to_string())
        } else {
            JsonFloat::Text("-inf".to_string())
        }
    }
}

impl JsonFloat {
    fn into_f64(self) -> Result<f64, String> {
        match self {
            JsonFloat::Number(value) => Ok(value),
            JsonFloat::Text(text) => match text.as_str() {
                "NaN" | "nan" => Ok(f64::NAN),
                "inf" | "+inf" | "Infinity" => Ok(f64::INFINITY),
                "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(format!("expected a number, NaN or inf, got {other:?}")),
            },
        }
    }
}

/// `Option<Vec<f64>>` pixel arrays.
pub(crate) mod values {
    use super::*;

    pub fn serialize<S: Serializer>(values: &Option<Vec<f64>>, s: S) -> Result<S::Ok, S::Error> {
        values
            .as_ref()
            .map(|values| values.iter().copied().map(JsonFloat::from).collect::<Vec<_>>())
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<f64>>, D::Error> {
        let raw: Option<Vec<Option<JsonFloat>>> = Option::deserialize(d)?;
        raw.map(|values| {
            values
                .into_iter()
                .map(|value| value.map_or(Ok(f64::NAN), JsonFloat::into_f64))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(serde::de::Error::custom)
    }
}

/// `Option<f64>` metadata. `null` stays `None`.
pub(crate) mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        value.map(JsonFloat::from).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let raw: Option<JsonFloat> = Option::deserialize(d)?;
        raw.map(JsonFloat::into_f64)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

/// `Option<[f64; 2]>` locations.
pub(crate) mod pair {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<[f64; 2]>, s: S) -> Result<S::Ok, S::Error> {
        value
            .map(|[a, b]| [JsonFloat::from(a), JsonFloat::from(b)])
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<[f64; 2]>, D::Error> {
        let raw: Option<[JsonFloat; 2]> = Option::deserialize(d)?;
        raw.map(|[a, b]| -> Result<[f64; 2], String> { Ok([a.into_f64()?, b.into_f64()?]) })
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
