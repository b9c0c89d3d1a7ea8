// src/exchange/options.rs
// Per-operation options, their defaults, and eager validation of options
// that arrive as loosely typed JSON.

use lapin::types::{AMQPValue, FieldArray, FieldTable, LongString, ShortString};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::rabbitmq::errors::{ExchangeError, Result};

/// AMQP short strings carry a one-byte length prefix.
pub const SHORT_STRING_MAX: usize = 255;

/// Options for `exchange.declare`. Every flag defaults to `false` and the
/// argument table defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeclareOptions {
    pub durable: bool,
    pub auto_delete: bool,
    pub passive: bool,
    pub internal: bool,
    pub no_wait: bool,
    #[serde(deserialize_with = "deserialize_arguments")]
    pub arguments: FieldTable,
}

impl DeclareOptions {
    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    pub fn passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    pub fn no_wait(mut self, no_wait: bool) -> Self {
        self.no_wait = no_wait;
        self
    }

    pub fn arguments(mut self, arguments: FieldTable) -> Self {
        self.arguments = arguments;
        self
    }

    /// Adds a single extension argument, e.g. `alternate-exchange`.
    pub fn argument(mut self, key: &str, value: AMQPValue) -> Self {
        self.arguments.insert(ShortString::from(key.to_string()), value);
        self
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        options_from_json(value)
    }
}

/// Options for `exchange.delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeleteOptions {
    pub if_unused: bool,
    pub no_wait: bool,
}

impl DeleteOptions {
    pub fn if_unused(mut self, if_unused: bool) -> Self {
        self.if_unused = if_unused;
        self
    }

    pub fn no_wait(mut self, no_wait: bool) -> Self {
        self.no_wait = no_wait;
        self
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        options_from_json(value)
    }
}

/// Options shared by `exchange.bind` and `exchange.unbind`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindOptions {
    pub routing_key: String,
    pub no_wait: bool,
    #[serde(deserialize_with = "deserialize_arguments")]
    pub arguments: FieldTable,
}

impl BindOptions {
    pub fn routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = routing_key.into();
        self
    }

    pub fn no_wait(mut self, no_wait: bool) -> Self {
        self.no_wait = no_wait;
        self
    }

    pub fn arguments(mut self, arguments: FieldTable) -> Self {
        self.arguments = arguments;
        self
    }

    /// Adds a single binding argument, e.g. `x-match` for headers exchanges.
    pub fn argument(mut self, key: &str, value: AMQPValue) -> Self {
        self.arguments.insert(ShortString::from(key.to_string()), value);
        self
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        options_from_json(value)
    }
}

/// Converts a JSON object into an AMQP argument table. Errors name the
/// offending key by its path, e.g. `x-nested.inner` or `x-list[1]`.
pub fn arguments_from_json(value: &Value) -> Result<FieldTable> {
    let object = value
        .as_object()
        .ok_or_else(|| wrong_shape("arguments", "an object", value))?;
    table_from_json("", object)
}

fn table_from_json(prefix: &str, object: &Map<String, Value>) -> Result<FieldTable> {
    let mut table = FieldTable::default();
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        check_short_str(&path, key)?;
        table.insert(ShortString::from(key.clone()), amqp_value(&path, value)?);
    }
    Ok(table)
}

fn amqp_value(path: &str, value: &Value) -> Result<AMQPValue> {
    Ok(match value {
        Value::Null => AMQPValue::Void,
        Value::Bool(b) => AMQPValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AMQPValue::LongLongInt(i)
            } else if n.is_u64() {
                return Err(ExchangeError::invalid_option(
                    path,
                    format!("{} does not fit a signed 64-bit integer", n),
                ));
            } else {
                // serde_json numbers that are neither i64 nor u64 are always f64
                AMQPValue::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => AMQPValue::LongString(LongString::from(s.clone())),
        Value::Array(items) => {
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| amqp_value(&format!("{}[{}]", path, i), item))
                .collect::<Result<Vec<_>>>()?;
            AMQPValue::FieldArray(FieldArray::from(values))
        }
        Value::Object(object) => AMQPValue::FieldTable(table_from_json(path, object)?),
    })
}

fn deserialize_arguments<'de, D>(deserializer: D) -> std::result::Result<FieldTable, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    arguments_from_json(&value).map_err(de::Error::custom)
}

/// Rejects values that would not fit an AMQP short string.
pub fn check_short_str(key: &str, value: &str) -> Result<()> {
    if value.len() > SHORT_STRING_MAX {
        return Err(ExchangeError::invalid_option(
            key,
            format!(
                "{} bytes exceeds the {} byte short string limit",
                value.len(),
                SHORT_STRING_MAX
            ),
        ));
    }
    Ok(())
}

fn options_from_json<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|err| locate_invalid::<T>(value, err))
}

// serde reports what went wrong but not which key; retry each key on its
// own to name it.
fn locate_invalid<T: DeserializeOwned>(value: &Value, err: serde_json::Error) -> ExchangeError {
    let object = match value.as_object() {
        Some(object) => object,
        None => return wrong_shape("options", "an object", value),
    };

    for (key, field) in object {
        let single: Map<String, Value> = std::iter::once((key.clone(), field.clone())).collect();
        if let Err(field_err) = T::deserialize(&Value::Object(single)) {
            let reason = field_err.to_string();
            if key == "arguments" && !reason.starts_with("unknown field") {
                if let Err(precise) = arguments_from_json(field) {
                    return precise;
                }
            }
            return ExchangeError::invalid_option(key, reason);
        }
    }

    ExchangeError::invalid_option("options", err.to_string())
}

fn wrong_shape(key: &str, expected: &str, actual: &Value) -> ExchangeError {
    ExchangeError::invalid_option(key, format!("expected {}, found {}", expected, actual))
}
