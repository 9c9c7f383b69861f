//! State serialization for terms (feature `serde`).
//!
//! Terms serialize as tagged objects: `{"type": "atom", "value": "ok"}`,
//! `{"type": "list", "data": [...]}`, `{"type": "bitstring", "bits": [1, 0]}`,
//! and so on.  Map data is keyed by canonical key and each slot holds the
//! `[key, value]` pair.  Integers that do not fit the float-safe range
//! are written as `"__bigint__:<digits>"`, and floats JSON cannot hold as
//! the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.

use crate::{BitString, Term, TermError, View};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::de::Error as _;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use smartstring::alias::String;

/// Prefix marking an integer serialized as text.
pub const BIGINT_PREFIX: &str = "__bigint__:";

/// Largest integer magnitude a 64 bit float represents exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

struct Bits<'a>(&'a BitString);

impl Serialize for Bits<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for bit in self.0.bits() {
            seq.serialize_element(&u8::from(bit))?;
        }
        seq.end()
    }
}

struct Integer<'a>(&'a BigInt);

impl Serialize for Integer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_i64() {
            Some(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => serializer.serialize_i64(i),
            _ => serializer.serialize_str(&format!("{BIGINT_PREFIX}{}", self.0)),
        }
    }
}

struct Float(f64);

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            f if f.is_nan() => serializer.serialize_str("NaN"),
            f if f == f64::INFINITY => serializer.serialize_str("Infinity"),
            f if f == f64::NEG_INFINITY => serializer.serialize_str("-Infinity"),
            f => serializer.serialize_f64(f),
        }
    }
}

struct Entries<'a>(&'a crate::TermMap);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.0.canonical_entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (canonical, k, v) in entries {
            map.serialize_entry(canonical, &(k, v))?;
        }
        map.end()
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind_name())?;
        match self.view() {
            View::Atom(a) => map.serialize_entry("value", a)?,
            View::Integer(i) => map.serialize_entry("value", &Integer(i))?,
            View::Float(f) => map.serialize_entry("value", &Float(f))?,
            View::String(s) => map.serialize_entry("value", s)?,
            View::Bitstring(bits) => map.serialize_entry("bits", &Bits(bits))?,
            View::List(items) | View::Tuple(items) => map.serialize_entry("data", items)?,
            View::Map(m) => map.serialize_entry("data", &Entries(m))?,
            View::ConsPattern(head, tail) => {
                map.serialize_entry("head", head)?;
                map.serialize_entry("tail", tail)?;
            }
            View::VariablePattern(name) => map.serialize_entry("name", name)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Term::from_json_value(&value).map_err(D::Error::custom)
    }
}

fn invalid(message: impl AsRef<str>) -> TermError {
    TermError::Deserialize(String::from(message.as_ref()))
}

fn field<'a>(obj: &'a Map<std::string::String, Value>, name: &str) -> Result<&'a Value, TermError> {
    obj.get(name)
        .ok_or_else(|| invalid(format!("missing field `{name}`")))
}

fn str_field<'a>(obj: &'a Map<std::string::String, Value>, name: &str) -> Result<&'a str, TermError> {
    field(obj, name)?
        .as_str()
        .ok_or_else(|| invalid(format!("field `{name}` must be a string")))
}

fn array_field<'a>(
    obj: &'a Map<std::string::String, Value>,
    name: &str,
) -> Result<&'a Vec<Value>, TermError> {
    field(obj, name)?
        .as_array()
        .ok_or_else(|| invalid(format!("field `{name}` must be an array")))
}

fn decode_integer(value: &Value) -> Result<BigInt, TermError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(BigInt::from)
            .or_else(|| n.as_u64().map(BigInt::from))
            .ok_or_else(|| invalid(format!("{n} is not an integer"))),
        Value::String(s) => s
            .strip_prefix(BIGINT_PREFIX)
            .and_then(|digits| digits.parse::<BigInt>().ok())
            .ok_or_else(|| invalid(format!("{s:?} is not a serialized integer"))),
        other => Err(invalid(format!("{other} is not an integer"))),
    }
}

fn decode_float(value: &Value) -> Result<f64, TermError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("{n} is not a float"))),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(invalid(format!("{s:?} is not a serialized float"))),
        },
        other => Err(invalid(format!("{other} is not a float"))),
    }
}

fn decode_items(items: &[Value]) -> Result<Vec<Term>, TermError> {
    items.iter().map(Term::from_json_value).collect()
}

impl Term {
    /// Decodes a term from its tagged JSON object form.
    pub fn from_json_value(value: &Value) -> Result<Term, TermError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("expected a tagged object"))?;
        let term = match str_field(obj, "type")? {
            "atom" => Term::atom(str_field(obj, "value")?),
            "integer" => Term::integer(decode_integer(field(obj, "value")?)?),
            "float" => Term::float(decode_float(field(obj, "value")?)?),
            "string" => Term::string(str_field(obj, "value")?),
            "bitstring" => Term::bitstring(
                array_field(obj, "bits")?
                    .iter()
                    .map(|bit| match bit.as_u64() {
                        Some(0) => Ok(false),
                        Some(1) => Ok(true),
                        _ => Err(invalid(format!("{bit} is not a bit"))),
                    })
                    .collect::<Result<BitString, _>>()?,
            ),
            "list" => Term::list(decode_items(array_field(obj, "data")?)?),
            "tuple" => Term::tuple(decode_items(array_field(obj, "data")?)?),
            "map" => {
                let data = field(obj, "data")?
                    .as_object()
                    .ok_or_else(|| invalid("map data must be an object"))?;
                let mut entries = Vec::with_capacity(data.len());
                for slot in data.values() {
                    match slot.as_array().map(Vec::as_slice) {
                        Some([k, v]) => {
                            entries.push((Term::from_json_value(k)?, Term::from_json_value(v)?))
                        }
                        _ => return Err(invalid("map slot must be a [key, value] pair")),
                    }
                }
                Term::map(entries)
            }
            "cons_pattern" => Term::cons_pattern(
                Term::from_json_value(field(obj, "head")?)?,
                Term::from_json_value(field(obj, "tail")?)?,
            ),
            "variable_pattern" => Term::variable_pattern(str_field(obj, "name")?),
            other => return Err(invalid(format!("unknown term type `{other}`"))),
        };
        Ok(term)
    }

    /// Serializes the term to a JSON string.
    pub fn to_json(&self) -> Result<std::string::String, TermError> {
        serde_json::to_string(self).map_err(|e| invalid(e.to_string()))
    }

    /// Parses a term from a JSON string.
    pub fn from_json(text: &str) -> Result<Term, TermError> {
        let value: Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        Term::from_json_value(&value)
    }
}
