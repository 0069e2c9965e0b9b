//! Type Normalizer
//!
//! Maps each format's native type tag onto the canonical buckets. Every
//! format canonicalizes from its own native type; there is no per-format
//! override.

use crate::models::CanonicalType;
use arrow_schema::DataType;

/// Canonical type for an Avro primitive type name
pub fn from_avro(tag: &str) -> CanonicalType {
    match tag {
        "string" => CanonicalType::String,
        "int" | "long" => CanonicalType::Integer,
        "float" | "double" => CanonicalType::Float,
        "boolean" => CanonicalType::Boolean,
        _ => CanonicalType::Other,
    }
}

/// Native tag inferred for a CSV sample value.
///
/// Only a non-empty run of ASCII digits counts as numeric. A single sample
/// row decides the type for the whole column.
pub fn csv_native_tag(sample: &str) -> &'static str {
    if !sample.is_empty() && sample.bytes().all(|b| b.is_ascii_digit()) {
        "int"
    } else {
        "string"
    }
}

/// Canonical type for a CSV native tag
pub fn from_csv(tag: &str) -> CanonicalType {
    match tag {
        "int" => CanonicalType::Integer,
        "string" => CanonicalType::String,
        _ => CanonicalType::Other,
    }
}

/// Canonical type for an Arrow data type read from a Parquet footer
pub fn from_arrow(data_type: &DataType) -> CanonicalType {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => CanonicalType::String,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => CanonicalType::Integer,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => CanonicalType::Float,
        DataType::Boolean => CanonicalType::Boolean,
        DataType::Dictionary(_, value) => from_arrow(value),
        _ => CanonicalType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avro_numbers_keep_integer_and_float_apart() {
        assert_eq!(from_avro("int"), CanonicalType::Integer);
        assert_eq!(from_avro("long"), CanonicalType::Integer);
        assert_eq!(from_avro("float"), CanonicalType::Float);
        assert_eq!(from_avro("double"), CanonicalType::Float);
    }

    #[test]
    fn test_avro_complex_types_are_other() {
        for tag in ["record", "array", "map", "enum", "fixed", "bytes", "null", "timestamp-millis"] {
            assert_eq!(from_avro(tag), CanonicalType::Other, "tag {}", tag);
        }
        assert_eq!(from_avro("boolean"), CanonicalType::Boolean);
        assert_eq!(from_avro("string"), CanonicalType::String);
    }

    #[test]
    fn test_csv_digit_detection() {
        assert_eq!(csv_native_tag("123"), "int");
        assert_eq!(csv_native_tag("007"), "int");
        assert_eq!(csv_native_tag(""), "string");
        assert_eq!(csv_native_tag("-5"), "string");
        assert_eq!(csv_native_tag("1.5"), "string");
        assert_eq!(csv_native_tag("12a"), "string");
        assert_eq!(csv_native_tag(" 12"), "string");
    }

    #[test]
    fn test_csv_tags() {
        assert_eq!(from_csv("int"), CanonicalType::Integer);
        assert_eq!(from_csv("string"), CanonicalType::String);
    }

    #[test]
    fn test_arrow_types() {
        assert_eq!(from_arrow(&DataType::Utf8), CanonicalType::String);
        assert_eq!(from_arrow(&DataType::Int64), CanonicalType::Integer);
        assert_eq!(from_arrow(&DataType::UInt8), CanonicalType::Integer);
        assert_eq!(from_arrow(&DataType::Float64), CanonicalType::Float);
        assert_eq!(from_arrow(&DataType::Decimal128(10, 2)), CanonicalType::Float);
        assert_eq!(from_arrow(&DataType::Boolean), CanonicalType::Boolean);
        assert_eq!(from_arrow(&DataType::Date32), CanonicalType::Other);
        assert_eq!(
            from_arrow(&DataType::Dictionary(
                Box::new(DataType::Int32),
                Box::new(DataType::Utf8)
            )),
            CanonicalType::String
        );
    }
}
