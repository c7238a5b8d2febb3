//! Flat-file codec for property records
//!
//! Encodes record sets to the canonical comma-separated export format and
//! decodes them back. The wire header is a bit-exact downstream contract:
//! `propertyId,address,parcelNumber,propertyType,status,acres,value`.
//!
//! There is no quoting or escaping; a field containing the delimiter is a
//! contract violation and refuses to encode. Decoding tolerates column
//! reordering by resolving positions from the header row.

use terrasync_domain::constants::{EXPORT_DELIMITER, EXPORT_HEADER};
use terrasync_domain::{PropertyRecord, PropertyStatus, PropertyType, Result, SyncError};

const COLUMNS: [&str; 7] =
    ["propertyId", "address", "parcelNumber", "propertyType", "status", "acres", "value"];

/// Stateless encoder/decoder for the property export format.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCodec;

impl RecordCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode records as header plus one line per record.
    ///
    /// # Errors
    /// `SyncError::Encoding` if any textual field contains the delimiter
    /// or a record has an empty `propertyId`.
    pub fn encode(&self, records: &[PropertyRecord]) -> Result<String> {
        let mut out = String::from(EXPORT_HEADER);
        out.push('\n');

        for record in records {
            record.validate()?;
            for (name, field) in [
                ("propertyId", record.property_id.as_str()),
                ("address", record.address.as_str()),
                ("parcelNumber", record.parcel_number.as_str()),
            ] {
                if field.contains(EXPORT_DELIMITER) {
                    return Err(SyncError::Encoding(format!(
                        "field {name} of record {} contains the delimiter",
                        record.property_id
                    )));
                }
            }

            out.push_str(&record.property_id);
            out.push(EXPORT_DELIMITER);
            out.push_str(&record.address);
            out.push(EXPORT_DELIMITER);
            out.push_str(&record.parcel_number);
            out.push(EXPORT_DELIMITER);
            out.push_str(record.property_type.as_str());
            out.push(EXPORT_DELIMITER);
            out.push_str(record.status.as_str());
            out.push(EXPORT_DELIMITER);
            out.push_str(&format_decimal(record.acres));
            out.push(EXPORT_DELIMITER);
            if let Some(value) = record.value {
                out.push_str(&format_decimal(value));
            }
            out.push('\n');
        }

        Ok(out)
    }

    /// Decode the flat format back into records.
    ///
    /// The header row determines column order, so reordered columns parse
    /// correctly. Rows whose field count does not match the header, or
    /// whose typed fields fail to parse, yield
    /// `SyncError::MalformedRecord` with the 1-based line number.
    pub fn decode(&self, text: &str) -> Result<Vec<PropertyRecord>> {
        let mut lines = text.lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line.trim_end_matches('\r'),
            None => return Ok(Vec::new()),
        };
        let positions = Self::column_positions(header)?;
        let column_count = header.split(EXPORT_DELIMITER).count();

        let mut records = Vec::new();
        for (index, raw) in lines {
            let line_number = index + 1;
            let line = raw.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(EXPORT_DELIMITER).collect();
            if fields.len() != column_count {
                return Err(SyncError::MalformedRecord {
                    line: line_number,
                    reason: format!(
                        "expected {column_count} fields, found {}",
                        fields.len()
                    ),
                });
            }

            records.push(Self::decode_row(&fields, &positions, line_number)?);
        }

        Ok(records)
    }

    /// Map each canonical column name to its index in this header.
    fn column_positions(header: &str) -> Result<[usize; 7]> {
        let names: Vec<&str> = header.split(EXPORT_DELIMITER).map(str::trim).collect();
        let mut positions = [0usize; 7];
        for (slot, column) in COLUMNS.iter().enumerate() {
            match names.iter().position(|n| n == column) {
                Some(index) => positions[slot] = index,
                None => {
                    return Err(SyncError::MalformedRecord {
                        line: 1,
                        reason: format!("header is missing column {column}"),
                    })
                }
            }
        }
        Ok(positions)
    }

    fn decode_row(
        fields: &[&str],
        positions: &[usize; 7],
        line: usize,
    ) -> Result<PropertyRecord> {
        let field = |slot: usize| fields[positions[slot]];
        let malformed = |reason: String| SyncError::MalformedRecord { line, reason };

        let property_type = PropertyType::parse(field(3))
            .ok_or_else(|| malformed(format!("unknown propertyType {:?}", field(3))))?;
        let status = PropertyStatus::parse(field(4))
            .ok_or_else(|| malformed(format!("unknown status {:?}", field(4))))?;
        let acres: f64 = field(5)
            .parse()
            .map_err(|_| malformed(format!("acres {:?} is not a number", field(5))))?;
        let value = match field(6) {
            "" => None,
            raw => Some(
                raw.parse::<f64>()
                    .map_err(|_| malformed(format!("value {raw:?} is not a number")))?,
            ),
        };

        let record = PropertyRecord {
            property_id: field(0).to_string(),
            address: field(1).to_string(),
            parcel_number: field(2).to_string(),
            property_type,
            status,
            acres,
            value,
        };
        record.validate().map_err(|e| malformed(e.to_string()))?;
        Ok(record)
    }
}

/// Shortest decimal rendering that survives a round trip: whole numbers
/// print without a fractional part.
fn format_decimal(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PropertyRecord {
        PropertyRecord {
            property_id: "BC001".to_string(),
            address: "123 Test St".to_string(),
            parcel_number: "12345-123-123".to_string(),
            property_type: PropertyType::Residential,
            status: PropertyStatus::Active,
            acres: 0.25,
            value: Some(150_000.0),
        }
    }

    #[test]
    fn encode_emits_canonical_header_and_rows() {
        let codec = RecordCodec::new();
        let text = codec.encode(&[sample()]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("propertyId,address,parcelNumber,propertyType,status,acres,value")
        );
        assert_eq!(
            lines.next(),
            Some("BC001,123 Test St,12345-123-123,residential,active,0.25,150000")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn round_trip_preserves_records() {
        let codec = RecordCodec::new();
        let records = vec![
            sample(),
            PropertyRecord {
                property_id: "BC002".to_string(),
                address: "9 Orchard Rd".to_string(),
                parcel_number: "99999-000-001".to_string(),
                property_type: PropertyType::Agricultural,
                status: PropertyStatus::Pending,
                acres: 42.5,
                value: None,
            },
        ];
        let decoded = codec.decode(&codec.encode(&records).unwrap()).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn decode_tolerates_reordered_columns() {
        let codec = RecordCodec::new();
        let text = "status,value,acres,propertyId,address,parcelNumber,propertyType\n\
                    active,150000,0.25,BC001,123 Test St,12345-123-123,residential\n";
        let decoded = codec.decode(text).unwrap();
        assert_eq!(decoded, vec![sample()]);
    }

    #[test]
    fn row_with_wrong_field_count_reports_line_number() {
        let codec = RecordCodec::new();
        let text = format!(
            "{}\nBC001,123 Test St,12345-123-123,residential,active,0.25,150000\nBC002,too,short\n",
            terrasync_domain::constants::EXPORT_HEADER
        );
        match codec.decode(&text) {
            Err(SyncError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn missing_header_column_is_malformed() {
        let codec = RecordCodec::new();
        let text = "propertyId,address\nBC001,123 Test St\n";
        assert!(matches!(
            codec.decode(text),
            Err(SyncError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn delimiter_in_field_refuses_to_encode() {
        let codec = RecordCodec::new();
        let mut record = sample();
        record.address = "123 Test St, Apt 4".to_string();
        assert!(matches!(
            codec.encode(&[record]),
            Err(SyncError::Encoding(_))
        ));
    }

    #[test]
    fn empty_input_decodes_to_no_records() {
        let codec = RecordCodec::new();
        assert!(codec.decode("").unwrap().is_empty());
        assert!(codec
            .decode(terrasync_domain::constants::EXPORT_HEADER)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_enum_value_is_malformed() {
        let codec = RecordCodec::new();
        let text = format!(
            "{}\nBC001,123 Test St,12345-123-123,castle,active,0.25,\n",
            terrasync_domain::constants::EXPORT_HEADER
        );
        assert!(matches!(
            codec.decode(&text),
            Err(SyncError::MalformedRecord { line: 2, .. })
        ));
    }
}
