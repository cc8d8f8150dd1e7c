// Named bit-field schemas for packed records
//
// A record is one 64-bit value holding several fields. Field widths are
// stored in the file header, so the schema is built once at load time and
// every record is decoded through it.

use crate::DictError;
use crate::compressed::{DATA_WIDTH, calculate_bit_width, extract_value};

/// An ordered list of named bit fields, lowest bits first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout<const N: usize> {
    names: [&'static str; N],
    widths: [u32; N],
}

impl<const N: usize> RecordLayout<N> {
    /// Build a layout, rejecting schemas wider than 64 bits.
    pub fn new(names: [&'static str; N], widths: [u32; N]) -> Result<Self, DictError> {
        if widths.iter().sum::<u32>() > DATA_WIDTH {
            return Err(DictError::LayoutTooWide);
        }
        Ok(RecordLayout { names, widths })
    }

    /// Build a layout from header bytes, rejecting negative widths.
    pub fn from_header(names: [&'static str; N], widths: [i8; N]) -> Result<Self, DictError> {
        let mut checked = [0u32; N];
        for (slot, (&width, name)) in checked.iter_mut().zip(widths.iter().zip(names)) {
            *slot = u32::try_from(width)
                .map_err(|_| DictError::Corrupt(format!("negative width {width} for `{name}`")))?;
        }
        Self::new(names, checked)
    }

    /// Build a layout wide enough to hold the given maximum value per field.
    pub fn fitting(names: [&'static str; N], max_values: [u64; N]) -> Result<Self, DictError> {
        Self::new(names, max_values.map(calculate_bit_width))
    }

    pub fn widths(&self) -> [u32; N] {
        self.widths
    }

    /// Widths as stored in a file header.
    pub fn header_widths(&self) -> [i8; N] {
        // Each width is at most 64 by construction
        self.widths.map(|w| w as i8)
    }

    /// Total number of bits used by one record.
    pub fn total_width(&self) -> u32 {
        self.widths.iter().sum()
    }

    /// Split a raw record into its fields, in schema order.
    pub fn decode(&self, mut raw: u64) -> Result<[u64; N], DictError> {
        let mut fields = [0u64; N];
        for (field, &width) in fields.iter_mut().zip(&self.widths) {
            *field = extract_value(raw, 0, width)?;
            raw = raw.checked_shr(width).unwrap_or(0);
        }
        Ok(fields)
    }

    /// Pack fields into a raw record.
    pub fn encode(&self, fields: [u64; N]) -> Result<u64, DictError> {
        let mut raw = 0u64;
        let mut shift = 0u32;
        for ((&value, &width), &name) in fields.iter().zip(&self.widths).zip(&self.names) {
            if extract_value(value, 0, width)? != value {
                return Err(DictError::FieldOverflow {
                    field: name,
                    value,
                    width,
                });
            }
            if width > 0 {
                raw |= value << shift;
            }
            shift += width;
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 3] = ["count", "offset", "kind"];

    #[test]
    fn encode_decode_fields_in_order() {
        let layout = RecordLayout::new(NAMES, [4, 10, 2]).unwrap();
        let raw = layout.encode([9, 700, 3]).unwrap();
        assert_eq!(raw, 9 | (700 << 4) | (3 << 14));
        assert_eq!(layout.decode(raw).unwrap(), [9, 700, 3]);
    }

    #[test]
    fn zero_width_fields() {
        let layout = RecordLayout::new(NAMES, [0, 8, 0]).unwrap();
        assert_eq!(layout.decode(0xAB).unwrap(), [0, 0xAB, 0]);
        assert!(layout.encode([1, 0, 0]).is_err());
    }

    #[test]
    fn full_width_layout() {
        let layout = RecordLayout::new(["a", "b"], [32, 32]).unwrap();
        let raw = layout.encode([u32::MAX as u64, 5]).unwrap();
        assert_eq!(layout.decode(raw).unwrap(), [u32::MAX as u64, 5]);
    }

    #[test]
    fn too_wide_rejected() {
        assert!(matches!(
            RecordLayout::new(["a", "b"], [40, 30]),
            Err(DictError::LayoutTooWide)
        ));
    }

    #[test]
    fn overflow_names_field() {
        let layout = RecordLayout::new(NAMES, [4, 10, 2]).unwrap();
        let err = layout.encode([1, 1024, 0]).unwrap_err();
        assert!(matches!(
            err,
            DictError::FieldOverflow {
                field: "offset",
                value: 1024,
                width: 10
            }
        ));
    }

    #[test]
    fn header_round_trip() {
        let layout = RecordLayout::fitting(NAMES, [15, 0, 600]).unwrap();
        assert_eq!(layout.widths(), [4, 1, 10]);
        let reread = RecordLayout::from_header(NAMES, layout.header_widths()).unwrap();
        assert_eq!(reread, layout);
        assert!(RecordLayout::from_header(NAMES, [1, -1, 2]).is_err());
    }
}
