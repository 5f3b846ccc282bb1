//! FILENAME: core/recordsheet/src/marshal.rs
//! Cell Marshaller: field values to cells and back, dispatched on the
//! field's declared type.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use grid::{serial_to_date, Cell, CellValue};

use crate::catalog::FieldDescriptor;
use crate::error::ConvertError;
use crate::record::{FieldType, FieldValue, IdentityResolver};

const ISO_DATE: &str = "%Y-%m-%d";

pub struct CellMarshaller<'a> {
    resolver: &'a dyn IdentityResolver,
    /// Style index of the `yyyy-mm-dd` date style in the target workbook.
    date_style: usize,
}

impl<'a> CellMarshaller<'a> {
    pub fn new(resolver: &'a dyn IdentityResolver, date_style: usize) -> Self {
        CellMarshaller { resolver, date_style }
    }

    /// None for an unset value; the cell is left out.
    pub fn to_cell(
        &self,
        value: Option<&FieldValue>,
        field: &FieldDescriptor,
    ) -> Result<Option<Cell>, ConvertError> {
        let Some(value) = value else {
            return Ok(None);
        };

        let cell = match (field.field_type, value) {
            (FieldType::Text | FieldType::Enum, FieldValue::Text(s)) => Cell::new_text(s.clone()),
            // Integers above 2^53 lose precision as worksheet numbers
            (FieldType::Integer, FieldValue::Integer(i)) => Cell::new_number(*i as f64),
            (FieldType::Decimal, FieldValue::Decimal(n)) => Cell::new_number(*n),
            (FieldType::Decimal, FieldValue::Integer(i)) => Cell::new_number(*i as f64),
            (FieldType::Boolean, FieldValue::Boolean(b)) => Cell::new_boolean(*b),
            (FieldType::Date | FieldType::DateTime, FieldValue::Date(d)) => {
                Cell::new_date(*d, self.date_style)
            }
            (FieldType::Date | FieldType::DateTime, FieldValue::DateTime(dt)) => {
                Cell::new_date(dt.date(), self.date_style)
            }
            (FieldType::Reference, FieldValue::Reference(object)) => {
                let token = self
                    .resolver
                    .token_for(object)
                    .ok_or_else(|| ConvertError::UnresolvableReference(object.bookmark()))?;
                Cell::new_reference(object.title.clone(), token)
            }
            (expected, value) => return Err(ConvertError::mismatch(&field.name, expected, value.kind())),
        };
        Ok(Some(cell))
    }

    /// None for a blank cell; the field is left unset.
    pub fn from_cell(
        &self,
        cell: &CellValue,
        field: &FieldDescriptor,
    ) -> Result<Option<FieldValue>, ConvertError> {
        if cell.is_blank() {
            return Ok(None);
        }
        let mismatch = || ConvertError::mismatch(&field.name, field.field_type, cell.kind());

        let value = match field.field_type {
            FieldType::Text | FieldType::Enum => FieldValue::Text(cell.display_value()),

            FieldType::Integer => match cell {
                CellValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                    FieldValue::Integer(*n as i64)
                }
                CellValue::Text(s) => FieldValue::Integer(s.trim().parse().map_err(|_| mismatch())?),
                _ => return Err(mismatch()),
            },

            FieldType::Decimal => match cell {
                CellValue::Number(n) => FieldValue::Decimal(*n),
                CellValue::Text(s) => FieldValue::Decimal(s.trim().parse().map_err(|_| mismatch())?),
                _ => return Err(mismatch()),
            },

            FieldType::Boolean => match cell {
                CellValue::Boolean(b) => FieldValue::Boolean(*b),
                CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => FieldValue::Boolean(true),
                    "false" => FieldValue::Boolean(false),
                    _ => return Err(mismatch()),
                },
                _ => return Err(mismatch()),
            },

            FieldType::Date => FieldValue::Date(read_date(cell).ok_or_else(mismatch)?),

            FieldType::DateTime => {
                // Only the calendar date survives a worksheet
                let date = read_date(cell).ok_or_else(mismatch)?;
                FieldValue::DateTime(NaiveDateTime::new(date, NaiveTime::MIN))
            }

            FieldType::Reference => {
                let token = match cell {
                    CellValue::Reference { token, .. } => token.as_str(),
                    CellValue::Text(s) => s.trim(),
                    _ => return Err(mismatch()),
                };
                let object = self
                    .resolver
                    .resolve(token)
                    .ok_or_else(|| ConvertError::UnresolvableReference(token.to_string()))?;
                FieldValue::Reference(object)
            }
        };
        Ok(Some(value))
    }
}

fn read_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(serial) => serial_to_date(*serial),
        CellValue::Text(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, ISO_DATE)
                .ok()
                .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, ISO_DATE).ok()))
        }
        _ => None,
    }
}
