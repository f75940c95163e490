//! Struct nodes
//!
//! A [`Struct`] is one live block of debugged-program memory, drawn as a box with
//! a header row (address and type) followed by one row per field.

use super::address::Address;
use super::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Narrowest box drawn, so tiny structs still have room for the header
const MIN_BOX_WIDTH: usize = 14;

/// Current value of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Scalar(String),
    /// `None` is NULL
    Pointer(Option<Address>),
}

impl FieldValue {
    pub fn is_pointer(&self) -> bool {
        matches!(self, FieldValue::Pointer(_))
    }

    pub fn render(&self) -> String {
        match self {
            FieldValue::Scalar(text) => text.clone(),
            FieldValue::Pointer(Some(addr)) => addr.to_string(),
            FieldValue::Pointer(None) => "NULL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn scalar(name: &str, type_name: &str, value: &str) -> Self {
        Field {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value: FieldValue::Scalar(value.to_string()),
        }
    }

    pub fn pointer(name: &str, type_name: &str, target: Option<Address>) -> Self {
        Field {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value: FieldValue::Pointer(target),
        }
    }

    /// Row text as drawn inside the box
    pub fn row_text(&self) -> String {
        format!("{} {} = {}", self.type_name, self.name, self.value.render())
    }
}

/// One live block of debugged-program memory
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    address: Address,
    type_name: String,
    fields: Vec<Field>,
    position: Point,
}

impl Struct {
    pub fn new(address: Address, type_name: String, fields: Vec<Field>, position: Point) -> Self {
        Struct {
            address,
            type_name,
            fields,
            position,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Pointer-typed fields with their current targets
    pub fn pointer_fields(&self) -> impl Iterator<Item = (&str, Option<Address>)> {
        self.fields.iter().filter_map(|f| match f.value {
            FieldValue::Pointer(target) => Some((f.name.as_str(), target)),
            FieldValue::Scalar(_) => None,
        })
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Replace field values in place; identity and position are kept.
    ///
    /// Returns whether anything changed.
    pub(crate) fn update_fields(&mut self, type_name: &str, fields: Vec<Field>) -> bool {
        let changed = self.type_name != type_name || self.fields != fields;
        if changed {
            self.type_name = type_name.to_string();
            self.fields = fields;
        }
        changed
    }

    pub fn header_text(&self) -> String {
        format!("{} @ {}", self.type_name, self.address)
    }

    /// Width and height of the box in graph units
    pub fn size(&self) -> (f64, f64) {
        let widest = self
            .fields
            .iter()
            .map(|f| f.row_text().chars().count())
            .chain(std::iter::once(self.header_text().chars().count()))
            .max()
            .unwrap_or(0)
            .max(MIN_BOX_WIDTH);
        // Borders on both sides plus a space of padding each
        let width = (widest + 4) as f64;
        // Top border, header, separator, one row per field, bottom border
        let height = (self.fields.len() + 4) as f64;
        (width, height)
    }

    pub fn bounds(&self) -> Rect {
        let (width, height) = self.size();
        Rect::new(self.position.x, self.position.y, width, height)
    }

    /// Where the arrow for pointer field `name` leaves the box: the right border,
    /// vertically centered on the field's row
    pub fn field_anchor(&self, name: &str) -> Option<Point> {
        let row = self.fields.iter().position(|f| f.name == name)?;
        let bounds = self.bounds();
        Some(Point::new(bounds.right(), bounds.y + 3.0 + row as f64 + 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Struct {
        Struct::new(
            Address(0x10),
            "struct node".to_string(),
            vec![
                Field::scalar("value", "int", "1"),
                Field::pointer("next", "struct node *", Some(Address(0x20))),
            ],
            Point::new(10.0, 5.0),
        )
    }

    #[test]
    fn test_size_grows_with_fields() {
        let s = node();
        let (w, h) = s.size();
        assert_eq!(h, 6.0);
        assert!(w >= (MIN_BOX_WIDTH + 4) as f64);
        assert!(w as usize >= s.header_text().len() + 4);
    }

    #[test]
    fn test_field_anchor_on_right_border() {
        let s = node();
        let anchor = s.field_anchor("next").unwrap();
        assert_eq!(anchor.x, s.bounds().right());
        assert_eq!(anchor.y, 5.0 + 3.0 + 1.0 + 0.5);
        assert!(s.field_anchor("missing").is_none());
    }

    #[test]
    fn test_update_fields_keeps_identity() {
        let mut s = node();
        let fields = vec![Field::scalar("value", "int", "2")];
        assert!(s.update_fields("struct node", fields.clone()));
        assert!(!s.update_fields("struct node", fields));
        assert_eq!(s.address(), Address(0x10));
        assert_eq!(s.position(), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_pointer_fields() {
        let s = node();
        let ptrs: Vec<_> = s.pointer_fields().collect();
        assert_eq!(ptrs, vec![("next", Some(Address(0x20)))]);
    }
}
