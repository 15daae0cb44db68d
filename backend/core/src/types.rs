use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::id_number::format_id_number;

/// Which face of a two-sided card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Front, Side::Back];

    /// Multipart form field carrying this side's image.
    pub fn form_field(self) -> &'static str {
        match self {
            Side::Front => "frontImage",
            Side::Back => "backImage",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Self> {
        match name {
            "frontImage" => Some(Side::Front),
            "backImage" => Some(Side::Back),
            _ => None,
        }
    }

    /// Capitalised label for user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Side::Front => "Front",
            Side::Back => "Back",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Front => write!(f, "front"),
            Side::Back => write!(f, "back"),
        }
    }
}

/// An uploaded image, owned by the request that received it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub side: Side,
    /// Content type as declared by the client (not trusted).
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn new(side: Side, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            side,
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// OCR certainty, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Confidence(f32);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);
    pub const ONE: Confidence = Confidence(1.0);

    /// Clamp into `[0, 1]`; NaN becomes zero.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn min(self, other: Confidence) -> Confidence {
        if other.0 < self.0 { other } else { self }
    }
}

impl From<f32> for Confidence {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f32 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Axis-aligned box in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A located run of recognised text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: Confidence::new(confidence),
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.bbox = Some(BoundingBox { x, y, width, height });
        self
    }
}

/// Field names a document record may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Name,
    AadhaarNumber,
    Dob,
    Gender,
    Address,
    FatherName,
    MobileNumber,
    /// Any label the extractor recognised but that is not a well-known field.
    Other(String),
}

impl FieldName {
    /// Well-known fields, in display order.
    pub const KNOWN: [FieldName; 7] = [
        FieldName::Name,
        FieldName::AadhaarNumber,
        FieldName::Dob,
        FieldName::Gender,
        FieldName::Address,
        FieldName::FatherName,
        FieldName::MobileNumber,
    ];

    /// Fields whose presence decides the record status.
    pub const REQUIRED: [FieldName; 2] = [FieldName::Name, FieldName::AadhaarNumber];

    pub fn key(&self) -> &str {
        match self {
            FieldName::Name => "name",
            FieldName::AadhaarNumber => "aadhaarNumber",
            FieldName::Dob => "dob",
            FieldName::Gender => "gender",
            FieldName::Address => "address",
            FieldName::FatherName => "fatherName",
            FieldName::MobileNumber => "mobileNumber",
            FieldName::Other(key) => key,
        }
    }

    pub fn from_key(key: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.key() == key)
            .cloned()
            .unwrap_or_else(|| FieldName::Other(key.to_string()))
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Render a canonical value for the wire.
    pub fn display_value(&self, value: &str) -> String {
        match self {
            FieldName::AadhaarNumber => format_id_number(value),
            _ => value.to_string(),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// One candidate value for a field, as read from a single side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    pub name: FieldName,
    /// Canonical value (ID numbers are bare digits).
    pub value: String,
    pub confidence: Confidence,
    pub side: Side,
    /// Indices into the side's region sequence the value was read from.
    pub source_regions: Vec<usize>,
}

/// The value a record settled on for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub value: String,
    pub confidence: Confidence,
    pub side: Side,
}

impl From<&ExtractedField> for ResolvedField {
    fn from(field: &ExtractedField) -> Self {
        Self {
            value: field.value.clone(),
            confidence: field.confidence,
            side: field.side,
        }
    }
}

/// Slots for the well-known fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownFields {
    pub name: Option<ResolvedField>,
    pub aadhaar_number: Option<ResolvedField>,
    pub dob: Option<ResolvedField>,
    pub gender: Option<ResolvedField>,
    pub address: Option<ResolvedField>,
    pub father_name: Option<ResolvedField>,
    pub mobile_number: Option<ResolvedField>,
}

impl KnownFields {
    fn slot(&self, name: &FieldName) -> Option<&Option<ResolvedField>> {
        match name {
            FieldName::Name => Some(&self.name),
            FieldName::AadhaarNumber => Some(&self.aadhaar_number),
            FieldName::Dob => Some(&self.dob),
            FieldName::Gender => Some(&self.gender),
            FieldName::Address => Some(&self.address),
            FieldName::FatherName => Some(&self.father_name),
            FieldName::MobileNumber => Some(&self.mobile_number),
            FieldName::Other(_) => None,
        }
    }

    fn slot_mut(&mut self, name: &FieldName) -> Option<&mut Option<ResolvedField>> {
        match name {
            FieldName::Name => Some(&mut self.name),
            FieldName::AadhaarNumber => Some(&mut self.aadhaar_number),
            FieldName::Dob => Some(&mut self.dob),
            FieldName::Gender => Some(&mut self.gender),
            FieldName::Address => Some(&mut self.address),
            FieldName::FatherName => Some(&mut self.father_name),
            FieldName::MobileNumber => Some(&mut self.mobile_number),
            FieldName::Other(_) => None,
        }
    }
}

/// Well-known fields plus any additional keys, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFields {
    pub known: KnownFields,
    pub extra: BTreeMap<String, ResolvedField>,
}

impl RecordFields {
    pub fn get(&self, name: &FieldName) -> Option<&ResolvedField> {
        match name {
            FieldName::Other(key) => self.extra.get(key),
            known => self.known.slot(known).and_then(Option::as_ref),
        }
    }

    pub fn insert(&mut self, name: &FieldName, field: ResolvedField) {
        match self.known.slot_mut(name) {
            Some(slot) => *slot = Some(field),
            None => {
                self.extra.insert(name.key().to_string(), field);
            }
        }
    }

    pub fn contains(&self, name: &FieldName) -> bool {
        self.get(name).is_some()
    }

    /// Present fields: well-known ones first, in display order, then extras.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &ResolvedField)> + '_ {
        let known = FieldName::KNOWN
            .iter()
            .filter_map(|name| self.get(name).map(|field| (name.clone(), field)));
        let extra = self
            .extra
            .iter()
            .map(|(key, field)| (FieldName::Other(key.clone()), field));
        known.chain(extra)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialises as a flat `name -> display value` mapping.
impl Serialize for RecordFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, field) in self.iter() {
            map.serialize_entry(name.key(), &name.display_value(&field.value))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => write!(f, "success"),
            RecordStatus::Partial => write!(f, "partial"),
            RecordStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningCode {
    /// A field matched more than once on one side with different values.
    AmbiguousField,
    /// Front and back disagreed; one value was discarded.
    ConflictingValues,
    /// One side's extraction failed and the record is degraded.
    SideFailed,
    /// A required field is present but below the confidence threshold.
    LowConfidence,
    /// An ID number failed its check-digit validation.
    ChecksumMismatch,
}

/// A non-fatal observation attached to a record for manual review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: WarningCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Warning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(code: WarningCode, field: &FieldName, message: impl Into<String>) -> Self {
        Self {
            code,
            field: Some(field.key().to_string()),
            message: message.into(),
        }
    }
}

/// The merged result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub fields: RecordFields,
    pub status: RecordStatus,
    pub warnings: Vec<Warning>,
}

impl DocumentRecord {
    pub fn get(&self, name: &FieldName) -> Option<&ResolvedField> {
        self.fields.get(name)
    }

    /// Display value of a field, formatted as it goes on the wire.
    pub fn display_value(&self, name: &FieldName) -> Option<String> {
        self.get(name).map(|field| name.display_value(&field.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(value: &str, confidence: f32, side: Side) -> ResolvedField {
        ResolvedField {
            value: value.into(),
            confidence: Confidence::new(confidence),
            side,
        }
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Confidence::new(1.7).value(), 1.0);
        assert_eq!(Confidence::new(-0.2).value(), 0.0);
        assert_eq!(Confidence::new(f32::NAN).value(), 0.0);
        let parsed: Confidence = serde_json::from_str("3.5").unwrap();
        assert_eq!(parsed, Confidence::ONE);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let mut fields = RecordFields::default();
        fields.insert(&FieldName::from_key("issueDate"), resolved("01/02/2020", 0.8, Side::Front));
        fields.insert(&FieldName::from_key("name"), resolved("Asha Rao", 0.9, Side::Front));
        assert!(fields.known.name.is_some());
        assert!(fields.extra.contains_key("issueDate"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn record_fields_serialize_flat_with_grouped_id() {
        let mut fields = RecordFields::default();
        fields.insert(&FieldName::AadhaarNumber, resolved("234123412346", 0.9, Side::Front));
        fields.insert(&FieldName::Name, resolved("Asha Rao", 0.9, Side::Front));
        fields.insert(&FieldName::Other("vid".into()), resolved("9111 2222 3333 4444", 0.7, Side::Back));

        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Asha Rao","aadhaarNumber":"2341 2341 2346","vid":"9111 2222 3333 4444"}"#
        );
    }

    #[test]
    fn side_form_fields_round_trip() {
        for side in Side::BOTH {
            assert_eq!(Side::from_form_field(side.form_field()), Some(side));
        }
        assert_eq!(Side::from_form_field("sideImage"), None);
    }
}
