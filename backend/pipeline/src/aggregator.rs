use docintake_core::{
    Confidence, DocumentRecord, FieldName, RecordFields, RecordStatus, ResolvedField, Warning,
    WarningCode,
};
use docintake_understanding::SideExtraction;
use tracing::debug;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Merges front and back extractions into one record.
///
/// Conflicts are data: the losing value is reported as a warning, never
/// raised as an error.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    threshold: Confidence,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ResultAggregator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: Confidence::new(threshold),
        }
    }

    pub fn threshold(&self) -> Confidence {
        self.threshold
    }

    pub fn merge(&self, front: &SideExtraction, back: &SideExtraction) -> DocumentRecord {
        let mut fields = RecordFields::default();
        let mut warnings: Vec<Warning> = front
            .warnings
            .iter()
            .chain(back.warnings.iter())
            .cloned()
            .collect();

        for candidate in front.fields.iter().chain(back.fields.iter()) {
            let Some(current) = fields.get(&candidate.name).cloned() else {
                fields.insert(&candidate.name, ResolvedField::from(candidate));
                continue;
            };

            if current.value == candidate.value {
                if candidate.confidence > current.confidence {
                    fields.insert(&candidate.name, ResolvedField::from(candidate));
                }
                continue;
            }

            // Strictly higher confidence wins; ties keep the value already
            // held, which is the front one.
            let (kept, discarded) = if candidate.confidence > current.confidence {
                fields.insert(&candidate.name, ResolvedField::from(candidate));
                (ResolvedField::from(candidate), current)
            } else {
                (current, ResolvedField::from(candidate))
            };
            warnings.push(conflict_warning(&candidate.name, &kept, &discarded));
        }

        let status = self.status_of(&fields);
        for name in FieldName::REQUIRED.iter() {
            if let Some(field) = fields.get(name) {
                if field.confidence < self.threshold {
                    warnings.push(Warning::for_field(
                        WarningCode::LowConfidence,
                        name,
                        format!(
                            "{name} confidence {} is below the threshold {}",
                            field.confidence, self.threshold
                        ),
                    ));
                }
            }
        }

        debug!(
            fields = fields.len(),
            warnings = warnings.len(),
            status = %status,
            "Merged front and back extractions"
        );
        DocumentRecord {
            fields,
            status,
            warnings,
        }
    }

    /// `success` needs every required field at or above the threshold,
    /// `failed` means none was found, anything in between is `partial`.
    pub fn status_of(&self, fields: &RecordFields) -> RecordStatus {
        let required: Vec<Option<&ResolvedField>> =
            FieldName::REQUIRED.iter().map(|name| fields.get(name)).collect();

        if required.iter().all(Option::is_none) {
            RecordStatus::Failed
        } else if required
            .iter()
            .all(|field| field.is_some_and(|f| f.confidence >= self.threshold))
        {
            RecordStatus::Success
        } else {
            RecordStatus::Partial
        }
    }
}

fn conflict_warning(name: &FieldName, kept: &ResolvedField, discarded: &ResolvedField) -> Warning {
    Warning::for_field(
        WarningCode::ConflictingValues,
        name,
        format!(
            "{name} differs between sides; kept {} value '{}' ({}), discarded {} value '{}' ({})",
            kept.side,
            name.display_value(&kept.value),
            kept.confidence,
            discarded.side,
            name.display_value(&discarded.value),
            discarded.confidence,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintake_core::{ExtractedField, Side};

    fn extracted(name: FieldName, value: &str, confidence: f32, side: Side) -> ExtractedField {
        ExtractedField {
            name,
            value: value.into(),
            confidence: Confidence::new(confidence),
            side,
            source_regions: vec![0],
        }
    }

    fn side(side: Side, fields: Vec<ExtractedField>) -> SideExtraction {
        SideExtraction {
            side,
            fields,
            warnings: Vec::new(),
        }
    }

    fn conflicts(record: &DocumentRecord) -> Vec<&Warning> {
        record
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::ConflictingValues)
            .collect()
    }

    #[test]
    fn higher_confidence_front_value_wins_conflict() {
        let front = side(
            Side::Front,
            vec![
                extracted(FieldName::Name, "Asha Rao", 0.9, Side::Front),
                extracted(FieldName::AadhaarNumber, "123456789012", 0.9, Side::Front),
            ],
        );
        let back = side(
            Side::Back,
            vec![extracted(FieldName::AadhaarNumber, "123456789099", 0.4, Side::Back)],
        );

        let record = ResultAggregator::default().merge(&front, &back);
        assert_eq!(
            record.display_value(&FieldName::AadhaarNumber).as_deref(),
            Some("1234 5678 9012")
        );
        let conflicts = conflicts(&record);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("1234 5678 9099"));
        assert_eq!(record.status, RecordStatus::Success);
    }

    #[test]
    fn strictly_higher_back_value_wins_and_ties_prefer_front() {
        let front = side(Side::Front, vec![extracted(FieldName::Dob, "01/01/1990", 0.5, Side::Front)]);
        let back = side(Side::Back, vec![extracted(FieldName::Dob, "07/01/1990", 0.8, Side::Back)]);
        let record = ResultAggregator::default().merge(&front, &back);
        let dob = record.get(&FieldName::Dob).unwrap();
        assert_eq!((dob.value.as_str(), dob.side), ("07/01/1990", Side::Back));
        assert!(conflicts(&record)[0].message.contains("01/01/1990"));

        let back = side(Side::Back, vec![extracted(FieldName::Dob, "07/01/1990", 0.5, Side::Back)]);
        let record = ResultAggregator::default().merge(&front, &back);
        assert_eq!(record.get(&FieldName::Dob).unwrap().side, Side::Front);
        assert_eq!(conflicts(&record).len(), 1);
    }

    #[test]
    fn agreeing_sides_keep_best_confidence_silently() {
        let front = side(
            Side::Front,
            vec![extracted(FieldName::AadhaarNumber, "234123412346", 0.5, Side::Front)],
        );
        let back = side(
            Side::Back,
            vec![extracted(FieldName::AadhaarNumber, "234123412346", 0.95, Side::Back)],
        );
        let record = ResultAggregator::default().merge(&front, &back);
        assert_eq!(record.get(&FieldName::AadhaarNumber).unwrap().confidence.value(), 0.95);
        assert!(conflicts(&record).is_empty());
    }

    #[test]
    fn status_rules() {
        let aggregator = ResultAggregator::default();
        let empty = side(Side::Back, Vec::new());

        let none = side(Side::Front, vec![extracted(FieldName::Gender, "Female", 0.9, Side::Front)]);
        let record = aggregator.merge(&none, &empty);
        assert_eq!(record.status, RecordStatus::Failed);
        assert!(record.get(&FieldName::Gender).is_some());

        let one = side(Side::Front, vec![extracted(FieldName::Name, "Asha Rao", 0.9, Side::Front)]);
        assert_eq!(aggregator.merge(&one, &empty).status, RecordStatus::Partial);

        let low = side(
            Side::Front,
            vec![
                extracted(FieldName::Name, "Asha Rao", 0.9, Side::Front),
                extracted(FieldName::AadhaarNumber, "234123412346", 0.59, Side::Front),
            ],
        );
        let record = aggregator.merge(&low, &empty);
        assert_eq!(record.status, RecordStatus::Partial);
        let low_conf: Vec<_> = record
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::LowConfidence)
            .collect();
        assert_eq!(low_conf.len(), 1);
        assert_eq!(low_conf[0].field.as_deref(), Some("aadhaarNumber"));

        let exact = side(
            Side::Front,
            vec![
                extracted(FieldName::Name, "Asha Rao", 0.6, Side::Front),
                extracted(FieldName::AadhaarNumber, "234123412346", 0.6, Side::Front),
            ],
        );
        assert_eq!(aggregator.merge(&exact, &empty).status, RecordStatus::Success);
    }

    #[test]
    fn unknown_keys_and_side_warnings_are_carried() {
        let mut front = side(
            Side::Front,
            vec![extracted(FieldName::Other("vid".into()), "9111 2222 3333 4444", 0.7, Side::Front)],
        );
        front
            .warnings
            .push(Warning::new(WarningCode::AmbiguousField, "name matched twice"));
        let record = ResultAggregator::default().merge(&front, &side(Side::Back, Vec::new()));
        assert!(record.fields.extra.contains_key("vid"));
        assert_eq!(record.warnings[0].code, WarningCode::AmbiguousField);
    }
}
