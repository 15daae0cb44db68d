//! Field extraction: turns OCR text regions into semantic fields.
//!
//! Layout-aware rules for a two-sided identity card. The front carries the
//! holder's name, ID number, date of birth and gender; the back carries the
//! address (and usually repeats the ID number). Each rule combines a
//! pattern with proximity to a label keyword. Nothing is fabricated: a
//! field no rule matches is simply absent.

use chrono::NaiveDate;
use docintake_core::{
    Confidence, ExtractedField, FieldName, Side, TextRegion, Warning, WarningCode,
    is_plausible_id_number, normalize_id_number,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// --- Compiled regexes ---

/// Maximal run of digits separated only by spaces or tabs.
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d(?:[ \t]*\d)*").unwrap()
});

static DIGITS_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s]+$").unwrap()
});

static VID_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bVID\b").unwrap()
});

static DOB_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bDOB\b|\bD\.O\.B\b\.?|date\s+of\s+birth|birth\s*date)").unwrap()
});

static YOB_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bYOB\b|year\s+of\s+birth)").unwrap()
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b").unwrap()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\b").unwrap()
});

static GENDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(male|female|transgender)\b").unwrap()
});

static GENDER_LETTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:gender|sex)\s*[:\-]?\s*([MF])\b").unwrap()
});

static NAME_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*name\s*[:\-]\s*(.*)$").unwrap()
});

static NAME_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.' ]*[A-Za-z.]$").unwrap()
});

/// Words that never appear in a holder's name but do appear on the card.
static NAME_STOPWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:government|india|aadhaar|unique|identification|authority|dob|male|female|transgender|father|address|year|birth|issue|download|date|enrolment|vid|help|mobile|gender)\b",
    )
    .unwrap()
});

static FATHER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\bS/O\b|\bD/O\b|\bson\s+of\b|\bdaughter\s+of\b|\bfather(?:'s)?(?:\s+name)?\b)\s*[:\-]?\s*([A-Za-z][A-Za-z.' ]*[A-Za-z.])",
    )
    .unwrap()
});

static ADDRESS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\baddress\b\s*[:\-]?\s*").unwrap()
});

/// Lines that mark the end of the address block.
static ADDRESS_STOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:www\.|uidai|help@|\b1947\b|aadhaar|unique\s+identification|\bVID\b)").unwrap()
});

static PIN_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{6}\b").unwrap()
});

static LABELED_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z .']{0,30}?)\s*:\s*(\S.*)$").unwrap()
});

/// Labels owned by a dedicated rule; never turned into additional keys.
static KNOWN_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:name|dob|d\.o\.b\.?|date of birth|birth date|yob|year of birth|gender|sex|address|father|father's name|father name|mobile|mobile no\.?|mobile number|mob|phone|aadhaar|aadhaar no\.?|aadhaar number|uid)$",
    )
    .unwrap()
});

/// `Your Aadhaar No.`, `UID`: labels for the number the ID rule owns.
static ID_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:aadhaar(?:\s+no\.?|\s+number)?|uid)$").unwrap()
});

const MAX_ADDRESS_LINES: usize = 6;
const MAX_NAME_CHARS: usize = 60;

/// Fields read from one side, plus any non-fatal observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideExtraction {
    pub side: Side,
    pub fields: Vec<ExtractedField>,
    pub warnings: Vec<Warning>,
}

impl SideExtraction {
    /// A side that produced nothing, e.g. because its OCR call failed.
    pub fn empty(side: Side) -> Self {
        Self {
            side,
            fields: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn get(&self, name: &FieldName) -> Option<&ExtractedField> {
        self.fields.iter().find(|f| &f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    verify_checksum: bool,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A region seen through the extractor: its position in the sequence,
/// trimmed text, and confidence.
struct Line<'a> {
    index: usize,
    text: &'a str,
    confidence: Confidence,
}

impl FieldExtractor {
    pub fn new(verify_checksum: bool) -> Self {
        Self { verify_checksum }
    }

    /// Parse one side's regions into fields.
    ///
    /// When a field matches more than once with different values, the
    /// highest-confidence match wins and an `ambiguousField` warning is
    /// recorded; values are never concatenated.
    pub fn parse(&self, regions: &[TextRegion], side: Side) -> SideExtraction {
        let lines: Vec<Line<'_>> = regions
            .iter()
            .enumerate()
            .map(|(index, region)| Line {
                index,
                text: region.text.trim(),
                confidence: region.confidence,
            })
            .filter(|line| !line.text.is_empty())
            .collect();

        let mut candidates = Vec::new();
        match side {
            Side::Front => {
                candidates.extend(find_name(&lines, side));
                candidates.extend(find_id_numbers(&lines, side));
                candidates.extend(find_dob(&lines, side));
                candidates.extend(find_gender(&lines, side));
            }
            Side::Back => {
                candidates.extend(find_address(&lines, side));
                candidates.extend(find_id_numbers(&lines, side));
            }
        }
        candidates.extend(find_father_name(&lines, side));
        candidates.extend(find_mobile_numbers(&lines, side));
        candidates.extend(find_additional(&lines, side));

        let (fields, mut warnings) = resolve_duplicates(candidates, side);

        if self.verify_checksum {
            if let Some(id) = fields.iter().find(|f| f.name == FieldName::AadhaarNumber) {
                if !is_plausible_id_number(&id.value) {
                    warnings.push(Warning::for_field(
                        WarningCode::ChecksumMismatch,
                        &id.name,
                        format!("aadhaarNumber on the {side} side failed check-digit validation"),
                    ));
                }
            }
        }

        SideExtraction { side, fields, warnings }
    }
}

fn field(name: FieldName, value: String, side: Side, sources: &[&Line<'_>]) -> ExtractedField {
    let confidence = sources
        .iter()
        .map(|line| line.confidence)
        .reduce(Confidence::min)
        .unwrap_or(Confidence::ZERO);
    ExtractedField {
        name,
        value,
        confidence,
        side,
        source_regions: sources.iter().map(|line| line.index).collect(),
    }
}

/// Keep the best candidate per field name, in first-seen order.
fn resolve_duplicates(candidates: Vec<ExtractedField>, side: Side) -> (Vec<ExtractedField>, Vec<Warning>) {
    let mut groups: Vec<Vec<ExtractedField>> = Vec::new();
    for candidate in candidates {
        match groups.iter_mut().find(|g| g[0].name == candidate.name) {
            Some(group) => group.push(candidate),
            None => groups.push(vec![candidate]),
        }
    }

    let mut fields = Vec::with_capacity(groups.len());
    let mut warnings = Vec::new();
    for group in groups {
        let mut best = 0;
        for (i, candidate) in group.iter().enumerate() {
            if candidate.confidence > group[best].confidence {
                best = i;
            }
        }
        let kept = group[best].clone();

        let mut discarded: Vec<String> = Vec::new();
        for candidate in group.iter().filter(|c| c.value != kept.value) {
            let shown = kept.name.display_value(&candidate.value);
            if !discarded.contains(&shown) {
                discarded.push(shown);
            }
        }
        if !discarded.is_empty() {
            warnings.push(Warning::for_field(
                WarningCode::AmbiguousField,
                &kept.name,
                format!(
                    "{} matched {} different values on the {side} side; kept '{}' ({}), discarded {}",
                    kept.name,
                    discarded.len() + 1,
                    kept.name.display_value(&kept.value),
                    kept.confidence,
                    discarded
                        .iter()
                        .map(|v| format!("'{v}'"))
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            ));
        }
        fields.push(kept);
    }
    (fields, warnings)
}

// --- ID number ---

fn find_id_numbers(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    let mut matched = vec![false; lines.len()];

    for (pos, line) in lines.iter().enumerate() {
        if VID_LABEL_RE.is_match(line.text) {
            continue;
        }
        for m in DIGIT_RUN_RE.find_iter(line.text) {
            if preceded_by_plus(line.text, m.start()) {
                continue;
            }
            if let Some(digits) = normalize_id_number(m.as_str()) {
                found.push(field(FieldName::AadhaarNumber, digits, side, &[line]));
                matched[pos] = true;
            }
        }
    }

    // A number split across two neighbouring digit-only regions.
    for pos in 0..lines.len().saturating_sub(1) {
        let (a, b) = (&lines[pos], &lines[pos + 1]);
        if matched[pos] || matched[pos + 1] {
            continue;
        }
        if !DIGITS_ONLY_RE.is_match(a.text) || !DIGITS_ONLY_RE.is_match(b.text) {
            continue;
        }
        let (da, db) = (digit_count(a.text), digit_count(b.text));
        if da < 4 || db < 4 {
            continue;
        }
        if let Some(digits) = normalize_id_number(&format!("{} {}", a.text, b.text)) {
            found.push(field(FieldName::AadhaarNumber, digits, side, &[a, b]));
            matched[pos] = true;
            matched[pos + 1] = true;
        }
    }
    found
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(char::is_ascii_digit).count()
}

fn preceded_by_plus(text: &str, start: usize) -> bool {
    text[..start].trim_end().ends_with('+')
}

// --- Date of birth ---

fn find_dob(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    for (pos, line) in lines.iter().enumerate() {
        if let Some(label) = DOB_LABEL_RE.find(line.text) {
            let rest = &line.text[label.end()..];
            if let Some(date) = parse_date(rest) {
                found.push(field(FieldName::Dob, date, side, &[line]));
            } else if has_no_digits(rest) {
                let Some(next) = lines.get(pos + 1) else { continue };
                if let Some(date) = parse_date(next.text) {
                    found.push(field(FieldName::Dob, date, side, &[next]));
                }
            }
        } else if let Some(label) = YOB_LABEL_RE.find(line.text) {
            let rest = &line.text[label.end()..];
            let year = YEAR_RE
                .captures(rest)
                .map(|caps| (line, caps[1].to_string()))
                .or_else(|| {
                    let next = lines.get(pos + 1).filter(|_| has_no_digits(rest))?;
                    YEAR_RE.captures(next.text).map(|caps| (next, caps[1].to_string()))
                });
            if let Some((source, year)) = year {
                found.push(field(FieldName::Dob, year, side, &[source]));
            }
        }
    }
    found
}

/// A label with nothing readable after it takes its value from the next line.
fn has_no_digits(text: &str) -> bool {
    !text.chars().any(|c| c.is_ascii_digit())
}

/// First valid calendar date in `text`, rendered `DD/MM/YYYY`.
fn parse_date(text: &str) -> Option<String> {
    DATE_RE.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(date.format("%d/%m/%Y").to_string())
    })
}

// --- Gender ---

fn find_gender(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    for line in lines {
        let value = if let Some(caps) = GENDER_RE.captures(line.text) {
            Some(title_case(&caps[1]))
        } else {
            GENDER_LETTER_RE.captures(line.text).map(|caps| {
                match caps[1].to_ascii_uppercase().as_str() {
                    "M" => "Male".to_string(),
                    _ => "Female".to_string(),
                }
            })
        };
        if let Some(value) = value {
            found.push(field(FieldName::Gender, value, side, &[line]));
        }
    }
    found
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// --- Name ---

fn find_name(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    for (pos, line) in lines.iter().enumerate() {
        let Some(caps) = NAME_LABEL_RE.captures(line.text) else { continue };
        let inline = caps[1].trim();
        if is_name_like(inline) {
            found.push(field(FieldName::Name, inline.to_string(), side, &[line]));
        } else if inline.is_empty() {
            if let Some(next) = lines.get(pos + 1).filter(|next| is_name_like(next.text)) {
                found.push(field(FieldName::Name, next.text.to_string(), side, &[next]));
            }
        }
    }
    if !found.is_empty() {
        return found;
    }

    // Positional: the name sits on the nearest plausible line above the
    // date-of-birth or gender line.
    let anchor = lines.iter().position(|line| {
        DOB_LABEL_RE.is_match(line.text)
            || YOB_LABEL_RE.is_match(line.text)
            || GENDER_RE.is_match(line.text)
    });
    if let Some(anchor) = anchor {
        if let Some(line) = lines[..anchor].iter().rev().find(|line| is_name_like(line.text)) {
            found.push(field(FieldName::Name, line.text.to_string(), side, &[line]));
        }
    }
    found
}

fn is_name_like(text: &str) -> bool {
    let letters = text.chars().filter(char::is_ascii_alphabetic).count();
    letters >= 3
        && text.len() <= MAX_NAME_CHARS
        && NAME_LIKE_RE.is_match(text)
        && !NAME_STOPWORD_RE.is_match(text)
}

// --- Father's name ---

fn find_father_name(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = FATHER_RE.captures(line.text)?;
            let value = caps[1].trim();
            (value.chars().filter(char::is_ascii_alphabetic).count() >= 3)
                .then(|| field(FieldName::FatherName, value.to_string(), side, &[line]))
        })
        .collect()
}

// --- Mobile number ---

fn find_mobile_numbers(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    for line in lines {
        for m in DIGIT_RUN_RE.find_iter(line.text) {
            let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            let local = match digits.len() {
                10 => Some(digits.as_str()),
                12 if digits.starts_with("91") && preceded_by_plus(line.text, m.start()) => {
                    Some(&digits[2..])
                }
                _ => None,
            };
            if let Some(local) = local.filter(|d| d.starts_with(['6', '7', '8', '9'])) {
                found.push(field(FieldName::MobileNumber, local.to_string(), side, &[line]));
            }
        }
    }
    found
}

// --- Address ---

fn find_address(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    let Some((start, label)) = lines
        .iter()
        .enumerate()
        .find_map(|(pos, line)| ADDRESS_LABEL_RE.find(line.text).map(|m| (pos, m)))
    else {
        return Vec::new();
    };

    let mut parts: Vec<&str> = Vec::new();
    let mut sources: Vec<&Line<'_>> = Vec::new();

    let first = &lines[start];
    let inline = clean_address_part(&first.text[label.end()..]);
    if !inline.is_empty() {
        parts.push(inline);
        sources.push(first);
    }
    let mut done = !inline.is_empty() && PIN_CODE_RE.is_match(inline);

    for line in lines.iter().skip(start + 1).take(MAX_ADDRESS_LINES) {
        if done || ADDRESS_STOP_RE.is_match(line.text) || contains_id_number(line.text) {
            break;
        }
        let part = clean_address_part(line.text);
        if part.is_empty() {
            continue;
        }
        parts.push(part);
        sources.push(line);
        done = PIN_CODE_RE.is_match(part);
    }

    if parts.is_empty() {
        return Vec::new();
    }
    vec![field(FieldName::Address, parts.join(", "), side, &sources)]
}

fn clean_address_part(text: &str) -> &str {
    text.trim_matches(|c: char| c == ',' || c.is_whitespace())
}

fn contains_id_number(text: &str) -> bool {
    DIGIT_RUN_RE
        .find_iter(text)
        .any(|m| normalize_id_number(m.as_str()).is_some())
}

// --- Additional labelled fields ---

fn find_additional(lines: &[Line<'_>], side: Side) -> Vec<ExtractedField> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = LABELED_LINE_RE.captures(line.text)?;
            let label = caps[1].trim();
            if KNOWN_LABEL_RE.is_match(label) || ID_LABEL_RE.is_match(label) {
                return None;
            }
            let value = caps[2].trim().to_string();
            if contains_id_number(&value) {
                return None;
            }
            let key = camel_case(label)?;
            Some(field(FieldName::from_key(&key), value, side, &[line]))
        })
        .filter(|f| matches!(f.name, FieldName::Other(_)))
        .collect()
}

/// `Issue Date` -> `issueDate`, `VID` -> `vid`.
fn camel_case(label: &str) -> Option<String> {
    let mut key = String::new();
    for (i, word) in label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            key.push_str(&lower);
        } else {
            key.push_str(&title_case(&lower));
        }
    }
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(lines: &[(&str, f32)]) -> Vec<TextRegion> {
        lines.iter().map(|(text, conf)| TextRegion::new(*text, *conf)).collect()
    }

    fn value<'a>(extraction: &'a SideExtraction, name: &FieldName) -> Option<&'a str> {
        extraction.get(name).map(|f| f.value.as_str())
    }

    #[test]
    fn parses_typical_front() {
        let front = regions(&[
            ("GOVERNMENT OF INDIA", 0.97),
            ("Asha Rao", 0.91),
            ("DOB: 12/08/1990", 0.88),
            ("FEMALE", 0.95),
            ("2341 2341 2346", 0.93),
        ]);
        let out = FieldExtractor::default().parse(&front, Side::Front);

        assert_eq!(value(&out, &FieldName::Name), Some("Asha Rao"));
        assert_eq!(value(&out, &FieldName::Dob), Some("12/08/1990"));
        assert_eq!(value(&out, &FieldName::Gender), Some("Female"));
        assert_eq!(value(&out, &FieldName::AadhaarNumber), Some("234123412346"));
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);

        let id = out.get(&FieldName::AadhaarNumber).unwrap();
        assert_eq!(id.confidence.value(), 0.93);
        assert_eq!(id.source_regions, vec![4]);
    }

    #[test]
    fn parses_typical_back() {
        let back = regions(&[
            ("UNIQUE IDENTIFICATION AUTHORITY OF INDIA", 0.96),
            ("Address: S/O Ramesh Rao, 12 MG Road,", 0.84),
            ("Indiranagar, Bengaluru,", 0.79),
            ("Karnataka - 560038", 0.9),
            ("2341 2341 2346", 0.92),
            ("www.uidai.gov.in", 0.99),
        ]);
        let out = FieldExtractor::default().parse(&back, Side::Back);

        assert_eq!(
            value(&out, &FieldName::Address),
            Some("S/O Ramesh Rao, 12 MG Road, Indiranagar, Bengaluru, Karnataka - 560038")
        );
        let address = out.get(&FieldName::Address).unwrap();
        assert_eq!(address.confidence.value(), 0.79);
        assert_eq!(address.source_regions, vec![1, 2, 3]);

        assert_eq!(value(&out, &FieldName::FatherName), Some("Ramesh Rao"));
        assert_eq!(value(&out, &FieldName::AadhaarNumber), Some("234123412346"));
        // Back side never yields front-only fields.
        assert!(out.get(&FieldName::Name).is_none());
        assert!(out.get(&FieldName::Gender).is_none());
    }

    #[test]
    fn absent_fields_are_not_fabricated() {
        let out = FieldExtractor::default().parse(&regions(&[("blurry smudge", 0.2)]), Side::Front);
        assert!(out.fields.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn split_id_number_takes_minimum_confidence() {
        let front = regions(&[("Asha Rao", 0.9), ("2341 2341", 0.95), ("2346", 0.6)]);
        let out = FieldExtractor::default().parse(&front, Side::Front);
        let id = out.get(&FieldName::AadhaarNumber).unwrap();
        assert_eq!(id.value, "234123412346");
        assert_eq!(id.confidence.value(), 0.6);
        assert_eq!(id.source_regions, vec![1, 2]);
    }

    #[test]
    fn ambiguous_match_keeps_highest_confidence_and_warns() {
        let front = regions(&[
            ("Asha Rao", 0.9),
            ("DOB: 12/08/1990", 0.9),
            ("2341 2341 2346", 0.7),
            ("4987 6543 2102", 0.85),
        ]);
        let out = FieldExtractor::default().parse(&front, Side::Front);
        assert_eq!(value(&out, &FieldName::AadhaarNumber), Some("498765432102"));

        let ambiguous: Vec<_> = out
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::AmbiguousField)
            .collect();
        assert_eq!(ambiguous.len(), 1);
        assert_eq!(ambiguous[0].field.as_deref(), Some("aadhaarNumber"));
        assert!(ambiguous[0].message.contains("2341 2341 2346"));
    }

    #[test]
    fn repeated_identical_value_is_not_ambiguous() {
        let back = regions(&[("2341 2341 2346", 0.7), ("2341 2341 2346", 0.9)]);
        let out = FieldExtractor::default().parse(&back, Side::Back);
        assert_eq!(out.get(&FieldName::AadhaarNumber).unwrap().confidence.value(), 0.9);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn vid_is_not_an_id_number_but_is_preserved() {
        let front = regions(&[
            ("Asha Rao", 0.9),
            ("DOB: 12/08/1990", 0.9),
            ("VID : 9111 2222 3333 4444", 0.8),
        ]);
        let out = FieldExtractor::default().parse(&front, Side::Front);
        assert!(out.get(&FieldName::AadhaarNumber).is_none());
        assert_eq!(
            value(&out, &FieldName::Other("vid".into())),
            Some("9111 2222 3333 4444")
        );
    }

    #[test]
    fn sixteen_digit_run_is_not_an_id_number() {
        let out = FieldExtractor::default().parse(&regions(&[("9111 2222 3333 4444", 0.9)]), Side::Back);
        assert!(out.get(&FieldName::AadhaarNumber).is_none());
    }

    #[test]
    fn checksum_failure_warns_but_keeps_value() {
        let front = regions(&[("Asha Rao", 0.9), ("DOB: 01/01/1990", 0.9), ("1234 5678 9012", 0.9)]);
        let out = FieldExtractor::default().parse(&front, Side::Front);
        assert_eq!(value(&out, &FieldName::AadhaarNumber), Some("123456789012"));
        assert!(out.warnings.iter().any(|w| w.code == WarningCode::ChecksumMismatch));

        let out = FieldExtractor::new(false).parse(&front, Side::Front);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn dob_from_next_line_and_year_of_birth() {
        let out = FieldExtractor::default().parse(
            &regions(&[("Ravi Kumar", 0.9), ("Date of Birth", 0.9), ("3-7-1985", 0.8)]),
            Side::Front,
        );
        let dob = out.get(&FieldName::Dob).unwrap();
        assert_eq!(dob.value, "03/07/1985");
        assert_eq!(dob.source_regions, vec![2]);
        assert_eq!(value(&out, &FieldName::Name), Some("Ravi Kumar"));

        let out = FieldExtractor::default().parse(
            &regions(&[("Ravi Kumar", 0.9), ("Year of Birth : 1985", 0.8), ("MALE", 0.9)]),
            Side::Front,
        );
        assert_eq!(value(&out, &FieldName::Dob), Some("1985"));
        assert_eq!(value(&out, &FieldName::Gender), Some("Male"));
    }

    #[test]
    fn impossible_dates_and_unlabelled_dates_are_ignored() {
        let out = FieldExtractor::default().parse(
            &regions(&[("DOB: 31/02/1990", 0.9), ("Issue Date: 01/02/2020", 0.9)]),
            Side::Front,
        );
        assert!(out.get(&FieldName::Dob).is_none());
        assert_eq!(
            value(&out, &FieldName::Other("issueDate".into())),
            Some("01/02/2020")
        );
    }

    #[test]
    fn labelled_name_and_gender_letter() {
        let out = FieldExtractor::default().parse(
            &regions(&[("Name: Meera Nair", 0.87), ("Sex: F", 0.8), ("Father: Gopal Nair", 0.8)]),
            Side::Front,
        );
        assert_eq!(value(&out, &FieldName::Name), Some("Meera Nair"));
        assert_eq!(value(&out, &FieldName::Gender), Some("Female"));
        assert_eq!(value(&out, &FieldName::FatherName), Some("Gopal Nair"));
        // Known labels are not duplicated as additional keys.
        assert!(out.fields.iter().all(|f| !matches!(f.name, FieldName::Other(_))));
    }

    #[test]
    fn prefixed_id_labels_do_not_become_additional_keys() {
        let out = FieldExtractor::default().parse(
            &regions(&[("Asha Rao", 0.9), ("Your Aadhaar No. : 2341 2341 2346", 0.9)]),
            Side::Front,
        );
        assert_eq!(value(&out, &FieldName::AadhaarNumber), Some("234123412346"));
        assert!(out.fields.iter().all(|f| !matches!(f.name, FieldName::Other(_))));

        let out = FieldExtractor::default().parse(
            &regions(&[("Enrolment Ref: 2341 2341 2346", 0.9), ("Your UID: ----", 0.6)]),
            Side::Back,
        );
        assert!(out.get(&FieldName::Other("enrolmentRef".into())).is_none());
        assert!(out.get(&FieldName::Other("yourUid".into())).is_none());
    }

    #[test]
    fn mobile_numbers_with_and_without_country_code() {
        let out = FieldExtractor::default().parse(&regions(&[("Mobile: 98765 43210", 0.8)]), Side::Back);
        assert_eq!(value(&out, &FieldName::MobileNumber), Some("9876543210"));

        let out = FieldExtractor::default().parse(&regions(&[("+91 98765 43210", 0.8)]), Side::Back);
        assert_eq!(value(&out, &FieldName::MobileNumber), Some("9876543210"));
        // The prefixed run must not be read as an ID number.
        assert!(out.get(&FieldName::AadhaarNumber).is_none());
    }

    #[test]
    fn camel_cases_labels() {
        assert_eq!(camel_case("Issue Date").as_deref(), Some("issueDate"));
        assert_eq!(camel_case("VID").as_deref(), Some("vid"));
        assert_eq!(camel_case("  "), None);
    }
}
