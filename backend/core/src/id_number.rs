//! ID-number normalisation, display formatting, and check-digit validation.
//!
//! The canonical form of an ID number is its bare digit sequence. Grouping
//! into blocks of four is applied only when rendering for a caller.

/// Digit count of a well-formed ID number.
pub const ID_NUMBER_DIGITS: usize = 12;

const GROUP_SIZE: usize = 4;

/// Strip whitespace and return the digit sequence if it is a well-formed
/// 12-digit ID number.
pub fn normalize_id_number(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() == ID_NUMBER_DIGITS && compact.chars().all(|c| c.is_ascii_digit()) {
        Some(compact)
    } else {
        None
    }
}

/// Group a value into `XXXX XXXX XXXX` when it holds exactly 12 digits,
/// otherwise return it unchanged.
pub fn format_id_number(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != ID_NUMBER_DIGITS {
        return value.to_string();
    }
    digits
        .chunks(GROUP_SIZE)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

const VERHOEFF_D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const VERHOEFF_P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Verhoeff check over a digit string (check digit last).
pub fn verhoeff_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut check = 0u8;
    for (i, byte) in digits.bytes().rev().enumerate() {
        let digit = (byte - b'0') as usize;
        check = VERHOEFF_D[check as usize][VERHOEFF_P[i % 8][digit] as usize];
    }
    check == 0
}

/// Whether a canonical ID number could have been issued: it never starts
/// with 0 or 1 and carries a valid Verhoeff check digit.
pub fn is_plausible_id_number(digits: &str) -> bool {
    digits.len() == ID_NUMBER_DIGITS
        && !digits.starts_with(['0', '1'])
        && verhoeff_valid(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_interior_whitespace() {
        assert_eq!(normalize_id_number("1234 5678 9012").as_deref(), Some("123456789012"));
        assert_eq!(normalize_id_number("1234\t56789  012").as_deref(), Some("123456789012"));
        assert_eq!(normalize_id_number("1234 5678 901"), None);
        assert_eq!(normalize_id_number("1234-5678-9012"), None);
    }

    #[test]
    fn formatting_groups_and_round_trips() {
        let samples = [
            "123456789012",
            "1234 5678 9012",
            " 12 3456 78901 2 ",
            "1\n2\t3 4 5 6 7 8 9 0 1 2",
        ];
        for raw in samples {
            let digits = normalize_id_number(raw).unwrap();
            let formatted = format_id_number(&digits);
            let groups: Vec<&str> = formatted.split(' ').collect();
            assert_eq!(groups.len(), 3, "{formatted}");
            assert!(groups.iter().all(|g| g.len() == 4));
            let restripped: String = formatted.chars().filter(|c| !c.is_whitespace()).collect();
            assert_eq!(restripped, digits);
        }
    }

    #[test]
    fn formatting_leaves_other_lengths_alone() {
        assert_eq!(format_id_number("12345"), "12345");
        assert_eq!(format_id_number("9111 2222 3333 4444"), "9111 2222 3333 4444");
    }

    #[test]
    fn verhoeff_known_values() {
        assert!(verhoeff_valid("2363"));
        assert!(!verhoeff_valid("2364"));
        assert!(is_plausible_id_number("234123412346"));
        assert!(is_plausible_id_number("498765432102"));
        assert!(!is_plausible_id_number("234123412347"));
        // Valid check digit but an impossible leading digit.
        assert!(verhoeff_valid("123456789099"));
        assert!(!is_plausible_id_number("123456789099"));
    }
}
