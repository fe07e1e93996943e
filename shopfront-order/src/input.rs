//! Keystroke normalizers for the payment form fields.

const CARD_DIGITS: usize = 16;
const EXPIRY_DIGITS: usize = 4;
const CVV_DIGITS: usize = 4;

fn digits(value: &str, max: usize) -> String {
    value.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// Keep up to 16 digits and group them in fours: `4111 1111 1111 1111`.
pub fn format_card_number(value: &str) -> String {
    let digits: Vec<char> = digits(value, CARD_DIGITS).chars().collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep up to four digits and insert the slash once the month is typed: `09/27`.
pub fn format_expiry(value: &str) -> String {
    let digits = digits(value, EXPIRY_DIGITS);
    if digits.len() >= 2 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

pub fn sanitize_cvv(value: &str) -> String {
    digits(value, CVV_DIGITS)
}
