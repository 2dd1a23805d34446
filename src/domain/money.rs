use std::fmt;

/// Money is kept in whole Rupiah. There is no minor unit to worry about,
/// so every amount and balance is a plain signed integer.
pub type Rupiah = i64;

/// Format an amount the way Indonesian receipts do.
/// Example: 50000 -> "Rp50.000", -1500 -> "-Rp1.500"
pub fn format_rupiah(amount: Rupiah) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}Rp{}", sign, grouped)
}

/// Parse free-form amount text into a positive number of Rupiah.
///
/// Every character that is not a digit is dropped, so "50.000", "50000" and
/// "Rp 50,000" all read as 50000. A minus sign in front of the first digit
/// makes the amount negative, which is rejected.
pub fn parse_amount(input: &str) -> Result<Rupiah, ParseAmountError> {
    let first_digit = input.find(|c: char| c.is_ascii_digit());
    let prefix = match first_digit {
        Some(pos) => &input[..pos],
        None => return Err(ParseAmountError::NoDigits),
    };
    if prefix.contains('-') {
        return Err(ParseAmountError::Negative);
    }

    let cleaned: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    let amount: Rupiah = cleaned.parse().map_err(|_| ParseAmountError::TooLarge)?;

    if amount <= 0 {
        return Err(ParseAmountError::NotPositive);
    }
    Ok(amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAmountError {
    NoDigits,
    Negative,
    NotPositive,
    TooLarge,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::NoDigits => write!(f, "amount contains no digits"),
            ParseAmountError::Negative => write!(f, "amount must not be negative"),
            ParseAmountError::NotPositive => write!(f, "amount must be greater than zero"),
            ParseAmountError::TooLarge => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
