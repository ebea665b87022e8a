//! Locale-independent conversion of raw configuration values.
//!
//! Numbers are read from the leading numeric part of the text, so trailing
//! notes such as `8080 ; http` are ignored. Text without a leading number
//! yields zero (or an empty value). Callers that need to tell "missing" from
//! "malformed" must check for the key first.

/// Parses the leading integer of `value` in the given radix.
///
/// Leading whitespace and one sign are skipped, and a `0x`/`0X` prefix is
/// accepted when `radix` is 16. Parsing stops at the first character that is
/// not a digit of the radix. Values beyond the `i64` range saturate.
/// Unsupported radixes and text without leading digits yield zero.
pub fn parse_integer(value: &str, radix: u32) -> i64 {
    if !(2..=36).contains(&radix) {
        return 0;
    }

    let text = value.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let rest = if radix == 16 {
        rest.strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
            .unwrap_or(rest)
    } else {
        rest
    };

    let end = rest
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }

    let parsed = if negative {
        i64::from_str_radix(&format!("-{digits}"), radix)
    } else {
        i64::from_str_radix(digits, radix)
    };
    // Every character is a valid digit, so the only failure left is overflow.
    parsed.unwrap_or(if negative { i64::MIN } else { i64::MAX })
}

/// Parses the leading decimal floating point number of `value`, yielding
/// `0.0` when there is none.
pub fn parse_double(value: &str) -> f64 {
    let text = value.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = count_digits(&bytes[end..]);
    end += whole;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = count_digits(&bytes[end + 1..]);
        end += 1 + fraction;
    }
    if whole + fraction == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = count_digits(&bytes[exponent..]);
        if digits > 0 {
            end = exponent + digits;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Decodes hex text (either case), yielding an empty vector on failure.
pub fn from_hex(value: &str) -> Vec<u8> {
    hex::decode(value.trim()).unwrap_or_default()
}
