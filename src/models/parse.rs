// Lenient field parsing: never fails, degrades to zero.

/// Longest kept prefix of a sanitized text field, in characters.
pub const MAX_TEXT_LEN: usize = 255;

/// Strip `<` and `>`, then keep the first [`MAX_TEXT_LEN`] characters.
pub fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .take(MAX_TEXT_LEN)
        .collect()
}

/// Leading integer of `raw` (`"42abc"` -> 42, `" -7"` -> -7); 0 when there is none.
/// Values beyond the `i64` range saturate at its bounds.
pub fn parse_int(raw: Option<&str>) -> i64 {
    let Some(s) = raw.map(str::trim_start) else {
        return 0;
    };
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits_len = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return 0;
    }
    let literal = &s[..sign_len + digits_len];
    // Only overflow can fail here.
    literal.parse().unwrap_or(if literal.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Leading decimal literal of `raw` (`"1.5GB"` -> 1.5, `"2e3"` -> 2000.0); 0.0 when
/// there is none or the value is not finite.
pub fn parse_float(raw: Option<&str>) -> f64 {
    let Some(s) = raw.map(str::trim_start) else {
        return 0.0;
    };
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(s.starts_with(['+', '-']));
    let int_len = digits_from(end);
    end += int_len;
    let mut frac_len = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_len = digits_from(end + 1);
        if int_len > 0 || frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    if int_len == 0 && frac_len == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_len = digits_from(exp_end);
        if exp_len > 0 {
            end = exp_end + exp_len;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
