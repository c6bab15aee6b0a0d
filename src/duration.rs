//! Parse durations members write in chat, e.g. `2시간`, `90분`, `1시간 30분 할게요`

const HOUR_UNIT: &str = "시간";
const MINUTE_UNIT: &str = "분";

/// Total minutes declared in `text`, or `None` when it declares nothing.
///
/// The first `N시간` and the first `N분` are summed; anything else is ignored.
pub fn parse_minutes(text: &str) -> Option<u32> {
    let hours = first_amount(text, HOUR_UNIT).unwrap_or(0);
    let minutes = first_amount(text, MINUTE_UNIT).unwrap_or(0);

    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    (total > 0).then_some(total)
}

/// The number immediately in front of the first occurrence of `unit` that has one.
fn first_amount(text: &str, unit: &str) -> Option<u32> {
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find(unit) {
        let unit_start = search_from + found;
        let before = text[..unit_start].trim_end();
        let digits_start = before
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i);

        if let Some(start) = digits_start {
            if let Ok(amount) = before[start..].parse() {
                return Some(amount);
            }
        }
        search_from = unit_start + unit.len();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_and_minutes() {
        assert_eq!(parse_minutes("2시간"), Some(120));
        assert_eq!(parse_minutes("90분"), Some(90));
        assert_eq!(parse_minutes("1시간 30분 할게요"), Some(90));
        assert_eq!(parse_minutes("오늘 3 시간"), Some(180));
    }

    #[test]
    fn nothing_declared() {
        assert_eq!(parse_minutes("공부 시작합니다"), None);
        assert_eq!(parse_minutes("시간 없음"), None);
        assert_eq!(parse_minutes("0분"), None);
        assert_eq!(parse_minutes(""), None);
    }

    #[test]
    fn skips_bare_units() {
        assert_eq!(parse_minutes("시간 말고 45분"), Some(45));
        assert_eq!(parse_minutes("몇 시간? 2시간"), Some(120));
    }

    #[test]
    fn absurd_numbers_are_rejected() {
        assert_eq!(parse_minutes("99999999999시간"), None);
    }
}
