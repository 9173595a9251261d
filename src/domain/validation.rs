//! Field-level invariants shared by every entry point that creates or edits
//! catalogue entities.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use super::error::DomainError;

pub const AUTHOR_NAME_MAX_CHARS: usize = 100;
pub const BIOGRAPHY_MAX_CHARS: usize = 2000;
pub const BOOK_TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const ISBN_LEN: usize = 13;
pub const EARLIEST_PUBLICATION_YEAR: i32 = 1450;
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 128;

const CALENDAR_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn author_name(raw: &str) -> Result<String, DomainError> {
    required_text("name", raw, AUTHOR_NAME_MAX_CHARS)
}

pub fn biography(raw: &str) -> Result<String, DomainError> {
    optional_text("biography", raw, BIOGRAPHY_MAX_CHARS)
}

pub fn book_title(raw: &str) -> Result<String, DomainError> {
    required_text("title", raw, BOOK_TITLE_MAX_CHARS)
}

pub fn description(raw: &str) -> Result<String, DomainError> {
    optional_text("description", raw, DESCRIPTION_MAX_CHARS)
}

pub fn comment(raw: &str) -> Result<String, DomainError> {
    optional_text("comment", raw, COMMENT_MAX_CHARS)
}

/// ISBN-13: exactly thirteen ASCII digits, no separators.
pub fn isbn(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.len() != ISBN_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::validation(
            "isbn",
            format!("must be exactly {ISBN_LEN} digits"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Accepts years from the first printed books up to `current_year`.
pub fn publication_year(year: i32, current_year: i32) -> Result<i32, DomainError> {
    if !(EARLIEST_PUBLICATION_YEAR..=current_year).contains(&year) {
        return Err(DomainError::validation(
            "publication_year",
            format!("must be between {EARLIEST_PUBLICATION_YEAR} and {current_year}"),
        ));
    }
    Ok(year)
}

pub fn rating(value: i32) -> Result<i32, DomainError> {
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        return Err(DomainError::validation(
            "rating",
            format!("must be between {RATING_MIN} and {RATING_MAX}"),
        ));
    }
    Ok(value)
}

pub fn username(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&chars) {
        return Err(DomainError::validation(
            "username",
            format!("must be {USERNAME_MIN_CHARS} to {USERNAME_MAX_CHARS} characters"),
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(DomainError::validation(
            "username",
            "may only contain letters, digits, `_`, `-` and `.`",
        ));
    }
    Ok(trimmed.to_string())
}

/// Emails are compared case-insensitively, so they are stored lowercased.
pub fn email(raw: &str) -> Result<String, DomainError> {
    let normalized = raw.trim().to_lowercase();
    let invalid = || DomainError::validation("email", "must be a valid email address");

    if normalized.is_empty()
        || normalized.chars().count() > EMAIL_MAX_CHARS
        || normalized.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(normalized)
}

pub fn password(raw: &str) -> Result<&str, DomainError> {
    let chars = raw.chars().count();
    if chars < PASSWORD_MIN_CHARS {
        return Err(DomainError::validation(
            "password",
            format!("must be at least {PASSWORD_MIN_CHARS} characters"),
        ));
    }
    if chars > PASSWORD_MAX_CHARS {
        return Err(DomainError::validation(
            "password",
            format!("must be at most {PASSWORD_MAX_CHARS} characters"),
        ));
    }
    Ok(raw)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn calendar_date(field: &'static str, raw: &str) -> Result<Date, DomainError> {
    Date::parse(raw.trim(), CALENDAR_DATE)
        .map_err(|_| DomainError::validation(field, "must be a valid date in YYYY-MM-DD format"))
}

pub fn format_calendar_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Entity ids are positive integers assigned by the store.
pub fn entity_id(raw: &str) -> Result<i64, DomainError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DomainError::validation("id", "must be a positive integer")),
    }
}

fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    bounded(field, trimmed, max)
}

/// Free text is kept byte-for-byte; only its length is checked.
fn optional_text(field: &'static str, raw: &str, max: usize) -> Result<String, DomainError> {
    bounded(field, raw, max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn author_name_is_trimmed_and_bounded() {
        assert_eq!(author_name("  Orwell ").unwrap(), "Orwell");
        assert!(author_name("   ").is_err());
        assert!(author_name(&"x".repeat(AUTHOR_NAME_MAX_CHARS + 1)).is_err());
        assert!(author_name(&"x".repeat(AUTHOR_NAME_MAX_CHARS)).is_ok());
    }

    #[test]
    fn free_text_keeps_surrounding_whitespace() {
        assert_eq!(biography("  Essayist.\n").unwrap(), "  Essayist.\n");
        assert_eq!(comment(" ").unwrap(), " ");
        assert!(description(&" ".repeat(DESCRIPTION_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn isbn_requires_thirteen_digits() {
        assert_eq!(isbn("9780451524935").unwrap(), "9780451524935");
        assert!(isbn("").is_err());
        assert!(isbn("978045152493").is_err());
        assert!(isbn("97804515249355").is_err());
        assert!(isbn("978-045152493").is_err());
    }

    #[test]
    fn publication_year_window() {
        assert!(publication_year(1449, 2026).is_err());
        assert!(publication_year(1450, 2026).is_ok());
        assert!(publication_year(2026, 2026).is_ok());
        assert!(publication_year(2027, 2026).is_err());
    }

    #[test]
    fn rating_range() {
        assert!(rating(0).is_err());
        assert!(rating(1).is_ok());
        assert!(rating(5).is_ok());
        assert!(rating(6).is_err());
    }

    #[test]
    fn calendar_dates_round_trip_through_formatter() {
        let parsed = calendar_date("birth_date", "1903-06-25").unwrap();
        assert_eq!(parsed.year(), 1903);
        assert_eq!(parsed.month(), Month::June);
        assert_eq!(parsed.day(), 25);
        assert_eq!(format_calendar_date(parsed), "1903-06-25");
        let early = Date::from_calendar_date(999, Month::January, 2).unwrap();
        assert_eq!(format_calendar_date(early), "0999-01-02");
    }

    #[test]
    fn calendar_date_rejects_other_layouts() {
        assert!(calendar_date("birth_date", "25/06/1903").is_err());
        assert!(calendar_date("birth_date", "1903-02-30").is_err());
        assert!(calendar_date("birth_date", "").is_err());
    }

    #[test]
    fn email_normalization_and_shape() {
        assert_eq!(email(" Reader@Example.COM ").unwrap(), "reader@example.com");
        assert!(email("reader.example.com").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("reader@").is_err());
        assert!(email("a@b@c").is_err());
        assert!(email("re ader@example.com").is_err());
    }

    #[test]
    fn username_and_password_bounds() {
        assert!(username("ab").is_err());
        assert!(username("reader_01").is_ok());
        assert!(username("bad name").is_err());
        assert!(password("12345").is_err());
        assert!(password("123456").is_ok());
    }

    #[test]
    fn entity_ids_must_be_positive_integers() {
        assert_eq!(entity_id("42").unwrap(), 42);
        assert!(entity_id("0").is_err());
        assert!(entity_id("-3").is_err());
        assert!(entity_id("abc").is_err());
    }
}
