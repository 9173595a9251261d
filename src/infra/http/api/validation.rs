//! Turns request bodies into validated service commands.

use libris_api_types::{
    CreateAuthorRequest, CreateBookRequest, CreateReviewRequest, LoginRequest, RegisterRequest,
    UpdateAuthorRequest, UpdateBookRequest, UpdateReviewRequest,
};
use time::{Date, OffsetDateTime};

use crate::application::auth::{LoginCommand, RegisterCommand};
use crate::application::authors::{CreateAuthorCommand, UpdateAuthorCommand};
use crate::application::books::{CreateBookCommand, UpdateBookCommand};
use crate::application::reviews::{CreateReviewCommand, UpdateReviewCommand};
use crate::domain::error::DomainError;
use crate::domain::validation;

use super::error::ApiError;

pub(crate) fn path_id(raw: &str) -> Result<i64, ApiError> {
    validation::entity_id(raw).map_err(|_| ApiError::invalid_id(raw))
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn register_command(request: RegisterRequest) -> Result<RegisterCommand, DomainError> {
    Ok(RegisterCommand {
        username: validation::username(&request.username)?,
        email: validation::email(&request.email)?,
        password: validation::password(&request.password)?.to_string(),
    })
}

/// Only shape is checked here; length rules would leak which accounts exist.
pub(crate) fn login_command(request: LoginRequest) -> Result<LoginCommand, DomainError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email", "must not be empty"));
    }
    if request.password.is_empty() {
        return Err(DomainError::validation("password", "must not be empty"));
    }
    Ok(LoginCommand {
        email,
        password: request.password,
    })
}

pub(crate) fn create_author_command(
    request: CreateAuthorRequest,
    today: Date,
) -> Result<CreateAuthorCommand, DomainError> {
    Ok(CreateAuthorCommand {
        name: validation::author_name(&request.name)?,
        biography: validation::biography(request.biography.as_deref().unwrap_or_default())?,
        birth_date: request
            .birth_date
            .as_deref()
            .map(|raw| birth_date(raw, today))
            .transpose()?,
    })
}

pub(crate) fn update_author_command(
    request: UpdateAuthorRequest,
    today: Date,
) -> Result<UpdateAuthorCommand, DomainError> {
    Ok(UpdateAuthorCommand {
        name: request
            .name
            .as_deref()
            .map(validation::author_name)
            .transpose()?,
        biography: request
            .biography
            .as_deref()
            .map(validation::biography)
            .transpose()?,
        birth_date: request
            .birth_date
            .as_deref()
            .map(|raw| birth_date(raw, today))
            .transpose()?,
    })
}

pub(crate) fn create_book_command(
    request: CreateBookRequest,
    today: Date,
) -> Result<CreateBookCommand, DomainError> {
    Ok(CreateBookCommand {
        title: validation::book_title(&request.title)?,
        author_id: author_ref(request.author_id)?,
        isbn: validation::isbn(&request.isbn)?,
        publication_year: validation::publication_year(request.publication_year, today.year())?,
        description: validation::description(request.description.as_deref().unwrap_or_default())?,
    })
}

pub(crate) fn update_book_command(
    request: UpdateBookRequest,
    today: Date,
) -> Result<UpdateBookCommand, DomainError> {
    Ok(UpdateBookCommand {
        title: request
            .title
            .as_deref()
            .map(validation::book_title)
            .transpose()?,
        author_id: request.author_id.map(author_ref).transpose()?,
        isbn: request.isbn.as_deref().map(validation::isbn).transpose()?,
        publication_year: request
            .publication_year
            .map(|year| validation::publication_year(year, today.year()))
            .transpose()?,
        description: request
            .description
            .as_deref()
            .map(validation::description)
            .transpose()?,
    })
}

/// An omitted `date_posted` defaults to `today`.
pub(crate) fn create_review_command(
    request: CreateReviewRequest,
    today: Date,
) -> Result<CreateReviewCommand, DomainError> {
    Ok(CreateReviewCommand {
        rating: validation::rating(request.rating)?,
        comment: validation::comment(request.comment.as_deref().unwrap_or_default())?,
        date_posted: match request.date_posted.as_deref() {
            Some(raw) => validation::calendar_date("date_posted", raw)?,
            None => today,
        },
    })
}

pub(crate) fn update_review_command(
    request: UpdateReviewRequest,
) -> Result<UpdateReviewCommand, DomainError> {
    Ok(UpdateReviewCommand {
        rating: request.rating.map(validation::rating).transpose()?,
        comment: request
            .comment
            .as_deref()
            .map(validation::comment)
            .transpose()?,
        date_posted: request
            .date_posted
            .as_deref()
            .map(|raw| validation::calendar_date("date_posted", raw))
            .transpose()?,
    })
}

fn birth_date(raw: &str, today: Date) -> Result<Date, DomainError> {
    let date = validation::calendar_date("birth_date", raw)?;
    if date > today {
        return Err(DomainError::validation(
            "birth_date",
            "must not be in the future",
        ));
    }
    Ok(date)
}

fn author_ref(id: i64) -> Result<i64, DomainError> {
    if id <= 0 {
        return Err(DomainError::validation(
            "author_id",
            "must be a positive integer",
        ));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn today() -> Date {
        Date::from_calendar_date(2026, Month::March, 1).unwrap()
    }

    fn book_request(isbn: &str, year: i32) -> CreateBookRequest {
        CreateBookRequest {
            title: "Nineteen Eighty-Four".into(),
            author_id: 1,
            isbn: isbn.into(),
            publication_year: year,
            description: None,
        }
    }

    #[test]
    fn path_ids_must_be_positive_integers() {
        assert_eq!(path_id("42").unwrap(), 42);
        assert!(path_id("0").is_err());
        assert!(path_id("-3").is_err());
        assert!(path_id("abc").is_err());
    }

    #[test]
    fn create_author_parses_birth_date() {
        let command = create_author_command(
            CreateAuthorRequest {
                name: " Orwell ".into(),
                biography: None,
                birth_date: Some("1903-06-25".into()),
            },
            today(),
        )
        .unwrap();

        assert_eq!(command.name, "Orwell");
        assert_eq!(command.biography, "");
        assert_eq!(
            command.birth_date,
            Some(Date::from_calendar_date(1903, Month::June, 25).unwrap())
        );
    }

    #[test]
    fn create_author_rejects_future_and_malformed_dates() {
        for raw in ["2999-01-01", "25/06/1903", "1903-13-01"] {
            let result = create_author_command(
                CreateAuthorRequest {
                    name: "Orwell".into(),
                    biography: None,
                    birth_date: Some(raw.into()),
                },
                today(),
            );
            assert!(result.is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn create_book_checks_isbn_and_year() {
        assert!(create_book_command(book_request("9780451524935", 1949), today()).is_ok());
        assert!(create_book_command(book_request("978045152493", 1949), today()).is_err());
        assert!(create_book_command(book_request("9780451524935", 1200), today()).is_err());
        assert!(create_book_command(book_request("9780451524935", 2027), today()).is_err());
    }

    #[test]
    fn update_book_only_validates_present_fields() {
        let command = update_book_command(
            UpdateBookRequest {
                title: Some("Animal Farm".into()),
                ..UpdateBookRequest::default()
            },
            today(),
        )
        .unwrap();
        assert_eq!(command.title.as_deref(), Some("Animal Farm"));
        assert!(command.isbn.is_none());

        let err = update_book_command(
            UpdateBookRequest {
                isbn: Some("123".into()),
                ..UpdateBookRequest::default()
            },
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "isbn", .. }));
    }

    #[test]
    fn review_date_defaults_to_today() {
        let command = create_review_command(
            CreateReviewRequest {
                rating: 5,
                comment: Some("Chilling".into()),
                date_posted: None,
            },
            today(),
        )
        .unwrap();
        assert_eq!(command.date_posted, today());

        let err = create_review_command(
            CreateReviewRequest {
                rating: 6,
                comment: None,
                date_posted: None,
            },
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "rating", .. }));
    }

    #[test]
    fn register_normalizes_email() {
        let command = register_command(RegisterRequest {
            username: "winston".into(),
            email: " Winston@Minitrue.example ".into(),
            password: "bigbrother".into(),
        })
        .unwrap();
        assert_eq!(command.email, "winston@minitrue.example");

        assert!(
            register_command(RegisterRequest {
                username: "winston".into(),
                email: "winston@minitrue.example".into(),
                password: "short".into(),
            })
            .is_err()
        );
    }
}
