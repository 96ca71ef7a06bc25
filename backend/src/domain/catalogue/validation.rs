//! Catalogue forms and the drafts they validate into.

use chrono::Datelike;
use mockable::Clock;

use crate::domain::{Error, FieldErrors};

/// Minimum length of titles and names once trimmed.
pub const MIN_NAME_LENGTH: usize = 2;
/// Maximum book title length.
pub const TITLE_MAX: usize = 200;
/// Maximum author name length.
pub const AUTHOR_NAME_MAX: usize = 100;
/// Maximum library name length.
pub const LIBRARY_NAME_MAX: usize = 200;
/// Maximum librarian name length.
pub const LIBRARIAN_NAME_MAX: usize = 100;
/// Earliest accepted publication year.
pub const MIN_PUBLICATION_YEAR: i32 = 1000;
/// Search queries are truncated to this many characters.
pub const SEARCH_QUERY_MAX: usize = 200;

/// Latest accepted publication year: ten years past the clock's current year.
pub fn publication_year_ceiling(clock: &dyn Clock) -> i32 {
    clock.utc().year() + 10
}

fn check_name(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
    max: usize,
) -> String {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    if length < MIN_NAME_LENGTH {
        errors.add(
            field,
            format!("{label} must be at least {MIN_NAME_LENGTH} characters long."),
        );
    } else if length > max {
        errors.add(field, format!("{label} must be {max} characters or less."));
    }
    trimmed.to_owned()
}

/// Raw book input as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,
}

/// Validated book ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author_name: String,
    pub publication_year: Option<i32>,
}

impl BookForm {
    /// Validate every field against `max_year`, reporting all failures.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::BookForm;
    ///
    /// let form = BookForm {
    ///     title: " 1984 ".into(),
    ///     author: "George Orwell".into(),
    ///     publication_year: Some(1949),
    /// };
    /// let draft = form.validate(2035).unwrap();
    /// assert_eq!(draft.title, "1984");
    /// ```
    pub fn validate(self, max_year: i32) -> Result<BookDraft, Error> {
        let mut errors = FieldErrors::default();
        let title = check_name(&mut errors, "title", "Title", &self.title, TITLE_MAX);
        let author_name = check_name(
            &mut errors,
            "author",
            "Author name",
            &self.author,
            AUTHOR_NAME_MAX,
        );
        let out_of_range = self
            .publication_year
            .is_some_and(|year| !(MIN_PUBLICATION_YEAR..=max_year).contains(&year));
        if out_of_range {
            errors.add(
                "publication_year",
                format!("Publication year must be between {MIN_PUBLICATION_YEAR} and {max_year}."),
            );
        }
        errors.into_result(BookDraft {
            title,
            author_name,
            publication_year: self.publication_year,
        })
    }
}

/// Book list filter: free-text search plus an exact author match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    search: Option<String>,
    author: Option<String>,
}

impl BookFilter {
    /// Normalise raw query parameters.
    ///
    /// The search text is trimmed and truncated to [`SEARCH_QUERY_MAX`]
    /// characters; blank values are dropped.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::BookFilter;
    ///
    /// let filter = BookFilter::new(Some("  orwell "), None);
    /// assert_eq!(filter.search(), Some("orwell"));
    /// assert!(BookFilter::new(Some("   "), Some("")).is_unfiltered());
    /// ```
    pub fn new(search: Option<&str>, author: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.chars().take(SEARCH_QUERY_MAX).collect::<String>());
        let author = author
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Self { search, author }
    }

    /// Filter for books by one author name.
    pub fn by_author(name: &str) -> Self {
        Self::new(None, Some(name))
    }

    /// Case-insensitive substring matched against title or author name.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Exact author name.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.author.is_none()
    }

    /// Whether a book with `title` by `author_name` passes the filter.
    ///
    /// Stores that cannot push the filter down evaluate it with this.
    pub fn matches(&self, title: &str, author_name: &str) -> bool {
        let author_ok = self.author.as_deref().is_none_or(|wanted| wanted == author_name);
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            title.to_lowercase().contains(&needle) || author_name.to_lowercase().contains(&needle)
        });
        author_ok && search_ok
    }
}

/// Raw library input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryForm {
    pub name: String,
}

/// Validated library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDraft {
    pub name: String,
}

impl LibraryForm {
    pub fn validate(self) -> Result<LibraryDraft, Error> {
        let mut errors = FieldErrors::default();
        let name = check_name(&mut errors, "name", "Library name", &self.name, LIBRARY_NAME_MAX);
        errors.into_result(LibraryDraft { name })
    }
}

/// Raw librarian input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarianForm {
    pub name: String,
}

/// Validated librarian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarianDraft {
    pub name: String,
}

impl LibrarianForm {
    pub fn validate(self) -> Result<LibrarianDraft, Error> {
        let mut errors = FieldErrors::default();
        let name = check_name(
            &mut errors,
            "name",
            "Librarian name",
            &self.name,
            LIBRARIAN_NAME_MAX,
        );
        errors.into_result(LibrarianDraft { name })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[fixture]
    fn max_year() -> i32 {
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        );
        publication_year_ceiling(&clock)
    }

    fn form(title: &str, author: &str, year: Option<i32>) -> BookForm {
        BookForm {
            title: title.to_owned(),
            author: author.to_owned(),
            publication_year: year,
        }
    }

    fn field_messages(err: &crate::domain::Error, field: &str) -> Vec<String> {
        err.details()
            .and_then(|details| details.get("fields"))
            .and_then(|fields| fields.get(field))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[rstest]
    fn ceiling_is_ten_years_past_clock(max_year: i32) {
        assert_eq!(max_year, 2036);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(1000))]
    #[case(Some(1949))]
    #[case(Some(2036))]
    fn accepts_years_in_range(max_year: i32, #[case] year: Option<i32>) {
        let draft = form("1984", "George Orwell", year)
            .validate(max_year)
            .expect("valid form");
        assert_eq!(draft.publication_year, year);
    }

    #[rstest]
    #[case(999)]
    #[case(2037)]
    #[case(-5)]
    fn rejects_years_out_of_range(max_year: i32, #[case] year: i32) {
        let err = form("1984", "George Orwell", Some(year))
            .validate(max_year)
            .expect_err("year out of range");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            field_messages(&err, "publication_year"),
            vec!["Publication year must be between 1000 and 2036.".to_owned()]
        );
    }

    #[rstest]
    fn trims_before_measuring(max_year: i32) {
        let err = form("  a  ", " b ", None)
            .validate(max_year)
            .expect_err("too short once trimmed");
        assert_eq!(
            field_messages(&err, "title"),
            vec!["Title must be at least 2 characters long.".to_owned()]
        );
        assert_eq!(
            field_messages(&err, "author"),
            vec!["Author name must be at least 2 characters long.".to_owned()]
        );
    }

    #[rstest]
    fn reports_overlong_fields_together(max_year: i32) {
        let err = form(&"t".repeat(TITLE_MAX + 1), &"a".repeat(AUTHOR_NAME_MAX + 1), Some(1))
            .validate(max_year)
            .expect_err("everything wrong");
        let fields = err
            .details()
            .and_then(|details| details.get("fields"))
            .cloned()
            .expect("fields");
        assert_eq!(
            fields,
            json!({
                "author": ["Author name must be 100 characters or less."],
                "publication_year": ["Publication year must be between 1000 and 2036."],
                "title": ["Title must be 200 characters or less."],
            })
        );
    }

    #[rstest]
    fn search_is_truncated_to_limit() {
        let raw = format!("  {}  ", "x".repeat(SEARCH_QUERY_MAX + 50));
        let filter = BookFilter::new(Some(&raw), None);
        assert_eq!(filter.search().map(str::len), Some(SEARCH_QUERY_MAX));
    }

    #[rstest]
    #[case(BookFilter::new(Some("orw"), None), true)]
    #[case(BookFilter::new(Some("NINETEEN"), None), false)]
    #[case(BookFilter::new(Some("198"), None), true)]
    #[case(BookFilter::by_author("George Orwell"), true)]
    #[case(BookFilter::by_author("george orwell"), false)]
    #[case(BookFilter::default(), true)]
    fn filter_matches_title_or_author(#[case] filter: BookFilter, #[case] expected: bool) {
        assert_eq!(filter.matches("1984", "George Orwell"), expected);
    }

    #[rstest]
    #[case("x", false)]
    #[case("Central", true)]
    fn library_names_need_two_characters(#[case] name: &str, #[case] ok: bool) {
        let result = LibraryForm {
            name: name.to_owned(),
        }
        .validate();
        assert_eq!(result.is_ok(), ok);
    }

    #[rstest]
    fn librarian_names_are_capped() {
        let err = LibrarianForm {
            name: "n".repeat(LIBRARIAN_NAME_MAX + 1),
        }
        .validate()
        .expect_err("too long");
        assert_eq!(
            field_messages(&err, "name"),
            vec!["Librarian name must be 100 characters or less.".to_owned()]
        );
    }
}
