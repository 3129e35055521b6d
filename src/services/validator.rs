//! Field-level rule accumulator used by every write path before mutation.
//!
//! Rules never short-circuit: a request is checked against all of them and
//! the first failure recorded for each field is reported back together.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::OnceLock;

/// Field name to message, in stable key order.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` under `key` unless that key already has one.
    pub fn add_error(&mut self, key: &str, message: &str) {
        self.errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    /// `Ok(())` when no rule failed, otherwise the collected field map.
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.valid() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("Invalid regex")
    })
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// True when no value occurs twice.
pub fn unique<I, T>(values: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash,
{
    let mut seen = HashSet::new();
    values.into_iter().all(|value| seen.insert(value))
}

pub const USERNAME_MAX_CHARS: usize = 10;
pub const PASSWORD_MIN_BYTES: usize = 11;
pub const PASSWORD_MAX_BYTES: usize = 71;
pub const TITLE_MAX_CHARS: usize = 99;

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(valid_email(email), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() <= PASSWORD_MAX_BYTES,
        "password",
        "must not be greater than 72 characters long",
    );
    v.check(
        password.len() >= PASSWORD_MIN_BYTES,
        "password",
        "must be greater than 10 characters long",
    );
}

pub fn validate_user(v: &mut Validator, username: &str, email: &str, password: &str) {
    v.check(!username.is_empty(), "username", "must be provided");
    v.check(
        username.chars().count() <= USERNAME_MAX_CHARS,
        "username",
        "must not be greater than 10 characters long",
    );
    validate_email(v, email);
    validate_password_plaintext(v, password);
}

pub fn validate_idea(v: &mut Validator, title: &str, description: &str, tags: &[String]) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.chars().count() <= TITLE_MAX_CHARS,
        "title",
        "must be smaller than 100 characters",
    );
    v.check(!description.is_empty(), "description", "must be provided");
    v.check(!tags.is_empty(), "tags", "must be provided");
    v.check(
        tags.iter().all(|tag| !tag.is_empty()),
        "tags",
        "tag title must be provided",
    );
    v.check(unique(tags.iter()), "tags", "tag title must be unique");
}

pub fn validate_password_reset(v: &mut Validator, token: &str, password: &str) {
    v.check(!token.is_empty(), "token", "must be provided");
    validate_password_plaintext(v, password);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn first_error_per_key_wins() {
        let mut v = Validator::new();
        v.check(false, "name", "first");
        v.check(false, "name", "second");
        v.check(true, "other", "never");

        assert!(!v.valid());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["name"], "first");
    }

    #[test]
    fn empty_validator_is_valid() {
        let v = Validator::new();
        assert!(v.valid());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn email_pattern() {
        assert!(valid_email("alice@example.com"));
        assert!(valid_email("a.b+c@sub.example.org"));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("alice@-example.com"));
    }

    #[test]
    fn unique_detects_repeats() {
        assert!(unique(["a", "b", "c"]));
        assert!(!unique(["a", "b", "a"]));
        assert!(unique(Vec::<&str>::new()));
    }

    #[test]
    fn user_rules() {
        let mut v = Validator::new();
        validate_user(&mut v, "alice", "alice@example.com", "longenoughpw123");
        assert!(v.valid());

        let mut v = Validator::new();
        validate_user(&mut v, "", "nope", "short");
        let errors = v.into_errors();
        assert_eq!(errors["username"], "must be provided");
        assert_eq!(errors["email"], "must be a valid email address");
        assert_eq!(errors["password"], "must be greater than 10 characters long");

        let mut v = Validator::new();
        validate_user(
            &mut v,
            "elevenchars",
            "alice@example.com",
            &"x".repeat(PASSWORD_MAX_BYTES + 1),
        );
        let errors = v.into_errors();
        assert_eq!(errors["username"], "must not be greater than 10 characters long");
        assert_eq!(errors["password"], "must not be greater than 72 characters long");
    }

    #[test]
    fn password_boundaries() {
        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"x".repeat(PASSWORD_MIN_BYTES));
        assert!(v.valid());

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"x".repeat(PASSWORD_MAX_BYTES));
        assert!(v.valid());

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"x".repeat(PASSWORD_MIN_BYTES - 1));
        assert!(!v.valid());
    }

    #[test]
    fn idea_rules_report_distinct_fields() {
        let mut v = Validator::new();
        validate_idea(&mut v, "title", "description", &tags(&["go"]));
        assert!(v.valid());

        let mut v = Validator::new();
        validate_idea(&mut v, "", "", &[]);
        let errors = v.into_errors();
        assert_eq!(errors["title"], "must be provided");
        assert_eq!(errors["description"], "must be provided");
        assert_eq!(errors["tags"], "must be provided");

        let mut v = Validator::new();
        validate_idea(&mut v, &"t".repeat(100), "d", &tags(&["go", "go"]));
        let errors = v.into_errors();
        assert_eq!(errors["title"], "must be smaller than 100 characters");
        assert_eq!(errors["tags"], "tag title must be unique");

        let mut v = Validator::new();
        validate_idea(&mut v, &"t".repeat(99), "d", &tags(&["go", ""]));
        let errors = v.into_errors();
        assert!(!errors.contains_key("title"));
        assert_eq!(errors["tags"], "tag title must be provided");
    }

    #[test]
    fn reset_rules() {
        let mut v = Validator::new();
        validate_password_reset(&mut v, "", "longenoughpw123");
        assert_eq!(v.errors()["token"], "must be provided");
    }
}
