//! Validation engine: per-entity rule tables and their evaluation.
//!
//! # Responsibility
//! - Hold the presence/format/uniqueness/numeric rules for each entity kind.
//! - Evaluate every rule against a record and collect all violations.
//!
//! # Invariants
//! - Evaluation never mutates the record or the store.
//! - Violations are collected, not short-circuited.
//! - Uniqueness excludes the record itself by id.

use crate::model::{EntityKind, FieldValue, Record};
use crate::repo::entity_store::{EntityStore, RepoResult};
use crate::repo::query::Condition;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://.").expect("valid url regex"));
static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}[0-9]{3}$").expect("valid course code regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\w+\-.]+@[a-z\d\-]+(\.[a-z\d\-]+)*\.[a-z]+$").expect("valid email regex")
});

/// Named format a text field must fully match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `http://` or `https://`, any case, then at least one character.
    Url,
    /// Three letters then three digits, e.g. `ALS400`.
    CourseCode,
    /// `local@domain.tld` with exactly one `@`.
    Email,
}

impl Pattern {
    pub fn matches(self, value: &str) -> bool {
        let re = match self {
            Self::Url => &URL_RE,
            Self::CourseCode => &COURSE_CODE_RE,
            Self::Email => &EMAIL_RE,
        };
        re.is_match(value)
    }
}

/// One rule attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Presence,
    /// Skipped when the value is absent or blank.
    Format(Pattern),
    /// `scope: None` means unique across the whole table.
    Uniqueness { scope: Option<&'static str> },
    /// Present and a finite number.
    Numeric,
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Presence => RuleKind::Presence,
            Self::Format(_) => RuleKind::Format,
            Self::Uniqueness { .. } => RuleKind::Uniqueness,
            Self::Numeric => RuleKind::Numeric,
        }
    }
}

/// Rule family reported on a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Presence,
    Format,
    Uniqueness,
    Numeric,
}

impl RuleKind {
    fn message(self) -> &'static str {
        match self {
            Self::Presence => "can't be blank",
            Self::Format => "is invalid",
            Self::Uniqueness => "has already been taken",
            Self::Numeric => "is not a number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
}

impl FieldRule {
    pub const fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub rule: RuleKind,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: RuleKind) -> Self {
        Self {
            field: field.into(),
            rule,
            message: rule.message().to_string(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Rule tables keyed by entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleBook {
    rules: BTreeMap<EntityKind, Vec<FieldRule>>,
}

impl RuleBook {
    /// Catalog rules.
    pub fn standard() -> Self {
        use Rule::{Format, Numeric, Presence, Uniqueness};

        Self::default()
            .with(EntityKind::School, "name", Presence)
            .with(EntityKind::Term, "name", Presence)
            .with(EntityKind::Term, "starts_on", Presence)
            .with(EntityKind::Term, "ends_on", Presence)
            .with(EntityKind::Course, "name", Presence)
            .with(EntityKind::Course, "course_code", Presence)
            .with(EntityKind::Course, "course_code", Format(Pattern::CourseCode))
            .with(
                EntityKind::Course,
                "course_code",
                Uniqueness {
                    scope: Some("term_id"),
                },
            )
            .with(EntityKind::Lesson, "name", Presence)
            .with(EntityKind::Reading, "order_number", Presence)
            .with(EntityKind::Reading, "lesson_id", Presence)
            .with(EntityKind::Reading, "url", Presence)
            .with(EntityKind::Reading, "url", Format(Pattern::Url))
            .with(EntityKind::Assignment, "name", Presence)
            .with(EntityKind::Assignment, "course_id", Presence)
            .with(EntityKind::Assignment, "percent_of_grade", Numeric)
            .with(
                EntityKind::Assignment,
                "name",
                Uniqueness {
                    scope: Some("course_id"),
                },
            )
            .with(EntityKind::AssignmentGrade, "final_grade", Numeric)
            .with(EntityKind::LessonAssignment, "lesson_id", Presence)
            .with(EntityKind::LessonAssignment, "assignment_id", Presence)
            .with(EntityKind::User, "first_name", Presence)
            .with(EntityKind::User, "last_name", Presence)
            .with(EntityKind::User, "email", Presence)
            .with(EntityKind::User, "email", Format(Pattern::Email))
            .with(EntityKind::User, "email", Uniqueness { scope: None })
            .with(EntityKind::User, "photo_url", Format(Pattern::Url))
    }

    /// Appends one rule for `kind`.
    pub fn with(mut self, kind: EntityKind, field: &'static str, rule: Rule) -> Self {
        self.rules
            .entry(kind)
            .or_default()
            .push(FieldRule::new(field, rule));
        self
    }

    pub fn rules_for(&self, kind: EntityKind) -> &[FieldRule] {
        self.rules.get(&kind).map_or(&[], Vec::as_slice)
    }
}

/// Evaluates a `RuleBook` against records, reading the store for uniqueness.
pub struct Validator<'a> {
    rules: &'a RuleBook,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a RuleBook) -> Self {
        Self { rules }
    }

    /// Returns every violation for `record`. An empty list means valid.
    pub fn validate<S: EntityStore>(
        &self,
        store: &S,
        record: &Record,
    ) -> RepoResult<Vec<Violation>> {
        let mut violations = Vec::new();
        for field_rule in self.rules.rules_for(record.kind()) {
            if !self.passes(store, record, field_rule)? {
                violations.push(Violation::new(field_rule.field, field_rule.rule.kind()));
            }
        }
        Ok(violations)
    }

    fn passes<S: EntityStore>(
        &self,
        store: &S,
        record: &Record,
        field_rule: &FieldRule,
    ) -> RepoResult<bool> {
        let value = record.field(field_rule.field);
        let passed = match &field_rule.rule {
            Rule::Presence => value.is_some_and(|value| !value.is_blank()),
            Rule::Format(pattern) => match value {
                None => true,
                Some(value) if value.is_blank() => true,
                Some(FieldValue::Text(text)) => pattern.matches(&text),
                Some(_) => false,
            },
            Rule::Numeric => value.is_some_and(|value| value.is_finite_number()),
            Rule::Uniqueness { scope } => match value {
                None => true,
                Some(value) => !taken(store, record, field_rule.field, value, *scope)?,
            },
        };
        Ok(passed)
    }
}

fn taken<S: EntityStore>(
    store: &S,
    record: &Record,
    field: &'static str,
    value: FieldValue,
    scope: Option<&'static str>,
) -> RepoResult<bool> {
    let mut conditions = vec![
        Condition::Is(field, Some(value)),
        Condition::IsNot("id", Some(record.id().into())),
    ];
    if let Some(scope) = scope {
        conditions.push(Condition::Is(scope, record.field(scope)));
    }
    store.exists(record.kind(), &conditions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_code_pattern_requires_three_letters_and_three_digits() {
        for valid in ["ALS400", "als400", "OcR202"] {
            assert!(Pattern::CourseCode.matches(valid), "{valid}");
        }
        for invalid in ["ALS4", "444", "ALSX400", "AL400", "ALS4000", " ALS400"] {
            assert!(!Pattern::CourseCode.matches(invalid), "{invalid}");
        }
    }

    #[test]
    fn url_pattern_accepts_http_and_https_in_any_case() {
        assert!(Pattern::Url.matches("http://example.com"));
        assert!(Pattern::Url.matches("HTTPS://example.com/a?b=c"));
        assert!(!Pattern::Url.matches("https://"));
        assert!(Pattern::Url.matches("https://a\nb"));
        assert!(!Pattern::Url.matches("ftp://example.com"));
        assert!(!Pattern::Url.matches("example.com"));
    }

    #[test]
    fn email_pattern_rejects_missing_or_repeated_at() {
        assert!(Pattern::Email.matches("ada@example.com"));
        assert!(Pattern::Email.matches("first.last+tag@mail.example.org"));
        for invalid in [
            "ada.example.com",
            "ada@@example.com",
            "ada@ex@ample.com",
            "ada@example",
            "@example.com",
        ] {
            assert!(!Pattern::Email.matches(invalid), "{invalid}");
        }
    }

    #[test]
    fn standard_rules_cover_user_email_three_ways() {
        let rules = RuleBook::standard();
        let email_rules: Vec<_> = rules
            .rules_for(EntityKind::User)
            .iter()
            .filter(|rule| rule.field == "email")
            .map(|rule| rule.rule.kind())
            .collect();
        assert_eq!(
            email_rules,
            vec![RuleKind::Presence, RuleKind::Format, RuleKind::Uniqueness]
        );
    }

    #[test]
    fn kinds_without_rules_have_an_empty_table() {
        assert!(RuleBook::standard()
            .rules_for(EntityKind::CourseStudent)
            .is_empty());
    }

    #[test]
    fn violation_display_names_the_field() {
        let violation = Violation::new("course_code", RuleKind::Format);
        assert_eq!(violation.to_string(), "course_code is invalid");
    }
}
