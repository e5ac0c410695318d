use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Assignment, AssignmentGrade, CatalogConfig, CatalogError, CatalogService, Course, EntityKind,
    Lesson, Reading, Record, RuleKind, School, SqliteEntityStore, Term, User,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

fn service(conn: &Connection) -> CatalogService<SqliteEntityStore<'_>> {
    CatalogService::new(
        SqliteEntityStore::try_new(conn).unwrap(),
        CatalogConfig::standard(),
    )
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn fall_term() -> Term {
    Term::scheduled("Fall Semester", date(2024, 9, 1), date(2024, 12, 20))
}

fn failed_fields(err: &CatalogError) -> Vec<(&str, RuleKind)> {
    err.violations()
        .iter()
        .map(|violation| (violation.field.as_str(), violation.rule))
        .collect()
}

#[test]
fn course_requires_name_and_well_formed_code() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create(Course::new("Algorithms", "ALS400")).unwrap();
    service.create(Course::new("Algorithms II", "als401")).unwrap();

    let err = service.create(Course::new("  ", "ALS4")).unwrap_err();
    assert_eq!(
        failed_fields(&err),
        vec![("name", RuleKind::Presence), ("course_code", RuleKind::Format)]
    );

    let err = service.create(Course::new("Numbers", "444")).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("course_code", RuleKind::Format)]);

    let err = service.create(Course::new("Blank", "")).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("course_code", RuleKind::Presence)]);
}

#[test]
fn rejected_write_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let course = Course::new("", "BAD");
    service.create(course.clone()).unwrap_err();

    let err = service.get(EntityKind::Course, course.id).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound { kind: EntityKind::Course, id } if id == course.id
    ));
}

#[test]
fn reading_requires_order_lesson_and_http_url() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let lesson_id = Uuid::new_v4();

    service
        .create(Reading::new(lesson_id, 1, "https://example.com/intro"))
        .unwrap();
    service
        .create(Reading::new(lesson_id, 2, "HTTP://example.com/two"))
        .unwrap();

    let err = service
        .create(Reading::new(lesson_id, 3, "ftp://example.com/file"))
        .unwrap_err();
    assert_eq!(failed_fields(&err), vec![("url", RuleKind::Format)]);

    let mut missing = Reading::new(lesson_id, 4, "https://example.com");
    missing.order_number = None;
    missing.lesson_id = None;
    missing.url = None;
    let err = service.create(missing).unwrap_err();
    assert_eq!(
        failed_fields(&err),
        vec![
            ("order_number", RuleKind::Presence),
            ("lesson_id", RuleKind::Presence),
            ("url", RuleKind::Presence),
        ]
    );
}

#[test]
fn term_requires_name_and_both_dates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create(fall_term()).unwrap();

    let err = service.create(Term::new("Unscheduled")).unwrap_err();
    assert_eq!(
        failed_fields(&err),
        vec![("starts_on", RuleKind::Presence), ("ends_on", RuleKind::Presence)]
    );
}

#[test]
fn school_and_lesson_require_a_name() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create(School::new("Ridgemont High")).unwrap();
    let err = service.create(School::new(" ")).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("name", RuleKind::Presence)]);

    let err = service.create(Lesson::new("")).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("name", RuleKind::Presence)]);
}

#[test]
fn user_email_is_globally_unique() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create(User::new("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    let err = service
        .create(User::new("Augusta", "King", "ada@example.com"))
        .unwrap_err();
    assert_eq!(failed_fields(&err), vec![("email", RuleKind::Uniqueness)]);

    let users = service
        .list(EntityKind::User, &Default::default())
        .unwrap();
    assert_eq!(users.len(), 1);
}

#[test]
fn user_email_and_photo_formats() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for email in ["ada.example.com", "ada@@example.com", "a@b@example.com"] {
        let err = service.create(User::new("Ada", "L", email)).unwrap_err();
        assert_eq!(failed_fields(&err), vec![("email", RuleKind::Format)], "{email}");
    }

    let mut user = User::new("Grace", "Hopper", "grace@example.com");
    user.photo_url = Some("not a url".to_string());
    let err = service.create(user.clone()).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("photo_url", RuleKind::Format)]);

    user.photo_url = Some("https://example.com/grace.png".to_string());
    service.create(user.clone()).unwrap();

    let mut no_photo = User::new("Alan", "Turing", "alan@example.com");
    no_photo.photo_url = None;
    service.create(no_photo).unwrap();
}

#[test]
fn updating_a_user_does_not_collide_with_itself() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut user = User::new("Ada", "Lovelace", "ada@example.com");
    service.create(user.clone()).unwrap();
    let other = User::new("Charles", "Babbage", "charles@example.com");
    service.create(other.clone()).unwrap();

    user.last_name = "King".to_string();
    service.update(user.clone()).unwrap();

    user.email = other.email.clone();
    let err = service.update(user.clone()).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("email", RuleKind::Uniqueness)]);

    let stored = User::try_from(service.get(EntityKind::User, user.id).unwrap()).unwrap();
    assert_eq!(stored.email, "ada@example.com");
    assert_eq!(stored.last_name, "King");
}

#[test]
fn update_of_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let ghost = School::new("Nowhere");
    let err = service.update(ghost.clone()).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { id, .. } if id == ghost.id));
}

#[test]
fn assignment_name_is_unique_per_course() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let course_a = Uuid::new_v4();
    let course_b = Uuid::new_v4();

    service
        .create(Assignment::new(course_a, "Essay 1", 10.0))
        .unwrap();
    let err = service
        .create(Assignment::new(course_a, "Essay 1", 15.0))
        .unwrap_err();
    assert_eq!(failed_fields(&err), vec![("name", RuleKind::Uniqueness)]);

    service
        .create(Assignment::new(course_b, "Essay 1", 15.0))
        .unwrap();
}

#[test]
fn assignment_requires_course_and_numeric_weight() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut assignment = Assignment::new(Uuid::new_v4(), "Quiz", 5.0);
    assignment.course_id = None;
    assignment.percent_of_grade = None;
    let err = service.create(assignment).unwrap_err();
    assert_eq!(
        failed_fields(&err),
        vec![
            ("course_id", RuleKind::Presence),
            ("percent_of_grade", RuleKind::Numeric),
        ]
    );

    let nan = Assignment::new(Uuid::new_v4(), "Quiz", f64::NAN);
    let err = service.create(nan).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("percent_of_grade", RuleKind::Numeric)]);

    let mut grade = AssignmentGrade::new(Uuid::new_v4(), 91.5);
    service.create(grade.clone()).unwrap();
    grade.final_grade = None;
    let err = service.update(grade).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("final_grade", RuleKind::Numeric)]);
}

#[test]
fn course_code_uniqueness_is_scoped_per_term() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let term_a = fall_term();
    let term_b = Term::scheduled("Spring Semester", date(2025, 1, 10), date(2025, 5, 30));
    service.create(term_a.clone()).unwrap();
    service.create(term_b.clone()).unwrap();

    service
        .create(Course::new("Optical Recognition", "OCR202").in_term(term_a.id))
        .unwrap();

    let second = Course::new("Optical Recognition (B)", "OCR202").in_term(term_a.id);
    let err = service.create(second.clone()).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("course_code", RuleKind::Uniqueness)]);

    let moved = second.in_term(term_b.id);
    service.create(moved.clone()).unwrap();

    let stored = service.get(EntityKind::Course, moved.id).unwrap();
    assert!(matches!(stored, Record::Course(course) if course.term_id == Some(term_b.id)));
}

#[test]
fn courses_without_a_term_share_one_scope() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create(Course::new("Intro", "INT100")).unwrap();
    let err = service.create(Course::new("Intro again", "INT100")).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("course_code", RuleKind::Uniqueness)]);
}

#[test]
fn reassigning_a_course_into_a_taken_scope_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let term_a = fall_term();
    let term_b = Term::scheduled("Spring", date(2025, 1, 10), date(2025, 5, 30));
    service.create(term_a.clone()).unwrap();
    service.create(term_b.clone()).unwrap();

    service
        .create(Course::new("Physics", "PHY101").in_term(term_a.id))
        .unwrap();
    let other = Course::new("Physics", "PHY101").in_term(term_b.id);
    service.create(other.clone()).unwrap();

    let err = service.update(other.in_term(term_a.id)).unwrap_err();
    assert_eq!(failed_fields(&err), vec![("course_code", RuleKind::Uniqueness)]);
}
