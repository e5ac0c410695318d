use catalog_core::db::open_db_in_memory;
use catalog_core::{
    plan_deletion, Assignment, AssignmentGrade, CatalogConfig, CatalogError, CatalogService,
    Course, CourseMembership, CourseRole, EntityKind, EntityStore, Lesson, LessonRole,
    PolicyOverride, Reading, School, SqliteEntityStore, Term, User,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn service(conn: &Connection) -> CatalogService<SqliteEntityStore<'_>> {
    CatalogService::new(
        SqliteEntityStore::try_new(conn).unwrap(),
        CatalogConfig::standard(),
    )
}

fn term() -> Term {
    Term::scheduled(
        "Fall Semester",
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
    )
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn term_with_courses_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let term = term();
    service.create(term.clone()).unwrap();
    let course = Course::new("Calculus II", "MAT202").in_term(term.id);
    service.create(course.clone()).unwrap();

    let err = service.delete(EntityKind::Term, term.id).unwrap_err();
    match err {
        CatalogError::DeletionRestricted {
            parent_kind,
            parent_id,
            blocking_kind,
            relation,
        } => {
            assert_eq!(parent_kind, EntityKind::Term);
            assert_eq!(parent_id, term.id);
            assert_eq!(blocking_kind, EntityKind::Course);
            assert_eq!(relation, "courses");
        }
        other => panic!("unexpected error: {other}"),
    }

    service.get(EntityKind::Term, term.id).unwrap();
    service.get(EntityKind::Course, course.id).unwrap();
}

#[test]
fn empty_term_can_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let term = term();
    service.create(term.clone()).unwrap();

    let report = service.delete(EntityKind::Term, term.id).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(count(&conn, "terms"), 0);
}

#[test]
fn deleting_course_cascades_to_lessons_readings_and_assignments() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let course = Course::new("Data Structures", "CSC210");
    service.create(course.clone()).unwrap();
    let lesson_a = Lesson::new("Linked lists").in_course(course.id);
    let lesson_b = Lesson::new("Trees").in_course(course.id);
    service.create(lesson_a.clone()).unwrap();
    service.create(lesson_b.clone()).unwrap();
    for (order, lesson) in [(1, &lesson_a), (2, &lesson_a), (1, &lesson_b)] {
        service
            .create(Reading::new(lesson.id, order, "https://example.com/r"))
            .unwrap();
    }
    let assignment = Assignment::new(course.id, "Homework 1", 20.0);
    service.create(assignment.clone()).unwrap();
    service
        .create(AssignmentGrade::new(assignment.id, 88.0))
        .unwrap();
    service
        .link_assignment(lesson_a.id, assignment.id, LessonRole::Pre)
        .unwrap();

    let report = service.delete(EntityKind::Course, course.id).unwrap();
    // course + 2 lessons + 3 readings + 1 link + assignment + grade
    assert_eq!(report.removed, 9);

    for table in [
        "courses",
        "lessons",
        "readings",
        "assignments",
        "assignment_grades",
        "lesson_assignments",
    ] {
        assert_eq!(count(&conn, table), 0, "{table}");
    }
}

#[test]
fn course_with_instructor_or_student_cannot_be_deleted() {
    for role in [CourseRole::Instructor, CourseRole::Student] {
        let conn = open_db_in_memory().unwrap();
        let service = service(&conn);

        let course = Course::new("Statistics", "STA101");
        service.create(course.clone()).unwrap();
        let lesson = Lesson::new("Sampling").in_course(course.id);
        service.create(lesson.clone()).unwrap();
        let user = User::new("Ada", "Lovelace", "ada@example.com");
        service.create(user.clone()).unwrap();
        service.add_course_member(course.id, user.id, role).unwrap();

        let err = service.delete(EntityKind::Course, course.id).unwrap_err();
        assert!(
            matches!(
                err,
                CatalogError::DeletionRestricted { blocking_kind, .. }
                    if blocking_kind == role.kind()
            ),
            "{role:?}: {err}"
        );

        service.get(EntityKind::Course, course.id).unwrap();
        service.get(EntityKind::Lesson, lesson.id).unwrap();
    }
}

#[test]
fn restriction_deep_in_a_cascade_rolls_back_everything() {
    let conn = open_db_in_memory().unwrap();
    let config = CatalogConfig::standard()
        .with_overrides(&[PolicyOverride {
            parent: EntityKind::School,
            relation: "terms".to_string(),
            policy: Some(catalog_core::DeletePolicy::Cascade),
        }])
        .unwrap();
    let service = CatalogService::new(SqliteEntityStore::try_new(&conn).unwrap(), config);

    let school = School::new("Ridgemont High");
    service.create(school.clone()).unwrap();
    let empty_term = term();
    service.add_term(school.id, empty_term.clone()).unwrap();
    let busy_term = term();
    service.add_term(school.id, busy_term.clone()).unwrap();
    service
        .create(Course::new("Biology", "BIO100").in_term(busy_term.id))
        .unwrap();

    let err = service.delete(EntityKind::School, school.id).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::DeletionRestricted { parent_kind: EntityKind::Term, .. }
    ));
    assert_eq!(count(&conn, "schools"), 1);
    assert_eq!(count(&conn, "terms"), 2);
    assert_eq!(count(&conn, "courses"), 1);
}

#[test]
fn school_with_terms_is_restricted_by_default() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let school = School::new("Ridgemont High");
    service.create(school.clone()).unwrap();
    service.add_term(school.id, term()).unwrap();

    let err = service.delete(EntityKind::School, school.id).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::DeletionRestricted { blocking_kind: EntityKind::Term, .. }
    ));
}

#[test]
fn deleting_a_lesson_unlinks_but_keeps_assignments() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let course = Course::new("Chemistry", "CHM110");
    service.create(course.clone()).unwrap();
    let lesson = Lesson::new("Bonds").in_course(course.id);
    service.create(lesson.clone()).unwrap();
    let prep = Assignment::new(course.id, "Pre-reading quiz", 5.0);
    let lab = Assignment::new(course.id, "Lab worksheet", 10.0);
    service.create(prep.clone()).unwrap();
    service.create(lab.clone()).unwrap();
    service
        .link_assignment(lesson.id, prep.id, LessonRole::Pre)
        .unwrap();
    service
        .link_assignment(lesson.id, lab.id, LessonRole::In)
        .unwrap();

    service.delete(EntityKind::Lesson, lesson.id).unwrap();

    assert_eq!(count(&conn, "lesson_assignments"), 0);
    service.get(EntityKind::Assignment, prep.id).unwrap();
    service.get(EntityKind::Assignment, lab.id).unwrap();
}

#[test]
fn user_with_memberships_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let course = Course::new("History", "HIS120");
    service.create(course.clone()).unwrap();
    let user = User::new("Grace", "Hopper", "grace@example.com");
    service.create(user.clone()).unwrap();
    service
        .create(CourseMembership::student(course.id, user.id))
        .unwrap();

    let err = service.delete(EntityKind::User, user.id).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::DeletionRestricted { blocking_kind: EntityKind::CourseStudent, .. }
    ));
}

#[test]
fn deleting_a_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let ghost = Course::new("Ghost", "GHO000");
    let err = service.delete(EntityKind::Course, ghost.id).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: EntityKind::Course, .. }));
}

#[test]
fn plan_lists_dependents_before_parents() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let config = CatalogConfig::standard();
    let service = CatalogService::new(SqliteEntityStore::try_new(&conn).unwrap(), config.clone());
    assert_eq!(service.config(), &config);

    let course = Course::new("Art", "ART100");
    service.create(course.clone()).unwrap();
    let lesson = Lesson::new("Color").in_course(course.id);
    service.create(lesson.clone()).unwrap();
    let reading = Reading::new(lesson.id, 1, "https://example.com/color");
    service.create(reading.clone()).unwrap();

    let plan = plan_deletion(&config.graph, &store, EntityKind::Course, course.id).unwrap();
    assert_eq!(
        plan.steps(),
        &[
            (EntityKind::Reading, reading.id),
            (EntityKind::Lesson, lesson.id),
            (EntityKind::Course, course.id),
        ]
    );
    assert_eq!(plan.root(), (EntityKind::Course, course.id));
    assert_eq!(plan.cascaded(), 2);

    // Planning alone writes nothing.
    assert!(store.fetch(EntityKind::Reading, reading.id).unwrap().is_some());
}

#[test]
fn policy_overrides_deserialize_from_json() {
    let overrides: Vec<PolicyOverride> = serde_json::from_str(
        r#"[
            {"parent": "school", "relation": "terms", "policy": "cascade"},
            {"parent": "course", "relation": "course_students"}
        ]"#,
    )
    .unwrap();
    let config = CatalogConfig::standard().with_overrides(&overrides).unwrap();

    assert_eq!(
        config.graph.edge(EntityKind::School, "terms").unwrap().on_delete,
        Some(catalog_core::DeletePolicy::Cascade)
    );
    assert_eq!(
        config
            .graph
            .edge(EntityKind::Course, "course_students")
            .unwrap()
            .on_delete,
        None
    );

    let unknown = vec![PolicyOverride {
        parent: EntityKind::Term,
        relation: "lessons".to_string(),
        policy: None,
    }];
    assert!(matches!(
        CatalogConfig::standard().with_overrides(&unknown),
        Err(CatalogError::UnknownRelation { .. })
    ));
}
