//! Property tests for the entity codec round-trip.

use chrono::{DateTime, TimeZone, Utc};
use docket::codec::{parse_issue, serialize_issue};
use docket::model::{Issue, Priority, Status};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Todo),
        Just(Status::InProgress),
        Just(Status::Blocked),
        Just(Status::Done),
    ]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Critical),
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 2001-09-09 .. 2033-05-18, whole seconds.
    (1_000_000_000i64..2_000_000_000i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

/// Single-line text with no leading/trailing whitespace, as titles and
/// summaries are in practice.
fn line_strategy(max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-zA-Z0-9][a-zA-Z0-9 :#/_.,!-]{{0,{max}}}"))
        .expect("valid regex")
        .prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty", |s| !s.is_empty())
}

fn label_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z][a-z0-9-]{0,12}", 0..4)
}

prop_compose! {
    fn issue_strategy()(
        id in "[a-z0-9]{8}",
        title in line_strategy(60),
        status in status_strategy(),
        priority in priority_strategy(),
        assignee in proptest::option::of("[a-z]{2,12}"),
        milestone in proptest::option::of("[a-z][a-z0-9-]{0,16}"),
        summary in proptest::option::of(line_strategy(80)),
        labels in label_strategy(),
        estimated_minutes in proptest::option::of(1i32..10_000),
        created in timestamp_strategy(),
        updated in timestamp_strategy(),
        body in "[ -~\n]{0,400}",
    ) -> Issue {
        Issue {
            id,
            title,
            status,
            priority,
            assignee,
            milestone,
            summary,
            labels,
            estimated_minutes,
            created,
            updated,
            sync: None,
            body,
        }
    }
}

proptest! {
    #[test]
    fn roundtrip_preserves_every_field(issue in issue_strategy()) {
        let serialized = serialize_issue(&issue).unwrap();
        let parsed = parse_issue(&serialized).unwrap();
        prop_assert_eq!(parsed, issue);
    }

    #[test]
    fn serialization_is_deterministic(issue in issue_strategy()) {
        let a = serialize_issue(&issue).unwrap();
        let b = serialize_issue(&issue).unwrap();
        prop_assert_eq!(a, b);
    }
}
