use dockpin_core::rewrite::find_follow_tags;
use dockpin_core::{aggregate, replace_from_at, replace_froms, rewrite_last, DiffEntry};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn image() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(/[a-z][a-z0-9]{0,8})?(:[a-z0-9.]{1,6})?"
}

fn filler_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("RUN echo hello".to_string()),
        Just("# comment".to_string()),
        Just("COPY --from=build /out /app".to_string()),
        Just("LABEL maintainer=someone".to_string()),
        "ENV [A-Z]{1,5}=[a-z0-9]{0,5}",
    ]
}

fn from_line() -> impl Strategy<Value = String> {
    (image(), prop::option::of("[a-z]{1,6}"), any::<bool>()).prop_map(|(image, alias, upper)| {
        let keyword = if upper { "FROM" } else { "from" };
        match alias {
            Some(alias) => format!("{} {} AS {}", keyword, image, alias),
            None => format!("{} {}", keyword, image),
        }
    })
}

/// A Dockerfile with 1..4 stages and the number of FROM lines in it
fn dockerfile() -> impl Strategy<Value = (String, usize)> {
    prop::collection::vec(
        (from_line(), prop::collection::vec(filler_line(), 0..4)),
        1..4,
    )
    .prop_map(|stages| {
        let count = stages.len();
        let mut lines = Vec::new();
        for (from, body) in stages {
            lines.push(from);
            lines.extend(body);
        }
        (lines.join("\n"), count)
    })
}

/// Leaf paths, either all absolute (as container-diff reports them) or all relative
fn diff_entries() -> impl Strategy<Value = Vec<DiffEntry>> {
    (
        any::<bool>(),
        prop::collection::vec(
            (prop::collection::vec("[a-c]{1,2}", 1..5), 0i64..1000, 0i64..1000),
            0..300,
        ),
    )
        .prop_map(|(absolute, raw)| {
            raw.into_iter()
                .map(|(parts, current, proposed)| {
                    let joined = parts.join("/");
                    let path = if absolute { format!("/{}", joined) } else { joined };
                    DiffEntry::new(path, current, proposed)
                })
                .collect()
        })
}

fn top_level(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    trimmed.split('/').next().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rewrite_all_is_idempotent((text, count) in dockerfile(), replacement in image()) {
        let images = vec![replacement; count];
        let once = replace_froms(&text, &images).unwrap();
        let twice = replace_froms(&once, &images).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rewrite_one_touches_exactly_one_line(
        (text, count) in dockerfile(),
        replacement in "[a-z]{3,8}@sha256:[0-9a-f]{8}",
        pick in any::<prop::sample::Index>(),
    ) {
        let index = pick.index(count);
        let images = vec![replacement; count];
        let out = replace_from_at(&text, &images, index).unwrap();

        let before: Vec<&str> = text.split('\n').collect();
        let after: Vec<&str> = out.split('\n').collect();
        prop_assert_eq!(before.len(), after.len());
        let changed = before.iter().zip(&after).filter(|(a, b)| a != b).count();
        prop_assert_eq!(changed, 1);
    }

    #[test]
    fn rewrite_last_leaves_one_label((text, _) in dockerfile(), replacement in image(), tag in "[a-z0-9.]{1,8}") {
        let out = rewrite_last(&text, &replacement, &tag).unwrap();
        let labels = find_follow_tags(&out);
        prop_assert_eq!(labels.len(), 1);
        prop_assert_eq!(&labels[0].value, &tag);

        let again = rewrite_last(&out, &replacement, &tag).unwrap();
        prop_assert_eq!(again, out);
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn aggregation_conserves_mass(entries in diff_entries(), limit in 0usize..120) {
        let out = aggregate(&entries, limit);
        let current: i64 = entries.iter().map(|e| e.current).sum();
        let proposed: i64 = entries.iter().map(|e| e.proposed).sum();
        prop_assert_eq!(out.iter().map(|e| e.current).sum::<i64>(), current);
        prop_assert_eq!(out.iter().map(|e| e.proposed).sum::<i64>(), proposed);

        let leaves: usize = out.iter().map(|e| e.children.unwrap_or(1)).sum();
        prop_assert_eq!(leaves, entries.len());
    }

    #[test]
    fn aggregation_is_bounded(entries in diff_entries(), limit in 0usize..120) {
        let out = aggregate(&entries, limit);
        let mut dirs: Vec<&str> = entries.iter().map(|e| top_level(&e.path)).collect();
        dirs.sort_unstable();
        dirs.dedup();
        prop_assert!(out.len() <= limit.max(dirs.len()));
    }

    #[test]
    fn no_single_child_summaries(entries in diff_entries(), limit in 0usize..120) {
        let out = aggregate(&entries, limit);
        prop_assert!(!out.iter().any(|e| e.children == Some(1)));
    }
}
