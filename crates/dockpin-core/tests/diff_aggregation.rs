use dockpin_core::{aggregate, ContainerDiffReport, DiffEntry};

fn tree(leaves: usize) -> Vec<DiffEntry> {
    (0..leaves)
        .map(|i| {
            DiffEntry::new(
                format!("/usr/lib/pkg{}/sub{}/file{}.so", i % 7, i % 13, i),
                (i * 3) as i64,
                (i * 5) as i64,
            )
        })
        .collect()
}

fn sums(entries: &[DiffEntry]) -> (i64, i64) {
    entries
        .iter()
        .fold((0, 0), |(c, p), e| (c + e.current, p + e.proposed))
}

#[test]
fn large_diff_fits_limit_without_single_child_summaries() {
    let entries = tree(250);
    let out = aggregate(&entries, 100);

    assert!(out.len() <= 100);
    assert!(!out.iter().any(|e| e.children == Some(1)));
    assert_eq!(sums(&out), sums(&entries));

    let leaves: usize = out.iter().map(|e| e.children.unwrap_or(1)).sum();
    assert_eq!(leaves, 250);
}

#[test]
fn summaries_report_their_delta() {
    let out = aggregate(&tree(250), 10);
    for entry in out.iter().filter(|e| e.children.is_some()) {
        assert_eq!(entry.diff, Some(entry.proposed - entry.current));
    }
}

#[test]
fn aggregating_twice_changes_nothing() {
    let once = aggregate(&tree(250), 50);
    let twice = aggregate(&once, 50);
    assert_eq!(once, twice);
}

#[test]
fn report_file_entries_aggregate() {
    let adds: Vec<String> = (0..150)
        .map(|i| format!(r#"{{"Name": "/app/node_modules/m{}/index.js", "Size": {}}}"#, i % 40, i))
        .collect();
    let json = format!(
        r#"[{{"DiffType": "File", "Diff": {{"Adds": [{}], "Dels": null, "Mods": []}}}}]"#,
        adds.join(",")
    );
    let report = ContainerDiffReport::from_json(&json).expect("report");
    let entries = report.file_entries().expect("entries");
    assert_eq!(entries.len(), 150);

    let out = aggregate(&entries, 100);
    assert!(out.len() <= 100);
    assert_eq!(sums(&out), sums(&entries));
}
