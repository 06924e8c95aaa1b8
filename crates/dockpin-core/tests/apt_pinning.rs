use apt_index::fakes::MemoryRepository;
use dockpin_core::{pin_apt_packages, PackageChange, PackagePinResolver, PinError};

const FOCAL: &str = "deb http://archive.ubuntu.com/ubuntu focal main";
const PPA: &str = "deb http://ppa.launchpad.net/git-core/ppa/ubuntu focal main";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repository() -> MemoryRepository {
    MemoryRepository::new()
        .with_package(FOCAL, "curl", "7.68.0-1ubuntu2.7")
        .with_package(FOCAL, "git", "1:2.25.1-1ubuntu3.6")
        .with_package(FOCAL, "jq", "1.6-1ubuntu0.20.04.1")
        .with_package(PPA, "git", "1:2.39.2-0ppa1~ubuntu20.04.1")
}

fn sources() -> Vec<String> {
    vec![FOCAL.to_string()]
}

fn change(name: &str, version: &str) -> PackageChange {
    PackageChange {
        name: name.to_string(),
        version: version.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn multi_line_instruction_is_replaced_in_place() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal
RUN apt-get update && \\
    apt-get install -y --no-install-recommends \\
      jq=1.5 \\
      curl \\
 && rm -rf /var/lib/apt/lists/*
CMD [\"bash\"]
";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");

    assert_eq!(
        result.dockerfile,
        "FROM ubuntu:focal
RUN apt-get update && apt-get install -y --no-install-recommends \\
    curl=7.68.0-1ubuntu2.7 \\
    jq=1.6-1ubuntu0.20.04.1 \\
 && rm -rf /var/lib/apt/lists/*
CMD [\"bash\"]
"
    );
    assert_eq!(
        result.changes,
        vec![
            change("jq", "1.6-1ubuntu0.20.04.1"),
            change("curl", "7.68.0-1ubuntu2.7"),
        ]
    );
}

#[tokio::test]
async fn rewritten_output_is_stable() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal\nRUN apt-get update && apt-get install -y git curl\n";
    let first = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("first");
    let second = pin_apt_packages(&first.dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("second");
    assert!(second.changes.is_empty());
    assert_eq!(second.dockerfile, first.dockerfile);
}

#[tokio::test]
async fn only_target_layer_is_rewritten() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal AS build
RUN apt-get update && apt-get install curl
FROM ubuntu:focal
RUN apt-get update && apt-get install jq
";
    let result = pin_apt_packages(dockerfile, 1, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert_eq!(
        result.dockerfile,
        "FROM ubuntu:focal AS build
RUN apt-get update && apt-get install curl
FROM ubuntu:focal
RUN apt-get update && apt-get install \\
    jq=1.6-1ubuntu0.20.04.1
"
    );
    assert_eq!(result.changes, vec![change("jq", "1.6-1ubuntu0.20.04.1")]);
}

#[tokio::test]
async fn instructions_without_update_are_left_alone() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal\nRUN apt-get install -y curl\n";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert_eq!(result.dockerfile, dockerfile);
    assert!(result.changes.is_empty());
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ignore_directive_skips_next_instruction_only() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal
# atomist:apt-ignore
RUN apt-get update && apt-get install curl
RUN apt-get update && apt-get install jq
";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert!(result
        .dockerfile
        .contains("# atomist:apt-ignore\nRUN apt-get update && apt-get install curl\n"));
    assert_eq!(result.changes, vec![change("jq", "1.6-1ubuntu0.20.04.1")]);
}

#[tokio::test]
async fn source_override_is_scoped_to_one_instruction() {
    let repo = repository();
    let dockerfile = format!(
        "FROM ubuntu:focal
# atomist:apt-source={}
RUN apt-get update && apt-get install git
RUN apt-get update && apt-get install git
",
        PPA
    );
    let result = pin_apt_packages(&dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");

    assert_eq!(
        result.changes,
        vec![
            change("git", "1:2.39.2-0ppa1~ubuntu20.04.1"),
            change("git", "1:2.25.1-1ubuntu3.6"),
        ]
    );

    let requests = repo.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].sources, vec![FOCAL.to_string()]);
    assert_eq!(requests[1].sources, vec![PPA.to_string(), FOCAL.to_string()]);
    assert!(requests.iter().all(|r| r.arch == "amd64"));
}

#[tokio::test]
async fn malformed_directive_is_ignored() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal
# atomist:apt-source=
RUN apt-get update && apt-get install curl
";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert_eq!(result.changes, vec![change("curl", "7.68.0-1ubuntu2.7")]);
    assert_eq!(repo.requests().len(), 1);
}

#[tokio::test]
async fn unparseable_source_directive_uses_default_sources() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal
# atomist:apt-source=not-a-source-line
RUN apt-get update && apt-get install curl
";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert_eq!(result.changes, vec![change("curl", "7.68.0-1ubuntu2.7")]);
    assert!(result.dockerfile.contains("curl=7.68.0-1ubuntu2.7"));

    let requests = repo.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sources, sources());
}

#[tokio::test]
async fn crlf_dockerfile_keeps_its_line_endings() {
    let repo = repository();
    let dockerfile = "FROM ubuntu:focal\r\nRUN apt-get update && apt-get install -y curl git\r\nCMD x\r\n";
    let result = pin_apt_packages(dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .expect("pin");
    assert_eq!(
        result.dockerfile,
        "FROM ubuntu:focal\r\nRUN apt-get update && apt-get install -y \\\r\n    curl=7.68.0-1ubuntu2.7 \\\r\n    git=1:2.25.1-1ubuntu3.6\r\nCMD x\r\n"
    );
    assert!(!result.dockerfile.replace("\r\n", "").contains('\n'));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_override_source_aborts_layer() {
    let repo = repository().failing_source(PPA);
    let dockerfile = format!(
        "FROM ubuntu:focal
RUN apt-get update && apt-get install curl
# atomist:apt-source={}
RUN apt-get update && apt-get install git
",
        PPA
    );
    let err = pin_apt_packages(&dockerfile, 0, &sources(), "amd64", &repo)
        .await
        .unwrap_err();
    assert!(matches!(err, PinError::RepositoryRefreshFailed(_)));
}

#[tokio::test]
async fn resolver_uses_configured_architecture() {
    let repo = repository();
    let mut resolver = PackagePinResolver::new(&repo).with_arch("arm64");
    resolver
        .pin("FROM ubuntu:focal\n", 0, &sources())
        .await
        .expect("pin");
    assert_eq!(repo.requests()[0].arch, "arm64");
}
