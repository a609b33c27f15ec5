//! Cross-process determinism: spawns the `search_fixture` binary under
//! several environment variants and asserts identical stdout.

use std::path::Path;
use std::process::Command;

use lock_tests::scenarios::fixture_runs;

fn workspace_root() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
        .to_string_lossy()
        .to_string()
}

fn run_variant(work_dir: &str, env_overrides: &[(&str, &str)]) -> String {
    let bin = env!("CARGO_BIN_EXE_search_fixture");

    let mut command = Command::new(bin);
    command.current_dir(work_dir);
    command
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE")
        .env_remove("RUST_LOG");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!("failed to spawn {bin} (work_dir={work_dir}, overrides={env_overrides:?}): {e}")
    });
    assert!(
        output.status.success(),
        "search_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

#[test]
fn crossproc_determinism_env_variants() {
    let root = workspace_root();
    let baseline = run_variant(&root, &[]);

    assert!(baseline.contains("graph.best_first.digest=sha256:"));
    assert!(baseline.contains("graph.best_first.status=\"search_completed\""));
    assert!(baseline.contains("graph.best_first.plan=a->c,c->b,b->d,d->goal"));
    assert!(baseline.contains("graph.best_first.plan_cost=7"));
    assert!(baseline.contains("tile.iterative_deepening_shuffled.solved=true"));
    assert!(baseline.contains("run_count=8"));

    let alt_cwd = if cfg!(target_os = "windows") { "C:\\" } else { "/tmp" };
    assert_eq!(
        baseline,
        run_variant(alt_cwd, &[]),
        "output differs when cwd changes from {root} to {alt_cwd}"
    );
    assert_eq!(
        baseline,
        run_variant(&root, &[("LC_ALL", "C"), ("LANG", "C")]),
        "output differs when LC_ALL=C LANG=C"
    );
    assert_eq!(
        baseline,
        run_variant(
            &root,
            &[
                ("WAYFINDER_NOISE", "should_not_matter"),
                ("TZ", "America/New_York"),
                ("HOME", "/nonexistent"),
            ],
        ),
        "output differs with spurious env vars"
    );
    assert_eq!(
        baseline,
        run_variant(&root, &[("RUST_LOG", "debug")]),
        "logging changed stdout"
    );
}

#[test]
fn crossproc_digests_match_inproc() {
    let stdout = run_variant(&workspace_root(), &[]);
    for (label, report) in fixture_runs() {
        let line = format!("{label}.digest={}", report.digest().unwrap());
        assert!(stdout.lines().any(|l| l == line), "missing or different: {line}");
    }
}
