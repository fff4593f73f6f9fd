//! End-to-end command line tests against an in-memory store.

use std::sync::Arc;

use treesh_kernel::{Identity, Kernel, MemoryStore, Reply, Session, ShellConfig};

fn kernel() -> Kernel {
    Kernel::transient().unwrap()
}

fn session(kernel: &Kernel) -> Session {
    kernel.open_session(Identity::verified("user@example.com"))
}

async fn run(kernel: &Kernel, session: &mut Session, line: &str) -> String {
    match kernel.execute(session, line, None).await.unwrap() {
        Reply::Output(out) => out,
        Reply::Prompt(prompt) => panic!("'{line}' stopped at {prompt:?}"),
    }
}

// ============================================================================
// Pipes and redirects
// ============================================================================

#[tokio::test]
async fn test_echo_pipe_cat() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(run(&kernel, &mut s, "echo hello | cat").await, "hello");
}

#[tokio::test]
async fn test_redirect_then_cat() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "echo hello > /tmp/f").await;
    assert_eq!(run(&kernel, &mut s, "cat /tmp/f").await, "hello");
}

#[tokio::test]
async fn test_save_idiom_with_bare_echo() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir a").await;
    run(&kernel, &mut s, "ls | echo > listing").await;
    assert_eq!(run(&kernel, &mut s, "cat listing").await, "📁 a");
}

#[tokio::test]
async fn test_error_text_flows_into_redirect() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "cat ghost | echo > log").await;
    assert_eq!(run(&kernel, &mut s, "cat log").await, "cat: no such file: ghost");
}

#[tokio::test]
async fn test_unknown_command_mid_pipeline() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(
        run(&kernel, &mut s, "echo a | nope | cat").await,
        "shell: command not found: nope"
    );
    assert_eq!(run(&kernel, &mut s, "nope | echo fine").await, "fine");
}

#[tokio::test]
async fn test_empty_stage_does_not_abort() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(run(&kernel, &mut s, "echo a | | cat").await, "shell: empty command");
    assert_eq!(run(&kernel, &mut s, "echo a | | echo b").await, "b");
}

// ============================================================================
// Directories
// ============================================================================

#[tokio::test]
async fn test_mkdir_ls_and_collision() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(run(&kernel, &mut s, "mkdir docs").await, "Directory 'docs' created");
    assert_eq!(run(&kernel, &mut s, "ls").await, "📁 docs");
    assert_eq!(run(&kernel, &mut s, "ls docs").await, "📄 DONOTDELETE");
    assert_eq!(run(&kernel, &mut s, "mkdir docs").await, "mkdir: name in use: docs");
}

#[tokio::test]
async fn test_empty_root_listing() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(run(&kernel, &mut s, "ls").await, "(empty directory)");
}

#[tokio::test]
async fn test_rm_needs_recursive_for_fresh_dir() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir d").await;
    assert_eq!(run(&kernel, &mut s, "rm d").await, "rm: directory not empty (use -r)");
    assert_eq!(run(&kernel, &mut s, "rm -r d").await, "Removed directory 'd'");
    assert_eq!(run(&kernel, &mut s, "ls").await, "(empty directory)");
}

#[tokio::test]
async fn test_rm_root_always_fails() {
    let kernel = kernel();
    let mut s = session(&kernel);
    assert_eq!(run(&kernel, &mut s, "rm -r /").await, "rm: cannot remove root directory");
}

#[tokio::test]
async fn test_cd_and_relative_paths() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir a").await;
    assert_eq!(run(&kernel, &mut s, "cd a").await, "Changed directory to 'a'");
    run(&kernel, &mut s, "echo inner > note").await;
    assert_eq!(run(&kernel, &mut s, "pwd").await, "/a");
    assert_eq!(run(&kernel, &mut s, "cat /a/note").await, "inner");
    run(&kernel, &mut s, "cd ..").await;
    assert_eq!(run(&kernel, &mut s, "cat a/note").await, "inner");
    assert_eq!(run(&kernel, &mut s, "cd a/note").await, "cd: not a directory: a/note");
}

#[tokio::test]
async fn test_file_reports_kind() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir a").await;
    run(&kernel, &mut s, "echo x > f").await;
    assert_eq!(run(&kernel, &mut s, "file a").await, "📁 'a' is a directory");
    assert_eq!(run(&kernel, &mut s, "file f").await, "📄 'f' is a file");
}

// ============================================================================
// Copy and move
// ============================================================================

#[tokio::test]
async fn test_mv_nests_into_existing_dir() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir a").await;
    run(&kernel, &mut s, "mkdir b").await;
    assert_eq!(run(&kernel, &mut s, "mv a b").await, "Moved 'a' to 'a'");
    assert_eq!(run(&kernel, &mut s, "ls b").await, "📄 DONOTDELETE\n📁 a");
    assert_eq!(run(&kernel, &mut s, "ls").await, "📁 b");
}

#[tokio::test]
async fn test_mv_renames() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "echo body > old.txt").await;
    assert_eq!(run(&kernel, &mut s, "mv old.txt new.txt").await, "Moved 'old.txt' to 'new.txt'");
    assert_eq!(run(&kernel, &mut s, "cat new.txt").await, "body");
    assert_eq!(run(&kernel, &mut s, "cat old.txt").await, "cat: no such file: old.txt");
}

#[tokio::test]
async fn test_cp_keeps_source() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "mkdir a").await;
    run(&kernel, &mut s, "echo x > a/f").await;
    assert_eq!(run(&kernel, &mut s, "cp a c").await, "Copied 'a' to 'c'");
    assert_eq!(run(&kernel, &mut s, "cat c/f").await, "x");
    assert_eq!(run(&kernel, &mut s, "cat a/f").await, "x");
}

#[tokio::test]
async fn test_dotted_names_survive_storage() {
    let kernel = kernel();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "echo v1 > release.notes.txt").await;
    assert_eq!(run(&kernel, &mut s, "ls").await, "📄 release.notes.txt");
    assert_eq!(run(&kernel, &mut s, "cat release.notes.txt").await, "v1");
}

// ============================================================================
// Metadata and sessions
// ============================================================================

#[tokio::test]
async fn test_metadata_is_hidden_and_refused() {
    let kernel = kernel();
    let mut s = session(&kernel);
    kernel.execute(&mut s, "vim -s secret", None).await.unwrap();
    kernel.resume(&mut s, Some("pw".into())).await.unwrap();
    kernel.resume(&mut s, Some("pw".into())).await.unwrap();
    kernel.resume(&mut s, Some("text".into())).await.unwrap();

    assert_eq!(run(&kernel, &mut s, "ls").await, "📄 secret");
    assert_eq!(
        run(&kernel, &mut s, "ls /__PASSWORDS__").await,
        "ls: permission denied to access metadata"
    );
    assert_eq!(
        run(&kernel, &mut s, "cd __PASSWORDS__").await,
        "cd: permission denied to access metadata"
    );
    assert_eq!(
        run(&kernel, &mut s, "rm -r /__PASSWORDS__").await,
        "rm: permission denied to remove password metadata"
    );
}

#[tokio::test]
async fn test_cwd_is_per_identity() {
    let kernel = kernel();
    let mut alice = kernel.open_session(Identity::verified("alice@example.com"));
    let mut bob = kernel.open_session(Identity::verified("bob@example.com"));

    run(&kernel, &mut alice, "mkdir home").await;
    run(&kernel, &mut alice, "cd home").await;
    assert_eq!(run(&kernel, &mut bob, "pwd").await, "/");
    assert_eq!(run(&kernel, &mut alice, "pwd").await, "/home");
}

#[tokio::test]
async fn test_cwd_follows_identity_across_sessions() {
    let kernel = kernel();
    let mut first = session(&kernel);
    run(&kernel, &mut first, "mkdir w").await;
    run(&kernel, &mut first, "cd w").await;

    let mut second = session(&kernel);
    assert_eq!(run(&kernel, &mut second, "pwd").await, "/w");

    run(&kernel, &mut second, "cd /").await;
    assert_eq!(run(&kernel, &mut first, "pwd").await, "/");
}

#[tokio::test]
async fn test_custom_prefixes() {
    let config = ShellConfig {
        fs_prefix: "tree".into(),
        ..ShellConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let kernel = Kernel::new(config, store.clone()).unwrap();
    let mut s = session(&kernel);
    run(&kernel, &mut s, "echo x > f").await;

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot["tree"]["f"], serde_json::json!("x"));
}
