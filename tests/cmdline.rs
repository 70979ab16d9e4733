// tests/cmdline.rs

use procqueue::process::cmdline::{console, join, quote, self_command};

#[test]
fn safe_arguments_are_left_alone() {
    assert_eq!(quote("make"), "make");
    assert_eq!(quote("--jobs=4"), "--jobs=4");
    assert_eq!(quote("src/main.rs"), "src/main.rs");
    assert_eq!(quote("user@host:8080"), "user@host:8080");
}

#[test]
fn unsafe_arguments_are_single_quoted() {
    assert_eq!(quote(""), "''");
    assert_eq!(quote("two words"), "'two words'");
    assert_eq!(quote("$HOME"), "'$HOME'");
    assert_eq!(quote("a;b"), "'a;b'");
    assert_eq!(quote("it's"), r"'it'\''s'");
}

#[test]
fn join_quotes_each_argument() {
    assert_eq!(join(&["echo", "hello world", ""]), "echo 'hello world' ''");
    assert_eq!(join::<&str>(&[]), "");
}

#[test]
fn console_prefixes_given_executable() {
    assert_eq!(
        console("run --fast", Some("/usr/bin/tool")).unwrap(),
        "/usr/bin/tool run --fast"
    );
    assert_eq!(console("", Some("tool")).unwrap(), "tool");
}

#[test]
fn console_defaults_to_current_executable() {
    let exe = std::env::current_exe().unwrap();
    let expected = quote(&exe.to_string_lossy());

    assert_eq!(console("sub", None).unwrap(), format!("{expected} sub"));
}

#[test]
fn self_command_appends_quoted_args() {
    let exe = std::env::current_exe().unwrap();
    let expected = format!("{} job 'a b'", quote(&exe.to_string_lossy()));

    assert_eq!(self_command(&["job", "a b"]).unwrap(), expected);
}
