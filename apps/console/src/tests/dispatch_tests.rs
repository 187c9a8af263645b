use std::io::Cursor;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::anyhow;

use super::*;

fn counting_entry(code: &'static str, label: &'static str, counter: Arc<AtomicUsize>) -> MenuEntry {
    MenuEntry {
        code,
        label,
        action: Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }),
    }
}

fn failing_entry(code: &'static str) -> MenuEntry {
    MenuEntry {
        code,
        label: "always fails",
        action: Box::new(|| {
            Box::pin(async {
                Err(anyhow!("root cause message")
                    .context("middle message")
                    .context("top-level message"))
            })
        }),
    }
}

async fn run_lines(dispatcher: &Dispatcher, lines: &str) -> String {
    let mut out = Vec::new();
    dispatcher
        .run(Cursor::new(lines), &mut out)
        .await
        .expect("dispatcher io");
    String::from_utf8(out).expect("utf8 output")
}

#[tokio::test]
async fn codes_match_case_insensitively_with_whitespace() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        "Demos",
        vec![counting_entry("DB", "Databases", counter.clone())],
    );

    run_lines(&dispatcher, "db\nDB\n  dB  \nq\n").await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unknown_input_prints_invalid_and_runs_nothing() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        "Demos",
        vec![counting_entry("DB", "Databases", counter.clone())],
    );

    let output = run_lines(&dispatcher, "nope\nq\n").await;
    assert!(output.contains("Invalid input. Try again."));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_lines_reprompt_without_invalid_message() {
    let dispatcher = Dispatcher::new("Demos", vec![]);

    let output = run_lines(&dispatcher, "\n   \n\t\nq\n").await;
    assert!(!output.contains("Invalid input"));
    // One prompt per blank line plus the final one.
    assert_eq!(output.matches("Selection: ").count(), 4);
}

#[tokio::test]
async fn quit_stops_reading_further_input() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        "Demos",
        vec![counting_entry("A", "Action", counter.clone())],
    );

    run_lines(&dispatcher, "q\na\na\n").await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn end_of_input_terminates_the_loop() {
    let dispatcher = Dispatcher::new("Demos", vec![]);
    let output = run_lines(&dispatcher, "").await;
    assert_eq!(output.matches("Selection: ").count(), 1);
}

#[tokio::test]
async fn action_errors_print_the_whole_cause_chain_and_loop_resumes() {
    let dispatcher = Dispatcher::new("Demos", vec![failing_entry("F")]);

    let output = run_lines(&dispatcher, "f\nq\n").await;
    assert!(output.contains("top-level message"));
    assert!(output.contains("middle message"));
    assert!(output.contains("root cause message"));
    // The menu is printed again after the failure.
    assert_eq!(output.matches("Selection: ").count(), 2);
}

#[tokio::test]
async fn scenario_blank_invalid_action_quit() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        "Demos",
        vec![counting_entry("A", "Action", counter.clone())],
    );

    let output = run_lines(&dispatcher, "\nz\na\nq\n").await;
    assert_eq!(output.matches("Invalid input. Try again.").count(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(output.matches("Selection: ").count(), 4);
}

#[test]
fn flatten_error_joins_messages_with_newlines() {
    let err = anyhow!("root cause").context("wrapped").context("top");
    assert_eq!(flatten_error(&err), "top\nwrapped\nroot cause");
}

#[test]
fn menu_lists_every_entry_and_quit() {
    let dispatcher = Dispatcher::new(
        "Document Db Demos",
        vec![MenuEntry {
            code: "DB",
            label: "Databases",
            action: Box::new(|| Box::pin(async { Ok(()) })),
        }],
    );

    let mut out = Vec::new();
    dispatcher.render_menu(&mut out).expect("render");
    let menu = String::from_utf8(out).expect("utf8 menu");
    assert!(menu.contains("Document Db Demos"));
    assert!(menu.contains("DB  Databases"));
    assert!(menu.contains("Q   Quit"));
}
