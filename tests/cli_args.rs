//! CLI argument parsing tests.

use std::path::PathBuf;

use clap::Parser;
use drycc_client::cli::{Cli, Command};

#[test]
fn test_cli_parses_probe_subcommands() {
    let cli = Cli::parse_from(["drycc-client", "check"]);
    assert!(!cli.json);
    assert!(!cli.strict);
    assert!(matches!(cli.command, Command::Check));

    let cli = Cli::parse_from(["drycc-client", "health"]);
    assert!(matches!(cli.command, Command::Health));
}

#[test]
fn test_cli_parses_ls_with_defaults() {
    let cli = Cli::parse_from(["drycc-client", "ls", "example-go", "myvolume"]);

    match cli.command {
        Command::Ls {
            app,
            volume,
            path,
            limit,
        } => {
            assert_eq!(app, "example-go");
            assert_eq!(volume, "myvolume");
            assert_eq!(path, "/");
            assert_eq!(limit, 100);
        }
        _ => panic!("Expected Ls command"),
    }
}

#[test]
fn test_cli_parses_ls_limit() {
    let cli = Cli::parse_from(["drycc-client", "ls", "app", "vol", "tmp", "--limit", "5"]);

    match cli.command {
        Command::Ls { path, limit, .. } => {
            assert_eq!(path, "tmp");
            assert_eq!(limit, 5);
        }
        _ => panic!("Expected Ls command"),
    }
}

#[test]
fn test_cli_parses_put_subcommand() {
    let cli = Cli::parse_from([
        "drycc-client",
        "put",
        "app",
        "vol",
        "./hello.txt",
        "--path",
        "tmp/",
        "--name",
        "greeting.txt",
    ]);

    match cli.command {
        Command::Put {
            app,
            volume,
            file,
            path,
            name,
        } => {
            assert_eq!(app, "app");
            assert_eq!(volume, "vol");
            assert_eq!(file, PathBuf::from("./hello.txt"));
            assert_eq!(path, "tmp/");
            assert_eq!(name, Some("greeting.txt".to_string()));
        }
        _ => panic!("Expected Put command"),
    }
}

#[test]
fn test_cli_parses_get_and_rm() {
    let cli = Cli::parse_from(["drycc-client", "get", "app", "vol", "tmp/a.txt", "-o", "a.txt"]);
    match cli.command {
        Command::Get { path, output, .. } => {
            assert_eq!(path, "tmp/a.txt");
            assert_eq!(output, Some(PathBuf::from("a.txt")));
        }
        _ => panic!("Expected Get command"),
    }

    let cli = Cli::parse_from(["drycc-client", "rm", "app", "vol", "tmp/a.txt"]);
    assert!(matches!(cli.command, Command::Rm { .. }));
}

#[test]
fn test_global_flags() {
    // Before subcommand
    let cli = Cli::parse_from(["drycc-client", "--json", "--strict", "check"]);
    assert!(cli.json);
    assert!(cli.strict);

    // After subcommand (global flag)
    let cli = Cli::parse_from(["drycc-client", "ls", "app", "vol", "--json"]);
    assert!(cli.json);
    assert!(!cli.strict);
}

#[test]
fn test_missing_arguments_rejected() {
    assert!(Cli::try_parse_from(["drycc-client", "put", "app"]).is_err());
    assert!(Cli::try_parse_from(["drycc-client", "frobnicate"]).is_err());
}
