use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["steamsync", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["steamsync", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["steamsync"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_sync_with_explicit_batch_size() {
    let cli = Cli::try_parse_from(["steamsync", "sync", "storefront", "--batch-size", "25"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            worker: Worker::Storefront,
            batch_size: Some(25),
            ..
        })
    ));
}

#[test]
fn parses_kebab_case_worker_names() {
    let cli = Cli::try_parse_from(["steamsync", "sync", "page-creation"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            worker: Worker::PageCreation,
            ..
        })
    ));

    let cli = Cli::try_parse_from(["steamsync", "sync", "refresh-views"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            worker: Worker::RefreshViews,
            ..
        })
    ));
}

#[test]
fn parses_sync_run_id_flag() {
    let cli =
        Cli::try_parse_from(["steamsync", "sync", "prices", "--run-id", "9876543210"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            worker: Worker::Prices,
            run_id: Some(ref id),
            ..
        }) if id == "9876543210"
    ));
}

#[test]
fn rejects_unknown_worker() {
    assert!(Cli::try_parse_from(["steamsync", "sync", "wishlists"]).is_err());
}

#[test]
fn rejects_non_numeric_batch_size() {
    assert!(Cli::try_parse_from(["steamsync", "sync", "reviews", "--batch-size", "lots"]).is_err());
}

#[test]
fn jobs_list_defaults_to_twenty() {
    let cli = Cli::try_parse_from(["steamsync", "jobs", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Jobs {
            command: JobsCommands::List { limit: 20 }
        })
    ));
}

#[test]
fn parses_status_appid() {
    let cli = Cli::try_parse_from(["steamsync", "status", "620"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Status { appid: 620 })));
}
