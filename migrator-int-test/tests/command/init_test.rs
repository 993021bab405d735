use migrator::errors::ErrorKind;
use migrator::migrator::Migrator;
use migrator::store::WriteConcern;
use migrator_int_test::test_util::{
    cleanup, create_test_context, run_test, tracked_migrations, TestContext, TestDatabase,
    HISTORY,
};

#[test]
fn test_init_records_zero_migration() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            assert_eq!(ctx.run(&["init"])?, (0, 0));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0]);
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_init_twice_fails() {
    run_test(
        || create_test_context(&[1]),
        |ctx| {
            ctx.run(&["init"])?;
            let err = ctx.run(&["init"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MigrationsCollectionAlreadyExists);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_commands_require_init() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            for args in [
                vec!["up"],
                vec!["down"],
                vec!["reset"],
                vec!["version"],
                vec!["set_version", "1"],
            ] {
                let err = ctx.run(&args).unwrap_err();
                assert_eq!(
                    err.kind(),
                    &ErrorKind::MigrationsNotInitialized,
                    "command {:?}",
                    args
                );
            }
            assert!(ctx.db().persisted_versions(HISTORY)?.is_empty());
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_version_reports_current() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["version"])?, (0, 0));
            ctx.run(&["up", "2"])?;
            assert_eq!(ctx.run(&["version"])?, (2, 2));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_invalid_command_lines() {
    run_test(
        || create_test_context(&[1]),
        |ctx| {
            let empty: [&str; 0] = [];
            assert_eq!(
                ctx.migrator().run(ctx.db(), &empty).unwrap_err().kind(),
                &ErrorKind::CommandRequired
            );
            assert_eq!(
                ctx.run(&["sideways"]).unwrap_err().kind(),
                &ErrorKind::UnexpectedCommand {
                    command: "sideways".to_string()
                }
            );
            assert_eq!(
                ctx.run(&["up", "latest"]).unwrap_err().kind(),
                &ErrorKind::InvalidVersionFormat {
                    argument: "latest".to_string()
                }
            );
            assert_eq!(
                ctx.run(&["set_version"]).unwrap_err().kind(),
                &ErrorKind::VersionNumberRequired
            );
            // parsing fails before the database is touched
            assert!(ctx.db().write_concerns().is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_history_writes_use_majority_by_default() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            ctx.run(&["down"])?;
            let concerns = ctx.db().write_concerns();
            assert_eq!(concerns.len(), 3);
            assert!(concerns.iter().all(|wc| *wc == WriteConcern::Majority));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_custom_collection_and_write_concern() {
    run_test(
        || {
            let migrator = Migrator::builder()
                .collection_name("schema_history")
                .write_concern(WriteConcern::Acknowledged)
                .add_migrations(tracked_migrations(&[1, 2]))
                .build()?;
            Ok(TestContext::new(TestDatabase::new(), migrator))
        },
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["up"])?, (0, 2));

            assert_eq!(ctx.db().persisted_versions("schema_history")?, vec![0, 1, 2]);
            assert!(ctx.db().persisted_versions(HISTORY)?.is_empty());
            assert!(ctx
                .db()
                .write_concerns()
                .iter()
                .all(|wc| *wc == WriteConcern::Acknowledged));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_closed_store_surfaces_store_error() {
    run_test(
        || create_test_context(&[1]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().store().close();
            let err = ctx.run(&["up"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreError);
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}
