use migrator::errors::{ErrorKind, VersionChange};
use migrator::migration::MigrationState;
use migrator::store::MigrationRecord;
use migrator_int_test::test_util::{cleanup, create_test_context, run_test, table_name, HISTORY};

#[test]
fn test_up_applies_all_in_order() {
    run_test(
        || create_test_context(&[3, 1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["up"])?, (0, 3));

            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2, 3]);
            assert_eq!(ctx.db().journal(), vec!["apply:1", "apply:2", "apply:3"]);
            for version in 1..=3 {
                assert!(ctx.db().store().has_collection(&table_name(version)));
            }
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_up_is_idempotent() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            ctx.db().clear_journal();

            assert_eq!(ctx.run(&["up"])?, (2, 2));
            assert!(ctx.db().journal().is_empty());
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_up_to_target() {
    run_test(
        || create_test_context(&[1, 2, 3, 4]),
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["up", "2"])?, (0, 2));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);

            // a target below the current version has nothing left to apply
            assert_eq!(ctx.run(&["up", "1"])?, (2, 2));

            assert_eq!(ctx.run(&["up", "3"])?, (2, 3));
            assert_eq!(ctx.db().journal(), vec!["apply:1", "apply:2", "apply:3"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_up_to_unknown_target_stops_below_it() {
    run_test(
        || create_test_context(&[10, 20, 30]),
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["up", "25"])?, (0, 20));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 10, 20]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_up_fills_gaps_below_current() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().seed_history(HISTORY, &[1, 3])?;

            assert_eq!(ctx.run(&["up"])?, (3, 3));
            assert_eq!(ctx.db().journal(), vec!["apply:2"]);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2, 3]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_up_keeps_history_without_code() {
    run_test(
        || create_test_context(&[1, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().seed_history(HISTORY, &[1, 2])?;

            assert_eq!(ctx.run(&["up"])?, (2, 3));
            assert_eq!(ctx.db().journal(), vec!["apply:3"]);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2, 3]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_failed_apply_keeps_progress_and_resumes() {
    run_test(
        || create_test_context(&[1, 2, 3, 4]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().fail_apply(3);

            let err = ctx.run(&["up"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MigrationFailed);
            assert_eq!(err.progress(), Some(VersionChange::new(0, 2)));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);
            assert_eq!(ctx.run(&["version"])?, (2, 2));

            ctx.db().clear_faults();
            ctx.db().clear_journal();
            assert_eq!(ctx.run(&["up"])?, (2, 4));
            assert_eq!(ctx.db().journal(), vec!["apply:3", "apply:4"]);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2, 3, 4]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_failed_history_insert_stops_run() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().fail_insert(2);

            let err = ctx.run(&["up"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreError);
            assert_eq!(err.progress(), Some(VersionChange::new(0, 1)));

            // the body ran but was never recorded, so it is still pending
            assert_eq!(ctx.db().journal(), vec!["apply:1", "apply:2"]);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1]);
            assert_eq!(
                ctx.migrator().pending(ctx.db(), None)?,
                vec![
                    MigrationRecord::new(2, "migration_2"),
                    MigrationRecord::new(3, "migration_3"),
                ]
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_pending_and_status() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().seed_history(HISTORY, &[1, 5])?;

            let pending: Vec<i64> = ctx
                .migrator()
                .pending(ctx.db(), None)?
                .iter()
                .map(|r| r.version)
                .collect();
            assert_eq!(pending, vec![2, 3]);

            let states: Vec<(i64, MigrationState)> = ctx
                .migrator()
                .status(ctx.db())?
                .iter()
                .map(|e| (e.version, e.state))
                .collect();
            assert_eq!(
                states,
                vec![
                    (0, MigrationState::Applied),
                    (1, MigrationState::Applied),
                    (2, MigrationState::Pending),
                    (3, MigrationState::Pending),
                    (5, MigrationState::Orphaned),
                ]
            );
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}
