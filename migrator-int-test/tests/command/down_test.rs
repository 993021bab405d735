use migrator::errors::{ErrorKind, VersionChange};
use migrator_int_test::test_util::{cleanup, create_test_context, run_test, table_name, HISTORY};

#[test]
fn test_down_reverts_one_step() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            ctx.db().clear_journal();

            assert_eq!(ctx.run(&["down"])?, (3, 2));
            assert_eq!(ctx.db().journal(), vec!["revert:3"]);
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);
            assert!(!ctx.db().store().has_collection(&table_name(3)));

            assert_eq!(ctx.run(&["down"])?, (2, 1));
            assert_eq!(ctx.run(&["down"])?, (1, 0));
            assert_eq!(ctx.db().journal(), vec!["revert:3", "revert:2", "revert:1"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_down_at_zero_is_noop() {
    run_test(
        || create_test_context(&[1]),
        |ctx| {
            ctx.run(&["init"])?;
            assert_eq!(ctx.run(&["down"])?, (0, 0));
            assert_eq!(ctx.run(&["down"])?, (0, 0));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0]);
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_down_steps_over_gaps_in_known_set() {
    run_test(
        || create_test_context(&[10, 20]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            assert_eq!(ctx.run(&["down"])?, (20, 10));
            assert_eq!(ctx.run(&["down"])?, (10, 0));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_down_without_code_for_current() {
    run_test(
        || create_test_context(&[1]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().seed_history(HISTORY, &[1, 7])?;

            let err = ctx.run(&["down"]).unwrap_err();
            match err.kind() {
                ErrorKind::SomeMigrationsAreAbsent { version, plan } => {
                    assert_eq!(*version, 7);
                    assert_eq!(plan.last().map(|r| r.version), Some(7));
                }
                other => panic!("unexpected error kind {:?}", other),
            }
            assert_eq!(err.progress(), Some(VersionChange::unchanged(7)));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 7]);
            assert!(ctx.db().journal().is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_failed_revert_keeps_history() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            ctx.db().fail_revert(2);

            let err = ctx.run(&["down"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MigrationFailed);
            assert_eq!(err.progress(), Some(VersionChange::unchanged(2)));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);
            Ok(())
        },
        cleanup,
    );
}
