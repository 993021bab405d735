use migrator::errors::{ErrorKind, VersionChange};
use migrator_int_test::test_util::{cleanup, create_test_context, run_test, HISTORY};

#[test]
fn test_set_version_forward_runs_no_code() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up", "1"])?;
            ctx.db().clear_journal();

            assert_eq!(ctx.run(&["set_version", "2"])?, (1, 2));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1, 2]);
            assert!(ctx.db().journal().is_empty());
            assert_eq!(ctx.run(&["version"])?, (2, 2));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_set_version_backward_rewrites_history() {
    run_test(
        || create_test_context(&[1, 2, 3]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().seed_history(HISTORY, &[1, 3, 9])?;

            assert_eq!(ctx.run(&["set_version", "1"])?, (9, 1));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1]);
            assert!(ctx.db().journal().is_empty());

            // forced history is authoritative for the next up
            assert_eq!(ctx.run(&["up"])?, (1, 3));
            assert_eq!(ctx.db().journal(), vec!["apply:2", "apply:3"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_set_version_to_zero() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up"])?;
            assert_eq!(ctx.run(&["set_version", "0"])?, (2, 0));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_set_version_to_current_is_unchanged() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up", "1"])?;
            ctx.db().fail_drop();

            // nothing is written, so the injected drop failure never triggers
            assert_eq!(ctx.run(&["set_version", "1"])?, (1, 1));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_set_version_unknown_target() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.run(&["up", "1"])?;

            let err = ctx.run(&["set_version", "5"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::TargetVersionNotFound { version: 5 });
            assert_eq!(err.progress(), Some(VersionChange::unchanged(1)));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0, 1]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_set_version_failed_write() {
    run_test(
        || create_test_context(&[1, 2]),
        |ctx| {
            ctx.run(&["init"])?;
            ctx.db().fail_drop();

            let err = ctx.run(&["set_version", "2"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreError);
            assert_eq!(err.progress(), Some(VersionChange::unchanged(0)));
            assert_eq!(ctx.db().persisted_versions(HISTORY)?, vec![0]);
            Ok(())
        },
        cleanup,
    );
}
