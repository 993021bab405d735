use migrator::errors::{ErrorKind, MigratorError};
use migrator::migration::{correlate, Migration, MigrationSet};
use migrator::store::MigrationRecord;

fn applied(versions: &[i64]) -> Vec<Migration<()>> {
    versions
        .iter()
        .map(|v| Migration::from_record(&MigrationRecord::new(*v, &format!("m{}", v))))
        .collect()
}

fn known(versions: &[i64]) -> MigrationSet<()> {
    MigrationSet::new(versions.iter().map(|v| Migration::noop(*v, &format!("m{}", v))))
        .expect("Failed to build migration set")
}

fn subset(universe: &[i64], mask: u32) -> Vec<i64> {
    universe
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, v)| *v)
        .collect()
}

#[test]
fn test_correlate_succeeds_iff_history_is_covered() {
    let universe = [1, 2, 4, 7, 9];
    for applied_mask in 0..32u32 {
        for known_mask in 0..32u32 {
            let mut history = vec![0];
            history.extend(subset(&universe, applied_mask));
            let code = subset(&universe, known_mask);

            let actual = known(&code);
            let result = correlate(&applied(&history), actual.as_slice());
            let first_absent = history.iter().copied().find(|v| *v != 0 && !code.contains(v));

            match (result, first_absent) {
                (Ok(plan), None) => {
                    let versions: Vec<i64> = plan.iter().map(|m| m.version()).collect();
                    assert_eq!(versions, history);
                    assert!(plan.iter().all(|m| !m.is_stored()));
                }
                (Err(absent), Some(version)) => {
                    assert_eq!(absent.first_absent_version(), version);
                    let versions: Vec<i64> = absent.plan().iter().map(|m| m.version()).collect();
                    let expected: Vec<i64> =
                        history.iter().copied().take_while(|v| *v <= version).collect();
                    assert_eq!(versions, expected);
                }
                (Ok(_), Some(version)) => panic!("{} has no code but correlate succeeded", version),
                (Err(absent), None) => panic!("unexpected absent plan {:?}", absent),
            }
        }
    }
}

#[test]
fn test_absent_migrations_convert_to_error() {
    let actual = known(&[1]);
    let absent = correlate(&applied(&[0, 1, 3, 4]), actual.as_slice()).unwrap_err();
    let err = MigratorError::from(absent);

    assert_eq!(
        err.kind(),
        &ErrorKind::SomeMigrationsAreAbsent {
            version: 3,
            plan: vec![
                MigrationRecord::new(0, "-"),
                MigrationRecord::new(1, "m1"),
                MigrationRecord::new(3, "m3"),
            ],
        }
    );
    assert!(err.message().contains("version 3"));
}
