use migrator::common::LockRegistry;
use migrator::errors::MigratorResult;
use migrator::migration::Migration;
use migrator::migrator::Migrator;
use migrator::store::memory::InMemoryDatabase;

fn create_table(name: &'static str) -> impl Fn(&InMemoryDatabase) -> MigratorResult<()> {
    move |db: &InMemoryDatabase| db.create_collection(name)
}

fn drop_table(name: &'static str) -> impl Fn(&InMemoryDatabase) -> MigratorResult<()> {
    move |db: &InMemoryDatabase| db.drop_collection(name).map(|_| ())
}

/// Runs every command given on the command line, in order, against a fresh
/// in-memory database. Commands are separated by `,`:
///
/// ```text
/// migrator_int_test init , up 2 , version , reset
/// ```
fn main() -> MigratorResult<()> {
    colog::init();

    let migrator = Migrator::builder()
        .advisory_lock(LockRegistry::new())
        .add_migration(Migration::new(1, "create_users", create_table("users"), drop_table("users")))
        .add_migration(Migration::new(2, "create_orders", create_table("orders"), drop_table("orders")))
        .add_migration(Migration::new(3, "create_invoices", create_table("invoices"), drop_table("invoices")))
        .build()?;

    let db = InMemoryDatabase::new();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = if args.is_empty() {
        vec!["init", ",", "up", ",", "version"]
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        args
    };

    for command in args.split(|arg| arg == ",") {
        log::info!("Running '{}'", command.join(" "));
        let change = migrator.run(&db, command)?;
        println!(
            "{:<16} {} (collections: {:?})",
            command.join(" "),
            change,
            db.collection_names()
        );
    }

    for entry in migrator.status(&db)? {
        println!("{:>4} {:<16} {:?}", entry.version, entry.name, entry.state);
    }
    Ok(())
}
