use crate::errors::MigratorResult;
use crate::store::memory::InMemoryDatabase;
use crate::store::{HistoryCollectionProvider, MigrationRecord, RecordFilter, WriteConcern};

/// History collection of an [`InMemoryDatabase`].
///
/// The backing skip list is looked up on every call rather than held, so a
/// dropped collection reads as empty and the next insert recreates it, the
/// same way a document database behaves.
pub struct InMemoryHistory {
    name: String,
    write_concern: WriteConcern,
    database: InMemoryDatabase,
}

impl InMemoryHistory {
    pub fn new(name: &str, write_concern: WriteConcern, database: InMemoryDatabase) -> Self {
        InMemoryHistory {
            name: name.to_string(),
            write_concern,
            database,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HistoryCollectionProvider for InMemoryHistory {
    fn find_ascending(&self, filter: &RecordFilter) -> MigratorResult<Vec<MigrationRecord>> {
        self.database.check_opened()?;
        Ok(self
            .database
            .history_map(&self.name)
            .map(|map| {
                map.iter()
                    .map(|entry| entry.value().clone())
                    .filter(|record| filter.matches(record))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_one_descending(&self, filter: &RecordFilter) -> MigratorResult<Option<MigrationRecord>> {
        self.database.check_opened()?;
        Ok(self.database.history_map(&self.name).and_then(|map| {
            map.iter()
                .rev()
                .map(|entry| entry.value().clone())
                .find(|record| filter.matches(record))
        }))
    }

    fn insert_one(&self, record: MigrationRecord) -> MigratorResult<()> {
        self.database.check_opened()?;
        log::trace!(
            "Inserting {} into {} with {} write concern",
            record,
            self.name,
            self.write_concern
        );
        self.database
            .history_map_or_create(&self.name)
            .insert(record.version, record);
        Ok(())
    }

    fn insert_many(&self, records: Vec<MigrationRecord>) -> MigratorResult<()> {
        self.database.check_opened()?;
        let map = self.database.history_map_or_create(&self.name);
        for record in records {
            map.insert(record.version, record);
        }
        Ok(())
    }

    fn delete_one(&self, version: i64) -> MigratorResult<()> {
        self.database.check_opened()?;
        if let Some(map) = self.database.history_map(&self.name) {
            map.remove(&version);
        }
        Ok(())
    }

    fn drop_collection(&self) -> MigratorResult<()> {
        self.database.check_opened()?;
        self.database.remove_history(&self.name);
        Ok(())
    }

    fn write_concern(&self) -> WriteConcern {
        self.write_concern
    }
}
