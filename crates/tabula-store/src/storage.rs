//! Storage layer
//!
//! Every public operation compiles its statement on the calling thread, runs
//! it as one job on the [`ExecutionQueue`], then hydrates the returned rows
//! back on the calling thread. A save batch is a single job wrapping a single
//! transaction, so concurrent readers only ever see committed states.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tabula_core::expr::{compile, compile_order_by, quote_identifier, CompiledClause};
use tabula_core::model::AnyStorageObject;
use tabula_core::{
    log_op_end, log_op_error, log_op_start, materializer, ArgSource, Cardinality, Expression,
    PropertyRegistry, Result, SortDescriptor, StorageObject, TabulaError, TypeEntry, Value,
};

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, transaction_aborted};
use crate::notification::{SaveNotification, SaveObserver};
use crate::queue::ExecutionQueue;
use crate::sql;

/// Counters of statements issued through a [`StorageLayer`]
#[derive(Debug, Default)]
pub struct QueryStats {
    fetches: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
}

impl QueryStats {
    /// SELECT statements executed (including relationship resolution)
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Rows inserted by committed saves
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Rows updated by committed saves
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

struct PendingWrite {
    table: String,
    statement: String,
    args: Vec<SqlValue>,
    is_insert: bool,
}

struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

pub struct StorageLayer {
    queue: ExecutionQueue,
    registry: Arc<PropertyRegistry>,
    observers: RwLock<Vec<SaveObserver>>,
    stats: QueryStats,
}

impl StorageLayer {
    /// Storage layer over `queue` using the process-wide registry
    pub fn new(queue: ExecutionQueue) -> Self {
        Self::with_registry(queue, PropertyRegistry::shared())
    }

    pub fn with_registry(queue: ExecutionQueue, registry: Arc<PropertyRegistry>) -> Self {
        Self {
            queue,
            registry,
            observers: RwLock::new(Vec::new()),
            stats: QueryStats::default(),
        }
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(ExecutionQueue::open(config)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &ExecutionQueue {
        &self.queue
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Register an observer called after every committed save
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&SaveNotification) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    // ===== Tables =====

    /// Create the table for `T`; a no-op when it already exists
    pub fn create_table<T: StorageObject>(&self) -> Result<()> {
        let start = Instant::now();
        let entry = self.registry.entry_for::<T>()?;
        log_op_start!("create_table", type_name = T::TYPE_NAME, table = entry.table_name());

        let statement = sql::create_table(&entry);
        let result = self
            .queue
            .execute(move |conn| conn.execute_batch(&statement))
            .and_then(|r| r.map_err(|e| from_rusqlite("create_table", T::TYPE_NAME, e)));

        match &result {
            Ok(()) => log_op_end!("create_table", duration_ms = elapsed_ms(start)),
            Err(e) => log_op_error!("create_table", e.clone(), duration_ms = elapsed_ms(start)),
        }
        result
    }

    // ===== Save =====

    /// Save a homogeneous batch; see [`save_all`](Self::save_all)
    pub fn save<T: StorageObject>(&self, objects: &mut [T]) -> Result<()> {
        let mut erased: Vec<&mut dyn AnyStorageObject> = objects
            .iter_mut()
            .map(|o| o as &mut dyn AnyStorageObject)
            .collect();
        self.save_all(&mut erased)
    }

    /// Insert unsaved objects and update saved ones in one transaction.
    ///
    /// On success every inserted object carries its new primary key and one
    /// [`SaveNotification`] has been delivered. On failure nothing is written
    /// and no key is assigned. An empty batch does nothing.
    pub fn save_all(&self, objects: &mut [&mut dyn AnyStorageObject]) -> Result<()> {
        if objects.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let object_count = objects.len();
        log_op_start!("save", object_count = object_count);

        let result = self.save_batch(objects);
        match &result {
            Ok(()) => log_op_end!(
                "save",
                duration_ms = elapsed_ms(start),
                object_count = object_count
            ),
            Err(e) => log_op_error!("save", e.clone(), duration_ms = elapsed_ms(start)),
        }
        result
    }

    fn save_batch(&self, objects: &mut [&mut dyn AnyStorageObject]) -> Result<()> {
        let mut records = Vec::with_capacity(objects.len());
        let mut writes = Vec::with_capacity(objects.len());
        for object in objects.iter() {
            let record = object.to_record(&self.registry)?;
            let entry = self.registry.entry(&record.type_name)?;
            let mut args: Vec<SqlValue> = record.values.iter().map(sql::to_sql).collect();
            let statement = match record.primary_key {
                None => sql::insert(&entry),
                Some(key) => {
                    args.push(SqlValue::Integer(key));
                    sql::update(&entry)
                }
            };
            writes.push(PendingWrite {
                table: entry.table_name().to_string(),
                statement,
                args,
                is_insert: record.primary_key.is_none(),
            });
            records.push(record);
        }

        let keys = self.queue.execute(move |conn| write_batch(conn, &writes))??;

        let mut inserted = 0;
        let mut updated = 0;
        for ((object, record), key) in objects.iter_mut().zip(records.iter_mut()).zip(keys) {
            match key {
                Some(key) => {
                    object.assign_primary_key(key)?;
                    record.primary_key = Some(key);
                    inserted += 1;
                }
                None => updated += 1,
            }
        }
        self.stats.inserts.fetch_add(inserted, Ordering::Relaxed);
        self.stats.updates.fetch_add(updated, Ordering::Relaxed);

        let notification = SaveNotification {
            saved_classes: records.iter().map(|r| r.type_name.clone()).collect(),
            saved_objects: records,
        };
        for observer in self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            observer(&notification);
        }
        Ok(())
    }

    // ===== Fetch =====

    /// Single row by primary key
    pub fn fetch_by_primary_key<T: StorageObject>(&self, primary_key: i64) -> Result<Option<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let clause = CompiledClause {
            clause: format!(
                "{} = ?",
                quote_identifier(entry.primary_key().storage_field_name())
            ),
            args: vec![Value::Integer(primary_key)],
        };
        let mut found = self.select::<T>("fetch_by_primary_key", &entry, Some(clause), "", Some(1))?;
        Ok(found.pop())
    }

    /// Every row of `T`
    pub fn fetch_all<T: StorageObject>(&self, sorts: &[SortDescriptor]) -> Result<Vec<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let order_by = compile_order_by(sorts, &*entry)?;
        self.select("fetch_all", &entry, None, &order_by, None)
    }

    /// Rows whose properties equal every entry of `values`.
    ///
    /// A `Null` entry matches rows where the field IS NULL. An empty map
    /// matches every row.
    pub fn fetch_matching_values<T: StorageObject>(
        &self,
        values: &BTreeMap<String, Value>,
        sorts: &[SortDescriptor],
    ) -> Result<Vec<T>> {
        let mut terms: Vec<Expression> = values
            .iter()
            .map(|(property, value)| Expression::eq(property.clone(), value.clone()))
            .collect();
        match terms.len() {
            0 => self.fetch_all(sorts),
            1 => self.fetch_matching(&terms.remove(0), sorts),
            _ => self.fetch_matching(&Expression::and(terms), sorts),
        }
    }

    /// Rows matching `predicate`, ordered by `sorts` in listed order
    pub fn fetch_matching<T: StorageObject>(
        &self,
        predicate: &Expression,
        sorts: &[SortDescriptor],
    ) -> Result<Vec<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let clause = compile(predicate, &*entry)?;
        let order_by = compile_order_by(sorts, &*entry)?;
        self.select("fetch_matching", &entry, Some(clause), &order_by, None)
    }

    /// Run caller-supplied SQL and hydrate the result as `T`.
    ///
    /// Columns are matched to properties by storage field name, so the query
    /// must return every field of `T` including the primary key; other
    /// columns are ignored.
    pub fn fetch_from_query<T: StorageObject>(&self, query: &str, args: &[Value]) -> Result<Vec<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let rows = self.query("fetch_from_query", &entry, query.to_string(), args)?;
        hydrate_rows(&entry, rows)
    }

    fn select<T: StorageObject>(
        &self,
        op: &'static str,
        entry: &TypeEntry,
        clause: Option<CompiledClause>,
        order_by: &str,
        limit: Option<usize>,
    ) -> Result<Vec<T>> {
        let (where_clause, args) = match clause {
            Some(c) => (Some(c.clause), c.args),
            None => (None, Vec::new()),
        };
        let statement = sql::select(entry, where_clause.as_deref(), order_by, limit);
        let rows = self.query(op, entry, statement, &args)?;
        hydrate_rows(entry, rows)
    }

    fn query(
        &self,
        op: &'static str,
        entry: &TypeEntry,
        statement: String,
        args: &[Value],
    ) -> Result<RowSet> {
        let start = Instant::now();
        let type_name = entry.type_name().to_string();
        let args: Vec<SqlValue> = args.iter().map(sql::to_sql).collect();
        log_op_start!(op, type_name = type_name.as_str(), arg_count = args.len());

        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        let result = self
            .queue
            .execute(move |conn| read_rows(conn, &statement, &args))
            .and_then(|r| r.map_err(|e| from_rusqlite(op, &type_name, e)));

        match &result {
            Ok(rows) => log_op_end!(
                op,
                duration_ms = elapsed_ms(start),
                row_count = rows.rows.len()
            ),
            Err(e) => log_op_error!(op, e.clone(), duration_ms = elapsed_ms(start)),
        }
        result
    }

    // ===== Relationships =====

    /// Resolve fetched property `property_name` of `owner` without caching.
    ///
    /// Binds the template arguments from `owner`, compiles the template
    /// against `T` and fetches. `OneToOne` resolution returns at most one
    /// object. A template that reads the owner's key resolves to nothing
    /// while the owner is unsaved. [`Fetched`](crate::Fetched) wraps this
    /// with a per-instance cache.
    pub fn resolve_relationship<O, T>(
        &self,
        owner: &O,
        property_name: &str,
        expected: Cardinality,
    ) -> Result<Vec<T>>
    where
        O: StorageObject,
        T: StorageObject,
    {
        Ok(self
            .resolve_bound(owner, property_name, expected)?
            .unwrap_or_default())
    }

    /// `None` when the template needs the key of an unsaved owner
    pub(crate) fn resolve_bound<O, T>(
        &self,
        owner: &O,
        property_name: &str,
        expected: Cardinality,
    ) -> Result<Option<Vec<T>>>
    where
        O: StorageObject,
        T: StorageObject,
    {
        let owner_entry = self.registry.entry_for::<O>()?;
        let descriptor = owner_entry.fetched_property(property_name)?;
        let invalid = |reason: String| TabulaError::InvalidRelationship {
            type_name: O::TYPE_NAME.to_string(),
            property: property_name.to_string(),
            reason,
        };
        if descriptor.target_type_name() != T::TYPE_NAME {
            return Err(invalid(format!(
                "targets {} but was resolved as {}",
                descriptor.target_type_name(),
                T::TYPE_NAME
            )));
        }
        if descriptor.cardinality() != expected {
            return Err(invalid(format!(
                "declared {:?} but was read as {:?}",
                descriptor.cardinality(),
                expected
            )));
        }

        let mut bindings = HashMap::new();
        for arg in descriptor.template_args() {
            let value = match &arg.source {
                ArgSource::OwnerPrimaryKey => match owner.primary_key().get() {
                    Some(key) => Value::Integer(key),
                    None => {
                        tracing::debug!(
                            owner = O::TYPE_NAME,
                            property = property_name,
                            "owner has no key yet, nothing to resolve"
                        );
                        return Ok(None);
                    }
                },
                ArgSource::OwnerProperty(name) => O::accessors()
                    .iter()
                    .find(|a| a.property_name() == name)
                    .map(|a| a.read(owner))
                    .ok_or_else(|| TabulaError::UnknownProperty {
                        type_name: O::TYPE_NAME.to_string(),
                        name: name.clone(),
                    })?,
                ArgSource::Literal(value) => value.clone(),
            };
            bindings.insert(arg.placeholder.clone(), value);
        }
        let predicate = descriptor.predicate_template().bind(&bindings)?;

        let target_entry = self.registry.entry_for::<T>()?;
        let clause = compile(&predicate, &*target_entry)?;
        let limit = match expected {
            Cardinality::OneToOne => Some(1),
            Cardinality::OneToMany => None,
        };
        tracing::debug!(
            owner = O::TYPE_NAME,
            property = property_name,
            target = T::TYPE_NAME,
            "resolving fetched property"
        );
        self.select("resolve_relationship", &target_entry, Some(clause), "", limit)
            .map(Some)
    }
}

fn write_batch(conn: &mut Connection, writes: &[PendingWrite]) -> Result<Vec<Option<i64>>> {
    let tx = conn
        .transaction()
        .map_err(|e| transaction_aborted("<begin>", e))?;
    let mut keys = Vec::with_capacity(writes.len());
    for write in writes {
        tx.execute(&write.statement, params_from_iter(write.args.iter()))
            .map_err(|e| transaction_aborted(&write.table, e))?;
        keys.push(write.is_insert.then(|| tx.last_insert_rowid()));
    }
    // Dropping an uncommitted transaction rolls it back.
    tx.commit()
        .map_err(|e| transaction_aborted("<commit>", e))?;
    Ok(keys)
}

fn read_rows(conn: &mut Connection, statement: &str, args: &[SqlValue]) -> rusqlite::Result<RowSet> {
    let mut stmt = conn.prepare(statement)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(sql::from_sql))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(RowSet { columns, rows })
}

fn hydrate_rows<T: StorageObject>(entry: &TypeEntry, row_set: RowSet) -> Result<Vec<T>> {
    let positions = entry
        .ordered_fields(true)
        .into_iter()
        .map(|field| {
            row_set
                .columns
                .iter()
                .position(|c| c == field)
                .ok_or_else(|| TabulaError::UnknownProperty {
                    type_name: entry.type_name().to_string(),
                    name: field.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    row_set
        .rows
        .into_iter()
        .map(|row| {
            let values = positions.iter().map(|&i| row[i].clone()).collect();
            materializer::hydrate(entry, values)
        })
        .collect()
}
