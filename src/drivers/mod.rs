mod tokio_postgres;

pub use self::in_memory_test::{InMemoryBinding, RecordedQuery};
pub use self::tokio_postgres::PostgresBinding;
