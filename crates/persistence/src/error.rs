//! Mapping of database errors onto the storage port error.

use domain::StoreError;

/// Converts a sqlx error into the error every domain port returns.
///
/// Unique violations (SQLSTATE 23505) become `Duplicate`; everything else is
/// a backend failure.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) if code.as_ref() == "23505" => {
                StoreError::Duplicate(db_err.message().to_string())
            }
            _ => StoreError::Backend(format!("Database error: {}", db_err)),
        },
        other => StoreError::Backend(format!("Database error: {}", other)),
    }
}
