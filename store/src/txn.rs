use sled::Transactional;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};

use crate::error::StoreError;

/// Handle passed into a `Store::with_transaction` closure. Wraps the two
/// trees (`main`, `index`) as a single serializable unit of work; sled
/// doesn't support range scans inside a transaction, so `ListByIndex`
/// (store::pagination + entity `list_*` functions) reads committed state
/// outside of explicit transactions, while every write that touches both a
/// primary row and its index rows does so here in one commit.
pub struct Txn<'a> {
    pub(crate) main: &'a TransactionalTree,
    pub(crate) index: &'a TransactionalTree,
}

impl<'a> Txn<'a> {
    pub fn get(&self, arn: &str) -> ConflictableTransactionResult<Option<Vec<u8>>, StoreError> {
        Ok(self
            .main
            .get(crate::keys::primary(arn))?
            .map(|ivec| ivec.to_vec()))
    }

    pub fn put(&self, arn: &str, bytes: &[u8]) -> ConflictableTransactionResult<(), StoreError> {
        self.main.insert(crate::keys::primary(arn), bytes)?;
        Ok(())
    }

    pub fn delete(&self, arn: &str) -> ConflictableTransactionResult<(), StoreError> {
        self.main.remove(crate::keys::primary(arn))?;
        Ok(())
    }

    pub fn put_index(
        &self,
        index_key: &[u8],
        arn: &str,
    ) -> ConflictableTransactionResult<(), StoreError> {
        self.index.insert(index_key, arn.as_bytes())?;
        Ok(())
    }

    pub fn get_index(
        &self,
        index_key: &[u8],
    ) -> ConflictableTransactionResult<Option<String>, StoreError> {
        Ok(self
            .index
            .get(index_key)?
            .map(|ivec| String::from_utf8_lossy(&ivec).into_owned()))
    }

    pub fn delete_index(&self, index_key: &[u8]) -> ConflictableTransactionResult<(), StoreError> {
        self.index.remove(index_key)?;
        Ok(())
    }

    /// Aborts the transaction with a typed error, rolling back every write
    /// made so far in this closure.
    pub fn fail(&self, err: StoreError) -> ConflictableTransactionError<StoreError> {
        ConflictableTransactionError::Abort(err)
    }
}

impl crate::Store {
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: Fn(&Txn) -> ConflictableTransactionResult<T, StoreError>,
    {
        let result = (&self.main, &self.index).transaction(|(main, index)| {
            let txn = Txn { main, index };
            f(&txn)
        });
        match result {
            Ok(value) => {
                self.cache.purge();
                Ok(value)
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StoreError::Sled(e)),
        }
    }
}
