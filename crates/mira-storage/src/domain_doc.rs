//! Domain document storage - permanent reference text keyed by document id.

use crate::define_simple_storage;

define_simple_storage! {
    /// Raw storage for domain knowledge documents
    pub struct DomainDocStorage { table: "domain_docs" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::Database;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn create_test_storage() -> DomainDocStorage {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        DomainDocStorage::new(db).unwrap()
    }

    #[test]
    fn test_put_reports_replacement() {
        let storage = create_test_storage();

        assert!(!storage.put_raw("doc-1", b"first").unwrap());
        assert!(storage.put_raw("doc-1", b"second").unwrap());
        assert_eq!(storage.get_raw("doc-1").unwrap().unwrap(), b"second");
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_list_and_delete() {
        let storage = create_test_storage();

        storage.put_raw("doc-b", b"b").unwrap();
        storage.put_raw("doc-a", b"a").unwrap();

        let ids: Vec<String> = storage.list_raw().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["doc-a", "doc-b"]);

        assert!(storage.delete("doc-a").unwrap());
        assert!(!storage.delete("doc-a").unwrap());
        assert!(storage.get_raw("doc-a").unwrap().is_none());
    }
}
