//! In-memory authoritative config store.

use std::sync::Arc;

use gwconf_protocol::ConfigDocument;
use parking_lot::RwLock;

/// Holds the current configuration document.
///
/// The document lives behind an `Arc` so readers take a snapshot and drop
/// the lock immediately; a replace swaps the whole `Arc`. A reader therefore
/// sees either the old or the new document, never a mix of both.
///
/// Each server owns its own store, so several servers can run in one
/// process.
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<ConfigDocument>>,
}

impl ConfigStore {
    /// Creates a store holding the initial document (generation 0, empty
    /// payload).
    pub fn new() -> Self {
        Self::with_document(ConfigDocument::default())
    }

    /// Creates a store holding `doc`.
    pub fn with_document(doc: ConfigDocument) -> Self {
        Self {
            current: RwLock::new(Arc::new(doc)),
        }
    }

    /// Returns a snapshot of the current document.
    pub fn get(&self) -> Arc<ConfigDocument> {
        Arc::clone(&*self.current.read())
    }

    /// Returns the current generation.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Replaces the document, returning the previous one.
    pub fn replace(&self, doc: impl Into<Arc<ConfigDocument>>) -> Arc<ConfigDocument> {
        let next = doc.into();
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Replaces the document if `check` accepts it given the current one.
    ///
    /// The check and the swap happen under one write lock, so no other
    /// update can slip in between. Returns the previous document on success.
    ///
    /// # Errors
    ///
    /// Returns whatever `check` returns; the store is left unchanged.
    pub fn replace_if<E>(
        &self,
        doc: impl Into<Arc<ConfigDocument>>,
        check: impl FnOnce(&ConfigDocument, &ConfigDocument) -> Result<(), E>,
    ) -> Result<Arc<ConfigDocument>, E> {
        let next = doc.into();
        let mut guard = self.current.write();
        check(&**guard, &next)?;
        Ok(std::mem::replace(&mut *guard, next))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwconf_codec::Value;

    fn doc(generation: u64, hostname: &str) -> ConfigDocument {
        ConfigDocument::new(
            generation,
            Value::map(vec![(
                Value::from("device"),
                Value::map(vec![(Value::from("hostname"), Value::from(hostname))]),
            )]),
        )
    }

    #[test]
    fn initial_document() {
        let store = ConfigStore::new();
        assert_eq!(store.generation(), 0);
        assert_eq!(*store.get(), ConfigDocument::default());
    }

    #[test]
    fn replace_is_full_not_merge() {
        let store = ConfigStore::new();
        store.replace(doc(1, "a"));
        let previous = store.replace(ConfigDocument::new(2, Value::empty_map()));

        assert_eq!(previous.generation, 1);
        assert_eq!(store.get().payload, Value::empty_map());
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn snapshots_survive_replace() {
        let store = ConfigStore::new();
        store.replace(doc(1, "a"));
        let snapshot = store.get();
        store.replace(doc(2, "b"));

        assert_eq!(*snapshot, doc(1, "a"));
        assert_eq!(*store.get(), doc(2, "b"));
    }

    #[test]
    fn replace_if_leaves_store_on_rejection() {
        let store = ConfigStore::with_document(doc(5, "a"));
        let result = store.replace_if(doc(3, "b"), |current, next| {
            if next.generation > current.generation {
                Ok(())
            } else {
                Err("stale")
            }
        });

        assert_eq!(result.unwrap_err(), "stale");
        assert_eq!(*store.get(), doc(5, "a"));
    }

    #[test]
    fn concurrent_readers_see_consistent_documents() {
        let store = Arc::new(ConfigStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for generation in 1..=200u64 {
                    store.replace(doc(generation, &format!("host-{generation}")));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = store.get();
                        if snapshot.generation > 0 {
                            let hostname = snapshot
                                .payload
                                .get("device")
                                .and_then(|d| d.get("hostname"))
                                .and_then(Value::as_text)
                                .unwrap()
                                .to_string();
                            assert_eq!(hostname, format!("host-{}", snapshot.generation));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.generation(), 200);
    }
}
