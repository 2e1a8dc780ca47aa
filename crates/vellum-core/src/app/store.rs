//! ObjectStore - アップロード/ダウンロードのオーケストレーター
//!
//! # 順序の契約
//! - upload: sign → blob put → catalog insert
//! - download: catalog lookup → blob get
//!
//! 署名が失敗したら backend にもカタログにも触らない。
//! blob put が確定するまでカタログの行は作らない。
//! カタログの insert が upload の最後のコミットになります。
//!
//! # 孤立した blob
//! put 成功後に insert が失敗すると blob だけが残る。
//! ここでは削除を試みず、`warn!` でキーを記録するだけです。

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::executor::{BackendExecutor, join_backend};
use crate::domain::{NewObject, ObjectMeta, PublicId, StorageStage, StoreError};
use crate::ports::{BlobBackend, Catalog, CatalogError, Clock, PublicIdGenerator, Signer};

/// public id が衝突したときに insert を試す最大回数
pub const MAX_PUBLIC_ID_ATTEMPTS: usize = 3;

/// ObjectStore は Signer / BlobBackend / Catalog を順序どおりに呼ぶ
///
/// 可変な共有状態は持たないので、複数のリクエストから同時に呼んでよい。
/// 同じ名前の同時アップロードは直列化しない（上流のバリデーターの責務）。
pub struct ObjectStore {
    signer: Arc<dyn Signer>,
    backend: Arc<dyn BlobBackend>,
    catalog: Arc<dyn Catalog>,
    ids: Arc<dyn PublicIdGenerator>,
    clock: Arc<dyn Clock>,
    executor: BackendExecutor,
}

impl ObjectStore {
    /// 部品から直接組み立てる（backend は init 済みであること）
    ///
    /// 通常は [`StoreBuilder`](super::StoreBuilder) を使う。
    pub fn new(
        signer: Arc<dyn Signer>,
        backend: Arc<dyn BlobBackend>,
        catalog: Arc<dyn Catalog>,
        ids: Arc<dyn PublicIdGenerator>,
        clock: Arc<dyn Clock>,
        executor: BackendExecutor,
    ) -> Self {
        Self {
            signer,
            backend,
            catalog,
            ids,
            clock,
            executor,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn executor(&self) -> &BackendExecutor {
        &self.executor
    }

    /// bytes を署名・保存・登録して public id を返す
    ///
    /// # Errors
    /// - 名前が空: InvalidArgument（I/O なし）
    /// - 署名失敗: SignatureFailure（backend/カタログは呼ばれない）
    /// - put 失敗: StorageFailure(BlobPut)（カタログは呼ばれない）
    /// - insert 失敗: StorageFailure(CatalogInsert)（blob は残る）
    pub async fn upload(
        &self,
        payload: Bytes,
        name: &str,
        mime_type: &str,
    ) -> Result<PublicId, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("object name is empty".into()));
        }

        let signature = self.signer.sign(&payload, name)?;
        let size_bytes = payload.len() as u64;
        debug!(name, size = size_bytes, "payload signed");

        let backend = Arc::clone(&self.backend);
        let key = name.to_string();
        let put = self
            .executor
            .submit(async move { backend.put(&key, payload).await });
        join_backend(put, StorageStage::BlobPut).await?;

        let created_at = self.clock.now();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let public_id = self.ids.generate();
            let record = NewObject {
                public_id: public_id.clone(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                size_bytes,
                signature: signature.clone(),
                created_at,
            };

            match self.catalog.insert(record).await {
                Ok(internal_id) => {
                    info!(
                        name,
                        public_id = %public_id,
                        internal_id = internal_id.get(),
                        size = size_bytes,
                        "upload completed"
                    );
                    return Ok(public_id);
                }
                Err(CatalogError::DuplicatePublicId(id)) if attempt < MAX_PUBLIC_ID_ATTEMPTS => {
                    warn!(name, public_id = %id, attempt, "public id collision, regenerating");
                }
                Err(err) => {
                    warn!(name, error = %err, "blob stored but catalog insert failed, blob is orphaned");
                    return Err(StoreError::storage(StorageStage::CatalogInsert, err));
                }
            }
        }
    }

    /// public id の bytes を返す
    ///
    /// カタログに行がなければ、backend に bytes が残っていても NotFound。
    pub async fn download(&self, public_id: &str) -> Result<Bytes, StoreError> {
        if public_id.trim().is_empty() {
            return Err(StoreError::InvalidArgument("public id is empty".into()));
        }

        let id = PublicId::new(public_id);
        let record = self
            .catalog
            .find_by_public_id(&id)
            .await
            .map_err(|err| StoreError::storage(StorageStage::CatalogLookup, err))?
            .ok_or_else(|| StoreError::NotFound(public_id.to_string()))?;

        let backend = Arc::clone(&self.backend);
        let key = record.name.clone();
        let get = self.executor.submit(async move { backend.get(&key).await });
        let bytes = join_backend(get, StorageStage::BlobGet).await?;

        info!(public_id, name = %record.name, size = bytes.len(), "download completed");
        Ok(bytes)
    }

    /// カタログの全行を外部向けの形で返す
    pub async fn list_metadata(&self) -> Result<Vec<ObjectMeta>, StoreError> {
        let rows = self
            .catalog
            .list_all()
            .await
            .map_err(|err| StoreError::storage(StorageStage::CatalogList, err))?;
        Ok(rows.iter().map(ObjectMeta::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, InternalId, StorageCause, StoredObject};
    use crate::impls::key_file_signer::tests::{KeyEncoding, write_test_key};
    use crate::impls::memory_catalog::tests::record;
    use crate::impls::{InMemoryCatalog, KeyFileSigner, LocalBlobBackend};
    use crate::ports::{BackendError, FixedClock, SignError, SystemClock, UlidGenerator};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    fn calls(log: &CallLog) -> Vec<&'static str> {
        log.lock().unwrap().clone()
    }

    struct RecordingSigner {
        log: CallLog,
        fail: bool,
    }

    impl Signer for RecordingSigner {
        fn sign(&self, payload: &[u8], context: &str) -> Result<String, SignError> {
            self.log.lock().unwrap().push("sign");
            if context.is_empty() {
                return Err(SignError::MissingContext);
            }
            if self.fail {
                return Err(SignError::KeyDecode("bad key".into()));
            }
            Ok(format!("sig-{}", payload.len()))
        }
    }

    struct RecordingBackend {
        log: CallLog,
        inner: LocalBlobBackend,
        fail_put: bool,
    }

    #[async_trait]
    impl BlobBackend for RecordingBackend {
        async fn init(&self) -> Result<(), BackendError> {
            self.inner.init().await
        }

        async fn put(&self, key: &str, payload: Bytes) -> Result<(), BackendError> {
            self.log.lock().unwrap().push("put");
            if self.fail_put {
                return Err(BackendError::operation(key, std::io::Error::other("bucket gone")));
            }
            self.inner.put(key, payload).await
        }

        async fn get(&self, key: &str) -> Result<Bytes, BackendError> {
            self.log.lock().unwrap().push("get");
            self.inner.get(key).await
        }
    }

    struct RecordingCatalog {
        log: CallLog,
        inner: InMemoryCatalog,
        fail_insert: bool,
    }

    #[async_trait]
    impl Catalog for RecordingCatalog {
        async fn insert(&self, record: NewObject) -> Result<InternalId, CatalogError> {
            self.log.lock().unwrap().push("insert");
            if self.fail_insert {
                return Err(CatalogError::Io(std::io::Error::other("disk full")));
            }
            self.inner.insert(record).await
        }

        async fn find_by_public_id(&self, id: &PublicId) -> Result<Option<StoredObject>, CatalogError> {
            self.log.lock().unwrap().push("find");
            self.inner.find_by_public_id(id).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<StoredObject>, CatalogError> {
            self.inner.find_by_name(name).await
        }

        async fn list_all(&self) -> Result<Vec<StoredObject>, CatalogError> {
            self.inner.list_all().await
        }
    }

    /// 決められた順に ID を返す
    struct ScriptedIds(Mutex<VecDeque<&'static str>>);

    impl ScriptedIds {
        fn new(ids: &[&'static str]) -> Self {
            Self(Mutex::new(ids.iter().copied().collect()))
        }
    }

    impl PublicIdGenerator for ScriptedIds {
        fn generate(&self) -> PublicId {
            PublicId::new(self.0.lock().unwrap().pop_front().unwrap())
        }
    }

    #[derive(Default)]
    struct Faults {
        sign: bool,
        put: bool,
        insert: bool,
    }

    struct Harness {
        log: CallLog,
        catalog: Arc<RecordingCatalog>,
        store: ObjectStore,
    }

    async fn harness(faults: Faults) -> Harness {
        let log = CallLog::default();
        let backend = RecordingBackend {
            log: Arc::clone(&log),
            inner: LocalBlobBackend::in_memory(),
            fail_put: faults.put,
        };
        backend.init().await.unwrap();
        let catalog = Arc::new(RecordingCatalog {
            log: Arc::clone(&log),
            inner: InMemoryCatalog::new(),
            fail_insert: faults.insert,
        });
        let store = ObjectStore::new(
            Arc::new(RecordingSigner {
                log: Arc::clone(&log),
                fail: faults.sign,
            }),
            Arc::new(backend),
            catalog.clone(),
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::new(SystemClock),
            BackendExecutor::new(2),
        );
        Harness { log, catalog, store }
    }

    async fn store_with(
        signer: Arc<dyn Signer>,
        backend: Arc<dyn BlobBackend>,
        catalog: Arc<dyn Catalog>,
        ids: Arc<dyn PublicIdGenerator>,
    ) -> ObjectStore {
        backend.init().await.unwrap();
        ObjectStore::new(
            signer,
            backend,
            catalog,
            ids,
            Arc::new(SystemClock),
            BackendExecutor::default(),
        )
    }

    #[tokio::test]
    async fn upload_signs_then_stores_then_commits() {
        let h = harness(Faults::default()).await;

        h.store
            .upload(Bytes::from_static(b"hello"), "a.png", "image/png")
            .await
            .unwrap();

        assert_eq!(calls(&h.log), vec!["sign", "put", "insert"]);
    }

    #[tokio::test]
    async fn signature_failure_touches_nothing() {
        let h = harness(Faults {
            sign: true,
            ..Faults::default()
        })
        .await;

        let err = h
            .store
            .upload(Bytes::from_static(b"hello"), "a.png", "image/png")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SignatureFailure);
        assert_eq!(calls(&h.log), vec!["sign"]);
        assert!(h.catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_failure_creates_no_row() {
        let h = harness(Faults {
            put: true,
            ..Faults::default()
        })
        .await;

        let err = h
            .store
            .upload(Bytes::from_static(b"hello"), "a.png", "image/png")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(StorageStage::BlobPut));
        assert_eq!(calls(&h.log), vec!["sign", "put"]);
        assert!(h.store.list_metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_storage_failure_at_catalog_insert() {
        let h = harness(Faults {
            insert: true,
            ..Faults::default()
        })
        .await;

        let err = h
            .store
            .upload(Bytes::from_static(b"hello"), "a.png", "image/png")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert_eq!(err.stage(), Some(StorageStage::CatalogInsert));
        assert!(matches!(
            err,
            StoreError::StorageFailure {
                cause: StorageCause::Catalog(CatalogError::Io(_)),
                ..
            }
        ));
        assert_eq!(calls(&h.log), vec!["sign", "put", "insert"]);
    }

    #[rstest]
    #[case::blank_name("  ")]
    #[case::empty_name("")]
    #[tokio::test]
    async fn blank_name_is_rejected_before_any_call(#[case] name: &str) {
        let h = harness(Faults::default()).await;

        let err = h
            .store
            .upload(Bytes::from_static(b"x"), name, "image/png")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(calls(&h.log).is_empty());
    }

    #[tokio::test]
    async fn download_unknown_id_is_not_found() {
        let h = harness(Faults::default()).await;

        let err = h.store.download("nonexistent-id").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(calls(&h.log), vec!["find"]);
    }

    #[tokio::test]
    async fn download_blank_id_is_invalid_argument() {
        let h = harness(Faults::default()).await;

        let err = h.store.download("").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(calls(&h.log).is_empty());
    }

    #[tokio::test]
    async fn catalog_is_authoritative_over_backend() {
        let backend = Arc::new(LocalBlobBackend::in_memory());
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            backend.clone(),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
        .await;
        // blob だけあって行がない状態
        backend.put("ghost.png", Bytes::from_static(b"boo")).await.unwrap();

        let err = store.download("ghost.png").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn row_without_blob_is_storage_failure_at_blob_get() {
        let h = harness(Faults::default()).await;
        h.catalog.inner.insert(record("obj-lost", "lost.png")).await.unwrap();

        let err = h.store.download("obj-lost").await.unwrap_err();

        assert_eq!(err.stage(), Some(StorageStage::BlobGet));
        assert!(matches!(
            err,
            StoreError::StorageFailure {
                cause: StorageCause::Backend(BackendError::NotFound(_)),
                ..
            }
        ));
    }

    #[rstest]
    #[case::ascii(b"payload".as_slice())]
    #[case::single_byte(b"\x00".as_slice())]
    #[case::binary(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10][..])]
    #[tokio::test]
    async fn round_trip_in_memory(#[case] payload: &'static [u8]) {
        let h = harness(Faults::default()).await;

        let id = h
            .store
            .upload(Bytes::from_static(payload), "blob.bin", "image/png")
            .await
            .unwrap();

        assert_eq!(h.store.download(id.as_str()).await.unwrap().as_ref(), payload);
    }

    async fn assert_slash_variants_stay_separate(backend: Arc<LocalBlobBackend>) {
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            backend,
            Arc::new(InMemoryCatalog::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
        .await;
        let names = ["dir/a.png", "dir//a.png", "/dir/a.png", "dir/a.png/", "dir"];

        let mut uploaded = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let payload = Bytes::from(format!("payload-{i}"));
            let id = store.upload(payload.clone(), name, "image/png").await.unwrap();
            uploaded.push((id, payload));
        }

        for (id, payload) in uploaded {
            assert_eq!(store.download(id.as_str()).await.unwrap(), payload);
        }
    }

    #[tokio::test]
    async fn slash_structured_names_round_trip_separately_in_memory() {
        assert_slash_variants_stay_separate(Arc::new(LocalBlobBackend::in_memory())).await;
    }

    #[tokio::test]
    async fn slash_structured_names_round_trip_separately_on_disk() {
        let dir = TempDir::new().unwrap();
        assert_slash_variants_stay_separate(Arc::new(LocalBlobBackend::directory(dir.path()))).await;
    }

    #[tokio::test]
    async fn round_trip_on_local_filesystem() {
        let dir = TempDir::new().unwrap();
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            Arc::new(LocalBlobBackend::directory(dir.path().join("blobs"))),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
        .await;
        let payload = Bytes::from((0..=255u8).collect::<Vec<_>>());

        let id = store.upload(payload.clone(), "gradient.png", "image/png").await.unwrap();

        assert_eq!(store.download(id.as_str()).await.unwrap(), payload);
        assert!(dir.path().join("blobs").join("gradient.png").is_file());
    }

    #[tokio::test]
    async fn signed_upload_is_listed_with_verifiable_signature() {
        let dir = TempDir::new().unwrap();
        let signer = Arc::new(KeyFileSigner::new(&write_test_key(
            &dir,
            KeyEncoding::Pem,
            "Ed25519",
        )));
        let backend = Arc::new(LocalBlobBackend::in_memory());
        let store = store_with(
            signer.clone(),
            backend.clone(),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
        .await;
        let payload = Bytes::from_static(b"this is a test image!");
        assert_eq!(payload.len(), 21);

        let id = store.upload(payload.clone(), "test.jpg", "image/jpeg").await.unwrap();

        let listed = store.list_metadata().await.unwrap();
        assert_eq!(listed.len(), 1);
        let meta = &listed[0];
        assert_eq!(meta.public_id, id);
        assert_eq!(meta.name, "test.jpg");
        assert_eq!(meta.mime_type, "image/jpeg");
        assert_eq!(meta.size_bytes, 21);
        assert!(!meta.signature.is_empty());
        assert_eq!(meta.signature, signer.sign(&payload, "test.jpg").unwrap());
        assert!(signer.verify(&payload, &meta.signature).unwrap());

        let stored = backend.get("test.jpg").await.unwrap();
        assert_eq!(stored.len(), 21);
    }

    #[tokio::test]
    async fn colliding_public_id_is_regenerated() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert(record("obj-taken", "other.png")).await.unwrap();
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            Arc::new(LocalBlobBackend::in_memory()),
            catalog.clone(),
            Arc::new(ScriptedIds::new(&["obj-taken", "obj-fresh"])),
        )
        .await;

        let id = store
            .upload(Bytes::from_static(b"new"), "new.png", "image/png")
            .await
            .unwrap();

        assert_eq!(id.as_str(), "obj-fresh");
        assert_eq!(store.download("obj-fresh").await.unwrap().as_ref(), b"new");
    }

    #[tokio::test]
    async fn collisions_give_up_after_bounded_attempts() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert(record("obj-taken", "other.png")).await.unwrap();
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            Arc::new(LocalBlobBackend::in_memory()),
            catalog.clone(),
            Arc::new(ScriptedIds::new(&["obj-taken"; MAX_PUBLIC_ID_ATTEMPTS])),
        )
        .await;

        let err = store
            .upload(Bytes::from_static(b"new"), "new.png", "image/png")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(StorageStage::CatalogInsert));
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn created_at_comes_from_the_clock() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let catalog = Arc::new(InMemoryCatalog::new());
        let backend: Arc<dyn BlobBackend> = Arc::new(LocalBlobBackend::in_memory());
        backend.init().await.unwrap();
        let store = ObjectStore::new(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            backend,
            catalog.clone(),
            Arc::new(UlidGenerator::new(FixedClock::new(at))),
            Arc::new(FixedClock::new(at)),
            BackendExecutor::new(1),
        );

        store
            .upload(Bytes::from_static(b"t"), "t.png", "image/png")
            .await
            .unwrap();

        let row = catalog.find_by_name("t.png").await.unwrap().unwrap();
        assert_eq!(row.created_at, at);
        assert_eq!(row.signature, "sig-1");
    }

    struct PanickingBackend;

    #[async_trait]
    impl BlobBackend for PanickingBackend {
        async fn init(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn put(&self, _key: &str, _payload: Bytes) -> Result<(), BackendError> {
            panic!("backend exploded");
        }

        async fn get(&self, key: &str) -> Result<Bytes, BackendError> {
            Err(BackendError::NotFound(key.to_string()))
        }
    }

    #[tokio::test]
    async fn interrupted_put_surfaces_cancellation_and_commits_nothing() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let store = store_with(
            Arc::new(RecordingSigner {
                log: CallLog::default(),
                fail: false,
            }),
            Arc::new(PanickingBackend),
            catalog.clone(),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
        .await;

        let err = store
            .upload(Bytes::from_static(b"x"), "x.png", "image/png")
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.stage(), Some(StorageStage::BlobPut));
        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_of_distinct_names_all_commit() {
        let h = harness(Faults::default()).await;
        let store = Arc::new(h.store);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let name = format!("img-{i}.png");
                    store
                        .upload(Bytes::from(vec![i as u8; i + 1]), &name, "image/png")
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.list_metadata().await.unwrap().len(), 16);
    }
}
