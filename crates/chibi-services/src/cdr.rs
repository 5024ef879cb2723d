//! CDR reconciliation and batch ingest
//!
//! A CDR row starts life as a shell carrying only the carrier call
//! identifier. `CdrReconciler` performs the one-shot carrier lookup that
//! fills in the remaining fields and links the outbound leg to its bridged
//! inbound counterpart. `CdrIngestService` drives the same populate path for
//! every entry of an uploaded XML batch.

use chibi_carrier::xml::{self, XmlValue};
use chibi_core::models::Cdr;
use chibi_core::traits::{CallLookup, CdrRepository, PhoneCallRepository};
use chibi_core::{AppError, AppResult};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::storage::XmlStore;

/// Collapse the carrier's direction vocabulary to ours
///
/// The carrier reports outbound legs with qualified directions such as
/// `outbound-dial` and `outbound-api`; we keep a single `outbound` value.
/// Anything else passes through unchanged.
pub fn normalize_direction(raw: &str) -> String {
    if raw.starts_with("outbound") {
        "outbound".to_string()
    } else {
        raw.to_string()
    }
}

/// Populates CDR shells from the carrier's call records
///
/// Exactly one carrier lookup per populate; retry policy belongs to the
/// caller. The reconciler never persists by itself except through
/// [`CdrReconciler::create_populated`].
pub struct CdrReconciler<C, R, P> {
    carrier: C,
    cdrs: R,
    phone_calls: P,
}

impl<C, R, P> CdrReconciler<C, R, P>
where
    C: CallLookup,
    R: CdrRepository,
    P: PhoneCallRepository,
{
    pub fn new(carrier: C, cdrs: R, phone_calls: P) -> Self {
        Self {
            carrier,
            cdrs,
            phone_calls,
        }
    }

    /// Fill a shell from the carrier's record of its call leg
    ///
    /// Sets direction (normalized), timing, numbers, and the bridge link.
    /// Linking resolves the inbound leg whose `uuid` equals this leg's
    /// `bridge_uuid`; a missing match leaves the link empty without failing.
    /// Inbound legs additionally resolve their owning phone call.
    ///
    /// # Errors
    ///
    /// Fails when the carrier lookup fails or the record is missing; the
    /// shell is left partially updated only on the error paths of the
    /// follow-up database lookups.
    #[instrument(skip(self, cdr), fields(uuid = %cdr.uuid))]
    pub async fn populate(&self, cdr: &mut Cdr) -> AppResult<()> {
        let call = self.carrier.fetch_call(&cdr.uuid).await?;

        cdr.direction = normalize_direction(&call.direction);
        cdr.start_time = call.start_time;
        cdr.duration = call.duration;
        cdr.billsec = call.duration;
        cdr.from_number = if cdr.is_inbound() {
            call.from.clone()
        } else {
            call.to.clone()
        };
        cdr.to_number = call.to;
        cdr.bridge_uuid = call.parent_call_uuid;

        if !cdr.is_bridged() {
            if let Some(bridge_uuid) = cdr.bridge_uuid.clone() {
                match self.cdrs.find_inbound_by_uuid(&bridge_uuid).await? {
                    Some(inbound) => {
                        debug!("Linking {} to inbound leg {}", cdr.uuid, inbound.id);
                        cdr.inbound_cdr_id = Some(inbound.id);
                    }
                    None => {
                        // The inbound leg may not have been ingested yet.
                        debug!("No inbound leg found for bridge uuid {}", bridge_uuid);
                    }
                }
            }
        }

        if cdr.is_inbound() {
            if let Some(call_row) = self.phone_calls.find_by_call_uuid(&cdr.uuid).await? {
                cdr.phone_call_id = Some(call_row.id);
            }
        }

        Ok(())
    }

    /// Populate a fresh shell for `uuid` and persist it
    #[instrument(skip(self))]
    pub async fn create_populated(&self, uuid: &str) -> AppResult<Cdr> {
        let mut shell = Cdr::shell(uuid);
        self.populate(&mut shell).await?;
        self.cdrs.create(&shell).await
    }
}

/// Ingests uploaded CDR XML batches
///
/// Parses the payload, archives the raw document, and runs the populate
/// path for every entry. A carrier failure on any entry aborts the batch.
pub struct CdrIngestService<C, R, P> {
    reconciler: CdrReconciler<C, R, P>,
    store: XmlStore,
}

impl<C, R, P> CdrIngestService<C, R, P>
where
    C: CallLookup,
    R: CdrRepository,
    P: PhoneCallRepository,
{
    pub fn new(reconciler: CdrReconciler<C, R, P>, store: XmlStore) -> Self {
        Self { reconciler, store }
    }

    /// Parse, archive, and populate one uploaded batch
    ///
    /// The payload root must contain a `cdrs` element whose `cdr` children
    /// each carry a `uuid`. Returns the created CDRs in document order.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn ingest_batch(&self, payload: &str) -> AppResult<Vec<Cdr>> {
        let document = xml::parse(payload)?;
        let uuids = extract_batch_uuids(&document)?;

        let batch_id = Uuid::new_v4().to_string();
        self.store
            .save("cdr_batches", "payload", &batch_id, "batch.xml", payload.as_bytes())
            .await?;

        let mut created = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            created.push(self.reconciler.create_populated(&uuid).await?);
        }

        info!("Ingested CDR batch {} with {} entries", batch_id, created.len());
        Ok(created)
    }
}

/// Pull the entry uuids out of a parsed batch document, in document order
fn extract_batch_uuids(document: &XmlValue) -> AppResult<Vec<String>> {
    let cdrs = document
        .get("cdrs")
        .ok_or_else(|| AppError::MissingField("cdrs".to_string()))?;

    let entries = match cdrs.get("cdr") {
        Some(entry) => entry.entries(),
        None => Vec::new(),
    };

    entries
        .iter()
        .map(|entry| {
            entry
                .text_of("uuid")
                .map(str::to_string)
                .ok_or_else(|| AppError::MissingField("uuid".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chibi_core::models::{CarrierCall, PhoneCall};
    use chibi_core::traits::Repository;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockCarrier {
        calls: HashMap<String, CarrierCall>,
    }

    impl MockCarrier {
        fn with_call(call: CarrierCall) -> Self {
            let mut calls = HashMap::new();
            calls.insert(call.uuid.clone(), call);
            Self { calls }
        }
    }

    #[async_trait]
    impl CallLookup for MockCarrier {
        async fn fetch_call(&self, uuid: &str) -> AppResult<CarrierCall> {
            self.calls
                .get(uuid)
                .cloned()
                .ok_or_else(|| AppError::CallRecordNotFound(uuid.to_string()))
        }
    }

    #[derive(Default)]
    struct MockCdrRepo {
        rows: Mutex<Vec<Cdr>>,
        inbound_lookups: AtomicUsize,
    }

    impl MockCdrRepo {
        fn with_rows(rows: Vec<Cdr>) -> Self {
            Self {
                rows: Mutex::new(rows),
                inbound_lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Repository<Cdr, i64> for MockCdrRepo {
        async fn find_by_id(&self, id: i64) -> AppResult<Option<Cdr>> {
            Ok(self.rows.lock().iter().find(|c| c.id == id).cloned())
        }

        async fn find_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<Cdr>> {
            Ok(self.rows.lock().clone())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.lock().len() as i64)
        }

        async fn create(&self, entity: &Cdr) -> AppResult<Cdr> {
            let mut rows = self.rows.lock();
            let mut created = entity.clone();
            created.id = rows.len() as i64 + 1;
            rows.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: &Cdr) -> AppResult<Cdr> {
            Ok(entity.clone())
        }

        async fn delete(&self, _id: i64) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl CdrRepository for MockCdrRepo {
        async fn find_by_uuid(&self, uuid: &str) -> AppResult<Option<Cdr>> {
            Ok(self.rows.lock().iter().find(|c| c.uuid == uuid).cloned())
        }

        async fn find_inbound_by_uuid(&self, uuid: &str) -> AppResult<Option<Cdr>> {
            self.inbound_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .lock()
                .iter()
                .find(|c| c.uuid == uuid && c.is_inbound())
                .cloned())
        }

        async fn list_filtered(
            &self,
            _direction: Option<&str>,
            _start: Option<chrono::DateTime<Utc>>,
            _end: Option<chrono::DateTime<Utc>>,
            _limit: i64,
            _offset: i64,
        ) -> AppResult<(Vec<Cdr>, i64)> {
            let rows = self.rows.lock().clone();
            let total = rows.len() as i64;
            Ok((rows, total))
        }
    }

    #[derive(Default)]
    struct MockPhoneCallRepo {
        rows: Mutex<Vec<PhoneCall>>,
    }

    #[async_trait]
    impl Repository<PhoneCall, i64> for MockPhoneCallRepo {
        async fn find_by_id(&self, id: i64) -> AppResult<Option<PhoneCall>> {
            Ok(self.rows.lock().iter().find(|c| c.id == id).cloned())
        }

        async fn find_all(&self, _limit: i64, _offset: i64) -> AppResult<Vec<PhoneCall>> {
            Ok(self.rows.lock().clone())
        }

        async fn count(&self) -> AppResult<i64> {
            Ok(self.rows.lock().len() as i64)
        }

        async fn create(&self, entity: &PhoneCall) -> AppResult<PhoneCall> {
            let mut rows = self.rows.lock();
            let mut created = entity.clone();
            created.id = rows.len() as i64 + 1;
            rows.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: &PhoneCall) -> AppResult<PhoneCall> {
            Ok(entity.clone())
        }

        async fn delete(&self, _id: i64) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl PhoneCallRepository for MockPhoneCallRepo {
        async fn find_by_call_uuid(&self, call_uuid: &str) -> AppResult<Option<PhoneCall>> {
            Ok(self
                .rows
                .lock()
                .iter()
                .find(|c| c.call_uuid == call_uuid)
                .cloned())
        }
    }

    fn carrier_call(uuid: &str, direction: &str, parent: Option<&str>) -> CarrierCall {
        CarrierCall {
            uuid: uuid.to_string(),
            direction: direction.to_string(),
            start_time: Utc::now(),
            duration: 75,
            from: "+819011112222".to_string(),
            to: "+818033334444".to_string(),
            parent_call_uuid: parent.map(str::to_string),
        }
    }

    fn inbound_row(id: i64, uuid: &str) -> Cdr {
        Cdr {
            id,
            uuid: uuid.to_string(),
            direction: "inbound".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_direction() {
        assert_eq!(normalize_direction("outbound-dial"), "outbound");
        assert_eq!(normalize_direction("outbound-api"), "outbound");
        assert_eq!(normalize_direction("outbound"), "outbound");
        assert_eq!(normalize_direction("inbound"), "inbound");
    }

    #[tokio::test]
    async fn test_inbound_populate_takes_carrier_from() {
        let reconciler = CdrReconciler::new(
            MockCarrier::with_call(carrier_call("CA1", "inbound", None)),
            MockCdrRepo::default(),
            MockPhoneCallRepo::default(),
        );

        let mut cdr = Cdr::shell("CA1");
        reconciler.populate(&mut cdr).await.unwrap();

        assert_eq!(cdr.direction, "inbound");
        assert_eq!(cdr.from_number, "+819011112222");
        assert_eq!(cdr.to_number, "+818033334444");
        assert_eq!(cdr.duration, 75);
        assert_eq!(cdr.billsec, 75);
    }

    #[tokio::test]
    async fn test_outbound_populate_takes_carrier_to() {
        let reconciler = CdrReconciler::new(
            MockCarrier::with_call(carrier_call("CA2", "outbound-dial", None)),
            MockCdrRepo::default(),
            MockPhoneCallRepo::default(),
        );

        let mut cdr = Cdr::shell("CA2");
        reconciler.populate(&mut cdr).await.unwrap();

        assert_eq!(cdr.direction, "outbound");
        assert_eq!(cdr.from_number, "+818033334444");
    }

    #[tokio::test]
    async fn test_outbound_populate_links_inbound_leg_once() {
        let repo = MockCdrRepo::with_rows(vec![inbound_row(42, "CA-IN")]);
        let reconciler = CdrReconciler::new(
            MockCarrier::with_call(carrier_call("CA-OUT", "outbound-dial", Some("CA-IN"))),
            repo,
            MockPhoneCallRepo::default(),
        );

        let mut cdr = Cdr::shell("CA-OUT");
        reconciler.populate(&mut cdr).await.unwrap();
        assert_eq!(cdr.inbound_cdr_id, Some(42));

        // Already bridged: the second populate must not look up again.
        reconciler.populate(&mut cdr).await.unwrap();
        assert_eq!(cdr.inbound_cdr_id, Some(42));
        assert_eq!(reconciler.cdrs.inbound_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_inbound_match_is_silent() {
        let reconciler = CdrReconciler::new(
            MockCarrier::with_call(carrier_call("CA-OUT", "outbound-dial", Some("CA-GONE"))),
            MockCdrRepo::default(),
            MockPhoneCallRepo::default(),
        );

        let mut cdr = Cdr::shell("CA-OUT");
        reconciler.populate(&mut cdr).await.unwrap();

        assert_eq!(cdr.bridge_uuid.as_deref(), Some("CA-GONE"));
        assert!(cdr.inbound_cdr_id.is_none());
    }

    #[tokio::test]
    async fn test_inbound_populate_resolves_phone_call() {
        let phone_calls = MockPhoneCallRepo::default();
        phone_calls.rows.lock().push(PhoneCall {
            id: 9,
            call_uuid: "CA1".to_string(),
            ..Default::default()
        });

        let reconciler = CdrReconciler::new(
            MockCarrier::with_call(carrier_call("CA1", "inbound", None)),
            MockCdrRepo::default(),
            phone_calls,
        );

        let mut cdr = Cdr::shell("CA1");
        reconciler.populate(&mut cdr).await.unwrap();
        assert_eq!(cdr.phone_call_id, Some(9));
    }

    #[tokio::test]
    async fn test_populate_fails_on_unknown_call() {
        let reconciler = CdrReconciler::new(
            MockCarrier { calls: HashMap::new() },
            MockCdrRepo::default(),
            MockPhoneCallRepo::default(),
        );

        let mut cdr = Cdr::shell("CA-MISSING");
        let err = reconciler.populate(&mut cdr).await.unwrap_err();
        assert!(matches!(err, AppError::CallRecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_ingest_batch_creates_one_cdr_per_entry() {
        let mut calls = HashMap::new();
        calls.insert("CA0001".to_string(), carrier_call("CA0001", "inbound", None));
        calls.insert(
            "CA0002".to_string(),
            carrier_call("CA0002", "outbound-dial", Some("CA0001")),
        );

        let root = std::env::temp_dir().join(format!("chibi-ingest-{}", Uuid::new_v4()));
        let service = CdrIngestService::new(
            CdrReconciler::new(
                MockCarrier { calls },
                MockCdrRepo::default(),
                MockPhoneCallRepo::default(),
            ),
            XmlStore::new(&root),
        );

        let payload = r#"<cdrs>
            <cdr><uuid>CA0001</uuid></cdr>
            <cdr><uuid>CA0002</uuid></cdr>
        </cdrs>"#;

        let created = service.ingest_batch(payload).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].uuid, "CA0001");
        assert_eq!(created[1].uuid, "CA0002");
        // The outbound entry bridges to the inbound one ingested before it.
        assert_eq!(created[1].inbound_cdr_id, Some(created[0].id));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_ingest_batch_rejects_entry_without_uuid() {
        let root = std::env::temp_dir().join(format!("chibi-ingest-{}", Uuid::new_v4()));
        let service = CdrIngestService::new(
            CdrReconciler::new(
                MockCarrier { calls: HashMap::new() },
                MockCdrRepo::default(),
                MockPhoneCallRepo::default(),
            ),
            XmlStore::new(&root),
        );

        let err = service
            .ingest_batch("<cdrs><cdr><duration>3</duration></cdr></cdrs>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField(_)));
    }
}
