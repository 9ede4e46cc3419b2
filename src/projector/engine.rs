use crate::config::MigrateConfig;
use crate::destination::{Destination, DestinationId, Document, EntityKind};
use crate::error::{MigrateError, StoreError};
use crate::legacy::{Developer, Project, Property};
use crate::projector::documents::{
    blog_document, decode_videos, developer_document, developer_name, locality_document,
    project_document, property_document, ProjectLinks,
};
use crate::projector::translation::TranslationMap;
use crate::projector::upsert::{upsert, UpsertAction};
use crate::projector::web_card::{build_web_card, WebCardSources};
use crate::store::InMemoryStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Outcome counts for one destination kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub created: usize,
    pub merged: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub tables_loaded: usize,
    pub rows_loaded: usize,
    pub kinds: BTreeMap<EntityKind, KindCounts>,
    /// Child collections that could not be read and were migrated as empty
    pub degraded_collections: usize,
    pub cancelled: bool,
}

impl MigrationReport {
    pub fn counts(&self, kind: EntityKind) -> KindCounts {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    pub fn total_created(&self) -> usize {
        self.kinds.values().map(|c| c.created).sum()
    }

    pub fn total_merged(&self) -> usize {
        self.kinds.values().map(|c| c.merged).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.kinds.values().map(|c| c.failed).sum()
    }

    fn entry(&mut self, kind: EntityKind) -> &mut KindCounts {
        self.kinds.entry(kind).or_default()
    }
}

/// Projects a loaded store into a destination.
///
/// Passes run in reference order: developers, localities, projects with their
/// properties, orphan properties, blogs. References between records resolve
/// only through the run's [`TranslationMap`].
pub struct Migrator<'a, D: Destination + ?Sized> {
    store: &'a InMemoryStore,
    destination: &'a D,
    config: &'a MigrateConfig,
    translations: TranslationMap,
    developers_by_name: HashMap<String, DestinationId>,
    report: MigrationReport,
}

impl<'a, D: Destination + ?Sized> Migrator<'a, D> {
    pub fn new(store: &'a InMemoryStore, destination: &'a D, config: &'a MigrateConfig) -> Self {
        Migrator {
            store,
            destination,
            config,
            translations: TranslationMap::new(),
            developers_by_name: HashMap::new(),
            report: MigrationReport::default(),
        }
    }

    #[instrument(skip_all)]
    pub fn run(mut self, cancel: &CancellationToken) -> Result<MigrationReport, MigrateError> {
        let projects = self.store.all_projects().map_err(MigrateError::primary_join)?;

        self.migrate_developers(&projects)?;
        self.migrate_localities()?;

        for project in &projects {
            if cancel.is_cancelled() {
                warn!(project_id = project.id, "cancelled, stopping before project");
                self.report.cancelled = true;
                return Ok(self.report);
            }
            self.migrate_project(project)?;
        }

        self.migrate_orphan_properties()?;
        self.migrate_blogs()?;

        info!(
            created = self.report.total_created(),
            merged = self.report.total_merged(),
            failed = self.report.total_failed(),
            "migration passes complete"
        );
        Ok(self.report)
    }

    /// Upsert one record and translate its legacy ID.
    ///
    /// A record the destination refuses is counted as failed and yields
    /// `None`; only errors meaning the destination is gone abort the run.
    fn apply(
        &mut self,
        kind: EntityKind,
        legacy_id: i64,
        fields: Document,
    ) -> Result<Option<DestinationId>, MigrateError> {
        match upsert(self.destination, kind, fields) {
            Ok(upserted) => {
                let counts = self.report.entry(kind);
                match upserted.action {
                    UpsertAction::Created => counts.created += 1,
                    UpsertAction::Merged => counts.merged += 1,
                    UpsertAction::Unchanged => counts.unchanged += 1,
                }
                let id = self.translations.record(kind, legacy_id, upserted.id).clone();
                Ok(Some(id))
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(kind = %kind, legacy_id, error = %err, "record rejected by destination");
                self.report.entry(kind).failed += 1;
                Ok(None)
            }
        }
    }

    /// Read a non-primary collection, degrading to empty on failure
    fn degrade<T>(
        &mut self,
        result: Result<Vec<T>, StoreError>,
        collection: &'static str,
        project_id: Option<i64>,
    ) -> Vec<T> {
        result.unwrap_or_else(|err| {
            warn!(collection, ?project_id, error = %err, "collection unavailable, using empty");
            self.report.degraded_collections += 1;
            Vec::new()
        })
    }

    /// Developers referenced by projects, de-duplicated on trimmed name
    fn migrate_developers(&mut self, projects: &[Arc<Project>]) -> Result<(), MigrateError> {
        let mut seen = Vec::new();
        for developer_id in projects.iter().filter_map(|p| p.developer_id) {
            if seen.contains(&developer_id) {
                continue;
            }
            seen.push(developer_id);

            let developer: Arc<Developer> = match self.store.get_developer(developer_id) {
                Ok(developer) => developer,
                Err(StoreError::NotFound { .. }) => {
                    debug!(developer_id, "project references missing developer");
                    continue;
                }
                Err(err) => return Err(MigrateError::primary_join(err)),
            };
            let Some(name) = developer_name(&developer) else {
                warn!(developer_id, "developer without a name, skipping");
                self.report.entry(EntityKind::Developer).skipped += 1;
                continue;
            };

            let fields = developer_document(&developer, name);
            if let Some(id) = self.apply(EntityKind::Developer, developer.id, fields)? {
                self.developers_by_name.entry(name.to_string()).or_insert(id);
            }
        }
        debug!(developers = self.developers_by_name.len(), "developer name map built");
        Ok(())
    }

    fn migrate_localities(&mut self) -> Result<(), MigrateError> {
        let localities = self.store.all_localities();
        for locality in self.degrade(localities, "locality", None) {
            let city = locality.city_id.and_then(|id| self.store.get_city(id).ok());
            let fields = locality_document(&locality, city.as_deref());
            self.apply(EntityKind::Locality, locality.id, fields)?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(project_id = project.id))]
    fn migrate_project(&mut self, project: &Project) -> Result<(), MigrateError> {
        let store = self.store;
        let id = project.id;

        let images = self.degrade(store.images_by_project(id), "project_image", Some(id));
        let amenities = self.degrade(store.amenities_by_project(id), "amenity", Some(id));
        let rera = self.degrade(store.rera_by_project(id), "rera_info", Some(id));
        let floor_plans = self.degrade(store.floor_plans_by_project(id), "floor_plan", Some(id));
        let payment_plans =
            self.degrade(store.payment_plans_by_project(id), "payment_plan", Some(id));
        let faqs = self.degrade(store.faqs_by_project(id), "faq", Some(id));

        let web_card = build_web_card(
            &WebCardSources {
                logo: project.project_logo.as_deref(),
                images: &images,
                amenities: &amenities,
                rera: &rera,
                floor_plans: &floor_plans,
                payment_plans: &payment_plans,
                faqs: &faqs,
            },
            &self.config.default_unit_type,
            &self.config.default_amenity_category,
            &self.config.rera_defaults,
        );

        let developer = project
            .developer_id
            .and_then(|developer_id| store.get_developer(developer_id).ok());
        let developer_link = developer.as_deref().and_then(developer_name).and_then(|name| {
            self.developers_by_name
                .get(name)
                .map(|developer_id| (developer_id, name))
        });
        if project.developer_id.is_some() && developer_link.is_none() {
            debug!("developer unresolved, project migrates without developer");
        }

        let configuration = project
            .configuration_id
            .and_then(|c| store.get_configuration(c).ok());
        let configuration_type = project
            .configuration_type_id
            .and_then(|c| store.get_configuration_type(c).ok());

        let links = ProjectLinks {
            developer: developer_link,
            locality: project
                .locality_id
                .and_then(|l| self.translations.resolve(EntityKind::Locality, l)),
            configuration: configuration
                .as_ref()
                .and_then(|c| c.project_configuration_name.as_deref()),
            configuration_type: configuration_type
                .as_ref()
                .and_then(|c| c.project_configuration_type_name.as_deref()),
        };
        let videos = decode_videos(
            id,
            project.videos.as_deref(),
            self.config.drop_undecodable_videos,
        );
        let fields = project_document(project, &links, &web_card, videos);

        let properties = self.degrade(store.properties_by_project(id), "property", Some(id));
        match self.apply(EntityKind::Project, id, fields)? {
            Some(project_ref) => {
                for property in &properties {
                    self.migrate_property(property, Some(&project_ref))?;
                }
            }
            None => {
                if !properties.is_empty() {
                    warn!(properties = properties.len(), "project failed, skipping its properties");
                }
                self.report.entry(EntityKind::Property).skipped += properties.len();
            }
        }
        Ok(())
    }

    fn migrate_property(
        &mut self,
        property: &Property,
        project: Option<&DestinationId>,
    ) -> Result<(), MigrateError> {
        let fields = property_document(property, project, &self.config.default_unit_type);
        self.apply(EntityKind::Property, property.id, fields)?;
        Ok(())
    }

    /// Properties whose project is absent from the snapshot migrate without a project edge
    fn migrate_orphan_properties(&mut self) -> Result<(), MigrateError> {
        let properties = self.store.all_properties();
        for property in self.degrade(properties, "property", None) {
            let orphan = match property.project_id {
                None => true,
                Some(project_id) => matches!(
                    self.store.get_project(project_id),
                    Err(StoreError::NotFound { .. })
                ),
            };
            if orphan {
                self.migrate_property(&property, None)?;
            }
        }
        Ok(())
    }

    fn migrate_blogs(&mut self) -> Result<(), MigrateError> {
        let blogs = self.store.all_blogs();
        for blog in self.degrade(blogs, "blog", None) {
            self.apply(EntityKind::Blog, blog.id, blog_document(&blog))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{CreateOutcome, MemoryDestination, NaturalKey, Record};
    use crate::error::DestinationError;
    use crate::snapshot::SnapshotReader;
    use crate::store::LoadOptions;
    use serde_json::{json, Value};

    fn loaded_store(tables: &[(&str, Value)]) -> InMemoryStore {
        let dir = std::env::temp_dir().join(format!("foundry-engine-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, rows) in tables {
            std::fs::write(dir.join(format!("{}.json", name)), rows.to_string()).unwrap();
        }
        let store = InMemoryStore::new();
        store
            .load(&SnapshotReader::open(&dir).unwrap(), &LoadOptions::default())
            .unwrap();
        store
    }

    fn acme_store() -> InMemoryStore {
        loaded_store(&[
            ("developer", json!([{"id": 5, "developer_name": "Acme Builders"}])),
            ("project", json!([
                {"id": 1, "project_name": "Skyline", "developer_id": 5, "locality_id": 9},
                {"id": 2, "project_name": "Harbour View", "developer_id": 5}
            ])),
            ("locality", json!([{"id": 9, "name": "Baner", "city_id": 3}])),
            ("city", json!([{"id": 3, "name": "Pune"}])),
            ("property", json!([
                {"id": 100, "project_id": 1, "property_name": "Skyline 2 BHK"},
                {"id": 101, "project_id": 404, "property_name": "Lost Unit"}
            ])),
            ("blog", json!([{"id": 1, "title": "Hello"}])),
        ])
    }

    #[test]
    fn test_projects_share_one_developer() {
        let store = acme_store();
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        let report = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.counts(EntityKind::Developer).created, 1);
        assert_eq!(report.counts(EntityKind::Project).created, 2);
        assert_eq!(report.counts(EntityKind::Property).created, 2);
        assert_eq!(report.counts(EntityKind::Locality).created, 1);
        assert_eq!(report.counts(EntityKind::Blog).created, 1);

        let developers = dest.records(EntityKind::Developer).unwrap();
        assert_eq!(developers.len(), 1);
        for project in dest.records(EntityKind::Project).unwrap() {
            assert_eq!(project.fields["developer"]["id"], json!(developers[0].id.as_str()));
            assert_eq!(project.fields["developer"]["name"], json!("Acme Builders"));
        }

        let locality = &dest.records(EntityKind::Locality).unwrap()[0];
        let skyline = dest
            .find_by_unique_key(
                EntityKind::Project,
                &NaturalKey { field: "slug", value: "skyline-1".into() },
            )
            .unwrap()
            .unwrap();
        assert_eq!(skyline.fields["locality"], json!(locality.id.as_str()));

        let properties = dest.records(EntityKind::Property).unwrap();
        assert_eq!(properties[0].fields["project"], json!(skyline.id.as_str()));
        assert_eq!(properties[0].fields["unit_type"], json!("2BHK"));
        assert!(!properties[1].fields.contains_key("project"));
    }

    #[test]
    fn test_second_run_converges() {
        let store = acme_store();
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        Migrator::new(&store, &dest, &config).run(&CancellationToken::new()).unwrap();
        let second = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();

        assert_eq!(second.total_created(), 0);
        assert_eq!(second.counts(EntityKind::Project).unchanged, 2);
        assert_eq!(dest.count(EntityKind::Developer).unwrap(), 1);
        assert_eq!(dest.count(EntityKind::Project).unwrap(), 2);
        assert_eq!(dest.count(EntityKind::Property).unwrap(), 2);
    }

    #[test]
    fn test_cancelled_before_projects() {
        let store = acme_store();
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = Migrator::new(&store, &dest, &config).run(&cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(dest.count(EntityKind::Project).unwrap(), 0);
        assert_eq!(dest.count(EntityKind::Blog).unwrap(), 0);
    }

    #[test]
    fn test_unloaded_store_is_primary_join_failure() {
        let store = InMemoryStore::new();
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        let err = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::PrimaryJoin);
    }

    /// Refuses projects, passes everything else through
    struct RejectProjects(MemoryDestination);

    impl Destination for RejectProjects {
        fn try_create(
            &self,
            kind: EntityKind,
            fields: &Document,
        ) -> Result<CreateOutcome, DestinationError> {
            if kind == EntityKind::Project {
                return Err(DestinationError::Rejected { kind, reason: "read only".into() });
            }
            self.0.try_create(kind, fields)
        }

        fn find_by_unique_key(
            &self,
            kind: EntityKind,
            key: &NaturalKey,
        ) -> Result<Option<Record>, DestinationError> {
            self.0.find_by_unique_key(kind, key)
        }

        fn update(
            &self,
            kind: EntityKind,
            id: &DestinationId,
            fields: &Document,
        ) -> Result<Record, DestinationError> {
            self.0.update(kind, id, fields)
        }
    }

    #[test]
    fn test_rejected_project_skips_its_properties() {
        let store = acme_store();
        let dest = RejectProjects(MemoryDestination::new());
        let config = MigrateConfig::default();

        let report = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.counts(EntityKind::Project).failed, 2);
        assert_eq!(report.counts(EntityKind::Property).skipped, 1);
        // The orphan still migrates
        assert_eq!(report.counts(EntityKind::Property).created, 1);
        assert_eq!(report.counts(EntityKind::Blog).created, 1);
    }

    /// Cancels the run as soon as the first project is written
    struct CancelAfterFirstProject<'a> {
        inner: &'a MemoryDestination,
        cancel: CancellationToken,
    }

    impl Destination for CancelAfterFirstProject<'_> {
        fn try_create(
            &self,
            kind: EntityKind,
            fields: &Document,
        ) -> Result<CreateOutcome, DestinationError> {
            let outcome = self.inner.try_create(kind, fields)?;
            if kind == EntityKind::Project {
                self.cancel.cancel();
            }
            Ok(outcome)
        }

        fn find_by_unique_key(
            &self,
            kind: EntityKind,
            key: &NaturalKey,
        ) -> Result<Option<Record>, DestinationError> {
            self.inner.find_by_unique_key(kind, key)
        }

        fn update(
            &self,
            kind: EntityKind,
            id: &DestinationId,
            fields: &Document,
        ) -> Result<Record, DestinationError> {
            self.inner.update(kind, id, fields)
        }
    }

    #[test]
    fn test_cancelled_between_projects_then_resumed() {
        let store = acme_store();
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();
        let cancel = CancellationToken::new();
        let cancelling = CancelAfterFirstProject { inner: &dest, cancel: cancel.clone() };

        let report = Migrator::new(&store, &cancelling, &config).run(&cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.counts(EntityKind::Project).created, 1);
        assert_eq!(dest.count(EntityKind::Project).unwrap(), 1);
        // The finished project's properties were written before stopping
        assert_eq!(dest.count(EntityKind::Property).unwrap(), 1);
        assert_eq!(dest.count(EntityKind::Blog).unwrap(), 0);

        let resumed = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();
        assert!(!resumed.cancelled);
        assert_eq!(resumed.counts(EntityKind::Project).unchanged, 1);
        assert_eq!(resumed.counts(EntityKind::Project).created, 1);
        assert_eq!(resumed.counts(EntityKind::Developer).created, 0);

        assert_eq!(dest.count(EntityKind::Developer).unwrap(), 1);
        assert_eq!(dest.count(EntityKind::Locality).unwrap(), 1);
        assert_eq!(dest.count(EntityKind::Project).unwrap(), 2);
        assert_eq!(dest.count(EntityKind::Property).unwrap(), 2);
        assert_eq!(dest.count(EntityKind::Blog).unwrap(), 1);
    }

    #[test]
    fn test_same_named_properties_stay_separate() {
        let store = loaded_store(&[
            ("project", json!([
                {"id": 1, "project_name": "Skyline"},
                {"id": 2, "project_name": "Harbour View"}
            ])),
            ("property", json!([
                {"id": 100, "project_id": 1, "property_name": "2 BHK Apartment"},
                {"id": 200, "project_id": 2, "property_name": "2 BHK Apartment"}
            ])),
        ]);
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        let report = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();
        assert_eq!(report.counts(EntityKind::Property).created, 2);
        assert_eq!(report.counts(EntityKind::Property).merged, 0);

        let projects = dest.records(EntityKind::Project).unwrap();
        let properties = dest.records(EntityKind::Property).unwrap();
        assert_eq!(properties.len(), 2);
        let expected = [(100, &projects[0]), (200, &projects[1])];
        for (property, (legacy_id, project)) in properties.iter().zip(expected) {
            assert_eq!(property.fields["legacy_id"], json!(legacy_id));
            assert_eq!(property.fields["project"], json!(project.id.as_str()));
        }
    }

    #[test]
    fn test_same_named_projects_keep_their_developers() {
        let store = loaded_store(&[
            ("developer", json!([
                {"id": 5, "developer_name": "Acme"},
                {"id": 6, "developer_name": "Zen"}
            ])),
            ("project", json!([
                {"id": 1, "project_name": "Green Valley", "developer_id": 5},
                {"id": 2, "project_name": "Green Valley", "developer_id": 6}
            ])),
        ]);
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        let report = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();
        assert_eq!(report.counts(EntityKind::Project).created, 2);

        let developers: Vec<_> = dest
            .records(EntityKind::Project)
            .unwrap()
            .iter()
            .map(|p| p.fields["developer"]["name"].clone())
            .collect();
        assert_eq!(developers, vec![json!("Acme"), json!("Zen")]);
    }

    #[test]
    fn test_shared_project_url_is_not_merged() {
        let store = loaded_store(&[(
            "project",
            json!([
                {"id": 1, "project_name": "Green Valley", "project_url": "/p/green-valley"},
                {"id": 2, "project_name": "Green Valley II", "project_url": "/p/green-valley"}
            ]),
        )]);
        let dest = MemoryDestination::new();
        let config = MigrateConfig::default();

        let report = Migrator::new(&store, &dest, &config)
            .run(&CancellationToken::new())
            .unwrap();
        assert_eq!(report.counts(EntityKind::Project).created, 1);
        assert_eq!(report.counts(EntityKind::Project).failed, 1);

        let projects = dest.records(EntityKind::Project).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].fields["name"], json!("Green Valley"));
    }

    /// Destination that is down
    struct Offline;

    impl Destination for Offline {
        fn try_create(
            &self,
            _: EntityKind,
            _: &Document,
        ) -> Result<CreateOutcome, DestinationError> {
            Err(DestinationError::Unavailable("connection refused".into()))
        }

        fn find_by_unique_key(
            &self,
            _: EntityKind,
            _: &NaturalKey,
        ) -> Result<Option<Record>, DestinationError> {
            Err(DestinationError::Unavailable("connection refused".into()))
        }

        fn update(
            &self,
            _: EntityKind,
            _: &DestinationId,
            _: &Document,
        ) -> Result<Record, DestinationError> {
            Err(DestinationError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_unavailable_destination_aborts() {
        let store = acme_store();
        let config = MigrateConfig::default();
        let err = Migrator::new(&store, &Offline, &config)
            .run(&CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::Destination);
    }
}
