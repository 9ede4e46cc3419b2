//! The canonical in-memory graph of one legacy snapshot
//!
//! Loading happens in two phases under a single write lock. Phase one decodes
//! every selected table and side-collects one-to-many children by parent key.
//! Phase two builds the secondary indexes that need several tables at once,
//! since foreign-key targets can load in any order. After that the store is
//! immutable and any number of readers can query it concurrently.

use crate::error::StoreError;
use crate::legacy::{
    Amenity, Blog, City, Developer, Faq, FloorPlan, GenericSearchData, LegacyRecord, Locality,
    PaymentPlan, Project, ProjectAmenity, ProjectConfiguration, ProjectConfigurationType,
    ProjectImage, Property, ReraInfo, ALL_TABLES,
};
use crate::snapshot::{RawRow, SnapshotReader};
use crate::store::table::{ChildIndex, Table, TableStats};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

/// Which tables to read and which of them must be readable
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub tables: Vec<String>,

    /// Tables whose read failure aborts the load instead of degrading to empty
    pub primary_tables: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            tables: ALL_TABLES.iter().map(|t| t.to_string()).collect(),
            primary_tables: vec![Project::TABLE.to_string()],
        }
    }
}

/// Per-table outcome of a load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub tables: BTreeMap<String, TableStats>,
}

impl LoadReport {
    pub fn tables_loaded(&self) -> usize {
        self.tables.len()
    }

    pub fn rows_read(&self) -> usize {
        self.tables.values().map(|s| s.rows_read).sum()
    }

    pub fn rows_decoded(&self) -> usize {
        self.tables.values().map(|s| s.decoded).sum()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    loaded: bool,

    cities: Table<City>,
    localities: Table<Locality>,
    developers: Table<Developer>,
    amenities: Table<Amenity>,
    configurations: Table<ProjectConfiguration>,
    configuration_types: Table<ProjectConfigurationType>,
    projects: Table<Project>,
    properties: Table<Property>,
    project_amenities: Table<ProjectAmenity>,
    floor_plans: Table<FloorPlan>,
    payment_plans: Table<PaymentPlan>,
    faqs: Table<Faq>,
    rera: Table<ReraInfo>,
    images: Table<ProjectImage>,
    blogs: Table<Blog>,
    generic_search_data: Table<GenericSearchData>,

    // Collected while decoding
    floor_plans_by_project: ChildIndex<FloorPlan>,
    payment_plans_by_project: ChildIndex<PaymentPlan>,
    faqs_by_project: ChildIndex<Faq>,
    rera_by_project: ChildIndex<ReraInfo>,
    images_by_project: ChildIndex<ProjectImage>,
    amenity_links_by_project: ChildIndex<ProjectAmenity>,

    // Built once every table is decoded
    projects_by_developer: ChildIndex<Project>,
    projects_by_locality: ChildIndex<Project>,
    properties_by_project: ChildIndex<Property>,
    localities_by_city: ChildIndex<Locality>,
    amenities_by_project: ChildIndex<Amenity>,
}

impl StoreState {
    fn decode_table(&mut self, table: &str, rows: Vec<RawRow>, stats: &mut TableStats) {
        match table {
            City::TABLE => {
                self.cities.decode(rows, stats);
            }
            Locality::TABLE => {
                self.localities.decode(rows, stats);
            }
            Developer::TABLE => {
                self.developers.decode(rows, stats);
            }
            Amenity::TABLE => {
                self.amenities.decode(rows, stats);
            }
            ProjectConfiguration::TABLE => {
                self.configurations.decode(rows, stats);
            }
            ProjectConfigurationType::TABLE => {
                self.configuration_types.decode(rows, stats);
            }
            Project::TABLE => {
                self.projects.decode(rows, stats);
            }
            Property::TABLE => {
                self.properties.decode(rows, stats);
            }
            Blog::TABLE => {
                self.blogs.decode(rows, stats);
            }
            GenericSearchData::TABLE => {
                self.generic_search_data.decode(rows, stats);
            }
            ProjectAmenity::TABLE => self.project_amenities.decode_children(
                rows,
                &mut self.amenity_links_by_project,
                |link| link.project_id,
                stats,
            ),
            FloorPlan::TABLE => self.floor_plans.decode_children(
                rows,
                &mut self.floor_plans_by_project,
                |plan| plan.project_id,
                stats,
            ),
            PaymentPlan::TABLE => self.payment_plans.decode_children(
                rows,
                &mut self.payment_plans_by_project,
                |plan| plan.project_id,
                stats,
            ),
            Faq::TABLE => {
                self.faqs
                    .decode_children(rows, &mut self.faqs_by_project, |faq| faq.project_id, stats)
            }
            ReraInfo::TABLE => {
                self.rera
                    .decode_children(rows, &mut self.rera_by_project, |rera| rera.project_id, stats)
            }
            ProjectImage::TABLE => self.images.decode_children(
                rows,
                &mut self.images_by_project,
                |image| image.project_id,
                stats,
            ),
            other => warn!(table = other, "no decoder for table, ignoring"),
        }
    }

    fn build_indexes(&mut self, report: &mut LoadReport) {
        let mut orphans: HashMap<&'static str, usize> = HashMap::new();

        for project in self.projects.iter() {
            match project.developer_id {
                Some(id) if self.developers.contains(id) => self
                    .projects_by_developer
                    .entry(id)
                    .or_default()
                    .push(Arc::clone(project)),
                Some(_) => *orphans.entry(Project::TABLE).or_default() += 1,
                None => {}
            }
            if let Some(id) = project.locality_id {
                if self.localities.contains(id) {
                    self.projects_by_locality
                        .entry(id)
                        .or_default()
                        .push(Arc::clone(project));
                }
            }
        }

        for property in self.properties.iter() {
            match property.project_id {
                Some(id) if self.projects.contains(id) => self
                    .properties_by_project
                    .entry(id)
                    .or_default()
                    .push(Arc::clone(property)),
                _ => *orphans.entry(Property::TABLE).or_default() += 1,
            }
        }

        for locality in self.localities.iter() {
            if let Some(id) = locality.city_id {
                self.localities_by_city
                    .entry(id)
                    .or_default()
                    .push(Arc::clone(locality));
            }
        }

        for (project_id, links) in &self.amenity_links_by_project {
            let resolved: Vec<Arc<Amenity>> = links
                .iter()
                .filter_map(|link| link.amenity_id)
                .filter_map(|amenity_id| self.amenities.get(amenity_id).cloned())
                .collect();
            let dangling = links.len() - resolved.len();
            if dangling > 0 {
                debug!(project_id, dangling, "amenity links without a loaded amenity");
                *orphans.entry(ProjectAmenity::TABLE).or_default() += dangling;
            }
            self.amenities_by_project.insert(*project_id, resolved);
        }

        for (table, count) in orphans {
            if let Some(stats) = report.tables.get_mut(table) {
                stats.orphans += count;
            }
            warn!(table, count, "rows reference parents missing from the snapshot");
        }
    }
}

/// Read-mostly relational store over a legacy snapshot
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot. Holds the write lock for both phases; a store loads once.
    #[instrument(skip_all, fields(dir = %reader.dir().display(), tables = options.tables.len()))]
    pub fn load(
        &self,
        reader: &SnapshotReader,
        options: &LoadOptions,
    ) -> Result<LoadReport, StoreError> {
        let mut guard = self.state.write().map_err(|_| StoreError::Poisoned)?;
        if guard.loaded {
            return Err(StoreError::AlreadyLoaded);
        }

        let mut state = StoreState::default();
        let mut report = LoadReport::default();

        // Phase 1: decode in dependency order, whatever order the caller listed
        for &table in ALL_TABLES {
            if !options.tables.iter().any(|t| t == table) {
                continue;
            }
            let rows = match reader.load_table(table) {
                Ok(rows) => rows,
                Err(err) if options.primary_tables.iter().any(|t| t == table) => {
                    return Err(err.into());
                }
                Err(err) => {
                    warn!(table, error = %err, "table unreadable, treating as empty");
                    Vec::new()
                }
            };
            let stats = report.tables.entry(table.to_string()).or_default();
            state.decode_table(table, rows, stats);
        }

        for table in &options.tables {
            if !ALL_TABLES.contains(&table.as_str()) {
                warn!(table = %table, "unknown table requested, ignoring");
            }
        }

        // Phase 2
        state.build_indexes(&mut report);
        state.loaded = true;
        *guard = state;

        info!(
            tables = report.tables_loaded(),
            rows = report.rows_decoded(),
            "snapshot loaded"
        );
        Ok(report)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().map(|s| s.loaded).unwrap_or(false)
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        if !state.loaded {
            return Err(StoreError::NotLoaded);
        }
        Ok(f(&state))
    }

    fn find<T: LegacyRecord>(
        &self,
        table: impl FnOnce(&StoreState) -> &Table<T>,
        id: i64,
    ) -> Result<Arc<T>, StoreError> {
        self.read(|state| table(state).get(id).cloned())?
            .ok_or(StoreError::NotFound {
                table: T::TABLE,
                id,
            })
    }

    fn children<T>(
        &self,
        index: impl FnOnce(&StoreState) -> &ChildIndex<T>,
        parent_id: i64,
    ) -> Result<Vec<Arc<T>>, StoreError> {
        self.read(|state| index(state).get(&parent_id).cloned().unwrap_or_default())
    }

    pub fn get_project(&self, id: i64) -> Result<Arc<Project>, StoreError> {
        self.find(|s| &s.projects, id)
    }

    pub fn all_projects(&self) -> Result<Vec<Arc<Project>>, StoreError> {
        self.read(|s| s.projects.all())
    }

    pub fn get_property(&self, id: i64) -> Result<Arc<Property>, StoreError> {
        self.find(|s| &s.properties, id)
    }

    pub fn all_properties(&self) -> Result<Vec<Arc<Property>>, StoreError> {
        self.read(|s| s.properties.all())
    }

    pub fn properties_by_project(&self, project_id: i64) -> Result<Vec<Arc<Property>>, StoreError> {
        self.children(|s| &s.properties_by_project, project_id)
    }

    pub fn get_developer(&self, id: i64) -> Result<Arc<Developer>, StoreError> {
        self.find(|s| &s.developers, id)
    }

    pub fn all_developers(&self) -> Result<Vec<Arc<Developer>>, StoreError> {
        self.read(|s| s.developers.all())
    }

    pub fn projects_by_developer(
        &self,
        developer_id: i64,
    ) -> Result<Vec<Arc<Project>>, StoreError> {
        self.children(|s| &s.projects_by_developer, developer_id)
    }

    pub fn get_locality(&self, id: i64) -> Result<Arc<Locality>, StoreError> {
        self.find(|s| &s.localities, id)
    }

    pub fn all_localities(&self) -> Result<Vec<Arc<Locality>>, StoreError> {
        self.read(|s| s.localities.all())
    }

    pub fn projects_by_locality(&self, locality_id: i64) -> Result<Vec<Arc<Project>>, StoreError> {
        self.children(|s| &s.projects_by_locality, locality_id)
    }

    pub fn get_city(&self, id: i64) -> Result<Arc<City>, StoreError> {
        self.find(|s| &s.cities, id)
    }

    pub fn all_cities(&self) -> Result<Vec<Arc<City>>, StoreError> {
        self.read(|s| s.cities.all())
    }

    pub fn localities_by_city(&self, city_id: i64) -> Result<Vec<Arc<Locality>>, StoreError> {
        self.children(|s| &s.localities_by_city, city_id)
    }

    pub fn get_amenity(&self, id: i64) -> Result<Arc<Amenity>, StoreError> {
        self.find(|s| &s.amenities, id)
    }

    pub fn all_amenities(&self) -> Result<Vec<Arc<Amenity>>, StoreError> {
        self.read(|s| s.amenities.all())
    }

    /// Amenities linked to a project through junction rows, in junction order
    pub fn amenities_by_project(&self, project_id: i64) -> Result<Vec<Arc<Amenity>>, StoreError> {
        self.children(|s| &s.amenities_by_project, project_id)
    }

    pub fn get_configuration(&self, id: i64) -> Result<Arc<ProjectConfiguration>, StoreError> {
        self.find(|s| &s.configurations, id)
    }

    pub fn get_configuration_type(
        &self,
        id: i64,
    ) -> Result<Arc<ProjectConfigurationType>, StoreError> {
        self.find(|s| &s.configuration_types, id)
    }

    pub fn get_floor_plan(&self, id: i64) -> Result<Arc<FloorPlan>, StoreError> {
        self.find(|s| &s.floor_plans, id)
    }

    pub fn floor_plans_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<Arc<FloorPlan>>, StoreError> {
        self.children(|s| &s.floor_plans_by_project, project_id)
    }

    pub fn get_payment_plan(&self, id: i64) -> Result<Arc<PaymentPlan>, StoreError> {
        self.find(|s| &s.payment_plans, id)
    }

    pub fn payment_plans_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<Arc<PaymentPlan>>, StoreError> {
        self.children(|s| &s.payment_plans_by_project, project_id)
    }

    pub fn get_faq(&self, id: i64) -> Result<Arc<Faq>, StoreError> {
        self.find(|s| &s.faqs, id)
    }

    pub fn faqs_by_project(&self, project_id: i64) -> Result<Vec<Arc<Faq>>, StoreError> {
        self.children(|s| &s.faqs_by_project, project_id)
    }

    pub fn get_rera(&self, id: i64) -> Result<Arc<ReraInfo>, StoreError> {
        self.find(|s| &s.rera, id)
    }

    pub fn rera_by_project(&self, project_id: i64) -> Result<Vec<Arc<ReraInfo>>, StoreError> {
        self.children(|s| &s.rera_by_project, project_id)
    }

    pub fn get_image(&self, id: i64) -> Result<Arc<ProjectImage>, StoreError> {
        self.find(|s| &s.images, id)
    }

    pub fn images_by_project(&self, project_id: i64) -> Result<Vec<Arc<ProjectImage>>, StoreError> {
        self.children(|s| &s.images_by_project, project_id)
    }

    pub fn get_blog(&self, id: i64) -> Result<Arc<Blog>, StoreError> {
        self.find(|s| &s.blogs, id)
    }

    pub fn all_blogs(&self) -> Result<Vec<Arc<Blog>>, StoreError> {
        self.read(|s| s.blogs.all())
    }

    pub fn get_generic_search_data(&self, id: i64) -> Result<Arc<GenericSearchData>, StoreError> {
        self.find(|s| &s.generic_search_data, id)
    }

    pub fn all_generic_search_data(&self) -> Result<Vec<Arc<GenericSearchData>>, StoreError> {
        self.read(|s| s.generic_search_data.all())
    }
}
