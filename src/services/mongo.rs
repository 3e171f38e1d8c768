use crate::config::MongoSettings;
use crate::core::{pipelines, Predicate};
use crate::models::document::{coerce_number, fields, numeric, text};
use crate::models::{
    ClosedRange, Dealer, FilterOptions, FuelCount, ManufacturerAvgPrice, ManufacturerCount,
    PriceMileagePoint, ServiceYearCount, SeverityCount, Vehicle, VehicleId, VehicleListItem,
};
use crate::services::store::{StoreError, VehicleStore};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// MongoDB-backed vehicle store
///
/// Holds the single client for the process. The driver pools connections
/// internally, so one `MongoStore` behind an `Arc` serves every request.
pub struct MongoStore {
    database: Database,
    vehicles: Collection<Document>,
    dealers: Collection<Document>,
}

impl MongoStore {
    /// Connect using the configured URI and collection names
    pub async fn connect(settings: &MongoSettings) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(settings.uri.as_str()).await?;
        options.app_name = Some(settings.app_name.clone());
        options.server_selection_timeout =
            Some(Duration::from_secs(settings.server_selection_timeout_secs));

        let client = Client::with_options(options)?;
        let database = client.database(&settings.database);

        tracing::info!(
            "MongoDB client created for database {} (vehicles: {}, dealers: {})",
            settings.database,
            settings.vehicles_collection,
            settings.dealers_collection
        );

        Ok(Self {
            vehicles: database.collection(&settings.vehicles_collection),
            dealers: database.collection(&settings.dealers_collection),
            database,
        })
    }

    /// Run a pipeline on the vehicles collection and decode each output row
    async fn aggregate_rows<T>(&self, name: &str, pipeline: Vec<Document>) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!("Running {} pipeline: {:?}", name, pipeline);

        let documents: Vec<Document> = self.vehicles.aggregate(pipeline).await?.try_collect().await?;

        tracing::debug!("{} pipeline returned {} rows", name, documents.len());

        documents
            .into_iter()
            .map(|row| bson::from_document(row).map_err(StoreError::from))
            .collect()
    }

    async fn find_projected(
        &self,
        predicate: &Predicate,
        projection: Document,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let documents = self
            .vehicles
            .find(predicate.to_document())
            .projection(projection)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(documents)
    }

    async fn distinct_strings(&self, field: &str) -> Result<Vec<String>, StoreError> {
        let mut values: Vec<String> = self
            .vehicles
            .distinct(field, doc! {})
            .await?
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    /// Smallest (`direction` 1) or largest (-1) numeric value of `field`
    async fn numeric_extreme(&self, field: &str, direction: i32) -> Result<Option<f64>, StoreError> {
        let document = self
            .vehicles
            .find_one(doc! { field: { "$type": "number" } })
            .sort(doc! { field: direction })
            .projection(doc! { field: 1 })
            .await?;
        Ok(document.and_then(|d| numeric(d.get(field))))
    }

    async fn numeric_bounds(&self, field: &str) -> Result<Option<ClosedRange<f64>>, StoreError> {
        let min = self.numeric_extreme(field, 1).await?;
        let max = self.numeric_extreme(field, -1).await?;
        Ok(min.zip(max).map(|(min, max)| ClosedRange::new(min, max)))
    }
}

#[async_trait]
impl VehicleStore for MongoStore {
    async fn manufacturer_distribution(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerCount>, StoreError> {
        self.aggregate_rows("manufacturer_distribution", pipelines::manufacturer_distribution(predicate))
            .await
    }

    async fn avg_price_by_manufacturer(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerAvgPrice>, StoreError> {
        self.aggregate_rows("avg_price_by_manufacturer", pipelines::avg_price_by_manufacturer(predicate))
            .await
    }

    async fn accident_severity(&self, predicate: &Predicate) -> Result<Vec<SeverityCount>, StoreError> {
        self.aggregate_rows("accident_severity", pipelines::accident_severity(predicate))
            .await
    }

    async fn fuel_distribution(&self, predicate: &Predicate) -> Result<Vec<FuelCount>, StoreError> {
        self.aggregate_rows("fuel_distribution", pipelines::fuel_distribution(predicate))
            .await
    }

    async fn service_frequency(
        &self,
        predicate: &Predicate,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ServiceYearCount>, StoreError> {
        self.aggregate_rows("service_frequency", pipelines::service_frequency(predicate, cutoff))
            .await
    }

    async fn price_mileage_sample(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<PriceMileagePoint>, StoreError> {
        let documents = self
            .find_projected(predicate, pipelines::price_mileage_projection(), limit)
            .await?;
        let fetched = documents.len();

        let points: Vec<PriceMileagePoint> = documents
            .iter()
            .filter_map(|d| {
                Some(PriceMileagePoint {
                    price: coerce_number(d.get(fields::PRICE))?,
                    mileage: coerce_number(d.get(fields::MILEAGE))?,
                    manufacturer: text(d.get(fields::MANUFACTURER)),
                    model: text(d.get(fields::MODEL)),
                    fuel_type: text(d.get(fields::FUEL_TYPE)),
                })
            })
            .collect();

        if points.len() < fetched {
            tracing::debug!(
                "Dropped {} sample rows with non-numeric price or mileage",
                fetched - points.len()
            );
        }

        Ok(points)
    }

    async fn vehicle_list(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<VehicleListItem>, StoreError> {
        let documents = self
            .find_projected(predicate, pipelines::vehicle_list_projection(), limit)
            .await?;

        Ok(documents
            .iter()
            .filter_map(|d| {
                let id = d.get(fields::ID).and_then(VehicleId::from_bson)?;
                Some(VehicleListItem::new(
                    id,
                    text(d.get(fields::MANUFACTURER)),
                    text(d.get(fields::MODEL)),
                    numeric(d.get(fields::PRICE)),
                ))
            })
            .collect())
    }

    async fn find_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError> {
        let document = self
            .vehicles
            .find_one(doc! { fields::ID: id.to_bson() })
            .await?;

        match document {
            Some(d) => Ok(Some(Vehicle::from_document(&d)?)),
            None => Ok(None),
        }
    }

    async fn find_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, StoreError> {
        let document = self
            .dealers
            .find_one(doc! { fields::DEALER_KEY: dealer_id })
            .await?;
        Ok(document.as_ref().and_then(Dealer::from_document))
    }

    async fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        let manufacturers = self.distinct_strings(fields::MANUFACTURER).await?;
        let fuel_types = self.distinct_strings(fields::FUEL_TYPE).await?;

        let dealer_documents: Vec<Document> = self
            .dealers
            .find(doc! {})
            .projection(doc! { fields::ID: 0, fields::DEALER_KEY: 1, fields::DEALER_NAME: 1 })
            .await?
            .try_collect()
            .await?;
        let dealers = dealer_documents
            .iter()
            .filter_map(Dealer::from_document)
            .map(|dealer| (dealer.dealer_id, dealer.name))
            .collect();

        let price = self.numeric_bounds(fields::PRICE).await?;
        let year = self
            .numeric_bounds(fields::YEAR)
            .await?
            .map(|range| ClosedRange::new(range.min.floor() as i32, range.max.ceil() as i32));

        Ok(FilterOptions {
            manufacturers,
            fuel_types,
            dealers,
            price,
            year,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
