//! PostgreSQL-backed `ClinicalStore` implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::ops::Bound;

use crate::{
    db::traits::ClinicalStore,
    models::{
        BloodPressureRow, HeartRateRow, NewPatient, ObservationId, ObservationSource, PatientRow,
        Reading,
    },
    search::{DateBounds, DateFilter, ObservationQuery, PatientQuery, ReadingFilter},
    Error, Result,
};

/// PostgreSQL-backed ClinicalStore implementation
#[derive(Clone)]
pub struct PostgresClinicalStore {
    pub(crate) pool: PgPool,
}

impl PostgresClinicalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_source(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        source: ObservationSource,
        filter: &ReadingFilter,
    ) -> Result<Vec<Reading>> {
        let mut qb = QueryBuilder::<Postgres>::new(match source {
            ObservationSource::BloodPressure => {
                "SELECT id, patient_id, systolic, diastolic, date FROM blood_pressure WHERE TRUE"
            }
            ObservationSource::HeartRate => {
                "SELECT id, patient_id, rate, date FROM heart_rate WHERE TRUE"
            }
        });
        push_reading_filter(&mut qb, filter);
        qb.push(" ORDER BY date, id");

        let readings = match source {
            ObservationSource::BloodPressure => qb
                .build_query_as::<BloodPressureRow>()
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::Database)?
                .into_iter()
                .map(Reading::BloodPressure)
                .collect(),
            ObservationSource::HeartRate => qb
                .build_query_as::<HeartRateRow>()
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::Database)?
                .into_iter()
                .map(Reading::HeartRate)
                .collect(),
        };
        Ok(readings)
    }
}

#[async_trait]
impl ClinicalStore for PostgresClinicalStore {
    async fn search_patients(&self, query: &PatientQuery) -> Result<Vec<PatientRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, first_name, last_name, date_of_birth FROM patients WHERE TRUE",
        );
        for given in &query.given {
            qb.push(" AND first_name ILIKE ")
                .push_bind(contains_pattern(given));
        }
        for family in &query.family {
            qb.push(" AND last_name ILIKE ")
                .push_bind(contains_pattern(family));
        }
        for filter in &query.birthdate {
            push_date_filter(&mut qb, "date_of_birth", filter);
        }
        qb.push(" ORDER BY id");

        qb.build_query_as::<PatientRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get_patient(&self, id: i64) -> Result<Option<PatientRow>> {
        sqlx::query_as::<_, PatientRow>(
            "SELECT id, first_name, last_name, date_of_birth FROM patients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn insert_patient(&self, patient: &NewPatient) -> Result<PatientRow> {
        sqlx::query_as::<_, PatientRow>(
            "INSERT INTO patients (first_name, last_name, date_of_birth)
             VALUES ($1, $2, $3)
             RETURNING id, first_name, last_name, date_of_birth",
        )
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.date_of_birth)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn patient_exists(&self, id: i64) -> Result<bool> {
        patient_exists_on(&self.pool, id).await
    }

    async fn fetch_readings(&self, query: &ObservationQuery) -> Result<Vec<Reading>> {
        if query.sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if let Some(patient_id) = query.filter.patient_id {
            if !patient_exists_on(&mut *tx, patient_id).await? {
                tracing::debug!(patient_id, "Observation search for unknown patient");
                tx.commit().await.map_err(Error::Database)?;
                return Ok(Vec::new());
            }
        }

        let mut readings = Vec::new();
        for source in &query.sources {
            readings.extend(Self::fetch_source(&mut tx, *source, &query.filter).await?);
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(readings)
    }

    async fn get_reading(&self, id: ObservationId) -> Result<Option<Reading>> {
        let reading = match id.source {
            ObservationSource::BloodPressure => sqlx::query_as::<_, BloodPressureRow>(
                "SELECT id, patient_id, systolic, diastolic, date FROM blood_pressure WHERE id = $1",
            )
            .bind(id.row_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(Reading::BloodPressure),
            ObservationSource::HeartRate => sqlx::query_as::<_, HeartRateRow>(
                "SELECT id, patient_id, rate, date FROM heart_rate WHERE id = $1",
            )
            .bind(id.row_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(Reading::HeartRate),
        };
        Ok(reading)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

async fn patient_exists_on<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM patients WHERE id = $1)")
        .bind(id)
        .fetch_one(executor)
        .await
        .map_err(Error::Database)
}

fn push_reading_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReadingFilter) {
    if let Some(patient_id) = filter.patient_id {
        qb.push(" AND patient_id = ").push_bind(patient_id);
    }
    for date in &filter.date {
        push_date_filter(qb, "date", date);
    }
}

/// `column` is always a fixed identifier from this module, never user input.
fn push_date_filter(qb: &mut QueryBuilder<'_, Postgres>, column: &str, filter: &DateFilter) {
    let DateBounds { lower, upper } = filter.bounds();
    push_bound(qb, column, lower, ">=", ">");
    push_bound(qb, column, upper, "<=", "<");
}

fn push_bound(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    bound: Bound<NaiveDate>,
    inclusive: &str,
    exclusive: &str,
) {
    let (op, date) = match bound {
        Bound::Included(d) => (inclusive, d),
        Bound::Excluded(d) => (exclusive, d),
        Bound::Unbounded => return,
    };
    qb.push(format!(" AND {column} {op} ")).push_bind(date);
}

/// ILIKE pattern matching `needle` anywhere, with LIKE wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{build_observation_query, build_patient_query, SearchParams};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two patients with a blood-pressure and a heart-rate reading on each of
    /// 2020-01-01 and 2020-01-02.
    async fn seed(store: &PostgresClinicalStore) -> anyhow::Result<()> {
        for (first, last, dob) in [
            ("John", "Smith", Some(day(1970, 5, 12))),
            ("Jane", "Doe", None),
        ] {
            store
                .insert_patient(&NewPatient {
                    first_name: first.into(),
                    last_name: last.into(),
                    date_of_birth: dob,
                })
                .await?;
        }
        for patient_id in [1_i64, 2] {
            for d in [1, 2] {
                sqlx::query(
                    "INSERT INTO blood_pressure (patient_id, systolic, diastolic, date) VALUES ($1, $2, $3, $4)",
                )
                .bind(patient_id)
                .bind(120_i32 + d as i32)
                .bind(80_i32 + d as i32)
                .bind(day(2020, 1, d))
                .execute(store.pool())
                .await?;
                sqlx::query("INSERT INTO heart_rate (patient_id, rate, date) VALUES ($1, $2, $3)")
                    .bind(patient_id)
                    .bind(60_i32 + patient_id as i32 * 10 + d as i32)
                    .bind(day(2020, 1, d))
                    .execute(store.pool())
                    .await?;
            }
        }
        Ok(())
    }

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        pairs.iter().copied().collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL pointing at a Postgres server
    async fn insert_returns_assigned_row(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresClinicalStore::new(pool);
        seed(&store).await?;

        let row = store
            .insert_patient(&NewPatient {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                date_of_birth: Some(day(2001, 7, 4)),
            })
            .await?;
        assert_eq!(row.id, 3);
        assert_eq!(store.get_patient(3).await?, Some(row));
        assert!(store.patient_exists(2).await?);
        assert!(!store.patient_exists(99).await?);
        store.ping().await?;
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL pointing at a Postgres server
    async fn patient_search_matches_substrings_and_escapes_wildcards(
        pool: PgPool,
    ) -> anyhow::Result<()> {
        let store = PostgresClinicalStore::new(pool);
        seed(&store).await?;

        let rows = store
            .search_patients(&build_patient_query(&params(&[("given", "Jo")]))?)
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].first_name, "John");

        let rows = store
            .search_patients(&build_patient_query(&params(&[("family", "%")]))?)
            .await?;
        assert!(rows.is_empty());

        let rows = store
            .search_patients(&build_patient_query(&params(&[("birthdate", "lt2000")]))?)
            .await?;
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL pointing at a Postgres server
    async fn readings_union_both_tables(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresClinicalStore::new(pool);
        seed(&store).await?;

        let mut readings = store
            .fetch_readings(&build_observation_query(&params(&[("date", "2020-01-02")]))?)
            .await?;
        readings.sort_by_key(Reading::sort_key);
        let ids: Vec<String> = readings.iter().map(|r| r.observation_id().to_string()).collect();
        assert_eq!(ids, vec!["bp-2", "bp-4", "hr-2", "hr-4"]);

        let unknown = store
            .fetch_readings(&build_observation_query(&params(&[("patient", "99")]))?)
            .await?;
        assert!(unknown.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // requires DATABASE_URL pointing at a Postgres server
    async fn get_reading_maps_table_columns(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresClinicalStore::new(pool);
        seed(&store).await?;

        let hr = store
            .get_reading(ObservationId::new(ObservationSource::HeartRate, 4))
            .await?;
        assert_eq!(
            hr,
            Some(Reading::HeartRate(HeartRateRow {
                id: 4,
                patient_id: 2,
                rate: 82,
                date: day(2020, 1, 2),
            }))
        );

        let bp = store
            .get_reading(ObservationId::new(ObservationSource::BloodPressure, 1))
            .await?;
        assert_eq!(
            bp,
            Some(Reading::BloodPressure(BloodPressureRow {
                id: 1,
                patient_id: 1,
                systolic: 121,
                diastolic: 81,
                date: day(2020, 1, 1),
            }))
        );
        assert!(store
            .get_reading(ObservationId::new(ObservationSource::BloodPressure, 9))
            .await?
            .is_none());
        Ok(())
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Jo"), "%Jo%");
        assert_eq!(contains_pattern("50%_x\\"), "%50\\%\\_x\\\\%");
    }

    #[test]
    fn date_filters_compile_to_bound_predicates() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM t WHERE TRUE");
        push_date_filter(&mut qb, "date", &DateFilter::parse("2020-01").unwrap());
        push_date_filter(&mut qb, "date", &DateFilter::parse("gt2019").unwrap());
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM t WHERE TRUE AND date >= $1 AND date <= $2 AND date > $3"
        );
    }

    #[test]
    fn reading_filter_binds_patient_first() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM t WHERE TRUE");
        push_reading_filter(
            &mut qb,
            &ReadingFilter {
                patient_id: Some(1),
                date: vec![DateFilter::parse("lt2020-01-02").unwrap()],
            },
        );
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM t WHERE TRUE AND patient_id = $1 AND date < $2"
        );
    }
}
