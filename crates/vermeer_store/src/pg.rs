//! PostgreSQL-backed store and ledger.

use crate::connection::{PgPool, create_pool, run_migrations};
use crate::models::{
    ArtStyleRow, CreditTransactionRow, ImageRow, ProductRow, ProjectRow, SubscriptionRow,
    TemplateRow, flatten_image_state,
};
use crate::{CreditLedger, PipelineStore, schema};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::instrument;
use uuid::Uuid;
use vermeer_core::{
    ArtStyle, ArtStyleId, CreditTransaction, Image, ImageId, ImageState, Product, ProductId,
    Project, ProjectId, ProjectStatus, Subscription, SubscriptionBuilder, TRIAL_CREDITS,
    Template, TemplateId, UserId,
};
use vermeer_error::{
    LedgerError, LedgerErrorKind, LedgerResult, StoreError, StoreErrorKind, StoreResult,
};

/// PostgreSQL implementation of [`PipelineStore`] and [`CreditLedger`].
///
/// Diesel work runs on the blocking thread pool; each call checks a
/// connection out of the r2d2 pool for its duration. The conditional debit
/// runs inside a database transaction so the balance check, decrement, and
/// ledger append land together or not at all.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a store from `DATABASE_URL` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot be created or a migration
    /// fails to apply.
    pub fn from_env() -> StoreResult<Self> {
        let pool = create_pool()?;
        let mut conn = pool
            .get()
            .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))?;
        run_migrations(&mut conn)?;
        Ok(Self::new(pool))
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorKind::Query(format!("task join error: {e}"))))?
    }

    async fn with_ledger_conn<T, F>(&self, op: F) -> LedgerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> LedgerResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(backend_error)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| backend_error(format!("task join error: {e}")))?
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    #[instrument(skip(self, project), fields(project_id = %project.id()))]
    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        let row = ProjectRow::from(project);
        self.with_conn(move |conn| {
            diesel::insert_into(schema::projects::table)
                .values(&row)
                .execute(conn)
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let row = self
            .with_conn(move |conn| {
                schema::projects::table
                    .find(id.as_uuid())
                    .select(ProjectRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StoreError::from)
            })
            .await?;
        row.map(Project::try_from).transpose()
    }

    #[instrument(skip(self, id), fields(project_id = %id))]
    async fn update_project_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> StoreResult<()> {
        let status = status.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(schema::projects::table.find(id.as_uuid()))
                .set((
                    schema::projects::status.eq(status),
                    schema::projects::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .map_err(StoreError::from)?;
            if affected == 0 {
                return Err(StoreError::new(StoreErrorKind::NotFound));
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, style), fields(art_style = %style.name()))]
    async fn insert_art_style(&self, style: &ArtStyle) -> StoreResult<()> {
        let row = ArtStyleRow::from(style);
        self.with_conn(move |conn| {
            diesel::insert_into(schema::art_styles::table)
                .values(&row)
                .execute(conn)
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await
    }

    async fn art_style(&self, id: ArtStyleId) -> StoreResult<Option<ArtStyle>> {
        let row = self
            .with_conn(move |conn| {
                schema::art_styles::table
                    .find(id.as_uuid())
                    .select(ArtStyleRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StoreError::from)
            })
            .await?;
        row.map(ArtStyle::try_from).transpose()
    }

    async fn art_styles(&self) -> StoreResult<Vec<ArtStyle>> {
        let rows = self
            .with_conn(|conn| {
                schema::art_styles::table
                    .order(schema::art_styles::name.asc())
                    .select(ArtStyleRow::as_select())
                    .load(conn)
                    .map_err(StoreError::from)
            })
            .await?;
        rows.into_iter().map(ArtStyle::try_from).collect()
    }

    #[instrument(skip(self, template), fields(template_id = %template.id()))]
    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        let row = TemplateRow::from(template);
        self.with_conn(move |conn| {
            diesel::insert_into(schema::templates::table)
                .values(&row)
                .execute(conn)
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await
    }

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>> {
        let row = self
            .with_conn(move |conn| {
                schema::templates::table
                    .find(id.as_uuid())
                    .select(TemplateRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StoreError::from)
            })
            .await?;
        row.map(Template::try_from).transpose()
    }

    #[instrument(skip(self, image), fields(image_id = %image.id()))]
    async fn insert_image(&self, image: &Image) -> StoreResult<()> {
        let row = ImageRow::from(image);
        self.with_conn(move |conn| {
            diesel::insert_into(schema::images::table)
                .values(&row)
                .execute(conn)
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await
    }

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>> {
        let row = self
            .with_conn(move |conn| {
                schema::images::table
                    .find(id.as_uuid())
                    .select(ImageRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StoreError::from)
            })
            .await?;
        row.map(Image::try_from).transpose()
    }

    #[instrument(skip(self, id), fields(image_id = %id))]
    async fn update_image_job(&self, id: ImageId, job_id: &str) -> StoreResult<()> {
        let job_id = job_id.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(schema::images::table.find(id.as_uuid()))
                .set((
                    schema::images::job_id.eq(job_id),
                    schema::images::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .map_err(StoreError::from)?;
            if affected == 0 {
                return Err(StoreError::new(StoreErrorKind::NotFound));
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, id, state), fields(image_id = %id))]
    async fn update_image_state(&self, id: ImageId, state: &ImageState) -> StoreResult<()> {
        let (status, prompt, url, public_url, thumbnail_url, failure_reason) =
            flatten_image_state(state);
        self.with_conn(move |conn| {
            let affected = diesel::update(schema::images::table.find(id.as_uuid()))
                .set((
                    schema::images::status.eq(status),
                    schema::images::prompt.eq(prompt),
                    schema::images::url.eq(url),
                    schema::images::public_url.eq(public_url),
                    schema::images::thumbnail_url.eq(thumbnail_url),
                    schema::images::failure_reason.eq(failure_reason),
                    schema::images::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .map_err(StoreError::from)?;
            if affected == 0 {
                return Err(StoreError::new(StoreErrorKind::NotFound));
            }
            Ok(())
        })
        .await
    }

    async fn images_for_project(&self, project: ProjectId) -> StoreResult<Vec<Image>> {
        let rows = self
            .with_conn(move |conn| {
                schema::images::table
                    .filter(schema::images::project_id.eq(project.as_uuid()))
                    .order(schema::images::created_at.desc())
                    .select(ImageRow::as_select())
                    .load(conn)
                    .map_err(StoreError::from)
            })
            .await?;
        rows.into_iter().map(Image::try_from).collect()
    }
}

fn backend_error(err: impl std::fmt::Display) -> LedgerError {
    LedgerError::new(LedgerErrorKind::Backend(err.to_string()))
}

fn find_correlated(
    conn: &mut PgConnection,
    correlation_id: Option<&str>,
) -> LedgerResult<Option<CreditTransaction>> {
    let Some(wanted) = correlation_id else {
        return Ok(None);
    };
    let row: Option<CreditTransactionRow> = schema::credit_transactions::table
        .filter(schema::credit_transactions::correlation_id.eq(wanted))
        .select(CreditTransactionRow::as_select())
        .first(conn)
        .optional()?;
    row.map(CreditTransaction::try_from)
        .transpose()
        .map_err(backend_error)
}

fn insert_entry(
    conn: &mut PgConnection,
    subscription: &SubscriptionRow,
    amount: i64,
    reason: &str,
    product_id: Option<Uuid>,
    correlation_id: Option<&str>,
) -> LedgerResult<CreditTransaction> {
    let row = CreditTransactionRow {
        id: Uuid::new_v4(),
        subscription_id: subscription.id,
        amount,
        balance: subscription.credit_balance,
        reason: reason.to_string(),
        product_id,
        correlation_id: correlation_id.map(str::to_string),
        created_at: Utc::now(),
    };
    // A concurrent duplicate correlation id trips the unique index here;
    // the rolled-back retry then lands on the correlation lookup instead.
    diesel::insert_into(schema::credit_transactions::table)
        .values(&row)
        .execute(conn)?;
    CreditTransaction::try_from(row).map_err(backend_error)
}

fn subscription_row(
    conn: &mut PgConnection,
    user: &UserId,
) -> LedgerResult<Option<SubscriptionRow>> {
    let row = schema::subscriptions::table
        .filter(schema::subscriptions::user_id.eq(user.as_str()))
        .select(SubscriptionRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row)
}

#[async_trait]
impl CreditLedger for PgStore {
    #[instrument(skip(self, user), fields(user = %user))]
    async fn ensure_subscription(&self, user: &UserId) -> LedgerResult<Subscription> {
        let user = user.clone();
        self.with_ledger_conn(move |conn| {
            conn.transaction(|conn| {
                if let Some(row) = subscription_row(conn, &user)? {
                    return Subscription::try_from(row).map_err(backend_error);
                }
                let subscription = SubscriptionBuilder::default()
                    .user_id(user.clone())
                    .credit_balance(TRIAL_CREDITS)
                    .build()
                    .map_err(backend_error)?;
                let row = SubscriptionRow::from(&subscription);
                let inserted = diesel::insert_into(schema::subscriptions::table)
                    .values(&row)
                    .on_conflict(schema::subscriptions::user_id)
                    .do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    // Lost a creation race; the existing row wins.
                    let row = subscription_row(conn, &user)?.ok_or_else(|| {
                        backend_error(format!("subscription for '{user}' vanished"))
                    })?;
                    return Subscription::try_from(row).map_err(backend_error);
                }
                insert_entry(conn, &row, TRIAL_CREDITS, "Trial credits", None, None)?;
                tracing::info!(user = %user, "Created subscription with trial credits");
                Ok(subscription)
            })
        })
        .await
    }

    async fn subscription(&self, user: &UserId) -> LedgerResult<Option<Subscription>> {
        let user = user.clone();
        let row = self
            .with_ledger_conn(move |conn| subscription_row(conn, &user))
            .await?;
        row.map(Subscription::try_from)
            .transpose()
            .map_err(backend_error)
    }

    async fn balance(&self, user: &UserId) -> LedgerResult<i64> {
        let user = user.clone();
        self.with_ledger_conn(move |conn| {
            let balance: Option<i64> = schema::subscriptions::table
                .filter(schema::subscriptions::user_id.eq(user.as_str()))
                .select(schema::subscriptions::credit_balance)
                .first(conn)
                .optional()?;
            balance.ok_or_else(|| {
                LedgerError::new(LedgerErrorKind::SubscriptionNotFound(user.to_string()))
            })
        })
        .await
    }

    #[instrument(skip(self, user, reason), fields(user = %user))]
    async fn debit(
        &self,
        user: &UserId,
        amount: i64,
        reason: &str,
        correlation_id: Option<&str>,
    ) -> LedgerResult<CreditTransaction> {
        if amount <= 0 {
            return Err(LedgerError::new(LedgerErrorKind::InvalidAmount(amount)));
        }
        let user = user.clone();
        let reason = reason.to_string();
        let correlation = correlation_id.map(str::to_string);
        self.with_ledger_conn(move |conn| {
            conn.transaction(|conn| {
                if let Some(existing) = find_correlated(conn, correlation.as_deref())? {
                    return Ok(existing);
                }
                // Conditional decrement; affects no row when the balance is
                // short or the subscription is missing.
                let updated: Option<SubscriptionRow> = diesel::update(
                    schema::subscriptions::table.filter(
                        schema::subscriptions::user_id
                            .eq(user.as_str())
                            .and(schema::subscriptions::credit_balance.ge(amount)),
                    ),
                )
                .set((
                    schema::subscriptions::credit_balance
                        .eq(schema::subscriptions::credit_balance - amount),
                    schema::subscriptions::updated_at.eq(diesel::dsl::now),
                ))
                .returning(SubscriptionRow::as_returning())
                .get_result(conn)
                .optional()?;

                let Some(row) = updated else {
                    return Err(match subscription_row(conn, &user)? {
                        Some(existing) => LedgerError::new(LedgerErrorKind::InsufficientFunds {
                            requested: amount,
                            available: existing.credit_balance,
                        }),
                        None => LedgerError::new(LedgerErrorKind::SubscriptionNotFound(
                            user.to_string(),
                        )),
                    });
                };
                insert_entry(conn, &row, -amount, &reason, None, correlation.as_deref())
            })
        })
        .await
    }

    #[instrument(skip(self, user, reason), fields(user = %user))]
    async fn credit(
        &self,
        user: &UserId,
        amount: i64,
        reason: &str,
        product_id: Option<ProductId>,
        correlation_id: Option<&str>,
    ) -> LedgerResult<CreditTransaction> {
        if amount <= 0 {
            return Err(LedgerError::new(LedgerErrorKind::InvalidAmount(amount)));
        }
        let user = user.clone();
        let reason = reason.to_string();
        let correlation = correlation_id.map(str::to_string);
        let product = product_id.map(|id| id.as_uuid());
        self.with_ledger_conn(move |conn| {
            conn.transaction(|conn| {
                if let Some(existing) = find_correlated(conn, correlation.as_deref())? {
                    return Ok(existing);
                }
                let updated: Option<SubscriptionRow> = diesel::update(
                    schema::subscriptions::table
                        .filter(schema::subscriptions::user_id.eq(user.as_str())),
                )
                .set((
                    schema::subscriptions::credit_balance
                        .eq(schema::subscriptions::credit_balance + amount),
                    schema::subscriptions::updated_at.eq(diesel::dsl::now),
                ))
                .returning(SubscriptionRow::as_returning())
                .get_result(conn)
                .optional()?;

                let Some(row) = updated else {
                    return Err(LedgerError::new(LedgerErrorKind::SubscriptionNotFound(
                        user.to_string(),
                    )));
                };
                insert_entry(conn, &row, amount, &reason, product, correlation.as_deref())
            })
        })
        .await
    }

    async fn transactions(&self, user: &UserId) -> LedgerResult<Vec<CreditTransaction>> {
        let user = user.clone();
        let rows = self
            .with_ledger_conn(move |conn| {
                let subscription = subscription_row(conn, &user)?.ok_or_else(|| {
                    LedgerError::new(LedgerErrorKind::SubscriptionNotFound(user.to_string()))
                })?;
                let rows: Vec<CreditTransactionRow> = schema::credit_transactions::table
                    .filter(schema::credit_transactions::subscription_id.eq(subscription.id))
                    .order(schema::credit_transactions::created_at.desc())
                    .select(CreditTransactionRow::as_select())
                    .load(conn)?;
                Ok(rows)
            })
            .await?;
        rows.into_iter()
            .map(|row| CreditTransaction::try_from(row).map_err(backend_error))
            .collect()
    }

    #[instrument(skip(self, product), fields(product = %product.name()))]
    async fn insert_product(&self, product: &Product) -> LedgerResult<()> {
        let row = ProductRow::from(product);
        self.with_ledger_conn(move |conn| {
            diesel::insert_into(schema::products::table)
                .values(&row)
                .on_conflict(schema::products::external_id)
                .do_update()
                .set((
                    schema::products::name.eq(&row.name),
                    schema::products::credit_amount.eq(row.credit_amount),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn product_by_external_id(&self, external_id: &str) -> LedgerResult<Option<Product>> {
        let external_id = external_id.to_string();
        let row = self
            .with_ledger_conn(move |conn| {
                let row: Option<ProductRow> = schema::products::table
                    .filter(schema::products::external_id.eq(&external_id))
                    .select(ProductRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row)
            })
            .await?;
        row.map(Product::try_from)
            .transpose()
            .map_err(backend_error)
    }
}

// Live database tests. Enable with `cargo test --features pg` against a
// scratch database named by DATABASE_URL.
#[cfg(all(test, feature = "pg"))]
mod live_tests {
    use super::*;

    fn unique_user() -> UserId {
        UserId::new(format!("user_{}", Uuid::new_v4().simple()))
    }

    fn store() -> PgStore {
        PgStore::from_env().expect("DATABASE_URL must point at a scratch database")
    }

    #[tokio::test]
    async fn subscription_and_conditional_debit() {
        let store = store();
        let user = unique_user();

        let sub = store.ensure_subscription(&user).await.unwrap();
        assert_eq!(*sub.credit_balance(), TRIAL_CREDITS);

        let entry = store
            .debit(&user, 1, "Image 1 created", Some(&format!("t:{}", user)))
            .await
            .unwrap();
        assert_eq!(*entry.balance(), TRIAL_CREDITS - 1);

        let err = store
            .debit(&user, TRIAL_CREDITS, "Image 2 created", None)
            .await
            .unwrap_err();
        assert!(err.is_insufficient_funds());
    }

    #[tokio::test]
    async fn correlated_debit_is_idempotent() {
        let store = store();
        let user = unique_user();
        store.ensure_subscription(&user).await.unwrap();

        let correlation = format!("charge:{}", Uuid::new_v4());
        let first = store
            .debit(&user, 1, "Image 9 created", Some(&correlation))
            .await
            .unwrap();
        let replay = store
            .debit(&user, 1, "Image 9 created", Some(&correlation))
            .await
            .unwrap();
        assert_eq!(first.id(), replay.id());
        assert_eq!(store.balance(&user).await.unwrap(), TRIAL_CREDITS - 1);
    }

    #[tokio::test]
    async fn image_record_round_trips() {
        let store = store();
        let user = unique_user();
        let project = vermeer_core::ProjectBuilder::default()
            .user_id(user)
            .description("A lighthouse keeper discovers a message in a bottle.")
            .intended_use(vermeer_core::IntendedUse::BookCover)
            .build()
            .unwrap();
        store.insert_project(&project).await.unwrap();
        let template = vermeer_core::TemplateBuilder::default()
            .project_id(*project.id())
            .build()
            .unwrap();
        store.insert_template(&template).await.unwrap();

        let image = Image::pending(*project.id(), *template.id());
        store.insert_image(&image).await.unwrap();
        store
            .update_image_state(
                *image.id(),
                &ImageState::Failed {
                    reason: "provider rejected the prompt".to_string(),
                },
            )
            .await
            .unwrap();

        let loaded = store.image(*image.id()).await.unwrap().unwrap();
        assert!(loaded.is_failed());
    }
}
