//! In-memory store and ledger for tests and local development.

use crate::{CreditLedger, PipelineStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use vermeer_core::{
    ArtStyle, ArtStyleId, CreditTransaction, CreditTransactionBuilder, Image, ImageId,
    ImageState, Product, ProductId, Project, ProjectId, ProjectStatus, Subscription,
    SubscriptionBuilder, TRIAL_CREDITS, Template, TemplateId, UserId,
};
use vermeer_error::{
    LedgerError, LedgerErrorKind, LedgerResult, StoreError, StoreErrorKind, StoreResult,
};

#[derive(Debug, Default)]
struct LedgerTables {
    subscriptions: HashMap<String, Subscription>,
    // Push order is chronological, so reads reverse for newest-first.
    transactions: Vec<CreditTransaction>,
    products: HashMap<ProductId, Product>,
}

/// Hash-map implementation of [`PipelineStore`] and [`CreditLedger`].
///
/// Clones share the same underlying tables, so one store can be handed to
/// several pipeline stages. The ledger tables sit behind a single lock,
/// which makes the conditional debit atomic the same way the Postgres
/// implementation's transaction does.
///
/// # Examples
///
/// ```
/// use vermeer_store::{CreditLedger, MemoryStore};
/// use vermeer_core::UserId;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let store = MemoryStore::new();
///     let user = UserId::from("user_1");
///     let sub = store.ensure_subscription(&user).await.unwrap();
///     assert_eq!(*sub.credit_balance(), 3);
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
    art_styles: Arc<RwLock<HashMap<ArtStyleId, ArtStyle>>>,
    templates: Arc<RwLock<HashMap<TemplateId, Template>>>,
    images: Arc<RwLock<HashMap<ImageId, Image>>>,
    ledger: Arc<Mutex<LedgerTables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.projects
            .write()
            .await
            .insert(*project.id(), project.clone());
        Ok(())
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn update_project_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        projects.insert(id, project.with_status(status));
        Ok(())
    }

    async fn insert_art_style(&self, style: &ArtStyle) -> StoreResult<()> {
        self.art_styles
            .write()
            .await
            .insert(*style.id(), style.clone());
        Ok(())
    }

    async fn art_style(&self, id: ArtStyleId) -> StoreResult<Option<ArtStyle>> {
        Ok(self.art_styles.read().await.get(&id).cloned())
    }

    async fn art_styles(&self) -> StoreResult<Vec<ArtStyle>> {
        let mut styles: Vec<ArtStyle> = self.art_styles.read().await.values().cloned().collect();
        styles.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(styles)
    }

    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        self.templates
            .write()
            .await
            .insert(*template.id(), template.clone());
        Ok(())
    }

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn insert_image(&self, image: &Image) -> StoreResult<()> {
        self.images.write().await.insert(*image.id(), image.clone());
        Ok(())
    }

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>> {
        Ok(self.images.read().await.get(&id).cloned())
    }

    async fn update_image_job(&self, id: ImageId, job_id: &str) -> StoreResult<()> {
        let mut images = self.images.write().await;
        let image = images
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        images.insert(id, image.with_job_id(job_id));
        Ok(())
    }

    async fn update_image_state(&self, id: ImageId, state: &ImageState) -> StoreResult<()> {
        let mut images = self.images.write().await;
        let image = images
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        images.insert(id, image.with_state(state.clone()));
        Ok(())
    }

    async fn images_for_project(&self, project: ProjectId) -> StoreResult<Vec<Image>> {
        let mut images: Vec<Image> = self
            .images
            .read()
            .await
            .values()
            .filter(|image| *image.project_id() == project)
            .cloned()
            .collect();
        images.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(images)
    }
}

fn backend_error(message: impl std::fmt::Display) -> LedgerError {
    LedgerError::new(LedgerErrorKind::Backend(message.to_string()))
}

impl LedgerTables {
    fn find_correlated(&self, correlation_id: Option<&str>) -> Option<CreditTransaction> {
        let wanted = correlation_id?;
        self.transactions
            .iter()
            .find(|entry| entry.correlation_id().as_deref() == Some(wanted))
            .cloned()
    }

    fn subscription_required(&self, user: &UserId) -> LedgerResult<Subscription> {
        self.subscriptions.get(user.as_str()).cloned().ok_or_else(|| {
            LedgerError::new(LedgerErrorKind::SubscriptionNotFound(user.to_string()))
        })
    }

    fn apply(
        &mut self,
        user: &UserId,
        subscription: Subscription,
        amount: i64,
        reason: &str,
        product_id: Option<ProductId>,
        correlation_id: Option<&str>,
    ) -> LedgerResult<CreditTransaction> {
        let balance = subscription.credit_balance() + amount;
        let updated = subscription.with_balance(balance);
        let entry = CreditTransactionBuilder::default()
            .subscription_id(*updated.id())
            .amount(amount)
            .balance(balance)
            .reason(reason)
            .product_id(product_id)
            .correlation_id(correlation_id.map(str::to_string))
            .build()
            .map_err(backend_error)?;
        self.subscriptions.insert(user.to_string(), updated);
        self.transactions.push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl CreditLedger for MemoryStore {
    async fn ensure_subscription(&self, user: &UserId) -> LedgerResult<Subscription> {
        let mut tables = self.ledger.lock().await;
        if let Some(existing) = tables.subscriptions.get(user.as_str()) {
            return Ok(existing.clone());
        }
        let subscription = SubscriptionBuilder::default()
            .user_id(user.clone())
            .build()
            .map_err(backend_error)?;
        tables.apply(
            user,
            subscription,
            TRIAL_CREDITS,
            "Trial credits",
            None,
            None,
        )?;
        tables.subscription_required(user)
    }

    async fn subscription(&self, user: &UserId) -> LedgerResult<Option<Subscription>> {
        let tables = self.ledger.lock().await;
        Ok(tables.subscriptions.get(user.as_str()).cloned())
    }

    async fn balance(&self, user: &UserId) -> LedgerResult<i64> {
        let tables = self.ledger.lock().await;
        tables
            .subscription_required(user)
            .map(|sub| *sub.credit_balance())
    }

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
        let mut tables = self.ledger.lock().await;
        if let Some(existing) = tables.find_correlated(correlation_id) {
            return Ok(existing);
        }
        let subscription = tables.subscription_required(user)?;
        if !subscription.can_afford(amount) {
            return Err(LedgerError::new(LedgerErrorKind::InsufficientFunds {
                requested: amount,
                available: *subscription.credit_balance(),
            }));
        }
        tables.apply(user, subscription, -amount, reason, None, correlation_id)
    }

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
        let mut tables = self.ledger.lock().await;
        if let Some(existing) = tables.find_correlated(correlation_id) {
            return Ok(existing);
        }
        let subscription = tables.subscription_required(user)?;
        tables.apply(user, subscription, amount, reason, product_id, correlation_id)
    }

    async fn transactions(&self, user: &UserId) -> LedgerResult<Vec<CreditTransaction>> {
        let tables = self.ledger.lock().await;
        let subscription = tables.subscription_required(user)?;
        Ok(tables
            .transactions
            .iter()
            .rev()
            .filter(|entry| entry.subscription_id() == subscription.id())
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: &Product) -> LedgerResult<()> {
        let mut tables = self.ledger.lock().await;
        tables.products.insert(*product.id(), product.clone());
        Ok(())
    }

    async fn product_by_external_id(&self, external_id: &str) -> LedgerResult<Option<Product>> {
        let tables = self.ledger.lock().await;
        Ok(tables
            .products
            .values()
            .find(|product| product.external_id() == external_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use vermeer_core::{ImageBuilder, ProjectBuilder, TemplateBuilder};

    fn sample_project(user: &str) -> Project {
        ProjectBuilder::default()
            .user_id(user)
            .description("A lighthouse keeper discovers a message in a bottle.")
            .intended_use(vermeer_core::IntendedUse::BookCover)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn project_insert_and_status_update() {
        let store = MemoryStore::new();
        let project = sample_project("user_1");
        let id = *project.id();
        store.insert_project(&project).await.unwrap();

        store
            .update_project_status(id, ProjectStatus::Submitted)
            .await
            .unwrap();
        let loaded = store.project(id).await.unwrap().unwrap();
        assert_eq!(*loaded.status(), ProjectStatus::Submitted);

        let missing = store
            .update_project_status(ProjectId::new(), ProjectStatus::Submitted)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn image_walks_through_lifecycle() {
        let store = MemoryStore::new();
        let project = sample_project("user_1");
        let template = TemplateBuilder::default()
            .project_id(*project.id())
            .build()
            .unwrap();
        let image = Image::pending(*project.id(), *template.id());
        let id = *image.id();
        store.insert_image(&image).await.unwrap();

        store.update_image_job(id, "job-17").await.unwrap();
        store
            .update_image_state(
                id,
                &ImageState::Ready {
                    prompt: "a lighthouse at dusk".to_string(),
                    url: "file:///objects/a.png".to_string(),
                    public_url: "https://cdn.example.com/a.png".to_string(),
                    thumbnail_url: "https://cdn.example.com/a.webp".to_string(),
                },
            )
            .await
            .unwrap();

        let loaded = store.image(id).await.unwrap().unwrap();
        assert!(loaded.is_ready());
        assert_eq!(loaded.job_id().as_deref(), Some("job-17"));
    }

    #[tokio::test]
    async fn images_for_project_newest_first() {
        let store = MemoryStore::new();
        let project = sample_project("user_1");
        let template = TemplateBuilder::default()
            .project_id(*project.id())
            .build()
            .unwrap();
        let older = ImageBuilder::default()
            .project_id(*project.id())
            .template_id(*template.id())
            .created_at(chrono::Utc::now() - chrono::Duration::minutes(5))
            .build()
            .unwrap();
        let newer = Image::pending(*project.id(), *template.id());
        store.insert_image(&older).await.unwrap();
        store.insert_image(&newer).await.unwrap();

        let listed = store.images_for_project(*project.id()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), newer.id());
        assert_eq!(listed[1].id(), older.id());
    }

    #[tokio::test]
    async fn ensure_subscription_grants_trial_once() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");

        let first = store.ensure_subscription(&user).await.unwrap();
        assert_eq!(*first.credit_balance(), TRIAL_CREDITS);

        let second = store.ensure_subscription(&user).await.unwrap();
        assert_eq!(second.id(), first.id());

        let history = store.transactions(&user).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason(), "Trial credits");
        assert_eq!(*history[0].amount(), TRIAL_CREDITS);
    }

    #[tokio::test]
    async fn debit_decrements_and_records_balance_after() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();

        let entry = store
            .debit(&user, 1, "Image 123 created", None)
            .await
            .unwrap();
        assert_eq!(*entry.amount(), -1);
        assert_eq!(*entry.balance(), TRIAL_CREDITS - 1);
        assert!(entry.is_charge());
        assert_eq!(store.balance(&user).await.unwrap(), TRIAL_CREDITS - 1);
    }

    #[tokio::test]
    async fn debit_rejects_overdraft_without_touching_balance() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();

        let err = store
            .debit(&user, TRIAL_CREDITS + 1, "Image 123 created", None)
            .await
            .unwrap_err();
        assert!(err.is_insufficient_funds());
        assert_eq!(store.balance(&user).await.unwrap(), TRIAL_CREDITS);
    }

    #[tokio::test]
    async fn debit_rejects_non_positive_amounts() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();

        for amount in [0, -1] {
            let err = store.debit(&user, amount, "bad", None).await.unwrap_err();
            assert!(matches!(err.kind, LedgerErrorKind::InvalidAmount(_)));
        }
    }

    #[tokio::test]
    async fn debit_without_subscription_is_rejected() {
        let store = MemoryStore::new();
        let user = UserId::from("nobody");
        let err = store.debit(&user, 1, "Image 1 created", None).await.unwrap_err();
        assert!(matches!(
            err.kind,
            LedgerErrorKind::SubscriptionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn correlated_debit_applies_once() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();

        let first = store
            .debit(&user, 1, "Image 123 created", Some("charge:image:123"))
            .await
            .unwrap();
        let replay = store
            .debit(&user, 1, "Image 123 created", Some("charge:image:123"))
            .await
            .unwrap();

        assert_eq!(replay.id(), first.id());
        assert_eq!(store.balance(&user).await.unwrap(), TRIAL_CREDITS - 1);
    }

    #[tokio::test]
    async fn credit_grants_and_links_product() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();
        let product_id = ProductId::new();

        let entry = store
            .credit(&user, 25, "Order 456", Some(product_id), Some("order:456"))
            .await
            .unwrap();
        assert!(entry.is_grant());
        assert_eq!(*entry.balance(), TRIAL_CREDITS + 25);
        assert_eq!(*entry.product_id(), Some(product_id));

        let history = store.transactions(&user).await.unwrap();
        assert_eq!(history[0].reason(), "Order 456");
    }

    #[tokio::test]
    async fn concurrent_debits_never_overdraw() {
        let store = MemoryStore::new();
        let user = UserId::from("user_1");
        store.ensure_subscription(&user).await.unwrap();

        let attempts = 10usize;
        let debits = (0..attempts).map(|i| {
            let store = store.clone();
            let user = user.clone();
            async move { store.debit(&user, 1, &format!("Image {i} created"), None).await }
        });
        let results = join_all(debits).await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes as i64, TRIAL_CREDITS);
        assert_eq!(store.balance(&user).await.unwrap(), 0);
        for failure in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(failure.is_insufficient_funds());
        }
    }

    #[tokio::test]
    async fn product_lookup_by_external_id() {
        let store = MemoryStore::new();
        let product = vermeer_core::ProductBuilder::default()
            .external_id("price_100")
            .name("Starter pack")
            .credit_amount(25i64)
            .build()
            .unwrap();
        store.insert_product(&product).await.unwrap();

        let found = store.product_by_external_id("price_100").await.unwrap();
        assert_eq!(found, Some(product));
        assert!(
            store
                .product_by_external_id("price_999")
                .await
                .unwrap()
                .is_none()
        );
    }
}
