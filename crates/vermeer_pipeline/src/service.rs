//! The pipeline service: submission, status, credits, and worker wiring.

use crate::{
    CreditHandler, CreditPayload, GenerateHandler, PipelineConfig, RecommendHandler,
    SummarizeHandler, SummarizePayload,
};
use std::sync::Arc;
use std::time::Duration;
use vermeer_cache::MemoCache;
use vermeer_core::{
    CREDIT_COST_PER_IMAGE, CREDIT_QUEUE, Image, ImageId, ImageState, ProjectId, ProjectStatus,
    SUMMARY_QUEUE, TemplateId, UserId,
};
use vermeer_error::{LedgerErrorKind, PipelineError, PipelineErrorKind, PipelineResult};
use vermeer_interface::{ErrorSink, ImageGeneration, TextCompletion, TracingErrorSink};
use vermeer_queue::{JobBroker, JobHandle, JobId, JobStore, WorkerPool};
use vermeer_storage::ObjectStore;
use vermeer_store::{CreditLedger, PipelineStore};

/// Sleep between settlement checks in [`Pipeline::wait_for_image`].
const SETTLE_POLL: Duration = Duration::from_millis(25);

/// One render submission.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct SubmitRequest {
    user_id: UserId,
    project_id: ProjectId,
    template_id: TemplateId,
    /// Source text to summarize and illustrate.
    text: String,
}

/// Identifiers handed back from a submission.
///
/// `job_id` names the summarize job that starts the chain; `image_id` is
/// the placeholder row to poll for the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters, derive_new::new)]
pub struct SubmitOutcome {
    image_id: ImageId,
    job_id: JobId,
}

/// Client-facing view of an image's progress.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Queued or mid-generation.
    Processing,
    /// Rendered and uploaded.
    Ready { url: String, thumbnail_url: String },
    /// Terminally failed; the charge was refunded.
    Failed { reason: String },
}

impl From<&ImageState> for PipelineStatus {
    fn from(state: &ImageState) -> Self {
        match state {
            ImageState::Pending => Self::Processing,
            ImageState::Ready {
                public_url,
                thumbnail_url,
                ..
            } => Self::Ready {
                url: public_url.clone(),
                thumbnail_url: thumbnail_url.clone(),
            },
            ImageState::Failed { reason } => Self::Failed {
                reason: reason.clone(),
            },
        }
    }
}

/// The image generation service.
///
/// Owns the collaborators every stage needs and wires them into queue
/// handlers. Construction takes the injectable seams; swap any of them for
/// test doubles and the service behaves identically.
///
/// ## Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vermeer_cache::InMemoryCache;
/// use vermeer_pipeline::Pipeline;
/// use vermeer_queue::InMemoryJobStore;
/// use vermeer_storage::MemoryObjectStore;
/// use vermeer_store::MemoryStore;
/// # fn providers() -> (
/// #     Arc<dyn vermeer_interface::TextCompletion>,
/// #     Arc<dyn vermeer_interface::ImageGeneration>,
/// # ) { unimplemented!() }
///
/// let store = Arc::new(MemoryStore::default());
/// let (completion, images) = providers();
/// let pipeline = Pipeline::new(
///     store.clone(),
///     store,
///     Arc::new(InMemoryCache::new()),
///     Arc::new(MemoryObjectStore::new()),
///     completion,
///     images,
///     Arc::new(InMemoryJobStore::new()),
/// );
/// let workers = pipeline.spawn_workers();
/// # drop(workers);
/// ```
pub struct Pipeline {
    store: Arc<dyn PipelineStore>,
    ledger: Arc<dyn CreditLedger>,
    cache: Arc<dyn MemoCache>,
    objects: Arc<dyn ObjectStore>,
    completion: Arc<dyn TextCompletion>,
    images: Arc<dyn ImageGeneration>,
    jobs: Arc<dyn JobStore>,
    sink: Arc<dyn ErrorSink>,
    broker: JobBroker,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        ledger: Arc<dyn CreditLedger>,
        cache: Arc<dyn MemoCache>,
        objects: Arc<dyn ObjectStore>,
        completion: Arc<dyn TextCompletion>,
        images: Arc<dyn ImageGeneration>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        let config = PipelineConfig::default();
        let broker = JobBroker::new(Arc::clone(&jobs)).with_policy(*config.retry());
        Self {
            store,
            ledger,
            cache,
            objects,
            completion,
            images,
            jobs,
            sink: Arc::new(TracingErrorSink),
            broker,
            config,
        }
    }

    /// Replaces the config, restamping the broker's retry policy.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.broker = JobBroker::new(Arc::clone(&self.jobs)).with_policy(*config.retry());
        self.config = config;
        self
    }

    /// Replaces the sink dead letters are reported to.
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn broker(&self) -> &JobBroker {
        &self.broker
    }

    pub fn store(&self) -> Arc<dyn PipelineStore> {
        Arc::clone(&self.store)
    }

    pub fn ledger(&self) -> Arc<dyn CreditLedger> {
        Arc::clone(&self.ledger)
    }

    /// Validates a render request, creates the image placeholder, and
    /// enqueues the summarize stage.
    ///
    /// The balance check here is a user-facing gate so obviously broke
    /// accounts fail before anything is queued; the authoritative charge is
    /// the atomic debit at the start of the generate stage.
    #[tracing::instrument(skip(self, request), fields(project = %request.project_id()))]
    pub async fn submit(&self, request: SubmitRequest) -> PipelineResult<SubmitOutcome> {
        let project = self
            .store
            .project(*request.project_id())
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::ProjectNotFound(
                    request.project_id().to_string(),
                ))
            })?;
        // Another user's project reads as absent rather than forbidden.
        if project.user_id() != request.user_id() {
            return Err(PipelineError::new(PipelineErrorKind::ProjectNotFound(
                request.project_id().to_string(),
            )));
        }
        let template = self
            .store
            .template(*request.template_id())
            .await?
            .filter(|template| template.project_id() == project.id())
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::TemplateNotFound(
                    request.template_id().to_string(),
                ))
            })?;
        if template.art_style_id().is_none() {
            return Err(PipelineError::new(PipelineErrorKind::ArtStyleNotFound(
                request.template_id().to_string(),
            )));
        }
        let subscription = self.ledger.ensure_subscription(request.user_id()).await?;
        if !subscription.can_afford(CREDIT_COST_PER_IMAGE) {
            return Err(PipelineError::new(PipelineErrorKind::Ledger(
                LedgerErrorKind::InsufficientFunds {
                    requested: CREDIT_COST_PER_IMAGE,
                    available: *subscription.credit_balance(),
                },
            )));
        }

        let image = Image::pending(*request.project_id(), *request.template_id());
        self.store.insert_image(&image).await?;

        let payload = SummarizePayload {
            project_id: *request.project_id(),
            template_id: *request.template_id(),
            image_id: *image.id(),
            user_id: request.user_id().clone(),
            text: request.text().clone(),
        };
        let handle = self
            .broker
            .enqueue(SUMMARY_QUEUE, &image.id().to_string(), &payload)
            .await?;
        self.store
            .update_image_job(*image.id(), &handle.id().to_string())
            .await?;
        self.store
            .update_project_status(*request.project_id(), ProjectStatus::Submitted)
            .await?;
        tracing::info!(image = %image.id(), job = %handle.id(), "render submitted");
        Ok(SubmitOutcome::new(*image.id(), handle.id()))
    }

    /// Reports where an image is in its lifecycle.
    pub async fn status(&self, image_id: ImageId) -> PipelineResult<PipelineStatus> {
        let image = self.store.image(image_id).await?.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::ImageNotFound(image_id.to_string()))
        })?;
        Ok(PipelineStatus::from(image.state()))
    }

    /// Polls until the image settles or `timeout` elapses, returning the
    /// last observed status.
    ///
    /// The render spans several jobs, so settlement is observed on the
    /// image row rather than any single job handle.
    pub async fn wait_for_image(
        &self,
        image_id: ImageId,
        timeout: Duration,
    ) -> PipelineResult<PipelineStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.status(image_id).await?;
            if !matches!(status, PipelineStatus::Processing)
                || tokio::time::Instant::now() >= deadline
            {
                return Ok(status);
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }

    /// Applies a signed credit adjustment directly and returns the new
    /// balance. Order grants go through the credit queue instead.
    pub async fn adjust_credits(
        &self,
        user: &UserId,
        amount: i64,
        reason: &str,
    ) -> PipelineResult<i64> {
        let entry = if amount >= 0 {
            self.ledger.credit(user, amount, reason, None, None).await?
        } else {
            self.ledger.debit(user, -amount, reason, None).await?
        };
        Ok(*entry.balance())
    }

    /// Queues the credit grant for a completed order.
    ///
    /// Replays of the same order id are absorbed by the correlation id.
    #[tracing::instrument(skip(self, user), fields(user = %user, order = order_id))]
    pub async fn grant_order(
        &self,
        user: &UserId,
        order_id: &str,
        product_external_id: &str,
    ) -> PipelineResult<JobHandle> {
        let product = self.product_for(product_external_id).await?;
        self.ledger.ensure_subscription(user).await?;
        let payload = CreditPayload {
            user_id: user.clone(),
            amount: *product.credit_amount(),
            reason: format!("Order {order_id}"),
            product_id: Some(*product.id()),
            correlation_id: Some(format!("order:{order_id}")),
        };
        let handle = self.broker.enqueue(CREDIT_QUEUE, order_id, &payload).await?;
        Ok(handle)
    }

    /// Queues the credit claw-back for a refunded order.
    #[tracing::instrument(skip(self, user), fields(user = %user, order = order_id))]
    pub async fn refund_order(
        &self,
        user: &UserId,
        order_id: &str,
        product_external_id: &str,
    ) -> PipelineResult<JobHandle> {
        let product = self.product_for(product_external_id).await?;
        let payload = CreditPayload {
            user_id: user.clone(),
            amount: -*product.credit_amount(),
            reason: format!("Refund {order_id}"),
            product_id: Some(*product.id()),
            correlation_id: Some(format!("refund:order:{order_id}")),
        };
        let handle = self.broker.enqueue(CREDIT_QUEUE, order_id, &payload).await?;
        Ok(handle)
    }

    async fn product_for(&self, external_id: &str) -> PipelineResult<vermeer_core::Product> {
        self.ledger
            .product_by_external_id(external_id)
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::ProductNotFound(external_id.to_string()))
            })
    }

    /// Starts workers for all four queues and returns the running pool.
    ///
    /// The caller owns the pool and shuts it down on exit.
    pub fn spawn_workers(&self) -> WorkerPool {
        let mut pool = WorkerPool::new(Arc::clone(&self.jobs), Arc::clone(&self.sink))
            .with_policy(*self.config.retry())
            .with_lease(*self.config.lease())
            .with_poll_interval(*self.config.poll_interval());
        let concurrency = *self.config.concurrency();
        pool.spawn(
            Arc::new(SummarizeHandler::new(
                Arc::clone(&self.store),
                Arc::clone(&self.cache),
                Arc::clone(&self.completion),
                self.broker.clone(),
                self.config.clone(),
            )),
            concurrency,
        );
        pool.spawn(
            Arc::new(RecommendHandler::new(
                Arc::clone(&self.store),
                Arc::clone(&self.cache),
                Arc::clone(&self.completion),
                self.broker.clone(),
                self.config.clone(),
            )),
            concurrency,
        );
        pool.spawn(
            Arc::new(GenerateHandler::new(
                Arc::clone(&self.store),
                Arc::clone(&self.ledger),
                Arc::clone(&self.cache),
                Arc::clone(&self.completion),
                Arc::clone(&self.images),
                Arc::clone(&self.objects),
                self.broker.clone(),
                self.config.clone(),
            )),
            concurrency,
        );
        pool.spawn(
            Arc::new(CreditHandler::new(Arc::clone(&self.ledger))),
            concurrency,
        );
        pool
    }
}
