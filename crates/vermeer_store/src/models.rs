//! Row types bridging the relational schema and the core domain types.
//!
//! Enums travel as their variant names and the image lifecycle is
//! flattened into a status column plus nullable artifact columns. Every
//! `TryFrom` rejects rows that violate those conventions with
//! [`StoreErrorKind::InvalidRow`].

use crate::schema::{
    art_styles, credit_transactions, images, products, projects, subscriptions, templates,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;
use vermeer_core::{
    ArtStyle, ArtStyleBuilder, ArtStyleId, AspectRatio, Category, CreditTransaction,
    CreditTransactionBuilder, Image, ImageBuilder, ImageId, ImageState, IntendedUse, Plan,
    Product, ProductBuilder, ProductId, Project, ProjectBuilder, ProjectId, ProjectStatus,
    Subscription, SubscriptionBuilder, Template, TemplateBuilder, TemplateId,
};
use vermeer_error::{StoreError, StoreErrorKind};

pub(crate) const IMAGE_STATUS_PENDING: &str = "pending";
pub(crate) const IMAGE_STATUS_READY: &str = "ready";
pub(crate) const IMAGE_STATUS_FAILED: &str = "failed";

#[track_caller]
fn invalid_row(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::InvalidRow(message.into()))
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub description: String,
    pub intended_use: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id().as_uuid(),
            user_id: project.user_id().to_string(),
            title: project.title().clone(),
            description: project.description().clone(),
            intended_use: project.intended_use().to_string(),
            status: project.status().to_string(),
            created_at: *project.created_at(),
            updated_at: *project.updated_at(),
        }
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let intended_use: IntendedUse = row
            .intended_use
            .parse()
            .map_err(|_| invalid_row(format!("unknown intended_use '{}'", row.intended_use)))?;
        let status: ProjectStatus = row
            .status
            .parse()
            .map_err(|_| invalid_row(format!("unknown project status '{}'", row.status)))?;
        ProjectBuilder::default()
            .id(ProjectId::from_uuid(row.id))
            .user_id(row.user_id)
            .title(row.title)
            .description(row.description)
            .intended_use(intended_use)
            .status(status)
            .created_at(row.created_at)
            .updated_at(row.updated_at)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = art_styles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArtStyleRow {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<&ArtStyle> for ArtStyleRow {
    fn from(style: &ArtStyle) -> Self {
        Self {
            id: style.id().as_uuid(),
            name: style.name().clone(),
            prompt: style.prompt().clone(),
            keywords: style.keywords().clone(),
            category: style.category().as_ref().map(|c| c.to_string()),
            description: style.description().clone(),
        }
    }
}

impl TryFrom<ArtStyleRow> for ArtStyle {
    type Error = StoreError;

    fn try_from(row: ArtStyleRow) -> Result<Self, Self::Error> {
        let category: Option<Category> = row
            .category
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|_| invalid_row(format!("unknown category '{:?}'", row.category)))?;
        ArtStyleBuilder::default()
            .id(ArtStyleId::from_uuid(row.id))
            .name(row.name)
            .prompt(row.prompt)
            .keywords(row.keywords)
            .category(category)
            .description(row.description)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplateRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub art_style_id: Option<Uuid>,
    pub aspect_ratio: Option<String>,
    pub detail: Option<i32>,
    pub mood: Option<String>,
    pub key_elements: Option<String>,
    pub exclude: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Template> for TemplateRow {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id().as_uuid(),
            project_id: template.project_id().as_uuid(),
            art_style_id: template.art_style_id().as_ref().map(|id| id.as_uuid()),
            aspect_ratio: template.aspect_ratio().as_ref().map(|r| r.to_string()),
            detail: *template.detail(),
            mood: template.mood().clone(),
            key_elements: template.key_elements().clone(),
            exclude: template.exclude().clone(),
            created_at: *template.created_at(),
        }
    }
}

impl TryFrom<TemplateRow> for Template {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let aspect_ratio: Option<AspectRatio> = row
            .aspect_ratio
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|_| invalid_row(format!("unknown aspect_ratio '{:?}'", row.aspect_ratio)))?;
        TemplateBuilder::default()
            .id(TemplateId::from_uuid(row.id))
            .project_id(ProjectId::from_uuid(row.project_id))
            .art_style_id(row.art_style_id.map(ArtStyleId::from_uuid))
            .aspect_ratio(aspect_ratio)
            .detail(row.detail)
            .mood(row.mood)
            .key_elements(row.key_elements)
            .exclude(row.exclude)
            .created_at(row.created_at)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub template_id: Uuid,
    pub job_id: Option<String>,
    pub status: String,
    pub prompt: Option<String>,
    pub url: Option<String>,
    pub public_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The image lifecycle flattened to its column values: status, prompt,
/// url, public_url, thumbnail_url, failure_reason.
pub(crate) type FlatImageState = (
    &'static str,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

pub(crate) fn flatten_image_state(state: &ImageState) -> FlatImageState {
    match state {
        ImageState::Pending => (IMAGE_STATUS_PENDING, None, None, None, None, None),
        ImageState::Ready {
            prompt,
            url,
            public_url,
            thumbnail_url,
        } => (
            IMAGE_STATUS_READY,
            Some(prompt.clone()),
            Some(url.clone()),
            Some(public_url.clone()),
            Some(thumbnail_url.clone()),
            None,
        ),
        ImageState::Failed { reason } => (
            IMAGE_STATUS_FAILED,
            None,
            None,
            None,
            None,
            Some(reason.clone()),
        ),
    }
}

impl From<&Image> for ImageRow {
    fn from(image: &Image) -> Self {
        let (status, prompt, url, public_url, thumbnail_url, failure_reason) =
            flatten_image_state(image.state());
        Self {
            id: image.id().as_uuid(),
            project_id: image.project_id().as_uuid(),
            template_id: image.template_id().as_uuid(),
            job_id: image.job_id().clone(),
            status: status.to_string(),
            prompt,
            url,
            public_url,
            thumbnail_url,
            failure_reason,
            created_at: *image.created_at(),
            updated_at: *image.updated_at(),
        }
    }
}

impl TryFrom<ImageRow> for Image {
    type Error = StoreError;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        let state = match row.status.as_str() {
            IMAGE_STATUS_PENDING => ImageState::Pending,
            IMAGE_STATUS_READY => {
                let missing = || invalid_row(format!("ready image {} missing artifacts", row.id));
                ImageState::Ready {
                    prompt: row.prompt.ok_or_else(missing)?,
                    url: row.url.ok_or_else(missing)?,
                    public_url: row.public_url.ok_or_else(missing)?,
                    thumbnail_url: row.thumbnail_url.ok_or_else(missing)?,
                }
            }
            IMAGE_STATUS_FAILED => ImageState::Failed {
                reason: row
                    .failure_reason
                    .ok_or_else(|| invalid_row(format!("failed image {} missing reason", row.id)))?,
            },
            other => return Err(invalid_row(format!("unknown image status '{other}'"))),
        };
        ImageBuilder::default()
            .id(ImageId::from_uuid(row.id))
            .project_id(ProjectId::from_uuid(row.project_id))
            .template_id(TemplateId::from_uuid(row.template_id))
            .job_id(row.job_id)
            .state(state)
            .created_at(row.created_at)
            .updated_at(row.updated_at)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: String,
    pub plan: String,
    pub credit_balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: *subscription.id(),
            user_id: subscription.user_id().to_string(),
            plan: subscription.plan().to_string(),
            credit_balance: *subscription.credit_balance(),
            created_at: *subscription.created_at(),
            updated_at: *subscription.updated_at(),
        }
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan: Plan = row
            .plan
            .parse()
            .map_err(|_| invalid_row(format!("unknown plan '{}'", row.plan)))?;
        SubscriptionBuilder::default()
            .id(row.id)
            .user_id(row.user_id)
            .plan(plan)
            .credit_balance(row.credit_balance)
            .created_at(row.created_at)
            .updated_at(row.updated_at)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = credit_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditTransactionRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount: i64,
    pub balance: i64,
    pub reason: String,
    pub product_id: Option<Uuid>,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&CreditTransaction> for CreditTransactionRow {
    fn from(transaction: &CreditTransaction) -> Self {
        Self {
            id: *transaction.id(),
            subscription_id: *transaction.subscription_id(),
            amount: *transaction.amount(),
            balance: *transaction.balance(),
            reason: transaction.reason().clone(),
            product_id: transaction.product_id().as_ref().map(|id| id.as_uuid()),
            correlation_id: transaction.correlation_id().clone(),
            created_at: *transaction.created_at(),
        }
    }
}

impl TryFrom<CreditTransactionRow> for CreditTransaction {
    type Error = StoreError;

    fn try_from(row: CreditTransactionRow) -> Result<Self, Self::Error> {
        CreditTransactionBuilder::default()
            .id(row.id)
            .subscription_id(row.subscription_id)
            .amount(row.amount)
            .balance(row.balance)
            .reason(row.reason)
            .product_id(row.product_id.map(ProductId::from_uuid))
            .correlation_id(row.correlation_id)
            .created_at(row.created_at)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub credit_amount: i64,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().as_uuid(),
            external_id: product.external_id().clone(),
            name: product.name().clone(),
            credit_amount: *product.credit_amount(),
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        ProductBuilder::default()
            .id(ProductId::from_uuid(row.id))
            .external_id(row.external_id)
            .name(row.name)
            .credit_amount(row.credit_amount)
            .build()
            .map_err(|e| invalid_row(e.to_string()))
    }
}
