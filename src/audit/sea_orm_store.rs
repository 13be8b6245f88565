//! SeaORM-backed activity log.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE activity_log (
//!     id VARCHAR(36) PRIMARY KEY,
//!     log_name VARCHAR(100) NOT NULL,
//!     event VARCHAR(100) NOT NULL,
//!     description VARCHAR(255) NOT NULL,
//!     subject_type VARCHAR(50),
//!     subject_id VARCHAR(36),
//!     causer_type VARCHAR(50),
//!     causer_id VARCHAR(36),
//!     properties TEXT NOT NULL,
//!     created_at BIGINT NOT NULL
//! );
//!
//! CREATE INDEX idx_activity_log_name ON activity_log(log_name);
//! CREATE INDEX idx_activity_causer ON activity_log(causer_id);
//! CREATE INDEX idx_activity_subject ON activity_log(subject_id);
//! CREATE INDEX idx_activity_created ON activity_log(created_at);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::event::{AuditEvent, EntityRef};
use super::query::AuditQuery;
use super::storage::AuditStore;
use crate::error::{OverseerError, Result};
use crate::pagination::PaginatedResult;

mod entity {
    use sea_orm::entity::prelude::*;

    pub mod activity {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "activity_log")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub log_name: String,
            pub event: String,
            pub description: String,
            pub subject_type: Option<String>,
            pub subject_id: Option<String>,
            pub causer_type: Option<String>,
            pub causer_id: Option<String>,
            #[sea_orm(column_type = "Text")]
            pub properties: String,
            /// Unix milliseconds.
            pub created_at: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::activity;

fn db_err(e: sea_orm::DbErr) -> OverseerError {
    OverseerError::Database(e.to_string())
}

fn entity_ref(kind: Option<String>, id: Option<String>) -> Option<EntityRef> {
    match (kind, id) {
        (Some(kind), Some(id)) => Some(EntityRef { kind, id }),
        (None, Some(id)) => Some(EntityRef::user(id)),
        _ => None,
    }
}

fn corrupt_row(id: &str, reason: String) -> OverseerError {
    tracing::warn!(
        target: "overseer.audit.recorded",
        id = %id,
        reason = %reason,
        "unreadable activity row"
    );
    OverseerError::internal(format!("activity_log row {id}: {reason}"))
}

fn model_to_event(model: activity::Model) -> Result<AuditEvent> {
    let properties = serde_json::from_str(&model.properties)
        .map_err(|e| corrupt_row(&model.id, format!("properties: {e}")))?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(model.created_at).ok_or_else(|| {
        corrupt_row(
            &model.id,
            format!("created_at out of range: {}", model.created_at),
        )
    })?;

    Ok(AuditEvent {
        id: model.id,
        log_name: model.log_name,
        event: model.event,
        description: model.description,
        subject: entity_ref(model.subject_type, model.subject_id),
        causer: entity_ref(model.causer_type, model.causer_id),
        properties,
        created_at,
    })
}

/// `LOWER(column) LIKE '%term%'`, with LIKE wildcards in `term` escaped.
///
/// `term` must already be lower-cased.
fn lower_contains(column: activity::Column, term: &str) -> SimpleExpr {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

fn query_condition(query: &AuditQuery) -> Condition {
    let mut cond = Condition::all();

    if let Some(log_name) = &query.log_name {
        cond = cond.add(activity::Column::LogName.eq(log_name.as_str()));
    }
    if let Some(event) = &query.event {
        cond = cond.add(activity::Column::Event.eq(event.as_str()));
    }
    if let Some(id) = &query.causer_id {
        cond = cond.add(activity::Column::CauserId.eq(id.as_str()));
    }
    if let Some(id) = &query.subject_id {
        cond = cond.add(activity::Column::SubjectId.eq(id.as_str()));
    }
    if let Some(from) = query.from {
        cond = cond.add(activity::Column::CreatedAt.gte(from.timestamp_millis()));
    }
    if let Some(to) = query.to {
        cond = cond.add(activity::Column::CreatedAt.lte(to.timestamp_millis()));
    }
    // Matches the in-memory store: properties are searched as serialized text.
    if let Some(term) = query.search_term() {
        cond = cond.add(
            Condition::any()
                .add(lower_contains(activity::Column::Event, &term))
                .add(lower_contains(activity::Column::Description, &term))
                .add(lower_contains(activity::Column::Properties, &term)),
        );
    }

    cond
}

/// SeaORM-backed [`AuditStore`].
#[derive(Clone, Debug)]
pub struct SeaOrmAuditStore {
    db: DatabaseConnection,
}

impl SeaOrmAuditStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl AuditStore for SeaOrmAuditStore {
    async fn append(&self, event: &AuditEvent) -> Result<()> {
        let model = activity::ActiveModel {
            id: Set(event.id.clone()),
            log_name: Set(event.log_name.clone()),
            event: Set(event.event.clone()),
            description: Set(event.description.clone()),
            subject_type: Set(event.subject.as_ref().map(|s| s.kind.clone())),
            subject_id: Set(event.subject.as_ref().map(|s| s.id.clone())),
            causer_type: Set(event.causer.as_ref().map(|c| c.kind.clone())),
            causer_id: Set(event.causer.as_ref().map(|c| c.id.clone())),
            properties: Set(serde_json::to_string(&event.properties)?),
            created_at: Set(event.created_at.timestamp_millis()),
        };

        activity::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| OverseerError::audit_write(e.to_string()))?;

        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<AuditEvent>> {
        let model = activity::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        model.map(model_to_event).transpose()
    }

    async fn query(&self, query: &AuditQuery) -> Result<PaginatedResult<AuditEvent>> {
        let per_page = query.page_size();
        let page = query.page.max(1);

        let paginator = activity::Entity::find()
            .filter(query_condition(query))
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .paginate(&self.db, u64::from(per_page));

        let total = paginator.num_items().await.map_err(db_err)?;
        let rows = paginator
            .fetch_page(u64::from(page - 1))
            .await
            .map_err(db_err)?;

        let items = rows
            .into_iter()
            .map(model_to_event)
            .collect::<Result<Vec<_>>>()?;

        Ok(PaginatedResult::new(
            items,
            total,
            page,
            per_page,
        ))
    }
}
