//! Project database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Project, ProjectRef, ProjectStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub billing_rate: f64,
    pub status: String,
    pub archived_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::time_log::Entity")]
    TimeLogs,
}

impl Related<super::time_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Project {
            id: model.id,
            name: model.name,
            description: model.description,
            billing_rate: model.billing_rate,
            // Rows are only written through the domain type.
            status: ProjectStatus::parse(&model.status).unwrap_or_default(),
            archived_at: model.archived_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Model> for ProjectRef {
    fn from(model: Model) -> Self {
        ProjectRef {
            id: model.id,
            name: model.name,
        }
    }
}
