//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{User, UserRef, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role: String,
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
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            name: model.name,
            role: UserRole::from(model.role.as_str()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Model> for UserRef {
    fn from(model: Model) -> Self {
        UserRef {
            id: model.id,
            name: model.name,
            email: model.email,
        }
    }
}
